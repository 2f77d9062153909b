use core::ptr::NonNull;

/// Statically-checked pointer compatibility between two pointee types.
///
/// `T: Coerce<U>` means a pointer to `T` can stand in for a pointer to `U`
/// over the same allocation, the way a pointer to a concrete type can stand
/// in for a pointer to a trait object it implements. [`RingPtr::coerce`] and
/// [`RingPtr::adopt_cast`] use this bound to build base-typed handles that
/// share a ring with derived-typed ones.
///
/// The trait is implemented reflexively for every type. All other impls
/// should be declared through [`coercible!`], which only accepts genuine
/// raw-pointer coercions and therefore fails to compile for incompatible
/// pairs.
///
/// # Safety
///
/// Implementors must return a pointer that addresses the same allocation as
/// the input, differing only in type (and metadata, for wide pointers). The
/// last ring member frees the object through the coerced pointer; an impl
/// that rebases or fabricates the pointer will free the wrong allocation.
///
/// [`RingPtr::coerce`]: crate::RingPtr::coerce
/// [`RingPtr::adopt_cast`]: crate::RingPtr::adopt_cast
pub unsafe trait Coerce<U: ?Sized> {
    /// Reinterpret a pointer to `Self` as a pointer to `U`.
    fn coerce(ptr: NonNull<Self>) -> NonNull<U>;
}

// Every type trivially coerces to itself. This also lets same-typed handles
// satisfy the `Coerce`-bounded comparison impls.
unsafe impl<T: ?Sized> Coerce<T> for T {
    #[inline]
    fn coerce(ptr: NonNull<Self>) -> NonNull<T> {
        ptr
    }
}

/// Declare that pointers to a type coerce to pointers to one or more other
/// types.
///
/// Expands to [`Coerce`] impls whose bodies are plain raw-pointer coercions:
/// unsizing a concrete type to a trait object or an array to a slice, and
/// upcasting a trait object to one of its supertraits. An incompatible pair
/// is rejected by the compiler inside the expansion, so the generated impls
/// always satisfy [`Coerce`]'s safety contract.
///
/// # Examples
///
/// ```
/// use ringptr::{coercible, RingPtr};
///
/// trait Shape {
///     fn sides(&self) -> u32;
/// }
///
/// struct Square;
///
/// impl Shape for Square {
///     fn sides(&self) -> u32 {
///         4
///     }
/// }
///
/// coercible!(Square => dyn Shape);
///
/// let square = RingPtr::new(Square);
/// let shape: RingPtr<dyn Shape> = RingPtr::coerce(&square);
/// assert_eq!(shape.sides(), 4);
/// assert!(RingPtr::ptr_eq(&square, &shape));
/// ```
#[macro_export]
macro_rules! coercible {
    ($source:ty => $($target:ty),+ $(,)?) => {$(
        // SAFETY: the body is a compiler-checked pointer coercion, so the
        // returned pointer addresses the same allocation as the input.
        unsafe impl $crate::Coerce<$target> for $source {
            #[inline]
            fn coerce(
                ptr: ::core::ptr::NonNull<Self>,
            ) -> ::core::ptr::NonNull<$target> {
                let ptr: *mut $target = ptr.as_ptr();
                // SAFETY: coercion preserves the address, so the pointer is
                // still non-null.
                unsafe { ::core::ptr::NonNull::new_unchecked(ptr) }
            }
        }
    )+};
}
