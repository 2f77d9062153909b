use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use core::mem;
use core::ops::Deref;
use core::ptr::NonNull;

use crate::coerce::Coerce;
use crate::ring::{self, NodeId, RingArena};

/// A single-threaded, counter-free, shared-ownership pointer.
///
/// Every handle that co-owns a value is a member of one circular,
/// doubly-linked ring backed by a thread-local arena. Cloning a handle
/// splices a new member into the ring; dropping or resetting a handle
/// splices it back out. A handle frees its value exactly when it detaches
/// while it is the sole ring member, so "who must free the object" is a
/// structural property of the ring and no reference count is kept anywhere.
///
/// A handle may also be null. Null handles participate in rings like any
/// other member but never free anything and are never [unique].
///
/// Moving a `RingPtr` is a plain bitwise copy: the handle stores a stable
/// arena slot id rather than addresses of its siblings, so the ring is
/// untouched and the moved-from binding is statically unusable afterwards.
///
/// `RingPtr` is `!Send` and `!Sync`. Every handle operation, including
/// `clone`, rewires sibling links, so not even read-only operations can run
/// concurrently; the thread-local arena makes that whole-ring serialization
/// a compile-time guarantee.
///
/// # Examples
///
/// ```
/// use ringptr::RingPtr;
///
/// let first = RingPtr::new(String::from("shared"));
/// assert!(RingPtr::is_unique(&first));
///
/// let second = first.clone();
/// assert!(!RingPtr::is_unique(&second));
/// assert!(RingPtr::ptr_eq(&first, &second));
///
/// drop(first);
/// assert!(RingPtr::is_unique(&second));
/// assert_eq!(*second, "shared");
/// ```
///
/// [unique]: RingPtr::is_unique
#[allow(clippy::module_name_repetitions)]
pub struct RingPtr<T: ?Sized> {
    node: NodeId,
    data: Option<NonNull<T>>,
    _owns: PhantomData<Box<T>>,
}

impl<T> RingPtr<T> {
    /// Allocate `value` on the heap and wrap it in a handle that is its sole
    /// owner.
    ///
    /// Allocation failure propagates the global allocator's failure behavior
    /// untranslated.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringptr::RingPtr;
    ///
    /// let five = RingPtr::new(5);
    /// assert_eq!(*five, 5);
    /// ```
    #[must_use]
    pub fn new(value: T) -> Self {
        Self::adopt(Box::new(value))
    }
}

impl<T: ?Sized> RingPtr<T> {
    /// Construct a handle that owns nothing.
    ///
    /// A null handle is never [unique] and never frees anything, but it
    /// occupies a ring slot like any other handle and other handles can
    /// share its (empty) ring through `clone`.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringptr::RingPtr;
    ///
    /// let empty = RingPtr::<u8>::null();
    /// assert!(RingPtr::is_null(&empty));
    /// assert!(!RingPtr::is_unique(&empty));
    /// ```
    ///
    /// [unique]: RingPtr::is_unique
    #[must_use]
    pub fn null() -> Self {
        Self {
            node: ring::with(RingArena::acquire),
            data: None,
            _owns: PhantomData,
        }
    }

    /// Adopt an existing allocation as sole owner.
    ///
    /// No new allocation is performed; the handle takes over the `Box`'s
    /// allocation and frees it when the last ring member detaches.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringptr::RingPtr;
    ///
    /// let boxed: Box<str> = Box::from("already allocated");
    /// let handle = RingPtr::adopt(boxed);
    /// assert!(RingPtr::is_unique(&handle));
    /// ```
    #[must_use]
    pub fn adopt(boxed: Box<T>) -> Self {
        // SAFETY: `Box::into_raw` never returns null.
        let data = unsafe { NonNull::new_unchecked(Box::into_raw(boxed)) };
        // SAFETY: the pointer was just produced by `Box::into_raw` and is
        // owned by no other handle.
        unsafe { Self::from_raw(data) }
    }

    /// Adopt a raw allocation as sole owner.
    ///
    /// # Safety
    ///
    /// `data` must have been produced by [`Box::into_raw`] (or an equivalent
    /// allocation that is sound to free with [`Box::from_raw`]), and no other
    /// owner, including another ring, may free it.
    ///
    /// # Examples
    ///
    /// ```
    /// use core::ptr::NonNull;
    /// use ringptr::RingPtr;
    ///
    /// let raw = NonNull::new(Box::into_raw(Box::new(5))).unwrap();
    /// let handle = unsafe { RingPtr::from_raw(raw) };
    /// assert_eq!(*handle, 5);
    /// ```
    #[must_use]
    pub unsafe fn from_raw(data: NonNull<T>) -> Self {
        Self {
            node: ring::with(RingArena::acquire),
            data: Some(data),
            _owns: PhantomData,
        }
    }

    /// Adopt an allocation of a pointer-compatible type as sole owner.
    ///
    /// This is the base-from-derived constructor: the handle stores the
    /// coerced view of the allocation and frees through it, which for the
    /// coercions accepted by [`coercible!`] is the allocation itself.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringptr::{coercible, RingPtr};
    ///
    /// trait Greet {
    ///     fn hello(&self) -> String;
    /// }
    ///
    /// struct World;
    ///
    /// impl Greet for World {
    ///     fn hello(&self) -> String {
    ///         String::from("hello world")
    ///     }
    /// }
    ///
    /// coercible!(World => dyn Greet);
    ///
    /// let greeter: RingPtr<dyn Greet> = RingPtr::adopt_cast(Box::new(World));
    /// assert_eq!(greeter.hello(), "hello world");
    /// ```
    ///
    /// [`coercible!`]: crate::coercible
    #[must_use]
    pub fn adopt_cast<U>(boxed: Box<U>) -> Self
    where
        U: Coerce<T> + ?Sized,
    {
        // SAFETY: `Box::into_raw` never returns null.
        let raw = unsafe { NonNull::new_unchecked(Box::into_raw(boxed)) };
        // SAFETY: `Coerce` impls preserve the allocation, so freeing through
        // the coerced pointer frees the adopted `Box`.
        unsafe { Self::from_raw(U::coerce(raw)) }
    }

    /// Construct a handle of a pointer-compatible type sharing `this`'s
    /// ring.
    ///
    /// The new handle joins the ring immediately after `this` and observes
    /// the same object through the coerced (possibly wide) pointer, so
    /// destroying either handle shrinks the same ring.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringptr::{coercible, RingPtr};
    ///
    /// trait Animal {
    ///     fn name(&self) -> &'static str;
    /// }
    ///
    /// struct Cat;
    ///
    /// impl Animal for Cat {
    ///     fn name(&self) -> &'static str {
    ///         "cat"
    ///     }
    /// }
    ///
    /// coercible!(Cat => dyn Animal);
    ///
    /// let cat = RingPtr::new(Cat);
    /// let animal: RingPtr<dyn Animal> = RingPtr::coerce(&cat);
    /// assert_eq!(animal.name(), "cat");
    /// assert!(!RingPtr::is_unique(&cat));
    /// assert!(RingPtr::ptr_eq(&cat, &animal));
    /// ```
    #[must_use]
    pub fn coerce<U>(this: &RingPtr<U>) -> Self
    where
        U: Coerce<T> + ?Sized,
    {
        let node = ring::with(|arena| {
            let node = arena.acquire();
            arena.splice_after(node, this.node);
            node
        });
        trace!("ringptr {:?} joined ring of {:?}", node, this.node);
        Self {
            node,
            data: this.data.map(U::coerce),
            _owns: PhantomData,
        }
    }

    /// Replace this handle with a pointer-compatible copy of `other`.
    ///
    /// A no-op when both handles already denote the same object, so a
    /// self-replacement through any pair of handles never frees the held
    /// object. Otherwise the replacement joins `other`'s ring before the old
    /// state is dropped, so the old object is freed (at most once) only if
    /// this handle was its last owner. Same-typed handles can use
    /// [`clone_from`] instead.
    ///
    /// The membership test is data identity, not link inspection: two
    /// handles denote the same object exactly when their data addresses are
    /// equal, whatever their ring positions are.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringptr::{coercible, RingPtr};
    ///
    /// trait Animal {
    ///     fn name(&self) -> &'static str;
    /// }
    ///
    /// struct Cat;
    ///
    /// impl Animal for Cat {
    ///     fn name(&self) -> &'static str {
    ///         "cat"
    ///     }
    /// }
    ///
    /// coercible!(Cat => dyn Animal);
    ///
    /// let cat = RingPtr::new(Cat);
    /// let mut animal = RingPtr::<dyn Animal>::null();
    /// RingPtr::assign(&mut animal, &cat);
    /// assert_eq!(animal.name(), "cat");
    /// assert!(RingPtr::ptr_eq(&animal, &cat));
    /// ```
    ///
    /// [`clone_from`]: Clone::clone_from
    pub fn assign<U>(this: &mut Self, other: &RingPtr<U>)
    where
        U: Coerce<T> + ?Sized,
    {
        if Self::ptr_eq(this, other) {
            return;
        }
        *this = Self::coerce(other);
    }

    /// Detach from the ring, freeing the owned object if this handle was its
    /// sole owner, and become null.
    ///
    /// Remaining ring members, if any, are left intact and keep owning the
    /// object. Resetting to a new allocation is assignment of
    /// [`RingPtr::adopt`], which composes the same steps.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringptr::RingPtr;
    ///
    /// let mut a = RingPtr::new(5);
    /// let b = a.clone();
    /// RingPtr::reset(&mut a);
    /// assert!(RingPtr::is_null(&a));
    /// assert!(RingPtr::is_unique(&b));
    /// ```
    pub fn reset(this: &mut Self) {
        let sole_owner = ring::with(|arena| {
            let sole_owner = arena.is_singleton(this.node);
            arena.unlink(this.node);
            sole_owner
        });
        let data = this.data.take();
        if let (true, Some(data)) = (sole_owner, data) {
            debug!(
                "ringptr freeing {:p} on reset of last owner {:?}",
                data, this.node
            );
            // SAFETY: the pointer came from `Box::into_raw` (see `from_raw`)
            // and this handle was the sole ring member holding it.
            unsafe { drop(Box::from_raw(data.as_ptr())) };
        }
    }

    /// Exchange the pointees of two handles.
    ///
    /// Because ownership is a structural ring property, swapping must move
    /// ring slots, not just pointers: each handle takes over the other's
    /// position in the other's ring, so the set of owners of each object is
    /// unchanged. A no-op when both handles already hold the same address,
    /// which also covers two members of one ring. Self-swap is
    /// unrepresentable with two `&mut` receivers.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringptr::RingPtr;
    ///
    /// let mut a = RingPtr::new('x');
    /// let mut b = RingPtr::new('y');
    /// let b_sibling = b.clone();
    ///
    /// RingPtr::swap(&mut a, &mut b);
    ///
    /// // `a` now co-owns 'y' with `b_sibling`; `b` solely owns 'x'.
    /// assert_eq!(*a, 'y');
    /// assert_eq!(*b, 'x');
    /// assert!(RingPtr::ptr_eq(&a, &b_sibling));
    /// assert!(RingPtr::is_unique(&b));
    /// ```
    pub fn swap(this: &mut Self, other: &mut Self) {
        if Self::ptr_eq(this, other) {
            return;
        }
        mem::swap(&mut this.data, &mut other.data);
        ring::with(|arena| arena.exchange(this.node, other.node));
        trace!(
            "ringptr exchanged ring positions of {:?} and {:?}",
            this.node,
            other.node
        );
    }

    /// Return a reference to the owned value, or `None` for a null handle.
    #[must_use]
    pub fn get(this: &Self) -> Option<&T> {
        // SAFETY: a non-null handle keeps its object alive for as long as it
        // is a ring member, which `&self` guarantees here.
        this.data.map(|data| unsafe { &*data.as_ptr() })
    }

    /// Return a mutable reference to the owned value if this handle is its
    /// sole owner.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringptr::RingPtr;
    ///
    /// let mut x = RingPtr::new(3);
    /// *RingPtr::get_mut(&mut x).unwrap() = 4;
    /// assert_eq!(*x, 4);
    ///
    /// let y = x.clone();
    /// assert!(RingPtr::get_mut(&mut x).is_none());
    /// drop(y);
    /// assert!(RingPtr::get_mut(&mut x).is_some());
    /// ```
    #[must_use]
    pub fn get_mut(this: &mut Self) -> Option<&mut T> {
        if Self::is_unique(this) {
            // SAFETY: `this` is the sole ring member, so no other handle can
            // observe the object, and `&mut self` excludes access through
            // `this` itself.
            this.data.map(|data| unsafe { &mut *data.as_ptr() })
        } else {
            None
        }
    }

    /// True iff the handle owns nothing.
    #[inline]
    #[must_use]
    pub fn is_null(this: &Self) -> bool {
        this.data.is_none()
    }

    /// True iff this handle is the sole owner of a non-null object.
    ///
    /// A null handle is never unique, even as the only member of its ring.
    ///
    /// # Examples
    ///
    /// ```
    /// use ringptr::RingPtr;
    ///
    /// let x = RingPtr::new(3);
    /// assert!(RingPtr::is_unique(&x));
    /// let y = x.clone();
    /// assert!(!RingPtr::is_unique(&x));
    /// assert!(!RingPtr::is_unique(&y));
    /// drop(y);
    /// assert!(RingPtr::is_unique(&x));
    /// ```
    #[must_use]
    pub fn is_unique(this: &Self) -> bool {
        this.data.is_some() && ring::with(|arena| arena.is_singleton(this.node))
    }

    /// True iff both handles hold the same address, independent of ring
    /// membership and pointee type.
    ///
    /// Two null handles are considered equal.
    #[must_use]
    pub fn ptr_eq<U: ?Sized>(this: &Self, other: &RingPtr<U>) -> bool {
        this.address() == other.address()
    }

    // Thin view of the data pointer; wide-pointer metadata does not
    // participate in identity.
    #[inline]
    fn address(&self) -> Option<NonNull<()>> {
        self.data.map(NonNull::cast)
    }
}

impl<T: ?Sized> Clone for RingPtr<T> {
    /// Construct a new co-owner of the same object.
    ///
    /// The clone is spliced into the ring immediately after `self`; the ring
    /// grows by one member and no count is touched anywhere.
    fn clone(&self) -> Self {
        let node = ring::with(|arena| {
            let node = arena.acquire();
            arena.splice_after(node, self.node);
            node
        });
        trace!("ringptr {:?} joined ring of {:?}", node, self.node);
        Self {
            node,
            data: self.data,
            _owns: PhantomData,
        }
    }

    /// Replace this handle with a copy of `source`.
    ///
    /// A no-op when both handles already denote the same object, so
    /// assigning a handle to itself through any pair of ring siblings never
    /// frees the held object. Otherwise the current state is dropped and a
    /// copy of `source` takes its place; the copy joins `source`'s ring
    /// before the old state is dropped, so replacing cannot double-free or
    /// leak either object.
    fn clone_from(&mut self, source: &Self) {
        if Self::ptr_eq(self, source) {
            return;
        }
        *self = source.clone();
    }
}

impl<T: ?Sized> Drop for RingPtr<T> {
    /// Detach from the ring, freeing the owned object if this handle was its
    /// sole owner.
    ///
    /// Detaching happens unconditionally, shrinking the ring for non-unique
    /// handles so the remaining siblings keep owning the object. The value's
    /// destructor runs after the arena borrow is released, so dropping a
    /// value may itself construct and drop handles.
    fn drop(&mut self) {
        // `None` means the thread-local arena was already torn down during
        // thread exit; leak rather than risk freeing an object a sibling
        // handle still owns.
        let sole_owner = ring::try_with(|arena| {
            let sole_owner = arena.is_singleton(self.node);
            arena.release(self.node);
            sole_owner
        });
        if let (Some(true), Some(data)) = (sole_owner, self.data) {
            debug!(
                "ringptr freeing {:p} on drop of last owner {:?}",
                data, self.node
            );
            // SAFETY: the pointer came from `Box::into_raw` (see `from_raw`)
            // and this handle was the sole ring member holding it.
            unsafe { drop(Box::from_raw(data.as_ptr())) };
        }
    }
}

impl<T: ?Sized> Default for RingPtr<T> {
    /// Construct a null handle, like [`RingPtr::null`].
    fn default() -> Self {
        Self::null()
    }
}

impl<T: ?Sized> Deref for RingPtr<T> {
    type Target = T;

    /// Dereference the owned value.
    ///
    /// # Panics
    ///
    /// Panics if the handle is null; use [`RingPtr::get`] to test first.
    ///
    /// ```should_panic
    /// let empty = ringptr::RingPtr::<u8>::null();
    /// let _ = *empty;
    /// ```
    fn deref(&self) -> &T {
        RingPtr::get(self).expect("dereferenced a null RingPtr")
    }
}

impl<T> From<T> for RingPtr<T> {
    /// Equivalent to [`RingPtr::new`].
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: ?Sized> From<Box<T>> for RingPtr<T> {
    /// Equivalent to [`RingPtr::adopt`].
    fn from(boxed: Box<T>) -> Self {
        Self::adopt(boxed)
    }
}

// Comparisons are defined purely on the thin data address: two handles over
// the same object compare equal regardless of which rings they sit in, and
// handles over distinct objects order by address. The `Coerce` bound limits
// cross-type comparison to pointer-compatible pairs.

impl<T: ?Sized, U> PartialEq<RingPtr<U>> for RingPtr<T>
where
    U: Coerce<T> + ?Sized,
{
    fn eq(&self, other: &RingPtr<U>) -> bool {
        RingPtr::ptr_eq(self, other)
    }
}

impl<T: ?Sized> Eq for RingPtr<T> {}

impl<T: ?Sized, U> PartialOrd<RingPtr<U>> for RingPtr<T>
where
    U: Coerce<T> + ?Sized,
{
    fn partial_cmp(&self, other: &RingPtr<U>) -> Option<Ordering> {
        Some(self.address().cmp(&other.address()))
    }
}

impl<T: ?Sized> Ord for RingPtr<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.address().cmp(&other.address())
    }
}

impl<T: ?Sized> Hash for RingPtr<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address().hash(state);
    }
}

impl<T: ?Sized> fmt::Debug for RingPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingPtr")
            .field("node", &self.node)
            .field("data", &self.data)
            .finish()
    }
}

#[cfg(test)]
mod tests;
