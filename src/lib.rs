#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::inline_always)]
#![allow(unknown_lints)]
#![warn(missing_copy_implementations)]
#![warn(missing_debug_implementations)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(unused_qualifications)]
#![warn(variant_size_differences)]

//! Single-threaded, counter-free, shared-ownership pointers.
//!
//! The type [`RingPtr<T>`] provides shared ownership of a value of type `T`
//! allocated on the heap, without a reference count and without the separate
//! control block [`std::rc::Rc`] allocates for one. Every handle that
//! co-owns a value is a member of one circular, doubly-linked ring; cloning
//! a handle splices a new member into the ring and dropping a handle splices
//! it back out. When a handle detaches while it is the sole ring member, it
//! frees the value: "last owner" is a structural property of the ring, never
//! a stored count.
//!
//! [`RingPtr<T>`]: crate::RingPtr
//! [`std::rc::Rc`]: https://doc.rust-lang.org/stable/std/rc/struct.Rc.html
//!
//! # Ring representation
//!
//! A self-referential intrusive ring cannot store sibling addresses inside
//! movable handles, so the ring topology lives in a thread-local slab arena
//! and each handle stores a stable slot id (index plus generation) into it.
//! Splicing stays O(1), handles stay two words plus the data pointer, and a
//! Rust move never invalidates sibling links. The arena records topology
//! only; data pointers live in the handles, so one arena serves every
//! `RingPtr<T>` on the thread regardless of `T`.
//!
//! # `RingPtr` vs. `std::rc`
//!
//! `RingPtr` trades `Rc`'s counter updates and control-block allocation for
//! O(1) ring splices on every handle operation. The consequences:
//!
//! - Copying a handle mutates its sibling's ring links, so there are no
//!   concurrent operations of any kind, not even concurrent `clone`s of one
//!   ring. `RingPtr` is `!Send` and `!Sync`, which makes the required
//!   whole-ring serialization a compile-time guarantee.
//! - There are no weak references and no cycle detection. A ring of handles
//!   over a value that itself holds a `RingPtr` back into the ring leaks,
//!   exactly as `std::rc::Rc` cycles leak.
//! - Handles may be null. A null handle is never [unique] and never frees
//!   anything.
//!
//! [unique]: RingPtr::is_unique
//!
//! # Pointer-compatible handles
//!
//! Handles of different types can share one ring when their pointee types
//! are pointer-compatible, the way a trait object stands in for a concrete
//! type. Compatibility is declared with [`coercible!`] and checked at
//! compile time; see [`Coerce`].
//!
//! # Examples
//!
//! ```
//! use ringptr::RingPtr;
//!
//! let first = RingPtr::new(String::from("shared"));
//! assert!(RingPtr::is_unique(&first));
//!
//! let second = first.clone();
//! assert!(!RingPtr::is_unique(&second));
//! assert!(RingPtr::ptr_eq(&first, &second));
//!
//! drop(first);
//! assert!(RingPtr::is_unique(&second));
//! assert_eq!(*second, "shared");
//! ```

#![doc(html_root_url = "https://docs.rs/ringptr/0.1.0")]

// Ensure code blocks in README.md compile
#[cfg(doctest)]
#[doc = include_str!("../README.md")]
mod readme {}

#[macro_use]
extern crate log;

mod coerce;
mod ptr;
mod ring;

pub use coerce::Coerce;
pub use ptr::RingPtr;
