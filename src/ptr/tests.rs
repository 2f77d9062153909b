use std::cell::{Cell, RefCell};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::mem;
use std::rc::Rc;

use crate::RingPtr;

#[test]
fn test_simple() {
    let x = RingPtr::new(5);
    assert_eq!(*x, 5);
}

#[test]
fn test_clone() {
    let x = RingPtr::new(RefCell::new(5));
    let y = x.clone();
    *x.borrow_mut() = 20;
    assert_eq!(*y.borrow(), 20);
}

#[test]
fn test_simple_clone() {
    let x = RingPtr::new(5);
    let y = x.clone();
    assert_eq!(*x, 5);
    assert_eq!(*y, 5);
}

#[test]
fn test_destructor() {
    let x: RingPtr<Box<_>> = RingPtr::new(Box::new(5));
    assert_eq!(**x, 5);
}

#[test]
fn is_unique() {
    let x = RingPtr::new(3);
    assert!(RingPtr::is_unique(&x));
    let y = x.clone();
    assert!(!RingPtr::is_unique(&x));
    drop(y);
    assert!(RingPtr::is_unique(&x));
}

#[test]
fn null_handle_is_never_unique() {
    let x = RingPtr::<u8>::null();
    assert!(RingPtr::is_null(&x));
    assert!(!RingPtr::is_unique(&x));
    let y = x.clone();
    assert!(!RingPtr::is_unique(&x));
    assert!(!RingPtr::is_unique(&y));
}

#[test]
fn default_is_null() {
    let x = RingPtr::<String>::default();
    assert!(RingPtr::is_null(&x));
    assert!(RingPtr::get(&x).is_none());
}

#[test]
fn get_on_live_handle() {
    let x = RingPtr::new(7);
    assert_eq!(RingPtr::get(&x), Some(&7));
}

#[test]
fn get_mut() {
    let mut x = RingPtr::new(3);
    *RingPtr::get_mut(&mut x).unwrap() = 4;
    assert_eq!(*x, 4);
    let y = x.clone();
    assert!(RingPtr::get_mut(&mut x).is_none());
    drop(y);
    assert!(RingPtr::get_mut(&mut x).is_some());
}

#[test]
fn get_mut_on_null_handle() {
    let mut x = RingPtr::<u8>::null();
    assert!(RingPtr::get_mut(&mut x).is_none());
}

#[test]
#[should_panic(expected = "dereferenced a null RingPtr")]
fn deref_null_panics() {
    let x = RingPtr::<u8>::null();
    let _ = *x;
}

#[test]
fn adopt_does_not_reallocate() {
    let boxed = Box::new(42);
    let raw: *const i32 = &*boxed;
    let handle = RingPtr::adopt(boxed);
    assert!(core::ptr::eq(raw, &*handle));
}

#[test]
fn from_raw_round_trip() {
    let raw = core::ptr::NonNull::new(Box::into_raw(Box::new("hello"))).unwrap();
    let handle = unsafe { RingPtr::from_raw(raw) };
    assert_eq!(*handle, "hello");
    assert!(RingPtr::is_unique(&handle));
}

#[test]
fn test_ptr_eq() {
    let five = RingPtr::new(5);
    let same_five = five.clone();
    let other_five = RingPtr::new(5);

    assert!(RingPtr::ptr_eq(&five, &same_five));
    assert!(!RingPtr::ptr_eq(&five, &other_five));
}

#[test]
fn null_handles_compare_equal() {
    let a = RingPtr::<u8>::null();
    let b = RingPtr::<u8>::null();
    assert!(RingPtr::ptr_eq(&a, &b));
    assert_eq!(a, b);
}

#[test]
fn equality_follows_address_not_ring() {
    let a = RingPtr::new(1);
    let b = a.clone();
    let c = RingPtr::new(1);
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn ordering_follows_address() {
    let a = RingPtr::new(1);
    let b = RingPtr::new(2);
    if a < b {
        assert!(b > a);
    } else {
        assert!(b < a);
    }
    let c = a.clone();
    assert!(a <= c && a >= c);
}

#[test]
fn hash_follows_address() {
    let a = RingPtr::new(1);
    let b = a.clone();
    let hash = |ptr: &RingPtr<i32>| {
        let mut hasher = DefaultHasher::new();
        ptr.hash(&mut hasher);
        hasher.finish()
    };
    assert_eq!(hash(&a), hash(&b));
}

#[test]
fn clone_from_sibling_is_noop() {
    let counter = Rc::new(Cell::new(0));
    let mut a = RingPtr::new(DropCounter(Rc::clone(&counter)));
    let b = a.clone();
    a.clone_from(&b);
    assert_eq!(counter.get(), 0);
    assert!(RingPtr::ptr_eq(&a, &b));
    drop(a);
    drop(b);
    assert_eq!(counter.get(), 1);
}

#[test]
fn clone_from_replaces_object() {
    let counter = Rc::new(Cell::new(0));
    let mut a = RingPtr::new(DropCounter(Rc::clone(&counter)));
    let b = RingPtr::new(DropCounter(Rc::clone(&counter)));
    a.clone_from(&b);
    // `a`'s old object lost its last owner.
    assert_eq!(counter.get(), 1);
    assert!(RingPtr::ptr_eq(&a, &b));
    drop(a);
    drop(b);
    assert_eq!(counter.get(), 2);
}

#[test]
fn reset_detaches_without_freeing_shared_object() {
    let counter = Rc::new(Cell::new(0));
    let mut a = RingPtr::new(DropCounter(Rc::clone(&counter)));
    let b = a.clone();
    RingPtr::reset(&mut a);
    assert!(RingPtr::is_null(&a));
    assert_eq!(counter.get(), 0);
    assert!(RingPtr::is_unique(&b));
    drop(b);
    assert_eq!(counter.get(), 1);
}

#[test]
fn reset_frees_sole_owner() {
    let counter = Rc::new(Cell::new(0));
    let mut a = RingPtr::new(DropCounter(Rc::clone(&counter)));
    RingPtr::reset(&mut a);
    assert_eq!(counter.get(), 1);
    assert!(RingPtr::is_null(&a));
    // Resetting an already-null handle changes nothing.
    RingPtr::reset(&mut a);
    assert_eq!(counter.get(), 1);
}

#[test]
fn move_keeps_ring_size() {
    let a = RingPtr::new(9);
    let b = a.clone();
    let moved = a;
    assert!(!RingPtr::is_unique(&moved));
    drop(b);
    assert!(RingPtr::is_unique(&moved));
    assert_eq!(*moved, 9);
}

#[test]
fn take_leaves_empty_source() {
    let mut a = RingPtr::new(9);
    let taken = mem::take(&mut a);
    assert!(RingPtr::is_null(&a));
    assert!(RingPtr::is_unique(&taken));
    assert_eq!(*taken, 9);
}

#[test]
fn reflexive_coerce_shares_ring() {
    let a = RingPtr::new(5);
    let b: RingPtr<i32> = RingPtr::coerce(&a);
    assert!(RingPtr::ptr_eq(&a, &b));
    assert!(!RingPtr::is_unique(&a));
    drop(a);
    assert!(RingPtr::is_unique(&b));
}

#[test]
fn test_from_owned() {
    let foo = 123;
    let foo_ptr = RingPtr::from(foo);
    assert!(123 == *foo_ptr);
}

#[test]
fn test_from_box() {
    let b: Box<u32> = Box::new(123);
    let r: RingPtr<u32> = RingPtr::from(b);
    assert_eq!(*r, 123);
}

#[test]
fn test_show() {
    let foo = RingPtr::new(75);
    let repr = format!("{foo:?}");
    assert!(repr.starts_with("RingPtr"));
}

#[test]
fn drop_of_value_may_touch_other_handles() {
    struct Chained {
        _next: Option<RingPtr<Chained>>,
    }

    let tail = RingPtr::new(Chained { _next: None });
    let head = RingPtr::new(Chained { _next: Some(tail) });
    // Dropping `head` frees its value, whose drop glue detaches the inner
    // handle and frees the tail; the arena must not still be borrowed.
    drop(head);
}

struct DropCounter(Rc<Cell<usize>>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}
