#![warn(clippy::all)]
#![warn(clippy::pedantic)]

use std::cell::Cell;
use std::rc::Rc;

use ringptr::RingPtr;

struct Instrumented {
    drops: Rc<Cell<usize>>,
}

impl Drop for Instrumented {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

#[test]
fn assigning_a_sibling_does_not_free() {
    let _ = env_logger::Builder::from_env("RINGPTR_LOG").try_init();

    let drops = Rc::new(Cell::new(0));
    let mut a = RingPtr::new(Instrumented {
        drops: Rc::clone(&drops),
    });
    let b = a.clone();

    // `a` and `b` denote the same object, so replacing one with the other
    // must leave everything untouched.
    a.clone_from(&b);
    assert_eq!(drops.get(), 0);
    assert!(RingPtr::ptr_eq(&a, &b));

    drop(a);
    drop(b);
    assert_eq!(drops.get(), 1);
}

#[test]
fn assigning_through_a_round_trip_copy_does_not_free() {
    let _ = env_logger::Builder::from_env("RINGPTR_LOG").try_init();

    let drops = Rc::new(Cell::new(0));
    let mut a = RingPtr::new(Instrumented {
        drops: Rc::clone(&drops),
    });

    // The copy joins the ring before the old handle state is dropped, so
    // even a destroy-then-copy replacement of a sole owner cannot free the
    // object out from under the copy.
    let copy = a.clone();
    a = copy;
    assert_eq!(drops.get(), 0);
    assert!(RingPtr::is_unique(&a));

    drop(a);
    assert_eq!(drops.get(), 1);
}

#[test]
fn replacement_with_a_different_object_frees_the_old_one_once() {
    let _ = env_logger::Builder::from_env("RINGPTR_LOG").try_init();

    let old_drops = Rc::new(Cell::new(0));
    let new_drops = Rc::new(Cell::new(0));
    let mut a = RingPtr::new(Instrumented {
        drops: Rc::clone(&old_drops),
    });
    let b = RingPtr::new(Instrumented {
        drops: Rc::clone(&new_drops),
    });

    a.clone_from(&b);
    assert_eq!(old_drops.get(), 1);
    assert_eq!(new_drops.get(), 0);

    drop(a);
    drop(b);
    assert_eq!(old_drops.get(), 1);
    assert_eq!(new_drops.get(), 1);
}
