extern crate lifeline;

use std::cell::RefCell;
use std::mem;

use lifeline::{Error, Global, SharedPtr, Tally, WeakPtr};

#[test]
fn test_observe_then_expire() {
    let x = SharedPtr::new(99);
    assert_eq!(x.use_count(), 1);

    let w = WeakPtr::from(&x);
    assert_eq!(x.use_count(), 1);
    assert_eq!(w.use_count(), 1);
    assert_eq!(w.weak_count(), 1);
    assert!(!w.expired());

    mem::drop(x);
    assert!(w.expired());
    assert_eq!(w.use_count(), 0);
    assert!(!w.lock().is_valid());
}

#[test]
fn test_weak_does_not_keep_alive() {
    let tally = Tally::new();
    let x = SharedPtr::new_in(String::from("short lived"), &tally);
    let y = x.clone();
    let weaks: Vec<WeakPtr<String, &Tally>> = (0..5).map(|_| x.downgrade()).collect();
    assert_eq!(x.weak_count(), 5);
    assert_eq!(tally.live(), 2);

    mem::drop(x);
    assert!(weaks.iter().all(|w| !w.expired()));
    mem::drop(y);

    assert_eq!(tally.live(), 1);
    for w in &weaks {
        assert!(w.expired());
        assert!(!w.lock().is_valid());
        assert_eq!(w.upgrade().err(), Some(Error::Expired));
    }

    mem::drop(weaks);
    assert_eq!(tally.live(), 0);
}

#[test]
fn test_lock_promotes() {
    let x = SharedPtr::new(vec![1, 2, 3]);
    let w = x.downgrade();

    let y = w.lock();
    assert!(y.is_valid());
    assert_eq!(x.use_count(), 2);
    assert!(y.ptr_eq(&x));
    assert_eq!(*y, [1, 2, 3]);

    let z = SharedPtr::from(&w);
    assert_eq!(z.use_count(), 3);
    assert_eq!(w.upgrade().map(|s| s.use_count()), Ok(4));
    assert_eq!(x.use_count(), 3);
}

#[test]
fn test_block_outlives_payload_until_last_weak() {
    let tally = Tally::new();
    let x = SharedPtr::new_in(7u64, &tally);
    let w0 = x.downgrade();
    let w1 = w0.clone();
    assert_eq!(tally.live(), 2);
    assert_eq!(w1.weak_count(), 2);

    mem::drop(x);
    assert_eq!(tally.live(), 1);
    assert_eq!(tally.deallocations(), 1);

    mem::drop(w0);
    assert_eq!(tally.live(), 1);
    assert_eq!(w1.weak_count(), 1);

    mem::drop(w1);
    assert_eq!(tally.live(), 0);
    assert_eq!(tally.deallocations(), 2);
}

#[test]
fn test_block_freed_once_with_shared_outliving_weak() {
    let tally = Tally::new();
    let x = SharedPtr::new_in(7u64, &tally);
    let w = x.downgrade();

    mem::drop(w);
    assert_eq!(tally.live(), 2);
    mem::drop(x);
    assert_eq!(tally.live(), 0);
    assert_eq!(tally.allocations(), 2);
    assert_eq!(tally.deallocations(), 2);
}

struct Node<'a> {
    this: RefCell<WeakPtr<Node<'a>, &'a Tally>>,
}

#[test]
fn test_payload_observing_itself() {
    let tally = Tally::new();
    let node = SharedPtr::new_in(
        Node {
            this: RefCell::new(WeakPtr::new()),
        },
        &tally,
    );
    *node.this.borrow_mut() = node.downgrade();

    assert_eq!(node.use_count(), 1);
    assert_eq!(node.weak_count(), 1);
    assert!(node.this.borrow().lock().ptr_eq(&node));

    mem::drop(node);
    assert_eq!(tally.live(), 0);
    assert_eq!(tally.deallocations(), 2);
}

#[test]
fn test_empty_observer() {
    let mut w = WeakPtr::<u8, Global>::new();
    assert!(w.expired());
    assert_eq!(w.weak_count(), 0);
    assert_eq!(w.upgrade().err(), Some(Error::Empty));
    assert!(w.as_ptr().as_ptr().is_null());
    assert!(w.ptr_eq(&WeakPtr::default()));

    let x = SharedPtr::new(3u8);
    w = x.downgrade();
    let v = w.take();
    assert!(w.expired());
    assert!(!v.expired());
    assert_eq!(x.weak_count(), 1);
}
