extern crate lifeline;

use std::alloc::Layout;
use std::cell::Cell;
use std::mem;
use std::ptr::NonNull;

use lifeline::{Error, Global, Heap, SharedPtr, Tally, UniquePtr};

/// Refuses every request, counting how many it saw.
#[derive(Default)]
struct Refuse {
    asked: Cell<usize>,
}

unsafe impl Heap for Refuse {
    unsafe fn alloc(&self, layout: Layout) -> Result<NonNull<u8>, Error> {
        self.asked.set(self.asked.get() + 1);
        Err(Error::OutOfMemory {
            size: layout.size(),
            align: layout.align(),
        })
    }

    unsafe fn dealloc(&self, _: NonNull<u8>, _: Layout) {
        panic!("nothing was ever allocated");
    }
}

#[test]
fn test_tally_counts_blocks_and_bytes() {
    let tally = Tally::new();
    assert_eq!(tally.live(), 0);
    assert_eq!(tally.used(), 0);
    {
        let x = UniquePtr::new_in(5usize, &tally);
        assert_eq!(tally.live(), 1);
        assert_eq!(tally.used(), mem::size_of::<usize>());
        {
            let y = UniquePtr::new_in(9usize, &tally);
            assert_eq!(tally.live(), 2);
            assert_eq!(tally.used(), 2 * mem::size_of::<usize>());
            assert_eq!(*x + *y, 14);
        }
        assert_eq!(tally.live(), 1);
        assert_eq!(tally.deallocations(), 1);
    }
    assert_eq!(tally.live(), 0);
    assert_eq!(tally.used(), 0);
    assert_eq!(tally.allocations(), 2);
}

#[test]
fn test_shared_block_carries_its_heap() {
    let tally = Tally::new();
    let x = SharedPtr::new_in(1u16, &tally);
    let block = x.ref_block().unwrap();

    assert!(std::ptr::eq(*block.heap(), &tally));
    assert_eq!(tally.used(), mem::size_of::<u16>() + mem::size_of::<lifeline::RefBlock<&Tally>>());
}

#[test]
fn test_nested_tallies() {
    let outer = Tally::new();
    let inner = Tally::new_in(&outer);
    {
        let _x = SharedPtr::new_in([0u32; 4], &inner);
        assert_eq!(inner.live(), 2);
        assert_eq!(outer.live(), 2);
        assert_eq!(inner.used(), outer.used());
    }
    assert_eq!(outer.live(), 0);
}

#[test]
fn test_limit_is_a_live_byte_budget() {
    let tally = Tally::with_limit(16);
    let x = UniquePtr::try_new_in(0u64, &tally).unwrap();
    let y = UniquePtr::try_new_in(0u64, &tally).unwrap();
    assert_eq!(
        UniquePtr::try_new_in(0u64, &tally).err(),
        Some(Error::OutOfMemory { size: 8, align: mem::align_of::<u64>() })
    );

    mem::drop(x);
    assert!(UniquePtr::try_new_in(0u64, &tally).is_ok());
    mem::drop(y);
}

#[test]
fn test_refusing_heap() {
    let refuse = Refuse::default();

    assert!(SharedPtr::try_new_in(1u8, &refuse).is_err());
    assert!(UniquePtr::try_new_in(1u8, &refuse).is_err());
    assert_eq!(refuse.asked.get(), 2);

    let zst = UniquePtr::try_new_in((), &refuse);
    assert!(zst.is_ok());
    assert_eq!(refuse.asked.get(), 2);
}

#[test]
fn test_global_is_default() {
    let x: UniquePtr<u8> = UniquePtr::new_in(1, Global);
    let y = UniquePtr::new(1u8);
    assert_eq!(*x, *y);
    assert_eq!(*x.heap(), Global);
}
