//! Lifetime management for values living in raw storage.
//!
//! These are the primitives the owning handles build on: a value is placed
//! into memory that was allocated separately, and later torn down in place
//! before that memory is handed back. Ownership transfer itself needs no
//! helper, since a Rust move already is a bitwise relocation; `mem::swap` and
//! `mem::replace` cover exchange.

use core::{
    mem::{self, MaybeUninit},
    ptr,
};

use crate::layout::HasLayout;

/// Places `value` at `dest` without reading or dropping whatever was there.
///
/// # Safety
///
/// - `dest` must be valid for writes and aligned for `T`.
/// - Any value previously at `dest` is overwritten without being dropped.
#[inline]
pub unsafe fn construct_at<T>(dest: *mut T, value: T) -> *mut T {
    unsafe { dest.write(value) };
    dest
}

/// Runs the destructor of the value at `object`, leaving the memory
/// uninitialized. Types without drop glue cost nothing.
///
/// # Safety
///
/// - `object` must point to a live, aligned `T`.
/// - The value must not be used again until something is constructed there.
#[inline]
pub unsafe fn destroy_at<T>(object: *mut T) {
    if T::NEEDS_DROP {
        unsafe { ptr::drop_in_place(object) }
    }
}

/// Destroys `count` contiguous values starting at `first`.
///
/// # Safety
///
/// - `first..first + count` must all be live, aligned values of `T`.
#[inline]
pub unsafe fn destroy_n<T>(first: *mut T, count: usize) {
    if T::NEEDS_DROP {
        unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(first, count)) }
    }
}

/// Destroys every value in the half-open range `first..last`.
///
/// # Safety
///
/// - `T` must not be zero-sized; use [`destroy_n`] for those.
/// - `first` and `last` must belong to the same allocation, `first <= last`.
/// - Every value in the range must be live.
#[inline]
pub unsafe fn destroy<T>(first: *mut T, last: *mut T) {
    let count = unsafe { last.offset_from(first) };
    debug_assert!(count >= 0, "`last` precedes `first`");

    unsafe { destroy_n(first, count as usize) }
}

/// Fills `dest` with default values and returns it as initialized.
///
/// If `T::default` panics, the values built so far are destroyed.
pub fn default_construct<T: Default>(dest: &mut [MaybeUninit<T>]) -> &mut [T] {
    let len = dest.len();
    let mut guard = Partial {
        first: dest.as_mut_ptr().cast::<T>(),
        count: 0,
    };
    while guard.count < len {
        // SAFETY: `count < len`, so the slot lies inside `dest`.
        unsafe { guard.first.add(guard.count).write(T::default()) };
        guard.count += 1;
    }
    mem::forget(guard);

    // SAFETY: Every slot of `dest` was written above.
    unsafe { &mut *(dest as *mut [MaybeUninit<T>] as *mut [T]) }
}

/// Clones each value of `src` into the front of `dest` and returns that
/// initialized prefix.
///
/// If a clone panics, the values cloned so far are destroyed.
///
/// # Panics
///
/// Panics if `dest` is shorter than `src`.
#[track_caller]
pub fn uninitialized_copy<'d, T: Clone>(src: &[T], dest: &'d mut [MaybeUninit<T>]) -> &'d mut [T] {
    assert!(
        dest.len() >= src.len(),
        "destination holds {} values, source has {}",
        dest.len(),
        src.len()
    );

    let dest = &mut dest[..src.len()];
    let mut guard = Partial {
        first: dest.as_mut_ptr().cast::<T>(),
        count: 0,
    };
    for value in src {
        // SAFETY: `count < src.len()`, so the slot lies inside `dest`.
        unsafe { guard.first.add(guard.count).write(value.clone()) };
        guard.count += 1;
    }
    mem::forget(guard);

    // SAFETY: Every slot of `dest` was written above.
    unsafe { &mut *(dest as *mut [MaybeUninit<T>] as *mut [T]) }
}

/// Relocates `count` values from `src` to `dest`.
///
/// # Safety
///
/// - `src..src + count` must be live values; afterwards they are logically
///   uninitialized and must not be dropped.
/// - `dest..dest + count` must be valid for writes and must not overlap `src`.
#[inline]
pub unsafe fn uninitialized_move<T>(src: *mut T, dest: *mut T, count: usize) -> *mut T {
    unsafe { ptr::copy_nonoverlapping(src, dest, count) };
    dest
}

/// Initialized prefix of a buffer under construction, destroyed on unwind.
struct Partial<T> {
    first: *mut T,
    count: usize,
}

impl<T> Drop for Partial<T> {
    fn drop(&mut self) {
        // SAFETY: Only reached while unwinding, with `count` live values.
        unsafe { destroy_n(self.first, self.count) }
    }
}

#[cfg(test)]
mod tests {
    use core::{cell::Cell, mem::MaybeUninit};

    use super::*;

    struct Counted<'a>(&'a Cell<usize>);

    impl Drop for Counted<'_> {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn construct_then_destroy_in_place() {
        let drops = Cell::new(0);
        let mut slot = MaybeUninit::<Counted>::uninit();

        let object = unsafe { construct_at(slot.as_mut_ptr(), Counted(&drops)) };
        assert_eq!(drops.get(), 0);
        unsafe { destroy_at(object) };
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn destroy_range_drops_each_value_once() {
        let drops = Cell::new(0);
        let mut slots: [MaybeUninit<Counted>; 4] = [const { MaybeUninit::uninit() }; 4];
        for slot in slots.iter_mut() {
            slot.write(Counted(&drops));
        }

        let first = slots.as_mut_ptr().cast::<Counted>();
        unsafe { destroy(first, first.add(4)) };
        assert_eq!(drops.get(), 4);
    }

    #[test]
    fn default_construct_fills_every_slot() {
        let mut slots = [MaybeUninit::<u32>::uninit(); 3];
        let values = default_construct(&mut slots);
        assert_eq!(values, &[0, 0, 0]);
    }

    #[test]
    fn uninitialized_copy_clones_into_prefix() {
        let src = [String::from("a"), String::from("b")];
        let mut slots: [MaybeUninit<String>; 3] = [const { MaybeUninit::uninit() }; 3];

        let copied = uninitialized_copy(&src, &mut slots);
        assert_eq!(copied, &["a", "b"]);
        unsafe { destroy_n(copied.as_mut_ptr(), copied.len()) };
    }

    thread_local! {
        static BUILT: Cell<usize> = const { Cell::new(0) };
        static DROPPED: Cell<usize> = const { Cell::new(0) };
    }

    /// Refuses to build a third value.
    struct ThirdFails;

    impl Default for ThirdFails {
        fn default() -> Self {
            let built = BUILT.with(|built| built.replace(built.get() + 1));
            if built == 2 {
                panic!("third default refused");
            }
            ThirdFails
        }
    }

    impl Drop for ThirdFails {
        fn drop(&mut self) {
            DROPPED.with(|dropped| dropped.set(dropped.get() + 1));
        }
    }

    #[test]
    fn default_construct_unwinds_built_prefix() {
        let mut slots: [MaybeUninit<ThirdFails>; 4] = [const { MaybeUninit::uninit() }; 4];

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            default_construct(&mut slots);
        }));
        assert!(result.is_err());
        assert_eq!(BUILT.with(Cell::get), 3);
        assert_eq!(DROPPED.with(Cell::get), 2);
    }

    struct Brittle<'a> {
        fails: bool,
        drops: &'a Cell<usize>,
    }

    impl Clone for Brittle<'_> {
        fn clone(&self) -> Self {
            if self.fails {
                panic!("clone refused");
            }
            Brittle { fails: false, drops: self.drops }
        }
    }

    impl Drop for Brittle<'_> {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    #[test]
    fn uninitialized_copy_unwinds_cloned_prefix() {
        let drops = Cell::new(0);
        let src = [
            Brittle { fails: false, drops: &drops },
            Brittle { fails: false, drops: &drops },
            Brittle { fails: true, drops: &drops },
        ];
        let mut slots: [MaybeUninit<Brittle>; 4] = [const { MaybeUninit::uninit() }; 4];

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            uninitialized_copy(&src, &mut slots);
        }));
        assert!(result.is_err());
        assert_eq!(drops.get(), 2);

        drop(src);
        assert_eq!(drops.get(), 5);
    }

    #[test]
    fn uninitialized_copy_result_is_usable() {
        let src = [1u16, 2, 3];
        let mut slots = [MaybeUninit::<u16>::uninit(); 5];

        let copied = uninitialized_copy(&src, &mut slots);
        copied[1] = 20;
        assert_eq!(copied, &[1, 20, 3]);
    }

    #[test]
    fn uninitialized_move_relocates_without_dropping() {
        let drops = Cell::new(0);
        let mut src = [MaybeUninit::new(Counted(&drops)), MaybeUninit::new(Counted(&drops))];
        let mut dest: [MaybeUninit<Counted>; 2] = [const { MaybeUninit::uninit() }; 2];

        let moved = unsafe {
            uninitialized_move(src.as_mut_ptr().cast::<Counted>(), dest.as_mut_ptr().cast(), 2)
        };
        assert_eq!(drops.get(), 0);
        unsafe { destroy_n(moved, 2) };
        assert_eq!(drops.get(), 2);
    }
}
