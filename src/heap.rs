//! Pluggable allocation strategies for the owning handles.
//!
//! Every owning handle in this crate is parameterized by a [`Heap`] and
//! defaults to [`Global`]. Zero-sized layouts are intercepted before they reach
//! a heap, so implementations only ever see non-empty requests.

use core::{alloc::Layout, cell::Cell, ptr::NonNull};
use std::alloc as system;

use log::{debug, trace};
use sptr::invalid_mut;

use crate::{error::Error, layout::HasLayout};

/// A source of raw memory blocks.
///
/// # Safety
///
/// A block returned by [`Heap::alloc`] must be valid for reads and writes of
/// `layout.size()` bytes, aligned to `layout.align()`, and must stay valid until
/// it is handed back to [`Heap::dealloc`] on the same heap.
pub unsafe trait Heap {
    /// Allocates a block fitting `layout`.
    ///
    /// # Safety
    ///
    /// - `layout.size()` must not be zero.
    unsafe fn alloc(&self, layout: Layout) -> Result<NonNull<u8>, Error>;

    /// Releases a block previously returned by [`Heap::alloc`].
    ///
    /// # Safety
    ///
    /// - `ptr` must come from `self.alloc(layout)` with this exact `layout`.
    /// - `ptr` must not be used afterwards.
    unsafe fn dealloc(&self, ptr: NonNull<u8>, layout: Layout);
}

unsafe impl<H: Heap + ?Sized> Heap for &H {
    #[inline]
    unsafe fn alloc(&self, layout: Layout) -> Result<NonNull<u8>, Error> {
        unsafe { (**self).alloc(layout) }
    }

    #[inline]
    unsafe fn dealloc(&self, ptr: NonNull<u8>, layout: Layout) {
        unsafe { (**self).dealloc(ptr, layout) }
    }
}

/// The process-wide system allocator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Global;

unsafe impl Heap for Global {
    #[inline]
    unsafe fn alloc(&self, layout: Layout) -> Result<NonNull<u8>, Error> {
        // SAFETY: The caller ensures that `layout` is not zero-sized.
        let raw = unsafe { system::alloc(layout) };

        NonNull::new(raw).ok_or(Error::OutOfMemory {
            size: layout.size(),
            align: layout.align(),
        })
    }

    #[inline]
    unsafe fn dealloc(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: The caller ensures `ptr` was allocated with `layout`.
        unsafe { system::dealloc(ptr.as_ptr(), layout) }
    }
}

/// A heap that counts what passes through it.
///
/// Wraps another heap (the system allocator by default) and keeps live and
/// lifetime totals, optionally refusing requests beyond a byte budget. The
/// counters are plain cells, so a `Tally` is confined to one thread.
#[derive(Debug, Default)]
pub struct Tally<H = Global> {
    inner: H,
    live: Cell<usize>,
    used: Cell<usize>,
    allocations: Cell<usize>,
    limit: Option<usize>,
}

impl Tally<Global> {
    /// A counting wrapper around the system allocator.
    #[inline]
    #[must_use]
    pub fn new() -> Tally<Global> {
        Tally::new_in(Global)
    }

    /// A counting wrapper that refuses to hold more than `limit` live bytes.
    #[inline]
    #[must_use]
    pub fn with_limit(limit: usize) -> Tally<Global> {
        Tally {
            limit: Some(limit),
            ..Tally::new()
        }
    }
}

impl<H: Heap> Tally<H> {
    #[inline]
    #[must_use]
    pub fn new_in(inner: H) -> Tally<H> {
        Tally {
            inner,
            live: Cell::new(0),
            used: Cell::new(0),
            allocations: Cell::new(0),
            limit: None,
        }
    }

    /// Number of blocks currently allocated.
    #[inline]
    pub fn live(&self) -> usize {
        self.live.get()
    }

    /// Number of bytes currently allocated.
    #[inline]
    pub fn used(&self) -> usize {
        self.used.get()
    }

    /// Number of successful allocations over the heap's lifetime.
    #[inline]
    pub fn allocations(&self) -> usize {
        self.allocations.get()
    }

    /// Number of blocks released over the heap's lifetime.
    #[inline]
    pub fn deallocations(&self) -> usize {
        self.allocations.get() - self.live.get()
    }
}

unsafe impl<H: Heap> Heap for Tally<H> {
    unsafe fn alloc(&self, layout: Layout) -> Result<NonNull<u8>, Error> {
        let used = self.used.get() + layout.size();
        if matches!(self.limit, Some(limit) if used > limit) {
            return Err(Error::OutOfMemory {
                size: layout.size(),
                align: layout.align(),
            });
        }

        // SAFETY: Forwarded from the caller.
        let ptr = unsafe { self.inner.alloc(layout) }?;
        self.live.set(self.live.get() + 1);
        self.used.set(used);
        self.allocations.set(self.allocations.get() + 1);
        trace!(target: "lifeline::heap", "alloc {:p} ({} bytes, {} live)", ptr, layout.size(), self.live.get());

        Ok(ptr)
    }

    unsafe fn dealloc(&self, ptr: NonNull<u8>, layout: Layout) {
        let live = match self.live.get().checked_sub(1) {
            Some(live) => live,
            None => panic!("tally live count underflow"),
        };
        self.live.set(live);
        self.used.set(self.used.get() - layout.size());
        trace!(target: "lifeline::heap", "dealloc {:p} ({} bytes, {} live)", ptr, layout.size(), live);

        // SAFETY: Forwarded from the caller.
        unsafe { self.inner.dealloc(ptr, layout) }
    }
}

/// A well-aligned, non-null pointer standing in for a zero-sized block.
#[inline]
pub(crate) fn dangling(layout: Layout) -> NonNull<u8> {
    // SAFETY: Alignments are never zero.
    unsafe { NonNull::new_unchecked(invalid_mut(layout.align())) }
}

/// Allocates a block for `layout`, answering zero-sized requests without
/// touching the heap.
#[inline]
pub(crate) fn allocate<H: Heap + ?Sized>(heap: &H, layout: Layout) -> Result<NonNull<u8>, Error> {
    if layout.size() == 0 {
        return Ok(dangling(layout));
    }

    // SAFETY: `layout` is not zero-sized.
    let result = unsafe { heap.alloc(layout) };
    if let Err(error) = &result {
        debug!(target: "lifeline::heap", "{}", error);
    }
    result
}

/// Releases a block from [`allocate`].
///
/// # Safety
///
/// - `ptr` must come from `allocate(heap, layout)`.
#[inline]
pub(crate) unsafe fn deallocate<H: Heap + ?Sized>(heap: &H, ptr: NonNull<u8>, layout: Layout) {
    if layout.size() != 0 {
        // SAFETY: Non-empty blocks were obtained from `heap.alloc(layout)`.
        unsafe { heap.dealloc(ptr, layout) }
    }
}

/// Moves `value` into a fresh block from `heap`.
///
/// `value` is dropped if the allocation fails.
#[inline]
pub(crate) fn allocate_value<T, H: Heap + ?Sized>(heap: &H, value: T) -> Result<NonNull<T>, Error> {
    let ptr = if T::IS_ZERO_SIZED {
        dangling(T::LAYOUT).cast::<T>()
    } else {
        allocate(heap, T::LAYOUT)?.cast::<T>()
    };

    // SAFETY: `ptr` is fresh, aligned, and large enough for a `T`.
    unsafe { crate::construct::construct_at(ptr.as_ptr(), value) };
    Ok(ptr)
}

/// Destroys the `T` at `ptr` and releases its block.
///
/// # Safety
///
/// - `ptr` must come from [`allocate_value`] on `heap` and hold a live `T`.
#[inline]
pub(crate) unsafe fn destroy_value<T, H: Heap + ?Sized>(heap: &H, ptr: NonNull<T>) {
    unsafe {
        crate::construct::destroy_at(ptr.as_ptr());
        if !T::IS_ZERO_SIZED {
            deallocate(heap, ptr.cast(), T::LAYOUT);
        }
    }
}

/// Unwraps an allocation result, treating failure as fatal.
#[inline]
#[track_caller]
pub(crate) fn or_abort<T>(result: Result<T, Error>) -> T {
    match result {
        Ok(value) => value,
        Err(Error::OutOfMemory { size, align }) => match Layout::from_size_align(size, align) {
            Ok(layout) => system::handle_alloc_error(layout),
            Err(_) => panic!("allocation failed with an invalid layout"),
        },
        Err(error) => panic!("allocation failed: {}", error),
    }
}
