use core::{cell::Cell, ptr::NonNull};

use log::trace;

use crate::{
    construct::{construct_at, destroy_at},
    error::Error,
    heap::{self, Heap},
    layout::HasLayout,
};

/// Counter record shared by every [`SharedPtr`](crate::SharedPtr) and
/// [`WeakPtr`](crate::WeakPtr) of one payload.
///
/// Allocated separately from the payload, from the heap it carries. The
/// payload dies when `strong` drops to zero; the block itself is released once
/// `strong` and `weak` are both zero. The counters are plain cells: a group of
/// handles belongs to one thread.
#[repr(C)]
pub struct RefBlock<H> {
    /// Number of owning handles.
    strong: Cell<usize>,
    /// Number of observing handles.
    weak: Cell<usize>,
    /// The heap both the payload and this block came from.
    heap: H,
}

impl<H: Heap> RefBlock<H> {
    /// Reserves memory for a block without initializing it, so the payload
    /// can be allocated from the same heap before the heap moves in.
    #[inline]
    pub(crate) fn reserve(heap: &H) -> Result<NonNull<RefBlock<H>>, Error> {
        Ok(heap::allocate(heap, RefBlock::<H>::LAYOUT)?.cast())
    }

    /// Initializes reserved memory as a block owned by one strong handle.
    ///
    /// # Safety
    ///
    /// - `mem` must come from [`RefBlock::reserve`] on `heap`.
    #[inline]
    pub(crate) unsafe fn init(mem: NonNull<RefBlock<H>>, heap: H) -> NonNull<RefBlock<H>> {
        let block = RefBlock {
            strong: Cell::new(1),
            weak: Cell::new(0),
            heap,
        };

        // SAFETY: The caller provides fresh, properly sized memory.
        unsafe { construct_at(mem.as_ptr(), block) };
        mem
    }

    /// Hands reserved but uninitialized memory back.
    ///
    /// # Safety
    ///
    /// - `mem` must come from [`RefBlock::reserve`] on `heap` and must not
    ///   have been initialized.
    #[inline]
    pub(crate) unsafe fn unreserve(mem: NonNull<RefBlock<H>>, heap: &H) {
        unsafe { heap::deallocate(heap, mem.cast(), RefBlock::<H>::LAYOUT) }
    }

    /// Destroys the block and returns its memory to the heap inside it.
    ///
    /// # Safety
    ///
    /// - Both counters must be zero and no handle may refer to `block`.
    unsafe fn release(block: NonNull<RefBlock<H>>) {
        unsafe {
            let heap = core::ptr::read(&(*block.as_ptr()).heap);
            heap::deallocate(&heap, block.cast(), RefBlock::<H>::LAYOUT);
        }
        trace!(target: "lifeline::shared", "released ref block {:p}", block);
    }
}

impl<H> RefBlock<H> {
    #[inline]
    pub fn strong(&self) -> usize {
        self.strong.get()
    }

    #[inline]
    pub fn weak(&self) -> usize {
        self.weak.get()
    }

    #[inline]
    pub fn heap(&self) -> &H {
        &self.heap
    }

    #[inline]
    pub(crate) fn inc_strong(&self) {
        match self.strong.get().checked_add(1) {
            Some(strong) => self.strong.set(strong),
            None => panic!("strong count overflow"),
        }
    }

    #[inline]
    pub(crate) fn dec_strong(&self) -> usize {
        let strong = match self.strong.get().checked_sub(1) {
            Some(strong) => strong,
            None => panic!("strong count underflow"),
        };
        self.strong.set(strong);
        strong
    }

    #[inline]
    pub(crate) fn inc_weak(&self) {
        match self.weak.get().checked_add(1) {
            Some(weak) => self.weak.set(weak),
            None => panic!("weak count overflow"),
        }
    }

    #[inline]
    pub(crate) fn dec_weak(&self) -> usize {
        let weak = match self.weak.get().checked_sub(1) {
            Some(weak) => weak,
            None => panic!("weak count underflow"),
        };
        self.weak.set(weak);
        weak
    }
}

/// The pair of pointers every shared or weak handle carries.
pub(crate) struct RefGroup<T, H> {
    pub(crate) object: NonNull<T>,
    pub(crate) block: NonNull<RefBlock<H>>,
}

impl<T, H: Heap> RefGroup<T, H> {
    /// Allocates the payload and a fresh block holding one strong reference.
    pub(crate) fn allocate(value: T, heap: H) -> Result<RefGroup<T, H>, Error> {
        let mem = RefBlock::reserve(&heap)?;
        let object = match heap::allocate_value(&heap, value) {
            Ok(object) => object,
            Err(error) => {
                // SAFETY: `mem` was just reserved from `heap`.
                unsafe { RefBlock::unreserve(mem, &heap) };
                return Err(error);
            }
        };

        // SAFETY: `mem` was just reserved from `heap`.
        let block = unsafe { RefBlock::init(mem, heap) };
        Ok(RefGroup { object, block })
    }

    /// Gives up one strong reference, destroying the payload on the last one.
    ///
    /// # Safety
    ///
    /// - The caller must own one of the strong references and not use it again.
    pub(crate) unsafe fn release_strong(self) {
        let block = unsafe { self.block.as_ref() };
        if block.dec_strong() != 0 {
            return;
        }

        // A weak reference pins the block while the payload's destructor runs,
        // in case the payload owns weak handles to itself.
        block.inc_weak();
        unsafe {
            destroy_at(self.object.as_ptr());
            heap::deallocate(block.heap(), self.object.cast(), T::LAYOUT);
        }
        trace!(target: "lifeline::shared", "destroyed payload {:p}", self.object);

        unsafe { self.release_weak() };
    }

    /// Gives up one strong reference held by a payload that was already moved
    /// out. Only frees the payload memory.
    ///
    /// # Safety
    ///
    /// - The caller must own the only strong reference, and the payload must
    ///   already be logically uninitialized.
    pub(crate) unsafe fn release_moved(self) {
        let block = unsafe { self.block.as_ref() };
        debug_assert_eq!(block.strong(), 1, "payload moved out of a shared group");

        block.dec_strong();
        block.inc_weak();
        unsafe {
            heap::deallocate(block.heap(), self.object.cast(), T::LAYOUT);
            self.release_weak();
        }
    }

    /// Gives up one weak reference, releasing the block when nothing is left.
    ///
    /// # Safety
    ///
    /// - The caller must own one of the weak references and not use it again.
    pub(crate) unsafe fn release_weak(self) {
        let block = unsafe { self.block.as_ref() };
        if block.dec_weak() == 0 && block.strong() == 0 {
            unsafe { RefBlock::release(self.block) };
        }
    }
}

impl<T, H> RefGroup<T, H> {
    #[inline]
    pub(crate) fn block(&self) -> &RefBlock<H> {
        // SAFETY: A group only exists while it holds a strong or weak
        //         reference, which keeps the block alive.
        unsafe { self.block.as_ref() }
    }
}

impl<T, H> Clone for RefGroup<T, H> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, H> Copy for RefGroup<T, H> {}

impl<T, H> PartialEq for RefGroup<T, H> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.block == other.block
    }
}
