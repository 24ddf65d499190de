//! Shared ownership of one heap-allocated object.
//!
//! A [`SharedPtr`] and its clones own the object jointly. The counters live in
//! a separately allocated [`RefBlock`]; the object is destroyed when the last
//! owner goes away, and the block once the last [`WeakPtr`] observer does too.
//!
//! Reference counts are not atomic. Handles are neither `Send` nor `Sync`, so
//! a group of handles never leaves the thread that created it.

use core::{fmt, marker::PhantomData, ops::Deref};

use crate::{
    error::Error,
    heap::{self, Global, Heap},
    layout::HasLayout,
    ptr::Ptr,
    raw::{RefBlock, RefGroup},
    weak::WeakPtr,
};

/// A reference-counted owner of a `T`, possibly empty.
pub struct SharedPtr<T, H: Heap = Global> {
    pub(crate) group: Option<RefGroup<T, H>>,
    _marker: PhantomData<T>,
}

impl<T> SharedPtr<T, Global> {
    /// Moves `value` to the heap as the first owner: `use_count() == 1`,
    /// no observers.
    #[inline]
    #[track_caller]
    pub fn new(value: T) -> SharedPtr<T, Global> {
        SharedPtr::new_in(value, Global)
    }
}

impl<T, H: Heap> SharedPtr<T, H> {
    /// As [`SharedPtr::new`], allocating both the object and its counter
    /// block from `heap`. Allocation failure is fatal.
    #[inline]
    #[track_caller]
    pub fn new_in(value: T, heap: H) -> SharedPtr<T, H> {
        heap::or_abort(SharedPtr::try_new_in(value, heap))
    }

    /// As [`SharedPtr::new_in`], returning allocation failure instead.
    #[inline]
    pub fn try_new_in(value: T, heap: H) -> Result<SharedPtr<T, H>, Error> {
        Ok(SharedPtr::from_group(RefGroup::allocate(value, heap)?))
    }

    /// A handle that owns nothing.
    #[inline]
    pub const fn empty() -> SharedPtr<T, H> {
        SharedPtr {
            group: None,
            _marker: PhantomData,
        }
    }

    /// Wraps a group whose strong reference the caller hands over.
    #[inline]
    pub(crate) fn from_group(group: RefGroup<T, H>) -> SharedPtr<T, H> {
        SharedPtr {
            group: Some(group),
            _marker: PhantomData,
        }
    }

    /// Number of owners, or zero for an empty handle.
    #[inline]
    pub fn use_count(&self) -> usize {
        self.group.map_or(0, |group| group.block().strong())
    }

    /// Number of observers, or zero for an empty handle.
    #[inline]
    pub fn weak_count(&self) -> usize {
        self.group.map_or(0, |group| group.block().weak())
    }

    /// Whether this is the only owner.
    #[inline]
    pub fn unique(&self) -> bool {
        self.use_count() == 1
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.group.is_some()
    }

    #[inline]
    pub fn get(&self) -> Option<&T> {
        // SAFETY: While this handle holds a strong reference the object is
        //         alive, and shared access is all a shared owner gets.
        self.group.map(|group| unsafe { &*group.object.as_ptr() })
    }

    #[inline]
    pub fn try_get(&self) -> Result<&T, Error> {
        self.get().ok_or(Error::Empty)
    }

    /// Mutable access, granted only when no other owner or observer exists
    /// that could reach the object concurrently with the borrow.
    #[inline]
    pub fn get_mut(&mut self) -> Option<&mut T> {
        let group = self.group?;
        let block = group.block();
        if block.strong() == 1 && block.weak() == 0 {
            // SAFETY: This handle is the only path to the object.
            Some(unsafe { &mut *group.object.as_ptr() })
        } else {
            None
        }
    }

    #[inline]
    pub fn as_ptr(&self) -> Ptr<T> {
        match self.group {
            Some(group) => Ptr::from_non_null(group.object),
            None => Ptr::null(),
        }
    }

    /// The counter block of this group, if any.
    #[inline]
    pub fn ref_block(&self) -> Option<&RefBlock<H>> {
        self.group.as_ref().map(RefGroup::block)
    }

    /// Whether both handles own the same object. Two empty handles are equal.
    #[inline]
    pub fn ptr_eq(&self, other: &SharedPtr<T, H>) -> bool {
        self.group == other.group
    }

    /// Moves ownership into a new handle, leaving this one empty. Counts are
    /// unchanged.
    #[inline]
    pub fn take(&mut self) -> SharedPtr<T, H> {
        SharedPtr {
            group: self.group.take(),
            _marker: PhantomData,
        }
    }

    /// Gives up this handle's ownership, leaving it empty.
    #[inline]
    pub fn reset(&mut self) {
        if let Some(group) = self.group.take() {
            // SAFETY: The handle owned one strong reference and no longer
            //         refers to the group.
            unsafe { group.release_strong() };
        }
    }

    /// A new observer of this handle's object.
    #[inline]
    pub fn downgrade(&self) -> WeakPtr<T, H> {
        WeakPtr::from(self)
    }

    /// Moves the object out if this is its only owner.
    ///
    /// Observers see the object as expired afterwards. Otherwise the handle is
    /// returned unchanged.
    pub fn try_unwrap(mut self) -> Result<T, SharedPtr<T, H>> {
        let group = match self.group {
            Some(group) => group,
            None => return Err(self),
        };
        if group.block().strong() != 1 {
            return Err(self);
        }
        self.group = None;

        // SAFETY: This is the last strong reference; the object is read once
        //         and its memory released without dropping it again.
        unsafe {
            let value = group.object.as_ptr().read();
            group.release_moved();
            Ok(value)
        }
    }
}

impl<T, H: Heap> Clone for SharedPtr<T, H> {
    /// Another owner of the same object; `use_count` grows by one.
    #[inline]
    fn clone(&self) -> Self {
        if let Some(group) = self.group {
            group.block().inc_strong();
        }

        SharedPtr {
            group: self.group,
            _marker: PhantomData,
        }
    }
}

impl<T, H: Heap> Drop for SharedPtr<T, H> {
    #[inline]
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T, H: Heap> Default for SharedPtr<T, H> {
    #[inline]
    fn default() -> Self {
        SharedPtr::empty()
    }
}

impl<T, H: Heap> From<&WeakPtr<T, H>> for SharedPtr<T, H> {
    /// Same as [`WeakPtr::lock`].
    #[inline]
    fn from(weak: &WeakPtr<T, H>) -> Self {
        weak.lock()
    }
}

impl<T, H: Heap> Deref for SharedPtr<T, H> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        match self.get() {
            Some(object) => object,
            None => panic!("dereferenced an empty SharedPtr"),
        }
    }
}

impl<T: fmt::Debug, H: Heap> fmt::Debug for SharedPtr<T, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(object) => f.debug_tuple("SharedPtr").field(object).finish(),
            None => f.write_str("SharedPtr(<empty>)"),
        }
    }
}

impl<T, H: Heap> fmt::Pointer for SharedPtr<T, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&self.as_ptr(), f)
    }
}

// Payload and block sizes are fixed per type; keep the block small.
const _: () = assert!(<RefBlock<Global> as HasLayout>::SIZE == 2 * core::mem::size_of::<usize>());
