use core::{
    fmt,
    marker::PhantomData,
    mem,
    ops::{Deref, DerefMut},
    ptr::NonNull,
};

use crate::{
    error::Error,
    heap::{self, Global, Heap},
    layout::HasLayout,
    ptr::Ptr,
};

/// Exclusive owner of one heap-allocated `T`.
///
/// Unlike `Box`, a `UniquePtr` may be empty: [`UniquePtr::take`] moves the
/// object into a new handle and leaves the source empty, and [`reset`]
/// destroys it early. Cloning deep-copies the object.
///
/// [`reset`]: UniquePtr::reset
pub struct UniquePtr<T, H: Heap = Global> {
    object: Option<NonNull<T>>,
    heap: H,
    _marker: PhantomData<T>,
}

impl<T> UniquePtr<T, Global> {
    #[inline]
    pub fn new(value: T) -> UniquePtr<T, Global> {
        UniquePtr::new_in(value, Global)
    }

    #[inline]
    pub const fn empty() -> UniquePtr<T, Global> {
        UniquePtr::empty_in(Global)
    }
}

impl<T, H: Heap> UniquePtr<T, H> {
    /// Moves `value` into a block from `heap`. Allocation failure is fatal.
    #[inline]
    #[track_caller]
    pub fn new_in(value: T, heap: H) -> UniquePtr<T, H> {
        heap::or_abort(UniquePtr::try_new_in(value, heap))
    }

    /// Moves `value` into a block from `heap`, dropping it if the allocation
    /// fails.
    pub fn try_new_in(value: T, heap: H) -> Result<UniquePtr<T, H>, Error> {
        let object = heap::allocate_value(&heap, value)?;

        Ok(UniquePtr {
            object: Some(object),
            heap,
            _marker: PhantomData,
        })
    }

    #[inline]
    pub const fn empty_in(heap: H) -> UniquePtr<T, H> {
        UniquePtr {
            object: None,
            heap,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.object.is_some()
    }

    #[inline]
    pub fn get(&self) -> Option<&T> {
        // SAFETY: A present pointer always refers to a live, owned `T`.
        self.object.map(|object| unsafe { &*object.as_ptr() })
    }

    #[inline]
    pub fn get_mut(&mut self) -> Option<&mut T> {
        // SAFETY: As in `get`, and `&mut self` makes the borrow exclusive.
        self.object.map(|object| unsafe { &mut *object.as_ptr() })
    }

    #[inline]
    pub fn try_get(&self) -> Result<&T, Error> {
        self.get().ok_or(Error::Empty)
    }

    #[inline]
    pub fn as_ptr(&self) -> Ptr<T> {
        match self.object {
            Some(object) => Ptr::from_non_null(object),
            None => Ptr::null(),
        }
    }

    #[inline]
    pub fn heap(&self) -> &H {
        &self.heap
    }

    /// Destroys the object, if any, leaving the handle empty.
    pub fn reset(&mut self) {
        if let Some(object) = self.object.take() {
            // SAFETY: `object` came from `allocate_value` on `self.heap`.
            unsafe { heap::destroy_value(&self.heap, object) };
        }
    }

    /// Replaces the object with `value`, destroying the old one first.
    #[track_caller]
    pub fn set(&mut self, value: T) {
        self.reset();
        self.object = Some(heap::or_abort(heap::allocate_value(&self.heap, value)));
    }

    /// Moves the object out of the heap, consuming the handle.
    pub fn into_inner(mut self) -> Option<T> {
        let object = self.object.take()?;

        // SAFETY: `object` is live and owned; it is read exactly once and its
        //         block released without running the destructor again.
        unsafe {
            let value = object.as_ptr().read();
            heap::deallocate(&self.heap, object.cast(), T::LAYOUT);
            Some(value)
        }
    }
}

impl<T, H: Heap> UniquePtr<T, H> {
    /// Moves ownership, heap included, into a new handle. This one is left
    /// empty on `heap`.
    #[inline]
    pub fn take_in(&mut self, heap: H) -> UniquePtr<T, H> {
        mem::replace(self, UniquePtr::empty_in(heap))
    }
}

impl<T, H: Heap + Default> UniquePtr<T, H> {
    /// Moves ownership, heap included, into a new handle, leaving this one
    /// empty on a default heap. Heaps without a default, such as `&Tally`,
    /// go through [`UniquePtr::take_in`].
    #[inline]
    pub fn take(&mut self) -> UniquePtr<T, H> {
        self.take_in(H::default())
    }
}

impl<T, H: Heap> Drop for UniquePtr<T, H> {
    #[inline]
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T, H: Heap> Deref for UniquePtr<T, H> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        match self.get() {
            Some(object) => object,
            None => panic!("dereferenced an empty UniquePtr"),
        }
    }
}

impl<T, H: Heap> DerefMut for UniquePtr<T, H> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        match self.get_mut() {
            Some(object) => object,
            None => panic!("dereferenced an empty UniquePtr"),
        }
    }
}

impl<T: Clone, H: Heap + Clone> Clone for UniquePtr<T, H> {
    #[track_caller]
    fn clone(&self) -> Self {
        match self.get() {
            Some(object) => UniquePtr::new_in(object.clone(), self.heap.clone()),
            None => UniquePtr::empty_in(self.heap.clone()),
        }
    }
}

impl<T, H: Heap + Default> Default for UniquePtr<T, H> {
    #[inline]
    fn default() -> Self {
        UniquePtr::empty_in(H::default())
    }
}

impl<T: fmt::Debug, H: Heap> fmt::Debug for UniquePtr<T, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(object) => f.debug_tuple("UniquePtr").field(object).finish(),
            None => f.write_str("UniquePtr(<empty>)"),
        }
    }
}

impl<T, H: Heap> fmt::Pointer for UniquePtr<T, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&self.as_ptr(), f)
    }
}
