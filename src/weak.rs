use core::{fmt, marker::PhantomData};

use crate::{
    error::Error,
    heap::{Global, Heap},
    ptr::Ptr,
    raw::RefGroup,
    shared::SharedPtr,
};

/// A non-owning observer of an object held by [`SharedPtr`]s.
///
/// Observers keep the counter block alive but never the object. The object
/// can only be reached by promoting the observer with [`WeakPtr::lock`], which
/// fails once every owner is gone.
pub struct WeakPtr<T, H: Heap = Global> {
    group: Option<RefGroup<T, H>>,
    _marker: PhantomData<T>,
}

impl<T, H: Heap> WeakPtr<T, H> {
    /// An observer of nothing; always expired.
    #[inline]
    pub const fn new() -> WeakPtr<T, H> {
        WeakPtr {
            group: None,
            _marker: PhantomData,
        }
    }

    /// Number of owners of the observed object; zero once it is destroyed.
    #[inline]
    pub fn use_count(&self) -> usize {
        self.group.map_or(0, |group| group.block().strong())
    }

    /// Number of observers sharing this counter block.
    #[inline]
    pub fn weak_count(&self) -> usize {
        self.group.map_or(0, |group| group.block().weak())
    }

    /// Whether the observed object is gone, or there never was one.
    #[inline]
    pub fn expired(&self) -> bool {
        self.use_count() == 0
    }

    /// Promotes to an owner of the object, or an empty handle if it has
    /// already been destroyed.
    #[inline]
    pub fn lock(&self) -> SharedPtr<T, H> {
        match self.group {
            Some(group) if group.block().strong() > 0 => {
                group.block().inc_strong();
                SharedPtr::from_group(group)
            }
            _ => SharedPtr::empty(),
        }
    }

    /// As [`WeakPtr::lock`], telling an empty observer apart from an expired
    /// one.
    #[inline]
    pub fn upgrade(&self) -> Result<SharedPtr<T, H>, Error> {
        if self.group.is_none() {
            return Err(Error::Empty);
        }

        let shared = self.lock();
        if shared.is_valid() {
            Ok(shared)
        } else {
            Err(Error::Expired)
        }
    }

    /// The observed address. Dangling once the object has expired.
    #[inline]
    pub fn as_ptr(&self) -> Ptr<T> {
        match self.group {
            Some(group) => Ptr::from_non_null(group.object),
            None => Ptr::null(),
        }
    }

    /// Whether both observers share a counter block.
    #[inline]
    pub fn ptr_eq(&self, other: &WeakPtr<T, H>) -> bool {
        self.group == other.group
    }

    /// Moves the observation into a new handle, leaving this one empty.
    #[inline]
    pub fn take(&mut self) -> WeakPtr<T, H> {
        WeakPtr {
            group: self.group.take(),
            _marker: PhantomData,
        }
    }

    /// Stops observing, leaving the handle empty.
    #[inline]
    pub fn reset(&mut self) {
        if let Some(group) = self.group.take() {
            // SAFETY: The handle owned one weak reference and no longer refers
            //         to the group.
            unsafe { group.release_weak() };
        }
    }
}

impl<T, H: Heap> From<&SharedPtr<T, H>> for WeakPtr<T, H> {
    /// Observes the owner's object; `use_count` is unaffected.
    #[inline]
    fn from(shared: &SharedPtr<T, H>) -> Self {
        if let Some(group) = shared.group {
            group.block().inc_weak();
        }

        WeakPtr {
            group: shared.group,
            _marker: PhantomData,
        }
    }
}

impl<T, H: Heap> Clone for WeakPtr<T, H> {
    #[inline]
    fn clone(&self) -> Self {
        if let Some(group) = self.group {
            group.block().inc_weak();
        }

        WeakPtr {
            group: self.group,
            _marker: PhantomData,
        }
    }
}

impl<T, H: Heap> Drop for WeakPtr<T, H> {
    #[inline]
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T, H: Heap> Default for WeakPtr<T, H> {
    #[inline]
    fn default() -> Self {
        WeakPtr::new()
    }
}

impl<T, H: Heap> fmt::Debug for WeakPtr<T, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakPtr")
            .field("use_count", &self.use_count())
            .field("weak_count", &self.weak_count())
            .finish()
    }
}
