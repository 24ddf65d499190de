use core::{fmt, ptr::NonNull};

/// A nullable pointer that owns nothing.
///
/// The plain-address view shared by the owning handles: [`UniquePtr`],
/// [`SharedPtr`] and [`WeakPtr`] all hand one out through `as_ptr`. Moving out
/// with [`Ptr::take`] leaves the source null.
///
/// [`UniquePtr`]: crate::UniquePtr
/// [`SharedPtr`]: crate::SharedPtr
/// [`WeakPtr`]: crate::WeakPtr
#[repr(transparent)]
pub struct Ptr<T> {
    raw: Option<NonNull<T>>,
}

impl<T> Ptr<T> {
    #[inline]
    #[must_use]
    pub const fn null() -> Ptr<T> {
        Ptr { raw: None }
    }

    #[inline]
    #[must_use]
    pub fn from_raw(raw: *mut T) -> Ptr<T> {
        Ptr {
            raw: NonNull::new(raw),
        }
    }

    #[inline]
    #[must_use]
    pub const fn from_non_null(raw: NonNull<T>) -> Ptr<T> {
        Ptr { raw: Some(raw) }
    }

    /// Whether the pointer is non-null.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.raw.is_some()
    }

    #[inline]
    pub fn as_ptr(&self) -> *mut T {
        match self.raw {
            Some(raw) => raw.as_ptr(),
            None => core::ptr::null_mut(),
        }
    }

    #[inline]
    pub fn as_non_null(&self) -> Option<NonNull<T>> {
        self.raw
    }

    /// Borrows the pointee.
    ///
    /// # Safety
    ///
    /// - A non-null pointer must point to a live `T` for all of `'a`, with no
    ///   mutable borrow alive at the same time.
    #[inline]
    pub unsafe fn as_ref<'a>(&self) -> Option<&'a T> {
        self.raw.map(|raw| unsafe { &*raw.as_ptr() })
    }

    /// Mutably borrows the pointee.
    ///
    /// # Safety
    ///
    /// - A non-null pointer must point to a live `T` for all of `'a`, with no
    ///   other borrow alive at the same time.
    #[inline]
    pub unsafe fn as_mut<'a>(&mut self) -> Option<&'a mut T> {
        self.raw.map(|raw| unsafe { &mut *raw.as_ptr() })
    }

    /// Moves the address out, leaving this pointer null.
    #[inline]
    pub fn take(&mut self) -> Ptr<T> {
        Ptr {
            raw: self.raw.take(),
        }
    }

    /// Points at `raw` instead, returning the previous address.
    #[inline]
    pub fn replace(&mut self, raw: *mut T) -> Ptr<T> {
        core::mem::replace(self, Ptr::from_raw(raw))
    }
}

impl<T> Default for Ptr<T> {
    #[inline]
    fn default() -> Self {
        Ptr::null()
    }
}

impl<T> Clone for Ptr<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Ptr<T> {}

impl<T> PartialEq for Ptr<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> PartialEq<*const T> for Ptr<T> {
    #[inline]
    fn eq(&self, other: &*const T) -> bool {
        self.as_ptr() as *const T == *other
    }
}

impl<T> Eq for Ptr<T> {}

impl<T> From<&T> for Ptr<T> {
    #[inline]
    fn from(target: &T) -> Self {
        Ptr::from_non_null(NonNull::from(target))
    }
}

impl<T> From<&mut T> for Ptr<T> {
    #[inline]
    fn from(target: &mut T) -> Self {
        Ptr::from_non_null(NonNull::from(target))
    }
}

impl<T> fmt::Debug for Ptr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Ptr").field(&self.as_ptr()).finish()
    }
}

impl<T> fmt::Pointer for Ptr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&self.as_ptr(), f)
    }
}

#[cfg(test)]
mod tests {
    use super::Ptr;

    #[test]
    fn take_leaves_source_null() {
        let mut value = 41;
        let mut ptr = Ptr::from(&mut value);
        assert!(ptr.is_valid());

        let moved = ptr.take();
        assert!(!ptr.is_valid());
        assert!(moved.is_valid());
        unsafe { *moved.as_ptr() += 1 };
        assert_eq!(value, 42);
    }

    #[test]
    fn null_pointers_compare_equal() {
        assert_eq!(Ptr::<u8>::null(), Ptr::from_raw(core::ptr::null_mut()));
        assert!(unsafe { Ptr::<u8>::null().as_ref() }.is_none());
    }
}
