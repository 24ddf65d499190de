use core::{
    fmt,
    hint::{assert_unchecked, unreachable_unchecked},
    marker::PhantomData,
    ptr::NonNull,
};

use sptr::Strict;

use crate::layout::HasLayout;

/// A pointer with a small tag folded into its alignment bits.
///
/// [`Function`](crate::function::Function) uses one to remember, next to its
/// vtable, whether the erased callable lives inline or on the heap.
#[repr(transparent)]
pub struct TagPtr<T> {
    raw: NonNull<T>,
}

impl<T> TagPtr<T> {
    /// Try to create a tagged pointer to a `T`.
    ///
    /// Returns `None` if `ptr` is not aligned for `T`.
    #[inline]
    #[must_use]
    pub fn try_new(ptr: NonNull<T>, tag: Tag<T>) -> Option<TagPtr<T>> {
        if ptr.is_aligned() {
            // SAFETY: `ptr` is aligned and non-null, so the tag only touches
            //         bits that are zero and the result stays non-null.
            let raw = Strict::map_addr(ptr.as_ptr(), |addr| addr | tag.get());
            let raw = unsafe { NonNull::new_unchecked(raw) };

            Some(TagPtr { raw })
        } else {
            None
        }
    }

    /// Create a tagged pointer without checking alignment.
    ///
    /// # Safety
    ///
    /// - The caller must ensure that `ptr` is properly aligned for `T`.
    #[inline]
    #[must_use]
    #[track_caller]
    pub unsafe fn new_unchecked(ptr: NonNull<T>, tag: Tag<T>) -> TagPtr<T> {
        match TagPtr::<T>::try_new(ptr, tag) {
            Some(ptr) => ptr,
            None if cfg!(debug_assertions) => panic!("`ptr` is not aligned"),
            // SAFETY: The caller ensures that `ptr` is aligned properly.
            None => unsafe { unreachable_unchecked() },
        }
    }

    /// Tag a reference, which is always aligned.
    #[inline]
    #[must_use]
    pub fn from_ref(target: &T, tag: Tag<T>) -> TagPtr<T> {
        // SAFETY: References are always aligned.
        unsafe { TagPtr::new_unchecked(NonNull::from(target), tag) }
    }

    /// Get the tag.
    #[inline]
    #[must_use]
    pub fn tag(self) -> Tag<T> {
        let tag = Strict::addr(self.raw.as_ptr()) & T::TAG_MASK;

        // SAFETY: Masking with `TAG_MASK` always yields a valid tag.
        unsafe { Tag::new_unchecked(tag) }
    }

    /// Get the pointer with the tag stripped.
    #[inline]
    #[must_use]
    pub fn ptr(self) -> NonNull<T> {
        let ptr = Strict::map_addr(self.raw.as_ptr(), |addr| addr & T::PTR_MASK);

        unsafe {
            // SAFETY: The untagged pointer was aligned and non-null when this
            //         tagged pointer was built.
            assert_unchecked(ptr.is_aligned());

            NonNull::new_unchecked(ptr)
        }
    }

    /// Same address, different tag.
    #[inline]
    #[must_use]
    pub fn with_tag(self, tag: Tag<T>) -> TagPtr<T> {
        // SAFETY: `self.ptr()` is aligned by construction.
        unsafe { TagPtr::new_unchecked(self.ptr(), tag) }
    }
}

impl<T> fmt::Debug for TagPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagPtr")
            .field("ptr", &self.ptr())
            .field("tag", &self.tag())
            .finish()
    }
}

impl<T> Clone for TagPtr<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TagPtr<T> {}

impl<T> PartialEq for TagPtr<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for TagPtr<T> {}

/// A value small enough to fit in the alignment bits of a pointer to `T`.
#[repr(transparent)]
pub struct Tag<T> {
    tag: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Tag<T> {
    pub const MIN: Tag<T> = Tag {
        tag: 0,
        _marker: PhantomData,
    };

    pub const MAX: Tag<T> = Tag {
        tag: <T as HasLayout>::TAG_MASK,
        _marker: PhantomData,
    };

    /// Returns whether a provided tag fits.
    #[inline]
    #[must_use]
    pub const fn is_valid(tag: usize) -> bool {
        (tag & T::TAG_MASK) == tag
    }

    /// Try to create a tag, returning `None` if it does not fit within the
    /// alignment bits.
    #[inline]
    #[must_use]
    pub const fn new(tag: usize) -> Option<Tag<T>> {
        if Tag::<T>::is_valid(tag) {
            Some(Tag {
                tag,
                _marker: PhantomData,
            })
        } else {
            None
        }
    }

    /// Create a tag without checking that it fits.
    ///
    /// # Safety
    ///
    /// - `tag` must satisfy [`Tag::is_valid`].
    #[inline]
    #[must_use]
    #[track_caller]
    pub const unsafe fn new_unchecked(tag: usize) -> Tag<T> {
        match Tag::<T>::new(tag) {
            Some(tag) => tag,
            None if cfg!(debug_assertions) => panic!("tag does not fit within alignment bits"),
            None => unsafe { unreachable_unchecked() },
        }
    }

    /// Get the integer representation of this tag.
    #[inline]
    #[must_use]
    pub fn get(self) -> usize {
        // SAFETY: Every constructor upholds `Self::is_valid`.
        unsafe { assert_unchecked(Tag::<T>::is_valid(self.tag)) };

        self.tag
    }
}

impl<T> Default for Tag<T> {
    #[inline]
    fn default() -> Self {
        Self::MIN
    }
}

impl<T> Clone for Tag<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Tag<T> {}

impl<T> PartialEq for Tag<T> {
    #[inline]
    fn eq(&self, other: &Tag<T>) -> bool {
        self.tag == other.tag
    }
}

impl<T> PartialEq<usize> for Tag<T> {
    #[inline]
    fn eq(&self, other: &usize) -> bool {
        self.tag == *other
    }
}

impl<T> Eq for Tag<T> {}

impl<T> fmt::Debug for Tag<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Tag").field(&self.tag).finish()
    }
}
