use core::{alloc::Layout, mem, num::NonZeroUsize};

/// Compile-time layout facts for a type.
///
/// Used for sizing heap blocks, deciding whether a callable fits an inline
/// buffer, and checking that a pointer has spare alignment bits for a tag.
pub trait HasLayout: Sized {
    /// The size of the type.
    const SIZE: usize = mem::size_of::<Self>();

    /// The alignment of the type.
    const ALIGN: NonZeroUsize = match NonZeroUsize::new(mem::align_of::<Self>()) {
        Some(align) => align,
        None => panic!("the alignment is somehow zero"),
    };

    /// The memory layout of the type.
    const LAYOUT: Layout = Layout::new::<Self>();

    /// Whether values of this type occupy no memory at all.
    ///
    /// Zero-sized values are never handed to a [`Heap`](crate::heap::Heap).
    const IS_ZERO_SIZED: bool = mem::size_of::<Self>() == 0;

    /// Whether dropping a value of this type runs any code.
    const NEEDS_DROP: bool = mem::needs_drop::<Self>();

    /// The number of low address bits that are always zero in an aligned
    /// pointer to [`Self`].
    const ALIGN_BITS: u32 = mem::align_of::<Self>().trailing_zeros();

    /// Whether an aligned pointer to [`Self`] has room for a tag.
    const TAGGING_ALLOWED: bool = <Self as HasLayout>::ALIGN_BITS != 0;

    /// Mask of the bits available for a tag.
    const TAG_MASK: usize = {
        let shift = usize::BITS - <Self as HasLayout>::ALIGN_BITS;

        // Shifting by `BITS` overflows, so a type with byte alignment needs
        // its own arm.
        if shift < usize::BITS {
            usize::MAX >> shift
        } else {
            0
        }
    };

    /// Mask of the bits that actually address a [`Self`].
    const PTR_MASK: usize = !<Self as HasLayout>::TAG_MASK;

    /// Whether a value of this type can live in storage of the given size and
    /// alignment.
    #[inline]
    fn fits_in(size: usize, align: usize) -> bool {
        <Self as HasLayout>::SIZE <= size && <Self as HasLayout>::ALIGN.get() <= align
    }
}

impl<T> HasLayout for T {}
