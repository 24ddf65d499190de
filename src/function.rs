//! A type-erased, owning callable.
//!
//! [`Function`] stores any `FnMut(A) -> R` behind a small vtable. Callables
//! that fit in [`INLINE_SIZE`] bytes at [`INLINE_ALIGN`] live directly inside
//! the `Function`; larger ones are moved to the heap. Which of the two applies
//! is kept in the tag bits of the vtable pointer.

use core::{
    alloc::Layout,
    fmt,
    mem::{self, MaybeUninit},
    ptr::NonNull,
};

use log::debug;

use crate::{
    construct::{construct_at, destroy_at},
    error::Error,
    heap::{self, Global, Heap},
    layout::HasLayout,
    tag_ptr::{Tag, TagPtr},
};

type Storage = [usize; 3];

/// Largest callable, in bytes, stored without a heap allocation.
pub const INLINE_SIZE: usize = mem::size_of::<Storage>();

/// Strictest alignment a callable may need to be stored inline.
pub const INLINE_ALIGN: usize = mem::align_of::<Storage>();

const INLINE: usize = 0;
const SPILLED: usize = 1;

struct VTable<A, R> {
    call: unsafe fn(NonNull<u8>, A) -> R,
    drop: unsafe fn(NonNull<u8>),
    layout: Layout,
}

// The storage kind needs one spare bit in a vtable pointer.
const _: () = assert!(<VTable<(), ()> as HasLayout>::TAGGING_ALLOWED);

trait Erased<A, R>: FnMut(A) -> R + Sized {
    const VTABLE: VTable<A, R> = VTable {
        call: call_erased::<Self, A, R>,
        drop: drop_erased::<Self>,
        layout: Self::LAYOUT,
    };
}

impl<F: FnMut(A) -> R, A, R> Erased<A, R> for F {}

unsafe fn call_erased<F: FnMut(A) -> R, A, R>(data: NonNull<u8>, args: A) -> R {
    // SAFETY: `data` points at a live `F`, exclusively borrowed by the caller
    //         for the duration of the call.
    unsafe { (*data.cast::<F>().as_ptr())(args) }
}

unsafe fn drop_erased<F>(data: NonNull<u8>) {
    // SAFETY: `data` points at a live `F` that is never used again.
    unsafe { destroy_at(data.cast::<F>().as_ptr()) }
}

/// An owning, possibly empty, type-erased `FnMut(A) -> R`.
///
/// Calling an empty `Function` through [`Function::call`] panics;
/// [`Function::try_call`] reports it as [`Error::Empty`] instead.
///
/// ```
/// use lifeline::Function;
///
/// let mut total = 0;
/// let mut add = Function::new(move |n: i32| {
///     total += n;
///     total
/// });
///
/// assert_eq!(add.call(2), 2);
/// assert_eq!(add.call(3), 5);
/// assert!(add.is_inline());
/// ```
pub struct Function<A, R, H: Heap = Global> {
    vtable: Option<TagPtr<VTable<A, R>>>,
    storage: MaybeUninit<Storage>,
    heap: H,
}

impl<A, R> Function<A, R, Global> {
    #[inline]
    #[track_caller]
    pub fn new<F>(f: F) -> Function<A, R, Global>
    where
        F: FnMut(A) -> R + 'static,
    {
        Function::new_in(f, Global)
    }

    #[inline]
    pub const fn empty() -> Function<A, R, Global> {
        Function::empty_in(Global)
    }
}

impl<A, R, H: Heap> Function<A, R, H> {
    /// Wraps `f`, spilling it to `heap` if it does not fit inline.
    /// Allocation failure is fatal.
    #[inline]
    #[track_caller]
    pub fn new_in<F>(f: F, heap: H) -> Function<A, R, H>
    where
        F: FnMut(A) -> R + 'static,
    {
        heap::or_abort(Function::try_new_in(f, heap))
    }

    pub fn try_new_in<F>(f: F, heap: H) -> Result<Function<A, R, H>, Error>
    where
        F: FnMut(A) -> R + 'static,
    {
        let mut function = Function::empty_in(heap);
        function.try_set(f)?;
        Ok(function)
    }

    #[inline]
    pub const fn empty_in(heap: H) -> Function<A, R, H> {
        Function {
            vtable: None,
            storage: MaybeUninit::uninit(),
            heap,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.vtable.is_some()
    }

    /// Whether the callable lives inside this `Function` rather than on the
    /// heap. False when empty.
    #[inline]
    pub fn is_inline(&self) -> bool {
        matches!(self.vtable, Some(vtable) if vtable.tag() == INLINE)
    }

    #[inline]
    pub fn heap(&self) -> &H {
        &self.heap
    }

    /// Invokes the callable.
    ///
    /// # Panics
    ///
    /// Panics if the `Function` is empty.
    #[inline]
    #[track_caller]
    pub fn call(&mut self, args: A) -> R {
        match self.try_call(args) {
            Ok(result) => result,
            Err(error) => panic!("called a Function: {}", error),
        }
    }

    #[inline]
    pub fn try_call(&mut self, args: A) -> Result<R, Error> {
        let vtable = self.vtable.ok_or(Error::Empty)?;
        let data = self.data(vtable);

        // SAFETY: The vtable is a promoted constant and `data` holds the live
        //         callable it was built for.
        Ok(unsafe { (vtable.ptr().as_ref().call)(data, args) })
    }

    /// Replaces the callable with `f`, dropping the old one first.
    /// Allocation failure is fatal.
    #[inline]
    #[track_caller]
    pub fn set<F>(&mut self, f: F)
    where
        F: FnMut(A) -> R + 'static,
    {
        heap::or_abort(self.try_set(f));
    }

    /// As [`Function::set`], returning allocation failure. The `Function` is
    /// left empty on failure.
    pub fn try_set<F>(&mut self, f: F) -> Result<(), Error>
    where
        F: FnMut(A) -> R + 'static,
    {
        self.reset();

        let vtable: &VTable<A, R> = &<F as Erased<A, R>>::VTABLE;
        let tag = if F::fits_in(INLINE_SIZE, INLINE_ALIGN) {
            // SAFETY: `F` fits the storage, which holds nothing right now.
            unsafe { construct_at(self.storage.as_mut_ptr().cast::<F>(), f) };
            INLINE
        } else {
            let object = heap::allocate_value(&self.heap, f)?;
            debug!(target: "lifeline::function", "callable of {} bytes moved to the heap", F::SIZE);

            // SAFETY: A pointer always fits the storage.
            unsafe { construct_at(self.storage.as_mut_ptr().cast::<NonNull<u8>>(), object.cast()) };
            SPILLED
        };

        // SAFETY: Both storage tags fit, as asserted for every vtable.
        let tag = unsafe { Tag::new_unchecked(tag) };
        self.vtable = Some(TagPtr::from_ref(vtable, tag));
        Ok(())
    }

    /// Drops the callable, leaving the `Function` empty.
    pub fn reset(&mut self) {
        if let Some(vtable) = self.vtable.take() {
            let data = self.data(vtable);

            // SAFETY: `data` holds the live callable of `vtable`, and spilled
            //         callables were allocated from `self.heap` with its layout.
            unsafe {
                let table = vtable.ptr().as_ref();
                (table.drop)(data);
                if vtable.tag() == SPILLED {
                    heap::deallocate(&self.heap, data, table.layout);
                }
            }
        }
    }

    /// Where the callable described by `vtable` lives.
    #[inline]
    fn data(&mut self, vtable: TagPtr<VTable<A, R>>) -> NonNull<u8> {
        let storage = NonNull::from(&mut self.storage).cast::<u8>();
        if vtable.tag() == SPILLED {
            // SAFETY: Spilled callables leave their address in the storage.
            unsafe { storage.cast::<NonNull<u8>>().read() }
        } else {
            storage
        }
    }
}

impl<A, R, H: Heap> Drop for Function<A, R, H> {
    #[inline]
    fn drop(&mut self) {
        self.reset();
    }
}

impl<A, R, H: Heap + Default> Default for Function<A, R, H> {
    #[inline]
    fn default() -> Self {
        Function::empty_in(H::default())
    }
}

impl<A, R, H: Heap> fmt::Debug for Function<A, R, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("valid", &self.is_valid())
            .field("inline", &self.is_inline())
            .finish()
    }
}
