//! Ownership handles and tagged unions.
//!
//! - [`UniquePtr`]: an exclusive, possibly empty owner of a heap object.
//! - [`SharedPtr`] and [`WeakPtr`]: non-atomic reference counting with
//!   observers, sharing a separately allocated [`RefBlock`].
//! - [`Ptr`]: a nullable, non-owning address.
//! - [`Variant2`] and friends: tagged unions over up to eight alternatives,
//!   with single and multi-variant [`visit`]ation.
//! - [`Function`]: a type-erased callable with inline storage for small
//!   captures.
//!
//! Every owning type allocates through a [`Heap`], [`Global`] by default.

pub mod construct;
pub mod error;
pub mod function;
pub mod heap;
pub mod layout;
pub mod ptr;
pub mod raw;
pub mod shared;
pub mod tag_ptr;
pub mod unique;
pub mod variant;
pub mod weak;

pub use crate::{
    error::Error,
    function::Function,
    heap::{Global, Heap, Tally},
    ptr::Ptr,
    raw::RefBlock,
    shared::SharedPtr,
    unique::UniquePtr,
    variant::{
        holds_alternative, try_visit, try_visit2, try_visit3, visit, visit2, visit3, Alternative,
        Index, Member, Variant, Variant1, Variant2, Variant3, Variant4, Variant5, Variant6,
        Variant7, Variant8, Visit, Visitable, Visitor,
    },
    weak::WeakPtr,
};

/// The handles and traits most code needs.
pub mod prelude {
    pub use crate::{
        variant::{Alternative, Member, Variant, Visit, Visitor},
        Function, Ptr, SharedPtr, UniquePtr, WeakPtr,
    };
}
