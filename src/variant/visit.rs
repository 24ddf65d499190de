//! Dispatch on the active alternatives of one or more variants.
//!
//! A visitor is an overload set: one [`Visit`] impl per argument shape it
//! accepts, all sharing the [`Visitor::Output`] type. Visiting a single
//! variant calls `Visit<&T>` (or `&mut T`, or `T` for an owned variant) for the
//! active alternative `T`. Visiting several calls `Visit<(&A, &B)>` or
//! `Visit<(&A, &B, &C)>` with every variant's active alternative.
//!
//! Multi-variant dispatch goes up to three variants: [`visit2`] and [`visit3`]
//! (and their `try_` forms). Wider dispatch nests calls: a visitor of three
//! variants can visit a fourth from inside its overloads.
//!
//! Dispatch is a nested `match`, one level per variant, resolved through the
//! continuation types below. The compiler checks every combination of
//! alternatives at the call site: a visitor missing one of them does not
//! compile.

use crate::{error::Error, variant::Variant};

/// The result type shared by all of a visitor's overloads.
pub trait Visitor {
    type Output;
}

/// One overload of a visitor.
pub trait Visit<Args>: Visitor {
    fn visit(self, args: Args) -> Self::Output;
}

/// Something that can hand its active alternative to a visitor.
///
/// Implemented for every variant type by value, by shared reference and by
/// mutable reference.
pub trait Visitable<V: Visitor> {
    /// Calls the visitor overload for the active alternative.
    ///
    /// # Panics
    ///
    /// Panics if the variant is valueless.
    fn accept(self, visitor: V) -> V::Output;
}

/// Calls the overload of `visitor` matching the active alternative.
///
/// # Panics
///
/// Panics if `variant` is valueless.
#[inline]
pub fn visit<V, A>(visitor: V, variant: A) -> V::Output
where
    V: Visitor,
    A: Visitable<V>,
{
    variant.accept(visitor)
}

/// Calls the overload of `visitor` matching the pair of active alternatives.
///
/// # Panics
///
/// Panics if either variant is valueless.
#[inline]
pub fn visit2<V, A, B>(visitor: V, a: A, b: B) -> V::Output
where
    V: Visitor,
    A: Visitable<Then<V, B>>,
{
    a.accept(Then { visitor, rest: b })
}

/// Calls the overload of `visitor` matching the triple of active
/// alternatives.
///
/// # Panics
///
/// Panics if any variant is valueless.
#[inline]
pub fn visit3<V, A, B, C>(visitor: V, a: A, b: B, c: C) -> V::Output
where
    V: Visitor,
    A: Visitable<ThenTwo<V, B, C>>,
{
    a.accept(ThenTwo {
        visitor,
        rest: (b, c),
    })
}

/// As [`visit`], reporting a valueless variant instead of panicking.
#[inline]
pub fn try_visit<V, A>(visitor: V, variant: A) -> Result<V::Output, Error>
where
    V: Visitor,
    A: Visitable<V> + Variant,
{
    if variant.is_valueless() {
        return Err(Error::Valueless);
    }
    Ok(variant.accept(visitor))
}

/// As [`visit2`], reporting a valueless variant instead of panicking.
#[inline]
pub fn try_visit2<V, A, B>(visitor: V, a: A, b: B) -> Result<V::Output, Error>
where
    V: Visitor,
    A: Visitable<Then<V, B>> + Variant,
    B: Variant,
{
    if a.is_valueless() || b.is_valueless() {
        return Err(Error::Valueless);
    }
    Ok(visit2(visitor, a, b))
}

/// As [`visit3`], reporting a valueless variant instead of panicking.
#[inline]
pub fn try_visit3<V, A, B, C>(visitor: V, a: A, b: B, c: C) -> Result<V::Output, Error>
where
    V: Visitor,
    A: Visitable<ThenTwo<V, B, C>> + Variant,
    B: Variant,
    C: Variant,
{
    if a.is_valueless() || b.is_valueless() || c.is_valueless() {
        return Err(Error::Valueless);
    }
    Ok(visit3(visitor, a, b, c))
}

/// Continuation that visits `rest` once the first alternative is known.
pub struct Then<V, B> {
    visitor: V,
    rest: B,
}

impl<V: Visitor, B> Visitor for Then<V, B> {
    type Output = V::Output;
}

impl<V, B, X> Visit<X> for Then<V, B>
where
    V: Visitor,
    B: Visitable<Bound<V, X>>,
{
    #[inline]
    fn visit(self, first: X) -> V::Output {
        self.rest.accept(Bound {
            visitor: self.visitor,
            first,
        })
    }
}

/// Continuation holding the first alternative while the second is found.
pub struct Bound<V, X> {
    visitor: V,
    first: X,
}

impl<V: Visitor, X> Visitor for Bound<V, X> {
    type Output = V::Output;
}

impl<V, X, Y> Visit<Y> for Bound<V, X>
where
    V: Visit<(X, Y)>,
{
    #[inline]
    fn visit(self, second: Y) -> V::Output {
        self.visitor.visit((self.first, second))
    }
}

/// Continuation that visits two more variants once the first alternative is
/// known.
pub struct ThenTwo<V, B, C> {
    visitor: V,
    rest: (B, C),
}

impl<V: Visitor, B, C> Visitor for ThenTwo<V, B, C> {
    type Output = V::Output;
}

impl<V, B, C, X> Visit<X> for ThenTwo<V, B, C>
where
    V: Visitor,
    B: Visitable<BoundThen<V, X, C>>,
{
    #[inline]
    fn visit(self, first: X) -> V::Output {
        let (b, c) = self.rest;
        b.accept(BoundThen {
            visitor: self.visitor,
            first,
            rest: c,
        })
    }
}

/// Continuation holding the first alternative while the last variant waits.
pub struct BoundThen<V, X, C> {
    visitor: V,
    first: X,
    rest: C,
}

impl<V: Visitor, X, C> Visitor for BoundThen<V, X, C> {
    type Output = V::Output;
}

impl<V, X, Y, C> Visit<Y> for BoundThen<V, X, C>
where
    V: Visitor,
    C: Visitable<BoundTwo<V, X, Y>>,
{
    #[inline]
    fn visit(self, second: Y) -> V::Output {
        self.rest.accept(BoundTwo {
            visitor: self.visitor,
            first: self.first,
            second,
        })
    }
}

/// Continuation holding two alternatives while the third is found.
pub struct BoundTwo<V, X, Y> {
    visitor: V,
    first: X,
    second: Y,
}

impl<V: Visitor, X, Y> Visitor for BoundTwo<V, X, Y> {
    type Output = V::Output;
}

impl<V, X, Y, Z> Visit<Z> for BoundTwo<V, X, Y>
where
    V: Visit<(X, Y, Z)>,
{
    #[inline]
    fn visit(self, third: Z) -> V::Output {
        self.visitor.visit((self.first, self.second, third))
    }
}

/// Shared by every dispatch on a valueless variant.
#[cold]
#[track_caller]
pub(crate) fn valueless() -> ! {
    panic!("visited a valueless variant")
}
