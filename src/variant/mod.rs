//! Tagged unions over a fixed list of alternative types.
//!
//! `Variant1` through `Variant8` hold at most one value from their list of
//! alternatives, inline, tagged by the position of its type. A variant may also
//! be valueless: that is its default state and what [`Variant::take`] leaves
//! behind. [`Variant::index`] reports the position of the active alternative,
//! or [`Variant::COUNT`] when valueless.
//!
//! Alternatives are selected by type through [`Member`], or by position
//! through [`Alternative`]. Selecting by type when the same type occurs twice
//! in the list does not compile; use the positional `*_at` forms instead.
//!
//! ```
//! use lifeline::variant::{Variant, Variant2};
//!
//! let mut v = Variant2::<i32, f32>::new(66.67f32);
//! assert!(v.holds_alternative::<f32, _>());
//!
//! v.set(1337i32);
//! assert!(v.holds_alternative::<i32, _>());
//! assert_eq!(v.index(), 0);
//! ```

use core::{hint::unreachable_unchecked, mem};

use crate::error::Error;

pub mod visit;

pub use self::visit::{try_visit, try_visit2, try_visit3, visit, visit2, visit3, Visit, Visitable, Visitor};

use self::visit::valueless;

/// Type-level position of an alternative, used to select by type.
pub struct Index<const I: usize>;

/// Operations shared by every variant type.
pub trait Variant {
    /// Number of alternatives; also the index reported when valueless.
    const COUNT: usize;

    /// Position of the active alternative, or [`Variant::COUNT`].
    fn index(&self) -> usize;

    #[inline]
    fn is_valueless(&self) -> bool {
        self.index() == Self::COUNT
    }

    /// Whether the active alternative is `T`.
    #[inline]
    fn holds_alternative<T, I>(&self) -> bool
    where
        Self: Member<T, I>,
    {
        self.index() == <Self as Member<T, I>>::INDEX
    }

    /// The active alternative, if it is `T`.
    #[inline]
    fn get<T, I>(&self) -> Result<&T, Error>
    where
        Self: Member<T, I>,
    {
        match <Self as Member<T, I>>::project(self) {
            Some(value) => Ok(value),
            None => Err(access_error(self.index(), Self::COUNT, <Self as Member<T, I>>::INDEX)),
        }
    }

    #[inline]
    fn get_mut<T, I>(&mut self) -> Result<&mut T, Error>
    where
        Self: Member<T, I>,
    {
        let (index, requested) = (self.index(), <Self as Member<T, I>>::INDEX);
        match <Self as Member<T, I>>::project_mut(self) {
            Some(value) => Ok(value),
            None => Err(access_error(index, Self::COUNT, requested)),
        }
    }

    /// The active alternative, trusted to be `T`.
    ///
    /// # Safety
    ///
    /// - The active alternative must be `T`. Debug builds panic otherwise.
    #[inline]
    #[track_caller]
    unsafe fn get_unchecked<T, I>(&self) -> &T
    where
        Self: Member<T, I>,
    {
        match <Self as Member<T, I>>::project(self) {
            Some(value) => value,
            None if cfg!(debug_assertions) => panic!(
                "{}",
                access_error(self.index(), Self::COUNT, <Self as Member<T, I>>::INDEX)
            ),
            // SAFETY: The caller ensures that `T` is active.
            None => unsafe { unreachable_unchecked() },
        }
    }

    /// # Safety
    ///
    /// - The active alternative must be `T`. Debug builds panic otherwise.
    #[inline]
    #[track_caller]
    unsafe fn get_unchecked_mut<T, I>(&mut self) -> &mut T
    where
        Self: Member<T, I>,
    {
        let (index, requested) = (self.index(), <Self as Member<T, I>>::INDEX);
        match <Self as Member<T, I>>::project_mut(self) {
            Some(value) => value,
            None if cfg!(debug_assertions) => panic!("{}", access_error(index, Self::COUNT, requested)),
            // SAFETY: The caller ensures that `T` is active.
            None => unsafe { unreachable_unchecked() },
        }
    }

    /// The active alternative, if it sits at position `I`.
    #[inline]
    fn at<const I: usize>(&self) -> Result<&<Self as Alternative<I>>::Type, Error>
    where
        Self: Alternative<I>,
    {
        match <Self as Alternative<I>>::project(self) {
            Some(value) => Ok(value),
            None => Err(access_error(self.index(), Self::COUNT, I)),
        }
    }

    #[inline]
    fn at_mut<const I: usize>(&mut self) -> Result<&mut <Self as Alternative<I>>::Type, Error>
    where
        Self: Alternative<I>,
    {
        let index = self.index();
        match <Self as Alternative<I>>::project_mut(self) {
            Some(value) => Ok(value),
            None => Err(access_error(index, Self::COUNT, I)),
        }
    }

    /// The active alternative, trusted to sit at position `I`.
    ///
    /// # Safety
    ///
    /// - Alternative `I` must be active. Debug builds panic otherwise.
    #[inline]
    #[track_caller]
    unsafe fn at_unchecked<const I: usize>(&self) -> &<Self as Alternative<I>>::Type
    where
        Self: Alternative<I>,
    {
        match <Self as Alternative<I>>::project(self) {
            Some(value) => value,
            None if cfg!(debug_assertions) => panic!("{}", access_error(self.index(), Self::COUNT, I)),
            // SAFETY: The caller ensures that `I` is active.
            None => unsafe { unreachable_unchecked() },
        }
    }

    /// Stores `value` as the active alternative.
    ///
    /// When `T` is already active the value is assigned in place and the tag
    /// is untouched. Otherwise the previous alternative is dropped first.
    #[inline]
    fn set<T, I>(&mut self, value: T)
    where
        Self: Member<T, I> + Sized,
    {
        if let Some(slot) = <Self as Member<T, I>>::project_mut(self) {
            *slot = value;
            return;
        }
        *self = <Self as Member<T, I>>::inject(value);
    }

    /// As [`Variant::set`], selecting the alternative by position.
    #[inline]
    fn set_at<const I: usize>(&mut self, value: <Self as Alternative<I>>::Type)
    where
        Self: Alternative<I> + Sized,
    {
        if let Some(slot) = <Self as Alternative<I>>::project_mut(self) {
            *slot = value;
            return;
        }
        *self = <Self as Alternative<I>>::inject(value);
    }

    /// Copies `value` into the variant.
    ///
    /// When `T` is already active this is `clone_from` on the live value, so
    /// no value is dropped or freshly built. Otherwise the previous
    /// alternative is dropped and a clone constructed in its place.
    #[inline]
    fn assign_from<T, I>(&mut self, value: &T)
    where
        Self: Member<T, I> + Sized,
        T: Clone,
    {
        if let Some(slot) = <Self as Member<T, I>>::project_mut(self) {
            slot.clone_from(value);
            return;
        }
        *self = <Self as Member<T, I>>::inject(value.clone());
    }

    /// Moves the active alternative out, leaving the variant valueless.
    #[inline]
    fn take(&mut self) -> Self
    where
        Self: Default,
    {
        mem::take(self)
    }
}

impl<V: Variant + ?Sized> Variant for &V {
    const COUNT: usize = V::COUNT;

    #[inline]
    fn index(&self) -> usize {
        (**self).index()
    }
}

impl<V: Variant + ?Sized> Variant for &mut V {
    const COUNT: usize = V::COUNT;

    #[inline]
    fn index(&self) -> usize {
        (**self).index()
    }
}

/// The alternative at position `I` of a variant.
pub trait Alternative<const I: usize>: Variant {
    type Type;

    /// A variant holding `value` at position `I`.
    fn inject(value: Self::Type) -> Self;

    fn project(&self) -> Option<&Self::Type>;

    fn project_mut(&mut self) -> Option<&mut Self::Type>;

    /// Moves the value out if position `I` is active.
    fn extract(self) -> Result<Self::Type, Self>
    where
        Self: Sized;
}

/// Membership of `T` in a variant's alternatives, at the position encoded by
/// the marker `I`.
///
/// `I` is always inferred (`_`). It only fails to infer when `T` occurs more
/// than once in the list, which makes an ambiguous selection a compile error.
///
/// ```compile_fail,E0283
/// use lifeline::variant::Variant2;
///
/// let v = Variant2::<i32, i32>::new(5i32);
/// ```
///
/// ```compile_fail,E0283
/// use lifeline::variant::{Variant, Variant2};
///
/// let mut v = Variant2::<i32, i32>::new_at::<0>(5);
/// v.set(6i32);
/// ```
///
/// The positional forms stay available for repeated types:
///
/// ```
/// use lifeline::variant::{Variant, Variant2};
///
/// let mut v = Variant2::<i32, i32>::new_at::<0>(5);
/// v.set_at::<1>(6);
/// assert_eq!(v.index(), 1);
/// ```
pub trait Member<T, I>: Variant {
    /// Position of `T` in the list of alternatives.
    const INDEX: usize;

    fn inject(value: T) -> Self;

    fn project(&self) -> Option<&T>;

    fn project_mut(&mut self) -> Option<&mut T>;

    fn extract(self) -> Result<T, Self>
    where
        Self: Sized;
}

/// Whether `variant` currently holds a `T`.
#[inline]
pub fn holds_alternative<T, I, V>(variant: &V) -> bool
where
    V: Member<T, I>,
{
    variant.holds_alternative::<T, I>()
}

fn access_error(active: usize, count: usize, requested: usize) -> Error {
    if active == count {
        Error::Valueless
    } else {
        Error::WrongAlternative { requested, active }
    }
}

macro_rules! variant {
    (
        @define
        $(#[$attr:meta])*
        $name:ident {
            $($idx:tt => $alt:ident($t:ident) $f:ident),+
        }
    ) => {
        $(#[$attr])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash)]
        pub enum $name<$($t),+> {
            /// No alternative is active.
            Valueless,
            $($alt($t),)+
        }

        impl<$($t),+> $name<$($t),+> {
            /// A variant holding `value` as its alternative of type `T`.
            #[inline]
            pub fn new<T, I>(value: T) -> Self
            where
                Self: Member<T, I>,
            {
                <Self as Member<T, I>>::inject(value)
            }

            /// A variant holding `value` at position `I`.
            #[inline]
            pub fn new_at<const I: usize>(value: <Self as Alternative<I>>::Type) -> Self
            where
                Self: Alternative<I>,
            {
                <Self as Alternative<I>>::inject(value)
            }

            /// Calls the function matching the active alternative; one
            /// function per alternative, in order.
            ///
            /// # Panics
            ///
            /// Panics if the variant is valueless.
            #[inline]
            #[track_caller]
            pub fn match_with<R>(&self, $($f: impl FnOnce(&$t) -> R),+) -> R {
                match self {
                    $($name::$alt(value) => $f(value),)+
                    $name::Valueless => valueless(),
                }
            }

            /// As `match_with`, with mutable access to the active alternative.
            #[inline]
            #[track_caller]
            pub fn match_mut<R>(&mut self, $($f: impl FnOnce(&mut $t) -> R),+) -> R {
                match self {
                    $($name::$alt(value) => $f(value),)+
                    $name::Valueless => valueless(),
                }
            }
        }

        impl<$($t),+> Default for $name<$($t),+> {
            /// The valueless state.
            #[inline]
            fn default() -> Self {
                $name::Valueless
            }
        }

        impl<$($t),+> Variant for $name<$($t),+> {
            const COUNT: usize = [$($idx),+].len();

            #[inline]
            fn index(&self) -> usize {
                match self {
                    $($name::$alt(_) => $idx,)+
                    $name::Valueless => Self::COUNT,
                }
            }
        }

        impl<'a, V, $($t),+> Visitable<V> for &'a $name<$($t),+>
        where
            V: Visitor $(+ Visit<&'a $t>)+,
        {
            #[inline]
            #[track_caller]
            fn accept(self, visitor: V) -> V::Output {
                match self {
                    $($name::$alt(value) => <V as Visit<&'a $t>>::visit(visitor, value),)+
                    $name::Valueless => valueless(),
                }
            }
        }

        impl<'a, V, $($t),+> Visitable<V> for &'a mut $name<$($t),+>
        where
            V: Visitor $(+ Visit<&'a mut $t>)+,
        {
            #[inline]
            #[track_caller]
            fn accept(self, visitor: V) -> V::Output {
                match self {
                    $($name::$alt(value) => <V as Visit<&'a mut $t>>::visit(visitor, value),)+
                    $name::Valueless => valueless(),
                }
            }
        }

        impl<V, $($t),+> Visitable<V> for $name<$($t),+>
        where
            V: Visitor $(+ Visit<$t>)+,
        {
            #[inline]
            #[track_caller]
            fn accept(self, visitor: V) -> V::Output {
                match self {
                    $($name::$alt(value) => <V as Visit<$t>>::visit(visitor, value),)+
                    $name::Valueless => valueless(),
                }
            }
        }
    };

    (@alternative $name:ident [$($g:ident),+] $idx:tt => $alt:ident($t:ident)) => {
        impl<$($g),+> Alternative<$idx> for $name<$($g),+> {
            type Type = $t;

            #[inline]
            fn inject(value: $t) -> Self {
                $name::$alt(value)
            }

            #[inline]
            fn project(&self) -> Option<&$t> {
                match self {
                    $name::$alt(value) => Some(value),
                    _ => None,
                }
            }

            #[inline]
            fn project_mut(&mut self) -> Option<&mut $t> {
                match self {
                    $name::$alt(value) => Some(value),
                    _ => None,
                }
            }

            #[inline]
            fn extract(self) -> Result<$t, Self> {
                match self {
                    $name::$alt(value) => Ok(value),
                    other => Err(other),
                }
            }
        }

        impl<$($g),+> Member<$t, Index<$idx>> for $name<$($g),+> {
            const INDEX: usize = $idx;

            #[inline]
            fn inject(value: $t) -> Self {
                $name::$alt(value)
            }

            #[inline]
            fn project(&self) -> Option<&$t> {
                <Self as Alternative<$idx>>::project(self)
            }

            #[inline]
            fn project_mut(&mut self) -> Option<&mut $t> {
                <Self as Alternative<$idx>>::project_mut(self)
            }

            #[inline]
            fn extract(self) -> Result<$t, Self> {
                <Self as Alternative<$idx>>::extract(self)
            }
        }
    };

    (
        $(#[$attr:meta])*
        $name:ident $generics:tt {
            $($idx:tt => $alt:ident($t:ident) $f:ident),+ $(,)?
        }
    ) => {
        variant!(@define $(#[$attr])* $name { $($idx => $alt($t) $f),+ });
        $(variant!(@alternative $name $generics $idx => $alt($t));)+
    };
}

variant!(
    /// A variant with one alternative: present or valueless.
    Variant1 [T0] {
        0 => V0(T0) f0,
    }
);

variant!(
    /// A variant over two alternatives.
    Variant2 [T0, T1] {
        0 => V0(T0) f0,
        1 => V1(T1) f1,
    }
);

variant!(
    /// A variant over three alternatives.
    Variant3 [T0, T1, T2] {
        0 => V0(T0) f0,
        1 => V1(T1) f1,
        2 => V2(T2) f2,
    }
);

variant!(
    /// A variant over four alternatives.
    Variant4 [T0, T1, T2, T3] {
        0 => V0(T0) f0,
        1 => V1(T1) f1,
        2 => V2(T2) f2,
        3 => V3(T3) f3,
    }
);

variant!(
    /// A variant over five alternatives.
    Variant5 [T0, T1, T2, T3, T4] {
        0 => V0(T0) f0,
        1 => V1(T1) f1,
        2 => V2(T2) f2,
        3 => V3(T3) f3,
        4 => V4(T4) f4,
    }
);

variant!(
    /// A variant over six alternatives.
    Variant6 [T0, T1, T2, T3, T4, T5] {
        0 => V0(T0) f0,
        1 => V1(T1) f1,
        2 => V2(T2) f2,
        3 => V3(T3) f3,
        4 => V4(T4) f4,
        5 => V5(T5) f5,
    }
);

variant!(
    /// A variant over seven alternatives.
    Variant7 [T0, T1, T2, T3, T4, T5, T6] {
        0 => V0(T0) f0,
        1 => V1(T1) f1,
        2 => V2(T2) f2,
        3 => V3(T3) f3,
        4 => V4(T4) f4,
        5 => V5(T5) f5,
        6 => V6(T6) f6,
    }
);

variant!(
    /// A variant over eight alternatives.
    Variant8 [T0, T1, T2, T3, T4, T5, T6, T7] {
        0 => V0(T0) f0,
        1 => V1(T1) f1,
        2 => V2(T2) f2,
        3 => V3(T3) f3,
        4 => V4(T4) f4,
        5 => V5(T5) f5,
        6 => V6(T6) f6,
        7 => V7(T7) f7,
    }
);
