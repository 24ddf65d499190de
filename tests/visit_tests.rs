extern crate lifeline;

use std::cell::Cell;

use lifeline::variant::{Variant2, Variant3};
use lifeline::{try_visit, try_visit2, try_visit3, visit, visit2, visit3, Error, Visit, Visitor};
use proptest::prelude::*;

trait Id {
    const ID: usize;
}

impl Id for u8 {
    const ID: usize = 0;
}

impl Id for u16 {
    const ID: usize = 1;
}

impl Id for u32 {
    const ID: usize = 2;
}

/// Reports which overload ran and counts calls.
struct Recorder<'a> {
    calls: &'a Cell<usize>,
}

impl<'a> Recorder<'a> {
    fn hit(&self) {
        self.calls.set(self.calls.get() + 1);
    }
}

impl Visitor for Recorder<'_> {
    type Output = Vec<usize>;
}

impl<'v, X: Id> Visit<&'v X> for Recorder<'_> {
    fn visit(self, _: &'v X) -> Vec<usize> {
        self.hit();
        vec![X::ID]
    }
}

impl<'v, 'w, X: Id, Y: Id> Visit<(&'v X, &'w Y)> for Recorder<'_> {
    fn visit(self, _: (&'v X, &'w Y)) -> Vec<usize> {
        self.hit();
        vec![X::ID, Y::ID]
    }
}

impl<'v, 'w, 'x, X: Id, Y: Id, Z: Id> Visit<(&'v X, &'w Y, &'x Z)> for Recorder<'_> {
    fn visit(self, _: (&'v X, &'w Y, &'x Z)) -> Vec<usize> {
        self.hit();
        vec![X::ID, Y::ID, Z::ID]
    }
}

type Word = Variant3<u8, u16, u32>;

fn word(index: usize) -> Word {
    match index {
        0 => Word::new(1u8),
        1 => Word::new(2u16),
        _ => Word::new(3u32),
    }
}

struct Describe;

impl Visitor for Describe {
    type Output = String;
}

impl<'v> Visit<&'v i32> for Describe {
    fn visit(self, value: &'v i32) -> String {
        format!("int {}", value)
    }
}

impl<'v> Visit<&'v f32> for Describe {
    fn visit(self, value: &'v f32) -> String {
        format!("float {}", value)
    }
}

struct Double;

impl Visitor for Double {
    type Output = ();
}

impl<'v> Visit<&'v mut i32> for Double {
    fn visit(self, value: &'v mut i32) {
        *value *= 2;
    }
}

impl<'v> Visit<&'v mut f32> for Double {
    fn visit(self, value: &'v mut f32) {
        *value *= 2.0;
    }
}

struct Widen;

impl Visitor for Widen {
    type Output = f64;
}

impl Visit<i32> for Widen {
    fn visit(self, value: i32) -> f64 {
        f64::from(value)
    }
}

impl Visit<f32> for Widen {
    fn visit(self, value: f32) -> f64 {
        f64::from(value)
    }
}

struct Sum;

impl Visitor for Sum {
    type Output = f64;
}

impl<'v, 'w> Visit<(&'v i32, &'w i32)> for Sum {
    fn visit(self, (a, b): (&'v i32, &'w i32)) -> f64 {
        f64::from(a + b)
    }
}

impl<'v, 'w> Visit<(&'v i32, &'w f32)> for Sum {
    fn visit(self, (a, b): (&'v i32, &'w f32)) -> f64 {
        f64::from(*a) + f64::from(*b)
    }
}

impl<'v, 'w> Visit<(&'v f32, &'w i32)> for Sum {
    fn visit(self, (a, b): (&'v f32, &'w i32)) -> f64 {
        f64::from(*a) + f64::from(*b)
    }
}

impl<'v, 'w> Visit<(&'v f32, &'w f32)> for Sum {
    fn visit(self, (a, b): (&'v f32, &'w f32)) -> f64 {
        f64::from(a + b)
    }
}

#[test]
fn test_visit_by_reference() {
    let v = Variant2::<i32, f32>::new(1337i32);
    assert_eq!(visit(Describe, &v), "int 1337");

    let v = Variant2::<i32, f32>::new(0.5f32);
    assert_eq!(visit(Describe, &v), "float 0.5");
}

#[test]
fn test_visit_by_mutable_reference() {
    let mut v = Variant2::<i32, f32>::new(21i32);
    visit(Double, &mut v);
    assert_eq!(v, Variant2::V0(42));

    v = Variant2::new(1.5f32);
    visit(Double, &mut v);
    assert_eq!(v, Variant2::V1(3.0));
}

#[test]
fn test_visit_by_value() {
    assert_eq!(visit(Widen, Variant2::<i32, f32>::new(3i32)), 3.0);
    assert_eq!(visit(Widen, Variant2::<i32, f32>::new(0.25f32)), 0.25);
}

#[test]
fn test_visit_pairs_of_concrete_types() {
    let a = Variant2::<i32, f32>::new(2i32);
    let b = Variant2::<i32, f32>::new(0.5f32);

    assert_eq!(visit2(Sum, &a, &b), 2.5);
    assert_eq!(visit2(Sum, &b, &a), 2.5);
    assert_eq!(visit2(Sum, &a, &a), 4.0);
    assert_eq!(visit2(Sum, &b, &b), 1.0);
}

#[test]
fn test_try_visit_reports_valueless() {
    let calls = Cell::new(0);
    let full = word(1);
    let empty = Word::default();

    assert_eq!(try_visit(Recorder { calls: &calls }, &full), Ok(vec![1]));
    assert_eq!(try_visit(Recorder { calls: &calls }, &empty), Err(Error::Valueless));
    assert_eq!(
        try_visit2(Recorder { calls: &calls }, &full, &empty),
        Err(Error::Valueless)
    );
    assert_eq!(
        try_visit3(Recorder { calls: &calls }, &empty, &full, &full),
        Err(Error::Valueless)
    );
    assert_eq!(
        try_visit3(Recorder { calls: &calls }, &full, &full, &full),
        Ok(vec![1, 1, 1])
    );
    assert_eq!(calls.get(), 2);
}

/// Visits three variants, then the fourth from inside the overload.
struct ThenLast<'a> {
    last: &'a Word,
    calls: &'a Cell<usize>,
}

impl Visitor for ThenLast<'_> {
    type Output = Vec<usize>;
}

impl<'v, 'w, 'x, X: Id, Y: Id, Z: Id> Visit<(&'v X, &'w Y, &'x Z)> for ThenLast<'_> {
    fn visit(self, _: (&'v X, &'w Y, &'x Z)) -> Vec<usize> {
        let mut ids = vec![X::ID, Y::ID, Z::ID];
        ids.extend(visit(Recorder { calls: self.calls }, self.last));
        ids
    }
}

#[test]
fn test_four_variants_by_nesting() {
    let calls = Cell::new(0);
    let (a, b, c, d) = (word(2), word(0), word(1), word(2));

    let ids = visit3(ThenLast { last: &d, calls: &calls }, &a, &b, &c);
    assert_eq!(ids, vec![2, 0, 1, 2]);
    assert_eq!(calls.get(), 1);
}

#[test]
#[should_panic(expected = "visited a valueless variant")]
fn test_visit_valueless_panics() {
    let calls = Cell::new(0);
    visit2(Recorder { calls: &calls }, &word(0), &Word::default());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn single_dispatch_hits_active_overload(i in 0..3usize) {
        let calls = Cell::new(0);
        let v = word(i);

        prop_assert_eq!(visit(Recorder { calls: &calls }, &v), vec![i]);
        prop_assert_eq!(calls.get(), 1);
    }

    #[test]
    fn pair_dispatch_hits_active_overload(i in 0..3usize, j in 0..3usize) {
        let calls = Cell::new(0);
        let (a, b) = (word(i), word(j));

        prop_assert_eq!(visit2(Recorder { calls: &calls }, &a, &b), vec![i, j]);
        prop_assert_eq!(calls.get(), 1);
    }

    #[test]
    fn triple_dispatch_hits_active_overload(i in 0..3usize, j in 0..3usize, k in 0..3usize) {
        let calls = Cell::new(0);
        let (a, b, c) = (word(i), word(j), word(k));

        prop_assert_eq!(visit3(Recorder { calls: &calls }, &a, &b, &c), vec![i, j, k]);
        prop_assert_eq!(calls.get(), 1);
    }
}
