//! Defines [`View`], a borrowed read-only representation of a [`Term`].
//!
//! Provides lightweight accessors for inspecting terms without allocation,
//! and the standard term ordering built on top of them.

use crate::{BitString, Handle, Term, TermMap};
use core::fmt;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use std::cmp::Ordering;

impl fmt::Debug for View<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            View::Atom(a) => f.debug_tuple("Atom").field(&a).finish(),
            View::Integer(i) => f.debug_tuple("Integer").field(&i).finish(),
            View::Float(r) => f.debug_tuple("Float").field(&r).finish(),
            View::Bitstring(b) => f.debug_tuple("Bitstring").field(&b).finish(),
            View::String(s) => f.debug_tuple("String").field(&s).finish(),
            View::List(ts) => f.debug_tuple("List").field(&ts).finish(),
            View::Tuple(ts) => f.debug_tuple("Tuple").field(&ts).finish(),
            View::Map(m) => f.debug_tuple("Map").field(&m).finish(),
            View::ConsPattern(h, t) => f.debug_tuple("ConsPattern").field(&h).field(&t).finish(),
            View::VariablePattern(v) => f.debug_tuple("VariablePattern").field(&v).finish(),
        }
    }
}

/// A borrowed view into the contents of a [`Term`].
///
/// Use [`Term::view`] to obtain a view.  Each variant of [`View`]
/// represents the decoded form of a term and borrows any data referenced
/// from the term handle itself.  No allocations are performed when
/// constructing a `View`.  Matching on a view is exhaustive, so adding a
/// term variant forces every consumer to handle it.
#[derive(Clone, Copy)]
pub enum View<'a> {
    /// An atom name.  Booleans and `nil` are atoms.
    Atom(&'a str),
    /// An arbitrary-precision integer.
    Integer(&'a BigInt),
    /// A floating point value.
    Float(f64),
    /// An exact-length bit sequence.
    Bitstring(&'a BitString),
    /// A UTF‑8 string.
    String(&'a str),
    /// The elements of a proper list.
    List(&'a [Term]),
    /// The elements of a tuple.
    Tuple(&'a [Term]),
    /// The entries of a map.
    Map(&'a TermMap),
    /// The head and tail of a `[head | tail]` pattern.
    ConsPattern(&'a Term, &'a Term),
    /// The name of a variable pattern.
    VariablePattern(&'a str),
}

impl Term {
    /// Produce a [`View`] of this term.
    #[inline]
    pub fn view(&self) -> View<'_> {
        match &self.0 {
            Handle::Atom(a) => View::Atom(a),
            Handle::Int(i) => View::Integer(i),
            Handle::Float(f) => View::Float(*f),
            Handle::Bits(b) => View::Bitstring(b),
            Handle::Str(s) => View::String(s),
            Handle::List(items) => View::List(items),
            Handle::Tuple(items) => View::Tuple(items),
            Handle::Map(m) => View::Map(m),
            Handle::Cons(pair) => View::ConsPattern(&pair.0, &pair.1),
            Handle::Var(name) => View::VariablePattern(name),
        }
    }

    /// Compare two terms using the standard term order:
    /// numbers < atoms < tuples < maps < lists < binaries, with the
    /// match-only pattern variants sorted last.
    #[inline]
    pub fn compare(&self, other: &Term) -> Ordering {
        self.view().cmp(&other.view())
    }
}

impl<'a> PartialEq for View<'a> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<'a> Eq for View<'a> {}

impl core::cmp::PartialOrd for View<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl core::cmp::Ord for View<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        let order_a = kind_order(self);
        let order_b = kind_order(other);
        if order_a != order_b {
            return order_a.cmp(&order_b);
        }
        match (self, other) {
            (View::Integer(a), View::Integer(b)) => a.cmp(b),
            (View::Float(a), View::Float(b)) if a.is_nan() && b.is_nan() => Ordering::Equal,
            (View::Float(a), View::Float(b)) => a.total_cmp(b),
            // Mixed numbers compare by value; on a tie the integer sorts first.
            (View::Integer(a), View::Float(b)) => {
                integer_as_float(a).total_cmp(b).then(Ordering::Less)
            }
            (View::Float(a), View::Integer(b)) => {
                a.total_cmp(&integer_as_float(b)).then(Ordering::Greater)
            }
            (View::Atom(a), View::Atom(b)) => a.cmp(b),
            (View::Tuple(a), View::Tuple(b)) => cmp_sequences(a, b),
            (View::Map(a), View::Map(b)) => {
                let ord = a.len().cmp(&b.len());
                if ord != Ordering::Equal {
                    return ord;
                }
                let entries_a = a.sorted_entries();
                let entries_b = b.sorted_entries();
                for ((ka, va), (kb, vb)) in entries_a.iter().zip(entries_b.iter()) {
                    let ord = ka.compare(kb).then_with(|| va.compare(vb));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            }
            // Lists compare element-wise, a proper prefix sorts first.
            (View::List(a), View::List(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    let ord = x.compare(y);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            (
                View::Bitstring(_) | View::String(_),
                View::Bitstring(_) | View::String(_),
            ) => {
                let (bytes_a, bits_a) = binary_parts(self);
                let (bytes_b, bits_b) = binary_parts(other);
                bytes_a
                    .cmp(bytes_b)
                    .then(bits_a.cmp(&bits_b))
                    .then(self.is_string().cmp(&other.is_string()))
            }
            (View::ConsPattern(ha, ta), View::ConsPattern(hb, tb)) => {
                ha.compare(hb).then_with(|| ta.compare(tb))
            }
            (View::VariablePattern(a), View::VariablePattern(b)) => a.cmp(b),
            _ => unreachable!(),
        }
    }
}

impl View<'_> {
    fn is_string(&self) -> bool {
        matches!(self, View::String(_))
    }
}

/// Compute the kind order used for comparing terms of different kinds.
fn kind_order(t: &View) -> u8 {
    match t {
        View::Integer(_) | View::Float(_) => 0,
        View::Atom(_) => 1,
        View::Tuple(_) => 2,
        View::Map(_) => 3,
        View::List(_) => 4,
        View::Bitstring(_) | View::String(_) => 5,
        View::ConsPattern(_, _) => 6,
        View::VariablePattern(_) => 7,
    }
}

fn cmp_sequences(a: &[Term], b: &[Term]) -> Ordering {
    let ord = a.len().cmp(&b.len());
    if ord != Ordering::Equal {
        return ord;
    }
    for (x, y) in a.iter().zip(b.iter()) {
        let ord = x.compare(y);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn integer_as_float(i: &BigInt) -> f64 {
    i.to_f64().unwrap_or(f64::NAN)
}

/// Strings and bitstrings share one order: by bytes, then by bit length.
fn binary_parts<'a>(t: &View<'a>) -> (&'a [u8], usize) {
    match *t {
        View::String(s) => (s.as_bytes(), s.len() * 8),
        View::Bitstring(b) => (b.as_bytes(), b.len()),
        _ => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{atom, list, map, tuple};

    #[test]
    fn view_is_exhaustive_over_handles() {
        assert!(matches!(Term::atom("a").view(), View::Atom("a")));
        assert!(matches!(Term::string("s").view(), View::String("s")));
        assert!(matches!(Term::float(1.5).view(), View::Float(x) if x == 1.5));
        assert!(matches!(
            Term::variable_pattern("x").view(),
            View::VariablePattern("x")
        ));
        let cons = Term::cons_pattern(1, Term::variable_pattern("t"));
        let View::ConsPattern(h, t) = cons.view() else {
            panic!("expected cons pattern");
        };
        assert_eq!(h, &Term::integer(1));
        assert!(t.is_variable_pattern());
    }

    #[test]
    fn kinds_sort_in_standard_order() {
        let mut terms = vec![
            Term::string("s"),
            list![1],
            map! { 1 => 2 },
            tuple!(1),
            atom!("a"),
            Term::integer(5),
        ];
        terms.sort_by(Term::compare);
        let kinds: Vec<_> = terms.iter().map(Term::kind_name).collect();
        assert_eq!(kinds, ["integer", "atom", "tuple", "map", "list", "string"]);
    }

    #[test]
    fn numbers_compare_by_value() {
        assert_eq!(Term::integer(1).compare(&Term::float(1.5)), Ordering::Less);
        assert_eq!(Term::float(2.5).compare(&Term::integer(2)), Ordering::Greater);
        assert_eq!(Term::integer(1).compare(&Term::float(1.0)), Ordering::Less);
        assert_eq!(Term::float(1.0).compare(&Term::integer(1)), Ordering::Greater);
        assert_eq!(Term::integer(-3).compare(&Term::integer(2)), Ordering::Less);
    }

    #[test]
    fn tuples_compare_by_size_first() {
        assert_eq!(tuple!(9).compare(&tuple!(1, 1)), Ordering::Less);
        assert_eq!(tuple!(1, 2).compare(&tuple!(1, 3)), Ordering::Less);
    }

    #[test]
    fn lists_compare_elementwise() {
        assert_eq!(list![1, 2].compare(&list![1, 2, 0]), Ordering::Less);
        assert_eq!(list![2].compare(&list![1, 9, 9]), Ordering::Greater);
    }

    #[test]
    fn maps_compare_independent_of_insertion_order() {
        let a = map! { atom!("x") => 1, atom!("y") => 2 };
        let b = map! { atom!("y") => 2, atom!("x") => 1 };
        assert_eq!(a.compare(&b), Ordering::Equal);
        assert_eq!(a.view(), b.view());
    }
}
