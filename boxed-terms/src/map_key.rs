//! Canonical map keys.
//!
//! [`encode_map_key`] derives a deterministic string from the structure of
//! a term.  The variant tag is always part of the key, so `atom(1)`,
//! `integer(1)` and `string(1)` never collide.  Map keys sort their own
//! entries first, which makes the encoding independent of insertion order.
//! Names and text escape the delimiters `\`, `(`, `)`, `,` and `:` with a
//! backslash, so distinct terms never share a key.

use crate::{Term, View, format_float};
use core::fmt::Write;
use smartstring::alias::String;

/// Returns the canonical key of `term`.
pub fn encode_map_key(term: &Term) -> String {
    let mut out = String::new();
    write_key(&mut out, term);
    out
}

impl Term {
    /// Shorthand for [`encode_map_key`].
    #[inline]
    pub fn map_key(&self) -> String {
        encode_map_key(self)
    }
}

fn write_key(out: &mut String, term: &Term) {
    match term.view() {
        View::Atom(name) => primitive(out, "atom", name),
        View::Integer(i) => {
            // Writing into a String never fails.
            let _ = write!(out, "integer({i})");
        }
        View::Float(f) => primitive(out, "float", &format_float(f)),
        View::String(s) => primitive(out, "string", s),
        View::Bitstring(bits) => {
            out.push_str("bitstring(");
            for bit in bits.bits() {
                out.push(if bit { '1' } else { '0' });
            }
            out.push(')');
        }
        View::List(items) => sequence(out, "list", items),
        View::Tuple(items) => sequence(out, "tuple", items),
        View::Map(map) => {
            out.push_str("map(");
            for (i, (canonical, _, value)) in map.canonical_entries().into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(canonical);
                out.push(':');
                write_key(out, value);
            }
            out.push(')');
        }
        View::ConsPattern(head, tail) => sequence(out, "cons_pattern", [head, tail]),
        View::VariablePattern(name) => primitive(out, "variable_pattern", name),
    }
}

fn primitive(out: &mut String, tag: &str, value: &str) {
    out.push_str(tag);
    out.push('(');
    for c in value.chars() {
        if matches!(c, '\\' | '(' | ')' | ',' | ':') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push(')');
}

fn sequence<'a>(out: &mut String, tag: &str, items: impl IntoIterator<Item = &'a Term>) {
    out.push_str(tag);
    out.push('(');
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_key(out, item);
    }
    out.push(')');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Segment, TermMap, atom, list, map, tuple};
    use num_bigint::BigInt;

    #[test]
    fn primitives() {
        assert_eq!(encode_map_key(&atom!("abc")), "atom(abc)");
        assert_eq!(encode_map_key(&Term::integer(-42)), "integer(-42)");
        assert_eq!(encode_map_key(&Term::float(1.5)), "float(1.5)");
        assert_eq!(encode_map_key(&Term::float(2.0)), "float(2.0)");
        assert_eq!(encode_map_key(&Term::string("abc")), "string(abc)");
        assert_eq!(encode_map_key(&Term::boolean(true)), "atom(true)");
    }

    #[test]
    fn big_integers_keep_every_digit() {
        let big: BigInt = "-98765432109876543210".parse().unwrap();
        assert_eq!(
            encode_map_key(&Term::integer(big)),
            "integer(-98765432109876543210)"
        );
    }

    #[test]
    fn bitstrings_list_their_bits() {
        let t = Term::bitstring_from_segments(&[Segment::integer(5).size(4)]).unwrap();
        assert_eq!(encode_map_key(&t), "bitstring(0101)");
    }

    #[test]
    fn sequences_recurse() {
        assert_eq!(
            encode_map_key(&list![1, atom!("a")]),
            "list(integer(1),atom(a))"
        );
        assert_eq!(
            encode_map_key(&tuple!(list![], "x")),
            "tuple(list(),string(x))"
        );
    }

    #[test]
    fn maps_are_order_independent() {
        let a = map! { atom!("x") => 1, atom!("y") => 2 };
        let b = map! { atom!("y") => 2, atom!("x") => 1 };
        assert_eq!(encode_map_key(&a), encode_map_key(&b));
        assert_eq!(
            encode_map_key(&a),
            "map(atom(x):integer(1),atom(y):integer(2))"
        );
    }

    #[test]
    fn nested_maps_as_keys() {
        let inner_a = map! { 1 => 2, 3 => 4 };
        let inner_b = map! { 3 => 4, 1 => 2 };
        let outer = Term::map([(inner_a, "v1"), (inner_b, "v2")]);
        assert_eq!(outer.unpack_map().unwrap().len(), 1);
    }

    #[test]
    fn variant_tag_distinguishes_equal_payloads() {
        let keys = [
            encode_map_key(&atom!("1")),
            encode_map_key(&Term::integer(1)),
            encode_map_key(&Term::string("1")),
            encode_map_key(&Term::float(1.0)),
            encode_map_key(&list![1]),
            encode_map_key(&tuple!(1)),
        ];
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn delimiters_in_text_are_escaped() {
        assert_eq!(encode_map_key(&Term::string("a,b")), r"string(a\,b)");
        assert_eq!(encode_map_key(&atom!(r"x:\y")), r"atom(x\:\\y)");
        assert_eq!(encode_map_key(&Term::string("f(x)")), r"string(f\(x\))");

        let split = tuple!("a", "b");
        let joined = tuple!("a),string(b");
        assert_ne!(encode_map_key(&split), encode_map_key(&joined));
        let one = list![atom!("a),atom(b")];
        let two = list![atom!("a"), atom!("b")];
        assert_ne!(encode_map_key(&one), encode_map_key(&two));

        let m = TermMap::new().put(split.clone(), 1).put(joined, 2);
        assert_eq!(m.len(), 2);
        assert_eq!(m.get(&split), Some(&Term::integer(1)));
    }

    #[test]
    fn patterns() {
        let cons = Term::cons_pattern(Term::variable_pattern("h"), Term::variable_pattern("t"));
        assert_eq!(
            cons.map_key(),
            "cons_pattern(variable_pattern(h),variable_pattern(t))"
        );
    }
}
