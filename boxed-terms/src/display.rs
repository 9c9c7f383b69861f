//! Defines [`TermDisplay`], a formatter for rendering [`Term`] values.
//!
//! Provides a [`fmt::Display`] implementation producing the inspection
//! syntax of the source language: `:atom`, `{1, 2}`, `%{a: 1}`,
//! `<<1, 2::size(3)>>`, `[h | t]`.  Error messages quote terms this way.

use crate::{BitString, Term, View, format_float};
use std::fmt;

/// A wrapper around a borrowed [`Term`] that implements [`fmt::Display`].
///
/// ### Example
/// ```rust
/// use boxed_terms::{Term, atom, tuple};
/// let term = tuple!(atom!("ok"), "hello", 1.0);
/// assert_eq!(term.display().to_string(), r#"{:ok, "hello", 1.0}"#);
/// ```
///
/// Construct instances via [`Term::display`].
pub struct TermDisplay<'a> {
    term: &'a Term,
}

impl Term {
    /// Return a [`TermDisplay`] suitable for formatting with [`fmt::Display`].
    #[inline]
    pub fn display(&self) -> TermDisplay<'_> {
        TermDisplay { term: self }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.display(), f)
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars().peekable();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    while let Some(c) = chars.next() {
        let last = chars.peek().is_none();
        if !(c.is_ascii_alphanumeric() || c == '_' || (last && (c == '?' || c == '!'))) {
            return false;
        }
    }
    true
}

fn write_str_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\x{:02X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    f.write_str(&out)
}

fn write_atom(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    match name {
        "true" | "false" | "nil" => f.write_str(name),
        _ if is_identifier(name) => write!(f, ":{name}"),
        _ => {
            f.write_str(":")?;
            write_str_quoted(f, name)
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Term]) -> fmt::Result {
    for (i, t) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", t.display())?;
    }
    Ok(())
}

fn write_bitstring(f: &mut fmt::Formatter<'_>, bits: &BitString) -> fmt::Result {
    let whole = bits.len() / 8;
    let rest = bits.len() % 8;
    f.write_str("<<")?;
    for (i, byte) in bits.as_bytes()[..whole].iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{byte}")?;
    }
    if rest > 0 {
        if whole > 0 {
            f.write_str(", ")?;
        }
        let tail = bits.as_bytes()[whole] >> (8 - rest);
        write!(f, "{tail}::size({rest})")?;
    }
    f.write_str(">>")
}

impl<'a> fmt::Display for TermDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.term.view() {
            View::Atom(a) => write_atom(f, a),
            View::Integer(i) => write!(f, "{i}"),
            View::Float(r) => f.write_str(&format_float(r)),
            View::String(s) => write_str_quoted(f, s),
            View::Bitstring(bits) => write_bitstring(f, bits),
            View::List(items) => {
                f.write_str("[")?;
                write_items(f, items)?;
                f.write_str("]")
            }
            View::Tuple(items) => {
                f.write_str("{")?;
                write_items(f, items)?;
                f.write_str("}")
            }
            View::Map(map) => {
                let entries = map.sorted_entries();
                let keyword = entries
                    .iter()
                    .all(|(k, _)| k.unpack_atom().is_ok_and(is_identifier));
                f.write_str("%{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match k.unpack_atom() {
                        Ok(name) if keyword => write!(f, "{name}: {}", v.display())?,
                        _ => write!(f, "{} => {}", k.display(), v.display())?,
                    }
                }
                f.write_str("}")
            }
            View::ConsPattern(head, tail) => {
                write!(f, "[{} | {}]", head.display(), tail.display())
            }
            View::VariablePattern(name) => f.write_str(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Segment, atom, list, map, tuple};

    fn show(t: &Term) -> std::string::String {
        t.display().to_string()
    }

    #[test]
    fn atoms() {
        assert_eq!(show(&atom!("ok")), ":ok");
        assert_eq!(show(&atom!("valid?")), ":valid?");
        assert_eq!(show(&atom!("Elixir.Foo Bar")), ":\"Elixir.Foo Bar\"");
        assert_eq!(show(&Term::boolean(false)), "false");
        assert_eq!(show(&Term::nil()), "nil");
    }

    #[test]
    fn scalars() {
        assert_eq!(show(&Term::integer(-7)), "-7");
        assert_eq!(show(&Term::float(2.0)), "2.0");
        assert_eq!(show(&Term::string("a\"b\n")), "\"a\\\"b\\n\"");
    }

    #[test]
    fn collections() {
        assert_eq!(show(&list![1, list![]]), "[1, []]");
        assert_eq!(show(&tuple!(atom!("ok"), 2)), "{:ok, 2}");
        assert_eq!(show(&tuple!()), "{}");
        assert_eq!(show(&map! { atom!("b") => 2, atom!("a") => 1 }), "%{a: 1, b: 2}");
        assert_eq!(show(&map! { "k" => 1 }), "%{\"k\" => 1}");
    }

    #[test]
    fn bitstrings() {
        let t = Term::bitstring_from_segments(&[
            Segment::integer(1),
            Segment::integer(2),
            Segment::integer(5).size(3),
        ])
        .unwrap();
        assert_eq!(show(&t), "<<1, 2, 5::size(3)>>");
        let t = Term::bitstring_from_segments(&[Segment::integer(1).size(1)]).unwrap();
        assert_eq!(show(&t), "<<1::size(1)>>");
        assert_eq!(show(&Term::bitstring(BitString::new())), "<<>>");
    }

    #[test]
    fn patterns() {
        let t = Term::cons_pattern(Term::variable_pattern("h"), Term::variable_pattern("t"));
        assert_eq!(show(&t), "[h | t]");
        assert_eq!(format!("{t}"), "[h | t]");
    }
}
