//! Conversion of terms to displayable text.
//!
//! [`Term::to_text`] is the one conversion used wherever a term is
//! interpolated into output: rendered text nodes, attribute values and
//! event payloads.

use crate::{Term, TermError, View};
use num_traits::ToPrimitive;
use smartstring::alias::String;

/// Formats a float in shortest round-trip form, always with a fractional
/// part (`1.0`, `1.5`, `1.0e20`).
pub fn format_float(value: f64) -> String {
    let mut text = format!("{value:?}");
    if value.is_finite() && !text.contains('.') {
        match text.find('e') {
            Some(pos) => text.insert_str(pos, ".0"),
            None => text.push_str(".0"),
        }
    }
    String::from(text)
}

impl Term {
    /// Converts the term to displayable text.
    ///
    /// Atoms render by name and `nil` renders empty.  Lists are treated as
    /// character data: integers are code points, strings and binaries are
    /// copied, nested lists are flattened.  Tuples, maps, non-binary
    /// bitstrings and patterns have no textual form and fail with
    /// [`TermError::UnsupportedVariant`].
    pub fn to_text(&self) -> Result<String, TermError> {
        match self.view() {
            View::Atom(_) if self.is_nil() => Ok(String::new()),
            View::Atom(name) => Ok(String::from(name)),
            View::Integer(i) => Ok(String::from(i.to_string())),
            View::Float(f) => Ok(format_float(f)),
            View::String(s) => Ok(String::from(s)),
            View::Bitstring(bits) => Ok(String::from(bits.to_text()?)),
            View::List(items) => {
                let mut out = String::new();
                push_chardata(&mut out, items)?;
                Ok(out)
            }
            View::Tuple(_) | View::Map(_) | View::ConsPattern(_, _) | View::VariablePattern(_) => {
                Err(self.unsupported("to_text"))
            }
        }
    }

    pub(crate) fn unsupported(&self, operation: &'static str) -> TermError {
        TermError::UnsupportedVariant {
            operation,
            kind: self.kind_name(),
        }
    }
}

fn push_chardata(out: &mut String, items: &[Term]) -> Result<(), TermError> {
    for item in items {
        match item.view() {
            View::Integer(i) => {
                let c = i
                    .to_u32()
                    .and_then(char::from_u32)
                    .ok_or_else(|| TermError::InvalidCodePoint(String::from(i.to_string())))?;
                out.push(c);
            }
            View::String(s) => out.push_str(s),
            View::Bitstring(bits) => out.push_str(bits.to_text()?),
            View::List(nested) => push_chardata(out, nested)?,
            _ => return Err(item.unsupported("to_text")),
        }
    }
    Ok(())
}
