//! Defines [`TermError`], the unified error type for term operations.
//!
//! Provides descriptive error variants for binary construction failures,
//! kind mismatches, text conversion of terms that have no textual form,
//! and malformed serialized state.

use smartstring::alias::String;
use thiserror::Error;

/// Represents all possible errors that can occur while building, converting
/// or decoding terms.
///
/// [`TermError`] provides a single error surface for higher-level functions.
/// Downstream crates wrap it with `#[from]` so `?` can be used at call sites
/// without explicit mapping.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TermError {
    /// A binary segment's declared kind does not match the variant of the
    /// term supplied for it. `index` is 1-based.
    #[error(
        "construction of binary failed: segment {index} of type '{kind}': expected {article} {kind} but got: {received}"
    )]
    TypeMismatch {
        index: usize,
        kind: &'static str,
        article: &'static str,
        received: String,
    },

    /// A binary segment requested a bit width its kind cannot produce.
    #[error("construction of binary failed: segment {index} of type '{kind}': invalid width of {bits} bits")]
    InvalidSegmentWidth {
        index: usize,
        kind: &'static str,
        bits: u64,
    },

    /// A term variant reached a conversion that has no handling for it.
    #[error("{operation} is not defined for {kind}")]
    UnsupportedVariant {
        operation: &'static str,
        kind: &'static str,
    },

    #[error("Type mismatch: expected {expected}, found {found}")]
    UnexpectedKind {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Arity mismatch: expected {expected}, found {found}")]
    UnexpectedArity { expected: usize, found: usize },

    #[error("binary is not valid UTF-8")]
    InvalidUtf8,

    #[error("invalid code point {0}")]
    InvalidCodePoint(String),

    #[error("invalid serialized term: {0}")]
    Deserialize(String),
}
