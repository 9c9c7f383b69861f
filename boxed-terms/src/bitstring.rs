//! Defines [`BitString`] and the segment-based binary builder.
//!
//! A bitstring is an exact-length sequence of bits; its length does not
//! have to be a multiple of eight.  Bits are packed most-significant-first
//! into bytes and the unused low bits of the last byte are always zero.
//!
//! [`Term::bitstring_from_segments`] concatenates the bit expansion of a
//! sequence of typed [`Segment`]s.  Every segment is validated before any
//! bits are produced, so a bad segment never yields a partial value.

use crate::{Term, TermError, View};
use core::fmt;
use num_bigint::BigInt;
use smartstring::alias::String;

/// An immutable, exact-length sequence of bits.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct BitString {
    bytes: Vec<u8>,
    len: usize,
}

impl BitString {
    /// Returns an empty bitstring.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a byte-aligned bitstring holding `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
            len: bytes.len() * 8,
        }
    }

    /// Number of bits.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` when the bit length is a multiple of eight.
    #[inline]
    pub fn is_binary(&self) -> bool {
        self.len % 8 == 0
    }

    /// The packed bytes.  When the length is not byte aligned the trailing
    /// bits of the last byte are zero.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the bit at `index`, or `None` past the end.
    #[inline]
    pub fn bit(&self, index: usize) -> Option<bool> {
        (index < self.len).then(|| self.bytes[index / 8] & (0x80 >> (index % 8)) != 0)
    }

    /// Iterates over the bits in order.
    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |i| self.bytes[i / 8] & (0x80 >> (i % 8)) != 0)
    }

    /// Renders the bits as a string of `0` and `1` characters.
    pub fn to_bit_string(&self) -> String {
        self.bits().map(|b| if b { '1' } else { '0' }).collect()
    }

    /// Decodes the content as UTF-8 text.  Only byte-aligned bitstrings
    /// have a textual form.
    pub fn to_text(&self) -> Result<&str, TermError> {
        if !self.is_binary() {
            return Err(TermError::UnsupportedVariant {
                operation: "to_text",
                kind: "non-binary bitstring",
            });
        }
        core::str::from_utf8(&self.bytes).map_err(|_| TermError::InvalidUtf8)
    }

    fn push(&mut self, bit: bool) {
        if self.len % 8 == 0 {
            self.bytes.push(0);
        }
        if bit {
            let last = self.bytes.len() - 1;
            self.bytes[last] |= 0x80 >> (self.len % 8);
        }
        self.len += 1;
    }

    fn extend_bytes(&mut self, bytes: &[u8]) {
        if self.is_binary() {
            self.bytes.extend_from_slice(bytes);
            self.len += bytes.len() * 8;
        } else {
            for byte in bytes {
                for shift in (0..8).rev() {
                    self.push((byte >> shift) & 1 == 1);
                }
            }
        }
    }

    fn append(&mut self, other: &BitString) {
        if self.is_binary() {
            self.bytes.extend_from_slice(&other.bytes);
            self.len += other.len;
        } else {
            other.bits().for_each(|b| self.push(b));
        }
    }
}

impl FromIterator<bool> for BitString {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let mut bits = BitString::new();
        iter.into_iter().for_each(|b| bits.push(b));
        bits
    }
}

impl fmt::Debug for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BitString").field(&self.to_bit_string().as_str()).finish()
    }
}

/// Largest width, in bits, an integer segment may declare.
pub const MAX_SEGMENT_BITS: u64 = 1 << 24;

/// Declared representation of a binary segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Integer,
    Float,
    Bitstring,
    String,
}

impl SegmentKind {
    /// The kind name as it appears in error messages.  It equals the
    /// [`Term::kind_name`] a segment value must have.
    pub fn name(self) -> &'static str {
        match self {
            SegmentKind::Integer => "integer",
            SegmentKind::Float => "float",
            SegmentKind::Bitstring => "bitstring",
            SegmentKind::String => "string",
        }
    }

    fn default_size(self) -> u64 {
        match self {
            SegmentKind::Integer => 8,
            SegmentKind::Float => 64,
            SegmentKind::Bitstring | SegmentKind::String => 0,
        }
    }
}

/// One typed segment of a binary under construction.
///
/// `size` counts units and `unit` is the width of one unit in bits.  Only
/// integer and float segments use them; bitstring and string segments are
/// always appended whole.
#[derive(Debug, Clone)]
pub struct Segment {
    kind: SegmentKind,
    value: Term,
    size: Option<u64>,
    unit: Option<u64>,
}

impl Segment {
    pub fn new(kind: SegmentKind, value: impl Into<Term>) -> Self {
        Self {
            kind,
            value: value.into(),
            size: None,
            unit: None,
        }
    }

    pub fn integer(value: impl Into<Term>) -> Self {
        Self::new(SegmentKind::Integer, value)
    }

    pub fn float(value: impl Into<Term>) -> Self {
        Self::new(SegmentKind::Float, value)
    }

    pub fn bitstring(value: impl Into<Term>) -> Self {
        Self::new(SegmentKind::Bitstring, value)
    }

    pub fn string(value: impl Into<Term>) -> Self {
        Self::new(SegmentKind::String, value)
    }

    pub fn size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn unit(mut self, unit: u64) -> Self {
        self.unit = Some(unit);
        self
    }

    #[inline]
    pub fn kind(&self) -> SegmentKind {
        self.kind
    }

    #[inline]
    pub fn value(&self) -> &Term {
        &self.value
    }

    /// Declared width in bits (`size * unit`).
    pub fn bit_width(&self) -> u64 {
        self.size
            .unwrap_or_else(|| self.kind.default_size())
            .saturating_mul(self.unit.unwrap_or(1))
    }

    fn validate(&self, index: usize) -> Result<(), TermError> {
        if self.value.kind_name() != self.kind.name() {
            return Err(TermError::TypeMismatch {
                index,
                kind: self.kind.name(),
                article: indefinite_article(self.kind.name()),
                received: String::from(self.value.display().to_string()),
            });
        }
        if self.kind == SegmentKind::Integer && self.bit_width() > MAX_SEGMENT_BITS {
            return Err(TermError::InvalidSegmentWidth {
                index,
                kind: self.kind.name(),
                bits: self.bit_width(),
            });
        }
        if self.kind == SegmentKind::Float && !matches!(self.bit_width(), 32 | 64) {
            return Err(TermError::InvalidSegmentWidth {
                index,
                kind: self.kind.name(),
                bits: self.bit_width(),
            });
        }
        Ok(())
    }

    fn write_to(&self, out: &mut BitString) {
        match self.value.view() {
            View::Integer(value) => push_integer_bits(out, value, self.bit_width()),
            View::Float(value) => {
                if self.bit_width() == 32 {
                    out.extend_bytes(&(value as f32).to_bits().to_be_bytes());
                } else {
                    out.extend_bytes(&value.to_bits().to_be_bytes());
                }
            }
            View::Bitstring(bits) => out.append(bits),
            View::String(text) => out.extend_bytes(text.as_bytes()),
            // `validate` admits only the four kinds above.
            _ => {}
        }
    }
}

/// Appends the low `width` bits of `value`, most significant first.
/// Negative values contribute their two's-complement bits.
fn push_integer_bits(out: &mut BitString, value: &BigInt, width: u64) {
    for i in (0..width).rev() {
        out.push(value.bit(i));
    }
}

/// Returns `"an"` for kind names starting with a vowel, `"a"` otherwise.
pub fn indefinite_article(word: &str) -> &'static str {
    match word.chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}

impl Term {
    /// Builds a bitstring term from typed segments.
    ///
    /// Fails with [`TermError::TypeMismatch`] naming the 1-based position
    /// of the first segment whose value does not have the declared kind.
    /// Integers wider than their segment are silently truncated.
    pub fn bitstring_from_segments(segments: &[Segment]) -> Result<Term, TermError> {
        for (i, segment) in segments.iter().enumerate() {
            segment.validate(i + 1)?;
        }
        let mut bits = BitString::new();
        for segment in segments {
            segment.write_to(&mut bits);
        }
        log::trace!(
            "built bitstring of {} bits from {} segments",
            bits.len(),
            segments.len()
        );
        Ok(Term::bitstring(bits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits_of(t: &Term) -> String {
        t.unpack_bitstring().unwrap().to_bit_string()
    }

    #[test]
    fn integer_segment_truncates_to_width() {
        let _ = env_logger::builder().is_test(true).try_init();
        let t = Term::bitstring_from_segments(&[Segment::integer(260).size(8).unit(1)]).unwrap();
        assert_eq!(bits_of(&t), "00000100");
        assert_eq!(t.unpack_bitstring().unwrap().as_bytes(), &[4]);
    }

    #[test]
    fn integer_segment_defaults_to_one_byte() {
        let t = Term::bitstring_from_segments(&[Segment::integer(65), Segment::integer(66)]).unwrap();
        let bits = t.unpack_bitstring().unwrap();
        assert_eq!(bits.len(), 16);
        assert_eq!(bits.to_text().unwrap(), "AB");
        assert!(t.is_binary());
    }

    #[test]
    fn negative_integers_wrap() {
        let t = Term::bitstring_from_segments(&[Segment::integer(-1).size(4)]).unwrap();
        assert_eq!(bits_of(&t), "1111");
        let t = Term::bitstring_from_segments(&[Segment::integer(-2).size(3)]).unwrap();
        assert_eq!(bits_of(&t), "110");
    }

    #[test]
    fn wide_integers_sign_extend() {
        let t = Term::bitstring_from_segments(&[Segment::integer(-1).size(70)]).unwrap();
        assert_eq!(bits_of(&t), "1".repeat(70).as_str());
        let t = Term::bitstring_from_segments(&[Segment::integer(5).size(2).unit(40)]).unwrap();
        assert_eq!(bits_of(&t), format!("{}101", "0".repeat(77)).as_str());
    }

    #[test]
    fn oversized_integer_width_is_rejected() {
        let err = Term::bitstring_from_segments(&[Segment::integer(1).size(u64::MAX)]).unwrap_err();
        assert!(matches!(
            err,
            TermError::InvalidSegmentWidth { index: 1, kind: "integer", bits: u64::MAX }
        ));
        let err = Term::bitstring_from_segments(&[
            Segment::integer(1),
            Segment::integer(1).size(MAX_SEGMENT_BITS).unit(2),
        ])
        .unwrap_err();
        assert!(matches!(err, TermError::InvalidSegmentWidth { index: 2, .. }));
    }

    #[test]
    fn size_times_unit() {
        let t = Term::bitstring_from_segments(&[Segment::integer(1).size(2).unit(4)]).unwrap();
        assert_eq!(bits_of(&t), "00000001");
    }

    #[test]
    fn length_is_not_padded() {
        let t = Term::bitstring_from_segments(&[
            Segment::integer(5).size(3),
            Segment::integer(1).size(2),
        ])
        .unwrap();
        let bits = t.unpack_bitstring().unwrap();
        assert_eq!(bits.len(), 5);
        assert_eq!(bits.to_bit_string(), "10101");
        assert_eq!(bits.as_bytes(), &[0b1010_1000]);
        assert!(!t.is_binary());
    }

    #[test]
    fn bitstring_segment_is_verbatim() {
        let _ = env_logger::builder().is_test(true).try_init();
        let inner = Term::bitstring_from_segments(&[Segment::integer(3).size(3)]).unwrap();
        let t = Term::bitstring_from_segments(&[
            Segment::integer(1).size(1),
            Segment::bitstring(inner.clone()),
            Segment::bitstring(inner),
        ])
        .unwrap();
        assert_eq!(bits_of(&t), "1011011");
    }

    #[test]
    fn unaligned_append_of_bytes() {
        let t = Term::bitstring_from_segments(&[
            Segment::integer(1).size(1),
            Segment::string("A"),
        ])
        .unwrap();
        assert_eq!(bits_of(&t), "101000001");
    }

    #[test]
    fn empty_segment_list_is_empty() {
        let t = Term::bitstring_from_segments(&[]).unwrap();
        assert!(t.unpack_bitstring().unwrap().is_empty());
        let base = Term::bitstring_from_segments(&[Segment::integer(7).size(3)]).unwrap();
        let again = Term::bitstring_from_segments(&[Segment::bitstring(base.clone())]).unwrap();
        assert_eq!(base, again);
    }

    #[test]
    fn float_segments() {
        let t = Term::bitstring_from_segments(&[Segment::float(1.0)]).unwrap();
        assert_eq!(
            t.unpack_bitstring().unwrap().as_bytes(),
            &1.0f64.to_bits().to_be_bytes()
        );
        let t = Term::bitstring_from_segments(&[Segment::float(1.5).size(32)]).unwrap();
        assert_eq!(t.unpack_bitstring().unwrap().as_bytes(), &[0x3f, 0xc0, 0, 0]);
        let err = Term::bitstring_from_segments(&[Segment::float(1.5).size(12)]).unwrap_err();
        assert!(matches!(err, TermError::InvalidSegmentWidth { index: 1, bits: 12, .. }));
    }

    #[test]
    fn type_mismatch_reports_position() {
        let err = Term::bitstring_from_segments(&[Segment::integer(Term::string("abc"))]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "construction of binary failed: segment 1 of type 'integer': expected an integer but got: \"abc\""
        );
        let err = Term::bitstring_from_segments(&[
            Segment::integer(1),
            Segment::integer(123.45),
        ])
        .unwrap_err();
        assert!(matches!(err, TermError::TypeMismatch { index: 2, article: "an", .. }));
        let err = Term::bitstring_from_segments(&[Segment::bitstring(1)]).unwrap_err();
        assert!(matches!(err, TermError::TypeMismatch { article: "a", kind: "bitstring", .. }));
    }

    #[test]
    fn validation_precedes_building() {
        let err = Term::bitstring_from_segments(&[
            Segment::integer(1),
            Segment::string(Term::atom("x")),
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn bits_from_iterator() {
        let bits: BitString = [true, false, true].into_iter().collect();
        assert_eq!(bits.len(), 3);
        assert_eq!(bits.bit(0), Some(true));
        assert_eq!(bits.bit(1), Some(false));
        assert_eq!(bits.bit(3), None);
        assert!(bits.to_text().is_err());
    }

    #[test]
    fn invalid_utf8_is_reported() {
        let bits = BitString::from_bytes(&[0xff, 0xfe]);
        assert_eq!(bits.to_text().unwrap_err(), TermError::InvalidUtf8);
    }

    #[test]
    fn articles() {
        assert_eq!(indefinite_article("integer"), "an");
        assert_eq!(indefinite_article("float"), "a");
        assert_eq!(indefinite_article("atom"), "an");
    }
}
