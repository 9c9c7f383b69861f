//! Defines the core [`Term`] type and related constructors.
//!
//! Provides an immutable, cheaply clonable representation for boxed
//! values and the type predicates every consumer dispatches on.

use crate::{BitString, TermError, TermMap};
use core::fmt;
use num_bigint::BigInt;
use smartstring::alias::String;
use std::sync::Arc;

// The following type definitions describe the internal representation
// of a term.  Scalars are stored inline; compound payloads live behind
// an `Arc` so that cloning a term never copies its contents and no
// holder of a term can reach its fields mutably.

/// Internal handle describing the kind of a term and storing its data.
#[derive(Clone)]
pub(crate) enum Handle {
    Atom(String),
    Int(BigInt),
    Float(f64),
    Bits(Arc<BitString>),
    Str(Arc<str>),
    List(Arc<[Term]>),
    Tuple(Arc<[Term]>),
    Map(Arc<TermMap>),
    Cons(Arc<(Term, Term)>),
    Var(String),
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Handle::Atom(a), Handle::Atom(b)) | (Handle::Var(a), Handle::Var(b)) => a == b,
            (Handle::Int(a), Handle::Int(b)) => a == b,
            (Handle::Float(a), Handle::Float(b)) => same_float(*a, *b),
            (Handle::Bits(a), Handle::Bits(b)) => a == b,
            (Handle::Str(a), Handle::Str(b)) => a == b,
            (Handle::List(a), Handle::List(b)) | (Handle::Tuple(a), Handle::Tuple(b)) => a == b,
            (Handle::Map(a), Handle::Map(b)) => a == b,
            (Handle::Cons(a), Handle::Cons(b)) => a == b,
            _ => false,
        }
    }
}

/// Floats are equal when their canonical keys are: `0.0` and `-0.0`
/// differ, and every NaN equals every other NaN.
#[inline]
fn same_float(a: f64, b: f64) -> bool {
    a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan())
}

/// An immutable boxed value.
///
/// Internally a `Term` stores a single [`Handle`] enum variant which is
/// never exposed; inspect terms through [`Term::view`] or the `is_*` and
/// `unpack_*` methods.  "Modifying" a term always produces a new one.
/// Cloning is cheap: compound payloads are shared.
///
/// Equality is structural and agrees with [`Term::map_key`].  Maps compare
/// by their canonical keys, so two maps built from the same entries in a
/// different order are equal.
#[derive(Clone, PartialEq)]
pub struct Term(pub(crate) Handle);

impl AsRef<Term> for Term {
    fn as_ref(&self) -> &Self {
        self
    }
}

macro_rules! impl_from_integers_for_term {
    ($($t:ty),* $(,)?) => {$(
        impl From<$t> for Term {
            #[inline]
            fn from(v: $t) -> Self { Term::integer(v) }
        }
    )*};
}
impl_from_integers_for_term!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize
);

macro_rules! impl_from_floats_for_term {
    ($($t:ty),* $(,)?) => {$(
        impl From<$t> for Term {
            #[inline]
            fn from(v: $t) -> Self { Term::float(v as f64) }
        }
    )*};
}
impl_from_floats_for_term!(f32, f64);

impl From<bool> for Term {
    #[inline]
    fn from(v: bool) -> Self {
        Term::boolean(v)
    }
}

impl From<BigInt> for Term {
    #[inline]
    fn from(v: BigInt) -> Self {
        Term(Handle::Int(v))
    }
}

impl<'a> From<&'a str> for Term {
    #[inline]
    fn from(v: &'a str) -> Self {
        Term::string(v)
    }
}

impl From<String> for Term {
    #[inline]
    fn from(v: String) -> Self {
        Term::string(v)
    }
}

impl From<std::string::String> for Term {
    #[inline]
    fn from(v: std::string::String) -> Self {
        Term::string(v)
    }
}

impl From<BitString> for Term {
    #[inline]
    fn from(v: BitString) -> Self {
        Term::bitstring(v)
    }
}

impl From<TermMap> for Term {
    #[inline]
    fn from(v: TermMap) -> Self {
        Term(Handle::Map(Arc::new(v)))
    }
}

impl From<Vec<Term>> for Term {
    #[inline]
    fn from(v: Vec<Term>) -> Self {
        Term(Handle::List(v.into()))
    }
}

impl<'a> From<&'a Term> for Term {
    #[inline]
    fn from(v: &'a Term) -> Self {
        v.clone()
    }
}

impl Term {
    /// Construct an atom.
    #[inline]
    pub fn atom(name: impl AsRef<str>) -> Self {
        Self(Handle::Atom(String::from(name.as_ref())))
    }

    /// Construct a boolean.  Booleans are atoms named `true` and `false`.
    #[inline]
    pub fn boolean(value: bool) -> Self {
        Self::atom(if value { "true" } else { "false" })
    }

    /// Construct the `nil` atom.
    #[inline]
    pub fn nil() -> Self {
        Self::atom("nil")
    }

    /// Construct an arbitrary-precision integer.
    #[inline]
    pub fn integer(value: impl Into<BigInt>) -> Self {
        Self(Handle::Int(value.into()))
    }

    /// Construct a 64 bit floating point number.
    #[inline]
    pub fn float(value: impl Into<f64>) -> Self {
        Self(Handle::Float(value.into()))
    }

    /// Construct a text string.
    #[inline]
    pub fn string(value: impl AsRef<str>) -> Self {
        Self(Handle::Str(Arc::from(value.as_ref())))
    }

    /// Wrap an already built [`BitString`].  Use
    /// [`Term::bitstring_from_segments`] to build one from typed segments.
    #[inline]
    pub fn bitstring(bits: BitString) -> Self {
        Self(Handle::Bits(Arc::new(bits)))
    }

    /// Construct a list.
    #[inline]
    pub fn list(items: impl IntoIterator<Item = impl Into<Term>>) -> Self {
        Self(Handle::List(items.into_iter().map(Into::into).collect()))
    }

    /// Construct a tuple.  Its arity is fixed at construction.
    #[inline]
    pub fn tuple(items: impl IntoIterator<Item = impl Into<Term>>) -> Self {
        Self(Handle::Tuple(items.into_iter().map(Into::into).collect()))
    }

    /// Construct a map from key/value pairs.  Keys that encode to the same
    /// canonical key address the same slot; a later entry silently replaces
    /// an earlier one.
    #[inline]
    pub fn map<K: Into<Term>, V: Into<Term>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Self::from(TermMap::from_entries(entries))
    }

    /// Construct a `[head | tail]` match pattern.
    #[inline]
    pub fn cons_pattern(head: impl Into<Term>, tail: impl Into<Term>) -> Self {
        Self(Handle::Cons(Arc::new((head.into(), tail.into()))))
    }

    /// Construct a variable match pattern.
    #[inline]
    pub fn variable_pattern(name: impl AsRef<str>) -> Self {
        Self(Handle::Var(String::from(name.as_ref())))
    }

    /// Returns the name if the term is an atom, otherwise an error.
    #[inline]
    pub fn unpack_atom(&self) -> Result<&str, TermError> {
        match &self.0 {
            Handle::Atom(name) => Ok(name),
            _ => Err(self.unexpected("atom")),
        }
    }

    /// Returns the value if the term is an integer, otherwise an error.
    #[inline]
    pub fn unpack_integer(&self) -> Result<&BigInt, TermError> {
        match &self.0 {
            Handle::Int(i) => Ok(i),
            _ => Err(self.unexpected("integer")),
        }
    }

    /// Returns the value if the term is a float, otherwise an error.
    #[inline]
    pub fn unpack_float(&self) -> Result<f64, TermError> {
        match &self.0 {
            Handle::Float(f) => Ok(*f),
            _ => Err(self.unexpected("float")),
        }
    }

    /// Returns the text if the term is a string, otherwise an error.
    #[inline]
    pub fn unpack_string(&self) -> Result<&str, TermError> {
        match &self.0 {
            Handle::Str(s) => Ok(s),
            _ => Err(self.unexpected("string")),
        }
    }

    /// Returns the bits if the term is a bitstring, otherwise an error.
    #[inline]
    pub fn unpack_bitstring(&self) -> Result<&BitString, TermError> {
        match &self.0 {
            Handle::Bits(b) => Ok(b),
            _ => Err(self.unexpected("bitstring")),
        }
    }

    /// Returns the elements if the term is a list, otherwise an error.
    #[inline]
    pub fn unpack_list(&self) -> Result<&[Term], TermError> {
        match &self.0 {
            Handle::List(items) => Ok(items),
            _ => Err(self.unexpected("list")),
        }
    }

    /// Returns the elements if the term is a tuple of any arity,
    /// otherwise an error.
    #[inline]
    pub fn unpack_tuple_any(&self) -> Result<&[Term], TermError> {
        match &self.0 {
            Handle::Tuple(items) => Ok(items),
            _ => Err(self.unexpected("tuple")),
        }
    }

    /// Returns the elements if the term is a tuple of arity `ARITY`,
    /// otherwise an error.
    pub fn unpack_tuple<const ARITY: usize>(&self) -> Result<[Term; ARITY], TermError> {
        let items = self.unpack_tuple_any()?;
        <[Term; ARITY]>::try_from(items.to_vec()).map_err(|_| TermError::UnexpectedArity {
            expected: ARITY,
            found: items.len(),
        })
    }

    /// Returns the entries if the term is a map, otherwise an error.
    #[inline]
    pub fn unpack_map(&self) -> Result<&TermMap, TermError> {
        match &self.0 {
            Handle::Map(m) => Ok(m),
            _ => Err(self.unexpected("map")),
        }
    }

    /// Returns head and tail if the term is a cons pattern, otherwise an error.
    #[inline]
    pub fn unpack_cons_pattern(&self) -> Result<(&Term, &Term), TermError> {
        match &self.0 {
            Handle::Cons(pair) => Ok((&pair.0, &pair.1)),
            _ => Err(self.unexpected("cons_pattern")),
        }
    }

    /// Returns the name if the term is a variable pattern, otherwise an error.
    #[inline]
    pub fn unpack_variable_pattern(&self) -> Result<&str, TermError> {
        match &self.0 {
            Handle::Var(name) => Ok(name),
            _ => Err(self.unexpected("variable_pattern")),
        }
    }

    /// Looks up `key` in a map term.
    #[inline]
    pub fn get(&self, key: &Term) -> Result<Option<&Term>, TermError> {
        Ok(self.unpack_map()?.get(key))
    }

    /// Returns a new map term with `key` bound to `value`.  The receiver
    /// is left untouched.
    pub fn put(&self, key: impl Into<Term>, value: impl Into<Term>) -> Result<Term, TermError> {
        Ok(Term::from(self.unpack_map()?.put(key, value)))
    }

    #[inline]
    fn unexpected(&self, expected: &'static str) -> TermError {
        TermError::UnexpectedKind {
            expected,
            found: self.kind_name(),
        }
    }

    /// Returns `true` if the term is an atom (booleans and `nil` included).
    #[inline]
    pub fn is_atom(&self) -> bool {
        matches!(self.0, Handle::Atom(_))
    }

    /// Returns `true` if the term is the atom `true` or `false`.
    #[inline]
    pub fn is_boolean(&self) -> bool {
        self.is_true() || self.is_false()
    }

    /// Returns `true` if the term is the atom `true`.
    #[inline]
    pub fn is_true(&self) -> bool {
        matches!(&self.0, Handle::Atom(name) if name == "true")
    }

    /// Returns `true` if the term is the atom `false`.
    #[inline]
    pub fn is_false(&self) -> bool {
        matches!(&self.0, Handle::Atom(name) if name == "false")
    }

    /// Returns `true` if the term is the atom `nil`.
    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(&self.0, Handle::Atom(name) if name == "nil")
    }

    /// Returns `false` for `nil` and `false`, `true` for everything else.
    #[inline]
    pub fn is_truthy(&self) -> bool {
        !(self.is_nil() || self.is_false())
    }

    #[inline]
    pub fn is_integer(&self) -> bool {
        matches!(self.0, Handle::Int(_))
    }

    #[inline]
    pub fn is_float(&self) -> bool {
        matches!(self.0, Handle::Float(_))
    }

    /// Returns `true` if the term is an integer or a float.
    #[inline]
    pub fn is_number(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    #[inline]
    pub fn is_bitstring(&self) -> bool {
        matches!(self.0, Handle::Bits(_))
    }

    /// Returns `true` if the term is a bitstring whose length is a whole
    /// number of bytes.
    #[inline]
    pub fn is_binary(&self) -> bool {
        matches!(&self.0, Handle::Bits(b) if b.is_binary())
    }

    #[inline]
    pub fn is_string(&self) -> bool {
        matches!(self.0, Handle::Str(_))
    }

    #[inline]
    pub fn is_list(&self) -> bool {
        matches!(self.0, Handle::List(_))
    }

    #[inline]
    pub fn is_tuple(&self) -> bool {
        matches!(self.0, Handle::Tuple(_))
    }

    #[inline]
    pub fn is_map(&self) -> bool {
        matches!(self.0, Handle::Map(_))
    }

    #[inline]
    pub fn is_cons_pattern(&self) -> bool {
        matches!(self.0, Handle::Cons(_))
    }

    #[inline]
    pub fn is_variable_pattern(&self) -> bool {
        matches!(self.0, Handle::Var(_))
    }

    /// Returns `true` for the match-only variants.
    #[inline]
    pub fn is_pattern(&self) -> bool {
        self.is_cons_pattern() || self.is_variable_pattern()
    }

    /// Returns a string describing the kind of this term.  This is also the
    /// type tag used by canonical map keys and serialized state.
    #[inline]
    pub fn kind_name(&self) -> &'static str {
        match &self.0 {
            Handle::Atom(_) => "atom",
            Handle::Int(_) => "integer",
            Handle::Float(_) => "float",
            Handle::Bits(_) => "bitstring",
            Handle::Str(_) => "string",
            Handle::List(_) => "list",
            Handle::Tuple(_) => "tuple",
            Handle::Map(_) => "map",
            Handle::Cons(_) => "cons_pattern",
            Handle::Var(_) => "variable_pattern",
        }
    }
}

/// Prints a developer-friendly representation of the term.  The output is
/// not stable and should not be parsed; use [`Term::display`] for the
/// source-language inspection format.
impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Handle::Atom(a) => f.debug_tuple("Atom").field(&a.as_str()).finish(),
            Handle::Int(i) => f.debug_tuple("Integer").field(i).finish(),
            Handle::Float(x) => f.debug_tuple("Float").field(x).finish(),
            Handle::Bits(b) => f.debug_tuple("Bitstring").field(b).finish(),
            Handle::Str(s) => f.debug_tuple("String").field(s).finish(),
            Handle::List(items) => f.debug_tuple("List").field(items).finish(),
            Handle::Tuple(items) => f.debug_tuple("Tuple").field(items).finish(),
            Handle::Map(m) => f.debug_tuple("Map").field(m).finish(),
            Handle::Cons(pair) => f
                .debug_struct("ConsPattern")
                .field("head", &pair.0)
                .field("tail", &pair.1)
                .finish(),
            Handle::Var(name) => f
                .debug_struct("VariablePattern")
                .field("name", &name.as_str())
                .finish(),
        }
    }
}

/// Convenience macros to construct lists, tuples, maps and atoms.
/// Arguments are converted with [`From`], so `"x"` becomes a string term.
#[macro_export]
macro_rules! list {
    ($($arg:expr),* $(,)?) => {{
        let __items: ::std::vec::Vec<$crate::Term> = ::std::vec![$($crate::Term::from($arg)),*];
        $crate::Term::list(__items)
    }};
}

#[macro_export]
macro_rules! tuple {
    ($($arg:expr),* $(,)?) => {{
        let __items: ::std::vec::Vec<$crate::Term> = ::std::vec![$($crate::Term::from($arg)),*];
        $crate::Term::tuple(__items)
    }};
}

#[macro_export]
macro_rules! map {
    ($($key:expr => $value:expr),* $(,)?) => {{
        let __entries: ::std::vec::Vec<($crate::Term, $crate::Term)> =
            ::std::vec![$(($crate::Term::from($key), $crate::Term::from($value))),*];
        $crate::Term::map(__entries)
    }};
}

#[macro_export]
macro_rules! atom {
    ($name:expr) => {
        $crate::Term::atom($name)
    };
}
