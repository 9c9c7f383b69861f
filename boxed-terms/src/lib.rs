//! # Boxed Terms
//!
//! An immutable, tagged value model for the data of a dynamically typed
//! source language: atoms, arbitrary-precision integers, floats,
//! bit-exact bitstrings, strings, lists, tuples, structurally keyed maps
//! and the match-only cons and variable patterns.
//!
//! The primary entry point is [`Term`].  Terms are cheap to clone and are
//! never mutated after construction; operations that "modify" a term
//! return a new one.  Terms can be matched using the [`Term::view`]
//! method which yields a borrowed [`View`].  Map entries are addressed by
//! the canonical key produced by [`encode_map_key`], so structurally
//! equal keys always share a slot regardless of insertion order.  Binary
//! data is built from typed segments with
//! [`Term::bitstring_from_segments`].
//!
//! ## Example
//! ```rust
//! # use boxed_terms::{Segment, Term, View, atom, list, map, tuple};
//! // build some primitive terms
//! let ok = atom!("ok");
//! let pi = Term::float(3.14);
//!
//! // binaries are built bit-exactly from typed segments
//! let bits = Term::bitstring_from_segments(&[
//!     Segment::integer(260).size(8),
//!     Segment::integer(1).size(3),
//! ])
//! .unwrap();
//! assert_eq!(bits.unpack_bitstring().unwrap().len(), 11);
//!
//! // maps are keyed structurally
//! let a = map! { atom!("x") => 1, atom!("y") => 2 };
//! let b = map! { atom!("y") => 2, atom!("x") => 1 };
//! assert_eq!(a.map_key(), b.map_key());
//!
//! // inspect the resulting term
//! let term = tuple!(ok, list![pi, "text"], a);
//! if let View::Tuple(items) = term.view() {
//!     assert_eq!(items.len(), 3);
//!     assert_eq!(items[1].unpack_list().unwrap().len(), 2);
//! }
//! assert_eq!(term.display().to_string(), r#"{:ok, [3.14, "text"], %{x: 1, y: 2}}"#);
//! ```
//!
//! ## License
//!
//! Released under the terms of the GNU Lesser General Public License, version 3.0 or
//! (at your option) any later version (LGPL-3.0-or-later).

mod bitstring;
mod display;
mod error;
#[cfg(feature = "serde")]
mod json;
mod map;
mod map_key;
mod term;
mod text;
mod view;

pub use bitstring::{BitString, MAX_SEGMENT_BITS, Segment, SegmentKind, indefinite_article};
pub use display::TermDisplay;
pub use error::TermError;
#[cfg(feature = "serde")]
pub use json::BIGINT_PREFIX;
pub use map::TermMap;
pub use map_key::encode_map_key;
pub(crate) use term::Handle;
pub use term::Term;
pub use text::format_float;
pub use view::View;
