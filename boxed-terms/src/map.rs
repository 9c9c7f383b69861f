//! Defines [`TermMap`], the entry table behind map terms.
//!
//! Entries are addressed by the canonical key of their key term (see
//! [`crate::encode_map_key`]), so structurally equal keys built
//! independently land in the same slot.  Each slot keeps the original key
//! term next to the value.  Insertion order carries no meaning.

use crate::{Term, encode_map_key};
use core::fmt;
use indexmap::IndexMap;
use smartstring::alias::String;

/// An immutable map from terms to terms.
///
/// Every "modifying" operation returns a new map and leaves `self`
/// untouched.
#[derive(Clone, Default)]
pub struct TermMap {
    entries: IndexMap<String, (Term, Term)>,
}

impl TermMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a map from key/value pairs.  When two keys share a canonical
    /// key the later pair wins.
    pub fn from_entries<K: Into<Term>, V: Into<Term>>(
        entries: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &Term) -> Option<&Term> {
        self.entries.get(encode_map_key(key).as_str()).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &Term) -> bool {
        self.entries.contains_key(encode_map_key(key).as_str())
    }

    /// Returns a copy with `key` bound to `value`.
    pub fn put(&self, key: impl Into<Term>, value: impl Into<Term>) -> TermMap {
        let mut map = self.clone();
        map.insert(key.into(), value.into());
        map
    }

    /// Returns a copy without `key`.
    pub fn remove(&self, key: &Term) -> TermMap {
        let mut map = self.clone();
        map.entries.shift_remove(encode_map_key(key).as_str());
        map
    }

    /// Returns a copy holding the entries of both maps; on a shared key the
    /// value from `other` wins.
    pub fn merge(&self, other: &TermMap) -> TermMap {
        let mut map = self.clone();
        for (canonical, entry) in &other.entries {
            map.entries.insert(canonical.clone(), entry.clone());
        }
        map
    }

    /// Iterates over `(key, value)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&Term, &Term)> {
        self.entries.values().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Term> {
        self.entries.values().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Term> {
        self.entries.values().map(|(_, v)| v)
    }

    /// Entries ordered by [`Term::compare`] on their keys.
    pub fn sorted_entries(&self) -> Vec<(&Term, &Term)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| a.0.compare(b.0));
        entries
    }

    /// Entries with their canonical keys, ordered by canonical key.
    pub fn canonical_entries(&self) -> Vec<(&str, &Term, &Term)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(canonical, (k, v))| (canonical.as_str(), k, v))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }

    fn insert(&mut self, key: Term, value: Term) {
        self.entries.insert(encode_map_key(&key), (key, value));
    }
}

impl FromIterator<(Term, Term)> for TermMap {
    fn from_iter<I: IntoIterator<Item = (Term, Term)>>(iter: I) -> Self {
        let mut map = TermMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl PartialEq for TermMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.entries.iter().all(|(canonical, (_, v))| {
                other
                    .entries
                    .get(canonical)
                    .is_some_and(|(_, w)| v == w)
            })
    }
}

impl fmt::Debug for TermMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.sorted_entries()).finish()
    }
}
