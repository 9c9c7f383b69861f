//! Defines [`ComponentStore`], the state of stateful component instances.
//!
//! Instances are addressed by their `cid` prop.  Like map entries, ids are
//! compared by canonical key, so `"a"` and `:a` are different instances.

use boxed_terms::Term;
use indexmap::IndexMap;
use smartstring::alias::String;

#[derive(Clone, Debug, Default)]
pub struct ComponentStore {
    states: IndexMap<String, (Term, Term)>,
}

impl ComponentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, cid: &Term) -> Option<&Term> {
        self.states.get(cid.map_key().as_str()).map(|(_, state)| state)
    }

    /// Stores `state` for `cid`, returning the previous state.
    pub fn put(&mut self, cid: Term, state: Term) -> Option<Term> {
        self.states
            .insert(cid.map_key(), (cid, state))
            .map(|(_, previous)| previous)
    }

    pub fn remove(&mut self, cid: &Term) -> Option<Term> {
        self.states
            .shift_remove(cid.map_key().as_str())
            .map(|(_, state)| state)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn clear(&mut self) {
        self.states.clear();
    }

    /// Iterates over `(cid, state)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Term, &Term)> {
        self.states.values().map(|(cid, state)| (cid, state))
    }
}
