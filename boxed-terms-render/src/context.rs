//! Defines [`RenderContext`], the immutable per-scope state of a render pass.
//!
//! Entering a component never mutates the caller's context; the `with_*`
//! methods return a modified copy, so a child scope cannot leak into its
//! parent.

use crate::{ModuleId, Node};
use boxed_terms::Term;
use indexmap::IndexMap;
use smartstring::alias::String;
use std::rc::Rc;

/// Name of the slot that receives a component's children.
pub const DEFAULT_SLOT: &str = "default";

/// Template nodes supplied to a slot, together with the variables and the
/// slots in effect where they were written.
#[derive(Clone, Debug)]
pub struct SlotContent {
    nodes: Rc<[Node]>,
    vars: Term,
    slots: Slots,
}

impl SlotContent {
    /// Captures `nodes` as declared under `context`.
    pub fn new(nodes: impl Into<Rc<[Node]>>, context: &RenderContext) -> Self {
        Self {
            nodes: nodes.into(),
            vars: context.vars.clone(),
            slots: context.slots.clone(),
        }
    }

    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[inline]
    pub fn vars(&self) -> &Term {
        &self.vars
    }

    #[inline]
    pub fn slots(&self) -> &Slots {
        &self.slots
    }
}

/// Slot name to slot content.  Cloning is cheap.
#[derive(Clone, Debug, Default)]
pub struct Slots(Rc<IndexMap<String, SlotContent>>);

impl Slots {
    /// Slots holding only the default slot.
    pub fn with_default(content: SlotContent) -> Self {
        let mut slots = IndexMap::new();
        slots.insert(String::from(DEFAULT_SLOT), content);
        Self(Rc::new(slots))
    }

    pub fn get(&self, name: &str) -> Option<&SlotContent> {
        self.0.get(name)
    }

    pub fn default_slot(&self) -> Option<&SlotContent> {
        self.get(DEFAULT_SLOT)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The context a template node is rendered under.
#[derive(Clone, Debug)]
pub struct RenderContext {
    page: ModuleId,
    scope: ModuleId,
    slots: Slots,
    state: Term,
    vars: Term,
}

impl RenderContext {
    /// The root context of a page: the page is its own scope and its
    /// variables are the application state.
    pub fn for_page(page: ModuleId, state: Term) -> Self {
        Self {
            scope: page.clone(),
            page,
            slots: Slots::default(),
            vars: state.clone(),
            state,
        }
    }

    #[inline]
    pub fn page(&self) -> &ModuleId {
        &self.page
    }

    /// The module event handlers declared here are dispatched against.
    #[inline]
    pub fn scope(&self) -> &ModuleId {
        &self.scope
    }

    #[inline]
    pub fn slots(&self) -> &Slots {
        &self.slots
    }

    /// Application state of this render pass.
    #[inline]
    pub fn state(&self) -> &Term {
        &self.state
    }

    /// Variables expressions are evaluated against.
    #[inline]
    pub fn vars(&self) -> &Term {
        &self.vars
    }

    pub fn with_scope(&self, scope: ModuleId) -> Self {
        Self {
            scope,
            ..self.clone()
        }
    }

    pub fn with_slots(&self, slots: Slots) -> Self {
        Self {
            slots,
            ..self.clone()
        }
    }

    pub fn with_vars(&self, vars: Term) -> Self {
        Self {
            vars,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boxed_terms::{atom, map};

    #[test]
    fn page_context_scopes_to_page() {
        let state = map! { atom!("n") => 1 };
        let ctx = RenderContext::for_page("Home".into(), state.clone());
        assert_eq!(ctx.page(), &ModuleId::new("Home"));
        assert_eq!(ctx.scope(), &ModuleId::new("Home"));
        assert_eq!(ctx.vars(), &state);
        assert!(ctx.slots().is_empty());
    }

    #[test]
    fn derived_contexts_do_not_leak() {
        let parent = RenderContext::for_page("Home".into(), Term::nil());
        let child = parent
            .with_scope("Widget".into())
            .with_vars(map! { atom!("x") => 1 })
            .with_slots(Slots::with_default(SlotContent::new(
                vec![Node::text("hi")],
                &parent,
            )));
        assert_eq!(parent.scope(), &ModuleId::new("Home"));
        assert!(parent.vars().is_nil());
        assert!(parent.slots().default_slot().is_none());
        assert_eq!(child.scope(), &ModuleId::new("Widget"));
        assert_eq!(child.page(), &ModuleId::new("Home"));
        let slot = child.slots().default_slot().unwrap();
        assert_eq!(slot.nodes().len(), 1);
        assert!(slot.vars().is_nil());
    }
}
