//! Defines [`Registry`], the lookup table from module identifiers to
//! component implementations.
//!
//! A registry is built once at startup and handed to every render pass.
//! Modules are resolved by [`ModuleId`] value; there is no global table.

use crate::{Node, RenderError};
use boxed_terms::Term;
use core::fmt;
use indexmap::IndexMap;
use smartstring::alias::String;
use std::rc::Rc;

/// Stable identifier of a page, layout or component module.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(String);

impl ModuleId {
    pub fn new(name: &str) -> Self {
        Self(name.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModuleId({})", self.0)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// The compiled interface of a page, layout or component module.
pub trait Component {
    /// The module's template tree.
    fn template(&self) -> Node;

    /// Whether the module declares action handlers.  Event handlers inside
    /// such a module are dispatched against the module itself rather than
    /// against the enclosing scope.
    fn has_actions(&self) -> bool {
        false
    }

    /// Initial state of a stateful instance, given its props.  Returns
    /// `None` when the module has no initializer.
    fn init(&self, _props: &Term) -> Option<Term> {
        None
    }

    /// Layout a page is rendered into, if any.
    fn layout(&self) -> Option<ModuleId> {
        None
    }
}

type InitFn = dyn Fn(&Term) -> Term;

/// A [`Component`] assembled from closures.
#[derive(Clone)]
pub struct Module {
    template: Rc<dyn Fn() -> Node>,
    actions: bool,
    init: Option<Rc<InitFn>>,
    layout: Option<ModuleId>,
}

impl Module {
    pub fn new(template: impl Fn() -> Node + 'static) -> Self {
        Self {
            template: Rc::new(template),
            actions: false,
            init: None,
            layout: None,
        }
    }

    pub fn with_actions(mut self) -> Self {
        self.actions = true;
        self
    }

    pub fn with_init(mut self, init: impl Fn(&Term) -> Term + 'static) -> Self {
        self.init = Some(Rc::new(init));
        self
    }

    pub fn with_layout(mut self, layout: impl Into<ModuleId>) -> Self {
        self.layout = Some(layout.into());
        self
    }
}

impl Component for Module {
    fn template(&self) -> Node {
        (self.template)()
    }

    fn has_actions(&self) -> bool {
        self.actions
    }

    fn init(&self, props: &Term) -> Option<Term> {
        self.init.as_ref().map(|f| f(props))
    }

    fn layout(&self) -> Option<ModuleId> {
        self.layout.clone()
    }
}

/// Maps module identifiers to their implementations.
#[derive(Clone, Default)]
pub struct Registry {
    modules: IndexMap<ModuleId, Rc<dyn Component>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `component` under `id`, returning the previous entry.
    pub fn register(
        &mut self,
        id: impl Into<ModuleId>,
        component: impl Component + 'static,
    ) -> Option<Rc<dyn Component>> {
        self.modules.insert(id.into(), Rc::new(component))
    }

    /// Builder-style [`Registry::register`].
    pub fn with(mut self, id: impl Into<ModuleId>, component: impl Component + 'static) -> Self {
        self.register(id, component);
        self
    }

    pub fn get(&self, id: &ModuleId) -> Result<&Rc<dyn Component>, RenderError> {
        self.modules
            .get(id)
            .ok_or_else(|| RenderError::UnknownModule(id.clone()))
    }

    pub fn contains(&self, id: &ModuleId) -> bool {
        self.modules.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ModuleId> {
        self.modules.keys()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.modules.keys()).finish()
    }
}
