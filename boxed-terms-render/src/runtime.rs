//! Defines [`Runtime`], the client-side mount of a page.
//!
//! The runtime owns everything a mounted page needs between passes: the
//! module registry, component state, the patcher over the live container
//! and the dispatcher fired events are routed to.  Application state only
//! changes through [`Runtime::mount_page`] and [`Runtime::update_state`],
//! and only once the pass they trigger has succeeded.

use crate::{
    ComponentStore, Dispatcher, Document, HostEvent, ModuleId, NodeId, PatchStats, Patcher,
    Registry, RenderError, dispatch_event,
};
use boxed_terms::Term;

pub struct Runtime<D, P> {
    registry: Registry,
    store: ComponentStore,
    patcher: Patcher<D>,
    dispatcher: P,
    page: Option<ModuleId>,
    state: Term,
}

impl<D: Document, P: Dispatcher> Runtime<D, P> {
    pub fn new(registry: Registry, document: D, container: NodeId, dispatcher: P) -> Self {
        Self {
            registry,
            store: ComponentStore::new(),
            patcher: Patcher::new(document, container),
            dispatcher,
            page: None,
            state: Term::nil(),
        }
    }

    /// Renders `page` into the container and makes it the mounted page.
    pub fn mount_page(&mut self, page: ModuleId, state: Term) -> Result<PatchStats, RenderError> {
        log::debug!("mounting page {page}");
        let stats = self.patcher.render(&self.registry, &mut self.store, &page, &state)?;
        self.page = Some(page);
        self.state = state;
        Ok(stats)
    }

    /// Re-renders the mounted page with new application state.
    pub fn update_state(&mut self, state: Term) -> Result<PatchStats, RenderError> {
        let page = self.page.as_ref().ok_or(RenderError::NoPage)?;
        let stats = self.patcher.render(&self.registry, &mut self.store, page, &state)?;
        self.state = state;
        Ok(stats)
    }

    /// Re-renders the mounted page with its current state, e.g. after
    /// component state changed.
    pub fn rerender(&mut self) -> Result<PatchStats, RenderError> {
        let page = self.page.as_ref().ok_or(RenderError::NoPage)?;
        self.patcher
            .render(&self.registry, &mut self.store, page, &self.state)
    }

    /// Forgets the patcher's record of the container; the next pass
    /// snapshots it again.  Page, state and component state are kept.
    pub fn reset(&mut self) {
        self.patcher.reset();
    }

    /// Routes a host event to the nearest binding inside the container.
    /// Returns whether an operation was dispatched.
    pub fn dispatch_event(&mut self, event: &mut HostEvent) -> Result<bool, RenderError> {
        if self.page.is_none() {
            return Err(RenderError::NoPage);
        }
        Ok(dispatch_event(
            self.patcher.document(),
            self.patcher.container(),
            event,
            &mut self.dispatcher,
        )?)
    }

    #[inline]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[inline]
    pub fn store(&self) -> &ComponentStore {
        &self.store
    }

    /// Mutable component state.  Call [`Runtime::rerender`] to show the
    /// changes.
    #[inline]
    pub fn store_mut(&mut self) -> &mut ComponentStore {
        &mut self.store
    }

    #[inline]
    pub fn page(&self) -> Option<&ModuleId> {
        self.page.as_ref()
    }

    #[inline]
    pub fn state(&self) -> &Term {
        &self.state
    }

    #[inline]
    pub fn document(&self) -> &D {
        self.patcher.document()
    }

    #[inline]
    pub fn container(&self) -> NodeId {
        self.patcher.container()
    }

    #[inline]
    pub fn dispatcher(&self) -> &P {
        &self.dispatcher
    }

    #[inline]
    pub fn dispatcher_mut(&mut self) -> &mut P {
        &mut self.dispatcher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Attribute, EventKind, Expression, MemoryDocument, Module, Node, OperationDescriptor,
    };
    use boxed_terms::{TermError, atom, map};

    fn counter_registry() -> Registry {
        Registry::new()
            .with(
                "Counter",
                Module::new(|| {
                    Node::element(
                        "div",
                        vec![],
                        vec![
                            Node::element(
                                "span",
                                vec![Attribute::literal("id", "value")],
                                vec![Node::Expression(Expression::var("count"))],
                            ),
                            Node::element(
                                "button",
                                vec![
                                    Attribute::literal("id", "inc"),
                                    Attribute::literal("on_click", "increment"),
                                ],
                                vec![Node::text("+")],
                            ),
                        ],
                    )
                })
                .with_layout("Layout"),
            )
            .with(
                "Layout",
                Module::new(|| Node::element("main", vec![], vec![Node::slot()])),
            )
    }

    fn runtime() -> Runtime<MemoryDocument, Vec<OperationDescriptor>> {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut document = MemoryDocument::new();
        let root = document.root();
        let container = document.create_element("div");
        document.insert_before(root, container, None).unwrap();
        Runtime::new(counter_registry(), document, container, Vec::new())
    }

    #[test]
    fn click_dispatches_one_operation() {
        let mut rt = runtime();
        let state = map! { atom!("count") => 1 };
        rt.mount_page("Counter".into(), state.clone()).unwrap();
        let html = rt.document().inner_html(rt.container()).unwrap();
        assert_eq!(
            html,
            "<main><div><span id=\"value\">1</span><button id=\"inc\">+</button></div></main>"
        );
        assert!(!html.contains("on_click"));

        let button = rt.document().find_by_attribute("id", "inc").unwrap();
        let label = rt.document().children(button).unwrap()[0];
        let mut event = HostEvent::click(label);
        assert!(rt.dispatch_event(&mut event).unwrap());
        assert!(event.default_prevented());

        let ops = rt.dispatcher();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].event_name, "click");
        assert_eq!(ops[0].action, atom!("increment"));
        assert_eq!(ops[0].scope, ModuleId::new("Counter"));
        assert_eq!(ops[0].state, state);

        let mut submit = HostEvent::new(EventKind::Submit, label);
        assert!(!rt.dispatch_event(&mut submit).unwrap());
        assert_eq!(rt.dispatcher().len(), 1);
    }

    #[test]
    fn state_updates_patch_only_what_changed() {
        let mut rt = runtime();
        rt.mount_page("Counter".into(), map! { atom!("count") => 1 })
            .unwrap();
        let span = rt.document().find_by_attribute("id", "value").unwrap();

        let stats = rt.update_state(map! { atom!("count") => 2 }).unwrap();
        // The text changes and the button binding captures the new state.
        assert_eq!(stats.texts_updated, 1);
        assert_eq!(stats.listeners_changed, 1);
        assert_eq!(stats.created + stats.removed + stats.moved, 0);
        assert_eq!(rt.document().find_by_attribute("id", "value"), Some(span));
        assert_eq!(rt.state(), &map! { atom!("count") => 2 });

        assert!(rt.rerender().unwrap().is_empty());
    }

    #[test]
    fn nan_in_state_does_not_rebind_listeners() {
        let mut rt = runtime();
        let state = map! { atom!("count") => 1, atom!("ratio") => f64::NAN };
        rt.mount_page("Counter".into(), state.clone()).unwrap();
        let stats = rt.rerender().unwrap();
        assert!(stats.is_empty(), "{stats}");
        let stats = rt.update_state(state).unwrap();
        assert_eq!(stats.listeners_changed, 0);
        assert!(stats.is_empty());
    }

    #[test]
    fn failed_update_keeps_previous_state() {
        let mut rt = runtime();
        let state = map! { atom!("count") => 1 };
        rt.mount_page("Counter".into(), state.clone()).unwrap();
        let err = rt.update_state(map! { atom!("count") => map! { 1 => 2 } });
        assert!(matches!(
            err,
            Err(RenderError::Term(TermError::UnsupportedVariant { .. }))
        ));
        assert_eq!(rt.state(), &state);
        assert!(rt.rerender().unwrap().is_empty());
    }

    #[test]
    fn requires_a_mounted_page() {
        let mut rt = runtime();
        assert_eq!(rt.update_state(Term::nil()), Err(RenderError::NoPage));
        assert_eq!(rt.rerender(), Err(RenderError::NoPage));
        let container = rt.container();
        let mut event = HostEvent::click(container);
        assert_eq!(rt.dispatch_event(&mut event), Err(RenderError::NoPage));
        assert_eq!(
            rt.mount_page("Missing".into(), Term::nil()),
            Err(RenderError::UnknownModule("Missing".into()))
        );
        assert!(rt.page().is_none());
    }

    #[test]
    fn reset_rebinds_existing_markup() {
        let mut rt = runtime();
        let state = map! { atom!("count") => 1 };
        rt.mount_page("Counter".into(), state).unwrap();
        rt.reset();
        let stats = rt.rerender().unwrap();
        assert_eq!(stats.created, 0);
        assert_eq!(stats.listeners_changed, 0);
    }
}
