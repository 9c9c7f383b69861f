//! Event bindings and dispatch.
//!
//! Event attributes (`on_click`, `on_submit`) never reach the host
//! attribute set.  They become [`EventBinding`]s on display nodes, which
//! the patcher attaches to live nodes.  When the document reports an
//! event, [`dispatch_event`] finds the nearest binding between the target
//! and the container, cancels the host default action and hands an
//! [`OperationDescriptor`] to the [`Dispatcher`].

use crate::{Document, DocumentError, ModuleId, NodeId};
use boxed_terms::Term;
use indexmap::IndexMap;
use smartstring::alias::String;

/// Host events the renderer binds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Click,
    Submit,
}

impl EventKind {
    pub const ALL: [EventKind; 2] = [EventKind::Click, EventKind::Submit];

    /// Maps a template attribute name to the event it declares.
    pub fn from_attribute(name: &str) -> Option<Self> {
        match name {
            "on_click" => Some(EventKind::Click),
            "on_submit" => Some(EventKind::Submit),
            _ => None,
        }
    }

    /// Host event name.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::Submit => "submit",
        }
    }

    pub fn attribute(self) -> &'static str {
        match self {
            EventKind::Click => "on_click",
            EventKind::Submit => "on_submit",
        }
    }
}

/// A resolved event handler attached to a display node.
///
/// Everything the operation needs is captured at render time, so firing the
/// binding later does not consult the renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct EventBinding {
    pub kind: EventKind,
    /// Module declaring the handler.
    pub scope: ModuleId,
    /// The handler's action, typically an atom naming it.
    pub action: Term,
    /// Variables in scope where the handler was declared.
    pub bindings: Term,
    /// Application state when the node was rendered.
    pub state: Term,
}

impl EventBinding {
    /// Builds the operation for a fired `event`.
    pub fn operation(&self, event: &HostEvent) -> OperationDescriptor {
        OperationDescriptor {
            event_name: String::from(self.kind.name()),
            scope: self.scope.clone(),
            action: self.action.clone(),
            bindings: self.bindings.clone(),
            state: self.state.clone(),
            payload: event.payload(),
        }
    }
}

/// An event reported by the live document.
#[derive(Clone, Debug)]
pub struct HostEvent {
    kind: EventKind,
    target: NodeId,
    data: IndexMap<String, String>,
    default_prevented: bool,
}

impl HostEvent {
    pub fn new(kind: EventKind, target: NodeId) -> Self {
        Self {
            kind,
            target,
            data: IndexMap::new(),
            default_prevented: false,
        }
    }

    pub fn click(target: NodeId) -> Self {
        Self::new(EventKind::Click, target)
    }

    /// A form submission carrying its field values.
    pub fn submit<'a>(target: NodeId, fields: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut event = Self::new(EventKind::Submit, target);
        event.data = fields
            .into_iter()
            .map(|(k, v)| (String::from(k), String::from(v)))
            .collect();
        event
    }

    pub fn with_data(mut self, name: &str, value: &str) -> Self {
        self.data.insert(name.into(), value.into());
        self
    }

    #[inline]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    #[inline]
    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    #[inline]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// The event data as a map of string keys to string values.
    pub fn payload(&self) -> Term {
        Term::map(
            self.data
                .iter()
                .map(|(k, v)| (Term::string(k), Term::string(v))),
        )
    }
}

/// The operation handed to the action/command dispatcher.
#[derive(Clone, Debug, PartialEq)]
pub struct OperationDescriptor {
    pub event_name: String,
    pub scope: ModuleId,
    pub action: Term,
    pub bindings: Term,
    pub state: Term,
    pub payload: Term,
}

/// Consumer of operations built from fired events.
pub trait Dispatcher {
    fn dispatch(&mut self, operation: OperationDescriptor);
}

impl Dispatcher for Vec<OperationDescriptor> {
    fn dispatch(&mut self, operation: OperationDescriptor) {
        self.push(operation);
    }
}

/// Dispatches `event` to the nearest binding for its kind on the path from
/// the target up to, but excluding, `container`.
///
/// Returns `Ok(false)` when the target lies outside the container or no
/// node on the path is bound.  The default action is prevented only when
/// a binding fires.
pub fn dispatch_event<D, P>(
    document: &D,
    container: NodeId,
    event: &mut HostEvent,
    dispatcher: &mut P,
) -> Result<bool, DocumentError>
where
    D: Document + ?Sized,
    P: Dispatcher + ?Sized,
{
    let mut path = Vec::new();
    let mut node = Some(event.target());
    while let Some(id) = node {
        if id == container {
            break;
        }
        path.push(id);
        node = document.parent(id)?;
    }
    if node != Some(container) {
        log::trace!("{} on {} is outside the container", event.kind().name(), event.target());
        return Ok(false);
    }
    for id in path {
        if let Some(binding) = document.listener(id, event.kind())? {
            event.prevent_default();
            let operation = binding.operation(event);
            log::debug!(
                "dispatching {} from {} to {}",
                operation.event_name,
                id,
                operation.scope
            );
            dispatcher.dispatch(operation);
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryDocument;
    use boxed_terms::{atom, map};
    use std::rc::Rc;

    fn bind(binding: EventBinding) -> Option<Rc<EventBinding>> {
        Some(Rc::new(binding))
    }

    fn binding(kind: EventKind, action: &str) -> EventBinding {
        EventBinding {
            kind,
            scope: "Page".into(),
            action: atom!(action),
            bindings: map! { atom!("id") => 7 },
            state: map! { atom!("count") => 1 },
        }
    }

    #[test]
    fn attribute_names() {
        assert_eq!(EventKind::from_attribute("on_click"), Some(EventKind::Click));
        assert_eq!(EventKind::from_attribute("on_submit"), Some(EventKind::Submit));
        assert_eq!(EventKind::from_attribute("onclick"), None);
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_attribute(kind.attribute()), Some(kind));
        }
    }

    #[test]
    fn payload_is_a_string_map() {
        let event = HostEvent::submit(NodeId::from_raw(0), [("name", "Ann"), ("age", "3")]);
        let payload = event.payload();
        assert_eq!(payload.get(&Term::string("name")).unwrap(), Some(&Term::string("Ann")));
        assert_eq!(payload.unpack_map().unwrap().len(), 2);
        assert!(HostEvent::click(NodeId::from_raw(0)).payload().unpack_map().unwrap().is_empty());
    }

    #[test]
    fn nearest_binding_wins() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut doc = MemoryDocument::new();
        let root = doc.root();
        let outer = doc.create_element("div");
        let button = doc.create_element("button");
        let label = doc.create_text("go");
        doc.insert_before(root, outer, None).unwrap();
        doc.insert_before(outer, button, None).unwrap();
        doc.insert_before(button, label, None).unwrap();
        doc.set_listener(outer, EventKind::Click, bind(binding(EventKind::Click, "outer")))
            .unwrap();
        doc.set_listener(button, EventKind::Click, bind(binding(EventKind::Click, "inner")))
            .unwrap();

        let mut ops = Vec::new();
        let mut event = HostEvent::click(label).with_data("x", "1");
        assert!(dispatch_event(&doc, root, &mut event, &mut ops).unwrap());
        assert!(event.default_prevented());
        assert_eq!(ops.len(), 1);
        let op = &ops[0];
        assert_eq!(op.event_name, "click");
        assert_eq!(op.action, atom!("inner"));
        assert_eq!(op.scope, ModuleId::new("Page"));
        assert_eq!(op.bindings, map! { atom!("id") => 7 });
        assert_eq!(op.state, map! { atom!("count") => 1 });
        assert_eq!(op.payload, Term::map([("x", "1")]));
    }

    #[test]
    fn unbound_kinds_and_outside_targets_are_ignored() {
        let mut doc = MemoryDocument::new();
        let root = doc.root();
        let container = doc.create_element("main");
        let inside = doc.create_element("form");
        let outside = doc.create_element("button");
        doc.insert_before(root, container, None).unwrap();
        doc.insert_before(container, inside, None).unwrap();
        doc.insert_before(root, outside, None).unwrap();
        doc.set_listener(inside, EventKind::Click, bind(binding(EventKind::Click, "a")))
            .unwrap();
        doc.set_listener(outside, EventKind::Click, bind(binding(EventKind::Click, "b")))
            .unwrap();

        let mut ops = Vec::new();
        let mut submit = HostEvent::new(EventKind::Submit, inside);
        assert!(!dispatch_event(&doc, container, &mut submit, &mut ops).unwrap());
        assert!(!submit.default_prevented());
        let mut click = HostEvent::click(outside);
        assert!(!dispatch_event(&doc, container, &mut click, &mut ops).unwrap());
        assert!(ops.is_empty());
    }
}
