//! Defines [`Renderer`], which turns template trees into display trees.
//!
//! A template node expands to zero or more display nodes.  Fragments and
//! conditionals flatten into their parent and `Nil` nodes are dropped, so
//! the display tree handed to the patcher never contains placeholders.

use crate::{
    AttrValue, Attribute, ComponentStore, EventBinding, EventKind, ModuleId, Node, RenderContext,
    RenderError, SlotContent, Slots, VElement, VNode,
};
use boxed_terms::{Term, TermMap};
use smartstring::alias::String;
use std::rc::Rc;

/// Name of the prop that makes a component instance stateful.
pub const CID_PROP: &str = "cid";

/// Renders templates resolved through a registry.
///
/// Stateful component instances read and initialise their state in the
/// borrowed [`ComponentStore`].
pub struct Renderer<'a> {
    registry: &'a crate::Registry,
    store: &'a mut ComponentStore,
}

impl<'a> Renderer<'a> {
    pub fn new(registry: &'a crate::Registry, store: &'a mut ComponentStore) -> Self {
        Self { registry, store }
    }

    /// Renders `page` with `state` as its variables.  A page with a layout
    /// is rendered as the default slot of the layout.
    pub fn render_page(&mut self, page: &ModuleId, state: &Term) -> Result<Vec<VNode>, RenderError> {
        log::debug!("rendering page {page}");
        let module = Rc::clone(self.registry.get(page)?);
        let context = RenderContext::for_page(page.clone(), state.clone());
        let template = module.template();
        match module.layout() {
            Some(layout_id) => {
                let layout = Rc::clone(self.registry.get(&layout_id)?);
                let slots = Slots::with_default(SlotContent::new(vec![template], &context));
                let mut layout_context = context.with_slots(slots);
                if layout.has_actions() {
                    layout_context = layout_context.with_scope(layout_id.clone());
                }
                let layout_template = layout.template();
                self.render_node(&layout_template, &layout_context)
            }
            None => self.render_node(&template, &context),
        }
    }

    /// Renders a sequence, dropping `Nil` entries.
    pub fn render_nodes(&mut self, nodes: &[Node], context: &RenderContext) -> Result<Vec<VNode>, RenderError> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes.iter().filter(|n| !n.is_nil()) {
            out.extend(self.render_node(node, context)?);
        }
        Ok(out)
    }

    pub fn render_node(&mut self, node: &Node, context: &RenderContext) -> Result<Vec<VNode>, RenderError> {
        match node {
            Node::Text(content) => Ok(vec![VNode::Text(content.clone())]),
            Node::Expression(expression) => {
                let value = expression.evaluate(context.vars())?;
                Ok(vec![VNode::Text(value.to_text()?)])
            }
            Node::Element { tag, .. } if tag == "slot" => self.render_slot(context),
            Node::Element {
                tag,
                attrs,
                children,
            } => {
                let mut element = VElement::new(tag);
                for attr in attrs {
                    match EventKind::from_attribute(&attr.name) {
                        Some(kind) => {
                            let binding = self.event_binding(kind, &attr.value, context)?;
                            element.events.insert(kind, Rc::new(binding));
                        }
                        None => {
                            let value = self.attribute_value(&attr.value, context)?;
                            element.attrs.insert(attr.name.clone(), value);
                        }
                    }
                }
                element.children = self.render_nodes(children, context)?;
                Ok(vec![VNode::Element(element)])
            }
            Node::Component {
                module,
                props,
                children,
            } => self.render_component(module, props, children, context),
            Node::Nil => Ok(Vec::new()),
            Node::Fragment(nodes) => self.render_nodes(nodes, context),
            Node::Conditional {
                condition,
                then,
                otherwise,
            } => {
                if condition.evaluate(context.vars())?.is_truthy() {
                    self.render_nodes(then, context)
                } else {
                    self.render_nodes(otherwise, context)
                }
            }
        }
    }

    /// Slot content is rendered in the current scope, with the variables
    /// and slots of the place it was written.
    fn render_slot(&mut self, context: &RenderContext) -> Result<Vec<VNode>, RenderError> {
        let Some(content) = context.slots().default_slot() else {
            log::trace!("empty default slot in {}", context.scope());
            return Ok(Vec::new());
        };
        let slot_context = context
            .with_vars(content.vars().clone())
            .with_slots(content.slots().clone());
        self.render_nodes(content.nodes(), &slot_context)
    }

    fn render_component(
        &mut self,
        id: &ModuleId,
        props: &[Attribute],
        children: &[Node],
        context: &RenderContext,
    ) -> Result<Vec<VNode>, RenderError> {
        let module = Rc::clone(self.registry.get(id)?);
        let props = self.props(props, context)?;
        let vars = match props.get(&Term::atom(CID_PROP))? {
            Some(cid) => {
                let state = match self.store.get(cid) {
                    Some(state) => state.clone(),
                    None => {
                        let state = module
                            .init(&props)
                            .ok_or_else(|| RenderError::MissingHandler { module: id.clone() })?;
                        log::trace!("initialised {id} instance {}", cid.display());
                        self.store.put(cid.clone(), state.clone());
                        state
                    }
                };
                Term::from(props.unpack_map()?.merge(state.unpack_map()?))
            }
            None => props,
        };

        let mut child_context = context
            .with_slots(Slots::with_default(SlotContent::new(children.to_vec(), context)))
            .with_vars(vars);
        if module.has_actions() {
            child_context = child_context.with_scope(id.clone());
        }
        log::trace!("rendering component {id} in scope {}", child_context.scope());
        let template = module.template();
        self.render_node(&template, &child_context)
    }

    /// Evaluates component props into an atom-keyed map.  Props keep their
    /// term values; only host attributes are converted to text.
    fn props(&self, props: &[Attribute], context: &RenderContext) -> Result<Term, RenderError> {
        let mut entries = Vec::with_capacity(props.len());
        for prop in props {
            let value = match &prop.value {
                AttrValue::Literal(text) => Term::string(text),
                AttrValue::Expression(expression) => expression.evaluate(context.vars())?,
                AttrValue::Empty => Term::boolean(true),
            };
            entries.push((Term::atom(&prop.name), value));
        }
        Ok(Term::from(TermMap::from_entries(entries)))
    }

    fn attribute_value(&self, value: &AttrValue, context: &RenderContext) -> Result<String, RenderError> {
        Ok(match value {
            AttrValue::Literal(text) => text.clone(),
            AttrValue::Expression(expression) => expression.evaluate(context.vars())?.to_text()?,
            AttrValue::Empty => String::new(),
        })
    }

    fn event_binding(
        &self,
        kind: EventKind,
        value: &AttrValue,
        context: &RenderContext,
    ) -> Result<EventBinding, RenderError> {
        let action = match value {
            AttrValue::Literal(name) => Term::atom(name),
            AttrValue::Expression(expression) => expression.evaluate(context.vars())?,
            AttrValue::Empty => Term::nil(),
        };
        Ok(EventBinding {
            kind,
            scope: context.scope().clone(),
            action,
            bindings: context.vars().clone(),
            state: context.state().clone(),
        })
    }
}
