//! The live document abstraction.
//!
//! [`Document`] is the narrow interface the patcher and event dispatch use
//! to read and mutate a host node tree.  [`MemoryDocument`] is an
//! in-memory implementation that counts mutations and serializes to HTML.

use crate::{EventBinding, EventKind};
use crate::vdom::escape_text;
use core::fmt;
use indexmap::IndexMap;
use smartstring::alias::String;
use std::collections::BTreeMap;
use std::rc::Rc;
use thiserror::Error;

/// Handle of a live document node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn from_raw(index: usize) -> Self {
        Self(index)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DocumentError {
    #[error("node {0} does not exist")]
    UnknownNode(NodeId),

    #[error("node {0} is not an element")]
    NotAnElement(NodeId),

    #[error("node {0} is not a text node")]
    NotText(NodeId),

    #[error("node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("inserting {child} into {parent} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },

    #[error("node {0} is still attached")]
    Attached(NodeId),
}

/// A mutable host node tree.
pub trait Document {
    fn create_element(&mut self, tag: &str) -> NodeId;

    fn create_text(&mut self, text: &str) -> NodeId;

    /// Tag of an element, `None` for a text node.
    fn tag(&self, node: NodeId) -> Result<Option<&str>, DocumentError>;

    /// Content of a text node, `None` for an element.
    fn text(&self, node: NodeId) -> Result<Option<&str>, DocumentError>;

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), DocumentError>;

    fn attributes(&self, node: NodeId) -> Result<Vec<(String, String)>, DocumentError>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DocumentError>;

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), DocumentError>;

    /// The binding for `kind` on `node`.  Text nodes have none.
    fn listener(&self, node: NodeId, kind: EventKind) -> Result<Option<Rc<EventBinding>>, DocumentError>;

    /// Replaces the binding for `kind` on `node`; `None` unbinds.
    fn set_listener(
        &mut self,
        node: NodeId,
        kind: EventKind,
        binding: Option<Rc<EventBinding>>,
    ) -> Result<(), DocumentError>;

    fn children(&self, node: NodeId) -> Result<Vec<NodeId>, DocumentError>;

    fn parent(&self, node: NodeId) -> Result<Option<NodeId>, DocumentError>;

    /// Inserts `child` into `parent` before `before`, or last when `before`
    /// is `None`.  An attached child is moved.
    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: Option<NodeId>,
    ) -> Result<(), DocumentError>;

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DocumentError>;

    /// Releases a detached node and its subtree.  Their ids must not be
    /// used afterwards and may be handed out again.
    fn discard(&mut self, node: NodeId) -> Result<(), DocumentError> {
        let _ = node;
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Content {
    Element {
        tag: String,
        attrs: IndexMap<String, String>,
        listeners: BTreeMap<EventKind, Rc<EventBinding>>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct MemoryNode {
    content: Content,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An in-memory [`Document`] rooted at a `body` element.
///
/// Every successful mutating call, except node creation and
/// [`Document::discard`], increments [`MemoryDocument::mutations`].
/// Discarded slots are reused by later creations.
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    nodes: Vec<Option<MemoryNode>>,
    free: Vec<NodeId>,
    mutations: usize,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            free: Vec::new(),
            mutations: 0,
        };
        doc.create_element("body");
        doc
    }

    /// The `body` element.
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of mutations applied so far.
    #[inline]
    pub fn mutations(&self) -> usize {
        self.mutations
    }

    pub fn reset_mutations(&mut self) {
        self.mutations = 0;
    }

    /// Number of live nodes, attached or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    fn node(&self, id: NodeId) -> Result<&MemoryNode, DocumentError> {
        self.nodes
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(DocumentError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut MemoryNode, DocumentError> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(DocumentError::UnknownNode(id))
    }

    fn push(&mut self, content: Content) -> NodeId {
        let node = MemoryNode {
            content,
            parent: None,
            children: Vec::new(),
        };
        match self.free.pop() {
            Some(id) => {
                self.nodes[id.0] = Some(node);
                id
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    fn element_parts(
        &mut self,
        id: NodeId,
    ) -> Result<
        (
            &mut IndexMap<String, String>,
            &mut BTreeMap<EventKind, Rc<EventBinding>>,
        ),
        DocumentError,
    > {
        match &mut self.node_mut(id)?.content {
            Content::Element {
                attrs, listeners, ..
            } => Ok((attrs, listeners)),
            Content::Text(_) => Err(DocumentError::NotAnElement(id)),
        }
    }

    fn detach(&mut self, child: NodeId) -> Result<(), DocumentError> {
        if let Some(parent) = self.node(child)?.parent {
            self.node_mut(parent)?.children.retain(|c| *c != child);
            self.node_mut(child)?.parent = None;
        }
        Ok(())
    }

    /// Removes every child of `node`, as a whole-document replacement
    /// would.
    pub fn clear_children(&mut self, node: NodeId) -> Result<(), DocumentError> {
        for child in self.children(node)? {
            self.remove_child(node, child)?;
        }
        Ok(())
    }

    /// Finds the first element in document order whose attribute `name`
    /// equals `value`.
    pub fn find_by_attribute(&self, name: &str, value: &str) -> Option<NodeId> {
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            let node = self.node(id).ok()?;
            if let Content::Element { attrs, .. } = &node.content {
                if attrs.get(name).is_some_and(|v| v == value) {
                    return Some(id);
                }
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    /// Serializes `node` and its subtree as HTML.
    pub fn to_html(&self, node: NodeId) -> Result<std::string::String, DocumentError> {
        let mut out = std::string::String::new();
        self.write_html(node, &mut out)?;
        Ok(out)
    }

    /// Serializes the children of `node` as HTML.
    pub fn inner_html(&self, node: NodeId) -> Result<std::string::String, DocumentError> {
        let mut out = std::string::String::new();
        for child in &self.node(node)?.children {
            self.write_html(*child, &mut out)?;
        }
        Ok(out)
    }

    fn write_html(&self, id: NodeId, out: &mut std::string::String) -> Result<(), DocumentError> {
        let node = self.node(id)?;
        // Writing into a String never fails.
        match &node.content {
            Content::Text(text) => {
                let _ = escape_text(text, out);
            }
            Content::Element { tag, attrs, .. } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    let _ = escape_text(value, out);
                    out.push('"');
                }
                out.push('>');
                for child in &node.children {
                    self.write_html(*child, out)?;
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
        Ok(())
    }
}

impl Document for MemoryDocument {
    fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(Content::Element {
            tag: tag.into(),
            attrs: IndexMap::new(),
            listeners: BTreeMap::new(),
        })
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        self.push(Content::Text(text.into()))
    }

    fn tag(&self, node: NodeId) -> Result<Option<&str>, DocumentError> {
        Ok(match &self.node(node)?.content {
            Content::Element { tag, .. } => Some(tag.as_str()),
            Content::Text(_) => None,
        })
    }

    fn text(&self, node: NodeId) -> Result<Option<&str>, DocumentError> {
        Ok(match &self.node(node)?.content {
            Content::Text(text) => Some(text.as_str()),
            Content::Element { .. } => None,
        })
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), DocumentError> {
        match &mut self.node_mut(node)?.content {
            Content::Text(current) => *current = text.into(),
            Content::Element { .. } => return Err(DocumentError::NotText(node)),
        }
        self.mutations += 1;
        Ok(())
    }

    fn attributes(&self, node: NodeId) -> Result<Vec<(String, String)>, DocumentError> {
        Ok(match &self.node(node)?.content {
            Content::Element { attrs, .. } => attrs
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            Content::Text(_) => Vec::new(),
        })
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<(), DocumentError> {
        let (attrs, _) = self.element_parts(node)?;
        attrs.insert(name.into(), value.into());
        self.mutations += 1;
        Ok(())
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), DocumentError> {
        let (attrs, _) = self.element_parts(node)?;
        attrs.shift_remove(name);
        self.mutations += 1;
        Ok(())
    }

    fn listener(&self, node: NodeId, kind: EventKind) -> Result<Option<Rc<EventBinding>>, DocumentError> {
        Ok(match &self.node(node)?.content {
            Content::Element { listeners, .. } => listeners.get(&kind).cloned(),
            Content::Text(_) => None,
        })
    }

    fn set_listener(
        &mut self,
        node: NodeId,
        kind: EventKind,
        binding: Option<Rc<EventBinding>>,
    ) -> Result<(), DocumentError> {
        let (_, listeners) = self.element_parts(node)?;
        match binding {
            Some(binding) => listeners.insert(kind, binding),
            None => listeners.remove(&kind),
        };
        self.mutations += 1;
        Ok(())
    }

    fn children(&self, node: NodeId) -> Result<Vec<NodeId>, DocumentError> {
        Ok(self.node(node)?.children.clone())
    }

    fn parent(&self, node: NodeId) -> Result<Option<NodeId>, DocumentError> {
        Ok(self.node(node)?.parent)
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: Option<NodeId>,
    ) -> Result<(), DocumentError> {
        if let Content::Text(_) = self.node(parent)?.content {
            return Err(DocumentError::NotAnElement(parent));
        }
        self.node(child)?;
        let mut ancestor = Some(parent);
        while let Some(id) = ancestor {
            if id == child {
                return Err(DocumentError::Cycle { parent, child });
            }
            ancestor = self.node(id)?.parent;
        }
        if let Some(before) = before {
            if before == child || self.node(before)?.parent != Some(parent) {
                return Err(DocumentError::NotAChild {
                    parent,
                    child: before,
                });
            }
        }
        self.detach(child)?;
        let siblings = &mut self.node_mut(parent)?.children;
        let position = before
            .and_then(|b| siblings.iter().position(|c| *c == b))
            .unwrap_or(siblings.len());
        siblings.insert(position, child);
        self.node_mut(child)?.parent = Some(parent);
        self.mutations += 1;
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DocumentError> {
        if self.node(child)?.parent != Some(parent) {
            return Err(DocumentError::NotAChild { parent, child });
        }
        self.detach(child)?;
        self.mutations += 1;
        Ok(())
    }

    fn discard(&mut self, node: NodeId) -> Result<(), DocumentError> {
        if node == self.root() || self.node(node)?.parent.is_some() {
            return Err(DocumentError::Attached(node));
        }
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(released) = self.nodes.get_mut(id.0).and_then(Option::take) {
                stack.extend(released.children);
                self.free.push(id);
            }
        }
        Ok(())
    }
}
