//! Defines [`VNode`], the display tree produced by a render pass.
//!
//! Display nodes are plain data: resolved attributes, resolved event
//! bindings and children.  They are rebuilt on every pass and only the
//! patcher keeps the previous tree.

use crate::{EventBinding, EventKind};
use core::fmt;
use smartstring::alias::String;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Attribute used to match children across renders.
pub const KEY_ATTR: &str = "key";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct VElement {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub events: BTreeMap<EventKind, Rc<EventBinding>>,
    pub children: Vec<VNode>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum VNode {
    Element(VElement),
    Text(String),
}

impl VElement {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn child(mut self, child: VNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn on(mut self, binding: EventBinding) -> Self {
        self.events.insert(binding.kind, Rc::new(binding));
        self
    }
}

impl From<VElement> for VNode {
    fn from(element: VElement) -> Self {
        VNode::Element(element)
    }
}

impl VNode {
    pub fn text(content: &str) -> Self {
        VNode::Text(content.into())
    }

    /// The `key` attribute of an element, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            VNode::Element(e) => e.attrs.get(KEY_ATTR).map(String::as_str),
            VNode::Text(_) => None,
        }
    }

    /// Whether an old node can be patched in place into `other`: both are
    /// text, or both are elements with the same tag and key.
    pub fn same_kind(&self, other: &VNode) -> bool {
        match (self, other) {
            (VNode::Text(_), VNode::Text(_)) => true,
            (VNode::Element(a), VNode::Element(b)) => a.tag == b.tag && self.key() == other.key(),
            _ => false,
        }
    }

    pub fn as_element(&self) -> Option<&VElement> {
        match self {
            VNode::Element(e) => Some(e),
            VNode::Text(_) => None,
        }
    }

    /// Number of nodes in this subtree.
    pub fn size(&self) -> usize {
        match self {
            VNode::Element(e) => 1 + e.children.iter().map(VNode::size).sum::<usize>(),
            VNode::Text(_) => 1,
        }
    }
}

pub(crate) fn escape_text(s: &str, out: &mut impl fmt::Write) -> fmt::Result {
    for c in s.chars() {
        match c {
            '&' => out.write_str("&amp;")?,
            '<' => out.write_str("&lt;")?,
            '>' => out.write_str("&gt;")?,
            '"' => out.write_str("&quot;")?,
            c => out.write_char(c)?,
        }
    }
    Ok(())
}

/// Renders the node as HTML.  Event bindings are not part of the markup.
impl fmt::Display for VNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VNode::Text(t) => escape_text(t, f),
            VNode::Element(e) => {
                write!(f, "<{}", e.tag)?;
                for (name, value) in &e.attrs {
                    write!(f, " {name}=\"")?;
                    escape_text(value, f)?;
                    f.write_str("\"")?;
                }
                f.write_str(">")?;
                for child in &e.children {
                    write!(f, "{child}")?;
                }
                write!(f, "</{}>", e.tag)
            }
        }
    }
}
