//! Incremental patching of a live container.
//!
//! [`Patcher`] owns the document and remembers the display tree it last
//! applied, paired with the live node of every display node.  Each pass
//! diffs the new display tree against that record and issues the minimal
//! set of document mutations:
//!
//! - children are matched by `key` when they have one and by position
//!   otherwise; a matched pair must also agree on tag,
//! - unmatched old nodes are removed and unmatched new nodes created, so a
//!   tag change is a remove plus an insert,
//! - attributes, listeners and text are only written when they differ,
//! - surviving nodes are only moved when their order changed.
//!
//! Before the first pass the patcher has no record.  It takes one from the
//! container's current children, so existing markup is reused rather than
//! rebuilt.  Nodes outside the container are never touched.

use crate::{
    ComponentStore, Document, DocumentError, EventBinding, EventKind, ModuleId, NodeId, Registry,
    RenderError, Renderer, VElement, VNode, vdom::KEY_ATTR,
};
use boxed_terms::Term;
use core::fmt;
use indexmap::IndexMap;
use smartstring::alias::String;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Counts of the document mutations issued by one pass.
///
/// Attribute and listener writes on newly created nodes are part of
/// `created` and are not counted separately.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PatchStats {
    pub created: usize,
    pub removed: usize,
    pub moved: usize,
    pub attrs_set: usize,
    pub attrs_removed: usize,
    pub texts_updated: usize,
    pub listeners_changed: usize,
}

impl PatchStats {
    pub fn total(&self) -> usize {
        self.created
            + self.removed
            + self.moved
            + self.attrs_set
            + self.attrs_removed
            + self.texts_updated
            + self.listeners_changed
    }

    /// Whether the pass left the document unchanged.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl fmt::Display for PatchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created {}, removed {}, moved {}, attrs +{}/-{}, texts {}, listeners {}",
            self.created,
            self.removed,
            self.moved,
            self.attrs_set,
            self.attrs_removed,
            self.texts_updated,
            self.listeners_changed
        )
    }
}

#[derive(Clone, Debug)]
enum Shape {
    Element {
        tag: String,
        attrs: BTreeMap<String, String>,
        events: BTreeMap<EventKind, Rc<EventBinding>>,
    },
    Text(String),
}

/// A display node as applied, with its live node.
#[derive(Clone, Debug)]
struct Mounted {
    id: NodeId,
    shape: Shape,
    children: Vec<Mounted>,
}

impl Shape {
    fn of(element: &VElement) -> Self {
        Shape::Element {
            tag: element.tag.clone(),
            attrs: element.attrs.clone(),
            events: element.events.clone(),
        }
    }
}

impl Mounted {
    fn key(&self) -> Option<&str> {
        match &self.shape {
            Shape::Element { attrs, .. } => attrs.get(KEY_ATTR).map(String::as_str),
            Shape::Text(_) => None,
        }
    }

    fn same_kind(&self, node: &VNode) -> bool {
        match (&self.shape, node) {
            (Shape::Text(_), VNode::Text(_)) => true,
            (Shape::Element { tag, .. }, VNode::Element(element)) => {
                *tag == element.tag && self.key() == node.key()
            }
            _ => false,
        }
    }
}

/// Records the children of `parent` as they currently are.
fn snapshot<D: Document + ?Sized>(document: &D, parent: NodeId) -> Result<Vec<Mounted>, DocumentError> {
    let mut out = Vec::new();
    for id in document.children(parent)? {
        let shape = match document.tag(id)? {
            Some(tag) => {
                let mut events = BTreeMap::new();
                for kind in EventKind::ALL {
                    if let Some(binding) = document.listener(id, kind)? {
                        events.insert(kind, binding);
                    }
                }
                Shape::Element {
                    tag: tag.into(),
                    attrs: document.attributes(id)?.into_iter().collect(),
                    events,
                }
            }
            None => Shape::Text(document.text(id)?.ok_or(DocumentError::NotText(id))?.into()),
        };
        out.push(Mounted {
            id,
            shape,
            children: snapshot(document, id)?,
        });
    }
    Ok(out)
}

fn same_binding(a: Option<&Rc<EventBinding>>, b: Option<&Rc<EventBinding>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Rc::ptr_eq(a, b) || a == b,
        (None, None) => true,
        _ => false,
    }
}

/// Builds a detached live subtree for `node`.
fn create<D: Document + ?Sized>(
    document: &mut D,
    node: &VNode,
    stats: &mut PatchStats,
) -> Result<Mounted, DocumentError> {
    stats.created += 1;
    match node {
        VNode::Text(text) => Ok(Mounted {
            id: document.create_text(text),
            shape: Shape::Text(text.clone()),
            children: Vec::new(),
        }),
        VNode::Element(element) => {
            let id = document.create_element(&element.tag);
            for (name, value) in &element.attrs {
                document.set_attribute(id, name, value)?;
            }
            for (kind, binding) in &element.events {
                document.set_listener(id, *kind, Some(Rc::clone(binding)))?;
            }
            let mut children = Vec::with_capacity(element.children.len());
            for child in &element.children {
                let mounted = create(document, child, stats)?;
                document.insert_before(id, mounted.id, None)?;
                children.push(mounted);
            }
            Ok(Mounted {
                id,
                shape: Shape::of(element),
                children,
            })
        }
    }
}

/// Updates a matched node in place.
fn update<D: Document + ?Sized>(
    document: &mut D,
    old: Mounted,
    node: &VNode,
    stats: &mut PatchStats,
) -> Result<Mounted, DocumentError> {
    let Mounted {
        id,
        shape,
        children,
    } = old;
    match (shape, node) {
        (Shape::Text(current), VNode::Text(text)) => {
            if current != *text {
                document.set_text(id, text)?;
                stats.texts_updated += 1;
            }
            Ok(Mounted {
                id,
                shape: Shape::Text(text.clone()),
                children: Vec::new(),
            })
        }
        (Shape::Element { attrs, events, .. }, VNode::Element(element)) => {
            for name in attrs.keys() {
                if !element.attrs.contains_key(name) {
                    document.remove_attribute(id, name)?;
                    stats.attrs_removed += 1;
                }
            }
            for (name, value) in &element.attrs {
                if attrs.get(name) != Some(value) {
                    document.set_attribute(id, name, value)?;
                    stats.attrs_set += 1;
                }
            }
            for kind in EventKind::ALL {
                let binding = element.events.get(&kind);
                if !same_binding(events.get(&kind), binding) {
                    document.set_listener(id, kind, binding.cloned())?;
                    stats.listeners_changed += 1;
                }
            }
            let children = reconcile(document, id, children, &element.children, stats)?;
            Ok(Mounted {
                id,
                shape: Shape::of(element),
                children,
            })
        }
        _ => unreachable!(),
    }
}

/// Marks the entries forming a longest strictly increasing run of the
/// present positions.
fn longest_increasing(positions: &[Option<usize>]) -> Vec<bool> {
    let mut tails: Vec<usize> = Vec::new();
    let mut previous = vec![None; positions.len()];
    for (i, position) in positions.iter().enumerate() {
        if position.is_none() {
            continue;
        }
        let at = tails.partition_point(|&t| positions[t] < *position);
        if at > 0 {
            previous[i] = Some(tails[at - 1]);
        }
        if at == tails.len() {
            tails.push(i);
        } else {
            tails[at] = i;
        }
    }
    let mut keep = vec![false; positions.len()];
    let mut next = tails.last().copied();
    while let Some(i) = next {
        keep[i] = true;
        next = previous[i];
    }
    keep
}

/// Brings the children of `parent`, currently `old`, in line with `new`.
fn reconcile<D: Document + ?Sized>(
    document: &mut D,
    parent: NodeId,
    old: Vec<Mounted>,
    new: &[VNode],
    stats: &mut PatchStats,
) -> Result<Vec<Mounted>, DocumentError> {
    let mut keyed = IndexMap::new();
    let mut unkeyed = Vec::new();
    for (i, mounted) in old.iter().enumerate() {
        match mounted.key() {
            Some(key) => {
                keyed.insert(String::from(key), i);
            }
            None => unkeyed.push(i),
        }
    }
    let mut unkeyed = unkeyed.into_iter();
    let mut old: Vec<Option<Mounted>> = old.into_iter().map(Some).collect();

    let mut matched = Vec::with_capacity(new.len());
    for node in new {
        let candidate = match node.key() {
            Some(key) => keyed.swap_remove(key),
            None => unkeyed.next(),
        };
        let found = candidate
            .filter(|&i| old[i].as_ref().is_some_and(|m| m.same_kind(node)))
            .and_then(|i| old[i].take());
        matched.push(found);
    }

    let mut stale_ids = Vec::new();
    for stale in old.into_iter().flatten() {
        document.remove_child(parent, stale.id)?;
        stale_ids.push(stale.id);
        stats.removed += 1;
    }

    let mut mounted = Vec::with_capacity(new.len());
    for (node, found) in new.iter().zip(matched) {
        mounted.push(match found {
            Some(old) => update(document, old, node, stats)?,
            None => create(document, node, stats)?,
        });
    }

    // Nodes on a longest run already in order stay put.  The rest are
    // placed back to front, so every anchor is already in position.
    let live: IndexMap<NodeId, usize> = document
        .children(parent)?
        .into_iter()
        .enumerate()
        .map(|(i, id)| (id, i))
        .collect();
    let positions: Vec<_> = mounted.iter().map(|m| live.get(&m.id).copied()).collect();
    let keep = longest_increasing(&positions);
    let mut anchor = None;
    for (i, node) in mounted.iter().enumerate().rev() {
        if !keep[i] {
            document.insert_before(parent, node.id, anchor)?;
            if positions[i].is_some() {
                stats.moved += 1;
            }
        }
        anchor = Some(node.id);
    }

    // Released last so their ids are not handed to nodes of this pass.
    for id in stale_ids {
        document.discard(id)?;
    }
    Ok(mounted)
}

/// Applies display trees to the children of one container node.
#[derive(Debug)]
pub struct Patcher<D> {
    document: D,
    container: NodeId,
    previous: Option<Vec<Mounted>>,
}

impl<D: Document> Patcher<D> {
    pub fn new(document: D, container: NodeId) -> Self {
        Self {
            document,
            container,
            previous: None,
        }
    }

    #[inline]
    pub fn document(&self) -> &D {
        &self.document
    }

    /// Mutable access to the document.  Changes made here inside the
    /// container are not seen by the next pass unless [`Patcher::reset`]
    /// is called.
    #[inline]
    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    #[inline]
    pub fn container(&self) -> NodeId {
        self.container
    }

    /// Whether a previous tree is recorded.
    pub fn is_mounted(&self) -> bool {
        self.previous.is_some()
    }

    /// Makes the container's children match `nodes`.
    ///
    /// If the document rejects a mutation the record is dropped, and the
    /// next pass starts again from the container's actual children.
    pub fn patch(&mut self, nodes: &[VNode]) -> Result<PatchStats, DocumentError> {
        let previous = match self.previous.take() {
            Some(previous) => previous,
            None => {
                log::debug!("taking snapshot of container {}", self.container);
                snapshot(&self.document, self.container)?
            }
        };
        let mut stats = PatchStats::default();
        let mounted = reconcile(&mut self.document, self.container, previous, nodes, &mut stats)?;
        self.previous = Some(mounted);
        log::debug!("patched container {}: {stats}", self.container);
        Ok(stats)
    }

    /// Renders `page` and patches the result in.
    ///
    /// Component state is written back to `store` only when the whole pass
    /// succeeds.  A failed render leaves the document untouched.
    pub fn render(
        &mut self,
        registry: &Registry,
        store: &mut ComponentStore,
        page: &ModuleId,
        state: &Term,
    ) -> Result<PatchStats, RenderError> {
        let mut scratch = store.clone();
        let nodes = Renderer::new(registry, &mut scratch).render_page(page, state)?;
        let stats = self.patch(&nodes)?;
        *store = scratch;
        Ok(stats)
    }

    /// Forgets the recorded tree.  The next pass snapshots the container
    /// again.
    pub fn reset(&mut self) {
        self.previous = None;
    }

    /// Consumes the patcher, returning the document.
    pub fn into_document(self) -> D {
        self.document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Attribute, Expression, MemoryDocument, Module, Node};
    use boxed_terms::{atom, map};

    fn mounted() -> Patcher<MemoryDocument> {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut document = MemoryDocument::new();
        let root = document.root();
        let container = document.create_element("main");
        document.insert_before(root, container, None).unwrap();
        Patcher::new(document, container)
    }

    fn html(patcher: &Patcher<MemoryDocument>) -> std::string::String {
        patcher.document().inner_html(patcher.container()).unwrap()
    }

    fn item(key: &str) -> VNode {
        VElement::new("li").attr("key", key).child(VNode::text(key)).into()
    }

    fn list(keys: &[&str]) -> Vec<VNode> {
        let mut ul = VElement::new("ul");
        for key in keys {
            ul = ul.child(item(key));
        }
        vec![ul.into()]
    }

    fn click(action: &str) -> EventBinding {
        EventBinding {
            kind: EventKind::Click,
            scope: "Page".into(),
            action: atom!(action),
            bindings: Term::nil(),
            state: Term::nil(),
        }
    }

    #[test]
    fn longest_run() {
        let keep = longest_increasing(&[Some(2), Some(0), None, Some(1)]);
        assert_eq!(keep, [false, true, false, true]);
        assert_eq!(longest_increasing(&[]), Vec::<bool>::new());
        assert_eq!(longest_increasing(&[Some(0), Some(1)]), [true, true]);
    }

    #[test]
    fn first_pass_builds_the_tree() {
        let mut patcher = mounted();
        assert!(!patcher.is_mounted());
        let stats = patcher
            .patch(&[
                VElement::new("p").attr("class", "x").child(VNode::text("hi")).into(),
                VNode::text("tail"),
            ])
            .unwrap();
        assert!(patcher.is_mounted());
        assert_eq!(stats.created, 3);
        assert_eq!(html(&patcher), "<p class=\"x\">hi</p>tail");
    }

    #[test]
    fn unchanged_tree_issues_no_mutations() {
        let mut patcher = mounted();
        let tree = || -> Vec<VNode> {
            vec![
                VElement::new("button")
                    .attr("class", "b")
                    .on(click("go"))
                    .child(VNode::text("go"))
                    .into(),
            ]
        };
        patcher.patch(&tree()).unwrap();
        patcher.document_mut().reset_mutations();
        let stats = patcher.patch(&tree()).unwrap();
        assert!(stats.is_empty());
        assert_eq!(patcher.document().mutations(), 0);
    }

    #[test]
    fn updates_in_place() {
        let mut patcher = mounted();
        patcher
            .patch(&[VElement::new("p")
                .attr("id", "p")
                .attr("class", "old")
                .attr("title", "t")
                .child(VNode::text("1"))
                .into()])
            .unwrap();
        let p = patcher.document().find_by_attribute("id", "p").unwrap();
        patcher.document_mut().reset_mutations();

        let stats = patcher
            .patch(&[VElement::new("p")
                .attr("id", "p")
                .attr("class", "new")
                .on(click("go"))
                .child(VNode::text("2"))
                .into()])
            .unwrap();
        assert_eq!(
            stats,
            PatchStats {
                attrs_set: 1,
                attrs_removed: 1,
                texts_updated: 1,
                listeners_changed: 1,
                ..PatchStats::default()
            }
        );
        assert_eq!(patcher.document().mutations(), 4);
        assert_eq!(patcher.document().find_by_attribute("id", "p"), Some(p));
        assert_eq!(html(&patcher), "<p class=\"new\" id=\"p\">2</p>");
        assert!(patcher.document().listener(p, EventKind::Click).unwrap().is_some());

        patcher
            .patch(&[VElement::new("p").attr("id", "p").into()])
            .unwrap();
        assert!(patcher.document().listener(p, EventKind::Click).unwrap().is_none());
    }

    #[test]
    fn tag_change_replaces_the_node() {
        let mut patcher = mounted();
        patcher.patch(&[VElement::new("div").child(VNode::text("a")).into()]).unwrap();
        let old = patcher.document().children(patcher.container()).unwrap()[0];
        let stats = patcher
            .patch(&[VElement::new("span").child(VNode::text("a")).into()])
            .unwrap();
        assert_eq!(stats.removed, 1);
        assert_eq!(stats.created, 2);
        let new = patcher.document().children(patcher.container()).unwrap();
        assert_eq!(new.len(), 1);
        assert_ne!(new[0], old);
        assert_eq!(html(&patcher), "<span>a</span>");
    }

    #[test]
    fn keyed_children_are_moved_not_rebuilt() {
        let mut patcher = mounted();
        patcher.patch(&list(&["a", "b", "c"])).unwrap();
        let doc = patcher.document();
        let ids: Vec<_> = ["a", "b", "c"]
            .iter()
            .map(|k| doc.find_by_attribute("key", k).unwrap())
            .collect();

        let stats = patcher.patch(&list(&["c", "a", "b"])).unwrap();
        assert_eq!(stats.created, 0);
        assert_eq!(stats.removed, 0);
        assert_eq!(stats.moved, 1);
        assert_eq!(
            html(&patcher),
            "<ul><li key=\"c\">c</li><li key=\"a\">a</li><li key=\"b\">b</li></ul>"
        );
        let doc = patcher.document();
        for (key, id) in ["a", "b", "c"].iter().zip(ids) {
            assert_eq!(doc.find_by_attribute("key", key), Some(id));
        }
    }

    #[test]
    fn keyed_insert_and_remove() {
        let mut patcher = mounted();
        patcher.patch(&list(&["a", "b", "c"])).unwrap();
        let stats = patcher.patch(&list(&["x", "a", "c"])).unwrap();
        assert_eq!(stats.removed, 1);
        assert_eq!(stats.created, 2);
        assert_eq!(stats.moved, 0);
        assert_eq!(
            html(&patcher),
            "<ul><li key=\"x\">x</li><li key=\"a\">a</li><li key=\"c\">c</li></ul>"
        );
    }

    #[test]
    fn removed_nodes_are_released() {
        let mut patcher = mounted();
        patcher.patch(&list(&["a", "b", "c"])).unwrap();
        let count = patcher.document().node_count();
        for _ in 0..5 {
            patcher.patch(&list(&["x", "a", "c"])).unwrap();
            patcher.patch(&list(&["a", "b", "c"])).unwrap();
        }
        assert_eq!(patcher.document().node_count(), count);
        assert_eq!(
            html(&patcher),
            "<ul><li key=\"a\">a</li><li key=\"b\">b</li><li key=\"c\">c</li></ul>"
        );
    }

    #[test]
    fn first_pass_reuses_existing_markup() {
        let mut patcher = mounted();
        let container = patcher.container();
        let doc = patcher.document_mut();
        let p = doc.create_element("p");
        let text = doc.create_text("hi");
        doc.insert_before(container, p, None).unwrap();
        doc.insert_before(p, text, None).unwrap();
        doc.set_attribute(p, "class", "x").unwrap();
        doc.reset_mutations();

        let stats = patcher
            .patch(&[VElement::new("p")
                .attr("class", "x")
                .on(click("go"))
                .child(VNode::text("hi"))
                .into()])
            .unwrap();
        assert_eq!(stats.created, 0);
        assert_eq!(stats.listeners_changed, 1);
        assert_eq!(patcher.document().mutations(), 1);
        assert_eq!(patcher.document().children(container).unwrap(), vec![p]);
    }

    #[test]
    fn reset_resnapshots_the_container() {
        let mut patcher = mounted();
        patcher.patch(&list(&["a"])).unwrap();
        let container = patcher.container();
        patcher.document_mut().clear_children(container).unwrap();
        patcher.reset();
        assert!(!patcher.is_mounted());
        let stats = patcher.patch(&list(&["a", "b"])).unwrap();
        assert_eq!(stats.created, 3 + 2);
        assert_eq!(
            html(&patcher),
            "<ul><li key=\"a\">a</li><li key=\"b\">b</li></ul>"
        );
    }

    #[test]
    fn nodes_outside_the_container_are_untouched() {
        let mut patcher = mounted();
        let root = patcher.document().root();
        let doc = patcher.document_mut();
        let aside = doc.create_element("aside");
        doc.insert_before(root, aside, None).unwrap();
        patcher.patch(&list(&["a"])).unwrap();
        patcher.patch(&[]).unwrap();
        let doc = patcher.document();
        assert_eq!(doc.inner_html(root).unwrap(), "<main></main><aside></aside>");
    }

    #[test]
    fn failed_render_changes_nothing() {
        let registry = Registry::new()
            .with(
                "Page",
                Module::new(|| {
                    Node::element(
                        "div",
                        vec![Attribute::expression("title", Expression::var("title"))],
                        vec![Node::component("Counter", vec![Attribute::literal("cid", "c")], vec![])],
                    )
                }),
            )
            .with(
                "Counter",
                Module::new(|| Node::text("n")).with_init(|_| map! { atom!("n") => 0 }),
            );
        let mut store = ComponentStore::new();
        let mut patcher = mounted();
        let page = ModuleId::new("Page");

        patcher
            .render(&registry, &mut store, &page, &map! { atom!("title") => "a" })
            .unwrap();
        assert_eq!(store.len(), 1);
        let before = html(&patcher);
        patcher.document_mut().reset_mutations();
        store.clear();

        let bad = map! { atom!("title") => map! { 1 => 2 } };
        assert!(patcher.render(&registry, &mut store, &page, &bad).is_err());
        assert_eq!(patcher.document().mutations(), 0);
        assert_eq!(html(&patcher), before);
        assert!(store.is_empty());
        assert!(patcher.is_mounted());
    }
}
