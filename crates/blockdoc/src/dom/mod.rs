// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Parse-assist DOM.
//!
//! html5ever drives [`PaDomCreator`] to build this flat tree; the sanitizer
//! and the block parser walk it and re-serialize the parts they keep. Nodes
//! live in a single arena and refer to each other by [`PaDomHandle`], so the
//! tree builder's reparenting moves are index updates rather than pointer
//! surgery. Handles created by html5ever but never attached anywhere (its
//! fragment-context element, for instance) simply remain as unreachable
//! garbage in the arena.

pub(crate) mod padom_creator;
pub(crate) mod serializer;

use std::fmt;

use html5ever::tree_builder::ElementFlags;
use html5ever::{namespace_url, ns, Attribute, LocalName, QualName};

pub(crate) use padom_creator::PaDomCreator;

/// Ceiling on tree depth for every walk in the pipeline. Real markup stays
/// in the tens of levels; anything deeper is adversarial and gets truncated.
pub(crate) const MAX_TREE_DEPTH: usize = 256;

pub(crate) fn paqual_name(tag: &str) -> QualName {
    QualName::new(None, ns!(html), LocalName::from(tag))
}

// ─── Nodes ───────────────────────────────────────────────────────────────────

/// Index of a node inside [`PaDom::nodes`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct PaDomHandle(pub(crate) usize);

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum PaDomNode {
    Document(PaNodeDocument),
    Container(PaNodeContainer),
    Text(PaNodeText),
    /// Comments and processing instructions parse into this; nothing ever
    /// serializes it.
    Discarded,
}

impl PaDomNode {
    pub(crate) fn name(&self) -> &QualName {
        match self {
            PaDomNode::Container(node) => &node.name,
            _ => panic!("name() called on a node that is not an element"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PaNodeDocument {
    pub(crate) children: Vec<PaDomHandle>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PaNodeContainer {
    pub(crate) name: QualName,
    pub(crate) attrs: Vec<(String, String)>,
    pub(crate) children: Vec<PaDomHandle>,
}

impl PaNodeContainer {
    /// The lower-cased local tag name.
    pub(crate) fn tag(&self) -> &str {
        self.name.local.as_ref()
    }

    pub(crate) fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _v)| n == name)
            .map(|(_n, v)| v.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PaNodeText {
    pub(crate) content: String,
}

// ─── Arena ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PaDom {
    pub(crate) nodes: Vec<PaDomNode>,
    /// Parent of each node, in lockstep with `nodes`. Keeping this index
    /// makes the tree builder's foster-parenting and adoption-agency
    /// callbacks O(1) lookups instead of arena scans.
    pub(crate) parents: Vec<Option<PaDomHandle>>,
    pub(crate) document_handle: PaDomHandle,
}

impl PaDom {
    pub(crate) fn new() -> Self {
        Self {
            nodes: vec![PaDomNode::Document(PaNodeDocument {
                children: Vec::new(),
            })],
            parents: vec![None],
            document_handle: PaDomHandle(0),
        }
    }

    pub(crate) fn document_handle(&self) -> &PaDomHandle {
        &self.document_handle
    }

    pub(crate) fn get_node(&self, handle: &PaDomHandle) -> &PaDomNode {
        &self.nodes[handle.0]
    }

    pub(crate) fn get_mut_node(&mut self, handle: &PaDomHandle) -> &mut PaDomNode {
        &mut self.nodes[handle.0]
    }

    pub(crate) fn add_node(&mut self, node: PaDomNode) -> PaDomHandle {
        self.nodes.push(node);
        self.parents.push(None);
        PaDomHandle(self.nodes.len() - 1)
    }

    pub(crate) fn create_element(
        &mut self,
        name: QualName,
        attrs: Vec<Attribute>,
        _flags: ElementFlags,
    ) -> PaDomHandle {
        self.add_node(PaDomNode::Container(PaNodeContainer {
            name,
            attrs: attrs
                .iter()
                .map(|attr| {
                    (
                        attr.name.local.as_ref().to_owned(),
                        attr.value.as_ref().to_owned(),
                    )
                })
                .collect(),
            children: Vec::new(),
        }))
    }

    pub(crate) fn parent_of(&self, handle: &PaDomHandle) -> Option<&PaDomHandle> {
        self.parents[handle.0].as_ref()
    }

    pub(crate) fn children(&self, handle: &PaDomHandle) -> &[PaDomHandle] {
        match self.get_node(handle) {
            PaDomNode::Document(node) => &node.children,
            PaDomNode::Container(node) => &node.children,
            _ => &[],
        }
    }

    fn children_mut(&mut self, handle: &PaDomHandle) -> Option<&mut Vec<PaDomHandle>> {
        match self.get_mut_node(handle) {
            PaDomNode::Document(node) => Some(&mut node.children),
            PaDomNode::Container(node) => Some(&mut node.children),
            _ => None,
        }
    }

    /// Detach `child` from its current parent, if it has one.
    pub(crate) fn detach(&mut self, child: &PaDomHandle) {
        if let Some(parent) = self.parents[child.0].clone() {
            if let Some(children) = self.children_mut(&parent) {
                if let Some(index) = children.iter().position(|c| c == child) {
                    children.remove(index);
                }
            }
        }
        self.parents[child.0] = None;
    }

    /// Append `child` to `parent`, detaching it from any previous parent.
    pub(crate) fn attach_child(&mut self, parent: &PaDomHandle, child: PaDomHandle) {
        self.detach(&child);
        if let Some(children) = self.children_mut(parent) {
            children.push(child.clone());
            self.parents[child.0] = Some(parent.clone());
        }
    }

    /// Insert `child` as a child of `parent` at `index`, detaching it from
    /// any previous parent first.
    pub(crate) fn insert_child(
        &mut self,
        parent: &PaDomHandle,
        index: usize,
        child: PaDomHandle,
    ) {
        self.detach(&child);
        if let Some(children) = self.children_mut(parent) {
            let index = index.min(children.len());
            children.insert(index, child.clone());
            self.parents[child.0] = Some(parent.clone());
        }
    }

    pub(crate) fn take_children(&mut self, handle: &PaDomHandle) -> Vec<PaDomHandle> {
        match self.children_mut(handle) {
            Some(children) => std::mem::take(children),
            None => Vec::new(),
        }
    }

    /// Children of the synthetic fragment root, i.e. the top level of the
    /// parsed input. Fragment parsing wraps everything in one `html`
    /// element; that wrapper is transparent here.
    pub(crate) fn top_level_children(&self) -> Vec<PaDomHandle> {
        let mut top_level = Vec::new();
        for child in self.children(self.document_handle()) {
            match self.get_node(child) {
                PaDomNode::Container(node) if node.tag() == "html" => {
                    top_level.extend(self.children(child).iter().cloned());
                }
                _ => top_level.push(child.clone()),
            }
        }
        top_level
    }

    // ─── Tree queries ────────────────────────────────────────────────────

    /// First descendant of `root` (excluding `root` itself, document order)
    /// whose tag is one of `tags`.
    pub(crate) fn find_first(
        &self,
        root: &PaDomHandle,
        tags: &[&str],
    ) -> Option<PaDomHandle> {
        let mut stack: Vec<PaDomHandle> =
            self.children(root).iter().rev().cloned().collect();
        while let Some(handle) = stack.pop() {
            if let PaDomNode::Container(node) = self.get_node(&handle) {
                if tags.contains(&node.tag()) {
                    return Some(handle);
                }
            }
            stack.extend(self.children(&handle).iter().rev().cloned());
        }
        None
    }

    /// Every descendant of `root` with the given tag, in document order,
    /// including matches nested inside other matches.
    pub(crate) fn find_all(&self, root: &PaDomHandle, tag: &str) -> Vec<PaDomHandle> {
        let mut found = Vec::new();
        let mut stack: Vec<PaDomHandle> =
            self.children(root).iter().rev().cloned().collect();
        while let Some(handle) = stack.pop() {
            if let PaDomNode::Container(node) = self.get_node(&handle) {
                if node.tag() == tag {
                    found.push(handle.clone());
                }
            }
            stack.extend(self.children(&handle).iter().rev().cloned());
        }
        found
    }

    /// Concatenated text of every text node under `root`, document order.
    pub(crate) fn text_content(&self, root: &PaDomHandle) -> String {
        let mut text = String::new();
        let mut stack: Vec<PaDomHandle> =
            self.children(root).iter().rev().cloned().collect();
        while let Some(handle) = stack.pop() {
            if let PaDomNode::Text(node) = self.get_node(&handle) {
                text.push_str(&node.content);
            }
            stack.extend(self.children(&handle).iter().rev().cloned());
        }
        text
    }
}

// ─── Creation error ──────────────────────────────────────────────────────────

/// Outcome of a parse that hit recoverable html5ever errors. The repaired
/// tree is always usable; callers in this crate continue with `dom` and
/// ignore the complaints.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PaDomCreationError {
    pub(crate) dom: PaDom,
    pub(crate) parse_errors: Vec<String>,
}

impl PaDomCreationError {
    pub(crate) fn new() -> Self {
        Self {
            dom: PaDom::new(),
            parse_errors: Vec::new(),
        }
    }
}

impl fmt::Display for PaDomCreationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HTML parse recovered from {} error(s): {}",
            self.parse_errors.len(),
            self.parse_errors.join(", ")
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn dom_with_tree() -> (PaDom, PaDomHandle, PaDomHandle, PaDomHandle) {
        // <div><p>one</p><cite>two</cite></div>
        let mut dom = PaDom::new();
        let div = dom.add_node(PaDomNode::Container(PaNodeContainer {
            name: paqual_name("div"),
            attrs: vec![("class".into(), "outer".into())],
            children: Vec::new(),
        }));
        let p = dom.add_node(PaDomNode::Container(PaNodeContainer {
            name: paqual_name("p"),
            attrs: Vec::new(),
            children: Vec::new(),
        }));
        let one = dom.add_node(PaDomNode::Text(PaNodeText {
            content: "one".into(),
        }));
        let cite = dom.add_node(PaDomNode::Container(PaNodeContainer {
            name: paqual_name("cite"),
            attrs: Vec::new(),
            children: Vec::new(),
        }));
        let two = dom.add_node(PaDomNode::Text(PaNodeText {
            content: "two".into(),
        }));
        let document = dom.document_handle().clone();
        dom.attach_child(&document, div.clone());
        dom.attach_child(&div, p.clone());
        dom.attach_child(&p, one);
        dom.attach_child(&div, cite.clone());
        dom.attach_child(&cite, two);
        (dom, div, p, cite)
    }

    #[test]
    fn attach_child_tracks_parents() {
        let (dom, div, p, _) = dom_with_tree();
        assert_eq!(dom.parent_of(&p), Some(&div));
        assert_eq!(dom.parent_of(&div), Some(dom.document_handle()));
    }

    #[test]
    fn detach_removes_from_parent_and_clears_index() {
        let (mut dom, div, p, _) = dom_with_tree();
        dom.detach(&p);
        assert_eq!(dom.parent_of(&p), None);
        assert!(!dom.children(&div).contains(&p));
    }

    #[test]
    fn insert_child_clamps_out_of_range_index() {
        let (mut dom, div, _, _) = dom_with_tree();
        let extra = dom.add_node(PaDomNode::Text(PaNodeText {
            content: "tail".into(),
        }));
        dom.insert_child(&div, 99, extra.clone());
        assert_eq!(dom.children(&div).last(), Some(&extra));
    }

    #[test]
    fn find_first_returns_first_match_in_document_order() {
        let (dom, div, _, cite) = dom_with_tree();
        assert_eq!(dom.find_first(&div, &["cite", "footer"]), Some(cite));
        assert_eq!(dom.find_first(&div, &["footer"]), None);
    }

    #[test]
    fn text_content_concatenates_descendant_text() {
        let (dom, div, _, _) = dom_with_tree();
        assert_eq!(dom.text_content(&div), "onetwo");
    }

    #[test]
    fn get_attr_finds_present_attributes_only() {
        let (dom, div, _, _) = dom_with_tree();
        let PaDomNode::Container(node) = dom.get_node(&div) else {
            panic!("expected a container");
        };
        assert_eq!(node.get_attr("class"), Some("outer"));
        assert_eq!(node.get_attr("id"), None);
    }
}
