// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The html5ever [`TreeSink`] that builds a [`PaDom`].
//!
//! Pasted markup is untrusted, so every callback the tree builder can issue
//! must complete without panicking: comments, doctypes, templates, form
//! association, table foster-parenting and adoption-agency reparenting all
//! land here with whatever the error-recovering parser decides to do.

use super::{
    paqual_name, PaDom, PaDomCreationError, PaDomHandle, PaDomNode,
    PaNodeDocument, PaNodeText,
};
use html5ever::interface::NextParserState;
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{parse_fragment, Attribute, QualName};
use std::cell::{Ref, RefCell};

pub(crate) type DomCreationResult = Result<PaDom, PaDomCreationError>;

pub(crate) struct PaDomCreator {
    state: RefCell<PaDomCreationError>,
    /// Contents fragment of each template element, allocated on first use.
    template_contents: RefCell<Vec<(PaDomHandle, PaDomHandle)>>,
}

impl PaDomCreator {
    /// Parse `html` as a fragment. `Err` still carries the repaired DOM,
    /// so callers can (and in this crate always do) continue with it.
    pub fn parse(html: &str) -> DomCreationResult {
        parse_fragment(
            PaDomCreator::default(),
            Default::default(),
            paqual_name(""),
            vec![],
        )
        .from_utf8()
        .one(html.as_bytes())
    }
}

impl Default for PaDomCreator {
    fn default() -> Self {
        Self {
            state: RefCell::new(PaDomCreationError::new()),
            template_contents: RefCell::new(Vec::new()),
        }
    }
}

impl TreeSink for PaDomCreator {
    type Handle = PaDomHandle;
    type Output = DomCreationResult;
    type ElemName<'a> = Ref<'a, QualName>;

    fn finish(self) -> Self::Output {
        if self.state.borrow().parse_errors.is_empty() {
            Ok(self.state.borrow().dom.clone())
        } else {
            Err(PaDomCreationError {
                dom: self.state.borrow().dom.clone(),
                parse_errors: self.state.borrow().parse_errors.clone(),
            })
        }
    }

    fn parse_error(&self, msg: std::borrow::Cow<'static, str>) {
        self.state.borrow_mut().parse_errors.push(String::from(msg));
    }

    fn get_document(&self) -> Self::Handle {
        self.state.borrow().dom.document_handle().clone()
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        Ref::map(self.state.borrow(), |map| map.dom.get_node(target).name())
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        flags: ElementFlags,
    ) -> Self::Handle {
        self.state
            .borrow_mut()
            .dom
            .create_element(name, attrs, flags)
    }

    fn create_comment(&self, _text: StrTendril) -> Self::Handle {
        self.state.borrow_mut().dom.add_node(PaDomNode::Discarded)
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        self.state.borrow_mut().dom.add_node(PaDomNode::Discarded)
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let dom = &mut self.state.borrow_mut().dom;
        match child {
            NodeOrText::AppendNode(child) => {
                dom.attach_child(parent, child);
            }
            NodeOrText::AppendText(tendril) => {
                // Merge into the parent's trailing text node when there is
                // one, as html5ever's own text handling expects.
                let text_handle = match dom.get_node(parent) {
                    PaDomNode::Text(_) => Some(parent.clone()),
                    _ => match dom
                        .children(parent)
                        .last()
                        .map(|handle| (handle, dom.get_node(handle)))
                    {
                        Some((last_child_handle, PaDomNode::Text(_))) => {
                            Some(last_child_handle.clone())
                        }
                        _ => None,
                    },
                };

                if let Some(text_handle) = text_handle {
                    if let PaDomNode::Text(p) = dom.get_mut_node(&text_handle) {
                        p.content += tendril.as_ref();
                    } else {
                        unreachable!(
                            "`text_handle` must map to a `PaDomNode::Text`"
                        )
                    }
                } else {
                    let new_handle = dom.add_node(PaDomNode::Text(PaNodeText {
                        content: tendril.as_ref().to_owned(),
                    }));
                    dom.attach_child(parent, new_handle);
                }
            }
        };
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        // Foster-parenting: before `element` when it is attached, otherwise
        // into `prev_element`.
        let element_has_parent = {
            let state = self.state.borrow();
            state.dom.parent_of(element).is_some()
        };
        if element_has_parent {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        _name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
        // Doctypes carry nothing this pipeline keeps.
    }

    fn mark_script_already_started(&self, _node: &Self::Handle) {
        // Scripts never execute here; there is no started flag to track.
    }

    fn pop(&self, _node: &Self::Handle) {
        // Nothing to do when an element closes.
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        // Template children belong in a separate contents fragment, not in
        // the template element's child list. The fragment stays detached,
        // so its subtree never appears under the document.
        let mut contents = self.template_contents.borrow_mut();
        if let Some((_, fragment)) =
            contents.iter().find(|(template, _)| template == target)
        {
            return fragment.clone();
        }
        let fragment = self.state.borrow_mut().dom.add_node(
            PaDomNode::Document(PaNodeDocument {
                children: Vec::new(),
            }),
        );
        contents.push((target.clone(), fragment.clone()));
        fragment
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        x == y
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {
        // Nothing to do here for now
    }

    fn append_before_sibling(
        &self,
        sibling: &Self::Handle,
        new_node: NodeOrText<Self::Handle>,
    ) {
        let dom = &mut self.state.borrow_mut().dom;
        let Some(parent) = dom.parent_of(sibling).cloned() else {
            return;
        };
        let Some(index) =
            dom.children(&parent).iter().position(|c| c == sibling)
        else {
            return;
        };
        match new_node {
            NodeOrText::AppendNode(child) => {
                dom.insert_child(&parent, index, child);
            }
            NodeOrText::AppendText(tendril) => {
                // Merge into the preceding text sibling when there is one.
                if index > 0 {
                    let previous = dom.children(&parent)[index - 1].clone();
                    if let PaDomNode::Text(p) = dom.get_mut_node(&previous) {
                        p.content += tendril.as_ref();
                        return;
                    }
                }
                let new_handle = dom.add_node(PaDomNode::Text(PaNodeText {
                    content: tendril.as_ref().to_owned(),
                }));
                dom.insert_child(&parent, index, new_handle);
            }
        }
    }

    fn add_attrs_if_missing(
        &self,
        target: &Self::Handle,
        attrs: Vec<Attribute>,
    ) {
        let dom = &mut self.state.borrow_mut().dom;
        if let PaDomNode::Container(node) = dom.get_mut_node(target) {
            let to_add: Vec<(String, String)> = attrs
                .iter()
                .filter(|attr| {
                    let attr_name = attr.name.local.as_ref();
                    !node.attrs.iter().any(|(name, _)| name == attr_name)
                })
                .map(|attr| {
                    (
                        attr.name.local.as_ref().to_owned(),
                        attr.value.as_ref().to_owned(),
                    )
                })
                .collect();
            node.attrs.extend(to_add);
        }
    }

    fn associate_with_form(
        &self,
        _target: &Self::Handle,
        _form: &Self::Handle,
        _nodes: (&Self::Handle, Option<&Self::Handle>),
    ) {
        // Forms are outside the allow-list; the association is meaningless
        // here.
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        self.state.borrow_mut().dom.detach(target);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let dom = &mut self.state.borrow_mut().dom;
        let moved = dom.take_children(node);
        for child in moved {
            dom.attach_child(new_parent, child);
        }
    }

    fn is_mathml_annotation_xml_integration_point(
        &self,
        _handle: &Self::Handle,
    ) -> bool {
        false
    }

    fn set_current_line(&self, _line_number: u64) {
        // Nothing to do here for now
    }

    fn complete_script(&self, _node: &Self::Handle) -> NextParserState {
        NextParserState::Continue
    }

    fn allow_declarative_shadow_roots(
        &self,
        _intended_parent: &Self::Handle,
    ) -> bool {
        false
    }

    fn attach_declarative_shadow(
        &self,
        _location: &Self::Handle,
        _template: &Self::Handle,
        _attrs: Vec<Attribute>,
    ) -> Result<(), String> {
        Err("declarative shadow roots are not supported".into())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// Render the reachable tree as a compact one-line string, e.g.
    /// `doc(html("a",b("c")))`. Garbage nodes never show up because the
    /// walk starts at the document.
    fn d(dom: &PaDom) -> String {
        fn write(dom: &PaDom, handle: &PaDomHandle, out: &mut String) {
            match dom.get_node(handle) {
                PaDomNode::Document(_) => {
                    out.push_str("doc(");
                    write_children(dom, handle, out);
                    out.push(')');
                }
                PaDomNode::Container(node) => {
                    out.push_str(node.tag());
                    if !node.attrs.is_empty() {
                        out.push('[');
                        for (i, (name, value)) in node.attrs.iter().enumerate()
                        {
                            if i > 0 {
                                out.push(' ');
                            }
                            out.push_str(name);
                            out.push('=');
                            out.push_str(value);
                        }
                        out.push(']');
                    }
                    out.push('(');
                    write_children(dom, handle, out);
                    out.push(')');
                }
                PaDomNode::Text(node) => {
                    out.push('"');
                    out.push_str(&node.content);
                    out.push('"');
                }
                PaDomNode::Discarded => out.push('#'),
            }
        }

        fn write_children(dom: &PaDom, handle: &PaDomHandle, out: &mut String) {
            for (i, child) in dom.children(handle).iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write(dom, child, out);
            }
        }

        let mut out = String::new();
        write(dom, dom.document_handle(), &mut out);
        out
    }

    fn parse(input: &str) -> PaDom {
        PaDomCreator::parse(input).unwrap_or_else(|err| err.dom)
    }

    #[test]
    fn parsing_an_empty_string_creates_an_empty_dom() {
        assert_eq!(d(&parse("")), "doc(html())");
    }

    #[test]
    fn parsing_a_text_snippet_creates_one_node() {
        assert_eq!(d(&parse("foo")), r#"doc(html("foo"))"#);
    }

    #[test]
    fn parsing_a_tag_creates_a_tag() {
        assert_eq!(d(&parse("<i></i>")), "doc(html(i()))");
    }

    #[test]
    fn parsing_two_tags_creates_two_tags() {
        assert_eq!(d(&parse("<i></i><b></b>")), "doc(html(i(),b()))");
    }

    #[test]
    fn parsing_nested_structures_produces_them() {
        assert_eq!(
            d(&parse("A<i>B<b>C</b>D</i>E")),
            r#"doc(html("A",i("B",b("C"),"D"),"E"))"#
        );
    }

    #[test]
    fn parsing_tags_with_attributes_preserves_them() {
        assert_eq!(
            d(&parse("<span class='foo'>txt</span>")),
            r#"doc(html(span[class=foo]("txt")))"#
        );
    }

    #[test]
    fn parsing_text_node_with_escaped_html_entities() {
        assert_eq!(
            d(&parse("aaa&lt;strong&gt;bbb&lt;/strong&gt;ccc")),
            r#"doc(html("aaa<strong>bbb</strong>ccc"))"#
        );
    }

    #[test]
    fn comments_parse_into_discarded_nodes() {
        assert_eq!(d(&parse("a<!-- note -->b")), r#"doc(html("a",#,"b"))"#);
    }

    #[test]
    fn unterminated_tags_are_repaired() {
        assert_eq!(
            d(&parse("<div><p>open")),
            r#"doc(html(div(p("open"))))"#
        );
    }

    #[test]
    fn stray_closing_tags_are_dropped() {
        assert_eq!(d(&parse("a</div>b")), r#"doc(html("ab"))"#);
    }

    #[test]
    fn misnested_formatting_is_repaired_by_the_adoption_agency() {
        // The classic case: the <b> is cloned into the paragraph and the
        // trailing text stays unformatted.
        assert_eq!(
            d(&parse("<b>1<p>2</b>3</p>")),
            r#"doc(html(b("1"),p(b("2"),"3")))"#
        );
    }

    #[test]
    fn table_text_is_foster_parented_before_the_table() {
        assert_eq!(
            d(&parse("<table>X<tr><td>Y</td></tr></table>")),
            r#"doc(html("X",table(tbody(tr(td("Y"))))))"#
        );
    }

    #[test]
    fn script_payload_parses_as_raw_text() {
        assert_eq!(
            d(&parse("<script>if (a < b) { go() }</script>")),
            r#"doc(html(script("if (a < b) { go() }")))"#
        );
    }

    #[test]
    fn templates_and_forms_parse_without_panicking() {
        assert_eq!(
            d(&parse("<template><p>x</p></template>")),
            "doc(html(template()))"
        );
        assert_eq!(
            d(&parse("<form><input></form>")),
            "doc(html(form(input())))"
        );
    }

    #[test]
    fn template_children_collect_in_a_detached_contents_fragment() {
        let dom = parse("<template><p>x</p></template>");
        let Some(p) = dom
            .nodes
            .iter()
            .position(|node| {
                matches!(node, PaDomNode::Container(c) if c.tag() == "p")
            })
            .map(PaDomHandle)
        else {
            panic!("expected the template's paragraph in the arena");
        };
        let Some(fragment) = dom.parent_of(&p) else {
            panic!("expected the paragraph to sit under a fragment");
        };
        assert_ne!(fragment, dom.document_handle());
        assert!(matches!(dom.get_node(fragment), PaDomNode::Document(_)));
        assert_eq!(dom.text_content(fragment), "x");
    }

    #[test]
    fn doctypes_are_ignored() {
        assert_eq!(d(&parse("<!DOCTYPE html>hi")), r#"doc(html("hi"))"#);
    }
}
