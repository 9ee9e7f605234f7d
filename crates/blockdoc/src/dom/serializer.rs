// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Verbatim markup writer over a [`PaDom`] subtree.
//!
//! Used by the block parser to lift rich-text content fields out of the
//! sanitized tree. Text and attribute values are re-escaped on the way out,
//! so the produced fragments are well-formed regardless of what entities the
//! source spelled them with.

use super::{PaDom, PaDomHandle, PaDomNode, MAX_TREE_DEPTH};

pub(crate) fn is_void_tag(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Markup of `handle`'s children.
pub(crate) fn inner_markup(dom: &PaDom, handle: &PaDomHandle) -> String {
    let mut out = String::new();
    write_children(dom, handle, None, 0, &mut out);
    out
}

/// Markup of `handle`'s children, with the `excluded` subtree left out.
pub(crate) fn inner_markup_excluding(
    dom: &PaDom,
    handle: &PaDomHandle,
    excluded: &PaDomHandle,
) -> String {
    let mut out = String::new();
    write_children(dom, handle, Some(excluded), 0, &mut out);
    out
}

/// Markup of `handle` itself, children included.
pub(crate) fn outer_markup(dom: &PaDom, handle: &PaDomHandle) -> String {
    let mut out = String::new();
    write_node(dom, handle, None, 0, &mut out);
    out
}

fn write_children(
    dom: &PaDom,
    handle: &PaDomHandle,
    excluded: Option<&PaDomHandle>,
    depth: usize,
    out: &mut String,
) {
    for child in dom.children(handle) {
        write_node(dom, child, excluded, depth, out);
    }
}

fn write_node(
    dom: &PaDom,
    handle: &PaDomHandle,
    excluded: Option<&PaDomHandle>,
    depth: usize,
    out: &mut String,
) {
    if depth > MAX_TREE_DEPTH || excluded == Some(handle) {
        return;
    }
    match dom.get_node(handle) {
        PaDomNode::Text(node) => {
            out.push_str(&html_escape::encode_text(&node.content));
        }
        PaDomNode::Container(node) => {
            let tag = node.tag();
            out.push('<');
            out.push_str(tag);
            for (name, value) in &node.attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&html_escape::encode_double_quoted_attribute(
                    value,
                ));
                out.push('"');
            }
            if is_void_tag(tag) {
                out.push_str(" />");
            } else {
                out.push('>');
                write_children(dom, handle, excluded, depth + 1, out);
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
        PaDomNode::Document(_) | PaDomNode::Discarded => {}
    }
}
