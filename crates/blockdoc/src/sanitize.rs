// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Allow-list HTML sanitizer.
//!
//! Pasted markup is parsed with html5ever and re-serialized keeping only the
//! tags and attributes on the allow-lists below. Everything else is dropped
//! with its entire subtree, so a `<script>` never contributes payload text to
//! the output. The result feeds the block parser and may also be handed
//! straight to a rendering surface, which is why the pass has to be
//! idempotent: sanitizing already-clean markup must change nothing.

use crate::dom::serializer::is_void_tag;
use crate::dom::{PaDom, PaDomCreator, PaDomHandle, PaDomNode, PaNodeContainer, MAX_TREE_DEPTH};

fn is_allowed_tag(tag: &str) -> bool {
    matches!(
        tag,
        // Structural
        "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "blockquote" | "pre"
            | "code" | "hr" | "br"
            // Lists
            | "ul" | "ol" | "li"
            // Inline formatting
            | "strong" | "em" | "b" | "i" | "u" | "s" | "strike" | "sub"
            | "sup" | "mark" | "span"
            // Links and media
            | "a" | "img" | "figure" | "figcaption"
            // Tables
            | "table" | "thead" | "tbody" | "tr" | "th" | "td"
            // Semantic wrappers
            | "cite" | "footer" | "div" | "section" | "article" | "main"
    )
}

fn is_allowed_attribute(name: &str) -> bool {
    matches!(
        name,
        "href"
            | "src"
            | "alt"
            | "title"
            | "class"
            | "id"
            | "target"
            | "rel"
            | "width"
            | "height"
    )
}

/// True if the value resolves to a `javascript:` URL once the whitespace and
/// control characters browsers ignore inside schemes are removed.
fn has_javascript_scheme(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect();
    compact.to_lowercase().starts_with("javascript:")
}

/// Attributes of `node` that survive sanitization, in source order.
/// Links opening a new tab get `rel="noopener"` added unless a rel token
/// already carries it.
fn clean_attributes(node: &PaNodeContainer) -> Vec<(String, String)> {
    let mut attrs: Vec<(String, String)> = node
        .attrs
        .iter()
        .filter(|(name, _value)| is_allowed_attribute(name))
        .filter(|(name, value)| {
            !(matches!(name.as_str(), "href" | "src")
                && has_javascript_scheme(value))
        })
        .cloned()
        .collect();

    if node.tag() == "a"
        && attrs.iter().any(|(name, value)| {
            name == "target" && value == "_blank"
        })
    {
        match attrs.iter_mut().find(|(name, _value)| name == "rel") {
            Some((_name, rel)) => {
                if !rel.split_ascii_whitespace().any(|token| token == "noopener") {
                    if rel.trim().is_empty() {
                        *rel = "noopener".to_owned();
                    } else {
                        rel.push_str(" noopener");
                    }
                }
            }
            None => attrs.push(("rel".to_owned(), "noopener".to_owned())),
        }
    }

    attrs
}

fn write_clean_node(
    dom: &PaDom,
    handle: &PaDomHandle,
    depth: usize,
    out: &mut String,
) {
    if depth > MAX_TREE_DEPTH {
        return;
    }
    match dom.get_node(handle) {
        PaDomNode::Text(node) => {
            out.push_str(&html_escape::encode_text(&node.content));
        }
        PaDomNode::Container(node) => {
            let tag = node.tag();
            if !is_allowed_tag(tag) {
                // The subtree goes with it. Unwrapping would leak payload
                // text of elements like script and style.
                return;
            }
            out.push('<');
            out.push_str(tag);
            for (name, value) in clean_attributes(node) {
                out.push(' ');
                out.push_str(&name);
                out.push_str("=\"");
                out.push_str(&html_escape::encode_double_quoted_attribute(
                    &value,
                ));
                out.push('"');
            }
            if is_void_tag(tag) {
                out.push_str(" />");
            } else {
                out.push('>');
                for child in dom.children(handle) {
                    write_clean_node(dom, child, depth + 1, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
        PaDomNode::Document(_) | PaDomNode::Discarded => {}
    }
}

/// Reduce untrusted HTML to the allow-listed subset.
///
/// Unknown tags are dropped with their whole subtree, disallowed attributes
/// and `javascript:` URLs are stripped, and `target="_blank"` links gain
/// `rel="noopener"`. Empty and whitespace-only input is returned unchanged.
pub fn sanitize(html: &str) -> String {
    if html.trim().is_empty() {
        return html.to_owned();
    }
    let dom = PaDomCreator::parse(html).unwrap_or_else(|err| err.dom);
    let mut clean = String::new();
    for child in dom.top_level_children() {
        write_clean_node(&dom, &child, 0, &mut clean);
    }
    clean
}
