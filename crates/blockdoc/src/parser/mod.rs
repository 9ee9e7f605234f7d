// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! HTML to block conversion.
//!
//! [`parse_html_to_blocks`] sanitizes its input, parses the clean markup and
//! walks the tree's top level, classifying every node into blocks. The
//! classifier is a closed match over [`TagKind`]: each recognized element
//! maps to one extraction rule, transparent containers recurse, and anything
//! unrecognized falls back to a paragraph carrying its inner markup. The
//! walk never fails; hostile or malformed input degrades to fewer blocks.

mod plain_text;

pub use plain_text::parse_plain_text_to_blocks;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::blocks::{Block, BlockContent, HeadingLevel, ImageWidth};
use crate::dom::serializer::{inner_markup, inner_markup_excluding, outer_markup};
use crate::dom::{
    PaDom, PaDomCreator, PaDomHandle, PaDomNode, PaNodeContainer,
    MAX_TREE_DEPTH,
};
use crate::sanitize::sanitize;

/// Language recorded for parsed code blocks whose class carries no hint.
const FALLBACK_LANGUAGE: &str = "plaintext";

/// Matches `language-*`, `lang-*` and `highlight-*` class tokens; capture 1
/// is the language identifier.
static LANGUAGE_CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:language|lang|highlight)-(\w+)").expect("valid regex")
});

/// Convert untrusted HTML into an ordered list of blocks.
///
/// The input is sanitized first, so no disallowed markup survives into any
/// block's content. Blocks that end up empty are dropped from the result.
pub fn parse_html_to_blocks(html: &str) -> Vec<Block> {
    if html.trim().is_empty() {
        return Vec::new();
    }
    let clean = sanitize(html);
    let dom = PaDomCreator::parse(&clean).unwrap_or_else(|err| err.dom);
    let mut blocks = Vec::new();
    for child in dom.top_level_children() {
        collect_blocks(&dom, &child, 0, &mut blocks);
    }
    blocks.retain(|block| !block.is_empty());
    blocks
}

// ─── Classification ──────────────────────────────────────────────────────────

/// What the walk does with an element, decided from its tag name alone.
enum TagKind {
    Heading(HeadingLevel),
    Paragraph,
    Quote,
    /// `pre`: a code block, optionally carrying a `code` child.
    Pre,
    /// `code` outside any `pre`: kept inline, wrapped as a paragraph.
    InlineCode,
    Divider,
    Image,
    Figure,
    Table,
    /// `ul`/`ol`: the whole list is one paragraph of verbatim markup.
    List,
    /// Transparent wrappers whose children splice into the parent's output.
    Container,
    /// Inline formatting promoted to a paragraph when it appears at block
    /// level.
    Inline,
    LineBreak,
    Other,
}

impl TagKind {
    fn classify(tag: &str) -> TagKind {
        match tag {
            "h1" => TagKind::Heading(HeadingLevel::H1),
            "h2" => TagKind::Heading(HeadingLevel::H2),
            "h3" => TagKind::Heading(HeadingLevel::H3),
            // No heading level below h3 exists in the model.
            "h4" | "h5" | "h6" => TagKind::Heading(HeadingLevel::H3),
            "p" => TagKind::Paragraph,
            "blockquote" => TagKind::Quote,
            "pre" => TagKind::Pre,
            "code" => TagKind::InlineCode,
            "hr" => TagKind::Divider,
            "img" => TagKind::Image,
            "figure" => TagKind::Figure,
            "table" => TagKind::Table,
            "ul" | "ol" => TagKind::List,
            "div" | "section" | "article" | "main" => TagKind::Container,
            "span" | "a" | "strong" | "em" | "b" | "i" | "u" => TagKind::Inline,
            "br" => TagKind::LineBreak,
            _ => TagKind::Other,
        }
    }
}

fn collect_blocks(
    dom: &PaDom,
    handle: &PaDomHandle,
    depth: usize,
    out: &mut Vec<Block>,
) {
    if depth > MAX_TREE_DEPTH {
        return;
    }
    match dom.get_node(handle) {
        PaDomNode::Text(node) => {
            let trimmed = node.content.trim();
            if !trimmed.is_empty() {
                out.push(Block::new_paragraph(html_escape::encode_text(
                    trimmed,
                )));
            }
        }
        PaDomNode::Container(node) => {
            classify_element(dom, handle, node, depth, out);
        }
        PaDomNode::Document(_) | PaDomNode::Discarded => {}
    }
}

fn classify_element(
    dom: &PaDom,
    handle: &PaDomHandle,
    node: &PaNodeContainer,
    depth: usize,
    out: &mut Vec<Block>,
) {
    match TagKind::classify(node.tag()) {
        TagKind::Heading(level) => {
            out.push(Block::new_heading(level, inner_markup(dom, handle)));
        }
        TagKind::Paragraph => {
            out.push(Block::new_paragraph(inner_markup(dom, handle)));
        }
        TagKind::Quote => {
            let (content, attribution) = split_attribution(dom, handle);
            out.push(Block::new(BlockContent::Quote {
                content,
                attribution,
            }));
        }
        TagKind::Pre => {
            let (code, language) = code_and_language(dom, handle, node);
            out.push(Block::new(BlockContent::Code { code, language }));
        }
        TagKind::InlineCode => {
            if !inner_markup(dom, handle).trim().is_empty() {
                out.push(Block::new_paragraph(outer_markup(dom, handle)));
            }
        }
        TagKind::Divider => out.push(Block::new_divider()),
        TagKind::Image => out.extend(image_block(node)),
        TagKind::Figure => match figure_image_block(dom, handle) {
            Some(block) => out.push(block),
            // No usable image: treat the figure like a plain container.
            None => {
                for child in dom.children(handle) {
                    collect_blocks(dom, child, depth + 1, out);
                }
            }
        },
        TagKind::Table => table_rows(dom, handle, out),
        TagKind::List => {
            out.push(Block::new_paragraph(outer_markup(dom, handle)));
        }
        TagKind::Container => {
            for child in dom.children(handle) {
                collect_blocks(dom, child, depth + 1, out);
            }
        }
        TagKind::Inline => {
            if !inner_markup(dom, handle).trim().is_empty() {
                out.push(Block::new_paragraph(outer_markup(dom, handle)));
            }
        }
        TagKind::LineBreak => {}
        TagKind::Other => {
            let markup = inner_markup(dom, handle);
            if !markup.trim().is_empty() {
                out.push(Block::new_paragraph(markup));
            }
        }
    }
}

// ─── Extraction rules ────────────────────────────────────────────────────────

/// Inner markup of a blockquote with its citation element lifted out.
///
/// The first `cite` or `footer` descendant supplies the attribution text
/// and is excluded from the returned content either way; the tree itself is
/// left untouched.
fn split_attribution(
    dom: &PaDom,
    handle: &PaDomHandle,
) -> (String, Option<String>) {
    match dom.find_first(handle, &["cite", "footer"]) {
        Some(citation) => {
            let content = inner_markup_excluding(dom, handle, &citation);
            let attribution = dom.text_content(&citation).trim().to_owned();
            (content, (!attribution.is_empty()).then_some(attribution))
        }
        None => (inner_markup(dom, handle), None),
    }
}

/// Code body and language of a `pre` element. A nested `code` child wins;
/// otherwise the `pre`'s own text and class attribute are used.
fn code_and_language(
    dom: &PaDom,
    handle: &PaDomHandle,
    node: &PaNodeContainer,
) -> (String, String) {
    let (code, class) = match dom.find_first(handle, &["code"]) {
        Some(code_el) => {
            let class = match dom.get_node(&code_el) {
                PaDomNode::Container(code_node) => {
                    code_node.get_attr("class").map(str::to_owned)
                }
                _ => None,
            };
            (dom.text_content(&code_el), class)
        }
        None => (
            dom.text_content(handle),
            node.get_attr("class").map(str::to_owned),
        ),
    };
    let language = class
        .as_deref()
        .and_then(language_from_class)
        .unwrap_or(FALLBACK_LANGUAGE)
        .to_owned();
    (code, language)
}

fn language_from_class(class: &str) -> Option<&str> {
    LANGUAGE_CLASS
        .captures(class)
        .and_then(|captures| captures.get(1))
        .map(|capture| capture.as_str())
}

/// data: URIs and absolute http/https URLs qualify; everything else drops
/// the image.
fn is_valid_image_url(src: &str) -> bool {
    match Url::parse(src) {
        Ok(url) => matches!(url.scheme(), "http" | "https" | "data"),
        Err(_) => false,
    }
}

fn image_block(node: &PaNodeContainer) -> Option<Block> {
    let src = node.get_attr("src")?;
    if !is_valid_image_url(src) {
        return None;
    }
    Some(Block::new(BlockContent::Image {
        src: src.to_owned(),
        alt: node.get_attr("alt").unwrap_or_default().to_owned(),
        caption: None,
        width: ImageWidth::default(),
    }))
}

/// The single image block a figure collapses to, when it holds at least one
/// image with a usable source. A non-empty `figcaption` becomes the caption.
fn figure_image_block(dom: &PaDom, handle: &PaDomHandle) -> Option<Block> {
    let mut block = dom
        .find_all(handle, "img")
        .into_iter()
        .find_map(|img| match dom.get_node(&img) {
            PaDomNode::Container(node) => image_block(node),
            _ => None,
        })?;
    let caption = dom
        .find_first(handle, &["figcaption"])
        .map(|figcaption| dom.text_content(&figcaption).trim().to_owned())
        .filter(|text| !text.is_empty());
    if let BlockContent::Image { caption: slot, .. } = &mut block.content {
        *slot = caption;
    }
    Some(block)
}

/// Tables flatten to one paragraph per row: the trimmed text of the row's
/// cells, empty cells dropped, survivors joined with `" | "`. Rows with no
/// surviving cell produce nothing.
fn table_rows(dom: &PaDom, handle: &PaDomHandle, out: &mut Vec<Block>) {
    for row in dom.find_all(handle, "tr") {
        let mut cells = Vec::new();
        for cell in dom.children(&row) {
            if let PaDomNode::Container(node) = dom.get_node(cell) {
                if matches!(node.tag(), "th" | "td") {
                    let text = dom.text_content(cell);
                    let text = text.trim();
                    if !text.is_empty() {
                        cells.push(
                            html_escape::encode_text(text).into_owned(),
                        );
                    }
                }
            }
        }
        if !cells.is_empty() {
            out.push(Block::new_paragraph(cells.join(" | ")));
        }
    }
}
