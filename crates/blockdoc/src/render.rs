// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Block to HTML rendering for preview and export.
//!
//! Each variant maps to a fixed template under `doc-*` styling hooks.
//! Rich-text content fields are emitted verbatim (they were sanitized at
//! ingestion); everything the renderer inserts itself, attribute values,
//! captions, attributions, code text, is entity-escaped here. Container
//! blocks resolve their children through a caller-supplied lookup so the
//! renderer never needs the whole document.

use crate::blocks::{Alignment, Block, BlockContent, BlockId, ColumnLayout};
use crate::document::Document;
use crate::dom::MAX_TREE_DEPTH;
use crate::escape::escape_html;

/// Render one block to HTML.
///
/// `resolve_block` supplies the blocks a `columns` payload references; ids
/// it cannot resolve are skipped silently.
pub fn block_to_html<'a, F>(block: &Block, resolve_block: &F) -> String
where
    F: Fn(&BlockId) -> Option<&'a Block>,
{
    render_block(block, resolve_block, 0)
}

/// Render every root block of `document`, joined with newlines. An empty
/// document renders to the empty string.
pub fn document_to_html(document: &Document) -> String {
    document
        .root_block_ids
        .iter()
        .filter_map(|id| document.block(id))
        .map(|block| block_to_html(block, &|id| document.block(id)))
        .filter(|html| !html.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_block<'a, F>(block: &Block, resolve_block: &F, depth: usize) -> String
where
    F: Fn(&BlockId) -> Option<&'a Block>,
{
    if depth > MAX_TREE_DEPTH {
        return String::new();
    }
    match &block.content {
        BlockContent::Paragraph { content, alignment } => {
            format!(
                "<p class=\"doc-paragraph\"{}>{content}</p>",
                alignment_style(*alignment)
            )
        }
        BlockContent::Heading {
            content,
            level,
            alignment,
        } => {
            format!(
                "<{level} class=\"doc-heading\"{}>{content}</{level}>",
                alignment_style(*alignment)
            )
        }
        BlockContent::Quote {
            content,
            attribution,
        } => {
            let mut html =
                format!("<blockquote class=\"doc-quote\">{content}");
            if let Some(attribution) = attribution {
                html.push_str(&format!(
                    "<cite class=\"doc-quote-attribution\">— {}</cite>",
                    escape_html(attribution)
                ));
            }
            html.push_str("</blockquote>");
            html
        }
        BlockContent::Image {
            src,
            alt,
            caption,
            width,
        } => {
            let mut html = format!(
                "<figure class=\"doc-image doc-image--{width}\">\
                 <img src=\"{}\" alt=\"{}\" />",
                escape_html(src),
                escape_html(alt)
            );
            if let Some(caption) = caption {
                html.push_str(&format!(
                    "<figcaption class=\"doc-image-caption\">{}</figcaption>",
                    escape_html(caption)
                ));
            }
            html.push_str("</figure>");
            html
        }
        BlockContent::Code { code, language } => {
            format!(
                "<pre class=\"doc-code\"><code class=\"language-{}\">{}</code></pre>",
                escape_html(language),
                escape_html(code)
            )
        }
        BlockContent::Divider { style } => {
            format!("<hr class=\"doc-divider doc-divider--{style}\" />")
        }
        BlockContent::Callout {
            content,
            variant,
            emoji,
        } => {
            let mut html =
                format!("<aside class=\"doc-callout doc-callout--{variant}\">");
            if let Some(emoji) = emoji {
                html.push_str(&format!(
                    "<span class=\"doc-callout-emoji\">{}</span>",
                    escape_html(emoji)
                ));
            }
            html.push_str(content);
            html.push_str("</aside>");
            html
        }
        BlockContent::Columns { layout, columns } => {
            render_columns(layout, columns, resolve_block, depth)
        }
    }
}

fn render_columns<'a, F>(
    layout: &ColumnLayout,
    columns: &[Vec<BlockId>],
    resolve_block: &F,
    depth: usize,
) -> String
where
    F: Fn(&BlockId) -> Option<&'a Block>,
{
    let weights = layout.weights();
    let total: u32 = weights.iter().sum();
    let mut html =
        String::from("<div class=\"doc-columns\" style=\"display:flex\">");
    for (index, cell) in columns.iter().enumerate() {
        let weight = weights.get(index).copied().unwrap_or(1);
        // Full precision on purpose; consumers key off the exact string.
        let share = f64::from(weight) / f64::from(total) * 100.0;
        html.push_str(&format!(
            "<div class=\"doc-column\" style=\"flex-basis:{share}%\">"
        ));
        if cell.is_empty() {
            html.push_str(
                "<span class=\"doc-column-placeholder\">empty column</span>",
            );
        } else {
            for id in cell {
                if let Some(child) = resolve_block(id) {
                    html.push_str(&render_block(
                        child,
                        resolve_block,
                        depth + 1,
                    ));
                }
            }
        }
        html.push_str("</div>");
    }
    html.push_str("</div>");
    html
}

fn alignment_style(alignment: Alignment) -> String {
    match alignment {
        Alignment::Left => String::new(),
        Alignment::Center | Alignment::Right => {
            format!(" style=\"text-align:{alignment}\"")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{CalloutVariant, DividerStyle, HeadingLevel};
    use std::collections::HashMap;

    /// Resolver over no blocks, for leaf variants.
    fn no_children(_id: &BlockId) -> Option<&'static Block> {
        None
    }

    #[test]
    fn paragraph_renders_with_its_content() {
        let block = Block::new_paragraph("Hello <strong>there</strong>");
        assert_eq!(
            block_to_html(&block, &no_children),
            "<p class=\"doc-paragraph\">Hello <strong>there</strong></p>"
        );
    }

    #[test]
    fn aligned_paragraphs_get_a_style_attribute() {
        let mut block = Block::new_paragraph("x");
        let BlockContent::Paragraph { alignment, .. } = &mut block.content
        else {
            unreachable!();
        };
        *alignment = Alignment::Center;
        assert_eq!(
            block_to_html(&block, &no_children),
            "<p class=\"doc-paragraph\" style=\"text-align:center\">x</p>"
        );
    }

    #[test]
    fn heading_uses_its_level_tag() {
        let block = Block::new_heading(HeadingLevel::H2, "Title");
        assert_eq!(
            block_to_html(&block, &no_children),
            "<h2 class=\"doc-heading\">Title</h2>"
        );
    }

    #[test]
    fn quote_with_attribution_appends_a_cite() {
        let block = Block::new(BlockContent::Quote {
            content: "<p>Wisdom</p>".to_owned(),
            attribution: Some("Sage & Co".to_owned()),
        });
        assert_eq!(
            block_to_html(&block, &no_children),
            "<blockquote class=\"doc-quote\"><p>Wisdom</p>\
             <cite class=\"doc-quote-attribution\">— Sage &amp; Co</cite>\
             </blockquote>"
        );
    }

    #[test]
    fn quote_without_attribution_has_no_cite() {
        let block = Block::new_quote("words");
        assert_eq!(
            block_to_html(&block, &no_children),
            "<blockquote class=\"doc-quote\">words</blockquote>"
        );
    }

    #[test]
    fn image_escapes_src_alt_and_caption() {
        let block = Block::new(BlockContent::Image {
            src: "https://example.com/a.png?x=1&y=2".to_owned(),
            alt: "a \"quoted\" alt".to_owned(),
            caption: Some("Fig <1>".to_owned()),
            width: crate::blocks::ImageWidth::Medium,
        });
        assert_eq!(
            block_to_html(&block, &no_children),
            "<figure class=\"doc-image doc-image--medium\">\
             <img src=\"https://example.com/a.png?x=1&amp;y=2\" \
             alt=\"a &quot;quoted&quot; alt\" />\
             <figcaption class=\"doc-image-caption\">Fig &lt;1&gt;</figcaption>\
             </figure>"
        );
    }

    #[test]
    fn code_escapes_body_and_language() {
        let block = Block::new(BlockContent::Code {
            code: "if (a < b && c > d) {}".to_owned(),
            language: "js".to_owned(),
        });
        assert_eq!(
            block_to_html(&block, &no_children),
            "<pre class=\"doc-code\"><code class=\"language-js\">\
             if (a &lt; b &amp;&amp; c &gt; d) {}</code></pre>"
        );
    }

    #[test]
    fn divider_styles_map_to_modifier_classes() {
        let block = Block::new(BlockContent::Divider {
            style: DividerStyle::Dashed,
        });
        assert_eq!(
            block_to_html(&block, &no_children),
            "<hr class=\"doc-divider doc-divider--dashed\" />"
        );
    }

    #[test]
    fn callout_renders_variant_and_emoji() {
        let block = Block::new(BlockContent::Callout {
            content: "Watch out".to_owned(),
            variant: CalloutVariant::Warning,
            emoji: Some("\u{26a0}\u{fe0f}".to_owned()),
        });
        assert_eq!(
            block_to_html(&block, &no_children),
            "<aside class=\"doc-callout doc-callout--warning\">\
             <span class=\"doc-callout-emoji\">\u{26a0}\u{fe0f}</span>\
             Watch out</aside>"
        );
    }

    #[test]
    fn callout_without_emoji_has_no_span() {
        let block =
            Block::new_callout(CalloutVariant::Info, "plain note");
        assert_eq!(
            block_to_html(&block, &no_children),
            "<aside class=\"doc-callout doc-callout--info\">plain note</aside>"
        );
    }

    // ===================================================================
    // Columns
    // ===================================================================

    fn columns_fixture(
        layout: ColumnLayout,
        cells: Vec<Vec<Block>>,
    ) -> (Block, HashMap<BlockId, Block>) {
        let mut table = HashMap::new();
        let mut columns = Vec::new();
        for cell in cells {
            let mut ids = Vec::new();
            for child in cell {
                ids.push(child.id);
                table.insert(child.id, child);
            }
            columns.push(ids);
        }
        (Block::new(BlockContent::Columns { layout, columns }), table)
    }

    #[test]
    fn columns_split_flex_basis_by_weight() {
        let (block, table) = columns_fixture(
            ColumnLayout::OneTwo,
            vec![
                vec![Block::new_paragraph("left")],
                vec![Block::new_paragraph("right")],
            ],
        );
        let html = block_to_html(&block, &|id| table.get(id));
        assert!(html.starts_with(
            "<div class=\"doc-columns\" style=\"display:flex\">"
        ));
        assert!(html.contains("flex-basis:33.33333333333333%"));
        assert!(html.contains("flex-basis:66.66666666666666%"));
        assert!(html.contains(
            "<p class=\"doc-paragraph\">left</p>"
        ));
        assert!(html.contains(
            "<p class=\"doc-paragraph\">right</p>"
        ));
    }

    #[test]
    fn equal_columns_get_round_shares() {
        let (block, table) = columns_fixture(
            ColumnLayout::OneOne,
            vec![
                vec![Block::new_paragraph("a")],
                vec![Block::new_paragraph("b")],
            ],
        );
        let html = block_to_html(&block, &|id| table.get(id));
        assert_eq!(html.matches("flex-basis:50%").count(), 2);
    }

    #[test]
    fn three_columns_each_get_a_third() {
        let (block, table) =
            columns_fixture(ColumnLayout::OneOneOne, vec![vec![], vec![], vec![]]);
        let html = block_to_html(&block, &|id| table.get(id));
        assert_eq!(
            html.matches("flex-basis:33.33333333333333%").count(),
            3
        );
    }

    #[test]
    fn empty_columns_get_a_placeholder() {
        let (block, table) = columns_fixture(
            ColumnLayout::OneOne,
            vec![vec![Block::new_paragraph("content")], vec![]],
        );
        let html = block_to_html(&block, &|id| table.get(id));
        assert_eq!(
            html.matches("<span class=\"doc-column-placeholder\">empty column</span>")
                .count(),
            1
        );
    }

    #[test]
    fn dangling_ids_are_skipped_not_placeholdered() {
        let stray = Block::new_paragraph("never stored");
        let (block, table) =
            columns_fixture(ColumnLayout::OneOne, vec![vec![stray], vec![]]);
        let mut table = table;
        table.clear();
        let html = block_to_html(&block, &|id| table.get(id));
        // First cell is non-empty but resolves to nothing: no placeholder,
        // no content.
        assert_eq!(html.matches("doc-column-placeholder").count(), 1);
        assert!(!html.contains("never stored"));
    }

    #[test]
    fn self_referential_columns_terminate() {
        let mut block = Block::new_columns(ColumnLayout::OneOne);
        let id = block.id;
        let BlockContent::Columns { columns, .. } = &mut block.content else {
            unreachable!();
        };
        columns[0].push(id);
        let mut table = HashMap::new();
        table.insert(id, block.clone());
        // Renders to a finite string instead of recursing forever.
        let html = block_to_html(&block, &|id| table.get(id));
        assert!(html.len() < 1_000_000);
    }

    // ===================================================================
    // Documents
    // ===================================================================

    #[test]
    fn document_to_html_joins_root_blocks_with_newlines() {
        let mut doc = Document::new("demo");
        doc.insert_blocks(
            vec![
                Block::new_heading(HeadingLevel::H1, "Title"),
                Block::new_paragraph("Body"),
            ],
            crate::document::InsertPosition::AtEnd,
        );
        assert_eq!(
            doc.to_html(),
            "<h1 class=\"doc-heading\">Title</h1>\n\
             <p class=\"doc-paragraph\">Body</p>"
        );
    }

    #[test]
    fn empty_documents_render_to_the_empty_string() {
        let doc = Document::new("empty");
        assert_eq!(document_to_html(&doc), "");
    }

    #[test]
    fn missing_root_ids_are_skipped() {
        let mut doc = Document::new("broken");
        doc.insert_blocks(
            vec![Block::new_paragraph("kept")],
            crate::document::InsertPosition::AtEnd,
        );
        doc.root_block_ids.push(uuid::Uuid::new_v4());
        assert_eq!(
            document_to_html(&doc),
            "<p class=\"doc-paragraph\">kept</p>"
        );
    }
}
