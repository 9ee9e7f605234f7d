// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Plain text to block conversion, the fallback when a paste or import
//! carries no HTML payload.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::blocks::Block;
use crate::escape::escape_html;

/// A blank line: two newline sequences, each optionally preceded by a
/// carriage return.
static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r?\n\r?\n").expect("valid regex"));

static LINE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r?\n").expect("valid regex"));

/// Convert plain clipboard text into paragraph blocks.
///
/// Blank lines separate paragraphs; remaining single newlines become `<br>`
/// tags. Text is entity-escaped before the tags go in, so the breaks
/// survive as markup while the surrounding text cannot.
pub fn parse_plain_text_to_blocks(text: &str) -> Vec<Block> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    PARAGRAPH_BREAK
        .split(text)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let escaped = escape_html(segment);
            let content = LINE_BREAK.replace_all(&escaped, "<br>");
            Block::new_paragraph(content)
        })
        .collect()
}
