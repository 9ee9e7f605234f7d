// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Model code to power a block-based rich document editor.
//!
//! The crate converts between untrusted HTML and a strongly-typed block
//! document, in both directions:
//!
//! * [`sanitize`] reduces pasted markup to an allow-listed subset,
//! * [`parse_html_to_blocks`] classifies sanitized markup into [`Block`]s,
//! * [`parse_plain_text_to_blocks`] is the fallback for text-only pastes,
//! * [`block_to_html`] and [`document_to_html`] render blocks back out for
//!   preview and export.
//!
//! All four operations are pure, synchronous and total: malformed, hostile
//! or garbage input degrades to fewer blocks, never to an error. The
//! [`Document`] type owns all blocks and offers the mutation API the
//! surrounding editor calls into.
//!
//! ```
//! use blockdoc::{parse_html_to_blocks, Document, InsertPosition};
//!
//! let blocks = parse_html_to_blocks("<h1>Trip notes</h1><p>Day one.</p>");
//! assert_eq!(blocks.len(), 2);
//!
//! let mut doc = Document::new("Notes");
//! doc.insert_blocks(blocks, InsertPosition::AtEnd);
//! assert!(doc.to_html().starts_with("<h1 class=\"doc-heading\">"));
//! ```

mod blocks;
mod document;
mod dom;
mod escape;
mod parser;
mod render;
mod sanitize;

pub use blocks::{
    Alignment, Block, BlockContent, BlockId, CalloutVariant, ColumnLayout,
    DividerStyle, HeadingLevel, ImageWidth, DEFAULT_CODE_LANGUAGE,
};
pub use document::{Document, InsertPosition};
pub use parser::{parse_html_to_blocks, parse_plain_text_to_blocks};
pub use render::{block_to_html, document_to_html};
pub use sanitize::sanitize;
