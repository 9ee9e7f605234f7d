// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Block entities.
//!
//! A document is a flat table of [`Block`]s plus ordering information; the
//! variants here are the eight content kinds the pipeline understands. Ids
//! are minted once at construction and never reassigned, so collaborators
//! can hold on to them across edits.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use uuid::Uuid;

/// Language assigned to code blocks created directly in the editor. Code
/// parsed from HTML falls back to `"plaintext"` instead.
pub const DEFAULT_CODE_LANGUAGE: &str = "typescript";

pub type BlockId = Uuid;

// ─── Field enums ─────────────────────────────────────────────────────────────

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Heading levels the model keeps. Deeper source headings are clamped to
/// [`HeadingLevel::H3`] on the way in.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HeadingLevel {
    #[default]
    H1,
    H2,
    H3,
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ImageWidth {
    Small,
    Medium,
    Large,
    #[default]
    Full,
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DividerStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CalloutVariant {
    #[default]
    Info,
    Warning,
    Success,
    Error,
}

/// Column ratio of a columns block, as the `"1-2"` style tokens the editor
/// surfaces use.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
pub enum ColumnLayout {
    #[default]
    #[serde(rename = "1-1")]
    #[strum(serialize = "1-1")]
    OneOne,
    #[serde(rename = "1-2")]
    #[strum(serialize = "1-2")]
    OneTwo,
    #[serde(rename = "2-1")]
    #[strum(serialize = "2-1")]
    TwoOne,
    #[serde(rename = "1-1-1")]
    #[strum(serialize = "1-1-1")]
    OneOneOne,
}

impl ColumnLayout {
    /// Relative flex weights, one per column.
    pub fn weights(&self) -> &'static [u32] {
        match self {
            ColumnLayout::OneOne => &[1, 1],
            ColumnLayout::OneTwo => &[1, 2],
            ColumnLayout::TwoOne => &[2, 1],
            ColumnLayout::OneOneOne => &[1, 1, 1],
        }
    }

    pub fn column_count(&self) -> usize {
        self.weights().len()
    }
}

// ─── Block ───────────────────────────────────────────────────────────────────

/// Variant payload of a block.
///
/// Rich-text `content` fields hold sanitized inline HTML fragments. `Code`
/// keeps its text raw; escaping happens at render time. `Columns` refers to
/// its children by id only, ownership stays with the document's block table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BlockContent {
    Paragraph {
        content: String,
        alignment: Alignment,
    },
    Heading {
        content: String,
        level: HeadingLevel,
        alignment: Alignment,
    },
    Image {
        src: String,
        alt: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
        width: ImageWidth,
    },
    Divider {
        style: DividerStyle,
    },
    Callout {
        content: String,
        variant: CalloutVariant,
        #[serde(skip_serializing_if = "Option::is_none")]
        emoji: Option<String>,
    },
    Code {
        code: String,
        language: String,
    },
    Quote {
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        attribution: Option<String>,
    },
    Columns {
        layout: ColumnLayout,
        columns: Vec<Vec<BlockId>>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    #[serde(flatten)]
    pub content: BlockContent,
}

impl Block {
    /// Wrap `content` with a freshly minted id.
    pub fn new(content: BlockContent) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
        }
    }

    pub fn new_paragraph(content: impl Into<String>) -> Self {
        Self::new(BlockContent::Paragraph {
            content: content.into(),
            alignment: Alignment::default(),
        })
    }

    pub fn new_heading(level: HeadingLevel, content: impl Into<String>) -> Self {
        Self::new(BlockContent::Heading {
            content: content.into(),
            level,
            alignment: Alignment::default(),
        })
    }

    pub fn new_image(src: impl Into<String>, alt: impl Into<String>) -> Self {
        Self::new(BlockContent::Image {
            src: src.into(),
            alt: alt.into(),
            caption: None,
            width: ImageWidth::default(),
        })
    }

    pub fn new_divider() -> Self {
        Self::new(BlockContent::Divider {
            style: DividerStyle::default(),
        })
    }

    pub fn new_callout(variant: CalloutVariant, content: impl Into<String>) -> Self {
        Self::new(BlockContent::Callout {
            content: content.into(),
            variant,
            emoji: None,
        })
    }

    pub fn new_code(code: impl Into<String>) -> Self {
        Self::new(BlockContent::Code {
            code: code.into(),
            language: DEFAULT_CODE_LANGUAGE.to_owned(),
        })
    }

    pub fn new_quote(content: impl Into<String>) -> Self {
        Self::new(BlockContent::Quote {
            content: content.into(),
            attribution: None,
        })
    }

    /// A columns block with one empty cell per column of `layout`.
    pub fn new_columns(layout: ColumnLayout) -> Self {
        Self::new(BlockContent::Columns {
            layout,
            columns: vec![Vec::new(); layout.column_count()],
        })
    }

    /// True for blocks the parser filters out of its results: no visible
    /// text, no image source, no populated column. Dividers always count as
    /// non-empty.
    pub fn is_empty(&self) -> bool {
        match &self.content {
            BlockContent::Paragraph { content, .. }
            | BlockContent::Heading { content, .. }
            | BlockContent::Callout { content, .. }
            | BlockContent::Quote { content, .. } => content.trim().is_empty(),
            BlockContent::Code { code, .. } => code.trim().is_empty(),
            BlockContent::Image { src, .. } => src.is_empty(),
            BlockContent::Columns { columns, .. } => {
                columns.iter().all(|column| column.is_empty())
            }
            BlockContent::Divider { .. } => false,
        }
    }
}
