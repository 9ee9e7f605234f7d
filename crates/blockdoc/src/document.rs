// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Document container and its mutation API.
//!
//! The document owns every block value in one flat table; ordering lives in
//! `root_block_ids` and in the cells of `columns` blocks, both of which hold
//! ids only. A block occupies exactly one positional slot at a time. The
//! mutation methods here are what the store collaborator calls when the user
//! pastes, drags or deletes; each one keeps the positional invariants intact
//! and refreshes `updated_at`.

use std::collections::{HashMap, HashSet};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::blocks::{Block, BlockContent, BlockId};

/// Milliseconds since the Unix epoch. A clock before the epoch reads as 0.
fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

/// Where a block lands in the root sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertPosition {
    AtEnd,
    /// Directly after the given block. An anchor that is not currently in
    /// the root sequence degrades to [`InsertPosition::AtEnd`].
    After(BlockId),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub blocks: HashMap<BlockId, Block>,
    pub root_block_ids: Vec<BlockId>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        let now = now_millis();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            blocks: HashMap::new(),
            root_block_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.get(id)
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.touch();
    }

    /// Render every root block to HTML, in order.
    pub fn to_html(&self) -> String {
        crate::render::document_to_html(self)
    }

    // ─── Mutations ───────────────────────────────────────────────────────

    /// Add `blocks` to the table and splice them into the root sequence at
    /// `position`, preserving their order. Ids referenced by an incoming
    /// `columns` payload belong to that block's cells and stay out of the
    /// root sequence.
    pub fn insert_blocks(&mut self, blocks: Vec<Block>, position: InsertPosition) {
        if blocks.is_empty() {
            return;
        }
        let column_owned: HashSet<BlockId> = blocks
            .iter()
            .filter_map(|block| match &block.content {
                BlockContent::Columns { columns, .. } => {
                    Some(columns.iter().flatten().copied())
                }
                _ => None,
            })
            .flatten()
            .collect();
        let root_ids: Vec<BlockId> = blocks
            .iter()
            .map(|block| block.id)
            .filter(|id| !column_owned.contains(id))
            .collect();

        let index = self.root_insert_index(&position);
        for block in blocks {
            self.blocks.insert(block.id, block);
        }
        self.root_block_ids.splice(index..index, root_ids);
        self.touch();
        self.assert_invariants();
    }

    pub fn insert_block(&mut self, block: Block, position: InsertPosition) -> BlockId {
        let id = block.id;
        self.insert_blocks(vec![block], position);
        id
    }

    /// Delete a block and purge its id from the root sequence and from
    /// every column cell. Removing a `columns` block removes the blocks its
    /// cells reference too, recursively. Returns false for an unknown id.
    pub fn remove_block(&mut self, id: &BlockId) -> bool {
        if !self.blocks.contains_key(id) {
            return false;
        }
        self.remove_block_and_children(id);
        self.prune_dangling_references();
        self.touch();
        self.assert_invariants();
        true
    }

    /// Move a block into the root sequence at `position`, clearing it from
    /// whatever slot holds it now (root or a column cell). Returns false
    /// for an unknown id.
    pub fn move_block(&mut self, id: &BlockId, position: InsertPosition) -> bool {
        if !self.blocks.contains_key(id) {
            return false;
        }
        self.clear_slot(id);
        let index = self.root_insert_index(&position);
        self.root_block_ids.insert(index, *id);
        self.touch();
        self.assert_invariants();
        true
    }

    /// Move a block into a cell of the given `columns` block, clearing it
    /// from its current slot. Refused (returns false) when either id is
    /// unknown, the target is not a columns block, the column index is out
    /// of range, or the move would make a block own itself.
    pub fn assign_to_column(
        &mut self,
        columns_id: &BlockId,
        column_index: usize,
        id: &BlockId,
    ) -> bool {
        if !self.blocks.contains_key(id) || self.owns_transitively(id, columns_id) {
            return false;
        }
        let valid_target = matches!(
            self.blocks.get(columns_id).map(|block| &block.content),
            Some(BlockContent::Columns { columns, .. })
                if column_index < columns.len()
        );
        if !valid_target {
            return false;
        }
        self.clear_slot(id);
        if let Some(block) = self.blocks.get_mut(columns_id) {
            if let BlockContent::Columns { columns, .. } = &mut block.content {
                columns[column_index].push(*id);
            }
        }
        self.touch();
        self.assert_invariants();
        true
    }

    /// Deep-copy a block under a fresh id and place the copy immediately
    /// after the original in the same slot. Blocks referenced by a
    /// `columns` payload are copied recursively with fresh ids of their
    /// own; dangling references are dropped rather than copied. Returns
    /// the copy's id, or `None` for an unknown id.
    pub fn duplicate_block(&mut self, id: &BlockId) -> Option<BlockId> {
        let original = self.blocks.get(id)?.clone();
        let copy = self.deep_copy(&original);
        let copy_id = copy.id;
        self.blocks.insert(copy_id, copy);
        self.place_after(id, copy_id);
        self.touch();
        self.assert_invariants();
        Some(copy_id)
    }

    /// Replace a block's payload, keeping its id. Returns false for an
    /// unknown id.
    pub fn replace_content(&mut self, id: &BlockId, content: BlockContent) -> bool {
        let Some(block) = self.blocks.get_mut(id) else {
            return false;
        };
        block.content = content;
        self.touch();
        self.assert_invariants();
        true
    }

    // ─── Invariants ──────────────────────────────────────────────────────

    pub fn explicitly_assert_invariants(&self) {
        self.assert_invariants_impl();
    }

    #[cfg(any(test, feature = "assert-invariants"))]
    pub(crate) fn assert_invariants(&self) {
        self.assert_invariants_impl();
    }

    #[cfg(not(any(test, feature = "assert-invariants")))]
    pub(crate) fn assert_invariants(&self) {}

    fn assert_invariants_impl(&self) {
        for (id, block) in &self.blocks {
            assert_eq!(
                id, &block.id,
                "block table key does not match the block's id"
            );
        }
        let mut seen = HashSet::new();
        for id in &self.root_block_ids {
            assert!(
                seen.insert(*id),
                "block {id} occupies more than one positional slot"
            );
            assert!(
                self.blocks.contains_key(id),
                "root sequence references missing block {id}"
            );
        }
        for block in self.blocks.values() {
            if let BlockContent::Columns { layout, columns } = &block.content {
                assert_eq!(
                    columns.len(),
                    layout.column_count(),
                    "columns block {} has the wrong number of cells for {layout}",
                    block.id
                );
                for id in columns.iter().flatten() {
                    assert!(
                        seen.insert(*id),
                        "block {id} occupies more than one positional slot"
                    );
                    assert!(
                        self.blocks.contains_key(id),
                        "column cell references missing block {id}"
                    );
                }
            }
        }
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn touch(&mut self) {
        self.updated_at = now_millis();
    }

    fn root_insert_index(&self, position: &InsertPosition) -> usize {
        match position {
            InsertPosition::AtEnd => self.root_block_ids.len(),
            InsertPosition::After(anchor) => self
                .root_block_ids
                .iter()
                .position(|id| id == anchor)
                .map(|index| index + 1)
                .unwrap_or(self.root_block_ids.len()),
        }
    }

    fn remove_block_and_children(&mut self, id: &BlockId) {
        let Some(block) = self.blocks.remove(id) else {
            return;
        };
        if let BlockContent::Columns { columns, .. } = &block.content {
            for child in columns.iter().flatten() {
                self.remove_block_and_children(child);
            }
        }
    }

    fn prune_dangling_references(&mut self) {
        let live: HashSet<BlockId> = self.blocks.keys().copied().collect();
        self.root_block_ids.retain(|id| live.contains(id));
        for block in self.blocks.values_mut() {
            if let BlockContent::Columns { columns, .. } = &mut block.content {
                for cell in columns.iter_mut() {
                    cell.retain(|id| live.contains(id));
                }
            }
        }
    }

    /// Remove `id` from the root sequence and from every column cell.
    fn clear_slot(&mut self, id: &BlockId) {
        self.root_block_ids.retain(|existing| existing != id);
        for block in self.blocks.values_mut() {
            if let BlockContent::Columns { columns, .. } = &mut block.content {
                for cell in columns.iter_mut() {
                    cell.retain(|existing| existing != id);
                }
            }
        }
    }

    /// True if `target` is `owner` itself or sits anywhere under the
    /// column cells `owner` transitively references. Assigning under such
    /// a target would create an ownership cycle.
    fn owns_transitively(&self, owner: &BlockId, target: &BlockId) -> bool {
        let mut stack = vec![*owner];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if &current == target {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(BlockContent::Columns { columns, .. }) =
                self.blocks.get(&current).map(|block| &block.content)
            {
                stack.extend(columns.iter().flatten().copied());
            }
        }
        false
    }

    fn deep_copy(&mut self, block: &Block) -> Block {
        let content = match &block.content {
            BlockContent::Columns { layout, columns } => {
                let mut copied_columns = Vec::with_capacity(columns.len());
                for cell in columns {
                    let mut copied_cell = Vec::with_capacity(cell.len());
                    for child_id in cell {
                        let Some(child) = self.blocks.get(child_id).cloned()
                        else {
                            continue;
                        };
                        let child_copy = self.deep_copy(&child);
                        let child_copy_id = child_copy.id;
                        self.blocks.insert(child_copy_id, child_copy);
                        copied_cell.push(child_copy_id);
                    }
                    copied_columns.push(copied_cell);
                }
                BlockContent::Columns {
                    layout: *layout,
                    columns: copied_columns,
                }
            }
            other => other.clone(),
        };
        Block {
            id: Uuid::new_v4(),
            content,
        }
    }

    /// Insert `copy_id` directly after `original` in whatever slot holds
    /// it, falling back to the end of the root sequence.
    fn place_after(&mut self, original: &BlockId, copy_id: BlockId) {
        if let Some(index) =
            self.root_block_ids.iter().position(|id| id == original)
        {
            self.root_block_ids.insert(index + 1, copy_id);
            return;
        }
        for block in self.blocks.values_mut() {
            if let BlockContent::Columns { columns, .. } = &mut block.content {
                for cell in columns.iter_mut() {
                    if let Some(index) =
                        cell.iter().position(|id| id == original)
                    {
                        cell.insert(index + 1, copy_id);
                        return;
                    }
                }
            }
        }
        self.root_block_ids.push(copy_id);
    }
}
