//! Ministry blocks: repeatable ministry affiliations of a member.
//!
//! Every operation is a pure transformation that returns a new block list.
//! Blocks are addressed by position.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::types::{HierarchyError, MinistryCategory, MinistryRole, RecordId, Result};

/// A concrete ministry offered by a church.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Ministry {
    pub id: RecordId,
    pub name: String,
    pub ministry_type: MinistryCategory,
    pub church_id: RecordId,
}

/// One ministry affiliation being edited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct MinistryBlock {
    pub church_id: Option<RecordId>,
    pub ministry_type: Option<MinistryCategory>,
    pub ministry_id: Option<RecordId>,
    pub ministry_roles: Vec<MinistryRole>,

    // UI state, never persisted
    #[serde(skip)]
    pub church_popover_open: bool,
    #[serde(skip)]
    pub ministry_popover_open: bool,
    /// Ministries fetched for the selected church
    #[serde(skip)]
    pub ministries: Vec<Ministry>,
}

impl MinistryBlock {
    /// A block rebuilt from a persisted assignment.
    pub fn assigned(
        church_id: impl Into<RecordId>,
        ministry_type: MinistryCategory,
        ministry_id: impl Into<RecordId>,
        ministry_roles: Vec<MinistryRole>,
    ) -> Self {
        Self {
            church_id: Some(church_id.into()),
            ministry_type: Some(ministry_type),
            ministry_id: Some(ministry_id.into()),
            ministry_roles,
            ..Default::default()
        }
    }

    /// Church, category, ministry and at least one role are set.
    pub fn is_complete(&self) -> bool {
        self.church_id.is_some()
            && self.ministry_type.is_some()
            && self.ministry_id.is_some()
            && !self.ministry_roles.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.church_id.is_none()
            && self.ministry_type.is_none()
            && self.ministry_id.is_none()
            && self.ministry_roles.is_empty()
    }

    pub fn has_role(&self, role: MinistryRole) -> bool {
        self.ministry_roles.contains(&role)
    }

    /// Same persisted selection, ignoring UI state.
    pub fn same_selection(&self, other: &Self) -> bool {
        self.church_id == other.church_id
            && self.ministry_type == other.ministry_type
            && self.ministry_id == other.ministry_id
            && self.ministry_roles == other.ministry_roles
    }

    fn clear_downstream(&mut self) {
        self.ministry_type = None;
        self.ministry_id = None;
        self.ministry_roles.clear();
        self.ministries.clear();
        self.ministry_popover_open = false;
    }
}

/// Partial update for a block. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockPatch {
    pub church_id: Option<Option<RecordId>>,
    pub ministry_type: Option<Option<MinistryCategory>>,
    pub ministry_id: Option<Option<RecordId>>,
    pub ministry_roles: Option<Vec<MinistryRole>>,
    pub church_popover_open: Option<bool>,
    pub ministry_popover_open: Option<bool>,
}

impl BlockPatch {
    pub fn church(church_id: impl Into<RecordId>) -> Self {
        Self {
            church_id: Some(Some(church_id.into())),
            ..Default::default()
        }
    }

    pub fn ministry_type(ministry_type: MinistryCategory) -> Self {
        Self {
            ministry_type: Some(Some(ministry_type)),
            ..Default::default()
        }
    }

    pub fn ministry(ministry_id: impl Into<RecordId>) -> Self {
        Self {
            ministry_id: Some(Some(ministry_id.into())),
            ..Default::default()
        }
    }
}

/// Persisted form of a complete block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct MinistryAssignment {
    pub ministry_id: RecordId,
    pub ministry_roles: Vec<MinistryRole>,
}

/// The block list a ministry-bearing relation starts from.
pub fn initial_blocks() -> Vec<MinistryBlock> {
    vec![MinistryBlock::default()]
}

/// Append one empty block. No upper bound.
pub fn add_block(blocks: &[MinistryBlock]) -> Vec<MinistryBlock> {
    let mut next = blocks.to_vec();
    next.push(MinistryBlock::default());
    next
}

/// Remove the block at `index`; never leaves the list without a slot.
pub fn remove_block(blocks: &[MinistryBlock], index: usize) -> Result<Vec<MinistryBlock>> {
    check_index(blocks, index)?;
    let mut next = blocks.to_vec();
    next.remove(index);
    if next.is_empty() {
        next.push(MinistryBlock::default());
    }
    Ok(next)
}

/// Shallow-merge `patch` into the block at `index`.
///
/// A new church invalidates category, ministry and roles of that block.
pub fn update_block(
    blocks: &[MinistryBlock],
    index: usize,
    patch: BlockPatch,
) -> Result<Vec<MinistryBlock>> {
    check_index(blocks, index)?;
    let mut next = blocks.to_vec();
    let block = &mut next[index];

    if let Some(church_id) = patch.church_id {
        if church_id != block.church_id {
            block.clear_downstream();
        }
        block.church_id = church_id;
    }
    if let Some(ministry_type) = patch.ministry_type {
        if ministry_type != block.ministry_type {
            block.ministry_id = None;
        }
        block.ministry_type = ministry_type;
    }
    if let Some(ministry_id) = patch.ministry_id {
        block.ministry_id = ministry_id;
    }
    if let Some(mut roles) = patch.ministry_roles {
        dedup_in_order(&mut roles);
        block.ministry_roles = roles;
    }
    if let Some(open) = patch.church_popover_open {
        block.church_popover_open = open;
    }
    if let Some(open) = patch.ministry_popover_open {
        block.ministry_popover_open = open;
    }

    Ok(next)
}

/// Add `role` to the block if absent, remove it if present.
pub fn toggle_role(
    blocks: &[MinistryBlock],
    index: usize,
    role: MinistryRole,
) -> Result<Vec<MinistryBlock>> {
    check_index(blocks, index)?;
    let mut next = blocks.to_vec();
    let roles = &mut next[index].ministry_roles;
    match roles.iter().position(|r| *r == role) {
        Some(pos) => {
            roles.remove(pos);
        }
        None => roles.push(role),
    }
    Ok(next)
}

/// Set the church of a block and cache the ministries fetched for it.
pub fn select_church(
    blocks: &[MinistryBlock],
    index: usize,
    church_id: impl Into<RecordId>,
    fetched: Vec<Ministry>,
) -> Result<Vec<MinistryBlock>> {
    let mut next = update_block(blocks, index, BlockPatch::church(church_id))?;
    let block = &mut next[index];
    block.ministries = fetched;
    block.church_popover_open = false;
    Ok(next)
}

/// True iff two or more blocks share the same non-null ministry.
pub fn detect_duplicates(blocks: &[MinistryBlock]) -> bool {
    !duplicate_ministry_ids(blocks).is_empty()
}

/// Ministry ids assigned more than once, in first-seen order.
pub fn duplicate_ministry_ids(blocks: &[MinistryBlock]) -> Vec<RecordId> {
    let mut seen = HashSet::new();
    let mut duplicates: Vec<RecordId> = Vec::new();
    for id in blocks.iter().filter_map(|b| b.ministry_id.as_ref()) {
        if !seen.insert(id) && !duplicates.contains(id) {
            duplicates.push(id.clone());
        }
    }
    duplicates
}

pub fn complete_count(blocks: &[MinistryBlock]) -> usize {
    blocks.iter().filter(|b| b.is_complete()).count()
}

/// Assignments to persist: all blocks, or nothing if any block is incomplete.
pub fn assignments(blocks: &[MinistryBlock]) -> Vec<MinistryAssignment> {
    if blocks.iter().any(|b| !b.is_complete()) {
        return Vec::new();
    }
    blocks
        .iter()
        .filter_map(|b| {
            Some(MinistryAssignment {
                ministry_id: b.ministry_id.clone()?,
                ministry_roles: b.ministry_roles.clone(),
            })
        })
        .collect()
}

/// Summary of a block list consumed by the gate and the promotion check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct BlocksReport {
    pub total: usize,
    pub complete: usize,
    pub duplicate_ministry_ids: Vec<RecordId>,
}

impl BlocksReport {
    pub fn of(blocks: &[MinistryBlock]) -> Self {
        Self {
            total: blocks.len(),
            complete: complete_count(blocks),
            duplicate_ministry_ids: duplicate_ministry_ids(blocks),
        }
    }

    pub fn has_complete(&self) -> bool {
        self.complete > 0
    }

    pub fn all_complete(&self) -> bool {
        self.total > 0 && self.complete == self.total
    }

    pub fn has_duplicates(&self) -> bool {
        !self.duplicate_ministry_ids.is_empty()
    }
}

fn check_index(blocks: &[MinistryBlock], index: usize) -> Result<()> {
    if index < blocks.len() {
        Ok(())
    } else {
        Err(HierarchyError::BlockOutOfRange {
            index,
            len: blocks.len(),
        })
    }
}

fn dedup_in_order(roles: &mut Vec<MinistryRole>) {
    let mut seen = HashSet::new();
    roles.retain(|r| seen.insert(*r));
}
