//! History management for undo/redo operations
//!
//! The [`UndoManager`] stores batches of recorded changes and replays them
//! through an [`UndoTarget`], normally the
//! [`EditSession`](crate::sessions::EditSession) that recorded them. A
//! batch is a list of [`DeltaGroup`]s: text deltas in compact
//! [`DeltaLight`] form, or the folds an edit removed. A batch may also
//! carry the selection as it was before its first edit and after its last,
//! so undo and redo can put the caret back.
//!
//! A signed dirty counter tracks the distance from the last clean mark.
//! Editing after undoing past the clean mark makes the counter unknown,
//! and the history never reports clean again until the next mark.

use crate::core::delta::{Delta, DeltaAction};
use crate::core::errors::{EditorError, Result};
use crate::core::position::{Position, Range, RangeRelation};
use crate::folding::{Fold, FoldOverlay, FoldSide};
use crate::selection::{OrientedRange, SelectionSnapshot};
use crate::utils::text::split_lines;

use std::collections::VecDeque;

use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Text carried by a [`DeltaLight`]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DeltaText {
    /// A single-line insert
    Text(String),
    /// Anything else
    Lines(Vec<String>),
}

/// Compact stored form of a [`Delta`]
///
/// Single-line inserts keep their text as one string instead of a
/// one-element line list.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeltaLight {
    pub action: DeltaAction,
    pub start: Position,
    pub end: Position,
    pub text: DeltaText,
}

impl DeltaLight {
    /// Expand back into a full delta
    pub fn to_delta(&self) -> Delta {
        let lines = match &self.text {
            DeltaText::Text(text) => split_lines(text),
            DeltaText::Lines(lines) => lines.clone(),
        };
        match self.action {
            DeltaAction::Insert => Delta::insert(self.start, lines),
            DeltaAction::Remove => Delta::remove(self.start, self.end, lines),
        }
    }

    pub fn is_insert(&self) -> bool {
        self.action == DeltaAction::Insert
    }

    /// Bytes held by this entry
    pub fn memory_usage(&self) -> usize {
        let text = match &self.text {
            DeltaText::Text(text) => text.len(),
            DeltaText::Lines(lines) => lines.iter().map(String::len).sum(),
        };
        core::mem::size_of::<Self>() + text
    }
}

impl From<&Delta> for DeltaLight {
    fn from(delta: &Delta) -> Self {
        let text = match (delta.action, delta.lines.as_slice()) {
            (DeltaAction::Insert, [line]) => DeltaText::Text(line.clone()),
            _ => DeltaText::Lines(delta.lines.clone()),
        };
        Self {
            action: delta.action,
            start: delta.start,
            end: delta.end,
            text,
        }
    }
}

impl From<&DeltaLight> for Delta {
    fn from(light: &DeltaLight) -> Self {
        light.to_delta()
    }
}

/// Folds removed by one edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldRecord {
    pub folds: Vec<Fold>,
}

/// One group of a recorded batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeltaGroup {
    /// Text changes, oldest first
    Doc(Vec<DeltaLight>),
    /// Folds removed by those changes
    Fold(Vec<FoldRecord>),
}

impl DeltaGroup {
    /// Get memory usage of this group
    pub fn memory_usage(&self) -> usize {
        core::mem::size_of::<Self>()
            + match self {
                Self::Doc(deltas) => deltas.iter().map(DeltaLight::memory_usage).sum::<usize>(),
                Self::Fold(records) => records
                    .iter()
                    .flat_map(|record| &record.folds)
                    .map(|fold| core::mem::size_of::<Fold>() + fold.placeholder().len())
                    .sum::<usize>(),
            }
    }
}

/// Groups handed to [`UndoManager::execute`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UndoBatch {
    pub groups: Vec<DeltaGroup>,
    /// Append to the newest stored batch instead of starting a new one
    pub merge: bool,
    /// Selection before the first change; undo restores it
    pub selection_before: Option<SelectionSnapshot>,
    /// Selection after the last change; redo restores it
    pub selection_after: Option<SelectionSnapshot>,
}

/// Replays stored batches
///
/// `selection` is the snapshot recorded for the state the replay leads
/// to, when the batch has one.
pub trait UndoTarget {
    /// Revert `groups`, newest first; returns the range the changes touched
    fn undo_changes(
        &mut self,
        groups: &[DeltaGroup],
        selection: Option<&SelectionSnapshot>,
        select: bool,
    ) -> Result<Option<Range>>;

    /// Re-apply `groups`, oldest first; returns the range the changes touched
    fn redo_changes(
        &mut self,
        groups: &[DeltaGroup],
        selection: Option<&SelectionSnapshot>,
        select: bool,
    ) -> Result<Option<Range>>;
}

/// Configuration for undo history behavior
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UndoManagerConfig {
    /// Maximum number of batches to keep (0 = unlimited)
    pub max_batches: usize,

    /// Maximum memory usage in bytes (0 = unlimited)
    pub max_memory: usize,
}

fn snapshot_memory(snapshot: Option<&SelectionSnapshot>) -> usize {
    snapshot.map_or(0, |snapshot| {
        snapshot.ranges.len() * core::mem::size_of::<OrientedRange>()
    })
}

#[derive(Debug, Clone)]
struct StoredBatch {
    groups: Vec<DeltaGroup>,
    selection_before: Option<SelectionSnapshot>,
    selection_after: Option<SelectionSnapshot>,
    memory_usage: usize,
}

impl StoredBatch {
    fn new(
        groups: Vec<DeltaGroup>,
        selection_before: Option<SelectionSnapshot>,
        selection_after: Option<SelectionSnapshot>,
    ) -> Self {
        let memory_usage = groups.iter().map(DeltaGroup::memory_usage).sum::<usize>()
            + snapshot_memory(selection_before.as_ref())
            + snapshot_memory(selection_after.as_ref());
        Self {
            groups,
            selection_before,
            selection_after,
            memory_usage,
        }
    }
}

/// Undo and redo stacks of recorded batches
#[derive(Debug)]
pub struct UndoManager {
    config: UndoManagerConfig,

    /// Oldest batch first
    undo_stack: VecDeque<StoredBatch>,

    /// Most recently undone batch last
    redo_stack: VecDeque<StoredBatch>,

    /// Batches since the clean mark; `None` once that is unknowable
    dirty_counter: Option<isize>,

    /// Bytes held by both stacks
    memory_usage: usize,
}

impl UndoManager {
    /// Create an undo manager with default configuration
    pub fn new() -> Self {
        Self::with_config(UndoManagerConfig::default())
    }

    /// Create an undo manager with custom configuration
    pub fn with_config(config: UndoManagerConfig) -> Self {
        Self {
            config,
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            dirty_counter: Some(0),
            memory_usage: 0,
        }
    }

    pub fn config(&self) -> UndoManagerConfig {
        self.config
    }

    /// Update the limits, dropping the oldest batches that no longer fit
    pub fn set_config(&mut self, config: UndoManagerConfig) {
        self.config = config;
        self.enforce_limits();
    }

    /// Record a batch
    ///
    /// Clears the redo stack. With `merge` set the groups join the newest
    /// stored batch, which then counts as a single step; the merged step
    /// keeps the older batch's selection before and the newer one's after.
    pub fn execute(&mut self, batch: UndoBatch) {
        let UndoBatch {
            mut groups,
            merge,
            mut selection_before,
            mut selection_after,
        } = batch;
        if groups.is_empty() {
            return;
        }
        if merge {
            if let Some(top) = self.undo_stack.pop_back() {
                self.memory_usage -= top.memory_usage;
                self.dirty_counter = self.dirty_counter.map(|count| count - 1);
                let mut merged = top.groups;
                merged.append(&mut groups);
                groups = merged;
                selection_before = top.selection_before.or(selection_before);
                selection_after = selection_after.or(top.selection_after);
            }
        }

        let batch = StoredBatch::new(groups, selection_before, selection_after);
        debug!(
            groups = batch.groups.len(),
            merge,
            undo_depth = self.undo_stack.len() + 1,
            "undo batch recorded"
        );
        self.memory_usage += batch.memory_usage;
        self.undo_stack.push_back(batch);
        self.clear_redo_stack();

        self.dirty_counter = match self.dirty_counter {
            Some(count) if count >= 0 => Some(count + 1),
            _ => None,
        };
        self.enforce_limits();
    }

    /// Revert the newest batch through `target`
    ///
    /// Returns the range the replay selected. A failed replay leaves the
    /// batch on the undo stack.
    pub fn undo(&mut self, target: &mut dyn UndoTarget, select: bool) -> Result<Option<Range>> {
        let batch = self.undo_stack.pop_back().ok_or(EditorError::NothingToUndo)?;
        match target.undo_changes(&batch.groups, batch.selection_before.as_ref(), select) {
            Ok(range) => {
                debug!(groups = batch.groups.len(), "undo");
                self.redo_stack.push_back(batch);
                self.dirty_counter = self.dirty_counter.map(|count| count - 1);
                Ok(range)
            }
            Err(err) => {
                self.undo_stack.push_back(batch);
                Err(err)
            }
        }
    }

    /// Re-apply the most recently undone batch through `target`
    pub fn redo(&mut self, target: &mut dyn UndoTarget, select: bool) -> Result<Option<Range>> {
        let batch = self.redo_stack.pop_back().ok_or(EditorError::NothingToRedo)?;
        match target.redo_changes(&batch.groups, batch.selection_after.as_ref(), select) {
            Ok(range) => {
                debug!(groups = batch.groups.len(), "redo");
                self.undo_stack.push_back(batch);
                self.dirty_counter = self.dirty_counter.map(|count| count + 1);
                Ok(range)
            }
            Err(err) => {
                self.redo_stack.push_back(batch);
                Err(err)
            }
        }
    }

    /// Drop all history and mark the current state clean
    pub fn reset(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.memory_usage = 0;
        self.dirty_counter = Some(0);
    }

    /// Mark the current state as saved
    pub fn mark_clean(&mut self) {
        self.dirty_counter = Some(0);
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.dirty_counter == Some(0)
    }

    /// Batches since the clean mark, negative after undoing past it
    #[must_use]
    pub fn dirty_counter(&self) -> Option<isize> {
        self.dirty_counter
    }

    #[must_use]
    pub fn has_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    #[must_use]
    pub fn has_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get history statistics
    #[must_use]
    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            undo_count: self.undo_stack.len(),
            redo_count: self.redo_stack.len(),
            memory_usage: self.memory_usage,
            dirty_counter: self.dirty_counter,
        }
    }

    fn clear_redo_stack(&mut self) {
        let freed: usize = self.redo_stack.drain(..).map(|b| b.memory_usage).sum();
        self.memory_usage -= freed;
    }

    fn enforce_limits(&mut self) {
        let UndoManagerConfig {
            max_batches,
            max_memory,
        } = self.config;
        while (max_batches > 0 && self.undo_stack.len() > max_batches)
            || (max_memory > 0
                && self.memory_usage > max_memory
                && self.undo_stack.len() > 1)
        {
            let Some(oldest) = self.undo_stack.pop_front() else {
                break;
            };
            self.memory_usage -= oldest.memory_usage;
            debug!(freed = oldest.memory_usage, "oldest undo batch dropped");
        }
    }
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about the history system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryStats {
    /// Number of batches that can be undone
    pub undo_count: usize,
    /// Number of batches that can be redone
    pub redo_count: usize,
    /// Current memory usage in bytes
    pub memory_usage: usize,
    /// Distance from the clean mark, if known
    pub dirty_counter: Option<isize>,
}

/// Range to select after replaying `deltas`
///
/// Inserted text (removed text, when undoing) is covered by the union of
/// its spans; a removal collapses the range onto its start when it lies
/// before the range. A `previous` range from the group replayed just
/// before is merged in when the two touch. With `folds` given, an end
/// hidden inside a collapsed fold moves to that fold's start.
pub fn replay_selection(
    deltas: &[DeltaLight],
    undo: bool,
    previous: Option<Range>,
    folds: Option<&FoldOverlay>,
) -> Option<Range> {
    let inserts = |delta: &DeltaLight| delta.is_insert() != undo;
    let (first, rest) = deltas.split_first()?;

    let mut range = if inserts(first) {
        Range::from_points(first.start, first.end)
    } else {
        Range::empty(first.start)
    };
    for delta in rest {
        if inserts(delta) {
            if range.compare_point(delta.start).is_lt() {
                range.start = delta.start;
            }
            if range.compare_point(delta.end).is_gt() {
                range.end = delta.end;
            }
        } else if range.compare_point(delta.start).is_lt() {
            range = Range::empty(delta.start);
        }
    }

    if let Some(mut previous) = previous {
        if previous.start == range.start {
            let width = range.end.column.saturating_sub(range.start.column);
            previous.start.column += width;
            previous.end.column += width;
        }
        match previous.compare_range(&range) {
            RangeRelation::OverlapsEnd => range.start = previous.start,
            RangeRelation::OverlapsStart => range.end = previous.end,
            _ => {}
        }
    }
    if let Some(folds) = folds {
        range.start = visible_point(range.start, folds);
        range.end = visible_point(range.end, folds);
    }
    Some(range)
}

fn visible_point(pos: Position, folds: &FoldOverlay) -> Position {
    match folds.get_fold_at(pos.row, pos.column, FoldSide::Both) {
        Some(fold) if fold.range().inside(pos.row, pos.column) => fold.start(),
        _ => pos,
    }
}
