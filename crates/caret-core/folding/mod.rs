//! Code folding overlay
//!
//! Folds hide contiguous text behind a placeholder while the document keeps
//! every character addressable. The overlay groups folds into
//! [`FoldLine`]s, keeps them in step with document deltas, and reports every
//! add and remove through [`FoldEvent`].
//!
//! # Examples
//!
//! ```
//! use caret_core::{Document, FoldModeKind, FoldOverlay, Range};
//!
//! let doc = Document::new("fn main() {\n    body();\n}");
//! let folds = FoldOverlay::new(&doc, FoldModeKind::Brace);
//! let fold = folds.add_fold("...", Range::new(0, 11, 2, 0)).unwrap();
//!
//! assert!(folds.is_row_folded(1));
//! assert_eq!(folds.fold_display_line(0), "fn main() {...}");
//! folds.remove_fold(fold.id()).unwrap();
//! assert!(folds.all_folds().is_empty());
//! ```

pub mod fold;
pub mod fold_line;
pub mod modes;

pub use fold::{Fold, FoldId};
pub use fold_line::FoldLine;
pub use modes::{BraceFoldMode, FoldMode, FoldModeKind, FoldWidget, IndentFoldMode};

use crate::core::delta::Delta;
use crate::core::document::{Document, WeakDocument};
use crate::core::errors::{EditorError, Result};
use crate::core::position::{Position, Range, RangeRelation};
use crate::events::{FoldEvent, ListenerId, Signal};
use crate::utils::text::char_slice;

use core::cell::{Cell, RefCell};
use core::cmp::Ordering;
use core::fmt;

use tracing::{debug, warn};

/// Which folds count as "at" a point that sits on a fold edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FoldSide {
    /// Any fold containing the point, edges included
    #[default]
    Both,
    /// Skip folds that end at the point
    Right,
    /// Skip folds that start at the point
    Left,
}

/// Part of the visible text returned by [`FoldOverlay::get_fold_string_at`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringTrim {
    /// The whole segment between the surrounding folds
    #[default]
    Full,
    /// Only the part before the column
    Before,
    /// Only the part from the column on
    After,
}

/// Region targeted by [`FoldOverlay::unfold`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnfoldTarget {
    /// Every fold in the document
    All,
    /// Folds touching one row
    Row(usize),
    /// Folds around one point
    Point(Position),
    /// Folds inside a range
    Range(Range),
}

/// Result of [`FoldOverlay::toggle_fold_widget`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FoldToggle {
    /// A new fold was created
    Folded(Fold),
    /// An existing fold was expanded
    Expanded(Fold),
    /// The row has no foldable region
    Nothing,
}

/// Relate `range` to `query` shrunk by one column at each end
///
/// Shrinking keeps folds that only touch the query out of the result. The
/// shrunk end can fall before column zero, which sorts before every point
/// on its row.
fn relate_shrunk(range: &Range, query: &Range) -> RangeRelation {
    let end = match query.end.column.checked_sub(1) {
        Some(column) => range.compare(query.end.row, column),
        None if query.end.row == range.start.row => Ordering::Less,
        None => range.compare(query.end.row, 0),
    };
    let start = range.compare(query.start.row, query.start.column + 1);
    match end {
        Ordering::Greater => match start {
            Ordering::Greater => RangeRelation::After,
            Ordering::Equal => RangeRelation::OverlapsEnd,
            Ordering::Less => RangeRelation::Surrounds,
        },
        Ordering::Less => RangeRelation::Before,
        Ordering::Equal => match start {
            Ordering::Less => RangeRelation::OverlapsStart,
            Ordering::Greater => RangeRelation::Inverted,
            Ordering::Equal => RangeRelation::Inside,
        },
    }
}

fn column_shift(from: usize, to: usize) -> isize {
    if to >= from {
        isize::try_from(to - from).unwrap_or(isize::MAX)
    } else {
        isize::try_from(from - to).map_or(isize::MIN, |n| -n)
    }
}

fn row_shift(rows: usize) -> isize {
    isize::try_from(rows).unwrap_or(isize::MAX)
}

/// What one delta did to the stored folds
#[derive(Debug, Default)]
struct DeltaEffect {
    /// Folds whose text was removed
    removed: Vec<Fold>,
    /// Second half of a fold cut by a line break
    split: Option<Fold>,
}

/// Fold lines sorted by start row, without signalling
#[derive(Debug, Default)]
struct FoldStore {
    lines: Vec<FoldLine>,
}

impl FoldStore {
    fn line_index(&self, row: usize) -> Option<usize> {
        for (index, line) in self.lines.iter().enumerate() {
            if line.start().row <= row && line.end().row >= row {
                return Some(index);
            }
            if line.start().row > row {
                break;
            }
        }
        None
    }

    fn fold_at(&self, row: usize, column: usize, side: FoldSide) -> Option<&Fold> {
        let line = &self.lines[self.line_index(row)?];
        line.folds().iter().find(|fold| {
            let range = fold.range;
            if !range.contains(row, column) {
                return false;
            }
            match side {
                FoldSide::Right => range.is_empty() || !range.is_end(row, column),
                FoldSide::Left => range.is_empty() || !range.is_start(row, column),
                FoldSide::Both => true,
            }
        })
    }

    fn fold_mut(&mut self, id: FoldId) -> Option<&mut Fold> {
        self.lines
            .iter_mut()
            .flat_map(|line| line.folds_mut().iter_mut())
            .find(|fold| fold.id == id)
    }

    fn find(&self, id: FoldId) -> Option<&Fold> {
        self.lines
            .iter()
            .flat_map(|line| line.folds().iter())
            .find(|fold| fold.id == id)
    }

    fn folds_in_range(&self, query: &Range) -> Vec<Fold> {
        let mut found = Vec::new();
        for line in &self.lines {
            match relate_shrunk(&line.range(), query) {
                RangeRelation::After | RangeRelation::Inverted => continue,
                RangeRelation::Before => break,
                _ => {}
            }
            for fold in line.folds() {
                match relate_shrunk(&fold.range, query) {
                    RangeRelation::After | RangeRelation::Inverted => continue,
                    RangeRelation::Before => break,
                    _ => found.push(fold.clone()),
                }
            }
        }
        found
    }

    fn remove(&mut self, id: FoldId) -> Option<Fold> {
        let (line_index, fold_index) = self.lines.iter().enumerate().find_map(|(li, line)| {
            line.folds()
                .iter()
                .position(|fold| fold.id == id)
                .map(|fi| (li, fi))
        })?;

        let line = &mut self.lines[line_index];
        let count = line.folds().len();
        if count == 1 {
            return self.lines.remove(line_index).into_folds().pop();
        }
        let folds = line.folds_mut();
        if fold_index == 0 || fold_index == count - 1 || !folds[fold_index].is_multi_line() {
            return Some(folds.remove(fold_index));
        }

        let tail = folds.split_off(fold_index + 1);
        let removed = folds.pop();
        self.lines
            .insert(line_index + 1, FoldLine::from_folds(tail));
        debug!(fold = %id, "fold line split by removal");
        removed
    }

    /// Place `fold` and return it with the folds it displaced
    fn insert(&mut self, mut fold: Fold) -> Result<(Fold, Vec<Fold>)> {
        let range = fold.range;
        let start_fold = self
            .fold_at(range.start.row, range.start.column, FoldSide::Right)
            .cloned();
        let end_fold = self
            .fold_at(range.end.row, range.end.column, FoldSide::Left)
            .cloned();

        if let (Some(start), Some(end)) = (&start_fold, &end_fold) {
            if start.id == end.id {
                if start.range == range {
                    return Ok((start.clone(), Vec::new()));
                }
                let parent = self
                    .fold_mut(start.id)
                    .ok_or(EditorError::FoldNotFound { id: start.id.get() })?;
                parent.add_sub_fold(fold.clone())?;
                return Ok((fold, Vec::new()));
            }
        }

        let partial = start_fold
            .iter()
            .find(|f| f.range.start != range.start)
            .or_else(|| end_fold.iter().find(|f| f.range.end != range.end));
        if let Some(existing) = partial {
            return Err(EditorError::FoldOverlap {
                range,
                existing: existing.range,
            });
        }

        let inner = self.folds_in_range(&range);
        let mut displaced = Vec::with_capacity(inner.len());
        for child in inner {
            if let Some(child) = self.remove(child.id) {
                if fold.collapse_children == 0 {
                    fold.add_sub_fold(child.clone())?;
                }
                displaced.push(child);
            }
        }

        let mut placed = false;
        let mut index = 0;
        while index < self.lines.len() {
            let line_range = self.lines[index].range();
            if range.end.row == line_range.start.row {
                self.lines[index].add_fold(fold.clone())?;
                placed = true;
                break;
            }
            if range.start.row == line_range.end.row {
                self.lines[index].add_fold(fold.clone())?;
                placed = true;
                let bridges = range.is_multi_line()
                    && self
                        .lines
                        .get(index + 1)
                        .is_some_and(|next| next.start().row == range.end.row);
                if bridges {
                    let next = self.lines.remove(index + 1);
                    self.lines[index].merge(next)?;
                }
                break;
            }
            if range.end.row <= line_range.start.row {
                break;
            }
            index += 1;
        }

        if !placed {
            let at = self
                .lines
                .iter()
                .position(|line| line.start().row > range.start.row)
                .unwrap_or(self.lines.len());
            self.lines.insert(at, FoldLine::new(fold.clone()));
        }
        Ok((fold, displaced))
    }

    fn remove_in_range(&mut self, range: &Range) -> Vec<Fold> {
        self.folds_in_range(range)
            .into_iter()
            .filter_map(|fold| self.remove(fold.id))
            .collect()
    }

    /// Keep fold lines in step with `delta`
    ///
    /// A line break strictly inside a fold cuts it in two; `tail_id`
    /// names the second half.
    fn apply_delta(&mut self, delta: &Delta, tail_id: impl FnOnce() -> FoldId) -> DeltaEffect {
        let start = delta.start;
        let end = delta.end;
        let rows = delta.row_span();

        if rows == 0 {
            let width = end.column - start.column;
            let (removed, shift) = if delta.is_insert() {
                (Vec::new(), column_shift(0, width))
            } else {
                (self.remove_in_range(&delta.range()), column_shift(width, 0))
            };
            if let Some(index) = self.line_index(start.row) {
                self.lines[index].add_remove_chars(start.row, start.column, shift);
            }
            return DeltaEffect {
                removed,
                split: None,
            };
        }

        let shift = row_shift(rows);
        if delta.is_insert() {
            let mut next = 0;
            let mut split = None;
            if let Some(index) = self.line_index(start.row) {
                next = index + 1;
                let line_range = self.lines[index].range();
                match line_range.compare_inside(start.row, start.column) {
                    Ordering::Equal => {
                        let line = &mut self.lines[index];
                        let (tail, cut) = match line.split(start.row, start.column) {
                            Some(tail) => (Some(tail), false),
                            None => (line.split_through(start.row, start.column, tail_id), true),
                        };
                        if let Some(mut tail) = tail {
                            tail.shift_row(shift);
                            tail.add_remove_chars(end.row, 0, column_shift(start.column, end.column));
                            if cut {
                                split = tail.folds().first().cloned();
                            }
                            self.lines.insert(index + 1, tail);
                            next = index + 2;
                        } else {
                            warn!(%delta, "line break inserted inside a collapsed fold");
                        }
                    }
                    Ordering::Less => {
                        let line = &mut self.lines[index];
                        line.add_remove_chars(start.row, 0, column_shift(start.column, end.column));
                        line.shift_row(shift);
                    }
                    Ordering::Greater => {}
                }
            }
            for line in &mut self.lines[next..] {
                if line.start().row >= start.row {
                    line.shift_row(shift);
                }
            }
            return DeltaEffect {
                removed: Vec::new(),
                split,
            };
        }

        let removed = self.remove_in_range(&delta.range());
        let mut next = 0;
        if let Some(mut index) = self.line_index(end.row) {
            let line = &mut self.lines[index];
            line.add_remove_chars(end.row, end.column, column_shift(end.column, start.column));
            line.shift_row(-shift);
            if let Some(before) = self.line_index(start.row).filter(|&before| before != index) {
                let line = self.lines.remove(index);
                if let Err(err) = self.lines[before].merge(line) {
                    warn!(%err, "fold lines could not be joined");
                }
                index = before;
            }
            next = index + 1;
        }
        for line in &mut self.lines[next..] {
            if line.start().row >= end.row {
                line.shift_row(-shift);
            }
        }
        DeltaEffect {
            removed,
            split: None,
        }
    }
}

/// Folds over a document
///
/// All methods take `&self`; events are emitted after internal state is
/// released, so listeners may query the overlay.
pub struct FoldOverlay {
    doc: WeakDocument,
    store: RefCell<FoldStore>,
    next_id: Cell<u64>,
    mode: RefCell<Box<dyn FoldMode>>,
    events: Signal<FoldEvent>,
}

impl FoldOverlay {
    /// Create an empty overlay using the given fold strategy
    pub fn new(doc: &Document, mode: FoldModeKind) -> Self {
        Self {
            doc: doc.downgrade(),
            store: RefCell::new(FoldStore::default()),
            next_id: Cell::new(1),
            mode: RefCell::new(mode.create()),
            events: Signal::new(),
        }
    }

    /// Strong handle to the folded document
    pub fn document(&self) -> Result<Document> {
        self.doc.upgrade()
    }

    /// Register a listener for fold adds and removes
    pub fn on_change<F>(&self, listener: F) -> ListenerId
    where
        F: FnMut(&FoldEvent) + 'static,
    {
        self.events.connect(listener)
    }

    pub fn off_change(&self, id: ListenerId) -> bool {
        self.events.disconnect(id)
    }

    /// Switch the fold strategy
    pub fn set_fold_mode(&self, kind: FoldModeKind) {
        *self.mode.borrow_mut() = kind.create();
    }

    pub fn fold_mode(&self) -> FoldModeKind {
        self.mode.borrow().kind()
    }

    /// Role of `row` under the current strategy
    pub fn fold_widget(&self, row: usize) -> Result<Option<FoldWidget>> {
        let doc = self.document()?;
        Ok(self.mode.borrow().fold_widget(&doc, row))
    }

    /// Region the widget on `row` would fold
    pub fn fold_widget_range(&self, row: usize) -> Result<Option<Range>> {
        let doc = self.document()?;
        Ok(self.mode.borrow().fold_widget_range(&doc, row))
    }

    fn allocate_id(&self) -> FoldId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        FoldId(id)
    }

    fn emit_all(&self, events: Vec<FoldEvent>) {
        for event in &events {
            self.events.emit(event);
        }
    }

    /// Collapse `range` behind `placeholder`
    ///
    /// The range is clipped and must span at least two chars. Folding the
    /// exact range of an existing fold returns that fold. A range inside an
    /// existing fold nests in it and still emits [`FoldEvent::Added`] with
    /// document coordinates; existing folds inside the range become
    /// sub-folds of the new one.
    pub fn add_fold(&self, placeholder: &str, range: Range) -> Result<Fold> {
        let doc = self.document()?;
        let range = doc.clip_range(range);
        if !range.is_multi_line() && range.end.column - range.start.column < 2 {
            return Err(EditorError::FoldTooNarrow { range });
        }
        let fold = Fold::new(self.allocate_id(), range, placeholder);
        self.place(fold)
    }

    fn place(&self, fold: Fold) -> Result<Fold> {
        let id = fold.id;
        let (fold, displaced) = self.store.borrow_mut().insert(fold)?;
        if fold.id != id {
            return Ok(fold);
        }
        debug!(%fold, "fold added");
        let mut events: Vec<FoldEvent> = displaced.into_iter().map(FoldEvent::Removed).collect();
        events.push(FoldEvent::Added(fold.clone()));
        self.emit_all(events);
        Ok(fold)
    }

    /// Re-insert folds as they were, keeping their ids
    pub fn add_folds(&self, folds: Vec<Fold>) -> Result<()> {
        for fold in folds {
            if self.next_id.get() <= fold.id.get() {
                self.next_id.set(fold.id.get() + 1);
            }
            self.place(fold)?;
        }
        Ok(())
    }

    /// Remove a fold, splitting or shrinking its fold line
    pub fn remove_fold(&self, id: FoldId) -> Result<Fold> {
        let fold = self
            .store
            .borrow_mut()
            .remove(id)
            .ok_or(EditorError::FoldNotFound { id: id.get() })?;
        debug!(%fold, "fold removed");
        self.events.emit(&FoldEvent::Removed(fold.clone()));
        Ok(fold)
    }

    /// Remove several folds, skipping any already gone
    pub fn remove_folds(&self, ids: &[FoldId]) -> Vec<Fold> {
        ids.iter()
            .filter_map(|&id| self.remove_fold(id).ok())
            .collect()
    }

    /// Open a fold, restoring its sub-folds
    ///
    /// A fold created with `collapse_children` re-collapses nested regions
    /// through the fold strategy, one level less deep.
    pub fn expand_fold(&self, id: FoldId) -> Result<Fold> {
        let fold = self.remove_fold(id)?;
        for sub in fold.absolute_sub_folds() {
            if let Err(err) = self.place(sub) {
                warn!(%err, "sub-fold could not be restored");
            }
        }
        if fold.collapse_children > 0 {
            self.fold_all(
                fold.start().row + 1,
                fold.end().row,
                fold.collapse_children - 1,
            );
        }
        Ok(fold)
    }

    pub fn expand_folds(&self, ids: &[FoldId]) -> Vec<Fold> {
        ids.iter()
            .filter_map(|&id| self.expand_fold(id).ok())
            .collect()
    }

    /// Open the folds in a region
    ///
    /// With `expand_inner` the folds and their sub-folds are dropped;
    /// otherwise folds are expanded repeatedly until none remain in the
    /// region, keeping nested folds that lie outside it.
    pub fn unfold(&self, target: UnfoldTarget, expand_inner: bool) -> Result<Vec<Fold>> {
        let doc = self.document()?;
        let range = match target {
            UnfoldTarget::All => {
                let last = doc.len() - 1;
                Range::new(0, 0, last, doc.line_length(last))
            }
            UnfoldTarget::Row(row) => Range::new(row, 0, row, doc.line_length(row)),
            UnfoldTarget::Point(pos) => Range::empty(pos),
            UnfoldTarget::Range(range) => range,
        };

        let folds = self.get_folds_in_range(range);
        let ids: Vec<FoldId> = folds.iter().map(Fold::id).collect();
        if expand_inner {
            self.remove_folds(&ids);
        } else {
            let mut outermost = ids;
            while !outermost.is_empty() {
                if self.expand_folds(&outermost).is_empty() {
                    break;
                }
                outermost = self
                    .get_folds_in_range(range)
                    .iter()
                    .map(Fold::id)
                    .collect();
            }
        }
        Ok(folds)
    }

    /// Fold every widget region between `start_row` and `end_row`
    ///
    /// `depth` is stored as the new folds' `collapse_children`. Rows inside
    /// a new fold are skipped. Returns the number of folds added.
    pub fn fold_all(&self, start_row: usize, end_row: usize, depth: usize) -> usize {
        let Ok(doc) = self.document() else {
            return 0;
        };
        let end_row = end_row.min(doc.len());
        let mut added = 0;
        let mut row = start_row;
        while row < end_row {
            let range = {
                let mode = self.mode.borrow();
                if mode.fold_widget(&doc, row) == Some(FoldWidget::Start) {
                    mode.fold_widget_range(&doc, row)
                } else {
                    None
                }
            };
            if let Some(range) = range.filter(|r| {
                r.is_multi_line() && r.end.row <= end_row && r.start.row >= start_row
            }) {
                let mut fold = Fold::new(self.allocate_id(), range, "...");
                fold.collapse_children = depth;
                match self.place(fold) {
                    Ok(_) => added += 1,
                    Err(err) => debug!(%err, row, "region not folded"),
                }
                row = range.end.row;
            }
            row += 1;
        }
        added
    }

    /// Fold or unfold the region whose widget sits on `row`
    pub fn toggle_fold_widget(&self, row: usize) -> Result<FoldToggle> {
        let doc = self.document()?;
        let Some(widget) = self.mode.borrow().fold_widget(&doc, row) else {
            return Ok(FoldToggle::Nothing);
        };
        let (column, side) = if widget == FoldWidget::End {
            (0, FoldSide::Left)
        } else {
            (doc.line_length(row), FoldSide::Right)
        };
        if let Some(fold) = self.get_fold_at(row, column, side) {
            return self.expand_fold(fold.id).map(FoldToggle::Expanded);
        }

        let Some(range) = self.mode.borrow().fold_widget_range(&doc, row) else {
            return Ok(FoldToggle::Nothing);
        };
        if !range.is_multi_line() {
            if let Some(fold) = self
                .get_fold_at(range.start.row, range.start.column, FoldSide::Right)
                .filter(|fold| fold.range == range)
            {
                return self.remove_fold(fold.id).map(FoldToggle::Expanded);
            }
        }
        self.add_fold("...", range).map(FoldToggle::Folded)
    }

    /// Keep folds in step with a document delta
    ///
    /// Returns the folds erased because their text was removed.
    pub fn on_delta(&self, delta: &Delta) -> Vec<Fold> {
        let DeltaEffect { removed, split } = self
            .store
            .borrow_mut()
            .apply_delta(delta, || self.allocate_id());
        for fold in &removed {
            debug!(%fold, "fold erased by edit");
            self.events.emit(&FoldEvent::Removed(fold.clone()));
        }
        if let Some(fold) = split {
            self.events.emit(&FoldEvent::Added(fold));
        }
        removed
    }

    /// The fold containing a point
    pub fn get_fold_at(&self, row: usize, column: usize, side: FoldSide) -> Option<Fold> {
        self.store.borrow().fold_at(row, column, side).cloned()
    }

    /// Top-level fold with `id`
    pub fn get_fold(&self, id: FoldId) -> Option<Fold> {
        self.store.borrow().find(id).cloned()
    }

    /// Folds intersecting `range`, folds only touching its edges excluded
    pub fn get_folds_in_range(&self, range: Range) -> Vec<Fold> {
        self.store.borrow().folds_in_range(&range)
    }

    /// Folds intersecting any of `ranges`, each reported once
    pub fn get_folds_in_range_list(&self, ranges: &[Range]) -> Vec<Fold> {
        let store = self.store.borrow();
        let mut found: Vec<Fold> = Vec::new();
        for range in ranges {
            for fold in store.folds_in_range(range) {
                if !found.iter().any(|f| f.id == fold.id) {
                    found.push(fold);
                }
            }
        }
        found
    }

    /// Every top-level fold in document order
    pub fn all_folds(&self) -> Vec<Fold> {
        self.store
            .borrow()
            .lines
            .iter()
            .flat_map(|line| line.folds().iter().cloned())
            .collect()
    }

    pub fn fold_lines(&self) -> Vec<FoldLine> {
        self.store.borrow().lines.clone()
    }

    /// The fold line covering `row`
    pub fn get_fold_line(&self, row: usize) -> Option<FoldLine> {
        let store = self.store.borrow();
        store.line_index(row).map(|index| store.lines[index].clone())
    }

    /// The first fold line ending at or after `row`
    pub fn get_next_fold_line(&self, row: usize) -> Option<FoldLine> {
        self.store
            .borrow()
            .lines
            .iter()
            .find(|line| line.end().row >= row)
            .cloned()
    }

    /// Visible text between the folds around `(row, column)`
    ///
    /// Returns `None` when the point is hidden by a fold or no fold line
    /// covers the row.
    pub fn get_fold_string_at(&self, row: usize, column: usize, trim: StringTrim) -> Option<String> {
        let doc = self.document().ok()?;
        let line = self.get_fold_line(row)?;
        let mut last_end = Position::new(line.start().row, 0);
        let mut segment = None;
        for fold in line.folds() {
            match fold.range.compare_end(row, column) {
                Ordering::Less => {
                    let from = if last_end.row == fold.start().row {
                        last_end.column
                    } else {
                        0
                    };
                    let text = doc.line(fold.start().row);
                    segment = Some(char_slice(&text, from, fold.start().column).to_owned());
                    break;
                }
                Ordering::Equal => return None,
                Ordering::Greater => last_end = fold.end(),
            }
        }
        let segment = segment.unwrap_or_else(|| {
            let text = doc.line(last_end.row);
            char_slice(&text, last_end.column, usize::MAX).to_owned()
        });
        let offset = column.saturating_sub(last_end.column);
        Some(match trim {
            StringTrim::Full => segment,
            StringTrim::Before => segment.chars().take(offset).collect(),
            StringTrim::After => segment.chars().skip(offset).collect(),
        })
    }

    /// Rows visible between `first` and `last` once folds collapse
    pub fn folded_row_count(&self, first: usize, last: usize) -> usize {
        let mut count = (last + 1).saturating_sub(first);
        for line in &self.store.borrow().lines {
            let start = line.start().row;
            let end = line.end().row;
            if end >= last {
                if start < last {
                    if start >= first {
                        count = count.saturating_sub(last - start);
                    } else {
                        count = 0;
                    }
                }
                break;
            }
            if end >= first {
                count = if start >= first {
                    count.saturating_sub(end - start)
                } else {
                    count.saturating_sub(end - first + 1)
                };
            }
        }
        count
    }

    /// Whether `row` is covered by a fold line
    pub fn is_row_folded(&self, row: usize) -> bool {
        self.store.borrow().line_index(row).is_some()
    }

    /// First row of the fold line covering `row`, or `row` itself
    pub fn row_fold_start(&self, row: usize) -> usize {
        self.get_fold_line(row).map_or(row, |line| line.start().row)
    }

    /// Last row of the fold line covering `row`, or `row` itself
    pub fn row_fold_end(&self, row: usize) -> usize {
        self.get_fold_line(row).map_or(row, |line| line.end().row)
    }

    /// The display text of the fold line covering `row`, placeholders
    /// standing in for folded text
    pub fn fold_display_line(&self, row: usize) -> String {
        let Ok(doc) = self.document() else {
            return String::new();
        };
        let Some(line) = self.get_fold_line(row) else {
            return doc.line(row);
        };
        let mut text = String::new();
        let mut cursor = Position::new(line.start().row, 0);
        for fold in line.folds() {
            let from = if cursor.row == fold.start().row {
                cursor.column
            } else {
                0
            };
            text.push_str(char_slice(&doc.line(fold.start().row), from, fold.start().column));
            text.push_str(fold.placeholder());
            cursor = fold.end();
        }
        text.push_str(char_slice(&doc.line(cursor.row), cursor.column, usize::MAX));
        text
    }
}

impl fmt::Debug for FoldOverlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FoldOverlay")
            .field("folds", &self.store.borrow().lines.len())
            .field("mode", &self.fold_mode())
            .field("events", &self.events)
            .finish()
    }
}
