//! Runs of folds that share rows
//!
//! A [`FoldLine`] groups folds that touch the same document rows. It is the
//! unit that gets shifted when an edit adds or removes rows, and it is split
//! or merged when edits separate or join its folds.

use super::fold::{Fold, FoldId};
use crate::core::errors::{EditorError, Result};
use crate::core::position::{Position, Range};

use core::cmp::Ordering;

use tracing::{debug, warn};

/// How a point relates to the next fold at or after it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NextFold {
    /// The point precedes fold `index`
    Before(usize),
    /// The point lies inside fold `index`, its start included
    Inside(usize),
}

/// Sorted folds on connected rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldLine {
    folds: Vec<Fold>,
}

fn shift_column(column: usize, by: isize) -> usize {
    column.saturating_add_signed(by)
}

impl FoldLine {
    pub(crate) fn new(fold: Fold) -> Self {
        Self { folds: vec![fold] }
    }

    pub(crate) fn from_folds(folds: Vec<Fold>) -> Self {
        debug_assert!(!folds.is_empty(), "fold line needs at least one fold");
        Self { folds }
    }

    /// The folds of this line in document order
    pub fn folds(&self) -> &[Fold] {
        &self.folds
    }

    pub(crate) fn folds_mut(&mut self) -> &mut Vec<Fold> {
        &mut self.folds
    }

    pub(crate) fn into_folds(self) -> Vec<Fold> {
        self.folds
    }

    /// Span from the first fold's start to the last fold's end
    pub fn range(&self) -> Range {
        match (self.folds.first(), self.folds.last()) {
            (Some(first), Some(last)) => Range {
                start: first.range.start,
                end: last.range.end,
            },
            _ => Range::default(),
        }
    }

    pub fn start(&self) -> Position {
        self.range().start
    }

    pub fn end(&self) -> Position {
        self.range().end
    }

    pub fn contains_row(&self, row: usize) -> bool {
        let range = self.range();
        row >= range.start.row && row <= range.end.row
    }

    /// Move every fold by `shift` rows; sub-folds are relative and stay
    pub fn shift_row(&mut self, shift: isize) {
        for fold in &mut self.folds {
            fold.range.start.row = fold.range.start.row.saturating_add_signed(shift);
            fold.range.end.row = fold.range.end.row.saturating_add_signed(shift);
        }
    }

    /// Add a fold that connects to this line's rows
    pub(crate) fn add_fold(&mut self, fold: Fold) -> Result<()> {
        let range = self.range();
        if !fold.is_multi_line() {
            if fold.start().row < range.start.row || fold.end().row > range.end.row {
                return Err(EditorError::FoldLineMismatch {
                    range: fold.range,
                    line: range,
                });
            }
            let at = self
                .folds
                .iter()
                .position(|existing| existing.start() > fold.start())
                .unwrap_or(self.folds.len());
            self.folds.insert(at, fold);
        } else if fold.start().row == range.end.row {
            self.folds.push(fold);
        } else if fold.end().row == range.start.row {
            self.folds.insert(0, fold);
        } else {
            return Err(EditorError::FoldLineMismatch {
                range: fold.range,
                line: range,
            });
        }
        Ok(())
    }

    /// Find the first fold that does not end before `(row, column)`
    pub(crate) fn next_fold_to(&self, row: usize, column: usize) -> Option<NextFold> {
        self.folds
            .iter()
            .enumerate()
            .find_map(|(index, fold)| match fold.range.compare_end(row, column) {
                Ordering::Less => Some(NextFold::Before(index)),
                Ordering::Equal => Some(NextFold::Inside(index)),
                Ordering::Greater => None,
            })
    }

    /// Shift the columns of folds starting on `row` at or after `column`
    ///
    /// Only folds on `row` move; the shift stops after the first multi-row
    /// fold. Edits strictly inside a fold are ignored.
    pub fn add_remove_chars(&mut self, row: usize, column: usize, len: isize) {
        let Some(next) = self.next_fold_to(row, column) else {
            return;
        };
        let index = match next {
            NextFold::Inside(index) if !self.folds[index].range.is_start(row, column) => {
                warn!(
                    row,
                    column,
                    fold = %self.folds[index],
                    "edit inside a collapsed fold ignored"
                );
                return;
            }
            NextFold::Inside(index) | NextFold::Before(index) => index,
        };
        if self.folds[index].start().row != row {
            return;
        }
        for fold in &mut self.folds[index..] {
            fold.range.start.column = shift_column(fold.range.start.column, len);
            if fold.is_multi_line() {
                return;
            }
            fold.range.end.column = shift_column(fold.range.end.column, len);
        }
    }

    /// Split off the folds after `(row, column)` into a new line
    ///
    /// A point at a fold's start splits before that fold. Returns `None`
    /// when the point is inside a fold or before the first fold, which
    /// leaves nothing to split.
    pub(crate) fn split(&mut self, row: usize, column: usize) -> Option<FoldLine> {
        let index = match self.next_fold_to(row, column)? {
            NextFold::Before(index) => index,
            NextFold::Inside(index) if self.folds[index].range.is_start(row, column) => index,
            NextFold::Inside(_) => return None,
        };
        match index {
            0 => None,
            index => {
                let tail = self.folds.split_off(index);
                debug!(row, column, moved = tail.len(), "fold line split");
                Some(Self::from_folds(tail))
            }
        }
    }

    /// Split at a point strictly inside one of the folds
    ///
    /// That fold is cut in two; its second half, identified by `tail_id`,
    /// heads the returned line together with every later fold.
    pub(crate) fn split_through(
        &mut self,
        row: usize,
        column: usize,
        tail_id: impl FnOnce() -> FoldId,
    ) -> Option<FoldLine> {
        let index = match self.next_fold_to(row, column)? {
            NextFold::Inside(index) if !self.folds[index].range.is_start(row, column) => index,
            _ => return None,
        };
        let mut tail = self.folds.split_off(index + 1);
        let cut = self.folds[index].split_at(Position::new(row, column), tail_id());
        debug!(row, column, fold = %cut, "fold cut by line break");
        tail.insert(0, cut);
        Some(Self::from_folds(tail))
    }

    /// Absorb every fold of `next`
    pub(crate) fn merge(&mut self, next: FoldLine) -> Result<()> {
        debug!(into = %self.range(), from = %next.range(), "fold lines merged");
        for fold in next.into_folds() {
            self.add_fold(fold)?;
        }
        Ok(())
    }
}
