//! A single collapsed region and its nested sub-folds

use crate::core::errors::{EditorError, Result};
use crate::core::position::{Position, Range, RangeRelation};

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stable identity of a fold, unique within its overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FoldId(pub(crate) u64);

impl FoldId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FoldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fold#{}", self.0)
    }
}

/// Make `pos` relative to `anchor`: rows count from the anchor row and
/// columns on that row count from the anchor column
fn consume_point(pos: Position, anchor: Position) -> Position {
    let row = pos.row - anchor.row;
    let column = if row == 0 {
        pos.column - anchor.column
    } else {
        pos.column
    };
    Position::new(row, column)
}

fn restore_point(pos: Position, anchor: Position) -> Position {
    let column = if pos.row == 0 {
        pos.column + anchor.column
    } else {
        pos.column
    };
    Position::new(pos.row + anchor.row, column)
}

/// A collapsed region rendered as a placeholder
///
/// Top-level folds carry document coordinates. Sub-folds carry coordinates
/// relative to the start of the fold that owns them; see
/// [`Fold::relative_to`] and [`Fold::absolute`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub(crate) id: FoldId,
    pub(crate) range: Range,
    pub(crate) placeholder: String,
    pub(crate) sub_folds: Vec<Fold>,
    pub(crate) collapse_children: usize,
}

impl Fold {
    pub(crate) fn new(id: FoldId, range: Range, placeholder: impl Into<String>) -> Self {
        Self {
            id,
            range,
            placeholder: placeholder.into(),
            sub_folds: Vec::new(),
            collapse_children: 0,
        }
    }

    pub fn id(&self) -> FoldId {
        self.id
    }

    pub fn range(&self) -> Range {
        self.range
    }

    pub fn start(&self) -> Position {
        self.range.start
    }

    pub fn end(&self) -> Position {
        self.range.end
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Nested folds in coordinates relative to this fold's start
    pub fn sub_folds(&self) -> &[Fold] {
        &self.sub_folds
    }

    /// How many nesting levels get re-collapsed when this fold expands
    pub fn collapse_children(&self) -> usize {
        self.collapse_children
    }

    pub fn is_multi_line(&self) -> bool {
        self.range.is_multi_line()
    }

    /// This fold with its range expressed relative to `parent_start`
    #[must_use]
    pub fn relative_to(&self, parent_start: Position) -> Self {
        Self {
            range: Range {
                start: consume_point(self.range.start, parent_start),
                end: consume_point(self.range.end, parent_start),
            },
            ..self.clone()
        }
    }

    /// This fold with a parent-relative range restored against `parent_start`
    #[must_use]
    pub fn absolute(&self, parent_start: Position) -> Self {
        Self {
            range: Range {
                start: restore_point(self.range.start, parent_start),
                end: restore_point(self.range.end, parent_start),
            },
            ..self.clone()
        }
    }

    /// Sub-folds converted to the coordinate frame this fold lives in
    pub fn absolute_sub_folds(&self) -> Vec<Fold> {
        self.sub_folds
            .iter()
            .map(|sub| sub.absolute(self.range.start))
            .collect()
    }

    /// Nest `fold`, given in this fold's own coordinate frame
    ///
    /// A fold equal to this one is ignored. A fold inside an existing
    /// sub-fold descends into it; existing sub-folds inside the new fold
    /// become its children.
    pub(crate) fn add_sub_fold(&mut self, fold: Fold) -> Result<()> {
        if fold.range == self.range {
            return Ok(());
        }
        let mut fold = fold.relative_to(self.range.start);

        for sub in &mut self.sub_folds {
            if sub.range == fold.range {
                return Ok(());
            }
            if sub.range.contains_range(&fold.range) {
                return sub.add_sub_fold(fold);
            }
        }

        if let Some(existing) = self.sub_folds.iter().find(|sub| {
            let relation = fold.range.compare_range(&sub.range);
            relation != RangeRelation::Inside
                && relation.intersects()
                && !touches_only(&fold.range, &sub.range)
        }) {
            return Err(EditorError::FoldOverlap {
                range: fold.range,
                existing: existing.range,
            });
        }

        let (swallowed, mut kept): (Vec<Fold>, Vec<Fold>) = std::mem::take(&mut self.sub_folds)
            .into_iter()
            .partition(|sub| fold.range.compare_range(&sub.range) == RangeRelation::Inside);
        for sub in swallowed {
            fold.add_sub_fold(sub)?;
        }
        let at = kept
            .iter()
            .position(|sub| sub.range.start > fold.range.start)
            .unwrap_or(kept.len());
        kept.insert(at, fold);
        self.sub_folds = kept;
        Ok(())
    }
}

impl Fold {
    /// Cut this fold at `at`, a point strictly inside it
    ///
    /// This fold keeps the text before `at`; the returned fold, identified
    /// by `tail_id`, covers the rest. Sub-folds straddling `at` are dropped.
    pub(crate) fn split_at(&mut self, at: Position, tail_id: FoldId) -> Fold {
        let subs = self.absolute_sub_folds();
        let start = self.range.start;
        let tail = Fold {
            id: tail_id,
            range: Range {
                start: at,
                end: self.range.end,
            },
            placeholder: self.placeholder.clone(),
            sub_folds: subs
                .iter()
                .filter(|sub| sub.start() >= at)
                .map(|sub| sub.relative_to(at))
                .collect(),
            collapse_children: self.collapse_children,
        };
        self.range.end = at;
        self.sub_folds = subs
            .iter()
            .filter(|sub| sub.end() <= at)
            .map(|sub| sub.relative_to(start))
            .collect();
        tail
    }
}

/// Whether two ranges only share an edge
pub(crate) fn touches_only(a: &Range, b: &Range) -> bool {
    a.end == b.start || b.end == a.start
}

impl fmt::Display for Fold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" {}", self.placeholder, self.range)?;
        if !self.sub_folds.is_empty() {
            write!(f, " with {} sub-fold(s)", self.sub_folds.len())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fold(id: u64, range: Range) -> Fold {
        Fold::new(FoldId(id), range, "...")
    }

    #[test]
    fn relative_and_absolute_are_inverse() {
        let parent_start = Position::new(3, 4);
        let child = fold(1, Range::new(3, 8, 5, 2));
        let relative = child.relative_to(parent_start);
        assert_eq!(relative.range(), Range::new(0, 4, 2, 2));
        assert_eq!(relative.absolute(parent_start), child);
    }

    #[test]
    fn sub_fold_nests_and_swallows() {
        let mut parent = fold(1, Range::new(0, 0, 10, 0));
        parent.add_sub_fold(fold(2, Range::new(2, 0, 2, 5))).unwrap();
        parent.add_sub_fold(fold(3, Range::new(4, 1, 4, 6))).unwrap();
        assert_eq!(parent.sub_folds().len(), 2);

        parent.add_sub_fold(fold(4, Range::new(1, 0, 5, 0))).unwrap();
        assert_eq!(parent.sub_folds().len(), 1);
        let outer = &parent.sub_folds()[0];
        assert_eq!(outer.id(), FoldId(4));
        assert_eq!(outer.range(), Range::new(1, 0, 5, 0));
        assert_eq!(outer.sub_folds().len(), 2);
        assert_eq!(outer.sub_folds()[0].range(), Range::new(1, 0, 1, 5));

        let restored: Vec<Range> = parent
            .absolute_sub_folds()
            .iter()
            .flat_map(Fold::absolute_sub_folds)
            .map(|f| f.range())
            .collect();
        assert_eq!(restored, vec![Range::new(2, 0, 2, 5), Range::new(4, 1, 4, 6)]);
    }

    #[test]
    fn sub_fold_descends_into_existing_child() {
        let mut parent = fold(1, Range::new(0, 0, 10, 0));
        parent.add_sub_fold(fold(2, Range::new(1, 0, 6, 0))).unwrap();
        parent.add_sub_fold(fold(3, Range::new(2, 0, 3, 0))).unwrap();
        assert_eq!(parent.sub_folds().len(), 1);
        assert_eq!(parent.sub_folds()[0].sub_folds().len(), 1);
    }

    #[test]
    fn partial_overlap_is_rejected() {
        let mut parent = fold(1, Range::new(0, 0, 10, 0));
        parent.add_sub_fold(fold(2, Range::new(2, 0, 4, 0))).unwrap();
        let err = parent
            .add_sub_fold(fold(3, Range::new(3, 0, 6, 0)))
            .unwrap_err();
        assert!(err.is_fold_error());
        assert_eq!(parent.sub_folds().len(), 1);
    }
}
