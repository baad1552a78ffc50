//! Position and range types for document editing
//!
//! Positions are `(row, column)` pairs with a row-major total order.
//! Columns count Unicode scalar values inside a line. Ranges are half-open
//! `[start, end)` spans that are never stored inverted; selection
//! orientation is tracked separately by the selection model.

use core::cmp::Ordering;
use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A position in a document as a zero-based row and column
///
/// The derived ordering is row-major, then column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position {
    /// Zero-based line index
    pub row: usize,
    /// Zero-based column, counted in chars
    pub column: usize,
}

impl Position {
    /// Create a new position
    #[must_use]
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// Position at the start of the document
    #[must_use]
    pub const fn start() -> Self {
        Self { row: 0, column: 0 }
    }

    /// Check if this position is at the start of the document
    #[must_use]
    pub const fn is_start(&self) -> bool {
        self.row == 0 && self.column == 0
    }

    /// Compare two positions, the free-function form used by range lists
    #[must_use]
    pub fn compare(a: Self, b: Self) -> Ordering {
        a.cmp(&b)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.row, self.column)
    }
}

impl From<(usize, usize)> for Position {
    fn from((row, column): (usize, usize)) -> Self {
        Self { row, column }
    }
}

/// How a queried range relates to a reference range
///
/// Produced by [`Range::compare_range`]. `Inside` and `Surrounds` both mean
/// the two ranges intersect; callers that only care about intersection can
/// use [`RangeRelation::intersects`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeRelation {
    /// The query ends before the reference starts
    Before,
    /// The query starts before the reference and ends inside it
    OverlapsStart,
    /// The query lies within the reference
    Inside,
    /// The query starts before and ends after the reference
    Surrounds,
    /// The query starts inside the reference and ends after it
    OverlapsEnd,
    /// The query starts after the reference ends
    After,
    /// The query's end lies inside the reference while its start lies after
    /// the reference, which only happens for an inverted query
    Inverted,
}

impl RangeRelation {
    /// Numeric code of the relation: -2, -1, 0, 1, 2, or 42 for `Inverted`
    #[must_use]
    pub const fn code(self) -> i8 {
        match self {
            Self::Before => -2,
            Self::OverlapsStart => -1,
            Self::Inside | Self::Surrounds => 0,
            Self::OverlapsEnd => 1,
            Self::After => 2,
            Self::Inverted => 42,
        }
    }

    /// Whether the query and the reference share at least one point
    #[must_use]
    pub const fn intersects(self) -> bool {
        matches!(
            self,
            Self::OverlapsStart | Self::Inside | Self::Surrounds | Self::OverlapsEnd
        )
    }
}

/// A range in a document represented by start and end positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Range {
    /// Start position (inclusive)
    pub start: Position,
    /// End position (exclusive)
    pub end: Position,
}

impl Range {
    /// Create a new range from row/column pairs
    ///
    /// Automatically normalizes so start <= end
    #[must_use]
    pub fn new(start_row: usize, start_column: usize, end_row: usize, end_column: usize) -> Self {
        Self::from_points(
            Position::new(start_row, start_column),
            Position::new(end_row, end_column),
        )
    }

    /// Create a range from two points, normalizing the order
    #[must_use]
    pub fn from_points(a: Position, b: Position) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// Create an empty range at position
    #[must_use]
    pub const fn empty(pos: Position) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Check if range is empty (start == end)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if the range spans more than one row
    #[must_use]
    pub const fn is_multi_line(&self) -> bool {
        self.start.row != self.end.row
    }

    /// Check if the position is the start of this range
    #[must_use]
    pub fn is_start(&self, row: usize, column: usize) -> bool {
        self.start.row == row && self.start.column == column
    }

    /// Check if the position is the end of this range
    #[must_use]
    pub fn is_end(&self, row: usize, column: usize) -> bool {
        self.end.row == row && self.end.column == column
    }

    /// Locate a point relative to this range, edges count as inside
    ///
    /// `Less` means the point is before the range, `Greater` after it.
    #[must_use]
    pub fn compare(&self, row: usize, column: usize) -> Ordering {
        if !self.is_multi_line() && row == self.start.row {
            return if column < self.start.column {
                Ordering::Less
            } else if column > self.end.column {
                Ordering::Greater
            } else {
                Ordering::Equal
            };
        }

        if row < self.start.row {
            return Ordering::Less;
        }
        if row > self.end.row {
            return Ordering::Greater;
        }
        if self.start.row == row {
            return if column >= self.start.column {
                Ordering::Equal
            } else {
                Ordering::Less
            };
        }
        if self.end.row == row {
            return if column <= self.end.column {
                Ordering::Equal
            } else {
                Ordering::Greater
            };
        }
        Ordering::Equal
    }

    /// Like [`Range::compare`], but the start edge counts as before
    #[must_use]
    pub fn compare_start(&self, row: usize, column: usize) -> Ordering {
        if self.is_start(row, column) {
            Ordering::Less
        } else {
            self.compare(row, column)
        }
    }

    /// Like [`Range::compare`], but the end edge counts as after
    #[must_use]
    pub fn compare_end(&self, row: usize, column: usize) -> Ordering {
        if self.is_end(row, column) {
            Ordering::Greater
        } else {
            self.compare(row, column)
        }
    }

    /// Like [`Range::compare`], but both edges count as outside
    #[must_use]
    pub fn compare_inside(&self, row: usize, column: usize) -> Ordering {
        if self.is_end(row, column) {
            Ordering::Greater
        } else if self.is_start(row, column) {
            Ordering::Less
        } else {
            self.compare(row, column)
        }
    }

    /// Locate a position relative to this range
    #[must_use]
    pub fn compare_point(&self, pos: Position) -> Ordering {
        self.compare(pos.row, pos.column)
    }

    /// Relate another range to this one
    #[must_use]
    pub fn compare_range(&self, other: &Self) -> RangeRelation {
        match self.compare_point(other.end) {
            Ordering::Greater => match self.compare_point(other.start) {
                Ordering::Greater => RangeRelation::After,
                Ordering::Equal => RangeRelation::OverlapsEnd,
                Ordering::Less => RangeRelation::Surrounds,
            },
            Ordering::Less => RangeRelation::Before,
            Ordering::Equal => match self.compare_point(other.start) {
                Ordering::Less => RangeRelation::OverlapsStart,
                Ordering::Greater => RangeRelation::Inverted,
                Ordering::Equal => RangeRelation::Inside,
            },
        }
    }

    /// Check if range contains a point, edges inclusive
    #[must_use]
    pub fn contains(&self, row: usize, column: usize) -> bool {
        self.compare(row, column) == Ordering::Equal
    }

    /// Check if this range fully contains another
    #[must_use]
    pub fn contains_range(&self, other: &Self) -> bool {
        matches!(self.compare_range(other), RangeRelation::Inside)
    }

    /// Check if this range overlaps another, touching edges included
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.compare_range(other).intersects()
    }

    /// Check if the point is strictly inside, excluding both edges
    #[must_use]
    pub fn inside(&self, row: usize, column: usize) -> bool {
        self.compare(row, column) == Ordering::Equal
            && !self.is_end(row, column)
            && !self.is_start(row, column)
    }

    /// Extend range to include a position
    #[must_use]
    pub fn extend(&self, row: usize, column: usize) -> Self {
        let pos = Position::new(row, column);
        match self.compare(row, column) {
            Ordering::Less => Self::from_points(pos, self.end),
            Ordering::Greater => Self::from_points(self.start, pos),
            Ordering::Equal => *self,
        }
    }

    /// Get the union of two ranges (smallest range containing both)
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Clamp the rows of this range to `[first_row, last_row]`
    ///
    /// Rows past `last_row` become the start of the following row, rows
    /// before `first_row` become the start of `first_row`.
    #[must_use]
    pub fn clip_rows(&self, first_row: usize, last_row: usize) -> Self {
        let clip = |pos: Position| {
            if pos.row > last_row {
                Position::new(last_row + 1, 0)
            } else if pos.row < first_row {
                Position::new(first_row, 0)
            } else {
                pos
            }
        };
        Self::from_points(clip(self.start), clip(self.end))
    }

    /// Range covering whole rows from start row to end row
    #[must_use]
    pub fn collapse_rows(&self) -> Self {
        if self.end.column == 0 && self.end.row > self.start.row {
            Self::new(self.start.row, 0, self.end.row - 1, 0)
        } else {
            Self::new(self.start.row, 0, self.end.row, 0)
        }
    }

    /// Shift the whole range by whole rows and columns
    #[must_use]
    pub fn move_by(&self, rows: usize, columns: usize) -> Self {
        Self {
            start: Position::new(self.start.row + rows, self.start.column + columns),
            end: Position::new(self.end.row + rows, self.end.column + columns),
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} -> {}]", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_ordering_is_row_major() {
        assert!(Position::new(0, 9) < Position::new(1, 0));
        assert!(Position::new(2, 1) < Position::new(2, 3));
        assert_eq!(
            Position::compare(Position::new(1, 1), Position::new(1, 1)),
            Ordering::Equal
        );
    }

    #[test]
    fn range_normalizes_inverted_points() {
        let range = Range::new(3, 4, 1, 2);
        assert_eq!(range.start, Position::new(1, 2));
        assert_eq!(range.end, Position::new(3, 4));
        assert!(range.is_multi_line());
    }

    #[test]
    fn compare_edges_are_inside() {
        let range = Range::new(1, 2, 3, 4);
        assert_eq!(range.compare(1, 2), Ordering::Equal);
        assert_eq!(range.compare(3, 4), Ordering::Equal);
        assert_eq!(range.compare(1, 1), Ordering::Less);
        assert_eq!(range.compare(3, 5), Ordering::Greater);
        assert_eq!(range.compare_end(3, 4), Ordering::Greater);
        assert_eq!(range.compare_start(1, 2), Ordering::Less);
        assert_eq!(range.compare_inside(2, 0), Ordering::Equal);
    }

    #[test]
    fn compare_range_relations() {
        let range = Range::new(1, 0, 1, 10);
        assert_eq!(
            range.compare_range(&Range::new(0, 0, 0, 5)),
            RangeRelation::Before
        );
        assert_eq!(
            range.compare_range(&Range::new(0, 0, 1, 5)),
            RangeRelation::OverlapsStart
        );
        assert_eq!(
            range.compare_range(&Range::new(1, 2, 1, 5)),
            RangeRelation::Inside
        );
        assert_eq!(
            range.compare_range(&Range::new(0, 0, 2, 0)),
            RangeRelation::Surrounds
        );
        assert_eq!(
            range.compare_range(&Range::new(1, 5, 2, 0)),
            RangeRelation::OverlapsEnd
        );
        assert_eq!(
            range.compare_range(&Range::new(2, 0, 2, 5)),
            RangeRelation::After
        );
    }

    #[test]
    fn inverted_query_is_reported() {
        let range = Range::new(0, 0, 0, 5);
        let inverted = Range {
            start: Position::new(0, 6),
            end: Position::new(0, 5),
        };
        let relation = range.compare_range(&inverted);
        assert_eq!(relation, RangeRelation::Inverted);
        assert_eq!(relation.code(), 42);
        assert!(!relation.intersects());
    }

    #[test]
    fn extend_and_union() {
        let range = Range::new(1, 2, 1, 4);
        assert_eq!(range.extend(0, 0), Range::new(0, 0, 1, 4));
        assert_eq!(range.extend(2, 1), Range::new(1, 2, 2, 1));
        assert_eq!(range.extend(1, 3), range);
        assert_eq!(
            range.union(&Range::new(1, 3, 3, 0)),
            Range::new(1, 2, 3, 0)
        );
    }

    #[test]
    fn inside_excludes_edges() {
        let range = Range::new(0, 2, 0, 6);
        assert!(range.inside(0, 3));
        assert!(!range.inside(0, 2));
        assert!(!range.inside(0, 6));
        assert!(range.contains(0, 6));
    }

    #[test]
    fn clip_and_collapse_rows() {
        let range = Range::new(0, 3, 10, 2);
        assert_eq!(range.clip_rows(2, 5), Range::new(2, 0, 6, 0));
        assert_eq!(Range::new(2, 3, 4, 0).collapse_rows(), Range::new(2, 0, 3, 0));
        assert_eq!(Range::new(2, 3, 4, 1).collapse_rows(), Range::new(2, 0, 4, 0));
    }

    #[test]
    fn display_format() {
        assert_eq!(Range::new(0, 1, 2, 3).to_string(), "[0/1 -> 2/3]");
        assert_eq!(Position::new(4, 5).to_string(), "4/5");
    }
}
