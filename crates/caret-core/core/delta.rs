//! Atomic edit descriptions and their geometry
//!
//! A [`Delta`] is the only way text changes. It carries enough information
//! to be applied to a line array, to be inverted, and to move any point in
//! the document the way the edit moved the text around it.

use super::errors::{EditorError, Result};
use super::position::{Position, Range};
use crate::utils::text::{byte_index, char_len, char_slice};

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Whether a delta inserts or removes text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DeltaAction {
    Insert,
    Remove,
}

impl DeltaAction {
    /// The opposite action
    #[must_use]
    pub const fn invert(self) -> Self {
        match self {
            Self::Insert => Self::Remove,
            Self::Remove => Self::Insert,
        }
    }

    /// Lowercase name used in diagnostics
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Remove => "remove",
        }
    }
}

impl fmt::Display for DeltaAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An atomic insert or remove
///
/// For inserts `end` is the position right after the last inserted char.
/// For removes `lines` holds the removed text so the delta can be reverted.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Delta {
    pub action: DeltaAction,
    pub start: Position,
    pub end: Position,
    pub lines: Vec<String>,
}

impl Delta {
    /// Build an insert delta, deriving `end` from the inserted lines
    #[must_use]
    pub fn insert(start: Position, lines: Vec<String>) -> Self {
        let end = Self::end_for(start, &lines);
        Self {
            action: DeltaAction::Insert,
            start,
            end,
            lines,
        }
    }

    /// Build a remove delta for `[start, end)` that removed `lines`
    #[must_use]
    pub fn remove(start: Position, end: Position, lines: Vec<String>) -> Self {
        Self {
            action: DeltaAction::Remove,
            start,
            end,
            lines,
        }
    }

    /// Position right after `lines` when they are placed at `start`
    #[must_use]
    pub fn end_for(start: Position, lines: &[String]) -> Position {
        let last = lines.last().map_or(0, |line| char_len(line));
        if lines.len() <= 1 {
            Position::new(start.row, start.column + last)
        } else {
            Position::new(start.row + lines.len() - 1, last)
        }
    }

    #[must_use]
    pub const fn is_insert(&self) -> bool {
        matches!(self.action, DeltaAction::Insert)
    }

    /// The span this delta covers in the document where it is the newest edit
    #[must_use]
    pub const fn range(&self) -> Range {
        Range {
            start: self.start,
            end: self.end,
        }
    }

    /// Number of row boundaries the delta adds or removes
    #[must_use]
    pub const fn row_span(&self) -> usize {
        self.end.row - self.start.row
    }

    /// Whether applying this delta would change nothing
    #[must_use]
    pub fn is_noop(&self) -> bool {
        match self.action {
            DeltaAction::Insert => {
                self.lines.len() <= 1 && self.lines.first().map_or(true, String::is_empty)
            }
            DeltaAction::Remove => self.start == self.end,
        }
    }

    /// The delta that undoes this one
    #[must_use]
    pub fn inverted(&self) -> Self {
        Self {
            action: self.action.invert(),
            start: self.start,
            end: self.end,
            lines: self.lines.clone(),
        }
    }

    /// Where `point` lands after this delta is applied
    ///
    /// Inserts are treated as a zero-width edit at `start`. A point exactly
    /// at the edit moves along with inserted text only when `move_if_equal`
    /// is set. Points inside a removed span collapse to `start`.
    #[must_use]
    pub fn transform_point(&self, point: Position, move_if_equal: bool) -> Position {
        let edit_end = if self.is_insert() { self.start } else { self.end };

        if point < self.start || (point == self.start && !move_if_equal) {
            return point;
        }

        if point > edit_end || (point == edit_end && move_if_equal) {
            let on_end_row = point.row == edit_end.row;
            return match self.action {
                DeltaAction::Insert => Position::new(
                    point.row + self.row_span(),
                    if on_end_row {
                        point.column - self.start.column + self.end.column
                    } else {
                        point.column
                    },
                ),
                DeltaAction::Remove => Position::new(
                    point.row - self.row_span(),
                    if on_end_row {
                        point.column - self.end.column + self.start.column
                    } else {
                        point.column
                    },
                ),
            };
        }

        self.start
    }

    /// Check that `end` agrees with `start` and `lines`
    pub fn check_shape(&self) -> Result<()> {
        if self.end < self.start {
            return Err(self.error("end precedes start"));
        }
        let rows = self.row_span();
        if self.lines.len() != rows + 1 {
            return Err(self.error("delta range must match delta lines"));
        }
        let expected = self.end.column - if rows == 0 { self.start.column } else { 0 };
        if char_len(&self.lines[rows]) != expected {
            return Err(self.error("delta range must match delta lines"));
        }
        Ok(())
    }

    pub(crate) fn error(&self, message: &str) -> EditorError {
        EditorError::invalid_delta(self.action.as_str(), self.start, self.end, message)
    }

    /// Split an oversized insert into chunks of at most `max_lines` lines
    ///
    /// Every chunk but the last ends with an empty line so it leaves the
    /// cursor at column 0 of the row where the next chunk continues.
    /// Removes and inserts within the limit come back unchanged.
    #[must_use]
    pub fn split_large(self, max_lines: usize) -> Vec<Self> {
        let max_lines = max_lines.max(2);
        if !self.is_insert() || self.lines.len() <= max_lines {
            return vec![self];
        }

        let row = self.start.row;
        let mut column = self.start.column;
        let limit = self.lines.len() - max_lines + 1;
        let mut chunks = Vec::new();
        let mut from = 0;
        while from < limit {
            let to = from + max_lines - 1;
            let mut lines = self.lines[from..to].to_vec();
            lines.push(String::new());
            chunks.push(Self {
                action: DeltaAction::Insert,
                start: Position::new(row + from, column),
                end: Position::new(row + to, 0),
                lines,
            });
            column = 0;
            from = to;
        }

        chunks.push(Self {
            action: DeltaAction::Insert,
            start: Position::new(row + from, column),
            end: self.end,
            lines: self.lines[from..].to_vec(),
        });
        chunks
    }

    /// Apply this delta to a line array in place
    ///
    /// The array must address the delta's positions; see
    /// [`Document::validate_delta`](crate::core::Document::validate_delta).
    pub(crate) fn apply_to_lines(&self, doc_lines: &mut Vec<String>) {
        let row = self.start.row;
        if row >= doc_lines.len() {
            return;
        }
        let line = doc_lines[row].clone();
        let split = byte_index(&line, self.start.column);

        match self.action {
            DeltaAction::Insert => {
                if self.lines.len() == 1 {
                    doc_lines[row] = format!("{}{}{}", &line[..split], self.lines[0], &line[split..]);
                } else {
                    let last_row = row + self.lines.len() - 1;
                    doc_lines.splice(row..=row, self.lines.iter().cloned());
                    doc_lines[row].insert_str(0, &line[..split]);
                    doc_lines[last_row].push_str(&line[split..]);
                }
            }
            DeltaAction::Remove => {
                let end_row = self.end.row.min(doc_lines.len() - 1);
                if row == end_row {
                    let tail = byte_index(&line, self.end.column);
                    doc_lines[row] = format!("{}{}", &line[..split], &line[tail..]);
                } else {
                    let end_line = &doc_lines[end_row];
                    let tail = char_slice(end_line, self.end.column, usize::MAX);
                    let joined = format!("{}{}", &line[..split], tail);
                    doc_lines.splice(row..=end_row, std::iter::once(joined));
                }
            }
        }
    }
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({} line{})",
            self.action,
            self.range(),
            self.lines.len(),
            if self.lines.len() == 1 { "" } else { "s" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn insert_end_is_derived() {
        let single = Delta::insert(Position::new(2, 3), lines(&["abc"]));
        assert_eq!(single.end, Position::new(2, 6));

        let multi = Delta::insert(Position::new(2, 3), lines(&["abc", "de"]));
        assert_eq!(multi.end, Position::new(3, 2));
        assert_eq!(multi.row_span(), 1);
    }

    #[test]
    fn noop_detection() {
        assert!(Delta::insert(Position::new(0, 0), lines(&[""])).is_noop());
        assert!(!Delta::insert(Position::new(0, 0), lines(&["", ""])).is_noop());
        let pos = Position::new(1, 1);
        assert!(Delta::remove(pos, pos, lines(&[""])).is_noop());
    }

    #[test]
    fn apply_single_line_insert_and_remove() {
        let mut doc = lines(&["hello world"]);
        let insert = Delta::insert(Position::new(0, 5), lines(&[","]));
        insert.apply_to_lines(&mut doc);
        assert_eq!(doc, lines(&["hello, world"]));

        insert.inverted().apply_to_lines(&mut doc);
        assert_eq!(doc, lines(&["hello world"]));
    }

    #[test]
    fn apply_multi_line_insert_and_remove() {
        let mut doc = lines(&["abcdef", "xyz"]);
        let insert = Delta::insert(Position::new(0, 3), lines(&["1", "2", "3"]));
        insert.apply_to_lines(&mut doc);
        assert_eq!(doc, lines(&["abc1", "2", "3def", "xyz"]));
        assert_eq!(insert.end, Position::new(2, 1));

        insert.inverted().apply_to_lines(&mut doc);
        assert_eq!(doc, lines(&["abcdef", "xyz"]));
    }

    #[test]
    fn apply_handles_multibyte_columns() {
        let mut doc = lines(&["añb"]);
        Delta::insert(Position::new(0, 2), lines(&["ü"])).apply_to_lines(&mut doc);
        assert_eq!(doc, lines(&["añüb"]));
        Delta::remove(Position::new(0, 1), Position::new(0, 3), lines(&["ñü"]))
            .apply_to_lines(&mut doc);
        assert_eq!(doc, lines(&["ab"]));
    }

    #[test]
    fn transform_point_before_and_after() {
        let insert = Delta::insert(Position::new(0, 0), lines(&["XYZ"]));
        assert_eq!(
            insert.transform_point(Position::new(0, 6), false),
            Position::new(0, 9)
        );
        assert_eq!(
            insert.transform_point(Position::new(1, 6), false),
            Position::new(1, 6)
        );

        let newline = Delta::insert(Position::new(1, 2), lines(&["", ""]));
        assert_eq!(
            newline.transform_point(Position::new(1, 4), false),
            Position::new(2, 2)
        );
        assert_eq!(
            newline.transform_point(Position::new(3, 4), false),
            Position::new(4, 4)
        );
    }

    #[test]
    fn transform_point_tie_break() {
        let insert = Delta::insert(Position::new(0, 3), lines(&["ab"]));
        assert_eq!(
            insert.transform_point(Position::new(0, 3), false),
            Position::new(0, 3)
        );
        assert_eq!(
            insert.transform_point(Position::new(0, 3), true),
            Position::new(0, 5)
        );
    }

    #[test]
    fn transform_point_inside_removed_span_snaps_to_start() {
        let remove = Delta::remove(
            Position::new(1, 2),
            Position::new(3, 1),
            lines(&["cd", "", "x"]),
        );
        assert_eq!(
            remove.transform_point(Position::new(2, 0), false),
            Position::new(1, 2)
        );
        assert_eq!(
            remove.transform_point(Position::new(3, 4), false),
            Position::new(1, 5)
        );
        assert_eq!(
            remove.transform_point(Position::new(5, 4), false),
            Position::new(3, 4)
        );
    }

    #[test]
    fn shape_check_rejects_mismatched_lines() {
        let good = Delta::insert(Position::new(0, 1), lines(&["ab", "c"]));
        assert!(good.check_shape().is_ok());

        let bad = Delta {
            action: DeltaAction::Insert,
            start: Position::new(0, 1),
            end: Position::new(0, 9),
            lines: lines(&["ab"]),
        };
        assert!(matches!(
            bad.check_shape(),
            Err(EditorError::InvalidDelta { .. })
        ));
    }

    #[test]
    fn split_large_chunks_at_empty_lines() {
        let text: Vec<String> = (0..5).map(|i| format!("l{i}")).collect();
        let delta = Delta::insert(Position::new(1, 4), text);
        let end = delta.end;
        let chunks = delta.split_large(3);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].start, Position::new(1, 4));
        assert_eq!(chunks[0].end, Position::new(3, 0));
        assert_eq!(chunks[0].lines, lines(&["l0", "l1", ""]));
        assert_eq!(chunks[1].start, Position::new(3, 0));
        assert_eq!(chunks[1].lines, lines(&["l2", "l3", ""]));
        assert_eq!(chunks[2].start, Position::new(5, 0));
        assert_eq!(chunks[2].end, end);
        for chunk in &chunks {
            assert!(chunk.check_shape().is_ok());
        }
    }
}
