//! Ranges that remember which end holds the caret

use crate::core::position::{Position, Range};
use crate::core::range_list::RangeLike;

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identity of one range in a multi-range selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RangeId(pub(crate) u64);

impl RangeId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "range#{}", self.0)
    }
}

/// A selected range plus its orientation
///
/// The caret sits at `range.start` when `backwards` is set and at
/// `range.end` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrientedRange {
    pub range: Range,
    pub backwards: bool,
    pub id: RangeId,
}

impl OrientedRange {
    pub fn new(range: Range, backwards: bool, id: RangeId) -> Self {
        Self {
            range,
            backwards,
            id,
        }
    }

    /// Build from the selection's anchor and caret positions
    pub fn from_points(anchor: Position, cursor: Position, id: RangeId) -> Self {
        Self::new(Range::from_points(anchor, cursor), cursor < anchor, id)
    }

    /// Where the caret sits
    pub fn cursor(&self) -> Position {
        if self.backwards {
            self.range.start
        } else {
            self.range.end
        }
    }

    /// The fixed end opposite the caret
    pub fn anchor(&self) -> Position {
        if self.backwards {
            self.range.end
        } else {
            self.range.start
        }
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

impl RangeLike for OrientedRange {
    fn range(&self) -> Range {
        self.range
    }

    fn set_range(&mut self, range: Range) {
        self.range = range;
    }
}

impl fmt::Display for OrientedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arrow = if self.backwards { "<-" } else { "->" };
        write!(f, "{} {} {}", self.id, arrow, self.range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_follows_orientation() {
        let forward = OrientedRange::from_points(Position::new(0, 1), Position::new(2, 0), RangeId(1));
        assert!(!forward.backwards);
        assert_eq!(forward.cursor(), Position::new(2, 0));
        assert_eq!(forward.anchor(), Position::new(0, 1));

        let backward = OrientedRange::from_points(Position::new(2, 0), Position::new(0, 1), RangeId(2));
        assert!(backward.backwards);
        assert_eq!(backward.cursor(), Position::new(0, 1));
        assert_eq!(backward.range, forward.range);
    }
}
