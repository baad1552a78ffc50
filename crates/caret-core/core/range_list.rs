//! Sorted, mergeable range collections
//!
//! [`RangeList`] keeps ranges ordered by start position, drops the ranges a
//! new one spans and can be kept in sync with a document through
//! [`SharedRangeList`]. The multi-range selection is built on it.

use super::delta::Delta;
use super::document::{Document, WeakDocument};
use super::errors::{EditorError, Result};
use super::position::{Position, Range};
use crate::events::ListenerId;

use core::cell::{Ref, RefCell, RefMut};
use core::fmt;
use std::rc::Rc;

use tracing::warn;

/// Anything that has a document range and can be moved
pub trait RangeLike: Clone {
    /// The current range
    fn range(&self) -> Range;

    /// Replace the range, keeping whatever else the value carries
    fn set_range(&mut self, range: Range);

    fn start(&self) -> Position {
        self.range().start
    }

    fn end(&self) -> Position {
        self.range().end
    }

    fn is_empty(&self) -> bool {
        self.range().is_empty()
    }
}

impl RangeLike for Range {
    fn range(&self) -> Range {
        *self
    }

    fn set_range(&mut self, range: Range) {
        *self = range;
    }
}

/// Ordered collection of ranges
#[derive(Clone, PartialEq, Eq)]
pub struct RangeList<R> {
    ranges: Vec<R>,
    insert_right: bool,
}

impl<R: RangeLike> RangeList<R> {
    /// Create an empty list
    pub fn new() -> Self {
        Self {
            ranges: Vec::new(),
            insert_right: true,
        }
    }

    /// Take ranges as they are; call [`RangeList::merge`] to normalize
    pub fn from_ranges(ranges: Vec<R>) -> Self {
        Self {
            ranges,
            insert_right: true,
        }
    }

    /// Whether an insert exactly at a range edge pushes that edge right
    pub fn insert_right(&self) -> bool {
        self.insert_right
    }

    pub fn set_insert_right(&mut self, insert_right: bool) {
        self.insert_right = insert_right;
    }

    pub fn ranges(&self) -> &[R] {
        &self.ranges
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&R> {
        self.ranges.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.ranges.iter()
    }

    /// Locate the range containing `pos`, scanning from `start_index`
    ///
    /// Returns `Ok(index)` on a hit and `Err(insertion_index)` otherwise.
    /// With `exclude_edges` a point on a range edge only hits when the
    /// range is empty or the point is its start.
    pub fn point_index(
        &self,
        pos: Position,
        exclude_edges: bool,
        start_index: usize,
    ) -> core::result::Result<usize, usize> {
        for (index, range) in self.ranges.iter().enumerate().skip(start_index) {
            let cmp_end = pos.cmp(&range.end());
            if cmp_end.is_gt() {
                continue;
            }
            let cmp_start = pos.cmp(&range.start());
            if cmp_end.is_eq() {
                return if exclude_edges && !cmp_start.is_eq() {
                    Err(index + 1)
                } else {
                    Ok(index)
                };
            }
            if cmp_start.is_gt() || (cmp_start.is_eq() && !exclude_edges) {
                return Ok(index);
            }
            return Err(index);
        }
        Err(self.ranges.len().max(start_index))
    }

    /// Insert a range, replacing every range it fully spans
    ///
    /// Ranges that only partly overlap the new one stay listed next to it
    /// until [`RangeList::merge`] coalesces them. Returns the replaced
    /// ranges.
    pub fn add(&mut self, range: R) -> Vec<R> {
        let (start, end) = (range.start(), range.end());
        let removed = self.remove_where(|listed| start <= listed.start() && listed.end() <= end);
        let index = self.ranges.partition_point(|listed| listed.start() <= start);
        self.ranges.insert(index, range);
        removed
    }

    /// Add several ranges, newest last, collecting everything replaced
    pub fn add_list(&mut self, list: Vec<R>) -> Vec<R> {
        let mut removed = Vec::new();
        for range in list.into_iter().rev() {
            removed.extend(self.add(range));
        }
        removed
    }

    /// Remove the range containing `pos`
    pub fn substract_point(&mut self, pos: Position) -> Option<R> {
        self.point_index(pos, false, 0)
            .ok()
            .map(|index| self.ranges.remove(index))
    }

    /// Sort by start and coalesce overlapping ranges, returning the removed
    ///
    /// Ranges that merely touch are kept apart when both are non-empty or
    /// when the later one is empty.
    pub fn merge(&mut self) -> Vec<R> {
        let mut removed = Vec::new();
        self.ranges.sort_by(|a, b| a.start().cmp(&b.start()));

        let mut index = 1;
        while index < self.ranges.len() {
            let current = self.ranges[index - 1].range();
            let next = self.ranges[index].range();
            let cmp = current.end.cmp(&next.start);
            let touching_only = cmp.is_eq() && (next.is_empty() || !current.is_empty());
            if cmp.is_lt() || touching_only {
                index += 1;
                continue;
            }
            if current.end < next.end {
                self.ranges[index - 1].set_range(Range {
                    start: current.start,
                    end: next.end,
                });
            }
            removed.push(self.ranges.remove(index));
        }
        removed
    }

    /// Whether some range contains `pos`, edges included
    pub fn contains_point(&self, pos: Position) -> bool {
        self.point_index(pos, false, 0).is_ok()
    }

    /// The range containing `pos`, edges included
    pub fn range_at_point(&self, pos: Position) -> Option<&R> {
        self.point_index(pos, false, 0)
            .ok()
            .and_then(|index| self.ranges.get(index))
    }

    /// Ranges touching rows `first_row..=last_row`
    pub fn clip_rows(&self, first_row: usize, last_row: usize) -> Vec<R> {
        self.ranges
            .iter()
            .filter(|range| range.end().row >= first_row && range.start().row <= last_row)
            .cloned()
            .collect()
    }

    /// Remove every range
    pub fn remove_all(&mut self) -> Vec<R> {
        std::mem::take(&mut self.ranges)
    }

    /// Remove the ranges matching a predicate
    pub fn remove_where<F>(&mut self, mut predicate: F) -> Vec<R>
    where
        F: FnMut(&R) -> bool,
    {
        let mut removed = Vec::new();
        let mut index = 0;
        while index < self.ranges.len() {
            if predicate(&self.ranges[index]) {
                removed.push(self.ranges.remove(index));
            } else {
                index += 1;
            }
        }
        removed
    }

    /// Mutable access to a range; the caller keeps the order intact
    pub fn get_mut(&mut self, index: usize) -> Option<&mut R> {
        self.ranges.get_mut(index)
    }

    /// Move every range the way `delta` moved the text
    ///
    /// When an insert lands exactly where a non-empty range ends and the
    /// next range begins, the earlier range keeps its end.
    pub fn apply_delta(&mut self, delta: &Delta) {
        let insert_right = self.insert_right;
        let shared_edge_at = |ranges: &[R], index: usize| {
            delta.is_insert()
                && insert_right
                && ranges[index].end() == delta.start
                && !ranges[index].is_empty()
                && ranges
                    .get(index + 1)
                    .is_some_and(|next| next.start() == delta.start)
        };

        for index in 0..self.ranges.len() {
            let range = self.ranges[index].range();
            if range.end < delta.start {
                continue;
            }
            let start = delta.transform_point(range.start, insert_right);
            let end = if shared_edge_at(&self.ranges, index) {
                range.end
            } else {
                delta.transform_point(range.end, insert_right)
            };
            if start != range.start || end != range.end {
                self.ranges[index].set_range(Range { start, end });
            }
        }
    }
}

impl<R: RangeLike> Default for RangeList<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RangeLike> fmt::Debug for RangeList<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.ranges.iter().map(RangeLike::range))
            .finish()
    }
}

impl<'a, R: RangeLike> IntoIterator for &'a RangeList<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}

/// A [`RangeList`] that can follow a document's edits
///
/// The list is shared with the document listener; it detaches on drop.
pub struct SharedRangeList<R> {
    list: Rc<RefCell<RangeList<R>>>,
    doc: Option<WeakDocument>,
    subscription: Option<ListenerId>,
}

impl<R: RangeLike + 'static> SharedRangeList<R> {
    /// Create a detached, empty list
    pub fn new() -> Self {
        Self {
            list: Rc::new(RefCell::new(RangeList::new())),
            doc: None,
            subscription: None,
        }
    }

    /// Start following `doc`, leaving any previous document
    pub fn attach(&mut self, doc: &Document) {
        self.detach();
        let list = Rc::downgrade(&self.list);
        let id = doc.on_change(move |delta| {
            let Some(list) = list.upgrade() else {
                return;
            };
            match list.try_borrow_mut() {
                Ok(mut list) => list.apply_delta(delta),
                Err(_) => warn!(%delta, "range list busy, delta not applied"),
            };
        });
        self.doc = Some(doc.downgrade());
        self.subscription = Some(id);
    }

    /// Stop following the document
    pub fn detach(&mut self) {
        if let (Some(doc), Some(id)) = (self.doc.take(), self.subscription.take()) {
            if let Ok(doc) = doc.upgrade() {
                doc.off_change(id);
            }
        }
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some() && self.doc.as_ref().is_some_and(WeakDocument::is_alive)
    }

    /// The followed document
    pub fn document(&self) -> Result<Document> {
        match &self.doc {
            Some(doc) => doc.upgrade(),
            None => Err(EditorError::DocumentReleased),
        }
    }

    pub fn borrow(&self) -> Ref<'_, RangeList<R>> {
        self.list.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, RangeList<R>> {
        self.list.borrow_mut()
    }
}

impl<R: RangeLike + 'static> Default for SharedRangeList<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Drop for SharedRangeList<R> {
    fn drop(&mut self) {
        if let (Some(doc), Some(id)) = (self.doc.take(), self.subscription.take()) {
            if let Ok(doc) = doc.upgrade() {
                doc.off_change(id);
            }
        }
    }
}

impl<R: RangeLike> fmt::Debug for SharedRangeList<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedRangeList")
            .field("ranges", &self.list.borrow())
            .field("attached", &self.subscription.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn list(ranges: &[(usize, usize, usize, usize)]) -> RangeList<Range> {
        RangeList::from_ranges(
            ranges
                .iter()
                .map(|&(sr, sc, er, ec)| Range::new(sr, sc, er, ec))
                .collect(),
        )
    }

    #[test]
    fn point_index_hits_and_misses() {
        let ranges = list(&[(0, 0, 0, 3), (0, 5, 0, 8), (2, 0, 2, 0)]);
        assert_eq!(ranges.point_index(Position::new(0, 1), false, 0), Ok(0));
        assert_eq!(ranges.point_index(Position::new(0, 4), false, 0), Err(1));
        assert_eq!(ranges.point_index(Position::new(0, 8), false, 0), Ok(1));
        assert_eq!(ranges.point_index(Position::new(0, 8), true, 0), Err(2));
        assert_eq!(ranges.point_index(Position::new(0, 5), true, 0), Err(1));
        assert_eq!(ranges.point_index(Position::new(2, 0), true, 0), Ok(2));
        assert_eq!(ranges.point_index(Position::new(3, 0), false, 0), Err(3));
    }

    #[test]
    fn add_replaces_spanned_ranges() {
        let mut ranges = list(&[(0, 2, 0, 3), (0, 4, 0, 4), (1, 0, 1, 1)]);
        let removed = ranges.add(Range::new(0, 1, 0, 5));
        assert_eq!(removed, vec![Range::new(0, 2, 0, 3), Range::new(0, 4, 0, 4)]);
        assert_eq!(
            ranges.ranges(),
            &[Range::new(0, 1, 0, 5), Range::new(1, 0, 1, 1)]
        );
    }

    #[test]
    fn add_keeps_partial_overlaps() {
        let mut ranges = list(&[(0, 0, 0, 2), (0, 4, 0, 6)]);
        let removed = ranges.add(Range::new(0, 1, 0, 5));
        assert!(removed.is_empty());
        assert_eq!(
            ranges.ranges(),
            &[Range::new(0, 0, 0, 2), Range::new(0, 1, 0, 5), Range::new(0, 4, 0, 6)]
        );

        let removed = ranges.merge();
        assert_eq!(removed.len(), 2);
        assert_eq!(ranges.ranges(), &[Range::new(0, 0, 0, 6)]);
    }

    #[test]
    fn cursor_inside_a_range_is_kept_apart() {
        let mut ranges = list(&[(0, 0, 0, 4)]);
        assert!(ranges.add(Range::new(0, 2, 0, 2)).is_empty());
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges.add(Range::new(0, 2, 0, 2)), vec![Range::new(0, 2, 0, 2)]);
        assert_eq!(ranges.len(), 2);
    }

    #[test]
    fn add_keeps_touching_ranges() {
        let mut ranges = list(&[(0, 0, 0, 3)]);
        let removed = ranges.add(Range::new(0, 3, 0, 6));
        assert!(removed.is_empty());
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges.ranges()[1], Range::new(0, 3, 0, 6));
    }

    #[test]
    fn add_list_collects_replaced() {
        let mut ranges = list(&[(0, 2, 0, 2)]);
        let removed = ranges.add_list(vec![Range::new(0, 0, 0, 4), Range::new(1, 0, 1, 2)]);
        assert_eq!(removed, vec![Range::new(0, 2, 0, 2)]);
        assert_eq!(ranges.len(), 2);
    }

    #[test]
    fn merge_coalesces_overlaps() {
        let mut ranges = list(&[(0, 2, 0, 5), (0, 0, 0, 3), (1, 0, 1, 4)]);
        let removed = ranges.merge();
        assert_eq!(removed, vec![Range::new(0, 2, 0, 5)]);
        assert_eq!(
            ranges.ranges(),
            &[Range::new(0, 0, 0, 5), Range::new(1, 0, 1, 4)]
        );
    }

    #[test]
    fn merge_tie_breaks() {
        let mut cursors = list(&[(0, 3, 0, 3), (0, 3, 0, 3)]);
        assert!(cursors.merge().is_empty());
        assert_eq!(cursors.len(), 2);

        let mut touching = list(&[(0, 0, 0, 3), (0, 3, 0, 6)]);
        assert!(touching.merge().is_empty());

        let mut cursor_after = list(&[(0, 0, 0, 3), (0, 3, 0, 3)]);
        assert!(cursor_after.merge().is_empty());

        let mut cursor_before = list(&[(0, 3, 0, 3), (0, 3, 0, 6)]);
        assert_eq!(cursor_before.merge().len(), 1);
        assert_eq!(cursor_before.ranges(), &[Range::new(0, 3, 0, 6)]);
    }

    #[test]
    fn substract_and_lookup() {
        let mut ranges = list(&[(0, 0, 0, 3), (1, 0, 1, 3)]);
        assert!(ranges.contains_point(Position::new(1, 3)));
        assert_eq!(
            ranges.range_at_point(Position::new(0, 2)),
            Some(&Range::new(0, 0, 0, 3))
        );
        assert_eq!(
            ranges.substract_point(Position::new(1, 1)),
            Some(Range::new(1, 0, 1, 3))
        );
        assert_eq!(ranges.substract_point(Position::new(5, 0)), None);
        assert_eq!(ranges.len(), 1);
    }

    #[test]
    fn clip_rows_and_remove_all() {
        let mut ranges = list(&[(0, 0, 0, 1), (2, 0, 4, 0), (6, 0, 6, 1)]);
        assert_eq!(ranges.clip_rows(3, 5), vec![Range::new(2, 0, 4, 0)]);
        assert_eq!(ranges.remove_all().len(), 3);
        assert!(ranges.is_empty());
    }

    #[test]
    fn delta_moves_ranges() {
        let mut ranges = list(&[(0, 1, 0, 3), (1, 2, 1, 4)]);
        ranges.apply_delta(&Delta::insert(Position::new(0, 0), vec!["ab".into(), String::new()]));
        assert_eq!(
            ranges.ranges(),
            &[Range::new(1, 1, 1, 3), Range::new(2, 2, 2, 4)]
        );

        ranges.apply_delta(&Delta::remove(
            Position::new(1, 2),
            Position::new(2, 3),
            vec!["x".into(), "yyy".into()],
        ));
        assert_eq!(
            ranges.ranges(),
            &[Range::new(1, 1, 1, 2), Range::new(1, 2, 1, 3)]
        );
    }

    #[test]
    fn shared_edge_keeps_earlier_end() {
        let mut ranges = list(&[(0, 0, 0, 3), (0, 3, 0, 6)]);
        ranges.apply_delta(&Delta::insert(Position::new(0, 3), vec!["zz".into()]));
        assert_eq!(
            ranges.ranges(),
            &[Range::new(0, 0, 0, 3), Range::new(0, 5, 0, 8)]
        );
    }

    #[test]
    fn shared_list_follows_document() {
        let doc = Document::new("hello world");
        let mut shared: SharedRangeList<Range> = SharedRangeList::new();
        shared.attach(&doc);
        shared.borrow_mut().add(Range::new(0, 6, 0, 11));

        doc.insert(Position::new(0, 0), ">> ");
        assert_eq!(shared.borrow().ranges(), &[Range::new(0, 9, 0, 14)]);

        shared.detach();
        doc.insert(Position::new(0, 0), "!");
        assert_eq!(shared.borrow().ranges(), &[Range::new(0, 9, 0, 14)]);
        assert!(!shared.is_attached());
    }

    #[test]
    fn shared_list_reports_release() {
        let doc = Document::new("x");
        let mut shared: SharedRangeList<Range> = SharedRangeList::new();
        shared.attach(&doc);
        drop(doc);
        assert!(shared.document().is_err());
        assert!(!shared.is_attached());
    }
}
