//! Multi-range selection
//!
//! While more than one range is selected the ranges live in a
//! [`RangeList`](crate::core::RangeList) attached to the document, and the
//! lead/anchor pair mirrors the most recently added range. Dropping back to
//! one range detaches the list and leaves that range as the selection.

use super::{OrientedRange, RangeId, Selection};
use crate::core::errors::{EditorError, Result};
use crate::core::position::{Position, Range};
use crate::events::SelectionEvent;

use tracing::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Every selected range, oldest first
///
/// The last range is the active one; restoring a snapshot makes it the
/// caret-bearing range again.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SelectionSnapshot {
    pub ranges: Vec<OrientedRange>,
}

impl Selection {
    pub fn in_multi_select_mode(&self) -> bool {
        self.in_multi_select
    }

    /// Number of listed ranges; zero outside multi-range mode
    pub fn range_count(&self) -> usize {
        self.range_list.borrow().len()
    }

    /// Listed ranges in document order
    pub fn oriented_ranges(&self) -> Vec<OrientedRange> {
        self.range_list.borrow().ranges().to_vec()
    }

    /// Every selected range in document order
    pub fn all_ranges(&self) -> Vec<Range> {
        let list = self.range_list.borrow();
        if list.is_empty() {
            vec![self.range()]
        } else {
            list.iter().map(|r| r.range).collect()
        }
    }

    fn find_range(&self, id: RangeId) -> Option<OrientedRange> {
        self.range_list.borrow().iter().find(|r| r.id == id).copied()
    }

    /// The most recently added range still listed
    fn newest_range(&self) -> Option<OrientedRange> {
        self.range_order
            .iter()
            .rev()
            .find_map(|&id| self.find_range(id))
    }

    fn enter_multi_select(&mut self) -> Result<()> {
        let doc = self.document()?;
        self.in_multi_select = true;
        self.range_list.attach(&doc);
        debug!(ranges = self.range_count(), "multi-range selection started");
        self.emit(&SelectionEvent::MultiSelect);
        Ok(())
    }

    /// Add `range` to the selection
    ///
    /// The first added range keeps the current selection alongside it, so
    /// the selection turns into two ranges unless the new range swallows
    /// the old one. Partly overlapping ranges stay apart until
    /// [`Selection::merge_overlapping_ranges`] runs.
    pub fn add_range(&mut self, range: Range, backwards: bool) -> Result<()> {
        let range = OrientedRange::new(range, backwards, self.allocate_range_id());
        self.add_oriented_range(range, false)
    }

    /// Add an already identified range
    ///
    /// With `block_change_events` the lead/anchor pair is left alone.
    pub fn add_oriented_range(
        &mut self,
        range: OrientedRange,
        block_change_events: bool,
    ) -> Result<()> {
        if !self.in_multi_select && self.range_count() == 0 {
            let old = self.to_oriented_range();
            {
                let mut list = self.range_list.borrow_mut();
                list.add(old);
                list.add(range);
                let kept_both = list.len() == 2;
                list.remove_all();
                if kept_both {
                    list.add(old);
                }
            }
            if self.range_count() == 0 {
                if block_change_events {
                    return Ok(());
                }
                return self.from_oriented_range(range);
            }
            self.on_add_range(old);
        }

        let removed = self.range_list.borrow_mut().add(range);
        self.on_add_range(range);
        if !removed.is_empty() {
            self.on_remove_range(removed)?;
        }

        if self.range_count() > 1 && !self.in_multi_select {
            self.enter_multi_select()?;
        }
        if !block_change_events && self.find_range(range.id).is_some() {
            self.from_oriented_range(range)?;
        }
        Ok(())
    }

    fn on_add_range(&mut self, range: OrientedRange) {
        self.range_order.push(range.id);
        self.emit(&SelectionEvent::AddRange { range });
    }

    /// Bookkeeping after ranges left the list
    ///
    /// A lone remaining range in multi-range mode leaves too and becomes the
    /// single selection.
    fn on_remove_range(&mut self, mut removed: Vec<OrientedRange>) -> Result<()> {
        let mut last = None;
        if self.in_multi_select && self.range_count() == 1 {
            last = self.range_list.borrow_mut().remove_all().pop();
            removed.extend(last);
        }
        self.range_order
            .retain(|id| !removed.iter().any(|r| r.id == *id));
        self.emit(&SelectionEvent::RemoveRange { ranges: removed });

        if self.in_multi_select && self.range_count() == 0 {
            self.in_multi_select = false;
            self.range_list.detach();
            self.range_order.clear();
            debug!("multi-range selection ended");
            self.emit(&SelectionEvent::SingleSelect);
        }

        if let Some(active) = last.or_else(|| self.newest_range()) {
            if active.range != self.range() {
                self.from_oriented_range(active)?;
            }
        }
        Ok(())
    }

    /// Collapse to one range: `range`, or the newest listed one
    pub fn to_single_range(&mut self, range: Option<OrientedRange>) -> Result<()> {
        let range = range.or_else(|| self.newest_range());
        let removed = self.range_list.borrow_mut().remove_all();
        if !removed.is_empty() || self.in_multi_select {
            self.on_remove_range(removed)?;
        }
        match range {
            Some(range) => self.from_oriented_range(range),
            None => Ok(()),
        }
    }

    /// Remove the listed range containing `pos`
    pub fn substract_point(&mut self, pos: Position) -> Result<Option<OrientedRange>> {
        let removed = self.range_list.borrow_mut().substract_point(pos);
        if let Some(range) = removed {
            self.on_remove_range(vec![range])?;
        }
        Ok(removed)
    }

    /// Remove the listed range with `id`
    pub fn remove_range(&mut self, id: RangeId) -> Result<OrientedRange> {
        let removed = self.range_list.borrow_mut().remove_where(|r| r.id == id);
        let range = removed
            .first()
            .copied()
            .ok_or(EditorError::RangeNotFound { id: id.get() })?;
        self.on_remove_range(removed)?;
        Ok(range)
    }

    /// Coalesce listed ranges that overlap
    pub fn merge_overlapping_ranges(&mut self) -> Result<()> {
        let removed = self.range_list.borrow_mut().merge();
        if removed.is_empty() {
            return Ok(());
        }
        debug!(merged = removed.len(), "overlapping selection ranges merged");
        self.on_remove_range(removed)
    }

    /// Run `f` once per listed range, last range first
    ///
    /// `f` sees a scratch selection positioned on the range; whatever it
    /// leaves selected is written back under the range's id. Outside
    /// multi-range mode `f` runs on this selection directly.
    pub fn for_each_selection<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(&mut Selection) -> Result<()>,
    {
        let count = self.range_count();
        if count == 0 {
            return f(self);
        }
        let doc = self.document()?;
        let mut scratch = Selection::new(&doc);
        scratch.set_fold_overlay(self.folds.clone());

        for index in (0..count).rev() {
            let Some(range) = self.range_list.borrow().get(index).copied() else {
                continue;
            };
            scratch.from_oriented_range(range)?;
            f(&mut scratch)?;
            let result = scratch.to_oriented_range();
            if let Some(slot) = self.range_list.borrow_mut().get_mut(index) {
                slot.range = result.range;
                slot.backwards = result.backwards;
            }
        }

        self.merge_overlapping_ranges()?;
        if let Some(active) = self.newest_range() {
            self.from_oriented_range(active)?;
        }
        Ok(())
    }

    /// Replace every multi-row range with one range per row
    pub fn split_into_lines(&mut self) -> Result<()> {
        if self.range_count() == 0 && !self.range().is_multi_line() {
            return Ok(());
        }
        let ranges = self.all_ranges();
        let backwards = self.is_backwards();
        let mut lines = Vec::new();
        for (index, range) in ranges.iter().enumerate() {
            if range.is_multi_line() {
                for row in range.start.row..=range.end.row {
                    let mut line = self.line_range(row, true)?;
                    if row == range.start.row {
                        line.start = range.start;
                    }
                    if row == range.end.row {
                        line.end = range.end;
                    }
                    lines.push(line);
                }
            } else {
                lines.push(*range);
            }
            if index == 0 && !backwards {
                lines.reverse();
            }
        }

        self.to_single_range(None)?;
        for line in lines.into_iter().rev() {
            self.add_range(line, false)?;
        }
        Ok(())
    }

    /// Join every listed range into their union
    pub fn join_selections(&mut self) -> Result<()> {
        let ranges = self.oriented_ranges();
        let (Some(first), Some(last)) = (ranges.first(), ranges.last()) else {
            return Ok(());
        };
        let joined = Range {
            start: first.range.start,
            end: last.range.end,
        };
        let backwards = self.newest_range().is_some_and(|r| r.backwards);
        self.to_single_range(None)?;
        self.set_selection_range(joined, backwards)
    }

    /// Every range, oldest first, for restoring later
    pub fn snapshot(&self) -> SelectionSnapshot {
        let ranges = if self.range_count() == 0 {
            vec![self.to_oriented_range()]
        } else {
            self.range_order
                .iter()
                .filter_map(|&id| self.find_range(id))
                .collect()
        };
        SelectionSnapshot { ranges }
    }

    /// Replace the selection with a snapshot's ranges
    pub fn restore(&mut self, snapshot: &SelectionSnapshot) -> Result<()> {
        self.to_single_range(None)?;
        let Some((&active, _)) = snapshot.ranges.split_last() else {
            return Ok(());
        };
        if snapshot.ranges.len() == 1 {
            return self.from_oriented_range(active);
        }

        for &range in &snapshot.ranges {
            let removed = self.range_list.borrow_mut().add(range);
            self.on_add_range(range);
            if !removed.is_empty() {
                self.on_remove_range(removed)?;
            }
        }
        let top = snapshot.ranges.iter().map(|r| r.id.get()).max().unwrap_or(0);
        if self.next_range_id.get() <= top {
            self.next_range_id.set(top + 1);
        }
        if self.range_count() > 1 {
            self.enter_multi_select()?;
        }
        match self.newest_range() {
            Some(active) => self.from_oriented_range(active),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Document;
    use core::cell::RefCell;
    use pretty_assertions::assert_eq;
    use std::rc::Rc;

    fn record(sel: &Selection) -> Rc<RefCell<Vec<SelectionEvent>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        sel.on_change(move |event| {
            if !matches!(event, SelectionEvent::ChangeCursor | SelectionEvent::ChangeSelection) {
                sink.borrow_mut().push(event.clone());
            }
        });
        seen
    }

    #[test]
    fn second_range_enters_multi_mode() {
        let doc = Document::new("one two three");
        let mut sel = Selection::new(&doc);
        let seen = record(&sel);
        sel.set_selection_range(Range::new(0, 0, 0, 3), false).unwrap();
        sel.add_range(Range::new(0, 4, 0, 7), false).unwrap();

        assert!(sel.in_multi_select_mode());
        assert_eq!(sel.range_count(), 2);
        assert_eq!(sel.range(), Range::new(0, 4, 0, 7));
        assert_eq!(
            sel.all_ranges(),
            vec![Range::new(0, 0, 0, 3), Range::new(0, 4, 0, 7)]
        );
        let seen = seen.borrow();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].added_range(), Some(Range::new(0, 0, 0, 3)));
        assert_eq!(seen[1].added_range(), Some(Range::new(0, 4, 0, 7)));
        assert_eq!(seen[2], SelectionEvent::MultiSelect);
    }

    #[test]
    fn swallowing_range_stays_single() {
        let doc = Document::new("one two three");
        let mut sel = Selection::new(&doc);
        sel.set_selection_range(Range::new(0, 4, 0, 5), false).unwrap();
        sel.add_range(Range::new(0, 2, 0, 9), true).unwrap();
        assert!(!sel.in_multi_select_mode());
        assert_eq!(sel.range_count(), 0);
        assert_eq!(sel.range(), Range::new(0, 2, 0, 9));
        assert!(sel.is_backwards());
    }

    #[test]
    fn partial_overlap_waits_for_merge() {
        let doc = Document::new("abcdefgh");
        let mut sel = Selection::new(&doc);
        sel.set_selection_range(Range::new(0, 0, 0, 3), false).unwrap();
        sel.add_range(Range::new(0, 2, 0, 5), false).unwrap();
        assert!(sel.in_multi_select_mode());
        assert_eq!(
            sel.all_ranges(),
            vec![Range::new(0, 0, 0, 3), Range::new(0, 2, 0, 5)]
        );

        let seen = record(&sel);
        sel.merge_overlapping_ranges().unwrap();
        assert!(!sel.in_multi_select_mode());
        assert_eq!(sel.range(), Range::new(0, 0, 0, 5));
        let seen = seen.borrow();
        assert!(matches!(seen[0], SelectionEvent::RemoveRange { .. }));
        assert_eq!(seen.last(), Some(&SelectionEvent::SingleSelect));
    }

    #[test]
    fn ranges_follow_edits() {
        let doc = Document::new("one two three");
        let mut sel = Selection::new(&doc);
        sel.set_selection_range(Range::new(0, 0, 0, 3), false).unwrap();
        sel.add_range(Range::new(0, 8, 0, 13), false).unwrap();
        doc.insert(Position::new(0, 4), "big ");
        assert_eq!(
            sel.all_ranges(),
            vec![Range::new(0, 0, 0, 3), Range::new(0, 12, 0, 17)]
        );
    }

    #[test]
    fn for_each_selection_merges_overlaps() {
        let doc = Document::new("abcdefgh");
        let mut sel = Selection::new(&doc);
        sel.add_range(Range::new(0, 0, 0, 3), false).unwrap();
        sel.add_range(Range::new(0, 4, 0, 5), false).unwrap();
        assert_eq!(sel.range_count(), 2);
        let seen = record(&sel);

        sel.for_each_selection(|scratch| {
            if scratch.range() == Range::new(0, 4, 0, 5) {
                scratch.set_selection_range(Range::new(0, 2, 0, 5), false)?;
            }
            Ok(())
        })
        .unwrap();

        assert_eq!(sel.range(), Range::new(0, 0, 0, 5));
        assert!(!sel.in_multi_select_mode());
        let seen = seen.borrow();
        let removals = seen
            .iter()
            .filter(|e| matches!(e, SelectionEvent::RemoveRange { .. }))
            .count();
        assert_eq!(removals, 1);
        assert_eq!(seen.last(), Some(&SelectionEvent::SingleSelect));
    }

    #[test]
    fn substract_point_leaves_single_range() {
        let doc = Document::new("one two three");
        let mut sel = Selection::new(&doc);
        sel.set_selection_range(Range::new(0, 0, 0, 3), false).unwrap();
        sel.add_range(Range::new(0, 4, 0, 7), false).unwrap();

        let removed = sel.substract_point(Position::new(0, 5)).unwrap();
        assert_eq!(removed.map(|r| r.range), Some(Range::new(0, 4, 0, 7)));
        assert!(!sel.in_multi_select_mode());
        assert_eq!(sel.range(), Range::new(0, 0, 0, 3));
        assert_eq!(sel.substract_point(Position::new(0, 10)).unwrap(), None);
    }

    #[test]
    fn remove_range_by_id() {
        let doc = Document::new("one two three");
        let mut sel = Selection::new(&doc);
        sel.set_selection_range(Range::new(0, 0, 0, 3), false).unwrap();
        sel.add_range(Range::new(0, 4, 0, 7), false).unwrap();
        sel.add_range(Range::new(0, 8, 0, 13), false).unwrap();
        let middle = sel.oriented_ranges()[1];

        let removed = sel.remove_range(middle.id).unwrap();
        assert_eq!(removed.range, Range::new(0, 4, 0, 7));
        assert_eq!(
            sel.all_ranges(),
            vec![Range::new(0, 0, 0, 3), Range::new(0, 8, 0, 13)]
        );
        assert!(matches!(
            sel.remove_range(middle.id),
            Err(EditorError::RangeNotFound { .. })
        ));
    }

    #[test]
    fn split_and_join_lines() {
        let doc = Document::new("first\nsecond\nthird");
        let mut sel = Selection::new(&doc);
        sel.set_selection_range(Range::new(0, 2, 2, 3), false).unwrap();
        sel.split_into_lines().unwrap();
        assert_eq!(
            sel.all_ranges(),
            vec![
                Range::new(0, 2, 0, 5),
                Range::new(1, 0, 1, 6),
                Range::new(2, 0, 2, 3),
            ]
        );
        assert_eq!(sel.range(), Range::new(2, 0, 2, 3));

        sel.join_selections().unwrap();
        assert!(!sel.in_multi_select_mode());
        assert_eq!(sel.range(), Range::new(0, 2, 2, 3));
    }

    #[test]
    fn to_single_range_keeps_newest() {
        let doc = Document::new("one two three");
        let mut sel = Selection::new(&doc);
        sel.set_selection_range(Range::new(0, 8, 0, 13), false).unwrap();
        sel.add_range(Range::new(0, 0, 0, 3), false).unwrap();
        sel.to_single_range(None).unwrap();
        assert!(!sel.in_multi_select_mode());
        assert_eq!(sel.range(), Range::new(0, 0, 0, 3));
    }

    #[test]
    fn snapshot_restores_every_range() {
        let doc = Document::new("one two three");
        let mut sel = Selection::new(&doc);
        sel.set_selection_range(Range::new(0, 0, 0, 3), false).unwrap();
        sel.add_range(Range::new(0, 8, 0, 13), true).unwrap();
        let snapshot = sel.snapshot();

        sel.to_single_range(None).unwrap();
        sel.move_to(Position::new(0, 5)).unwrap();
        sel.restore(&snapshot).unwrap();

        assert!(sel.in_multi_select_mode());
        assert_eq!(
            sel.all_ranges(),
            vec![Range::new(0, 0, 0, 3), Range::new(0, 8, 0, 13)]
        );
        assert_eq!(sel.range(), Range::new(0, 8, 0, 13));
        assert!(sel.is_backwards());
    }
}
