//! Selection model
//!
//! A [`Selection`] is a caret (`lead`) plus a fixed end (`anchor`), both
//! [`Anchor`]s that follow document edits. Adding a second range switches
//! to multi-range mode, where every range lives in a document-attached
//! [`RangeList`](crate::core::RangeList) and the lead/anchor pair tracks the
//! active range; see the methods in [`multi`].
//!
//! Cursor motion only moves the lead. The `select_*` variants first pin
//! the anchor at the caret when the selection is empty, so the motion
//! extends a selection instead of moving an empty one.

pub mod multi;
pub mod oriented;
pub mod words;

pub use multi::SelectionSnapshot;
pub use oriented::{OrientedRange, RangeId};

use crate::core::anchor::Anchor;
use crate::core::document::{Document, WeakDocument};
use crate::core::errors::Result;
use crate::core::position::{Position, Range};
use crate::core::range_list::SharedRangeList;
use crate::events::{ListenerId, SelectionEvent, Signal};
use crate::folding::{Fold, FoldOverlay, FoldSide, StringTrim};
use crate::utils::text::{char_len, char_slice, indent_width};

use core::cell::Cell;
use core::fmt;
use std::rc::{Rc, Weak};

struct SelectionState {
    is_empty: Cell<bool>,
    silent: Cell<bool>,
    cursor_changed: Cell<bool>,
    anchor_changed: Cell<bool>,
    keep_desired_column: Cell<bool>,
    desired_column: Cell<Option<usize>>,
    events: Signal<SelectionEvent>,
}

/// Caret and selected ranges over one document
pub struct Selection {
    doc: WeakDocument,
    lead: Anchor,
    anchor: Anchor,
    state: Rc<SelectionState>,
    folds: Option<Rc<FoldOverlay>>,
    range_list: SharedRangeList<OrientedRange>,
    /// Ids of the listed ranges, oldest first
    range_order: Vec<RangeId>,
    in_multi_select: bool,
    next_range_id: Cell<u64>,
}

impl Selection {
    /// An empty selection at the start of `doc`
    pub fn new(doc: &Document) -> Self {
        let state = Rc::new(SelectionState {
            is_empty: Cell::new(true),
            silent: Cell::new(false),
            cursor_changed: Cell::new(false),
            anchor_changed: Cell::new(false),
            keep_desired_column: Cell::new(false),
            desired_column: Cell::new(None),
            events: Signal::new(),
        });
        let lead = Anchor::with_insert_right(doc, Position::start(), true);
        let anchor = Anchor::with_insert_right(doc, Position::start(), true);

        let weak: Weak<SelectionState> = Rc::downgrade(&state);
        lead.on_change(move |change| {
            let Some(state) = weak.upgrade() else {
                return;
            };
            state.cursor_changed.set(true);
            if !state.silent.get() {
                state.events.emit(&SelectionEvent::ChangeCursor);
                if !state.is_empty.get() {
                    state.events.emit(&SelectionEvent::ChangeSelection);
                }
            }
            if !state.keep_desired_column.get()
                && change.old_position.column != change.position.column
            {
                state.desired_column.set(None);
            }
        });

        let weak: Weak<SelectionState> = Rc::downgrade(&state);
        anchor.on_change(move |_| {
            let Some(state) = weak.upgrade() else {
                return;
            };
            state.anchor_changed.set(true);
            if !state.silent.get() && !state.is_empty.get() {
                state.events.emit(&SelectionEvent::ChangeSelection);
            }
        });

        let range_list = SharedRangeList::new();
        range_list.borrow_mut().set_insert_right(true);

        Self {
            doc: doc.downgrade(),
            lead,
            anchor,
            state,
            folds: None,
            range_list,
            range_order: Vec::new(),
            in_multi_select: false,
            next_range_id: Cell::new(1),
        }
    }

    /// Strong handle to the selected document
    pub fn document(&self) -> Result<Document> {
        self.doc.upgrade()
    }

    /// Register a listener for selection events
    pub fn on_change<F>(&self, listener: F) -> ListenerId
    where
        F: FnMut(&SelectionEvent) + 'static,
    {
        self.state.events.connect(listener)
    }

    pub fn off_change(&self, id: ListenerId) -> bool {
        self.state.events.disconnect(id)
    }

    /// Make motion skip over collapsed folds
    pub fn set_fold_overlay(&mut self, folds: Option<Rc<FoldOverlay>>) {
        self.folds = folds;
    }

    pub(crate) fn emit(&self, event: &SelectionEvent) {
        self.state.events.emit(event);
    }

    pub(crate) fn allocate_range_id(&self) -> RangeId {
        let id = self.next_range_id.get();
        self.next_range_id.set(id + 1);
        RangeId(id)
    }

    fn fold_at(&self, pos: Position, side: FoldSide) -> Option<Fold> {
        self.folds.as_ref()?.get_fold_at(pos.row, pos.column, side)
    }

    fn row_fold_start(&self, row: usize) -> usize {
        self.folds.as_ref().map_or(row, |folds| folds.row_fold_start(row))
    }

    fn row_fold_end(&self, row: usize) -> usize {
        self.folds.as_ref().map_or(row, |folds| folds.row_fold_end(row))
    }

    /// Whether nothing is selected
    pub fn is_empty(&self) -> bool {
        self.state.is_empty.get() || self.lead.last_position() == self.anchor.last_position()
    }

    pub fn is_multi_line(&self) -> bool {
        !self.is_empty() && self.range().is_multi_line()
    }

    /// Caret position
    pub fn cursor(&self) -> Position {
        self.lead.last_position()
    }

    /// Fixed end of the selection; the caret when the selection is empty
    pub fn anchor(&self) -> Position {
        if self.is_empty() {
            self.cursor()
        } else {
            self.anchor.last_position()
        }
    }

    /// Whether the caret sits before the anchor
    pub fn is_backwards(&self) -> bool {
        self.anchor.last_position() > self.lead.last_position()
    }

    /// Selected range, ordered regardless of orientation
    pub fn range(&self) -> Range {
        if self.is_empty() {
            Range::empty(self.cursor())
        } else {
            Range::from_points(self.anchor.last_position(), self.lead.last_position())
        }
    }

    /// Column that vertical motion tries to keep
    pub fn desired_column(&self) -> Option<usize> {
        self.state.desired_column.get()
    }

    /// Place anchor and caret, emitting cursor and selection events once
    fn set_selection(&mut self, anchor: Position, cursor: Position) -> Result<()> {
        let state = Rc::clone(&self.state);
        if state.silent.get() {
            return Ok(());
        }
        let was_empty = state.is_empty.get();
        let was_multi = self.in_multi_select;

        state.silent.set(true);
        state.cursor_changed.set(false);
        state.anchor_changed.set(false);
        let placed = self
            .anchor
            .set_position(anchor, false)
            .and_then(|()| self.lead.set_position(cursor, false));
        state
            .is_empty
            .set(self.anchor.last_position() == self.lead.last_position());
        state.silent.set(false);
        placed?;

        if state.cursor_changed.get() {
            self.emit(&SelectionEvent::ChangeCursor);
        }
        if state.cursor_changed.get()
            || state.anchor_changed.get()
            || was_empty != state.is_empty.get()
            || was_multi
        {
            self.emit(&SelectionEvent::ChangeSelection);
        }
        Ok(())
    }

    /// Pin the anchor, keeping the caret where it is
    pub fn set_anchor(&mut self, pos: Position) -> Result<()> {
        let cursor = self.cursor();
        self.set_selection(pos, cursor)
    }

    /// Select `range`, the caret at its start when `backwards`
    pub fn set_selection_range(&mut self, range: Range, backwards: bool) -> Result<()> {
        if backwards {
            self.set_selection(range.end, range.start)
        } else {
            self.set_selection(range.start, range.end)
        }
    }

    /// Drop the selected extent, keeping the caret
    pub fn clear_selection(&mut self) {
        if !self.state.is_empty.get() {
            self.state.is_empty.set(true);
            self.emit(&SelectionEvent::ChangeSelection);
        }
    }

    /// Select the whole document, caret at the start
    pub fn select_all(&mut self) -> Result<()> {
        self.set_selection(Position::new(usize::MAX, usize::MAX), Position::start())
    }

    /// Run a caret motion that extends the selection
    fn move_selection<F>(&mut self, mover: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        if self.is_empty() {
            let cursor = self.cursor();
            self.set_selection(cursor, cursor)?;
            self.state.is_empty.set(false);
        }
        mover(self)
    }

    /// Extend the selection to `pos`
    pub fn select_to(&mut self, pos: Position) -> Result<()> {
        self.move_selection(|sel| sel.move_cursor_to(pos, false))
    }

    /// Move the caret, snapping to the start of a fold it lands in
    pub fn move_cursor_to(&mut self, pos: Position, keep_desired_column: bool) -> Result<()> {
        let pos = self.fold_at(pos, FoldSide::Right).map_or(pos, |fold| fold.start());
        self.state.keep_desired_column.set(true);
        let moved = self.lead.set_position(pos, false);
        self.state.keep_desired_column.set(false);
        if !keep_desired_column {
            self.state.desired_column.set(None);
        }
        moved
    }

    /// Move the caret and collapse the selection onto it
    pub fn move_to(&mut self, pos: Position) -> Result<()> {
        self.clear_selection();
        self.move_cursor_to(pos, false)
    }

    /// Move the caret by rows and columns, treating a fold line as one row
    ///
    /// Vertical motion keeps the desired column across short lines.
    pub fn move_cursor_by(&mut self, rows: isize, columns: isize) -> Result<()> {
        let doc = self.document()?;
        let lead = self.cursor();
        let desired = match self.state.desired_column.get() {
            Some(column) => column,
            None => {
                self.state.desired_column.set(Some(lead.column));
                lead.column
            }
        };

        let last_row = doc.len() - 1;
        let mut row = lead.row;
        for _ in 0..rows.unsigned_abs() {
            if rows > 0 {
                let below = self.row_fold_end(row) + 1;
                if below > last_row {
                    break;
                }
                row = below;
            } else {
                let start = self.row_fold_start(row);
                if start == 0 {
                    row = 0;
                    break;
                }
                row = self.row_fold_start(start - 1);
            }
        }

        let column = if rows == 0 { lead.column } else { desired };
        self.move_cursor_to(
            Position::new(row, column.saturating_add_signed(columns)),
            columns == 0,
        )
    }

    pub fn move_cursor_up(&mut self) -> Result<()> {
        self.move_cursor_by(-1, 0)
    }

    pub fn move_cursor_down(&mut self) -> Result<()> {
        self.move_cursor_by(1, 0)
    }

    /// One char left, wrapping to the previous line and skipping folds
    pub fn move_cursor_left(&mut self) -> Result<()> {
        let doc = self.document()?;
        let pos = self.cursor();
        if let Some(fold) = self.fold_at(pos, FoldSide::Left) {
            return self.move_cursor_to(fold.start(), false);
        }
        if pos.column == 0 {
            if pos.row > 0 {
                let row = pos.row - 1;
                return self.move_cursor_to(Position::new(row, doc.line_length(row)), false);
            }
            return Ok(());
        }
        self.move_cursor_to(Position::new(pos.row, pos.column - 1), false)
    }

    /// One char right, wrapping to the next line and skipping folds
    pub fn move_cursor_right(&mut self) -> Result<()> {
        let doc = self.document()?;
        let pos = self.cursor();
        if let Some(fold) = self.fold_at(pos, FoldSide::Right) {
            return self.move_cursor_to(fold.end(), false);
        }
        if pos.column >= doc.line_length(pos.row) {
            if pos.row + 1 < doc.len() {
                return self.move_cursor_to(Position::new(pos.row + 1, 0), false);
            }
            return Ok(());
        }
        self.move_cursor_to(Position::new(pos.row, pos.column + 1), false)
    }

    /// Smart home: first non-blank char, or column zero when already there
    pub fn move_cursor_line_start(&mut self) -> Result<()> {
        let doc = self.document()?;
        let lead = self.cursor();
        let row = self.row_fold_start(lead.row);
        let indent = indent_width(&doc.line(row));
        let column = if lead.row == row && lead.column == indent {
            0
        } else {
            indent
        };
        self.move_cursor_to(Position::new(row, column), false)
    }

    /// End of the display line; from there, end of the text before
    /// trailing whitespace
    pub fn move_cursor_line_end(&mut self) -> Result<()> {
        let doc = self.document()?;
        let lead = self.cursor();
        let row = self.row_fold_end(lead.row);
        let line = doc.line(row);
        let len = char_len(&line);
        let mut column = len;
        if lead.row == row && lead.column == len {
            let text_end = char_len(line.trim_end());
            if text_end > 0 && text_end < len {
                column = text_end;
            }
        }
        self.move_cursor_to(Position::new(row, column), false)
    }

    pub fn move_cursor_file_start(&mut self) -> Result<()> {
        self.move_cursor_to(Position::start(), false)
    }

    pub fn move_cursor_file_end(&mut self) -> Result<()> {
        let doc = self.document()?;
        let row = doc.len() - 1;
        self.move_cursor_to(Position::new(row, doc.line_length(row)), false)
    }

    /// Past the separators and then the word right of the caret
    pub fn move_cursor_word_right(&mut self) -> Result<()> {
        let doc = self.document()?;
        loop {
            let pos = self.cursor();
            if let Some(fold) = self.fold_at(pos, FoldSide::Right) {
                return self.move_cursor_to(fold.end(), false);
            }
            let line = doc.line(pos.row);
            let len = char_len(&line);
            let column = pos.column + words::separator_run_right(&line, pos.column);
            if column < len {
                let column = column + words::word_run_right(&line, column);
                return self.move_cursor_to(Position::new(pos.row, column), false);
            }
            self.move_cursor_to(Position::new(pos.row, len), false)?;
            self.move_cursor_right()?;
            if pos.row + 1 >= doc.len() {
                return Ok(());
            }
        }
    }

    /// Back over the separators and then the word left of the caret
    pub fn move_cursor_word_left(&mut self) -> Result<()> {
        let doc = self.document()?;
        loop {
            let pos = self.cursor();
            if let Some(fold) = self.fold_at(pos, FoldSide::Left) {
                return self.move_cursor_to(fold.start(), false);
            }
            let prefix = self
                .folds
                .as_ref()
                .and_then(|folds| folds.get_fold_string_at(pos.row, pos.column, StringTrim::Before))
                .unwrap_or_else(|| char_slice(&doc.line(pos.row), 0, pos.column).to_owned());
            let visible = char_len(&prefix);
            let separators = words::separator_run_left(&prefix, visible);
            let column = pos.column.saturating_sub(separators);
            if column == 0 {
                self.move_cursor_to(Position::new(pos.row, 0), false)?;
                self.move_cursor_left()?;
                if pos.row == 0 {
                    return Ok(());
                }
                continue;
            }
            let word = words::word_run_left(&prefix, visible - separators);
            return self.move_cursor_to(Position::new(pos.row, column - word), false);
        }
    }

    /// To the end of the next short word, stopping at punctuation
    pub fn move_cursor_short_word_right(&mut self) -> Result<()> {
        let doc = self.document()?;
        let pos = self.cursor();
        if let Some(fold) = self.fold_at(pos, FoldSide::Right) {
            return self.move_cursor_to(fold.end(), false);
        }
        let line = doc.line(pos.row);
        let mut row = pos.row;
        let mut column = pos.column;
        let mut text = char_slice(&line, column, usize::MAX).to_owned();
        if column == char_len(&line) {
            loop {
                row += 1;
                text = doc.line(row);
                if row >= doc.len() || !text.trim().is_empty() {
                    break;
                }
            }
            if !text.starts_with(char::is_whitespace) {
                text.clear();
            }
            column = 0;
        }
        let index = words::short_word_end(&text);
        self.move_cursor_to(Position::new(row, column + index), false)
    }

    /// To the start of the previous short word, stopping at punctuation
    pub fn move_cursor_short_word_left(&mut self) -> Result<()> {
        let doc = self.document()?;
        let pos = self.cursor();
        if let Some(fold) = self.fold_at(pos, FoldSide::Left) {
            return self.move_cursor_to(fold.start(), false);
        }
        let mut row = pos.row;
        let mut column = pos.column;
        let mut text = char_slice(&doc.line(row), 0, column).to_owned();
        if column == 0 {
            if row == 0 {
                return Ok(());
            }
            loop {
                row -= 1;
                text = doc.line(row);
                if row == 0 || !text.trim().is_empty() {
                    break;
                }
            }
            column = char_len(&text);
            if !text.ends_with(char::is_whitespace) {
                text.clear();
            }
        }
        let index = words::short_word_start(&text);
        self.move_cursor_to(Position::new(row, column.saturating_sub(index)), false)
    }

    pub fn select_left(&mut self) -> Result<()> {
        self.move_selection(Self::move_cursor_left)
    }

    pub fn select_right(&mut self) -> Result<()> {
        self.move_selection(Self::move_cursor_right)
    }

    pub fn select_up(&mut self) -> Result<()> {
        self.move_selection(Self::move_cursor_up)
    }

    pub fn select_down(&mut self) -> Result<()> {
        self.move_selection(Self::move_cursor_down)
    }

    pub fn select_line_start(&mut self) -> Result<()> {
        self.move_selection(Self::move_cursor_line_start)
    }

    pub fn select_line_end(&mut self) -> Result<()> {
        self.move_selection(Self::move_cursor_line_end)
    }

    pub fn select_file_start(&mut self) -> Result<()> {
        self.move_selection(Self::move_cursor_file_start)
    }

    pub fn select_file_end(&mut self) -> Result<()> {
        self.move_selection(Self::move_cursor_file_end)
    }

    pub fn select_word_left(&mut self) -> Result<()> {
        self.move_selection(Self::move_cursor_word_left)
    }

    pub fn select_word_right(&mut self) -> Result<()> {
        self.move_selection(Self::move_cursor_word_right)
    }

    /// Shift the selection sideways by `columns`
    ///
    /// An end at column zero stays put, so whole-line selections survive
    /// indentation changes.
    pub fn shift_selection(&mut self, columns: isize) -> Result<()> {
        if self.is_empty() {
            let lead = self.cursor();
            let target = Position::new(lead.row, lead.column.saturating_add_signed(columns));
            return self.move_cursor_to(target, false);
        }
        let anchor = self.anchor();
        let lead = self.cursor();
        let backwards = self.is_backwards();
        if !backwards || anchor.column != 0 {
            self.set_anchor(Position::new(
                anchor.row,
                anchor.column.saturating_add_signed(columns),
            ))?;
        }
        if backwards || lead.column != 0 {
            let target = Position::new(lead.row, lead.column.saturating_add_signed(columns));
            self.move_selection(|sel| sel.move_cursor_to(target, false))?;
        }
        Ok(())
    }

    /// The word or separator run at `pos`
    pub fn word_range(&self, pos: Position) -> Result<Range> {
        let doc = self.document()?;
        let pos = doc.clip_position(pos);
        Ok(words::word_range(&doc.line(pos.row), pos.row, pos.column))
    }

    /// [`Selection::word_range`] plus the blanks after it
    pub fn a_word_range(&self, pos: Position) -> Result<Range> {
        let doc = self.document()?;
        let mut range = self.word_range(pos)?;
        let line = doc.line(range.end.row);
        range.end.column += line
            .chars()
            .skip(range.end.column)
            .take_while(|c| matches!(c, ' ' | '\t'))
            .count();
        Ok(range)
    }

    pub fn select_word(&mut self) -> Result<()> {
        let range = self.word_range(self.cursor())?;
        self.set_selection_range(range, false)
    }

    pub fn select_a_word(&mut self) -> Result<()> {
        let range = self.a_word_range(self.cursor())?;
        self.set_selection_range(range, false)
    }

    /// Whole display line at `row`, a fold line counting as one line
    ///
    /// With `exclude_last_char` the range stops at the end of the last row
    /// instead of the start of the next.
    pub fn line_range(&self, row: usize, exclude_last_char: bool) -> Result<Range> {
        let doc = self.document()?;
        let start = self.row_fold_start(row);
        let end = self.row_fold_end(row);
        Ok(if exclude_last_char {
            Range::new(start, 0, end, doc.line_length(end))
        } else {
            Range::new(start, 0, end + 1, 0)
        })
    }

    pub fn select_line(&mut self) -> Result<()> {
        let range = self.line_range(self.cursor().row, false)?;
        self.set_selection_range(range, false)
    }

    /// The selection as a value with a fresh id
    pub fn to_oriented_range(&self) -> OrientedRange {
        OrientedRange::new(
            self.range(),
            !self.is_empty() && self.is_backwards(),
            self.allocate_range_id(),
        )
    }

    /// Select an oriented range
    pub fn from_oriented_range(&mut self, range: OrientedRange) -> Result<()> {
        self.set_selection_range(range.range, range.backwards)
    }
}

impl fmt::Debug for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selection")
            .field("range", &self.range())
            .field("backwards", &self.is_backwards())
            .field("multi_select", &self.in_multi_select)
            .field("ranges", &self.range_list.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::folding::FoldModeKind;
    use core::cell::RefCell;

    fn events(sel: &Selection) -> Rc<RefCell<Vec<SelectionEvent>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        sel.on_change(move |event| sink.borrow_mut().push(event.clone()));
        seen
    }

    #[test]
    fn range_respects_orientation() {
        let doc = Document::new("hello\nworld");
        let mut sel = Selection::new(&doc);
        sel.set_selection_range(Range::new(0, 1, 1, 2), true).unwrap();
        assert!(sel.is_backwards());
        assert_eq!(sel.cursor(), Position::new(0, 1));
        assert_eq!(sel.range(), Range::new(0, 1, 1, 2));
        assert!(sel.is_multi_line());

        sel.clear_selection();
        assert!(sel.is_empty());
        assert_eq!(sel.range(), Range::empty(Position::new(0, 1)));
    }

    #[test]
    fn select_motion_pins_anchor_once() {
        let doc = Document::new("abcdef");
        let mut sel = Selection::new(&doc);
        sel.move_cursor_to(Position::new(0, 2), false).unwrap();
        sel.select_right().unwrap();
        sel.select_right().unwrap();
        assert_eq!(sel.range(), Range::new(0, 2, 0, 4));
        assert!(!sel.is_backwards());

        sel.move_cursor_left().unwrap();
        assert_eq!(sel.range(), Range::new(0, 2, 0, 3));
    }

    #[test]
    fn set_selection_emits_cursor_and_selection_once() {
        let doc = Document::new("abcdef");
        let mut sel = Selection::new(&doc);
        let seen = events(&sel);
        sel.set_selection_range(Range::new(0, 1, 0, 4), false).unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![SelectionEvent::ChangeCursor, SelectionEvent::ChangeSelection]
        );
    }

    #[test]
    fn vertical_motion_keeps_desired_column() {
        let doc = Document::new("long line here\nab\nanother long one");
        let mut sel = Selection::new(&doc);
        sel.move_cursor_to(Position::new(0, 9), false).unwrap();
        sel.move_cursor_down().unwrap();
        assert_eq!(sel.cursor(), Position::new(1, 2));
        sel.move_cursor_down().unwrap();
        assert_eq!(sel.cursor(), Position::new(2, 9));
        sel.move_cursor_up().unwrap();
        sel.move_cursor_up().unwrap();
        assert_eq!(sel.cursor(), Position::new(0, 9));
        sel.move_cursor_up().unwrap();
        assert_eq!(sel.cursor(), Position::new(0, 9));
    }

    #[test]
    fn horizontal_motion_wraps_lines() {
        let doc = Document::new("ab\ncd");
        let mut sel = Selection::new(&doc);
        sel.move_cursor_to(Position::new(0, 2), false).unwrap();
        sel.move_cursor_right().unwrap();
        assert_eq!(sel.cursor(), Position::new(1, 0));
        sel.move_cursor_left().unwrap();
        assert_eq!(sel.cursor(), Position::new(0, 2));
        sel.move_cursor_file_end().unwrap();
        assert_eq!(sel.cursor(), Position::new(1, 2));
        sel.move_cursor_right().unwrap();
        assert_eq!(sel.cursor(), Position::new(1, 2));
    }

    #[test]
    fn smart_home_and_end() {
        let doc = Document::new("    let x = 1;   ");
        let mut sel = Selection::new(&doc);
        sel.move_cursor_to(Position::new(0, 8), false).unwrap();
        sel.move_cursor_line_start().unwrap();
        assert_eq!(sel.cursor(), Position::new(0, 4));
        sel.move_cursor_line_start().unwrap();
        assert_eq!(sel.cursor(), Position::new(0, 0));
        sel.move_cursor_line_end().unwrap();
        assert_eq!(sel.cursor(), Position::new(0, 17));
        sel.move_cursor_line_end().unwrap();
        assert_eq!(sel.cursor(), Position::new(0, 14));
    }

    #[test]
    fn word_motion() {
        let doc = Document::new("foo bar.baz\n  qux");
        let mut sel = Selection::new(&doc);
        sel.move_cursor_word_right().unwrap();
        assert_eq!(sel.cursor(), Position::new(0, 3));
        sel.move_cursor_word_right().unwrap();
        assert_eq!(sel.cursor(), Position::new(0, 7));
        sel.move_cursor_word_right().unwrap();
        assert_eq!(sel.cursor(), Position::new(0, 11));
        sel.move_cursor_word_right().unwrap();
        assert_eq!(sel.cursor(), Position::new(1, 5));

        sel.move_cursor_word_left().unwrap();
        assert_eq!(sel.cursor(), Position::new(1, 2));
        sel.move_cursor_word_left().unwrap();
        assert_eq!(sel.cursor(), Position::new(0, 8));
    }

    #[test]
    fn short_word_motion() {
        let doc = Document::new("foo.bar baz");
        let mut sel = Selection::new(&doc);
        sel.move_cursor_short_word_right().unwrap();
        assert_eq!(sel.cursor(), Position::new(0, 3));
        sel.move_cursor_short_word_right().unwrap();
        assert_eq!(sel.cursor(), Position::new(0, 4));
        sel.move_cursor_short_word_left().unwrap();
        assert_eq!(sel.cursor(), Position::new(0, 3));
    }

    #[test]
    fn word_and_line_selection() {
        let doc = Document::new("alpha beta  gamma\nnext");
        let mut sel = Selection::new(&doc);
        sel.move_cursor_to(Position::new(0, 7), false).unwrap();
        sel.select_word().unwrap();
        assert_eq!(sel.range(), Range::new(0, 6, 0, 10));
        sel.select_a_word().unwrap();
        assert_eq!(sel.range(), Range::new(0, 6, 0, 12));
        sel.select_line().unwrap();
        assert_eq!(sel.range(), Range::new(0, 0, 1, 0));
    }

    #[test]
    fn motion_skips_folds() {
        let doc = Document::new("ab {\n  x\n} cd");
        let folds = Rc::new(FoldOverlay::new(&doc, FoldModeKind::Brace));
        folds.add_fold("...", Range::new(0, 4, 2, 0)).unwrap();
        let mut sel = Selection::new(&doc);
        sel.set_fold_overlay(Some(Rc::clone(&folds)));

        sel.move_cursor_to(Position::new(0, 4), false).unwrap();
        sel.move_cursor_right().unwrap();
        assert_eq!(sel.cursor(), Position::new(2, 0));
        sel.move_cursor_left().unwrap();
        assert_eq!(sel.cursor(), Position::new(0, 4));

        sel.move_cursor_to(Position::new(1, 1), false).unwrap();
        assert_eq!(sel.cursor(), Position::new(0, 4));
        assert_eq!(sel.line_range(1, true).unwrap(), Range::new(0, 0, 2, 4));
    }

    #[test]
    fn shift_selection_moves_both_ends() {
        let doc = Document::new("0123456789");
        let mut sel = Selection::new(&doc);
        sel.set_selection_range(Range::new(0, 2, 0, 5), false).unwrap();
        sel.shift_selection(2).unwrap();
        assert_eq!(sel.range(), Range::new(0, 4, 0, 7));
        sel.shift_selection(-3).unwrap();
        assert_eq!(sel.range(), Range::new(0, 1, 0, 4));
    }

    #[test]
    fn selection_follows_edits() {
        let doc = Document::new("hello world");
        let mut sel = Selection::new(&doc);
        sel.set_selection_range(Range::new(0, 6, 0, 11), false).unwrap();
        doc.insert(Position::new(0, 0), ">> ");
        assert_eq!(sel.range(), Range::new(0, 9, 0, 14));
    }
}
