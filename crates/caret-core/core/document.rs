//! Line-array text buffer
//!
//! Provides [`Document`], a shared handle to the line storage that every
//! anchor, range list, fold overlay and selection observes. Every mutation
//! goes through [`Document::apply_delta`], which updates the lines and then
//! delivers the delta to the change listeners in the same call.
//!
//! The edit helpers such as [`Document::insert`] and [`Document::remove`]
//! return no error. They build deltas from clipped positions; a delta that
//! still fails validation is logged at `warn` level and dropped, and no
//! listener hears about it. Call [`Document::apply_delta`] directly to get
//! the error instead.

use super::anchor::Anchor;
use super::delta::{Delta, DeltaAction};
use super::errors::{EditorError, Result};
use super::position::{Position, Range};
use crate::events::{ListenerId, Signal};
use crate::utils::text::{char_len, char_slice, detect_new_line, split_lines};

use core::cell::{Cell, RefCell};
use core::fmt;
use std::rc::{Rc, Weak};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use tracing::{trace, warn};

/// Largest number of lines a single insert delta may carry
pub const MAX_DELTA_LINES: usize = 20_000;

/// Line terminator used when joining lines back into text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NewLineMode {
    /// Use the terminator found in the first inserted text
    #[default]
    Auto,
    /// Always `\n`
    Unix,
    /// Always `\r\n`
    Windows,
}

/// Configuration for a document
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DocumentConfig {
    /// Terminator policy for `value()` and `text_range()`
    pub new_line_mode: NewLineMode,

    /// Validate every applied delta against the buffer
    pub validate_deltas: bool,

    /// Inserts longer than this many lines are applied in chunks
    pub max_delta_lines: usize,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            new_line_mode: NewLineMode::Auto,
            validate_deltas: false,
            max_delta_lines: MAX_DELTA_LINES,
        }
    }
}

struct DocumentInner {
    lines: RefCell<Vec<String>>,
    new_line_mode: Cell<NewLineMode>,
    auto_new_line: Cell<Option<&'static str>>,
    validate_deltas: Cell<bool>,
    max_delta_lines: usize,
    changed: Signal<Delta>,
}

/// Shared handle to a text buffer
///
/// Cloning the handle shares the buffer. The buffer lives until the last
/// strong handle drops; anchors and attached range lists only hold a
/// [`WeakDocument`] and report [`EditorError::DocumentReleased`] afterwards.
#[derive(Clone)]
pub struct Document {
    inner: Rc<DocumentInner>,
}

/// Non-owning handle to a [`Document`]
#[derive(Clone)]
pub struct WeakDocument {
    inner: Weak<DocumentInner>,
}

impl WeakDocument {
    /// Get a strong handle, failing once the document was released
    pub fn upgrade(&self) -> Result<Document> {
        self.inner
            .upgrade()
            .map(|inner| Document { inner })
            .ok_or(EditorError::DocumentReleased)
    }

    /// Whether the document is still alive
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// Check if both handles point to the same document
    pub fn ptr_eq(&self, doc: &Document) -> bool {
        Weak::ptr_eq(&self.inner, &Rc::downgrade(&doc.inner))
    }
}

impl fmt::Debug for WeakDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakDocument")
            .field("alive", &self.is_alive())
            .finish()
    }
}

impl Document {
    /// Create a document holding `text`
    pub fn new(text: &str) -> Self {
        Self::with_config(text, DocumentConfig::default())
    }

    /// Create a document with a specific configuration
    pub fn with_config(text: &str, config: DocumentConfig) -> Self {
        let doc = Self {
            inner: Rc::new(DocumentInner {
                lines: RefCell::new(vec![String::new()]),
                new_line_mode: Cell::new(config.new_line_mode),
                auto_new_line: Cell::new(None),
                validate_deltas: Cell::new(config.validate_deltas),
                max_delta_lines: config.max_delta_lines,
                changed: Signal::new(),
            }),
        };
        if !text.is_empty() {
            doc.insert_merged_lines(Position::start(), split_lines(text));
            doc.detect_new_line(text);
        }
        doc
    }

    /// Create a document from already split lines
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut lines: Vec<String> = lines.into_iter().map(Into::into).collect();
        if lines.is_empty() {
            lines.push(String::new());
        }
        let doc = Self::new("");
        *doc.inner.lines.borrow_mut() = lines;
        doc
    }

    /// Get a weak handle to this document
    pub fn downgrade(&self) -> WeakDocument {
        WeakDocument {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Check if both handles point to the same document
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Register a change listener, called after every applied delta
    pub fn on_change<F>(&self, listener: F) -> ListenerId
    where
        F: FnMut(&Delta) + 'static,
    {
        self.inner.changed.connect(listener)
    }

    /// Unregister a change listener
    pub fn off_change(&self, id: ListenerId) -> bool {
        self.inner.changed.disconnect(id)
    }

    /// Number of registered change listeners
    pub fn listener_count(&self) -> usize {
        self.inner.changed.len()
    }

    /// Replace the whole content
    pub fn set_value(&self, text: &str) {
        let last = self.len() - 1;
        self.remove(Range::new(0, 0, last, self.line_length(last)));
        self.insert(Position::start(), text);
    }

    /// The whole content joined with the current terminator
    pub fn value(&self) -> String {
        self.inner.lines.borrow().join(self.new_line_character())
    }

    fn detect_new_line(&self, text: &str) {
        if self.inner.auto_new_line.get().is_some() {
            return;
        }
        let detected = match detect_new_line(text) {
            Some("\r\n") => "\r\n",
            Some("\r") => "\r",
            Some(_) => "\n",
            None => return,
        };
        self.inner.auto_new_line.set(Some(detected));
    }

    /// Terminator used when joining lines
    pub fn new_line_character(&self) -> &'static str {
        match self.inner.new_line_mode.get() {
            NewLineMode::Windows => "\r\n",
            NewLineMode::Unix => "\n",
            NewLineMode::Auto => self.inner.auto_new_line.get().unwrap_or("\n"),
        }
    }

    pub fn new_line_mode(&self) -> NewLineMode {
        self.inner.new_line_mode.get()
    }

    pub fn set_new_line_mode(&self, mode: NewLineMode) {
        self.inner.new_line_mode.set(mode);
    }

    /// Whether `text` is exactly one line terminator
    pub fn is_new_line(text: &str) -> bool {
        matches!(text, "\r\n" | "\r" | "\n")
    }

    /// Turn delta validation on or off
    pub fn set_validate_deltas(&self, validate: bool) {
        self.inner.validate_deltas.set(validate);
    }

    /// Copy of the line at `row`, empty when out of range
    pub fn line(&self, row: usize) -> String {
        self.inner
            .lines
            .borrow()
            .get(row)
            .cloned()
            .unwrap_or_default()
    }

    /// Length of the line at `row` in chars
    pub fn line_length(&self, row: usize) -> usize {
        self.inner
            .lines
            .borrow()
            .get(row)
            .map_or(0, |line| char_len(line))
    }

    /// Copies of rows `first..=last`
    pub fn lines(&self, first: usize, last: usize) -> Vec<String> {
        let lines = self.inner.lines.borrow();
        if first > last || first >= lines.len() {
            return Vec::new();
        }
        lines[first..=last.min(lines.len() - 1)].to_vec()
    }

    /// Copy of every line
    pub fn all_lines(&self) -> Vec<String> {
        self.inner.lines.borrow().clone()
    }

    /// Number of lines, always at least one
    pub fn len(&self) -> usize {
        self.inner.lines.borrow().len()
    }

    /// Whether the document holds a single empty line
    pub fn is_empty(&self) -> bool {
        let lines = self.inner.lines.borrow();
        lines.len() == 1 && lines[0].is_empty()
    }

    /// Text covered by a range
    pub fn text_range(&self, range: Range) -> String {
        self.lines_for_range(range).join(self.new_line_character())
    }

    /// Lines covered by a range, the first and last trimmed to it
    pub fn lines_for_range(&self, range: Range) -> Vec<String> {
        let range = self.clip_range(range);
        let lines = self.inner.lines.borrow();
        if range.start.row == range.end.row {
            let line = &lines[range.start.row];
            return vec![char_slice(line, range.start.column, range.end.column).to_owned()];
        }

        let mut out = lines[range.start.row..=range.end.row].to_vec();
        if let Some(first) = out.first_mut() {
            *first = char_slice(first, range.start.column, usize::MAX).to_owned();
        }
        if let Some(last) = out.last_mut() {
            *last = char_slice(last, 0, range.end.column).to_owned();
        }
        out
    }

    /// Clamp a position to the document
    ///
    /// A row past the end snaps to the end of the last line.
    pub fn clip_position(&self, pos: Position) -> Position {
        let len = self.len();
        if pos.row >= len {
            let row = len - 1;
            Position::new(row, self.line_length(row))
        } else {
            Position::new(pos.row, pos.column.min(self.line_length(pos.row)))
        }
    }

    /// Clamp both ends of a range to the document
    pub fn clip_range(&self, range: Range) -> Range {
        Range::from_points(
            self.clip_position(range.start),
            self.clip_position(range.end),
        )
    }

    /// Insert text, returning the position right after it
    pub fn insert(&self, pos: Position, text: &str) -> Position {
        if text.is_empty() {
            return self.clip_position(pos);
        }
        if self.len() <= 1 {
            self.detect_new_line(text);
        }
        self.insert_merged_lines(pos, split_lines(text))
    }

    /// Insert text that contains no line terminator
    pub fn insert_in_line(&self, pos: Position, text: &str) -> Position {
        let start = self.clip_position(pos);
        let end = Position::new(start.row, start.column + char_len(text));
        self.emit_delta(Delta::insert(start, vec![text.to_owned()]));
        end
    }

    /// Insert lines, joining the first and last with the text around `pos`
    pub fn insert_merged_lines(&self, pos: Position, lines: Vec<String>) -> Position {
        let start = self.clip_position(pos);
        let delta = Delta::insert(start, lines);
        let end = delta.end;
        self.emit_delta(delta);
        end
    }

    /// Insert whole lines before `row`, or after the last line when `row`
    /// is past the end
    pub fn insert_full_lines(&self, row: usize, lines: Vec<String>) {
        let len = self.len();
        let row = row.min(len);
        let (pos, lines) = if row < len {
            let mut lines = lines;
            lines.push(String::new());
            (Position::new(row, 0), lines)
        } else {
            let mut merged = vec![String::new()];
            merged.extend(lines);
            (Position::new(row - 1, self.line_length(row - 1)), merged)
        };
        self.insert_merged_lines(pos, lines);
    }

    /// Remove a range, returning the clipped start
    pub fn remove(&self, range: Range) -> Position {
        let range = self.clip_range(range);
        let lines = self.lines_for_range(range);
        self.emit_delta(Delta::remove(range.start, range.end, lines));
        range.start
    }

    /// Remove columns `start..end` of a single row
    pub fn remove_in_line(&self, row: usize, start_column: usize, end_column: usize) -> Position {
        let start = self.clip_position(Position::new(row, start_column));
        let end = self.clip_position(Position::new(row, end_column));
        let text = char_slice(&self.line(start.row), start.column, end.column).to_owned();
        self.emit_delta(Delta::remove(start, end, vec![text]));
        start
    }

    /// Remove whole rows `first..=last`, returning the removed lines
    pub fn remove_full_lines(&self, first: usize, last: usize) -> Vec<String> {
        let len = self.len();
        let first = first.min(len - 1);
        let last = last.min(len - 1);
        let delete_first_new_line = last == len - 1 && first > 0;
        let delete_last_new_line = last < len - 1;

        let start_row = if delete_first_new_line { first - 1 } else { first };
        let start_column = if delete_first_new_line {
            self.line_length(start_row)
        } else {
            0
        };
        let end_row = if delete_last_new_line { last + 1 } else { last };
        let end_column = if delete_last_new_line {
            0
        } else {
            self.line_length(end_row)
        };

        let removed = self.lines(first, last);
        self.remove(Range::new(start_row, start_column, end_row, end_column));
        removed
    }

    /// Join `row` with the following row
    pub fn remove_new_line(&self, row: usize) {
        if row + 1 < self.len() {
            let start = Position::new(row, self.line_length(row));
            let end = Position::new(row + 1, 0);
            self.emit_delta(Delta::remove(
                start,
                end,
                vec![String::new(), String::new()],
            ));
        }
    }

    /// Replace a range with text, returning the end of the new text
    pub fn replace(&self, range: Range, text: &str) -> Position {
        let range = self.clip_range(range);
        if text.is_empty() && range.is_empty() {
            return range.start;
        }
        if text == self.text_range(range) {
            return range.end;
        }
        self.remove(range);
        if text.is_empty() {
            range.start
        } else {
            self.insert(range.start, text)
        }
    }

    /// Apply a delta built by an edit helper; failures are logged, not returned
    fn emit_delta(&self, delta: Delta) {
        if let Err(err) = self.apply_delta(&delta) {
            warn!(%delta, error = %err, "dropping delta built from clipped positions");
        }
    }

    /// Check a delta against the current buffer
    pub fn validate_delta(&self, delta: &Delta) -> Result<()> {
        let lines = self.inner.lines.borrow();
        let in_document = |pos: Position| {
            pos.row < lines.len() && pos.column <= char_len(&lines[pos.row])
        };
        if !in_document(delta.start) {
            return Err(delta.error("delta start must be contained in document"));
        }
        if delta.action == DeltaAction::Remove && !in_document(delta.end) {
            return Err(delta.error("delta end must be contained in document for removes"));
        }
        delta.check_shape()
    }

    /// Apply a delta and notify listeners
    ///
    /// Empty edits are dropped without notification. Oversized inserts are
    /// applied as consecutive chunks, each notified on its own.
    pub fn apply_delta(&self, delta: &Delta) -> Result<()> {
        if delta.is_noop() {
            return Ok(());
        }

        if delta.is_insert() && delta.lines.len() > self.inner.max_delta_lines {
            for chunk in delta.clone().split_large(self.inner.max_delta_lines) {
                self.apply_single(&chunk)?;
            }
            return Ok(());
        }

        self.apply_single(delta)
    }

    fn apply_single(&self, delta: &Delta) -> Result<()> {
        if self.inner.validate_deltas.get() {
            self.validate_delta(delta)?;
        }
        trace!(%delta, "applying delta");
        delta.apply_to_lines(&mut self.inner.lines.borrow_mut());
        self.inner.changed.emit(delta);
        Ok(())
    }

    /// Apply the inverse of a delta
    pub fn revert_delta(&self, delta: &Delta) -> Result<()> {
        self.apply_delta(&delta.inverted())
    }

    /// Apply deltas in order
    pub fn apply_deltas(&self, deltas: &[Delta]) -> Result<()> {
        deltas.iter().try_for_each(|delta| self.apply_delta(delta))
    }

    /// Revert deltas newest first
    pub fn revert_deltas(&self, deltas: &[Delta]) -> Result<()> {
        deltas
            .iter()
            .rev()
            .try_for_each(|delta| self.revert_delta(delta))
    }

    /// Convert a char offset into the joined text to a position
    pub fn index_to_position(&self, index: usize, start_row: usize) -> Position {
        let lines = self.inner.lines.borrow();
        let new_line = self.new_line_character().len();
        let mut remaining = index;
        for (row, line) in lines.iter().enumerate().skip(start_row) {
            let width = char_len(line);
            if remaining <= width || row + 1 == lines.len() {
                return Position::new(row, remaining.min(width));
            }
            if remaining < width + new_line {
                return Position::new(row, width);
            }
            remaining -= width + new_line;
        }
        let row = lines.len() - 1;
        Position::new(row, char_len(&lines[row]))
    }

    /// Convert a position to a char offset into the joined text
    pub fn position_to_index(&self, pos: Position, start_row: usize) -> usize {
        let pos = self.clip_position(pos);
        let lines = self.inner.lines.borrow();
        let new_line = self.new_line_character().len();
        lines[start_row.min(pos.row)..pos.row]
            .iter()
            .map(|line| char_len(line) + new_line)
            .sum::<usize>()
            + pos.column
    }

    /// Create an anchor tracking `pos`
    pub fn create_anchor(&self, pos: Position) -> Anchor {
        Anchor::new(self, pos)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("")
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("lines", &self.len())
            .field("new_line_mode", &self.new_line_mode())
            .field("listeners", &self.listener_count())
            .finish()
    }
}
