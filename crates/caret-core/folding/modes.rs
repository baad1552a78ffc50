//! Fold strategies
//!
//! A [`FoldMode`] decides which rows can start a fold and which range such a
//! fold covers. The overlay uses it for `fold_all`, `toggle_fold_widget` and
//! for re-collapsing children when a fold expands.

use crate::core::document::Document;
use crate::core::position::{Position, Range};
use crate::utils::text::{char_column, char_len, indent_width};

use core::fmt;
use std::sync::OnceLock;

use regex::Regex;

/// Role of a row in folding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldWidget {
    /// The row opens a foldable region
    Start,
    /// The row closes a foldable region
    End,
}

/// Strategy that locates foldable regions in a document
pub trait FoldMode: fmt::Debug {
    /// Whether `row` opens or closes a foldable region
    fn fold_widget(&self, doc: &Document, row: usize) -> Option<FoldWidget>;

    /// Range folded by the widget on `row`
    fn fold_widget_range(&self, doc: &Document, row: usize) -> Option<Range>;

    /// Tag of this strategy
    fn kind(&self) -> FoldModeKind;
}

/// Available fold strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FoldModeKind {
    /// Regions are blocks of deeper indentation
    Indent,
    /// Regions are the text between matching brackets
    #[default]
    Brace,
}

impl FoldModeKind {
    /// Build the strategy for this tag
    pub fn create(self) -> Box<dyn FoldMode> {
        match self {
            Self::Indent => Box::new(IndentFoldMode),
            Self::Brace => Box::new(BraceFoldMode),
        }
    }
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Folds blocks whose lines are indented deeper than their header
#[derive(Debug, Clone, Copy, Default)]
pub struct IndentFoldMode;

impl IndentFoldMode {
    fn next_non_blank(doc: &Document, row: usize) -> Option<(usize, String)> {
        (row + 1..doc.len())
            .map(|r| (r, doc.line(r)))
            .find(|(_, line)| !is_blank(line))
    }
}

impl FoldMode for IndentFoldMode {
    fn fold_widget(&self, doc: &Document, row: usize) -> Option<FoldWidget> {
        let line = doc.line(row);
        if is_blank(&line) {
            return None;
        }
        let (_, next) = Self::next_non_blank(doc, row)?;
        (indent_width(&next) > indent_width(&line)).then_some(FoldWidget::Start)
    }

    fn fold_widget_range(&self, doc: &Document, row: usize) -> Option<Range> {
        let line = doc.line(row);
        if is_blank(&line) {
            return None;
        }
        let indent = indent_width(&line);
        let mut end_row = row;
        for r in row + 1..doc.len() {
            let next = doc.line(r);
            if is_blank(&next) {
                continue;
            }
            if indent_width(&next) <= indent {
                break;
            }
            end_row = r;
        }
        (end_row > row).then(|| {
            Range::from_points(
                Position::new(row, char_len(&line)),
                Position::new(end_row, doc.line_length(end_row)),
            )
        })
    }

    fn kind(&self) -> FoldModeKind {
        FoldModeKind::Indent
    }
}

fn start_marker() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"([\{\[\(])[^\}\]\)]*$").expect("start marker is valid"))
}

fn end_marker() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^\[\{\(]*([\}\]\)])").expect("end marker is valid"))
}

fn closing_for(open: char) -> char {
    match open {
        '{' => '}',
        '[' => ']',
        _ => ')',
    }
}

fn opening_for(close: char) -> char {
    match close {
        '}' => '{',
        ']' => '[',
        _ => '(',
    }
}

/// Folds the text between a trailing open bracket and its partner
#[derive(Debug, Clone, Copy, Default)]
pub struct BraceFoldMode;

impl BraceFoldMode {
    /// Char column of the last unclosed opening bracket on the line
    fn open_bracket(line: &str) -> Option<(char, usize)> {
        let group = start_marker().captures(line)?.get(1)?;
        let bracket = line[group.start()..].chars().next()?;
        Some((bracket, char_column(line, group.start())))
    }

    /// Char column of the first closing bracket without an opener before it
    fn close_bracket(line: &str) -> Option<(char, usize)> {
        let group = end_marker().captures(line)?.get(1)?;
        let bracket = line[group.start()..].chars().next()?;
        Some((bracket, char_column(line, group.start())))
    }

    /// Position of the bracket closing `open`, scanning from `from`
    fn find_closing(doc: &Document, open: char, from: Position) -> Option<Position> {
        let close = closing_for(open);
        let mut depth = 1usize;
        for row in from.row..doc.len() {
            let line = doc.line(row);
            let skip = if row == from.row { from.column } else { 0 };
            for (column, c) in line.chars().enumerate().skip(skip) {
                if c == open {
                    depth += 1;
                } else if c == close {
                    depth -= 1;
                    if depth == 0 {
                        return Some(Position::new(row, column));
                    }
                }
            }
        }
        None
    }

    /// Position of the bracket opening `close`, scanning back from `from`
    fn find_opening(doc: &Document, close: char, from: Position) -> Option<Position> {
        let open = opening_for(close);
        let mut depth = 1usize;
        for row in (0..=from.row).rev() {
            let line = doc.line(row);
            let chars: Vec<char> = line.chars().collect();
            let limit = if row == from.row {
                from.column.min(chars.len())
            } else {
                chars.len()
            };
            for column in (0..limit).rev() {
                let c = chars[column];
                if c == close {
                    depth += 1;
                } else if c == open {
                    depth -= 1;
                    if depth == 0 {
                        return Some(Position::new(row, column));
                    }
                }
            }
        }
        None
    }
}

impl FoldMode for BraceFoldMode {
    fn fold_widget(&self, doc: &Document, row: usize) -> Option<FoldWidget> {
        let line = doc.line(row);
        if Self::open_bracket(&line).is_some() {
            Some(FoldWidget::Start)
        } else if Self::close_bracket(&line).is_some() {
            Some(FoldWidget::End)
        } else {
            None
        }
    }

    fn fold_widget_range(&self, doc: &Document, row: usize) -> Option<Range> {
        let line = doc.line(row);
        if let Some((bracket, column)) = Self::open_bracket(&line) {
            let start = Position::new(row, column + 1);
            let mut end = Self::find_closing(doc, bracket, start)?;
            // a closing line that reopens keeps its own header visible
            if end.row > start.row && self.fold_widget(doc, end.row) == Some(FoldWidget::Start) {
                end.row -= 1;
                end.column = doc.line_length(end.row);
            }
            return Some(Range::from_points(start, end));
        }

        let (bracket, column) = Self::close_bracket(&line)?;
        let end = Position::new(row, column);
        let mut start = Self::find_opening(doc, bracket, end)?;
        start.column += 1;
        Some(Range::from_points(start, end))
    }

    fn kind(&self) -> FoldModeKind {
        FoldModeKind::Brace
    }
}
