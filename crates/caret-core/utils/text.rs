//! Line and column helpers shared by the buffer and the selection model
//!
//! Columns are counted in chars, while `String` indexing is by byte, so
//! every slice of a line goes through these conversions.

use std::sync::OnceLock;

use regex::Regex;

fn new_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\r\n|\r|\n").expect("newline pattern is valid"))
}

/// Split text into lines on `\r\n`, `\r` or `\n`
///
/// Always yields at least one line; a trailing terminator yields a trailing
/// empty line.
pub fn split_lines(text: &str) -> Vec<String> {
    new_line_pattern().split(text).map(str::to_owned).collect()
}

/// The first line terminator found in `text`, if any
pub fn detect_new_line(text: &str) -> Option<&str> {
    new_line_pattern().find(text).map(|m| m.as_str())
}

/// Number of chars in a line
pub fn char_len(line: &str) -> usize {
    line.chars().count()
}

/// Byte offset of char column `column`, clamped to the end of the line
pub fn byte_index(line: &str, column: usize) -> usize {
    line.char_indices()
        .nth(column)
        .map_or(line.len(), |(index, _)| index)
}

/// Char column of byte offset `index`
pub fn char_column(line: &str, index: usize) -> usize {
    line[..index.min(line.len())].chars().count()
}

/// Slice a line by char columns, both clamped to the line
pub fn char_slice(line: &str, start: usize, end: usize) -> &str {
    let from = byte_index(line, start);
    let to = byte_index(line, end.max(start));
    &line[from..to]
}

/// Leading whitespace width of a line in chars
pub fn indent_width(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}
