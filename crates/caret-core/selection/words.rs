//! Word boundary scanning
//!
//! Word chars are letters, marks, digits, connector punctuation, `$` and
//! `_`. Runs are matched with anchored regexes on the text to one side of a
//! column; scanning left matches against the reversed prefix.

use crate::core::position::Range;
use crate::utils::text::{char_len, char_slice};

use std::sync::OnceLock;

use regex::Regex;

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[\p{L}\p{Mn}\p{Mc}\p{Nd}\p{Pc}\$_]+").expect("word pattern is valid")
    })
}

fn non_word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:[^\p{L}\p{Mn}\p{Mc}\p{Nd}\p{Pc}\$_]|\s)+")
            .expect("non-word pattern is valid")
    })
}

/// Whether `c` belongs to a word
pub fn is_word_char(c: char) -> bool {
    let mut buf = [0u8; 4];
    word_pattern().is_match(c.encode_utf8(&mut buf))
}

fn leading_run(pattern: &Regex, text: &str) -> usize {
    pattern.find(text).map_or(0, |m| char_len(m.as_str()))
}

fn reversed_prefix(line: &str, column: usize) -> String {
    char_slice(line, 0, column).chars().rev().collect()
}

/// Chars in the word run starting at `column`
pub fn word_run_right(line: &str, column: usize) -> usize {
    leading_run(word_pattern(), char_slice(line, column, usize::MAX))
}

/// Chars in the separator run starting at `column`
pub fn separator_run_right(line: &str, column: usize) -> usize {
    leading_run(non_word_pattern(), char_slice(line, column, usize::MAX))
}

/// Chars in the word run ending at `column`
pub fn word_run_left(line: &str, column: usize) -> usize {
    leading_run(word_pattern(), &reversed_prefix(line, column))
}

/// Chars in the separator run ending at `column`
pub fn separator_run_left(line: &str, column: usize) -> usize {
    leading_run(non_word_pattern(), &reversed_prefix(line, column))
}

/// Distance to the end of the next short word in `text`
///
/// A word run ends the step right away. Otherwise whitespace is skipped,
/// and when there was none, punctuation up to the next word or a
/// whitespace gap is skipped.
pub fn short_word_end(text: &str) -> usize {
    let word = leading_run(word_pattern(), text);
    if word > 0 {
        return word;
    }
    let chars: Vec<char> = text.chars().collect();
    let mut index = chars.iter().take_while(|c| c.is_whitespace()).count();
    if index >= 1 {
        return index;
    }
    while let Some(&c) = chars.get(index) {
        if is_word_char(c) {
            break;
        }
        index += 1;
        if c.is_whitespace() {
            if index > 2 {
                index -= 1;
                break;
            }
            while chars.get(index).is_some_and(|c| c.is_whitespace()) {
                index += 1;
            }
            if index > 2 {
                break;
            }
        }
    }
    index
}

/// Same as [`short_word_end`] scanning leftwards from the end of `text`
pub fn short_word_start(text: &str) -> usize {
    let reversed: String = text.chars().rev().collect();
    short_word_end(&reversed)
}

/// The run of same-class chars around `column` on `row`
///
/// Word chars win when either neighbour of the column is one; otherwise
/// whitespace between two blanks forms the run, and any other separator
/// run is used.
pub fn word_range(line: &str, row: usize, column: usize) -> Range {
    let chars: Vec<char> = line.chars().collect();
    let column = column.min(chars.len());
    let before = column.checked_sub(1).and_then(|i| chars.get(i)).copied();
    let at = chars.get(column).copied();

    let in_word = before.is_some_and(is_word_char) || at.is_some_and(is_word_char);
    let between_blanks = before.is_some_and(char::is_whitespace) && at.map_or(true, char::is_whitespace);
    let matches = |c: char| {
        if in_word {
            is_word_char(c)
        } else if between_blanks {
            c.is_whitespace()
        } else {
            !is_word_char(c) || c.is_whitespace()
        }
    };

    let start = chars[..column]
        .iter()
        .rev()
        .take_while(|&&c| matches(c))
        .count();
    let end = chars[column..].iter().take_while(|&&c| matches(c)).count();
    Range::new(row, column - start, row, column + end)
}
