//! Utility modules for caret-core
//!
//! Contains the char/byte column helpers and line splitting used by the
//! buffer, the word motions and the fold strategies.

pub mod text;

pub use text::{byte_index, char_column, char_len, char_slice, detect_new_line, split_lines};
