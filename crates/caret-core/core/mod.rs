//! Core types and structures for caret-core
//!
//! This module contains the fundamental building blocks of the model:
//! - `Position` and `Range` value types
//! - `Delta`, the atomic edit, and `Document`, the buffer that applies it
//! - `Anchor`, a position that follows edits
//! - `RangeList`, a sorted collection of ranges that follows edits
//! - Error types shared by every component

pub mod anchor;
pub mod delta;
pub mod document;
pub mod errors;
pub mod position;
pub mod range_list;

// Re-export commonly used types
pub use anchor::Anchor;
pub use delta::{Delta, DeltaAction};
pub use document::{Document, DocumentConfig, NewLineMode, WeakDocument, MAX_DELTA_LINES};
pub use errors::{EditorError, Result};
pub use position::{Position, Range, RangeRelation};
pub use range_list::{RangeLike, RangeList, SharedRangeList};
