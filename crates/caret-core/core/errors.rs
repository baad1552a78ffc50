//! Error types for the caret-core crate
//!
//! Provides the main `EditorError` enum. Follows the same philosophy
//! throughout the crate:
//! - Use thiserror for structured error handling (no anyhow)
//! - Provide enough context to locate the offending position or fold
//! - Invariant violations surface as errors instead of corrupting state
//!
//! Clipping of out-of-range positions is not an error; it happens silently
//! wherever caller input flows into the model.

use crate::core::position::{Position, Range};
use core::fmt;

use thiserror::Error;

/// Main error type for caret-core operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    /// A delta failed validation against the document
    #[error("Invalid delta {action} {start}..{end}: {message}")]
    InvalidDelta {
        action: &'static str,
        start: Position,
        end: Position,
        message: String,
    },

    /// The document backing an anchor, range list or selection was released
    #[error("Document has been released")]
    DocumentReleased,

    /// Fold ranges must cover at least two characters
    #[error("Fold range {range} must be at least 2 characters wide")]
    FoldTooNarrow { range: Range },

    /// A fold partially overlaps an existing fold without nesting in it
    #[error("Fold {range} intersects existing fold {existing}")]
    FoldOverlap { range: Range, existing: Range },

    /// A fold could not be added to a fold line that does not touch it
    #[error("Fold {range} has no connection to fold line {line}")]
    FoldLineMismatch { range: Range, line: Range },

    /// No fold with the given id is present
    #[error("Fold not found: {id}")]
    FoldNotFound { id: u64 },

    /// No selection range with the given id is present
    #[error("Selection range not found: {id}")]
    RangeNotFound { id: u64 },

    /// Undo/redo operation failed
    #[error("History operation failed: {message}")]
    HistoryError { message: String },

    /// No operation to undo
    #[error("Nothing to undo")]
    NothingToUndo,

    /// No operation to redo
    #[error("Nothing to redo")]
    NothingToRedo,
}

impl EditorError {
    /// Create a new invalid delta error
    pub fn invalid_delta<T: fmt::Display>(
        action: &'static str,
        start: Position,
        end: Position,
        message: T,
    ) -> Self {
        Self::InvalidDelta {
            action,
            start,
            end,
            message: message.to_string(),
        }
    }

    /// Create a new history error
    pub fn history<T: fmt::Display>(message: T) -> Self {
        Self::HistoryError {
            message: message.to_string(),
        }
    }

    /// Check if error is recoverable
    ///
    /// A released document cannot be brought back, every other condition
    /// leaves the model untouched and the caller may retry with other input.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::InvalidDelta { .. }
            | Self::FoldTooNarrow { .. }
            | Self::FoldOverlap { .. }
            | Self::FoldLineMismatch { .. }
            | Self::FoldNotFound { .. }
            | Self::RangeNotFound { .. }
            | Self::HistoryError { .. }
            | Self::NothingToUndo
            | Self::NothingToRedo => true,
            Self::DocumentReleased => false,
        }
    }

    /// Check if this is a position-related error
    #[must_use]
    pub const fn is_position_error(&self) -> bool {
        matches!(self, Self::InvalidDelta { .. })
    }

    /// Check if this is a fold-related error
    #[must_use]
    pub const fn is_fold_error(&self) -> bool {
        matches!(
            self,
            Self::FoldTooNarrow { .. }
                | Self::FoldOverlap { .. }
                | Self::FoldLineMismatch { .. }
                | Self::FoldNotFound { .. }
        )
    }

    /// Check if this is a history-related error
    #[must_use]
    pub const fn is_history_error(&self) -> bool {
        matches!(
            self,
            Self::HistoryError { .. } | Self::NothingToUndo | Self::NothingToRedo
        )
    }
}

/// Result type alias for editor operations
pub type Result<T> = core::result::Result<T, EditorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_recoverability() {
        assert!(EditorError::history("test").is_recoverable());
        assert!(EditorError::NothingToUndo.is_recoverable());
        assert!(!EditorError::DocumentReleased.is_recoverable());
    }

    #[test]
    fn position_error_detection() {
        assert!(EditorError::invalid_delta(
            "insert",
            Position::new(0, 0),
            Position::new(0, 1),
            "mismatch"
        )
        .is_position_error());
        assert!(!EditorError::NothingToRedo.is_position_error());
    }

    #[test]
    fn fold_error_detection() {
        let range = Range::new(0, 0, 0, 1);
        assert!(EditorError::FoldTooNarrow { range }.is_fold_error());
        assert!(EditorError::FoldNotFound { id: 3 }.is_fold_error());
        assert!(!EditorError::DocumentReleased.is_fold_error());
    }

    #[test]
    fn history_error_detection() {
        assert!(EditorError::NothingToUndo.is_history_error());
        assert!(EditorError::NothingToRedo.is_history_error());
        assert!(EditorError::history("test").is_history_error());
        assert!(!EditorError::DocumentReleased.is_history_error());
    }

    #[test]
    fn error_display() {
        let err = EditorError::FoldOverlap {
            range: Range::new(0, 1, 0, 5),
            existing: Range::new(0, 3, 0, 8),
        };
        assert_eq!(
            err.to_string(),
            "Fold [0/1 -> 0/5] intersects existing fold [0/3 -> 0/8]"
        );
        assert_eq!(
            EditorError::DocumentReleased.to_string(),
            "Document has been released"
        );
    }
}
