//! Mutation-consistent text model for code editors
//!
//! `caret-core` keeps a line-oriented buffer together with everything that
//! floats on top of it: anchors, range lists, folds and selections all
//! relocate themselves whenever the buffer changes, and an undo manager
//! records those changes in replayable batches.
//!
//! # Features
//!
//! - **Deltas**: every edit is an invertible [`Delta`] broadcast to listeners
//! - **Anchors**: positions that follow inserts and removes
//! - **Range lists**: sorted, mergeable range collections for multi-select
//! - **Folding**: nested folds grouped into fold lines, with indent and
//!   brace fold strategies
//! - **Selection**: caret motion, word and line selection, multi-range mode
//! - **Undo/redo**: batched history with a dirty counter and fold restore
//!
//! # Example
//!
//! ```
//! use caret_core::{Document, EditSession, Position, Range, UndoManager};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let mut session = EditSession::new(Document::new("hello world"));
//! session.set_undo_manager(Some(Rc::new(RefCell::new(UndoManager::new()))));
//!
//! let anchor = session.document().create_anchor(Position::new(0, 6));
//! session.insert(Position::new(0, 0), "XYZ");
//! session.mark_undo_group();
//! assert_eq!(anchor.last_position(), Position::new(0, 9));
//!
//! session.undo().unwrap();
//! assert_eq!(session.document().value(), "hello world");
//! assert_eq!(session.selection().range(), Range::empty(Position::new(0, 0)));
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod core;
pub mod events;
pub mod folding;
pub mod history;
pub mod selection;
pub mod sessions;
pub mod utils;

// Public API exports
pub use crate::core::{
    Anchor, Delta, DeltaAction, Document, DocumentConfig, EditorError, NewLineMode, Position,
    Range, RangeLike, RangeList, RangeRelation, Result, SharedRangeList, WeakDocument,
};
pub use events::{
    AnchorChange, ChangeOrigin, FoldEvent, ListenerId, SelectionEvent, Signal, SignalStats,
};
pub use folding::{
    Fold, FoldId, FoldLine, FoldMode, FoldModeKind, FoldOverlay, FoldSide, FoldToggle,
    FoldWidget, StringTrim, UnfoldTarget,
};
pub use history::{
    DeltaGroup, DeltaLight, DeltaText, FoldRecord, HistoryStats, UndoBatch, UndoManager,
    UndoManagerConfig, UndoTarget,
};
pub use selection::{OrientedRange, RangeId, Selection, SelectionSnapshot};
pub use sessions::{EditSession, SessionConfig};
