//! Edit session wiring a document to its folds, selection and history
//!
//! The [`EditSession`] is the one document listener that keeps folds in
//! step with edits, and it records every edit that did not come from undo
//! or redo. Recorded edits stay pending until [`EditSession::mark_undo_group`]
//! hands them to the attached [`UndoManager`] as one batch, together with
//! the selection before and after them.

use crate::core::{Document, EditorError, Position, Range, Result};
use crate::events::ListenerId;
use crate::folding::{
    Fold, FoldId, FoldModeKind, FoldOverlay, FoldSide, FoldToggle, UnfoldTarget,
};
use crate::history::{
    replay_selection, DeltaGroup, DeltaLight, FoldRecord, UndoBatch, UndoManager, UndoTarget,
};
use crate::selection::{Selection, SelectionSnapshot};

use core::cell::{Cell, RefCell};
use core::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

/// Configuration for an edit session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Strategy behind fold widgets
    pub fold_mode: FoldModeKind,

    /// Whether undo and redo move the selection
    pub undo_select: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            fold_mode: FoldModeKind::default(),
            undo_select: true,
        }
    }
}

/// Edits recorded since the last flush
#[derive(Debug, Default)]
struct PendingChanges {
    deltas: Vec<DeltaLight>,
    folds: Vec<FoldRecord>,
    merge_next: bool,
    selection_before: Option<SelectionSnapshot>,
}

impl PendingChanges {
    fn take_batch(&mut self, selection_after: SelectionSnapshot) -> UndoBatch {
        let mut groups = Vec::with_capacity(2);
        if !self.deltas.is_empty() {
            groups.push(DeltaGroup::Doc(core::mem::take(&mut self.deltas)));
        }
        if !self.folds.is_empty() {
            groups.push(DeltaGroup::Fold(core::mem::take(&mut self.folds)));
        }
        UndoBatch {
            groups,
            merge: core::mem::take(&mut self.merge_next),
            selection_before: self.selection_before.take(),
            selection_after: Some(selection_after),
        }
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// State shared with the document listener
#[derive(Debug, Default)]
struct Recorder {
    from_undo: Cell<bool>,
    recording: Cell<bool>,
    pending: RefCell<PendingChanges>,
}

/// A document together with its folds, selection and undo history
pub struct EditSession {
    doc: Document,
    folds: Rc<FoldOverlay>,
    selection: Selection,
    undo_manager: Option<Rc<RefCell<UndoManager>>>,
    config: SessionConfig,
    recorder: Rc<Recorder>,
    subscription: ListenerId,
}

impl EditSession {
    /// Create a session over `doc` with default configuration
    pub fn new(doc: Document) -> Self {
        Self::with_config(doc, SessionConfig::default())
    }

    /// Create a session over `doc` with custom configuration
    pub fn with_config(doc: Document, config: SessionConfig) -> Self {
        let folds = Rc::new(FoldOverlay::new(&doc, config.fold_mode));
        let mut selection = Selection::new(&doc);
        selection.set_fold_overlay(Some(Rc::clone(&folds)));
        let recorder = Rc::new(Recorder::default());

        let weak_folds = Rc::downgrade(&folds);
        let weak_recorder = Rc::downgrade(&recorder);
        let subscription = doc.on_change(move |delta| {
            let removed = weak_folds
                .upgrade()
                .map(|folds| folds.on_delta(delta))
                .unwrap_or_default();
            let Some(recorder) = weak_recorder.upgrade() else {
                return;
            };
            if recorder.from_undo.get() || !recorder.recording.get() {
                return;
            }
            let mut pending = recorder.pending.borrow_mut();
            pending.deltas.push(DeltaLight::from(delta));
            if !removed.is_empty() {
                pending.folds.push(FoldRecord { folds: removed });
            }
        });

        Self {
            doc,
            folds,
            selection,
            undo_manager: None,
            config,
            recorder,
            subscription,
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub fn folds(&self) -> &Rc<FoldOverlay> {
        &self.folds
    }

    /// Switch the fold strategy
    pub fn set_fold_mode(&mut self, kind: FoldModeKind) {
        self.config.fold_mode = kind;
        self.folds.set_fold_mode(kind);
    }

    /// Attach a shared undo manager, dropping unflushed edits
    pub fn set_undo_manager(&mut self, manager: Option<Rc<RefCell<UndoManager>>>) {
        self.recorder.pending.borrow_mut().clear();
        self.recorder.recording.set(manager.is_some());
        self.undo_manager = manager;
    }

    pub fn undo_manager(&self) -> Option<&Rc<RefCell<UndoManager>>> {
        self.undo_manager.as_ref()
    }

    /// Whether undo and redo select the touched text of a step that
    /// carries no selection snapshot
    ///
    /// A multi-range selection is left alone.
    pub fn undo_select(&self) -> bool {
        self.config.undo_select && !self.selection.in_multi_select_mode()
    }

    /// Close the current undo step
    ///
    /// Pending edits become one batch on the undo manager, stamped with the
    /// current selection.
    pub fn mark_undo_group(&mut self) {
        let batch = self
            .recorder
            .pending
            .borrow_mut()
            .take_batch(self.selection.snapshot());
        let Some(manager) = &self.undo_manager else {
            return;
        };
        if !batch.groups.is_empty() {
            manager.borrow_mut().execute(batch);
        }
    }

    /// Fold the next undo step into the previous one
    pub fn merge_next_undo_deltas(&mut self) {
        self.recorder.pending.borrow_mut().merge_next = true;
    }

    /// Snapshot the selection ahead of the first edit of a step
    fn remember_selection(&self) {
        if !self.recorder.recording.get() {
            return;
        }
        let mut pending = self.recorder.pending.borrow_mut();
        if pending.deltas.is_empty() {
            pending.selection_before = Some(self.selection.snapshot());
        }
    }

    /// Insert `text` at `pos`, returning the end of the inserted text
    pub fn insert(&mut self, pos: Position, text: &str) -> Position {
        self.remember_selection();
        self.doc.insert(pos, text)
    }

    /// Remove `range`, returning its clipped start
    pub fn remove(&mut self, range: Range) -> Position {
        self.remember_selection();
        self.doc.remove(range)
    }

    /// Replace `range` with `text`, returning the end of the new text
    pub fn replace(&mut self, range: Range, text: &str) -> Position {
        self.remember_selection();
        self.doc.replace(range, text)
    }

    /// Replace the whole content, resetting the caret and the history
    pub fn set_value(&mut self, text: &str) -> Result<()> {
        self.doc.set_value(text);
        self.selection.to_single_range(None)?;
        self.selection.move_to(Position::start())?;
        self.recorder.pending.borrow_mut().clear();
        if let Some(manager) = &self.undo_manager {
            manager.borrow_mut().reset();
        }
        Ok(())
    }

    /// The word or separator run at `pos`
    pub fn word_range(&self, pos: Position) -> Result<Range> {
        self.selection.word_range(pos)
    }

    fn attached_manager(&self) -> Result<Rc<RefCell<UndoManager>>> {
        self.undo_manager
            .clone()
            .ok_or_else(|| EditorError::history("no undo manager attached"))
    }

    /// Undo the newest batch, flushing pending edits first
    pub fn undo(&mut self) -> Result<Option<Range>> {
        self.mark_undo_group();
        let manager = self.attached_manager()?;
        let mut manager = manager.borrow_mut();
        manager.undo(self, true)
    }

    /// Redo the most recently undone batch
    pub fn redo(&mut self) -> Result<Option<Range>> {
        self.mark_undo_group();
        let manager = self.attached_manager()?;
        let mut manager = manager.borrow_mut();
        manager.redo(self, true)
    }

    fn restore_folds(&self, records: &[FoldRecord]) {
        for fold in records.iter().flat_map(|record| record.folds.iter().cloned()) {
            let range = fold.range();
            if let Err(err) = self.folds.add_folds(vec![fold]) {
                warn!(%range, error = %err, "fold not restored");
            }
        }
    }

    fn replay(&self, groups: &[DeltaGroup], undo: bool) -> Result<Option<Range>> {
        let mut selected = None;
        if undo {
            let mut folds: &[FoldRecord] = &[];
            for group in groups.iter().rev() {
                match group {
                    DeltaGroup::Fold(records) => folds = records,
                    DeltaGroup::Doc(deltas) => {
                        let deltas_full: Vec<_> = deltas.iter().map(DeltaLight::to_delta).collect();
                        self.doc.revert_deltas(&deltas_full)?;
                        self.restore_folds(folds);
                        folds = &[];
                        selected = replay_selection(deltas, true, selected, Some(&self.folds));
                    }
                }
            }
            self.restore_folds(folds);
        } else {
            for group in groups {
                if let DeltaGroup::Doc(deltas) = group {
                    let deltas_full: Vec<_> = deltas.iter().map(DeltaLight::to_delta).collect();
                    self.doc.apply_deltas(&deltas_full)?;
                    selected = replay_selection(deltas, false, selected, Some(&self.folds));
                }
            }
        }
        Ok(selected)
    }

    /// Replay `groups`, then move the selection
    ///
    /// A recorded `selection` snapshot is restored as it was; without one
    /// the touched range gets selected.
    fn replay_changes(
        &mut self,
        groups: &[DeltaGroup],
        selection: Option<&SelectionSnapshot>,
        undo: bool,
        select: bool,
    ) -> Result<Option<Range>> {
        if groups.is_empty() {
            return Ok(None);
        }
        self.recorder.from_undo.set(true);
        let replayed = self.replay(groups, undo);
        self.recorder.from_undo.set(false);
        let selected = replayed?;

        debug!(undo, groups = groups.len(), range = ?selected, "history replayed");
        if !select || !self.config.undo_select {
            return Ok(selected);
        }
        match (selection, selected) {
            (Some(snapshot), _) => self.selection.restore(snapshot)?,
            (None, Some(range)) if self.undo_select() => {
                self.selection.set_selection_range(range, false)?;
            }
            _ => {}
        }
        Ok(selected)
    }

    /// Collapse `range` behind `placeholder`
    pub fn add_fold(&self, placeholder: &str, range: Range) -> Result<Fold> {
        self.folds.add_fold(placeholder, range)
    }

    pub fn remove_fold(&self, id: FoldId) -> Result<Fold> {
        self.folds.remove_fold(id)
    }

    pub fn expand_fold(&self, id: FoldId) -> Result<Fold> {
        self.folds.expand_fold(id)
    }

    pub fn unfold(&self, target: UnfoldTarget, expand_inner: bool) -> Result<Vec<Fold>> {
        self.folds.unfold(target, expand_inner)
    }

    /// Fold every region the fold strategy finds
    pub fn fold_all(&self) -> usize {
        self.folds.fold_all(0, self.doc.len(), 0)
    }

    pub fn toggle_fold_widget(&self, row: usize) -> Result<FoldToggle> {
        self.folds.toggle_fold_widget(row)
    }

    pub fn get_fold_at(&self, pos: Position, side: FoldSide) -> Option<Fold> {
        self.folds.get_fold_at(pos.row, pos.column, side)
    }
}

impl UndoTarget for EditSession {
    fn undo_changes(
        &mut self,
        groups: &[DeltaGroup],
        selection: Option<&SelectionSnapshot>,
        select: bool,
    ) -> Result<Option<Range>> {
        self.replay_changes(groups, selection, true, select)
    }

    fn redo_changes(
        &mut self,
        groups: &[DeltaGroup],
        selection: Option<&SelectionSnapshot>,
        select: bool,
    ) -> Result<Option<Range>> {
        self.replay_changes(groups, selection, false, select)
    }
}

impl Drop for EditSession {
    fn drop(&mut self) {
        self.doc.off_change(self.subscription);
    }
}

impl fmt::Debug for EditSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditSession")
            .field("doc", &self.doc)
            .field("folds", &self.folds)
            .field("selection", &self.selection)
            .field("config", &self.config)
            .field("undo", &self.undo_manager.as_ref().map(|m| m.borrow().stats()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn session(text: &str) -> EditSession {
        let mut session = EditSession::new(Document::new(text));
        session.set_undo_manager(Some(Rc::new(RefCell::new(UndoManager::new()))));
        session
    }

    #[test]
    fn undo_and_redo_restore_the_selection() {
        let mut session = session("hello");
        session.selection_mut().move_to(Position::new(0, 2)).unwrap();
        session.insert(Position::new(0, 5), " world");
        session.mark_undo_group();
        session
            .selection_mut()
            .set_selection_range(Range::new(0, 6, 0, 11), true)
            .unwrap();
        session.insert(Position::new(0, 0), ">> ");
        session.mark_undo_group();
        assert_eq!(session.selection().range(), Range::new(0, 9, 0, 14));

        let range = session.undo().unwrap();
        assert_eq!(session.document().value(), "hello world");
        assert_eq!(range, Some(Range::empty(Position::new(0, 0))));
        assert_eq!(session.selection().range(), Range::new(0, 6, 0, 11));
        assert!(session.selection().is_backwards());

        session.undo().unwrap();
        assert_eq!(session.document().value(), "hello");
        assert_eq!(session.selection().range(), Range::empty(Position::new(0, 2)));

        let range = session.redo().unwrap();
        assert_eq!(session.document().value(), "hello world");
        assert_eq!(range, Some(Range::new(0, 5, 0, 11)));
        assert_eq!(session.selection().range(), Range::empty(Position::new(0, 2)));

        session.redo().unwrap();
        assert_eq!(session.document().value(), ">> hello world");
        assert_eq!(session.selection().range(), Range::new(0, 9, 0, 14));
        assert!(session.selection().is_backwards());
    }

    #[test]
    fn document_edits_select_touched_text() {
        let mut session = session("hello");
        session.document().insert(Position::new(0, 5), " world");
        session.mark_undo_group();

        let range = session.undo().unwrap();
        assert_eq!(range, Some(Range::empty(Position::new(0, 5))));
        assert_eq!(session.selection().range(), Range::empty(Position::new(0, 5)));
    }

    #[test]
    fn undo_inside_a_fold_selects_its_start() {
        let mut session = session("fn f() {\n    bxody\n}");
        session.remove(Range::new(1, 5, 1, 6));
        session.mark_undo_group();
        let fold = session.add_fold("...", Range::new(0, 8, 2, 0)).unwrap();

        let range = session.undo().unwrap();
        assert_eq!(session.document().value(), "fn f() {\n    bxody\n}");
        assert_eq!(range, Some(Range::empty(fold.start())));
        assert_eq!(session.folds().all_folds(), vec![fold]);
    }

    #[test]
    fn undo_flushes_pending_edits() {
        let mut session = session("abc");
        session.insert(Position::new(0, 3), "d");
        session.undo().unwrap();
        assert_eq!(session.document().value(), "abc");
        assert_eq!(session.undo(), Err(EditorError::NothingToUndo));
    }

    #[test]
    fn merged_steps_undo_together() {
        let mut session = session("");
        session.insert(Position::new(0, 0), "a");
        session.mark_undo_group();
        session.merge_next_undo_deltas();
        session.insert(Position::new(0, 1), "b");
        session.mark_undo_group();

        let manager = Rc::clone(session.undo_manager().unwrap());
        assert_eq!(manager.borrow().stats().undo_count, 1);
        session.undo().unwrap();
        assert_eq!(session.document().value(), "");
    }

    #[test]
    fn undo_restores_erased_folds() {
        let mut session = session("a\nb {\n  c\n}\nd");
        let fold = session.add_fold("...", Range::new(1, 3, 3, 0)).unwrap();
        session.remove(Range::new(0, 1, 4, 0));
        session.mark_undo_group();
        assert!(session.folds().all_folds().is_empty());

        session.undo().unwrap();
        assert_eq!(session.document().value(), "a\nb {\n  c\n}\nd");
        let restored = session.folds().all_folds();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored[0].range(), fold.range());
        assert_eq!(restored[0].id(), fold.id());
    }

    #[test]
    fn replay_is_not_recorded() {
        let mut session = session("x");
        session.insert(Position::new(0, 1), "y");
        session.mark_undo_group();
        session.undo().unwrap();
        session.mark_undo_group();

        let manager = Rc::clone(session.undo_manager().unwrap());
        let stats = manager.borrow().stats();
        assert_eq!(stats.undo_count, 0);
        assert_eq!(stats.redo_count, 1);
    }

    #[test]
    fn set_value_resets_history() {
        let mut session = session("one");
        session.insert(Position::new(0, 3), " two");
        session.mark_undo_group();
        session.selection_mut().select_all().unwrap();

        session.set_value("fresh\ntext").unwrap();
        assert_eq!(session.document().len(), 2);
        assert_eq!(session.selection().cursor(), Position::start());
        assert!(session.selection().is_empty());
        let manager = Rc::clone(session.undo_manager().unwrap());
        assert!(!manager.borrow().has_undo());
        assert!(manager.borrow().is_clean());
    }

    #[test]
    fn edits_without_manager_are_dropped() {
        let mut session = EditSession::new(Document::new("abc"));
        session.insert(Position::new(0, 0), "z");
        session.mark_undo_group();
        assert!(session.undo().is_err());
    }

    #[test]
    fn undo_select_off_keeps_selection() {
        let config = SessionConfig {
            undo_select: false,
            ..SessionConfig::default()
        };
        let mut session = EditSession::with_config(Document::new("abc"), config);
        session.set_undo_manager(Some(Rc::new(RefCell::new(UndoManager::new()))));
        session.insert(Position::new(0, 3), "def");
        session.mark_undo_group();
        session.undo().unwrap();
        session.redo().unwrap();
        assert!(session.selection().is_empty());
        assert_eq!(session.selection().cursor(), Position::start());
    }
}
