//! Property-based tests for caret-core
//!
//! Uses proptest to check that edits, anchors, range lists, history and
//! folds keep their invariants across random inputs.

use caret_core::{
    Document, EditSession, FoldModeKind, FoldOverlay, Position, Range, RangeList, UndoManager,
};
use proptest::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

/// Generate document text with a few short lines
fn arb_text() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z ]{0,12}", 1..6).prop_map(|lines| lines.join("\n"))
}

/// Generate text to insert, possibly spanning lines
fn arb_insert() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,6}",
        "[a-z]{0,4}\n[a-z]{0,4}",
        Just("\n".to_string()),
        "[a-zé€ ]{1,5}",
    ]
}

/// Generate a raw position; documents clip it
fn arb_position() -> impl Strategy<Value = Position> {
    (0..8usize, 0..16usize).prop_map(|(row, column)| Position::new(row, column))
}

#[derive(Debug, Clone)]
enum Edit {
    Insert(Position, String),
    Remove(Position, Position),
}

fn arb_edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (arb_position(), arb_insert()).prop_map(|(pos, text)| Edit::Insert(pos, text)),
        (arb_position(), arb_position()).prop_map(|(a, b)| Edit::Remove(a, b)),
    ]
}

proptest! {
    #[test]
    fn reverting_an_edit_restores_the_text(text in arb_text(), edit in arb_edit()) {
        let doc = Document::new(&text);
        let before = doc.value();
        let deltas = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&deltas);
        let id = doc.on_change(move |delta| sink.borrow_mut().push(delta.clone()));

        match &edit {
            Edit::Insert(pos, inserted) => {
                doc.insert(*pos, inserted);
            }
            Edit::Remove(a, b) => {
                doc.remove(Range::from_points(*a, *b));
            }
        }
        doc.off_change(id);

        doc.revert_deltas(&deltas.borrow()).unwrap();
        prop_assert_eq!(doc.value(), before);
    }

    #[test]
    fn anchor_survives_insert_then_remove(
        text in arb_text(),
        anchor_at in arb_position(),
        insert_at in arb_position(),
        inserted in arb_insert(),
    ) {
        let doc = Document::new(&text);
        let anchor = doc.create_anchor(doc.clip_position(anchor_at));
        let original = anchor.position().unwrap();

        let start = doc.clip_position(insert_at);
        let end = doc.insert(start, &inserted);
        doc.remove(Range::from_points(start, end));

        prop_assert_eq!(doc.value(), text);
        prop_assert_eq!(anchor.position().unwrap(), original);
    }

    #[test]
    fn merged_range_lists_have_no_overlaps(
        points in prop::collection::vec((arb_position(), arb_position()), 0..12),
    ) {
        let ranges: Vec<Range> = points
            .into_iter()
            .map(|(a, b)| Range::from_points(a, b))
            .collect();
        let mut list = RangeList::from_ranges(ranges.clone());
        let removed = list.merge();
        prop_assert_eq!(list.len() + removed.len(), ranges.len());

        for pair in list.ranges().windows(2) {
            prop_assert!(pair[0].start <= pair[1].start);
            prop_assert!(pair[0].end <= pair[1].start);
        }
        for range in &ranges {
            prop_assert!(list.contains_point(range.start));
            prop_assert!(list.contains_point(range.end));
        }

        let mut again = list.clone();
        prop_assert!(again.merge().is_empty());
        prop_assert_eq!(again, list);
    }

    #[test]
    fn undo_then_redo_replays_every_step(
        text in arb_text(),
        edits in prop::collection::vec(arb_edit(), 1..8),
    ) {
        let manager = Rc::new(RefCell::new(UndoManager::new()));
        let mut session = EditSession::new(Document::new(&text));
        session.set_undo_manager(Some(Rc::clone(&manager)));
        let initial = session.document().value();
        let initial_selection = session.selection().range();

        for edit in &edits {
            match edit {
                Edit::Insert(pos, inserted) => {
                    session.insert(*pos, inserted);
                }
                Edit::Remove(a, b) => {
                    session.remove(Range::from_points(*a, *b));
                }
            }
            session.mark_undo_group();
        }
        let edited = session.document().value();
        let edited_selection = session.selection().range();

        while manager.borrow().has_undo() {
            session.undo().unwrap();
        }
        prop_assert_eq!(session.document().value(), initial);
        prop_assert_eq!(session.selection().range(), initial_selection);

        while manager.borrow().has_redo() {
            session.redo().unwrap();
        }
        prop_assert_eq!(session.document().value(), edited);
        prop_assert_eq!(session.selection().range(), edited_selection);
    }

    #[test]
    fn folding_the_same_range_twice_is_idempotent(
        text in arb_text(),
        a in arb_position(),
        b in arb_position(),
    ) {
        let doc = Document::new(&text);
        let folds = FoldOverlay::new(&doc, FoldModeKind::Brace);
        let range = Range::from_points(a, b);

        if let Ok(first) = folds.add_fold("...", range) {
            let second = folds.add_fold("...", range).unwrap();
            prop_assert_eq!(first.id(), second.id());
            prop_assert_eq!(folds.all_folds().len(), 1);
        }
    }
}
