//! Positions that follow document edits
//!
//! An [`Anchor`] subscribes to its document's change signal and moves with
//! the text around it. It holds only a weak handle to the document, so every
//! read after the document is gone reports
//! [`EditorError::DocumentReleased`](crate::core::EditorError::DocumentReleased).

use super::delta::Delta;
use super::document::{Document, WeakDocument};
use super::errors::Result;
use super::position::Position;
use crate::events::{AnchorChange, ChangeOrigin, ListenerId, Signal};

use core::cell::Cell;
use core::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

struct AnchorInner {
    doc: WeakDocument,
    position: Cell<Position>,
    insert_right: Cell<bool>,
    subscription: Cell<Option<ListenerId>>,
    changed: Signal<AnchorChange>,
}

impl AnchorInner {
    fn on_delta(&self, delta: &Delta) {
        let old = self.position.get();
        let moved = delta.transform_point(old, self.insert_right.get());
        self.move_to(moved, ChangeOrigin::Delta);
    }

    fn move_to(&self, position: Position, origin: ChangeOrigin) {
        let old_position = self.position.get();
        if old_position == position {
            return;
        }
        self.position.set(position);
        trace!(%old_position, %position, ?origin, "anchor moved");
        self.changed.emit(&AnchorChange {
            old_position,
            position,
            origin,
        });
    }
}

/// A position that relocates itself as the document changes
///
/// The anchor detaches from the document when dropped.
pub struct Anchor {
    inner: Rc<AnchorInner>,
}

impl Anchor {
    /// Create an anchor at `pos`, clipped to the document
    pub fn new(doc: &Document, pos: Position) -> Self {
        let anchor = Self {
            inner: Rc::new(AnchorInner {
                doc: doc.downgrade(),
                position: Cell::new(doc.clip_position(pos)),
                insert_right: Cell::new(false),
                subscription: Cell::new(None),
                changed: Signal::new(),
            }),
        };
        anchor.subscribe(doc);
        anchor
    }

    /// Create an anchor with an explicit tie-break policy
    pub fn with_insert_right(doc: &Document, pos: Position, insert_right: bool) -> Self {
        let anchor = Self::new(doc, pos);
        anchor.set_insert_right(insert_right);
        anchor
    }

    fn subscribe(&self, doc: &Document) {
        let weak: Weak<AnchorInner> = Rc::downgrade(&self.inner);
        let id = doc.on_change(move |delta| {
            if let Some(inner) = weak.upgrade() {
                inner.on_delta(delta);
            }
        });
        self.inner.subscription.set(Some(id));
    }

    /// Current position, re-clipped against the document
    pub fn position(&self) -> Result<Position> {
        let doc = self.document()?;
        Ok(doc.clip_position(self.inner.position.get()))
    }

    /// Last known position without consulting the document
    pub fn last_position(&self) -> Position {
        self.inner.position.get()
    }

    /// Move the anchor, clipping unless `no_clip` is set
    pub fn set_position(&self, pos: Position, no_clip: bool) -> Result<()> {
        let pos = if no_clip {
            pos
        } else {
            self.document()?.clip_position(pos)
        };
        self.inner.move_to(pos, ChangeOrigin::Api);
        Ok(())
    }

    /// Whether inserts exactly at the anchor push it to the right
    pub fn insert_right(&self) -> bool {
        self.inner.insert_right.get()
    }

    pub fn set_insert_right(&self, insert_right: bool) {
        self.inner.insert_right.set(insert_right);
    }

    /// Strong handle to the anchored document
    pub fn document(&self) -> Result<Document> {
        self.inner.doc.upgrade()
    }

    /// Register a listener for position changes
    pub fn on_change<F>(&self, listener: F) -> ListenerId
    where
        F: FnMut(&AnchorChange) + 'static,
    {
        self.inner.changed.connect(listener)
    }

    /// Unregister a position listener
    pub fn off_change(&self, id: ListenerId) -> bool {
        self.inner.changed.disconnect(id)
    }

    /// Whether the anchor is following document edits
    pub fn is_attached(&self) -> bool {
        self.inner.subscription.get().is_some() && self.inner.doc.is_alive()
    }

    /// Stop following document edits
    pub fn detach(&self) {
        if let Some(id) = self.inner.subscription.take() {
            if let Ok(doc) = self.inner.doc.upgrade() {
                doc.off_change(id);
            }
        }
    }

    /// Follow document edits again after [`Anchor::detach`]
    pub fn attach(&self) -> Result<()> {
        if self.inner.subscription.get().is_some() {
            return Ok(());
        }
        let doc = self.document()?;
        self.subscribe(&doc);
        Ok(())
    }
}

impl Drop for Anchor {
    fn drop(&mut self) {
        self.detach();
    }
}

impl fmt::Debug for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Anchor")
            .field("position", &self.inner.position.get())
            .field("insert_right", &self.insert_right())
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl PartialEq<Position> for Anchor {
    fn eq(&self, other: &Position) -> bool {
        self.inner.position.get() == *other
    }
}
