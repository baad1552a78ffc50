//! Event system for document changes and model notifications
//!
//! Provides [`Signal`], a typed listener registry with synchronous,
//! same-thread delivery, plus the event payloads emitted by anchors, the
//! fold overlay and the selection model. Document changes are delivered as
//! the [`Delta`](crate::core::Delta) itself.

use crate::core::{Position, Range};
use crate::folding::Fold;
use crate::selection::OrientedRange;

use core::cell::{Cell, RefCell};
use core::fmt;
use std::rc::Rc;

use tracing::warn;

/// Identifier handed out when registering a listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(usize);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

type Callback<E> = Rc<RefCell<dyn FnMut(&E)>>;

/// Information about a registered listener
struct ListenerSlot<E> {
    /// Unique listener ID
    id: ListenerId,
    /// Listener implementation
    callback: Callback<E>,
}

/// Statistics about a signal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalStats {
    /// Total number of events emitted
    pub events_emitted: usize,
    /// Number of listeners currently registered
    pub listeners_count: usize,
    /// Deliveries skipped because the listener was already running
    pub reentrant_skips: usize,
}

/// Typed listener registry
///
/// Delivery snapshots the listener list first, so a listener may connect
/// or disconnect listeners (itself included) while an event is in flight.
/// A listener that is re-entered through its own delivery is skipped.
pub struct Signal<E> {
    /// Registered listeners in registration order
    listeners: RefCell<Vec<ListenerSlot<E>>>,
    /// Next listener ID for unique identification
    next_id: Cell<usize>,
    /// Emission statistics
    stats: Cell<SignalStats>,
}

impl<E> Signal<E> {
    /// Create a signal with no listeners
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
            stats: Cell::new(SignalStats::default()),
        }
    }

    /// Register a listener, returning the id used to disconnect it
    pub fn connect<F>(&self, listener: F) -> ListenerId
    where
        F: FnMut(&E) + 'static,
    {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        let callback: Callback<E> = Rc::new(RefCell::new(listener));
        self.listeners.borrow_mut().push(ListenerSlot { id, callback });

        let mut stats = self.stats.get();
        stats.listeners_count += 1;
        self.stats.set(stats);
        id
    }

    /// Unregister a listener by ID
    pub fn disconnect(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        if let Some(pos) = listeners.iter().position(|slot| slot.id == id) {
            listeners.remove(pos);
            let mut stats = self.stats.get();
            stats.listeners_count -= 1;
            self.stats.set(stats);
            true
        } else {
            false
        }
    }

    /// Check whether a listener is still registered
    pub fn is_connected(&self, id: ListenerId) -> bool {
        self.listeners.borrow().iter().any(|slot| slot.id == id)
    }

    /// Deliver an event to every registered listener
    pub fn emit(&self, event: &E) {
        let snapshot: Vec<(ListenerId, Callback<E>)> = self
            .listeners
            .borrow()
            .iter()
            .map(|slot| (slot.id, Rc::clone(&slot.callback)))
            .collect();

        let mut stats = self.stats.get();
        stats.events_emitted += 1;
        self.stats.set(stats);

        for (id, callback) in snapshot {
            if !self.is_connected(id) {
                continue;
            }
            match callback.try_borrow_mut() {
                Ok(mut listener) => (*listener)(event),
                Err(_) => {
                    warn!(%id, "listener re-entered during its own delivery, skipping");
                    let mut stats = self.stats.get();
                    stats.reentrant_skips += 1;
                    self.stats.set(stats);
                }
            }
        }
    }

    /// Remove every listener
    pub fn clear(&self) {
        self.listeners.borrow_mut().clear();
        let mut stats = self.stats.get();
        stats.listeners_count = 0;
        self.stats.set(stats);
    }

    /// Get signal statistics
    pub fn stats(&self) -> SignalStats {
        self.stats.get()
    }

    /// Number of registered listeners
    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Whether no listener is registered
    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }
}

impl<E> Default for Signal<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Signal<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("listeners", &self.len())
            .field("stats", &self.stats.get())
            .finish()
    }
}

/// Where an anchor movement came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// The anchor followed a document edit
    Delta,
    /// The anchor was repositioned explicitly
    Api,
}

/// Emitted by an anchor whenever its position actually changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorChange {
    /// Position before the change
    pub old_position: Position,
    /// Position after the change
    pub position: Position,
    /// What caused the change
    pub origin: ChangeOrigin,
}

/// Emitted by the fold overlay on every add and remove
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FoldEvent {
    /// A fold was added
    ///
    /// Also sent for a fold nested into an existing one, carrying document
    /// coordinates; the parent then lists it among its sub-folds.
    Added(Fold),
    /// A fold was removed
    Removed(Fold),
}

impl FoldEvent {
    /// The fold this event is about
    pub fn fold(&self) -> &Fold {
        match self {
            Self::Added(fold) | Self::Removed(fold) => fold,
        }
    }

    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            Self::Added(fold) => format!("Added fold {} '{}'", fold.range(), fold.placeholder()),
            Self::Removed(fold) => {
                format!("Removed fold {} '{}'", fold.range(), fold.placeholder())
            }
        }
    }
}

/// Types of events emitted by a selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionEvent {
    /// A range joined the multi-range list
    AddRange {
        /// The range that was added
        range: OrientedRange,
    },
    /// Ranges left the multi-range list
    RemoveRange {
        /// The ranges that were removed
        ranges: Vec<OrientedRange>,
    },
    /// The selected extent changed
    ChangeSelection,
    /// The caret moved
    ChangeCursor,
    /// The selection entered multi-range mode
    MultiSelect,
    /// The selection returned to single-range mode
    SingleSelect,
}

impl SelectionEvent {
    /// Check whether this event is a mode transition
    pub fn is_mode_change(&self) -> bool {
        matches!(self, Self::MultiSelect | Self::SingleSelect)
    }

    /// Range affected by add events
    pub fn added_range(&self) -> Option<Range> {
        match self {
            Self::AddRange { range } => Some(range.range),
            _ => None,
        }
    }
}
