use crate::types::{ReflexionGraph, State};
use serde::{Deserialize, Serialize};

/// Direction of a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeType {
    Addition,
    Removal,
}

/// Edge data captured at the time of an architecture change.
///
/// Removed edges have no index any more, so listeners get ids only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSnapshot {
    pub id: String,
    pub source: String,
    pub target: String,
    pub edge_type: String,
}

/// Change recorded by a notifying graph operation.
///
/// Silent operations and operations under `set_suppress_notifications(true)`
/// record nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeEvent {
    /// `node` was explicitly added to or removed from `cluster`
    MapsTo {
        node: String,
        cluster: String,
        change: ChangeType,
    },

    /// An implementation edge changed its state
    EdgeState { edge: String, old: State, new: State },

    /// An architecture dependency was added or removed
    ArchitectureEdge { edge: EdgeSnapshot, change: ChangeType },

    /// An architecture node was added or removed
    ArchitectureNode { node: String, change: ChangeType },
}

impl ReflexionGraph {
    pub(crate) fn notify(&mut self, event: ChangeEvent) {
        if !self.suppress_notifications {
            log::trace!("graph event: {event:?}");
            self.events.push(event);
        }
    }

    /// While set, notifying operations behave like their silent variants
    pub fn set_suppress_notifications(&mut self, suppress: bool) {
        self.suppress_notifications = suppress;
    }

    #[must_use]
    pub const fn notifications_suppressed(&self) -> bool {
        self.suppress_notifications
    }

    /// Drain all recorded events in the order they happened
    pub fn take_events(&mut self) -> Vec<ChangeEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> &[ChangeEvent] {
        &self.events
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}
