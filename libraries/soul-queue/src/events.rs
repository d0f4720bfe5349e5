//! Queue Events
//!
//! Change notifications for the playback driver and UI. The queue records
//! events as operations succeed; callers collect them with
//! [`Queue::drain_events`](crate::Queue::drain_events).

use crate::types::{ItemId, RepeatMode};
use serde::{Deserialize, Serialize};

/// Events emitted by the queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueEvent {
    /// The current leaf changed
    ///
    /// Emitted by next/previous/remove/play_now/clear only when the current
    /// leaf identity actually differs from before.
    CurrentChanged {
        /// ID of the new current leaf (None at a boundary or when emptied)
        current: Option<ItemId>,
        /// ID of the leaf that was current before
        previous: Option<ItemId>,
    },

    /// Structure changed (items added, removed or moved)
    QueueChanged {
        /// Number of top-level entries
        length: usize,
        /// Number of leaves across the queue
        leaf_count: usize,
    },

    /// A collection was shuffled or unshuffled
    ShuffleChanged {
        /// ID of the collection
        collection: ItemId,
        /// New shuffle state
        shuffled: bool,
    },

    /// Repeat mode changed
    RepeatChanged {
        /// New repeat mode
        mode: RepeatMode,
    },
}

impl QueueEvent {
    /// Whether this event tells the playback driver to load a new leaf
    pub fn is_current_change(&self) -> bool {
        matches!(self, QueueEvent::CurrentChanged { .. })
    }
}
