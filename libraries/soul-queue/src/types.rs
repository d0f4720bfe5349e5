//! Core types for queue management

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Identifier of a queue entry
///
/// Used for top-level Singles, Collections and collection children alike.
/// Identifiers are unique across the whole queue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Create a new item ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for ItemId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Repeat mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RepeatMode {
    /// Stop when the queue ends
    #[default]
    Off,

    /// Stay on the current leaf
    One,

    /// Loop the collection the current leaf belongs to
    ///
    /// Behaves like `Off` while a top-level Single is current.
    Collection,

    /// Loop the entire queue
    All,
}

/// What happens to a Collection when its last child is removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmptyCollectionPolicy {
    /// Drop the Collection from the top level
    #[default]
    Remove,

    /// Leave the empty Collection in place
    Keep,
}

/// Queue lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueState {
    /// No leaves exist
    Empty,

    /// At least one leaf exists (current may or may not be set)
    Populated,
}

/// Default cap on undrained events
pub const DEFAULT_MAX_PENDING_EVENTS: usize = 1024;

/// Configuration for a queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Initial repeat mode (default: Off)
    pub repeat: RepeatMode,

    /// Policy for collections emptied by child removal (default: Remove)
    pub empty_collections: EmptyCollectionPolicy,

    /// Undrained events kept before the oldest are dropped (default: 1024)
    ///
    /// 0 disables event recording.
    pub max_pending_events: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            repeat: RepeatMode::Off,
            empty_collections: EmptyCollectionPolicy::Remove,
            max_pending_events: DEFAULT_MAX_PENDING_EVENTS,
        }
    }
}
