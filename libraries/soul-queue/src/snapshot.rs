//! Read-only projection of a queue for display
//!
//! A snapshot is an owned copy: once built it never changes, so it can be
//! handed to a UI thread while the queue keeps mutating.

use crate::item::{QueueItem, Single};
use crate::queue::Queue;
use crate::types::{ItemId, RepeatMode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A leaf as shown to the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotLeaf<M> {
    pub id: ItemId,
    pub metadata: M,
}

impl<M: Clone> From<&Single<M>> for SnapshotLeaf<M> {
    fn from(single: &Single<M>) -> Self {
        Self {
            id: single.id().clone(),
            metadata: single.metadata().clone(),
        }
    }
}

/// A top-level entry as shown to the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SnapshotEntry<M> {
    Single {
        id: ItemId,
        metadata: M,
    },
    Collection {
        id: ItemId,
        metadata: M,
        shuffled: bool,
        /// Children in effective (shuffle-aware) order
        children: Vec<SnapshotLeaf<M>>,
    },
}

impl<M> SnapshotEntry<M> {
    pub fn id(&self) -> &ItemId {
        match self {
            SnapshotEntry::Single { id, .. } | SnapshotEntry::Collection { id, .. } => id,
        }
    }
}

/// Immutable view of a queue
///
/// Entries sit behind an `Arc`, so snapshots taken between structural
/// changes share them and differ only in the cursor fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueSnapshot<M> {
    /// Top-level entries in order
    pub entries: Arc<Vec<SnapshotEntry<M>>>,

    /// ID of the current leaf
    pub current: Option<ItemId>,

    /// Number of leaves across the queue
    pub leaf_count: usize,

    /// Repeat mode at snapshot time
    pub repeat: RepeatMode,
}

impl<M> Default for QueueSnapshot<M> {
    fn default() -> Self {
        Self {
            entries: Arc::new(Vec::new()),
            current: None,
            leaf_count: 0,
            repeat: RepeatMode::Off,
        }
    }
}

impl<M> QueueSnapshot<M> {
    pub fn is_empty(&self) -> bool {
        self.leaf_count == 0
    }

    /// Leaves in flattened order, as `(id, metadata)` pairs
    pub fn leaves(&self) -> impl Iterator<Item = (&ItemId, &M)> + '_ {
        self.entries.iter().flat_map(|entry| {
            let leaves: Box<dyn Iterator<Item = (&ItemId, &M)> + '_> = match entry {
                SnapshotEntry::Single { id, metadata } => Box::new(std::iter::once((id, metadata))),
                SnapshotEntry::Collection { children, .. } => {
                    Box::new(children.iter().map(|leaf| (&leaf.id, &leaf.metadata)))
                }
            };
            leaves
        })
    }

    /// The current leaf, if any
    pub fn current_leaf(&self) -> Option<(&ItemId, &M)> {
        let current = self.current.as_ref()?;
        self.leaves().find(|(id, _)| *id == current)
    }

    /// Same entries, cursor fields refreshed from `queue`
    ///
    /// Only valid while `queue` has had no structural change since these
    /// entries were built.
    pub(crate) fn with_position(&self, queue: &Queue<M>) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            current: queue.current().map(|leaf| leaf.id().clone()),
            leaf_count: queue.leaf_count(),
            repeat: queue.repeat(),
        }
    }
}

impl<M: Clone> From<&Queue<M>> for QueueSnapshot<M> {
    fn from(queue: &Queue<M>) -> Self {
        let entries = queue
            .items()
            .iter()
            .map(|item| match item {
                QueueItem::Single(single) => SnapshotEntry::Single {
                    id: single.id().clone(),
                    metadata: single.metadata().clone(),
                },
                QueueItem::Collection(collection) => SnapshotEntry::Collection {
                    id: collection.id().clone(),
                    metadata: collection.metadata().clone(),
                    shuffled: collection.is_shuffled(),
                    children: collection
                        .effective_children()
                        .map(SnapshotLeaf::from)
                        .collect(),
                },
            })
            .collect();

        Self {
            entries: Arc::new(entries),
            current: queue.current().map(|leaf| leaf.id().clone()),
            leaf_count: queue.leaf_count(),
            repeat: queue.repeat(),
        }
    }
}
