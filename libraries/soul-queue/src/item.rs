//! Queue items
//!
//! An item is either a `Single` (a leaf) or a `Collection` of Singles.
//! Collections cannot contain Collections: children are stored as
//! `Single<M>`, so nesting is ruled out by the types.

use crate::error::{QueueError, Result};
use crate::shuffle::ShuffleState;
use crate::types::ItemId;
use rand::{thread_rng, Rng};
use std::collections::HashSet;

/// A leaf playable item, e.g. a track or an episode
///
/// `metadata` is caller-supplied and never interpreted by the queue.
#[derive(Debug, Clone, PartialEq)]
pub struct Single<M> {
    id: ItemId,
    metadata: M,
}

impl<M> Single<M> {
    pub fn new(id: impl Into<ItemId>, metadata: M) -> Self {
        Self {
            id: id.into(),
            metadata,
        }
    }

    pub fn id(&self) -> &ItemId {
        &self.id
    }

    pub fn metadata(&self) -> &M {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut M {
        &mut self.metadata
    }

    pub fn into_metadata(self) -> M {
        self.metadata
    }
}

/// Ordered container of Singles with its own shuffle state (e.g. an album)
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<M> {
    id: ItemId,
    metadata: M,

    /// Original order; shuffling never reorders this
    children: Vec<Single<M>>,

    shuffle: ShuffleState,
}

impl<M> Collection<M> {
    /// Create an empty, unshuffled collection
    pub fn new(id: impl Into<ItemId>, metadata: M) -> Self {
        Self {
            id: id.into(),
            metadata,
            children: Vec::new(),
            shuffle: ShuffleState::new(),
        }
    }

    /// Create a collection from children in their original order
    ///
    /// Fails with `DuplicateId` if two children share an id or a child
    /// reuses the collection's own id.
    pub fn with_children(
        id: impl Into<ItemId>,
        metadata: M,
        children: Vec<Single<M>>,
    ) -> Result<Self> {
        let id = id.into();
        let mut seen = HashSet::with_capacity(children.len() + 1);
        seen.insert(id.clone());
        for child in &children {
            if !seen.insert(child.id.clone()) {
                return Err(QueueError::DuplicateId(child.id.clone()));
            }
        }

        Ok(Self {
            id,
            metadata,
            children,
            shuffle: ShuffleState::new(),
        })
    }

    pub fn id(&self) -> &ItemId {
        &self.id
    }

    pub fn metadata(&self) -> &M {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut M {
        &mut self.metadata
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Children in original (stored) order
    pub fn children(&self) -> &[Single<M>] {
        &self.children
    }

    /// Children in effective order (shuffle-aware)
    pub fn effective_children(&self) -> impl Iterator<Item = &Single<M>> + '_ {
        (0..self.children.len()).filter_map(move |position| self.child_at(position))
    }

    /// Child at effective `position`
    pub fn child_at(&self, position: usize) -> Option<&Single<M>> {
        let storage = self.shuffle.storage_index(position, self.children.len())?;
        self.children.get(storage)
    }

    /// Child with the given id
    pub fn child(&self, id: &str) -> Option<&Single<M>> {
        self.children.iter().find(|child| child.id.as_str() == id)
    }

    /// Effective position of the child with the given id
    pub fn position_of(&self, id: &str) -> Option<usize> {
        let storage = self.storage_index_of(id)?;
        self.shuffle.position_of(storage)
    }

    fn storage_index_of(&self, id: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|child| child.id.as_str() == id)
    }

    pub fn shuffle_state(&self) -> &ShuffleState {
        &self.shuffle
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffle.is_shuffled()
    }

    /// Shuffle iteration order using the thread-local RNG
    pub fn shuffle(&mut self) {
        self.shuffle_with(&mut thread_rng());
    }

    /// Shuffle iteration order using the given RNG
    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.shuffle.shuffle_with(self.children.len(), rng);
    }

    /// Revert iteration to original order
    pub fn unshuffle(&mut self) {
        self.shuffle.unshuffle();
    }

    /// Toggle shuffle, returning the new state
    pub fn toggle_shuffle(&mut self) -> bool {
        self.shuffle.toggle(self.children.len())
    }

    /// Insert a child into original order at `position` (default: end)
    ///
    /// While shuffled, the new child is appended to the end of the
    /// permutation. Only checks ids within this collection.
    pub fn add_child(&mut self, child: Single<M>, position: Option<usize>) -> Result<()> {
        let len = self.children.len();
        let position = position.unwrap_or(len);
        if position > len {
            return Err(QueueError::InvalidPosition { position, len });
        }
        if child.id == self.id || self.storage_index_of(child.id.as_str()).is_some() {
            return Err(QueueError::DuplicateId(child.id));
        }

        self.children.insert(position, child);
        self.shuffle.on_insert(position);
        Ok(())
    }

    /// Remove a child from both original order and the permutation
    pub fn remove_child(&mut self, id: &str) -> Result<Single<M>> {
        let storage = self
            .storage_index_of(id)
            .ok_or_else(|| QueueError::not_found(id))?;

        let child = self.children.remove(storage);
        self.shuffle.on_remove(storage);
        Ok(child)
    }

    /// Move a child to `new_position` in original order
    ///
    /// `new_position` is the child's final index and must be `< len`.
    /// Shuffled iteration order is unaffected.
    pub fn move_child(&mut self, id: &str, new_position: usize) -> Result<()> {
        let from = self
            .storage_index_of(id)
            .ok_or_else(|| QueueError::not_found(id))?;
        let len = self.children.len();
        if new_position >= len {
            return Err(QueueError::InvalidPosition {
                position: new_position,
                len,
            });
        }

        if from != new_position {
            let child = self.children.remove(from);
            self.children.insert(new_position, child);
            self.shuffle.on_move(from, new_position);
        }
        Ok(())
    }
}

/// A top-level queue entry
#[derive(Debug, Clone, PartialEq)]
pub enum QueueItem<M> {
    /// A single leaf, like a track or episode
    Single(Single<M>),

    /// A collection of leaves, like an album or playlist
    Collection(Collection<M>),
}

impl<M> QueueItem<M> {
    pub fn id(&self) -> &ItemId {
        match self {
            QueueItem::Single(single) => single.id(),
            QueueItem::Collection(collection) => collection.id(),
        }
    }

    pub fn metadata(&self) -> &M {
        match self {
            QueueItem::Single(single) => single.metadata(),
            QueueItem::Collection(collection) => collection.metadata(),
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, QueueItem::Collection(_))
    }

    pub fn as_single(&self) -> Option<&Single<M>> {
        match self {
            QueueItem::Single(single) => Some(single),
            QueueItem::Collection(_) => None,
        }
    }

    pub fn as_collection(&self) -> Option<&Collection<M>> {
        match self {
            QueueItem::Collection(collection) => Some(collection),
            QueueItem::Single(_) => None,
        }
    }

    pub fn as_collection_mut(&mut self) -> Option<&mut Collection<M>> {
        match self {
            QueueItem::Collection(collection) => Some(collection),
            QueueItem::Single(_) => None,
        }
    }

    /// Number of leaves this entry contributes to traversal
    pub fn leaf_count(&self) -> usize {
        match self {
            QueueItem::Single(_) => 1,
            QueueItem::Collection(collection) => collection.len(),
        }
    }

    /// Own id followed by every child id
    pub(crate) fn ids(&self) -> impl Iterator<Item = &ItemId> + '_ {
        let children: &[Single<M>] = match self {
            QueueItem::Single(_) => &[],
            QueueItem::Collection(collection) => collection.children(),
        };
        std::iter::once(self.id()).chain(children.iter().map(Single::id))
    }
}

impl<M> From<Single<M>> for QueueItem<M> {
    fn from(single: Single<M>) -> Self {
        QueueItem::Single(single)
    }
}

impl<M> From<Collection<M>> for QueueItem<M> {
    fn from(collection: Collection<M>) -> Self {
        QueueItem::Collection(collection)
    }
}
