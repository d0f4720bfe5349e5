//! Item provider trait
//!
//! The queue never fetches metadata itself. An external provider (library
//! database, streaming client, ...) describes items by id and the queue turns
//! those descriptions into Singles and Collections.

use crate::error::{QueueError, Result};
use crate::item::{Collection, QueueItem, Single};
use crate::types::ItemId;
use std::collections::HashMap;

/// Description of an item supplied by a provider
#[derive(Debug, Clone, PartialEq)]
pub struct ProvidedItem<M> {
    /// Stable unique identifier
    pub id: ItemId,

    /// Display metadata, stored verbatim
    pub metadata: M,

    /// Whether this item is a collection (album, playlist, ...)
    pub is_collection: bool,

    /// Child ids in original order (collections only)
    pub children: Vec<ItemId>,
}

impl<M> ProvidedItem<M> {
    /// Describe a single leaf
    pub fn single(id: impl Into<ItemId>, metadata: M) -> Self {
        Self {
            id: id.into(),
            metadata,
            is_collection: false,
            children: Vec::new(),
        }
    }

    /// Describe a collection with the given child ids
    pub fn collection(id: impl Into<ItemId>, metadata: M, children: Vec<ItemId>) -> Self {
        Self {
            id: id.into(),
            metadata,
            is_collection: true,
            children,
        }
    }
}

/// Source of item descriptions
///
/// Implementors look items up by id. Returning `None` means the item is
/// unknown to the provider.
pub trait ItemProvider {
    /// Metadata payload stored on queue items
    type Metadata;

    /// Describe the item with the given id
    fn provide(&self, id: &str) -> Option<ProvidedItem<Self::Metadata>>;
}

impl<M: Clone> ItemProvider for HashMap<ItemId, ProvidedItem<M>> {
    type Metadata = M;

    fn provide(&self, id: &str) -> Option<ProvidedItem<M>> {
        self.get(id).cloned()
    }
}

impl<M> QueueItem<M> {
    /// Build an item from a provider description
    ///
    /// Collection children are resolved through the same provider. Fails with
    /// `NotFound` for unknown ids and `UnsupportedOperation` when a child is
    /// itself a collection.
    pub fn from_provider<P>(provider: &P, id: &str) -> Result<Self>
    where
        P: ItemProvider<Metadata = M> + ?Sized,
    {
        let provided = provider
            .provide(id)
            .ok_or_else(|| QueueError::not_found(id))?;

        if !provided.is_collection {
            if !provided.children.is_empty() {
                tracing::warn!(
                    "Provider returned children for single item {}, ignoring them",
                    provided.id
                );
            }
            return Ok(QueueItem::Single(Single::new(provided.id, provided.metadata)));
        }

        let mut children = Vec::with_capacity(provided.children.len());
        for child_id in &provided.children {
            let child = provider
                .provide(child_id.as_str())
                .ok_or_else(|| QueueError::NotFound(child_id.clone()))?;
            if child.is_collection {
                return Err(QueueError::unsupported(child_id.as_str(), "nest_collection"));
            }
            children.push(Single::new(child.id, child.metadata));
        }

        Collection::with_children(provided.id, provided.metadata, children).map(QueueItem::Collection)
    }
}
