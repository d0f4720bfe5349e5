//! Lazy flattening of the queue into leaves
//!
//! Traversal is a step function over `(top-level index, effective child
//! index)` positions. Nothing is materialized: each step only looks at the
//! current entry and, when it is exhausted, scans forward to the next entry
//! that has a leaf.

use crate::item::{QueueItem, Single};
use std::iter::FusedIterator;

/// Position of a leaf in the flattened order
///
/// `child` is an effective (shuffle-aware) index and is `None` for a
/// top-level Single.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LeafPosition {
    pub top: usize,
    pub child: Option<usize>,
}

impl LeafPosition {
    fn single(top: usize) -> Self {
        Self { top, child: None }
    }

    fn child(top: usize, child: usize) -> Self {
        Self {
            top,
            child: Some(child),
        }
    }
}

/// First leaf at or after top-level index `top`
pub(crate) fn first_leaf_from<M>(items: &[QueueItem<M>], top: usize) -> Option<LeafPosition> {
    items
        .iter()
        .enumerate()
        .skip(top)
        .find_map(|(index, item)| match item {
            QueueItem::Single(_) => Some(LeafPosition::single(index)),
            QueueItem::Collection(collection) if !collection.is_empty() => {
                Some(LeafPosition::child(index, 0))
            }
            QueueItem::Collection(_) => None,
        })
}

/// Last leaf strictly before top-level index `end`
pub(crate) fn last_leaf_before<M>(items: &[QueueItem<M>], end: usize) -> Option<LeafPosition> {
    let end = end.min(items.len());
    items[..end]
        .iter()
        .enumerate()
        .rev()
        .find_map(|(index, item)| match item {
            QueueItem::Single(_) => Some(LeafPosition::single(index)),
            QueueItem::Collection(collection) if !collection.is_empty() => {
                Some(LeafPosition::child(index, collection.len() - 1))
            }
            QueueItem::Collection(_) => None,
        })
}

pub(crate) fn leaf_after<M>(items: &[QueueItem<M>], position: LeafPosition) -> Option<LeafPosition> {
    if let (Some(child), Some(QueueItem::Collection(collection))) =
        (position.child, items.get(position.top))
    {
        if child + 1 < collection.len() {
            return Some(LeafPosition::child(position.top, child + 1));
        }
    }
    first_leaf_from(items, position.top + 1)
}

pub(crate) fn leaf_before<M>(
    items: &[QueueItem<M>],
    position: LeafPosition,
) -> Option<LeafPosition> {
    match position.child {
        Some(child) if child > 0 => Some(LeafPosition::child(position.top, child - 1)),
        _ => last_leaf_before(items, position.top),
    }
}

/// Next position within the same collection, wrapping to its first child
pub(crate) fn wrap_after<M>(items: &[QueueItem<M>], position: LeafPosition) -> Option<LeafPosition> {
    let child = position.child?;
    let collection = items.get(position.top)?.as_collection()?;
    let next = if child + 1 < collection.len() { child + 1 } else { 0 };
    Some(LeafPosition::child(position.top, next))
}

/// Previous position within the same collection, wrapping to its last child
pub(crate) fn wrap_before<M>(
    items: &[QueueItem<M>],
    position: LeafPosition,
) -> Option<LeafPosition> {
    let child = position.child?;
    let collection = items.get(position.top)?.as_collection()?;
    let previous = if child > 0 {
        child - 1
    } else {
        collection.len().checked_sub(1)?
    };
    Some(LeafPosition::child(position.top, previous))
}

pub(crate) fn leaf_at<M>(items: &[QueueItem<M>], position: LeafPosition) -> Option<&Single<M>> {
    match (items.get(position.top)?, position.child) {
        (QueueItem::Single(single), None) => Some(single),
        (QueueItem::Collection(collection), Some(child)) => collection.child_at(child),
        _ => None,
    }
}

/// Iterator over the queue's leaves in flattened order
///
/// Created by [`Queue::traversal`](crate::Queue::traversal) (from the start)
/// or [`Queue::upcoming`](crate::Queue::upcoming) (after the current leaf).
/// Collections are expanded in their effective order.
pub struct Traversal<'a, M> {
    items: &'a [QueueItem<M>],
    next: Option<LeafPosition>,
}

impl<'a, M> Traversal<'a, M> {
    pub(crate) fn new(items: &'a [QueueItem<M>]) -> Self {
        Self::starting_at(items, first_leaf_from(items, 0))
    }

    pub(crate) fn starting_at(items: &'a [QueueItem<M>], next: Option<LeafPosition>) -> Self {
        Self { items, next }
    }
}

impl<M> Clone for Traversal<'_, M> {
    fn clone(&self) -> Self {
        Self {
            items: self.items,
            next: self.next,
        }
    }
}

impl<'a, M> Iterator for Traversal<'a, M> {
    type Item = &'a Single<M>;

    fn next(&mut self) -> Option<Self::Item> {
        let position = self.next?;
        self.next = leaf_after(self.items, position);
        leaf_at(self.items, position)
    }
}

impl<M> FusedIterator for Traversal<'_, M> {}
