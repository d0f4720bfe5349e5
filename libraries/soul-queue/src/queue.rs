//! Playback-order queue
//!
//! Holds top-level entries (Singles and Collections) and a cursor that tracks
//! the current leaf by id, never by index:
//!
//! ```text
//! Top level:   [ A ]  [ Album C ───────── ]  [ E ]
//!                       stored:    B, D
//!                       effective: D, B   (shuffled)
//! Traversal:     A        D      B            E
//!                         ^ current = "D"
//! ```
//!
//! Ids map to a slot (top-level, or child of a named parent), so inserts and
//! moves elsewhere never invalidate the cursor. Top-level indices are cached
//! and rebuilt lazily after a top-level structural change; positions inside a
//! collection are always looked up locally.

use crate::error::{QueueError, Result};
use crate::events::QueueEvent;
use crate::item::{Collection, QueueItem, Single};
use crate::provider::ItemProvider;
use crate::snapshot::QueueSnapshot;
use crate::traversal::{
    first_leaf_from, last_leaf_before, leaf_after, leaf_at, leaf_before, wrap_after,
    wrap_before, LeafPosition, Traversal,
};
use crate::types::{EmptyCollectionPolicy, ItemId, QueueConfig, QueueState, RepeatMode};
use rand::{thread_rng, Rng};
use std::cell::OnceCell;
use std::collections::{HashMap, VecDeque};
use tracing::{debug, trace, warn};

/// Where the current-leaf pointer stands
#[derive(Debug, Clone, PartialEq, Eq)]
enum Cursor {
    /// Nothing started yet, or retreated past the first leaf
    BeforeStart,

    /// A leaf is current
    At(ItemId),

    /// Advanced past the last leaf
    AfterEnd,
}

/// Where an id lives
#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    Top,
    Child(ItemId),
}

/// Ordered queue of Singles and Collections with a current-leaf pointer
#[derive(Debug, Clone)]
pub struct Queue<M> {
    items: Vec<QueueItem<M>>,

    /// Every id in the queue, top-level and child
    slots: HashMap<ItemId, Slot>,

    /// Top-level id -> index, rebuilt on demand after top-level changes
    top_positions: OnceCell<HashMap<ItemId, usize>>,

    cursor: Cursor,

    config: QueueConfig,

    /// Running number of leaves across all entries
    leaf_total: usize,

    /// Bumped on every structural change (not on cursor moves)
    revision: u64,

    /// Events waiting to be drained, oldest first
    pending_events: VecDeque<QueueEvent>,

    /// Set once events have been dropped since the last drain
    events_overflowed: bool,
}

impl<M> Queue<M> {
    /// Create an empty queue with default configuration
    pub fn new() -> Self {
        Self::with_config(QueueConfig::default())
    }

    pub fn with_config(config: QueueConfig) -> Self {
        Self {
            items: Vec::new(),
            slots: HashMap::new(),
            top_positions: OnceCell::new(),
            cursor: Cursor::BeforeStart,
            config,
            leaf_total: 0,
            revision: 0,
            pending_events: VecDeque::new(),
            events_overflowed: false,
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn repeat(&self) -> RepeatMode {
        self.config.repeat
    }

    pub fn set_repeat(&mut self, mode: RepeatMode) {
        if self.config.repeat != mode {
            self.config.repeat = mode;
            self.push_event(QueueEvent::RepeatChanged { mode });
        }
    }

    pub fn set_empty_collection_policy(&mut self, policy: EmptyCollectionPolicy) {
        self.config.empty_collections = policy;
    }

    // ===== Mutation =====

    /// Insert a Single or Collection at `position` (default: end)
    ///
    /// Fails with `DuplicateId` if the item's id, or any child id, already
    /// exists anywhere in the queue.
    pub fn add(&mut self, item: impl Into<QueueItem<M>>, position: Option<usize>) -> Result<()> {
        let item = item.into();
        let len = self.items.len();
        let position = position.unwrap_or(len);
        if position > len {
            return Err(QueueError::InvalidPosition { position, len });
        }
        if let Some(duplicate) = item.ids().find(|id| self.slots.contains_key(*id)) {
            return Err(QueueError::DuplicateId(duplicate.clone()));
        }

        let parent = item.id().clone();
        self.slots.insert(parent.clone(), Slot::Top);
        if let QueueItem::Collection(collection) = &item {
            for child in collection.children() {
                self.slots
                    .insert(child.id().clone(), Slot::Child(parent.clone()));
            }
        }

        debug!(
            "Added {} '{}' at position {} ({} leaves)",
            if item.is_collection() { "collection" } else { "single" },
            parent,
            position,
            item.leaf_count()
        );
        self.leaf_total += item.leaf_count();
        self.items.insert(position, item);
        self.invalidate_positions();
        self.emit_queue_changed();
        Ok(())
    }

    /// Resolve an item through a provider and add it
    pub fn add_from_provider<P>(
        &mut self,
        provider: &P,
        id: &str,
        position: Option<usize>,
    ) -> Result<()>
    where
        P: ItemProvider<Metadata = M> + ?Sized,
    {
        let item = QueueItem::from_provider(provider, id)?;
        self.add(item, position)
    }

    /// Add a Single to a Collection at `position` (default: end of original order)
    ///
    /// While the collection is shuffled the new child plays after the
    /// already-shuffled children.
    pub fn add_child(
        &mut self,
        collection_id: &str,
        child: Single<M>,
        position: Option<usize>,
    ) -> Result<()> {
        if self.slots.contains_key(child.id().as_str()) {
            return Err(QueueError::DuplicateId(child.id().clone()));
        }
        let child_id = child.id().clone();
        let collection = self.collection_mut(collection_id, "add_child")?;
        collection.add_child(child, position)?;
        let parent = collection.id().clone();

        debug!("Added '{}' to collection '{}'", child_id, parent);
        self.slots.insert(child_id, Slot::Child(parent));
        self.leaf_total += 1;
        self.emit_queue_changed();
        Ok(())
    }

    /// Remove a top-level item or a collection child
    ///
    /// If the current leaf is removed (directly or with its collection), the
    /// pointer moves to the next leaf after the removed segment, or becomes
    /// empty if there is none.
    pub fn remove(&mut self, id: &str) -> Result<QueueItem<M>> {
        match self.slots.get(id).cloned() {
            None => Err(QueueError::not_found(id)),
            Some(Slot::Top) => self.remove_top(id),
            Some(Slot::Child(parent)) => self
                .remove_from_collection(parent.as_str(), id)
                .map(QueueItem::Single),
        }
    }

    /// Remove a child from its collection
    ///
    /// Top-level ids are not children and fail with `NotFound`; use
    /// [`remove`](Self::remove) for those.
    pub fn remove_child(&mut self, id: &str) -> Result<Single<M>> {
        match self.slots.get(id).cloned() {
            None | Some(Slot::Top) => Err(QueueError::not_found(id)),
            Some(Slot::Child(parent)) => self.remove_from_collection(parent.as_str(), id),
        }
    }

    fn remove_top(&mut self, id: &str) -> Result<QueueItem<M>> {
        let top = self
            .top_position(id)
            .ok_or_else(|| QueueError::not_found(id))?;

        let current_removed = match self.current_id() {
            Some(current) => self.items[top].ids().any(|item_id| item_id == current),
            None => false,
        };
        let successor = if current_removed {
            self.leaf_id_at(first_leaf_from(&self.items, top + 1))
        } else {
            None
        };

        let item = self.items.remove(top);
        for item_id in item.ids() {
            self.slots.remove(item_id);
        }
        self.leaf_total -= item.leaf_count();
        self.invalidate_positions();
        debug!("Removed '{}' ({} leaves)", id, item.leaf_count());

        self.settle_cursor_after_removal(current_removed, successor);
        self.emit_queue_changed();
        Ok(item)
    }

    fn remove_from_collection(&mut self, parent: &str, id: &str) -> Result<Single<M>> {
        let top = self
            .top_position(parent)
            .ok_or_else(|| QueueError::not_found(parent))?;

        let current_removed = self.current_id().is_some_and(|current| current.as_str() == id);
        let successor = if current_removed {
            let position = self.locate(id);
            self.leaf_id_at(position.and_then(|position| leaf_after(&self.items, position)))
        } else {
            None
        };

        let collection = self.items[top]
            .as_collection_mut()
            .ok_or_else(|| QueueError::not_found(parent))?;
        let child = collection.remove_child(id)?;
        let now_empty = collection.is_empty();
        self.slots.remove(id);
        self.leaf_total -= 1;
        debug!("Removed '{}' from collection '{}'", id, parent);

        if now_empty && self.config.empty_collections == EmptyCollectionPolicy::Remove {
            self.items.remove(top);
            self.slots.remove(parent);
            self.invalidate_positions();
            debug!("Dropped emptied collection '{}'", parent);
        }

        self.settle_cursor_after_removal(current_removed, successor);
        self.emit_queue_changed();
        Ok(child)
    }

    /// Reposition the cursor once a removal has been applied
    ///
    /// A queue left without leaves always returns to the start, even if the
    /// cursor had already run past the end.
    fn settle_cursor_after_removal(&mut self, current_removed: bool, successor: Option<ItemId>) {
        let cursor = if !self.has_leaves() {
            Cursor::BeforeStart
        } else if current_removed {
            match successor {
                Some(id) => Cursor::At(id),
                None => Cursor::AfterEnd,
            }
        } else {
            return;
        };
        self.set_cursor(cursor);
    }

    /// Move an item so that it ends up at index `new_position`
    ///
    /// Top-level items move within the top level; collection children move
    /// within their collection's original order. The current leaf is tracked
    /// by id and is unaffected.
    pub fn move_item(&mut self, id: &str, new_position: usize) -> Result<()> {
        match self.slots.get(id).cloned() {
            None => Err(QueueError::not_found(id)),
            Some(Slot::Top) => {
                let len = self.items.len();
                if new_position >= len {
                    return Err(QueueError::InvalidPosition {
                        position: new_position,
                        len,
                    });
                }
                let from = self
                    .top_position(id)
                    .ok_or_else(|| QueueError::not_found(id))?;
                if from != new_position {
                    let item = self.items.remove(from);
                    self.items.insert(new_position, item);
                    self.invalidate_positions();
                }
                debug!("Moved '{}' from {} to {}", id, from, new_position);
                self.emit_queue_changed();
                Ok(())
            }
            Some(Slot::Child(parent)) => {
                let collection = self.collection_mut(parent.as_str(), "move_item")?;
                collection.move_child(id, new_position)?;
                debug!("Moved '{}' to {} within '{}'", id, new_position, parent);
                self.emit_queue_changed();
                Ok(())
            }
        }
    }

    /// Remove everything and reset the pointer
    pub fn clear(&mut self) {
        self.items.clear();
        self.slots.clear();
        self.leaf_total = 0;
        self.invalidate_positions();
        self.set_cursor(Cursor::BeforeStart);
        debug!("Cleared queue");
        self.emit_queue_changed();
    }

    // ===== Shuffle =====

    /// Shuffle a collection's iteration order
    ///
    /// Fails with `UnsupportedOperation` for Singles, leaving the queue
    /// unchanged.
    pub fn shuffle(&mut self, id: &str) -> Result<()> {
        self.shuffle_with(id, &mut thread_rng())
    }

    /// Shuffle a collection with the given RNG
    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, id: &str, rng: &mut R) -> Result<()> {
        let collection = self.collection_mut(id, "shuffle")?;
        collection.shuffle_with(rng);
        debug!("Shuffled collection '{}' ({} children)", id, collection.len());
        self.emit_shuffle_changed(id, true);
        Ok(())
    }

    /// Restore a collection's original order
    pub fn unshuffle(&mut self, id: &str) -> Result<()> {
        let collection = self.collection_mut(id, "unshuffle")?;
        collection.unshuffle();
        debug!("Unshuffled collection '{}'", id);
        self.emit_shuffle_changed(id, false);
        Ok(())
    }

    /// Toggle a collection's shuffle, returning the new state
    pub fn toggle_shuffle(&mut self, id: &str) -> Result<bool> {
        let shuffled = self.collection_mut(id, "toggle_shuffle")?.toggle_shuffle();
        debug!("Toggled shuffle on '{}': {}", id, shuffled);
        self.emit_shuffle_changed(id, shuffled);
        Ok(shuffled)
    }

    pub fn is_shuffled(&self, id: &str) -> Result<bool> {
        match self.get(id) {
            Some(QueueItem::Collection(collection)) => Ok(collection.is_shuffled()),
            Some(QueueItem::Single(_)) => Err(QueueError::unsupported(id, "is_shuffled")),
            None if self.slots.contains_key(id) => {
                Err(QueueError::unsupported(id, "is_shuffled"))
            }
            None => Err(QueueError::not_found(id)),
        }
    }

    fn collection_mut(&mut self, id: &str, operation: &'static str) -> Result<&mut Collection<M>> {
        match self.slots.get(id) {
            None => return Err(QueueError::not_found(id)),
            Some(Slot::Child(_)) => return Err(QueueError::unsupported(id, operation)),
            Some(Slot::Top) => {}
        }
        let top = self
            .top_position(id)
            .ok_or_else(|| QueueError::not_found(id))?;
        self.items[top]
            .as_collection_mut()
            .ok_or_else(|| QueueError::unsupported(id, operation))
    }

    // ===== Navigation =====

    /// The current leaf, if any
    pub fn current(&self) -> Option<&Single<M>> {
        match &self.cursor {
            Cursor::At(id) => self.leaf(id.as_str()),
            Cursor::BeforeStart | Cursor::AfterEnd => None,
        }
    }

    fn current_id(&self) -> Option<&ItemId> {
        match &self.cursor {
            Cursor::At(id) => Some(id),
            Cursor::BeforeStart | Cursor::AfterEnd => None,
        }
    }

    /// Advance one leaf
    ///
    /// Returns `None` at the end of the queue (unless repeat wraps). That is
    /// an expected result, not an error.
    pub fn next(&mut self) -> Option<&Single<M>> {
        let cursor = self.step_forward();
        self.set_cursor(cursor);
        self.current()
    }

    /// Retreat one leaf
    ///
    /// Returns `None` at the start of the queue (unless repeat wraps).
    pub fn previous(&mut self) -> Option<&Single<M>> {
        let cursor = self.step_backward();
        self.set_cursor(cursor);
        self.current()
    }

    /// Make a leaf current immediately, without reordering anything
    ///
    /// A collection id starts its first leaf in effective order. An empty
    /// collection has no leaf to play and fails with `NotFound`.
    pub fn play_now(&mut self, id: &str) -> Result<&Single<M>> {
        let target = match self.slots.get(id) {
            None => return Err(QueueError::not_found(id)),
            Some(Slot::Child(_)) => ItemId::from(id),
            Some(Slot::Top) => match self.get(id) {
                Some(QueueItem::Single(single)) => single.id().clone(),
                Some(QueueItem::Collection(collection)) => collection
                    .child_at(0)
                    .map(|child| child.id().clone())
                    .ok_or_else(|| QueueError::not_found(id))?,
                None => return Err(QueueError::not_found(id)),
            },
        };

        debug!("Playing '{}' now", target);
        self.set_cursor(Cursor::At(target));
        self.current().ok_or_else(|| QueueError::not_found(id))
    }

    /// Whether `next` would land on a leaf
    pub fn has_next(&self) -> bool {
        matches!(self.step_forward(), Cursor::At(_))
    }

    /// Whether `previous` would land on a leaf
    pub fn has_previous(&self) -> bool {
        matches!(self.step_backward(), Cursor::At(_))
    }

    /// The leaf `next` would move to, without moving
    pub fn peek_next(&self) -> Option<&Single<M>> {
        match self.step_forward() {
            Cursor::At(id) => self.leaf(id.as_str()),
            Cursor::BeforeStart | Cursor::AfterEnd => None,
        }
    }

    fn step_forward(&self) -> Cursor {
        let items = self.items.as_slice();
        let position = match &self.cursor {
            Cursor::BeforeStart => first_leaf_from(items, 0),
            Cursor::AfterEnd => match self.config.repeat {
                RepeatMode::All => first_leaf_from(items, 0),
                _ => None,
            },
            Cursor::At(id) => match self.locate(id.as_str()) {
                Some(current) => match self.config.repeat {
                    RepeatMode::Off => leaf_after(items, current),
                    RepeatMode::One => Some(current),
                    RepeatMode::Collection => {
                        wrap_after(items, current).or_else(|| leaf_after(items, current))
                    }
                    RepeatMode::All => {
                        leaf_after(items, current).or_else(|| first_leaf_from(items, 0))
                    }
                },
                None => {
                    warn!("Current leaf '{}' is missing from the queue", id);
                    None
                }
            },
        };

        match position {
            Some(position) => self.cursor_at(position),
            None if self.has_leaves() => Cursor::AfterEnd,
            None => Cursor::BeforeStart,
        }
    }

    fn step_backward(&self) -> Cursor {
        let items = self.items.as_slice();
        let position = match &self.cursor {
            Cursor::BeforeStart => match self.config.repeat {
                RepeatMode::All => last_leaf_before(items, items.len()),
                _ => None,
            },
            Cursor::AfterEnd => last_leaf_before(items, items.len()),
            Cursor::At(id) => match self.locate(id.as_str()) {
                Some(current) => match self.config.repeat {
                    RepeatMode::Off => leaf_before(items, current),
                    RepeatMode::One => Some(current),
                    RepeatMode::Collection => {
                        wrap_before(items, current).or_else(|| leaf_before(items, current))
                    }
                    RepeatMode::All => leaf_before(items, current)
                        .or_else(|| last_leaf_before(items, items.len())),
                },
                None => {
                    warn!("Current leaf '{}' is missing from the queue", id);
                    None
                }
            },
        };

        match position {
            Some(position) => self.cursor_at(position),
            None => Cursor::BeforeStart,
        }
    }

    fn cursor_at(&self, position: LeafPosition) -> Cursor {
        match leaf_at(&self.items, position) {
            Some(leaf) => Cursor::At(leaf.id().clone()),
            None => Cursor::AfterEnd,
        }
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        let previous = self.current_id().cloned();
        self.cursor = cursor;
        let current = self.current_id().cloned();

        if previous != current {
            trace!("Current leaf: {:?} -> {:?}", previous, current);
            self.push_event(QueueEvent::CurrentChanged { current, previous });
        }
    }

    // ===== Lookup =====

    /// Top-level entries in order
    pub fn items(&self) -> &[QueueItem<M>] {
        &self.items
    }

    /// Top-level entry with the given id
    pub fn get(&self, id: &str) -> Option<&QueueItem<M>> {
        self.top_position(id).and_then(|top| self.items.get(top))
    }

    /// Leaf (top-level Single or collection child) with the given id
    pub fn leaf(&self, id: &str) -> Option<&Single<M>> {
        match self.slots.get(id)? {
            Slot::Top => self.get(id)?.as_single(),
            Slot::Child(parent) => self.get(parent.as_str())?.as_collection()?.child(id),
        }
    }

    /// Collection with the given id
    pub fn collection(&self, id: &str) -> Option<&Collection<M>> {
        self.get(id)?.as_collection()
    }

    /// Whether the id exists anywhere in the queue
    pub fn contains(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    /// Number of top-level entries
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether there are no top-level entries
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of leaves across the queue
    pub fn leaf_count(&self) -> usize {
        self.leaf_total
    }

    fn has_leaves(&self) -> bool {
        self.leaf_total > 0
    }

    /// Structural revision, unchanged by navigation
    pub(crate) fn revision(&self) -> u64 {
        self.revision
    }

    pub fn state(&self) -> QueueState {
        if self.has_leaves() {
            QueueState::Populated
        } else {
            QueueState::Empty
        }
    }

    /// All leaves from the start, in effective order
    pub fn traversal(&self) -> Traversal<'_, M> {
        Traversal::new(&self.items)
    }

    /// Leaves after the current one, in effective order (repeat is ignored)
    pub fn upcoming(&self) -> Traversal<'_, M> {
        let next = match &self.cursor {
            Cursor::BeforeStart => first_leaf_from(&self.items, 0),
            Cursor::AfterEnd => None,
            Cursor::At(id) => self
                .locate(id.as_str())
                .and_then(|position| leaf_after(&self.items, position)),
        };
        Traversal::starting_at(&self.items, next)
    }

    fn top_position(&self, id: &str) -> Option<usize> {
        self.top_positions
            .get_or_init(|| {
                trace!("Rebuilding top-level index ({} entries)", self.items.len());
                self.items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| (item.id().clone(), index))
                    .collect()
            })
            .get(id)
            .copied()
    }

    fn invalidate_positions(&mut self) {
        self.top_positions.take();
    }

    /// Flattened position of a leaf
    fn locate(&self, id: &str) -> Option<LeafPosition> {
        match self.slots.get(id)? {
            Slot::Top => {
                let top = self.top_position(id)?;
                self.items[top].as_single()?;
                Some(LeafPosition { top, child: None })
            }
            Slot::Child(parent) => {
                let top = self.top_position(parent.as_str())?;
                let child = self.items[top].as_collection()?.position_of(id)?;
                Some(LeafPosition {
                    top,
                    child: Some(child),
                })
            }
        }
    }

    fn leaf_id_at(&self, position: Option<LeafPosition>) -> Option<ItemId> {
        position
            .and_then(|position| leaf_at(&self.items, position))
            .map(|leaf| leaf.id().clone())
    }

    // ===== Events =====

    /// Drain all pending events
    ///
    /// Returns every event emitted since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<QueueEvent> {
        self.events_overflowed = false;
        std::mem::take(&mut self.pending_events).into()
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    /// Record an event, dropping the oldest once `max_pending_events` is reached
    fn push_event(&mut self, event: QueueEvent) {
        let limit = self.config.max_pending_events;
        if limit == 0 {
            return;
        }
        while self.pending_events.len() >= limit {
            self.pending_events.pop_front();
            if !self.events_overflowed {
                self.events_overflowed = true;
                warn!(
                    "Queue event buffer full ({} events), dropping oldest until drained",
                    limit
                );
            }
        }
        self.pending_events.push_back(event);
    }

    fn emit_queue_changed(&mut self) {
        self.revision += 1;
        self.push_event(QueueEvent::QueueChanged {
            length: self.items.len(),
            leaf_count: self.leaf_total,
        });
    }

    fn emit_shuffle_changed(&mut self, id: &str, shuffled: bool) {
        self.revision += 1;
        self.push_event(QueueEvent::ShuffleChanged {
            collection: ItemId::from(id),
            shuffled,
        });
    }
}

impl<M: Clone> Queue<M> {
    /// Owned projection for display
    pub fn snapshot(&self) -> QueueSnapshot<M> {
        QueueSnapshot::from(self)
    }
}

impl<M> Default for Queue<M> {
    fn default() -> Self {
        Self::new()
    }
}
