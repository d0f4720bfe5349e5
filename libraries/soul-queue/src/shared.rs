//! Thread-safe queue handle
//!
//! Mutations are serialized through a mutex. After every mutation a fresh
//! snapshot is published, so readers (UI threads, status endpoints) never
//! block on the mutation lock and never see a half-applied change.
//!
//! Navigation does not rebuild entries: while the queue's structural
//! revision is unchanged, the new snapshot shares the previous entries and
//! only refreshes the cursor fields.

use crate::error::Result;
use crate::events::QueueEvent;
use crate::item::{QueueItem, Single};
use crate::provider::ItemProvider;
use crate::queue::Queue;
use crate::snapshot::QueueSnapshot;
use crate::types::{ItemId, QueueConfig, RepeatMode};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tracing::{trace, warn};

/// Latest snapshot and the queue revision its entries were built from
struct Published<M> {
    snapshot: Arc<QueueSnapshot<M>>,
    revision: u64,
}

/// Cloneable handle to a queue shared between threads
pub struct SharedQueue<M> {
    queue: Arc<Mutex<Queue<M>>>,
    published: Arc<RwLock<Published<M>>>,
}

impl<M> Clone for SharedQueue<M> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
            published: Arc::clone(&self.published),
        }
    }
}

impl<M: Clone> SharedQueue<M> {
    /// Wrap an existing queue
    pub fn new(queue: Queue<M>) -> Self {
        let published = Published {
            snapshot: Arc::new(queue.snapshot()),
            revision: queue.revision(),
        };
        Self {
            queue: Arc::new(Mutex::new(queue)),
            published: Arc::new(RwLock::new(published)),
        }
    }

    pub fn with_config(config: QueueConfig) -> Self {
        Self::new(Queue::with_config(config))
    }

    /// Run a mutation and publish the resulting snapshot
    ///
    /// The snapshot is replaced while the queue lock is still held, so
    /// published snapshots always appear in mutation order.
    pub fn mutate<T>(&self, f: impl FnOnce(&mut Queue<M>) -> T) -> T {
        let mut queue = self.lock();
        let result = f(&mut queue);

        let revision = queue.revision();
        let unchanged = {
            let published = self.published.read().unwrap_or_else(PoisonError::into_inner);
            (published.revision == revision).then(|| Arc::clone(&published.snapshot))
        };
        let snapshot = match unchanged {
            Some(previous) => previous.with_position(&queue),
            None => {
                trace!("Rebuilding queue snapshot at revision {}", revision);
                queue.snapshot()
            }
        };

        *self
            .published
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Published {
            snapshot: Arc::new(snapshot),
            revision,
        };
        result
    }

    /// Latest published snapshot
    ///
    /// Never blocks on an in-flight mutation.
    pub fn snapshot(&self) -> Arc<QueueSnapshot<M>> {
        let published = self.published.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&published.snapshot)
    }

    /// ID of the current leaf, from the latest snapshot
    pub fn current(&self) -> Option<ItemId> {
        self.snapshot().current.clone()
    }

    pub fn add(&self, item: impl Into<QueueItem<M>>, position: Option<usize>) -> Result<()> {
        let item = item.into();
        self.mutate(|queue| queue.add(item, position))
    }

    pub fn add_from_provider<P>(&self, provider: &P, id: &str, position: Option<usize>) -> Result<()>
    where
        P: ItemProvider<Metadata = M> + ?Sized,
    {
        // Resolve outside the lock; providers may be slow
        let item = QueueItem::from_provider(provider, id)?;
        self.add(item, position)
    }

    pub fn add_child(&self, collection_id: &str, child: Single<M>, position: Option<usize>) -> Result<()> {
        self.mutate(|queue| queue.add_child(collection_id, child, position))
    }

    pub fn remove(&self, id: &str) -> Result<QueueItem<M>> {
        self.mutate(|queue| queue.remove(id))
    }

    pub fn remove_child(&self, id: &str) -> Result<Single<M>> {
        self.mutate(|queue| queue.remove_child(id))
    }

    pub fn move_item(&self, id: &str, new_position: usize) -> Result<()> {
        self.mutate(|queue| queue.move_item(id, new_position))
    }

    pub fn clear(&self) {
        self.mutate(Queue::clear);
    }

    pub fn shuffle(&self, id: &str) -> Result<()> {
        self.mutate(|queue| queue.shuffle(id))
    }

    pub fn unshuffle(&self, id: &str) -> Result<()> {
        self.mutate(|queue| queue.unshuffle(id))
    }

    pub fn toggle_shuffle(&self, id: &str) -> Result<bool> {
        self.mutate(|queue| queue.toggle_shuffle(id))
    }

    pub fn set_repeat(&self, mode: RepeatMode) {
        self.mutate(|queue| queue.set_repeat(mode));
    }

    /// Advance and return the new current leaf
    pub fn next(&self) -> Option<Single<M>> {
        self.mutate(|queue| queue.next().cloned())
    }

    /// Retreat and return the new current leaf
    pub fn previous(&self) -> Option<Single<M>> {
        self.mutate(|queue| queue.previous().cloned())
    }

    pub fn play_now(&self, id: &str) -> Result<Single<M>> {
        self.mutate(|queue| queue.play_now(id).cloned())
    }

    /// Drain events from the underlying queue
    pub fn drain_events(&self) -> Vec<QueueEvent> {
        self.lock().drain_events()
    }

    /// Read the queue directly under the mutation lock
    pub fn with_queue<T>(&self, f: impl FnOnce(&Queue<M>) -> T) -> T {
        f(&self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Queue<M>> {
        self.queue.lock().unwrap_or_else(|poisoned| {
            warn!("Queue mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl<M: Clone> Default for SharedQueue<M> {
    fn default() -> Self {
        Self::new(Queue::new())
    }
}

impl<M: Clone> From<Queue<M>> for SharedQueue<M> {
    fn from(queue: Queue<M>) -> Self {
        Self::new(queue)
    }
}
