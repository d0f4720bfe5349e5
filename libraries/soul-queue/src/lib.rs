//! Soul Player - Playback Queue
//!
//! Ordered play queue mixing standalone tracks and whole collections.
//!
//! This crate provides:
//! - Singles (one playable track) and Collections (album, playlist) as queue entries
//! - Per-collection shuffle that never touches the stored order
//! - Flattened traversal, where a collection expands to its children in place
//! - A current-leaf pointer tracked by id, stable across inserts, moves and shuffles
//! - Repeat modes (Off, One, Collection, All)
//! - Change events and immutable snapshots for UI consumers
//! - A thread-safe handle for sharing one queue between threads
//!
//! # Architecture
//!
//! `soul-queue` does not load audio or fetch metadata. Item metadata is an
//! opaque type parameter, and external sources plug in through
//! [`ItemProvider`].
//!
//! # Example: Building a Queue
//!
//! ```rust
//! use soul_queue::{Collection, Queue, Single};
//!
//! let mut queue = Queue::new();
//! queue.add(Single::new("intro", "Intro"), None)?;
//!
//! let album = Collection::with_children(
//!     "album1",
//!     "Greatest Hits",
//!     vec![Single::new("t1", "Track 1"), Single::new("t2", "Track 2")],
//! )?;
//! queue.add(album, None)?;
//!
//! let order: Vec<&str> = queue.traversal().map(|leaf| leaf.id().as_str()).collect();
//! assert_eq!(order, vec!["intro", "t1", "t2"]);
//!
//! assert_eq!(queue.next().map(|leaf| *leaf.metadata()), Some("Intro"));
//! assert_eq!(queue.next().map(|leaf| *leaf.metadata()), Some("Track 1"));
//! # Ok::<(), soul_queue::QueueError>(())
//! ```
//!
//! # Example: Shuffle and Repeat
//!
//! ```rust
//! use soul_queue::{Collection, Queue, RepeatMode, Single};
//!
//! let mut queue: Queue<()> = Queue::new();
//! let children = (1..=5).map(|n| Single::new(format!("t{n}"), ())).collect();
//! queue.add(Collection::with_children("album1", (), children)?, None)?;
//!
//! queue.shuffle("album1")?;
//! assert!(queue.is_shuffled("album1")?);
//!
//! // Stored order is untouched
//! let stored: Vec<&str> = queue
//!     .collection("album1")
//!     .map(|album| album.children().iter().map(|t| t.id().as_str()).collect())
//!     .unwrap_or_default();
//! assert_eq!(stored, vec!["t1", "t2", "t3", "t4", "t5"]);
//!
//! queue.unshuffle("album1")?;
//! queue.set_repeat(RepeatMode::All);
//! # Ok::<(), soul_queue::QueueError>(())
//! ```
//!
//! # Example: Sharing Between Threads
//!
//! ```rust
//! use soul_queue::{SharedQueue, Single};
//! use std::thread;
//!
//! let shared: SharedQueue<u32> = SharedQueue::default();
//! let writer = {
//!     let shared = shared.clone();
//!     thread::spawn(move || shared.add(Single::new("t1", 42), None))
//! };
//! writer.join().unwrap().unwrap();
//!
//! // Readers take the latest published snapshot without locking the queue
//! assert_eq!(shared.snapshot().leaf_count, 1);
//! ```

mod error;
mod events;
mod item;
mod provider;
mod queue;
mod shared;
mod shuffle;
mod snapshot;
mod traversal;
pub mod types;

// Public exports
pub use error::{QueueError, Result};
pub use events::QueueEvent;
pub use item::{Collection, QueueItem, Single};
pub use provider::{ItemProvider, ProvidedItem};
pub use queue::Queue;
pub use shared::SharedQueue;
pub use shuffle::ShuffleState;
pub use snapshot::{QueueSnapshot, SnapshotEntry, SnapshotLeaf};
pub use traversal::Traversal;
pub use types::{EmptyCollectionPolicy, ItemId, QueueConfig, QueueState, RepeatMode};
