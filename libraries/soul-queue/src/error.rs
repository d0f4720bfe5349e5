//! Error types for queue management

use crate::types::ItemId;
use thiserror::Error;

/// Queue errors
///
/// None of these are fatal. A failed operation leaves the queue unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// Identifier is not present in the queue
    #[error("Item not found: {0}")]
    NotFound(ItemId),

    /// Identifier already exists somewhere in the queue
    #[error("Duplicate item id: {0}")]
    DuplicateId(ItemId),

    /// Collection-only operation aimed at a leaf
    ///
    /// Raised by the shuffle family and `add_child` on a Single or a
    /// collection child, and by a provider that nests a collection inside
    /// a collection.
    #[error("Unsupported operation '{operation}' on item {id}")]
    UnsupportedOperation {
        id: ItemId,
        operation: &'static str,
    },

    /// Position outside the valid range for the target sequence
    #[error("Invalid position {position} (length {len})")]
    InvalidPosition { position: usize, len: usize },
}

impl QueueError {
    pub(crate) fn not_found(id: &str) -> Self {
        Self::NotFound(ItemId::from(id))
    }

    pub(crate) fn unsupported(id: &str, operation: &'static str) -> Self {
        Self::UnsupportedOperation {
            id: ItemId::from(id),
            operation,
        }
    }
}

/// Result type for queue operations
pub type Result<T> = std::result::Result<T, QueueError>;
