use thiserror::Error;
use uuid::Uuid;

use crate::slot::SlotIndex;

#[derive(Error, Debug)]
pub enum BinderError {
    #[error("Binder not found: {0}")]
    BinderNotFound(String),

    #[error("Card not found: {0}")]
    CardNotFound(Uuid),

    #[error("Slot {slot} is empty")]
    SlotEmpty { slot: SlotIndex },

    #[error("Catalog card not found: {0}")]
    CatalogNotFound(String),

    #[error("User '{user}' does not own binder {binder_id}")]
    Unauthorized { user: String, binder_id: Uuid },

    #[error("Slot {slot} is already occupied")]
    SlotOccupied { slot: SlotIndex },

    /// A change set would leave two cards on one slot. Never reaches storage.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Raised by a store when a write lands on a position another card holds.
    #[error("Position {position} is already taken in binder {binder_id}")]
    SlotConflict { binder_id: Uuid, position: i64 },

    /// A negative placeholder collided during phase 1 of a commit.
    #[error("Placeholder {position} for card {card_id} collided with a live card")]
    PlaceholderCollision { card_id: Uuid, position: i64 },

    #[error("Transaction aborted, refetch and retry: {0}")]
    TransactionFailure(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),
}

/// Coarse classification callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Unauthorized,
    SlotOccupied,
    InvariantViolation,
    PlaceholderCollision,
    TransactionFailure,
    InvalidInput,
    Storage,
}

impl BinderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BinderError::BinderNotFound(_)
            | BinderError::CardNotFound(_)
            | BinderError::SlotEmpty { .. }
            | BinderError::CatalogNotFound(_) => ErrorKind::NotFound,
            BinderError::Unauthorized { .. } => ErrorKind::Unauthorized,
            BinderError::SlotOccupied { .. } => ErrorKind::SlotOccupied,
            BinderError::InvariantViolation(_) => ErrorKind::InvariantViolation,
            BinderError::PlaceholderCollision { .. } => ErrorKind::PlaceholderCollision,
            BinderError::TransactionFailure(_) => ErrorKind::TransactionFailure,
            BinderError::InvalidInput(_) => ErrorKind::InvalidInput,
            BinderError::SlotConflict { .. }
            | BinderError::Io(_)
            | BinderError::Serialization(_)
            | BinderError::Database(_)
            | BinderError::Config(_)
            | BinderError::Store(_) => ErrorKind::Storage,
        }
    }

    /// Only aborted batches are worth resubmitting, and only against fresh state.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::TransactionFailure
    }
}

pub type Result<T> = std::result::Result<T, BinderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            BinderError::CardNotFound(Uuid::nil()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            BinderError::SlotOccupied {
                slot: SlotIndex::new(3)
            }
            .kind(),
            ErrorKind::SlotOccupied
        );
        assert_eq!(
            BinderError::SlotConflict {
                binder_id: Uuid::nil(),
                position: 1
            }
            .kind(),
            ErrorKind::Storage
        );
    }

    #[test]
    fn test_only_transaction_failure_is_retryable() {
        assert!(BinderError::TransactionFailure("busy".into()).is_retryable());
        assert!(!BinderError::InvariantViolation("dup".into()).is_retryable());
        assert!(!BinderError::PlaceholderCollision {
            card_id: Uuid::nil(),
            position: -1
        }
        .is_retryable());
    }
}
