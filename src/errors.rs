//! Typed errors for the taskhub backend.

use thiserror::Error;

/// Errors from the task store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Task {id} not found")]
    TaskNotFound { id: i64 },

    #[error("Comment {id} not found")]
    CommentNotFound { id: i64 },

    #[error("Invalid status '{value}'")]
    InvalidStatus { value: String },

    #[error("Store lock poisoned")]
    LockPoisoned,
}
