//! Error types for Idle Quest.

use thiserror::Error;

/// Top-level error type for Idle Quest operations.
#[derive(Debug, Error)]
pub enum IdleError {
    /// Persistence errors
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Character lookup failed
    #[error("Character not found: {0}")]
    CharacterNotFound(crate::CharacterId),

    /// Invalid static data or configuration
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Errors raised by a roster blob store.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Stored blob could not be repaired
    #[error("Corrupted save data: {0}")]
    Corrupted(String),
}

/// Result type alias for Idle Quest operations.
pub type IdleResult<T> = Result<T, IdleError>;

/// Result type alias for persistence operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;
