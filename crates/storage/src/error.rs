use thiserror::Error;

/// Errors that can occur when interacting with a storage session.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The session was used after it had been closed.
    #[error("Session is closed")]
    SessionClosed,

    /// The transaction could not be committed. Nothing was written.
    #[error("Commit failed: {0}")]
    CommitFailed(String),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
