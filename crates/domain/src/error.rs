//! Domain error types.

use storage::StorageError;
use thiserror::Error;

/// Errors that can occur while running a unit of work or propagating events.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the storage session.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A row could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A unit of work was used outside of its active lifecycle.
    #[error("Invalid unit of work state: {0}")]
    InvalidState(String),

    /// A subscribed handler failed while an event was being published.
    ///
    /// The transaction that produced the event is already committed.
    #[error("Handler {handler} failed on {event_type}: {source}")]
    Handler {
        handler: &'static str,
        event_type: &'static str,
        #[source]
        source: Box<DomainError>,
    },

    /// Publication nested deeper than the bus allows.
    #[error("Event cascade exceeded the maximum depth of {limit}")]
    CascadeDepthExceeded { limit: usize },

    /// Event kinds that have no subscriber after wiring.
    #[error("No handler subscribed for: {}", .0.join(", "))]
    MissingSubscribers(Vec<&'static str>),
}

impl DomainError {
    /// Returns the innermost error, unwrapping every handler failure layer.
    pub fn root_cause(&self) -> &DomainError {
        let mut current = self;
        while let DomainError::Handler { source, .. } = current {
            current = source;
        }
        current
    }

    /// Returns the chain of handler names from the outermost publish down to
    /// the handler that failed first.
    pub fn handler_chain(&self) -> Vec<&'static str> {
        let mut chain = Vec::new();
        let mut current = self;
        while let DomainError::Handler {
            handler, source, ..
        } = current
        {
            chain.push(*handler);
            current = source;
        }
        chain
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
