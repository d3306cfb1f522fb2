//! Error taxonomy for lifecycle and lag operations
//!
//! Transient kinds ([`Error::is_transient`]) are eligible for the bounded
//! retry in create/delete; semantic kinds propagate immediately. No failure
//! is ever collapsed into a success value.

use std::time::Duration;
use thiserror::Error;
use topiclens_protocol::{ErrorCode, ProtocolError};

#[derive(Debug, Error)]
pub enum Error {
    /// A topic with this name already exists
    #[error("topic '{0}' already exists")]
    AlreadyExists(String),

    /// The named topic does not exist
    #[error("topic '{0}' not found")]
    NotFound(String),

    /// Topic names must be non-empty
    #[error("topic name must not be empty")]
    InvalidTopicName,

    /// A broker round trip did not complete within its bound
    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    /// No bootstrap server could be reached, or a connection failed mid-call
    #[error("cluster unavailable: {0}")]
    ClusterUnavailable(String),

    /// Independently-fetched offset sets disagree about the partition set,
    /// or a partition's offsets violate the broker contract
    #[error("incomplete metadata for topic '{topic}': {detail}")]
    IncompleteMetadata { topic: String, detail: String },

    /// All retry attempts failed; wraps the last underlying cause
    #[error("retries exhausted after {attempts} attempts")]
    RetryExhausted {
        attempts: u32,
        #[source]
        source: Box<Error>,
    },

    /// Wire codec failure
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The broker answered with a response the operation did not expect
    #[error("unexpected response from broker")]
    InvalidResponse,

    /// Broker-side failure that maps to no specific kind
    #[error("broker error: {0}")]
    Broker(String),
}

impl Error {
    /// Whether the bounded retry policy may re-attempt after this error.
    ///
    /// Only connection-level and timeout failures qualify; semantic
    /// failures describe a stable state of the cluster and retrying them
    /// cannot change the outcome.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Timeout { .. } | Error::ClusterUnavailable(_))
    }

    /// Map a broker error response onto the client taxonomy.
    pub(crate) fn from_broker(code: ErrorCode, message: String, topic: &str) -> Self {
        match code {
            ErrorCode::TopicAlreadyExists => Error::AlreadyExists(topic.to_string()),
            ErrorCode::UnknownTopic => Error::NotFound(topic.to_string()),
            ErrorCode::NoReaderAssigned | ErrorCode::Internal => Error::Broker(message),
        }
    }
}

/// Result type for lifecycle and lag operations
pub type Result<T> = std::result::Result<T, Error>;
