//! Request/response messages for the broker admin and consumer endpoints
//!
//! **WARNING**: Variant order must remain stable for postcard serialization
//! compatibility.

use crate::error::Result;
use crate::{ProtocolError, MAX_MESSAGE_SIZE};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Offset reference point for a list-offsets query.
///
/// Brokers answer one reference point per request, so earliest and latest
/// offsets are always fetched with two independent calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OffsetSpec {
    /// First available offset (messages before this are deleted/compacted)
    Earliest,
    /// Next offset to be assigned (one past the last message)
    Latest,
}

impl std::fmt::Display for OffsetSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OffsetSpec::Earliest => write!(f, "earliest"),
            OffsetSpec::Latest => write!(f, "latest"),
        }
    }
}

/// Error codes returned by the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// A topic with the requested name already exists
    TopicAlreadyExists,
    /// The named topic does not exist
    UnknownTopic,
    /// A position was requested before a reader was assigned
    NoReaderAssigned,
    /// Unclassified broker-side failure
    Internal,
}

/// Partition layout of a topic as reported by a describe call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionLayout {
    /// Topic name
    pub name: String,
    /// Partition indexes, in broker order
    pub partitions: Vec<u32>,
}

impl PartitionLayout {
    /// Number of partitions in the layout
    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }
}

/// Protocol requests
///
/// **WARNING**: Variant order must remain stable for postcard serialization
/// compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Request {
    /// Create a new topic (replication factor is fixed at 1)
    CreateTopic {
        name: String,
        /// Requested partition count; `None` or 0 means broker default (1)
        partitions: Option<u32>,
    },

    /// Delete a topic
    DeleteTopic { name: String },

    /// List all topic names
    ListTopics,

    /// Get the partition layout of a topic
    DescribeTopic { name: String },

    /// Get one offset per partition for a single reference point
    ListOffsets {
        topic: String,
        partitions: Vec<u32>,
        spec: OffsetSpec,
    },

    /// Bind this connection as a reader over exactly the given partitions.
    ///
    /// Assignment carries no consumer-group membership and never commits
    /// offsets; the binding lasts until the connection closes.
    AssignReader { topic: String, partitions: Vec<u32> },

    /// Fetch the current read position of every assigned partition
    FetchPositions,

    /// Liveness probe
    Ping,
}

/// Protocol responses
///
/// **WARNING**: Variant order must remain stable for postcard serialization
/// compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Response {
    /// Topic created
    TopicCreated { name: String, partitions: u32 },

    /// Topic deleted
    TopicDeleted,

    /// List of topic names
    Topics { names: Vec<String> },

    /// Partition layout of a topic
    TopicLayout(PartitionLayout),

    /// Per-partition offsets for one reference point
    Offsets { offsets: HashMap<u32, u64> },

    /// Reader assignment accepted
    ReaderAssigned,

    /// Per-partition read positions; `None` when no position is established
    Positions {
        positions: HashMap<u32, Option<u64>>,
    },

    /// Pong
    Pong,

    /// Error response
    Error { code: ErrorCode, message: String },
}

impl Request {
    /// Serialize request to bytes (postcard format)
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(postcard::to_allocvec(self)?)
    }

    /// Deserialize request from bytes (postcard format)
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::MessageTooLarge(data.len(), MAX_MESSAGE_SIZE));
        }
        postcard::from_bytes(data).map_err(|e| ProtocolError::Deserialization(e.to_string()))
    }
}

impl Response {
    /// Serialize response to bytes (postcard format)
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(postcard::to_allocvec(self)?)
    }

    /// Deserialize response from bytes (postcard format)
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::MessageTooLarge(data.len(), MAX_MESSAGE_SIZE));
        }
        postcard::from_bytes(data).map_err(|e| ProtocolError::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_roundtrip() {
        let request = Request::ListOffsets {
            topic: "orders".to_string(),
            partitions: vec![0, 1, 2],
            spec: OffsetSpec::Latest,
        };
        let bytes = request.to_bytes().unwrap();
        let decoded = Request::from_bytes(&bytes).unwrap();
        match decoded {
            Request::ListOffsets {
                topic,
                partitions,
                spec,
            } => {
                assert_eq!(topic, "orders");
                assert_eq!(partitions, vec![0, 1, 2]);
                assert_eq!(spec, OffsetSpec::Latest);
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn test_response_with_unresolved_positions() {
        let mut positions = HashMap::new();
        positions.insert(0u32, Some(42u64));
        positions.insert(1u32, None);

        let response = Response::Positions { positions };
        let bytes = response.to_bytes().unwrap();
        let decoded = Response::from_bytes(&bytes).unwrap();
        match decoded {
            Response::Positions { positions } => {
                assert_eq!(positions.get(&0), Some(&Some(42)));
                assert_eq!(positions.get(&1), Some(&None));
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn test_error_response_carries_code() {
        let response = Response::Error {
            code: ErrorCode::UnknownTopic,
            message: "no such topic".to_string(),
        };
        let bytes = response.to_bytes().unwrap();
        match Response::from_bytes(&bytes).unwrap() {
            Response::Error { code, message } => {
                assert_eq!(code, ErrorCode::UnknownTopic);
                assert_eq!(message, "no such topic");
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn test_partition_layout_count() {
        let layout = PartitionLayout {
            name: "orders".to_string(),
            partitions: vec![0, 1, 2, 3],
        };
        assert_eq!(layout.partition_count(), 4);
    }

    #[test]
    fn test_offset_spec_display() {
        assert_eq!(OffsetSpec::Earliest.to_string(), "earliest");
        assert_eq!(OffsetSpec::Latest.to_string(), "latest");
    }
}
