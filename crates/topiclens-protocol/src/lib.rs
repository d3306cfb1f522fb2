//! Topiclens Wire Protocol
//!
//! This crate defines the wire protocol types shared between the topiclens
//! client and the broker's admin/consumer endpoint. It provides
//! serialization/deserialization for all protocol messages.
//!
//! # Protocol Stability
//!
//! The enum variant order is significant for postcard serialization. Changes
//! to variant order will break wire compatibility with existing
//! clients/brokers.
//!
//! # Example
//!
//! ```rust,ignore
//! use topiclens_protocol::{Request, Response};
//!
//! // Serialize a request
//! let request = Request::Ping;
//! let bytes = request.to_bytes()?;
//!
//! // Deserialize a response
//! let response = Response::from_bytes(&bytes)?;
//! ```

mod error;
mod messages;

pub use error::{ProtocolError, Result};
pub use messages::{ErrorCode, OffsetSpec, PartitionLayout, Request, Response};

/// Protocol version for compatibility checking
pub const PROTOCOL_VERSION: u32 = 1;

/// Maximum message size (64 MiB)
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

/// Replication factor for newly created topics.
///
/// Fixed at 1; it is not carried on the wire.
pub const REPLICATION_FACTOR: u16 = 1;
