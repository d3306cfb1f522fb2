//! Short-lived offset reader
//!
//! An [`OffsetReader`] is bound to exactly one topic's partitions for the
//! duration of one describe call. It joins no consumer group and commits
//! nothing, so it cannot perturb production consumer groups. Its lifetime is
//! scoped to the call: dropping the reader (on success, error, or
//! cancellation alike) releases the broker-side assignment along with the
//! connection.

use crate::config::BrokerConfig;
use crate::conn::Connection;
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use topiclens_protocol::{OffsetSpec, Request, Response};
use tracing::debug;

/// A reader bound to a fixed partition set of one topic
pub struct OffsetReader {
    conn: Connection,
    topic: String,
    partitions: Vec<u32>,
}

impl OffsetReader {
    /// Open a reader over exactly the given partitions.
    ///
    /// The broker-side assignment lasts until the reader is dropped.
    pub async fn open(
        config: Arc<BrokerConfig>,
        topic: &str,
        partitions: &[u32],
    ) -> Result<Self> {
        let mut conn = Connection::connect(&config).await?;
        let request = Request::AssignReader {
            topic: topic.to_string(),
            partitions: partitions.to_vec(),
        };

        match conn.call(request).await? {
            Response::ReaderAssigned => {
                debug!(topic = %topic, partitions = partitions.len(), "reader assigned");
                Ok(Self {
                    conn,
                    topic: topic.to_string(),
                    partitions: partitions.to_vec(),
                })
            }
            Response::Error { code, message } => Err(Error::from_broker(code, message, topic)),
            _ => Err(Error::InvalidResponse),
        }
    }

    /// Current read position of every assigned partition.
    ///
    /// Partitions with no established position are eagerly resolved to
    /// their earliest offset before being reported; an unresolved position
    /// is never a valid answer.
    pub async fn positions(&mut self) -> Result<HashMap<u32, u64>> {
        let raw = match self.conn.call(Request::FetchPositions).await? {
            Response::Positions { positions } => positions,
            Response::Error { code, message } => {
                return Err(Error::from_broker(code, message, &self.topic))
            }
            _ => return Err(Error::InvalidResponse),
        };

        let unresolved: Vec<u32> = self
            .partitions
            .iter()
            .copied()
            .filter(|p| !matches!(raw.get(p), Some(Some(_))))
            .collect();

        let mut resolved: HashMap<u32, u64> = raw
            .into_iter()
            .filter_map(|(p, pos)| pos.map(|pos| (p, pos)))
            .collect();

        if !unresolved.is_empty() {
            debug!(
                topic = %self.topic,
                count = unresolved.len(),
                "resolving unestablished positions to earliest"
            );
            let earliest = self.list_earliest(&unresolved).await?;
            for partition in unresolved {
                let offset = earliest.get(&partition).copied().ok_or_else(|| {
                    Error::IncompleteMetadata {
                        topic: self.topic.clone(),
                        detail: format!("no earliest offset for partition {partition}"),
                    }
                })?;
                resolved.insert(partition, offset);
            }
        }

        Ok(resolved)
    }

    /// Release the reader explicitly. Dropping it has the same effect.
    pub fn close(self) {
        drop(self);
    }

    async fn list_earliest(&mut self, partitions: &[u32]) -> Result<HashMap<u32, u64>> {
        let request = Request::ListOffsets {
            topic: self.topic.clone(),
            partitions: partitions.to_vec(),
            spec: OffsetSpec::Earliest,
        };
        match self.conn.call(request).await? {
            Response::Offsets { offsets } => Ok(offsets),
            Response::Error { code, message } => {
                Err(Error::from_broker(code, message, &self.topic))
            }
            _ => Err(Error::InvalidResponse),
        }
    }
}
