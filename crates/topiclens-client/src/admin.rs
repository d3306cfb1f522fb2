//! Admin gateway to the broker's cluster-administration endpoint
//!
//! Stateless per call: every operation opens its own connection from the
//! shared [`BrokerConfig`] and releases it when the call returns, so
//! concurrent operations never contend on a shared handle. Every round trip
//! is bounded; an unbounded wait on a broker is a correctness defect.

use crate::config::BrokerConfig;
use crate::conn::Connection;
use crate::error::{Error, Result};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use topiclens_protocol::{OffsetSpec, PartitionLayout, Request, Response};
use tracing::{debug, info};

/// Thin, reusable handle to the broker's admin endpoint.
///
/// Cheap to clone; the configuration behind it is shared and immutable.
#[derive(Clone)]
pub struct AdminGateway {
    config: Arc<BrokerConfig>,
}

impl AdminGateway {
    /// Create a gateway over a shared broker configuration
    pub fn new(config: Arc<BrokerConfig>) -> Self {
        Self { config }
    }

    /// Create a topic with the requested partition count.
    ///
    /// A count of `None` or 0 becomes 1; replication factor is fixed at 1.
    /// Returns the partition count the broker acknowledged.
    pub async fn create_topic(&self, name: &str, partitions: Option<u32>) -> Result<u32> {
        let partitions = match partitions {
            None | Some(0) => Some(1),
            other => other,
        };
        let request = Request::CreateTopic {
            name: name.to_string(),
            partitions,
        };

        match self
            .round_trip("create topic", self.config.request_timeout, request)
            .await?
        {
            Response::TopicCreated { partitions, .. } => {
                info!(topic = %name, partitions, "topic created");
                Ok(partitions)
            }
            Response::Error { code, message } => Err(Error::from_broker(code, message, name)),
            _ => Err(Error::InvalidResponse),
        }
    }

    /// Delete a topic
    pub async fn delete_topic(&self, name: &str) -> Result<()> {
        let request = Request::DeleteTopic {
            name: name.to_string(),
        };

        match self
            .round_trip("delete topic", self.config.request_timeout, request)
            .await?
        {
            Response::TopicDeleted => {
                info!(topic = %name, "topic deleted");
                Ok(())
            }
            Response::Error { code, message } => Err(Error::from_broker(code, message, name)),
            _ => Err(Error::InvalidResponse),
        }
    }

    /// List all topic names.
    ///
    /// Failure is a typed error; callers can always tell "no topics" from
    /// "the listing failed".
    pub async fn list_topics(&self) -> Result<BTreeSet<String>> {
        match self
            .round_trip("list topics", self.config.request_timeout, Request::ListTopics)
            .await?
        {
            Response::Topics { names } => Ok(names.into_iter().collect()),
            Response::Error { code, message } => Err(Error::from_broker(code, message, "")),
            _ => Err(Error::InvalidResponse),
        }
    }

    /// Get the partition layout of a topic, under the bounded describe
    /// timeout.
    pub async fn describe_topic(&self, name: &str) -> Result<PartitionLayout> {
        let request = Request::DescribeTopic {
            name: name.to_string(),
        };

        match self
            .round_trip("describe topic", self.config.describe_timeout, request)
            .await?
        {
            Response::TopicLayout(layout) => {
                debug!(topic = %name, partitions = layout.partition_count(), "described topic");
                Ok(layout)
            }
            Response::Error { code, message } => Err(Error::from_broker(code, message, name)),
            _ => Err(Error::InvalidResponse),
        }
    }

    /// Get one offset per partition for a single reference point.
    ///
    /// Brokers answer one reference point per request, so earliest and
    /// latest are always two independent calls.
    pub async fn list_offsets(
        &self,
        topic: &str,
        partitions: &[u32],
        spec: OffsetSpec,
    ) -> Result<HashMap<u32, u64>> {
        let request = Request::ListOffsets {
            topic: topic.to_string(),
            partitions: partitions.to_vec(),
            spec,
        };

        match self
            .round_trip("list offsets", self.config.request_timeout, request)
            .await?
        {
            Response::Offsets { offsets } => {
                debug!(topic = %topic, %spec, count = offsets.len(), "listed offsets");
                Ok(offsets)
            }
            Response::Error { code, message } => Err(Error::from_broker(code, message, topic)),
            _ => Err(Error::InvalidResponse),
        }
    }

    /// Liveness probe against the cluster
    pub async fn ping(&self) -> Result<()> {
        match self
            .round_trip("ping", self.config.request_timeout, Request::Ping)
            .await?
        {
            Response::Pong => Ok(()),
            Response::Error { code, message } => Err(Error::from_broker(code, message, "")),
            _ => Err(Error::InvalidResponse),
        }
    }

    /// One bounded connect-and-call round trip on a fresh connection.
    async fn round_trip(
        &self,
        operation: &'static str,
        bound: Duration,
        request: Request,
    ) -> Result<Response> {
        timeout(bound, async {
            let mut conn = Connection::connect(&self.config).await?;
            conn.call(request).await
        })
        .await
        .map_err(|_| Error::Timeout {
            operation,
            timeout: bound,
        })?
    }
}
