//! Public operation surface: topic lifecycle and describe-with-lag
//!
//! Lifecycle operations (create/delete) are single-attempt calls wrapped in
//! the bounded [`RetryPolicy`]. Describe-with-lag is never auto-retried: it
//! costs several round trips, and a failed call is the caller's decision to
//! re-invoke.

use crate::admin::AdminGateway;
use crate::config::BrokerConfig;
use crate::error::{Error, Result};
use crate::lag::{self, TopicMetrics};
use crate::reader::OffsetReader;
use crate::retry::{Decision, RetryPolicy};
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use tokio::time::{sleep, timeout};
use topiclens_protocol::OffsetSpec;
use tracing::{info, warn};

/// Topic lifecycle and lag aggregation over one broker cluster.
///
/// Holds only the shared immutable configuration; every operation opens and
/// closes its own short-lived broker handles, so any number of operations
/// may run concurrently without coordination.
pub struct TopicLifecycleService {
    config: Arc<BrokerConfig>,
    admin: AdminGateway,
    policy: RetryPolicy,
}

impl TopicLifecycleService {
    /// Create a service over the given configuration
    pub fn new(config: BrokerConfig) -> Self {
        Self::with_shared_config(Arc::new(config))
    }

    /// Create a service over an already-shared configuration
    pub fn with_shared_config(config: Arc<BrokerConfig>) -> Self {
        let policy = RetryPolicy::new(config.retry_max_attempts, config.retry_delay);
        let admin = AdminGateway::new(config.clone());
        Self {
            config,
            admin,
            policy,
        }
    }

    /// Create a topic.
    ///
    /// The partition count defaults to 1 when absent or zero; replication
    /// factor is fixed at 1. Transient failures are retried under the
    /// bounded policy; `AlreadyExists` propagates immediately.
    pub async fn create_topic(&self, name: &str, partitions: Option<u32>) -> Result<u32> {
        validate_topic_name(name)?;
        self.with_retry("create topic", || self.admin.create_topic(name, partitions))
            .await
    }

    /// Delete a topic.
    ///
    /// Transient failures are retried. A `NotFound` on a retry attempt is
    /// absorbed as success: the previous attempt may have deleted the topic
    /// before its acknowledgment was lost, and a second delete observing
    /// "already gone" means the operation's goal is met. A first-attempt
    /// `NotFound` propagates — the topic never existed.
    pub async fn delete_topic(&self, name: &str) -> Result<()> {
        validate_topic_name(name)?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            let error = match self.admin.delete_topic(name).await {
                Ok(()) => return Ok(()),
                Err(Error::NotFound(_)) if attempt > 1 => {
                    info!(topic = %name, attempt, "topic gone after retry, delete treated as success");
                    return Ok(());
                }
                Err(e) => e,
            };

            match self.policy.decide(&error, attempt) {
                Decision::Retry(delay) => {
                    warn!(topic = %name, attempt, error = %error, "delete failed, retrying");
                    sleep(delay).await;
                }
                Decision::Fail => return Err(self.terminal(error, attempt)),
            }
        }
    }

    /// List all topic names. Single attempt; a failure is a typed error,
    /// never an empty listing.
    pub async fn list_topics(&self) -> Result<BTreeSet<String>> {
        self.admin.list_topics().await
    }

    /// Describe a topic and aggregate its message count and consumer lag.
    ///
    /// Pipeline: describe the partition layout first (partition identities
    /// feed everything downstream), then fetch earliest offsets, latest
    /// offsets, and reader positions concurrently, then reduce. The whole
    /// pipeline runs under one deadline; the first failure cancels the
    /// remaining steps, discards partial results, and releases the reader
    /// handle.
    pub async fn describe_topic_with_lag(&self, name: &str) -> Result<TopicMetrics> {
        validate_topic_name(name)?;

        let bound = self.config.describe_timeout;
        let metrics = timeout(bound, self.describe_pipeline(name))
            .await
            .map_err(|_| Error::Timeout {
                operation: "describe with lag",
                timeout: bound,
            })??;

        info!(
            topic = %name,
            partitions = metrics.partition_count,
            messages = metrics.total_messages,
            lag = metrics.total_lag,
            "described topic with lag"
        );
        Ok(metrics)
    }

    /// Liveness probe against the cluster
    pub async fn ping(&self) -> Result<()> {
        self.admin.ping().await
    }

    async fn describe_pipeline(&self, name: &str) -> Result<TopicMetrics> {
        let layout = self.admin.describe_topic(name).await?;
        if layout.partitions.is_empty() {
            return Err(Error::IncompleteMetadata {
                topic: name.to_string(),
                detail: "layout reports no partitions".to_string(),
            });
        }

        let partitions = layout.partitions.clone();
        let (earliest, latest, current) = tokio::try_join!(
            self.admin
                .list_offsets(name, &partitions, OffsetSpec::Earliest),
            self.admin
                .list_offsets(name, &partitions, OffsetSpec::Latest),
            async {
                // The reader lives exactly as long as this branch; it is
                // dropped (and the broker assignment released) whether the
                // branch completes, fails, or is cancelled by a sibling.
                let mut reader =
                    OffsetReader::open(self.config.clone(), name, &partitions).await?;
                reader.positions().await
            },
        )?;

        lag::aggregate(&layout, &earliest, &latest, &current)
    }

    async fn with_retry<T, F, Fut>(&self, what: &'static str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            match self.policy.decide(&error, attempt) {
                Decision::Retry(delay) => {
                    warn!(attempt, error = %error, "{what} failed, retrying");
                    sleep(delay).await;
                }
                Decision::Fail => return Err(self.terminal(error, attempt)),
            }
        }
    }

    /// Wrap a spent transient failure in `RetryExhausted`; semantic
    /// failures pass through untouched.
    fn terminal(&self, error: Error, attempts: u32) -> Error {
        if error.is_transient() && attempts >= self.policy.max_attempts {
            Error::RetryExhausted {
                attempts,
                source: Box::new(error),
            }
        } else {
            error
        }
    }
}

fn validate_topic_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidTopicName);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_topic_name_is_rejected_without_io() {
        // Config points nowhere; validation must fail before any connect.
        let service = TopicLifecycleService::new(
            BrokerConfig::builder().bootstrap_server("127.0.0.1:1").build(),
        );

        assert!(matches!(
            service.create_topic("", None).await,
            Err(Error::InvalidTopicName)
        ));
        assert!(matches!(
            service.delete_topic("").await,
            Err(Error::InvalidTopicName)
        ));
        assert!(matches!(
            service.describe_topic_with_lag("").await,
            Err(Error::InvalidTopicName)
        ));
    }
}
