//! Topic lifecycle and consumer-lag aggregation engine
//!
//! A control-plane client for a partitioned message broker: create, delete,
//! list and describe topics, and compute a topic's total message count and
//! total consumer lag by composing multiple asynchronous broker calls.
//!
//! # Architecture
//!
//! - [`AdminGateway`] — thin handle to the broker's admin endpoint; one
//!   short-lived connection per call.
//! - [`OffsetReader`] — short-lived reader bound to exactly one topic's
//!   partitions; no consumer-group membership, no commits.
//! - [`lag`] — pure reconciliation of the three offset maps (earliest,
//!   latest, current) into [`TopicMetrics`].
//! - [`TopicLifecycleService`] — the public operation surface; owns the
//!   bounded retry policy and error classification.
//!
//! # Example
//!
//! ```rust,ignore
//! use topiclens_client::{BrokerConfig, TopicLifecycleService};
//!
//! let config = BrokerConfig::builder()
//!     .bootstrap_server("localhost:9092")
//!     .build();
//! let service = TopicLifecycleService::new(config);
//!
//! service.create_topic("orders", Some(8)).await?;
//! let metrics = service.describe_topic_with_lag("orders").await?;
//! println!("{} messages, {} lag", metrics.total_messages, metrics.total_lag);
//! ```

pub mod admin;
pub mod config;
mod conn;
pub mod error;
pub mod lag;
pub mod reader;
pub mod retry;
pub mod service;

pub use admin::AdminGateway;
pub use config::{BrokerConfig, BrokerConfigBuilder};
pub use error::{Error, Result};
pub use lag::TopicMetrics;
pub use reader::OffsetReader;
pub use retry::{Decision, RetryPolicy};
pub use service::TopicLifecycleService;
