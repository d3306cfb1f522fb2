//! Broker connection configuration
//!
//! One immutable [`BrokerConfig`] is shared process-wide (as an injected
//! `Arc`, never global state); every operation constructs its own
//! short-lived connection from it.

use std::time::Duration;

/// Configuration for talking to a broker cluster
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Bootstrap servers (host:port), tried in order until one connects
    pub bootstrap_servers: Vec<String>,
    /// Per-server connect timeout
    pub connect_timeout: Duration,
    /// Timeout for a single admin round trip
    pub request_timeout: Duration,
    /// Overall bound for a describe-with-lag pipeline
    pub describe_timeout: Duration,
    /// Maximum attempts for create/delete (first attempt included)
    pub retry_max_attempts: u32,
    /// Fixed delay between retry attempts
    pub retry_delay: Duration,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: vec!["localhost:9092".to_string()],
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            describe_timeout: Duration::from_secs(5),
            retry_max_attempts: 3,
            retry_delay: Duration::from_millis(500),
        }
    }
}

impl BrokerConfig {
    /// Create a new builder
    pub fn builder() -> BrokerConfigBuilder {
        BrokerConfigBuilder::default()
    }
}

/// Builder for [`BrokerConfig`]
#[derive(Default)]
pub struct BrokerConfigBuilder {
    config: BrokerConfig,
}

impl BrokerConfigBuilder {
    /// Set a single bootstrap server (convenience for `bootstrap_servers`)
    pub fn bootstrap_server(mut self, server: impl Into<String>) -> Self {
        self.config.bootstrap_servers = vec![server.into()];
        self
    }

    /// Set multiple bootstrap servers for failover
    pub fn bootstrap_servers(mut self, servers: Vec<String>) -> Self {
        self.config.bootstrap_servers = servers;
        self
    }

    /// Set per-server connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the admin round-trip timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the overall describe-with-lag bound
    pub fn describe_timeout(mut self, timeout: Duration) -> Self {
        self.config.describe_timeout = timeout;
        self
    }

    /// Set maximum create/delete attempts
    pub fn retry_max_attempts(mut self, attempts: u32) -> Self {
        self.config.retry_max_attempts = attempts;
        self
    }

    /// Set the fixed delay between retry attempts
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry_delay = delay;
        self
    }

    /// Build the configuration
    pub fn build(self) -> BrokerConfig {
        self.config
    }
}
