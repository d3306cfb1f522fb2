//! Test helpers and utilities

use crate::broker::ScriptedBroker;
use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use topiclens_client::{BrokerConfig, TopicLifecycleService};

/// Initialize tracing for tests (call once at start of test)
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("topiclens_client=debug".parse().unwrap())
                .add_directive("topiclens_integration_tests=debug".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

/// Configuration with test-friendly timeouts pointed at one address
pub fn test_config(addr: String) -> BrokerConfig {
    BrokerConfig::builder()
        .bootstrap_server(addr)
        .connect_timeout(Duration::from_secs(1))
        .request_timeout(Duration::from_secs(2))
        .describe_timeout(Duration::from_secs(2))
        .retry_delay(Duration::from_millis(25))
        .build()
}

/// A lifecycle service wired to the scripted broker
pub fn service_for(broker: &ScriptedBroker) -> TopicLifecycleService {
    TopicLifecycleService::new(test_config(broker.address()))
}

/// Wait for a condition to become true with timeout
pub async fn wait_for<F, Fut>(
    condition: F,
    timeout_duration: Duration,
    poll_interval: Duration,
) -> Result<()>
where
    F: Fn() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = std::time::Instant::now();

    while start.elapsed() < timeout_duration {
        if condition().await {
            return Ok(());
        }
        sleep(poll_interval).await;
    }

    anyhow::bail!("Condition not met within {:?}", timeout_duration)
}
