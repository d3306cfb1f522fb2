//! Topic lifecycle: create, delete, list, retry classification

use std::time::Duration;
use topiclens_client::{BrokerConfig, Error, TopicLifecycleService};
use topiclens_integration_tests::broker::{PartitionState, ScriptedBroker};
use topiclens_integration_tests::helpers::{init_tracing, service_for};

#[tokio::test]
async fn create_list_delete_roundtrip() -> anyhow::Result<()> {
    init_tracing();
    let broker = ScriptedBroker::start().await?;
    let service = service_for(&broker);

    let partitions = service.create_topic("orders", Some(3)).await?;
    assert_eq!(partitions, 3);

    let topics = service.list_topics().await?;
    assert!(topics.contains("orders"));

    service.delete_topic("orders").await?;
    let topics = service.list_topics().await?;
    assert!(topics.is_empty());

    Ok(())
}

#[tokio::test]
async fn partition_count_defaults_to_one() -> anyhow::Result<()> {
    init_tracing();
    let broker = ScriptedBroker::start().await?;
    let service = service_for(&broker);

    assert_eq!(service.create_topic("unspecified", None).await?, 1);
    assert_eq!(service.create_topic("zero", Some(0)).await?, 1);

    Ok(())
}

#[tokio::test]
async fn duplicate_create_fails_without_retry() -> anyhow::Result<()> {
    init_tracing();
    let broker = ScriptedBroker::start().await?;
    let service = service_for(&broker);

    service.create_topic("orders", Some(2)).await?;

    let before = broker.requests_served();
    let err = service.create_topic("orders", Some(2)).await.unwrap_err();
    assert!(matches!(err, Error::AlreadyExists(name) if name == "orders"));
    // Semantic failure: exactly one attempt reached the broker.
    assert_eq!(broker.requests_served() - before, 1);

    Ok(())
}

#[tokio::test]
async fn delete_of_missing_topic_is_not_found_not_retry_exhausted() -> anyhow::Result<()> {
    init_tracing();
    let broker = ScriptedBroker::start().await?;
    let service = service_for(&broker);

    let before = broker.requests_served();
    let err = service.delete_topic("ghost").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(name) if name == "ghost"));
    assert_eq!(broker.requests_served() - before, 1);

    Ok(())
}

#[tokio::test]
async fn delete_absorbs_not_found_after_lost_ack() -> anyhow::Result<()> {
    init_tracing();
    let broker = ScriptedBroker::start().await?;
    let service = service_for(&broker);

    broker
        .seed_topic("orders", vec![PartitionState::new(0, 10)])
        .await;

    // First delete executes broker-side but the ack never arrives; the
    // transient failure is retried and the second attempt's NotFound is
    // absorbed as success at the lifecycle layer.
    broker.drop_connection_after_next_delete().await;
    service.delete_topic("orders").await?;

    assert!(!broker.topic_exists("orders").await);
    Ok(())
}

#[tokio::test]
async fn unreachable_cluster_exhausts_retries() {
    init_tracing();
    // Nothing listens on port 1.
    let config = BrokerConfig::builder()
        .bootstrap_server("127.0.0.1:1")
        .connect_timeout(Duration::from_millis(200))
        .retry_max_attempts(3)
        .retry_delay(Duration::from_millis(10))
        .build();
    let service = TopicLifecycleService::new(config);

    let err = service.create_topic("orders", Some(1)).await.unwrap_err();
    match err {
        Error::RetryExhausted { attempts, source } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*source, Error::ClusterUnavailable(_)));
        }
        other => panic!("expected RetryExhausted, got {other:?}"),
    }
}

#[tokio::test]
async fn bootstrap_failover_reaches_second_server() -> anyhow::Result<()> {
    init_tracing();
    let broker = ScriptedBroker::start().await?;

    let config = BrokerConfig::builder()
        .bootstrap_servers(vec!["127.0.0.1:1".to_string(), broker.address()])
        .connect_timeout(Duration::from_millis(500))
        .build();
    let service = TopicLifecycleService::new(config);

    service.create_topic("orders", Some(1)).await?;
    assert!(service.list_topics().await?.contains("orders"));

    Ok(())
}

#[tokio::test]
async fn ping_round_trip() -> anyhow::Result<()> {
    init_tracing();
    let broker = ScriptedBroker::start().await?;
    let service = service_for(&broker);

    service.ping().await?;
    Ok(())
}
