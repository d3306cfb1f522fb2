//! Concurrent describe-with-lag calls: independence and resource release

use std::sync::Arc;
use topiclens_client::TopicLifecycleService;
use topiclens_integration_tests::broker::{PartitionState, ScriptedBroker};
use topiclens_integration_tests::helpers::{init_tracing, service_for};

#[tokio::test]
async fn concurrent_describes_of_one_topic_are_independent() -> anyhow::Result<()> {
    init_tracing();
    let broker = ScriptedBroker::start().await?;
    let service = service_for(&broker);

    broker
        .seed_topic(
            "orders",
            vec![
                PartitionState::new(0, 100).with_committed(80),
                PartitionState::new(0, 50).with_committed(50),
            ],
        )
        .await;

    assert_eq!(broker.active_readers(), 0);

    let (a, b) = tokio::join!(
        service.describe_topic_with_lag("orders"),
        service.describe_topic_with_lag("orders"),
    );
    let a = a?;
    let b = b?;

    // Two independent, internally-consistent results.
    assert_eq!(a, b);
    assert_eq!(a.total_messages, 150);
    assert_eq!(a.total_lag, 20);

    // No leaked reader handles.
    assert_eq!(broker.active_readers(), 0);
    Ok(())
}

#[tokio::test]
async fn many_concurrent_describes_across_topics() -> anyhow::Result<()> {
    init_tracing();
    let broker = ScriptedBroker::start().await?;
    let service = Arc::new(service_for(&broker));

    broker
        .seed_topic(
            "orders",
            vec![PartitionState::new(0, 40).with_committed(10)],
        )
        .await;
    broker
        .seed_topic(
            "events",
            vec![
                PartitionState::new(0, 5).with_committed(5),
                PartitionState::new(0, 15).with_committed(5),
            ],
        )
        .await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let service = service.clone();
        let topic = if i % 2 == 0 { "orders" } else { "events" };
        handles.push(tokio::spawn(async move {
            service.describe_topic_with_lag(topic).await
        }));
    }

    for handle in handles {
        let metrics = handle.await??;
        match metrics.name.as_str() {
            "orders" => {
                assert_eq!(metrics.total_messages, 40);
                assert_eq!(metrics.total_lag, 30);
            }
            "events" => {
                assert_eq!(metrics.total_messages, 20);
                assert_eq!(metrics.total_lag, 10);
            }
            other => panic!("unexpected topic {other}"),
        }
    }

    assert_eq!(broker.active_readers(), 0);
    Ok(())
}

#[tokio::test]
async fn lifecycle_and_describe_interleave() -> anyhow::Result<()> {
    init_tracing();
    let broker = ScriptedBroker::start().await?;
    let service: Arc<TopicLifecycleService> = Arc::new(service_for(&broker));

    broker
        .seed_topic(
            "stable",
            vec![PartitionState::new(0, 10).with_committed(10)],
        )
        .await;

    let describe = {
        let service = service.clone();
        tokio::spawn(async move { service.describe_topic_with_lag("stable").await })
    };
    let create = {
        let service = service.clone();
        tokio::spawn(async move { service.create_topic("new-topic", Some(2)).await })
    };

    let metrics = describe.await??;
    assert_eq!(metrics.total_lag, 0);
    assert_eq!(create.await??, 2);

    assert_eq!(broker.active_readers(), 0);
    Ok(())
}
