//! Integration tests for subscription lifecycle and delivery guarantees

use bytes::Bytes;
use pubkv_core::{DeliveryMode, StoreClient};
use pubkv_handler::{FactoryConfig, HandlerFactory, SubscriptionConfig};
use pubkv_testing::{init_test_logging, memory_factory, wait_until, CallbackRecorder, FaultyStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(2);

#[tokio::test]
async fn test_sequential_publishes_arrive_once_in_order() -> anyhow::Result<()> {
    init_test_logging();
    let (_store, factory) = memory_factory();
    let counter = factory.make_json_handler::<u64>("counter");

    let recorder = CallbackRecorder::new();
    counter.subscribe(recorder.callback()).await?;

    for n in 0..100u64 {
        assert_eq!(counter.publish(&n).await?, 1);
    }

    assert!(recorder.wait_for(100, WAIT).await);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(recorder.values(), (0..100).collect::<Vec<u64>>());

    counter.stop_subscription().await;
    Ok(())
}

#[tokio::test]
async fn test_repeated_subscribe_keeps_one_listener() -> anyhow::Result<()> {
    init_test_logging();
    let (store, factory) = memory_factory();
    let raw = factory.make_bytes_handler("raw");

    let recorder = CallbackRecorder::new();
    for _ in 0..5 {
        raw.subscribe(recorder.callback()).await?;
    }
    assert_eq!(store.bus().subscriber_count("raw"), 1);

    raw.publish(&Bytes::from_static(b"once")).await?;
    assert!(recorder.wait_for(1, WAIT).await);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(recorder.len(), 1);

    raw.stop_subscription().await;
    Ok(())
}

#[tokio::test]
async fn test_stop_subscription_ends_delivery() -> anyhow::Result<()> {
    init_test_logging();
    let (store, factory) = memory_factory();
    let raw = factory.make_bytes_handler("raw");

    let recorder = CallbackRecorder::new();
    raw.subscribe(recorder.callback()).await?;
    assert!(raw.is_alive().await);

    raw.stop_subscription().await;
    assert!(!raw.is_alive().await);
    raw.stop_subscription().await;
    assert!(!raw.is_alive().await);

    assert!(wait_until(|| store.bus().subscriber_count("raw") == 0, WAIT).await);
    assert_eq!(raw.publish(&Bytes::from_static(b"late")).await?, 0);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(recorder.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_stop_on_never_subscribed_handler() {
    init_test_logging();
    let (_store, factory) = memory_factory();
    let cfg = factory.make_dict_handler("cfg");

    cfg.stop_subscription().await;
    assert!(!cfg.is_alive().await);
    assert!(!cfg.is_subscribed().await);
}

#[tokio::test]
async fn test_handlers_on_same_topic_subscribe_independently() -> anyhow::Result<()> {
    init_test_logging();
    let (store, factory) = memory_factory();
    let first = factory.make_bytes_handler("raw");
    let second = factory.make_bytes_handler("raw");

    let first_seen = CallbackRecorder::new();
    let second_seen = CallbackRecorder::new();
    first.subscribe(first_seen.callback()).await?;
    second.subscribe(second_seen.callback()).await?;
    assert_eq!(store.bus().subscriber_count("raw"), 2);

    assert_eq!(first.publish(&Bytes::from_static(b"x")).await?, 2);
    assert!(first_seen.wait_for(1, WAIT).await);
    assert!(second_seen.wait_for(1, WAIT).await);

    first.stop_subscription().await;
    assert!(second.is_alive().await);

    second.publish(&Bytes::from_static(b"y")).await?;
    assert!(second_seen.wait_for(2, WAIT).await);
    assert_eq!(first_seen.len(), 1);

    second.stop_subscription().await;
    Ok(())
}

#[tokio::test]
async fn test_panicking_callback_does_not_end_subscription() -> anyhow::Result<()> {
    init_test_logging();
    let (_store, factory) = memory_factory();
    let raw = factory.make_bytes_handler("raw");
    let delivered = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&delivered);

    raw.subscribe(move |payload: Bytes| {
        counter.fetch_add(1, Ordering::SeqCst);
        if payload == "boom" {
            panic!("callback failure");
        }
    })
    .await?;

    raw.publish(&Bytes::from_static(b"boom")).await?;
    raw.publish(&Bytes::from_static(b"fine")).await?;

    assert!(wait_until(|| delivered.load(Ordering::SeqCst) == 2, WAIT).await);
    assert!(raw.is_alive().await);

    raw.stop_subscription().await;
    Ok(())
}

#[tokio::test]
async fn test_foreground_delivery_is_driven_by_start() -> anyhow::Result<()> {
    init_test_logging();
    let (_store, factory) = memory_factory();
    let factory = factory.with_config(FactoryConfig::new().with_subscription(
        SubscriptionConfig::new().with_delivery_mode(DeliveryMode::Foreground),
    ));
    let counter = factory.make_json_handler::<u32>("counter");

    let recorder = CallbackRecorder::new();
    counter.subscribe(recorder.callback()).await?;
    assert!(!counter.is_alive().await);

    counter.publish(&1).await?;
    counter.publish(&2).await?;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(recorder.is_empty());

    counter.start().await?;
    assert_eq!(recorder.values(), vec![1]);
    counter.start().await?;
    assert_eq!(recorder.values(), vec![1, 2]);

    counter.stop_subscription().await;
    Ok(())
}

#[tokio::test]
async fn test_pending_foreground_start_does_not_block_teardown() -> anyhow::Result<()> {
    init_test_logging();
    let (store, factory) = memory_factory();
    let factory = factory.with_config(FactoryConfig::new().with_subscription(
        SubscriptionConfig::new().with_delivery_mode(DeliveryMode::Foreground),
    ));
    let counter = Arc::new(factory.make_json_handler::<u32>("counter"));

    let recorder = CallbackRecorder::new();
    counter.subscribe(recorder.callback()).await?;

    let pending = tokio::spawn({
        let counter = Arc::clone(&counter);
        async move { counter.start().await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let limit = Duration::from_millis(500);
    assert!(!tokio::time::timeout(limit, counter.is_alive()).await?);
    assert!(tokio::time::timeout(limit, counter.is_subscribed()).await?);
    tokio::time::timeout(limit, counter.stop_subscription()).await?;

    assert!(tokio::time::timeout(limit, pending).await??.is_err());
    assert!(!counter.is_subscribed().await);
    assert!(wait_until(|| store.bus().subscriber_count("counter") == 0, WAIT).await);
    assert!(recorder.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_resubscribe_after_stop() -> anyhow::Result<()> {
    init_test_logging();
    let (_store, factory) = memory_factory();
    let counter = factory.make_json_handler::<u32>("counter");

    let before = CallbackRecorder::new();
    counter.subscribe(before.callback()).await?;
    counter.publish(&1).await?;
    assert!(before.wait_for(1, WAIT).await);
    counter.stop_subscription().await;

    let after = CallbackRecorder::new();
    counter.subscribe(after.callback()).await?;
    assert!(counter.is_alive().await);
    counter.publish(&2).await?;

    assert!(after.wait_for(1, WAIT).await);
    assert_eq!(before.values(), vec![1]);
    assert_eq!(after.values(), vec![2]);

    counter.stop_subscription().await;
    Ok(())
}

#[tokio::test]
async fn test_store_faults_surface_without_breaking_handlers() -> anyhow::Result<()> {
    init_test_logging();
    let (store, _) = memory_factory();
    let faulty = Arc::new(FaultyStore::new(Arc::new(store.clone())));
    let factory = HandlerFactory::new(faulty.clone());
    let raw = factory.make_bytes_handler("raw");

    raw.set(&Bytes::from_static(b"v1")).await?;

    faulty.inject_fault();
    let error = raw.get().await.unwrap_err();
    assert!(error.is_retryable());
    assert!(raw.set(&Bytes::from_static(b"v2")).await.is_err());
    assert!(raw.subscribe(|_| {}).await.is_err());
    assert!(!raw.is_subscribed().await);
    assert_eq!(faulty.rejected_calls(), 3);

    faulty.heal();
    assert_eq!(raw.get().await?, Some(Bytes::from_static(b"v1")));
    assert_eq!(store.get("raw").await?, Some(Bytes::from_static(b"v1")));

    let recorder = CallbackRecorder::new();
    raw.subscribe(recorder.callback()).await?;
    raw.publish(&Bytes::from_static(b"after")).await?;
    assert!(recorder.wait_for(1, WAIT).await);

    raw.stop_subscription().await;
    Ok(())
}

#[tokio::test]
async fn test_latest_value_tracks_most_recent_frame() -> anyhow::Result<()> {
    init_test_logging();
    let (_store, factory) = memory_factory();
    let counter = factory.make_json_handler::<u32>("counter");
    assert_eq!(counter.latest(), None);

    let recorder = CallbackRecorder::new();
    counter.subscribe(recorder.callback()).await?;
    for n in 1..=3 {
        counter.publish(&n).await?;
    }

    assert!(recorder.wait_for(3, WAIT).await);
    assert_eq!(counter.latest(), Some(3));
    assert_eq!(
        counter
            .watch_latest()
            .borrow()
            .as_ref()
            .map(|f| f.channel.clone()),
        Some("counter".to_string())
    );

    counter.stop_subscription().await;
    Ok(())
}
