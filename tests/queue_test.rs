//! Integration tests for the work queue.
//!
//! These exercise a live Redis. Point REDIS_URL at one (defaults to
//! local dev) and run with `cargo test -- --ignored`.

use std::time::{Duration, Instant};

use conveyor::queue::{Payload, PayloadPolicy, WorkQueue};
use serde_json::json;

fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/0".to_string())
}

/// Helper: connect a queue with a unique name so tests can't see each
/// other's items.
async fn test_queue(policy: PayloadPolicy) -> WorkQueue {
    let name = format!("conveyor-test-{}", uuid::Uuid::new_v4());
    WorkQueue::connect(&redis_url(), name, policy).await.unwrap()
}

#[tokio::test]
#[ignore] // Requires running Redis
async fn enqueue_dequeue_round_trips_documents() {
    let queue = test_queue(PayloadPolicy::Strict).await;

    let item = json!({"task": "resize", "width": 800, "nested": {"a": [1, 2]}});
    queue.enqueue_work(&item).await.unwrap();

    let payload = queue
        .dequeue_work(Duration::from_secs(5))
        .await
        .unwrap()
        .expect("item");
    assert_eq!(payload, Payload::Document(item));
}

#[tokio::test]
#[ignore] // Requires running Redis
async fn dequeue_preserves_fifo_order() {
    let queue = test_queue(PayloadPolicy::Strict).await;

    for n in 0..3 {
        queue.enqueue_work(&json!({"n": n})).await.unwrap();
    }

    for n in 0..3 {
        let payload = queue
            .dequeue_work(Duration::from_secs(5))
            .await
            .unwrap()
            .expect("item");
        assert_eq!(payload.as_document().unwrap()["n"], json!(n));
    }
}

#[tokio::test]
#[ignore] // Requires running Redis
async fn dequeue_times_out_empty_handed() {
    let queue = test_queue(PayloadPolicy::Strict).await;

    let start = Instant::now();
    let payload = queue.dequeue_work(Duration::from_secs(1)).await.unwrap();
    let elapsed = start.elapsed();

    assert!(payload.is_none());
    assert!(elapsed >= Duration::from_millis(900), "returned early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(3), "blocked too long: {elapsed:?}");
}

#[tokio::test]
#[ignore] // Requires running Redis
async fn strict_enqueue_rejects_non_documents() {
    let queue = test_queue(PayloadPolicy::Strict).await;

    let err = queue.enqueue_work(&json!("bare string")).await.unwrap_err();
    assert!(matches!(err, conveyor::Error::InvalidPayload(_)));

    // Nothing was written
    let payload = queue.dequeue_work(Duration::from_secs(1)).await.unwrap();
    assert!(payload.is_none());
}

#[tokio::test]
#[ignore] // Requires running Redis
async fn repair_enqueue_round_trips_embedded_document() {
    let queue = test_queue(PayloadPolicy::Repair).await;

    queue
        .enqueue_work(&json!(r#"{"task": "ocr", "page": 3}"#))
        .await
        .unwrap();

    let payload = queue
        .dequeue_work(Duration::from_secs(5))
        .await
        .unwrap()
        .expect("item");
    assert_eq!(payload, Payload::Document(json!({"task": "ocr", "page": 3})));
}

#[tokio::test]
#[ignore] // Requires running Redis
async fn undecodable_item_comes_back_raw() {
    let queue = test_queue(PayloadPolicy::Strict).await;

    // Plant a non-JSON item directly, bypassing enqueue validation
    let client = redis::Client::open(redis_url().as_str()).unwrap();
    let mut conn = client.get_multiplexed_async_connection().await.unwrap();
    let _: () = redis::AsyncCommands::rpush(&mut conn, queue.name(), "not json {{{")
        .await
        .unwrap();

    let payload = queue
        .dequeue_work(Duration::from_secs(5))
        .await
        .unwrap()
        .expect("item");
    assert_eq!(payload, Payload::Raw("not json {{{".to_string()));
}

#[tokio::test]
#[ignore] // Requires running Redis
async fn presence_check_reports_missing_then_present() {
    let queue = test_queue(PayloadPolicy::Strict).await;

    // Fresh unique name — nothing written yet
    assert!(!queue.check_queue_presence().await.unwrap());

    queue.enqueue_work(&json!({"task": "noop"})).await.unwrap();
    assert!(queue.check_queue_presence().await.unwrap());

    // Drain so the key disappears again
    queue.dequeue_work(Duration::from_secs(5)).await.unwrap();
}
