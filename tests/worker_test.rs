//! Integration tests for the worker harness.
//!
//! These exercise a live Redis. The producer uses its own connection —
//! a blocking dequeue occupies the consumer's.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use conveyor::queue::{Payload, PayloadPolicy, WorkQueue};
use conveyor::worker::Worker;
use serde_json::json;

fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/0".to_string())
}

async fn queue_pair() -> (WorkQueue, WorkQueue) {
    let name = format!("conveyor-test-{}", uuid::Uuid::new_v4());
    let consumer = WorkQueue::connect(&redis_url(), &name, PayloadPolicy::Strict)
        .await
        .unwrap();
    let producer = WorkQueue::connect(&redis_url(), &name, PayloadPolicy::Strict)
        .await
        .unwrap();
    (consumer, producer)
}

/// Wait until `seen` holds `want` items, or panic after ~5s.
async fn wait_for_items(seen: &Arc<Mutex<Vec<i64>>>, want: usize) {
    for _ in 0..100 {
        if seen.lock().unwrap().len() >= want {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("worker never processed {want} item(s): {:?}", seen.lock().unwrap());
}

#[tokio::test]
#[ignore] // Requires running Redis
async fn handler_failure_does_not_stop_the_loop() {
    let (consumer, producer) = queue_pair().await;

    let worker = Worker::new(consumer);
    let seen: Arc<Mutex<Vec<i64>>> = Arc::new(Mutex::new(Vec::new()));

    let run = {
        let worker = worker.clone();
        let seen = seen.clone();
        tokio::spawn(async move {
            worker
                .run(move |payload: Payload| {
                    let seen = seen.clone();
                    async move {
                        let doc = payload.as_document().expect("document").clone();
                        let n = doc["n"].as_i64().unwrap();
                        seen.lock().unwrap().push(n);
                        if n == 0 {
                            Err("simulated processing failure".to_string())
                        } else {
                            Ok(())
                        }
                    }
                })
                .await
        })
    };

    // Item 0 makes the handler fail; item 1 must still be processed
    producer.enqueue_work(&json!({"n": 0})).await.unwrap();
    producer.enqueue_work(&json!({"n": 1})).await.unwrap();

    wait_for_items(&seen, 2).await;
    assert_eq!(*seen.lock().unwrap(), vec![0, 1]);

    worker.shutdown();
    run.await.unwrap().unwrap();
}

#[tokio::test]
#[ignore] // Requires running Redis
async fn shutdown_stops_an_idle_worker() {
    let (consumer, _) = queue_pair().await;

    let worker = Worker::new(consumer);
    let run = {
        let worker = worker.clone();
        tokio::spawn(async move {
            worker
                .run(|_payload| async move { Ok::<(), String>(()) })
                .await
        })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    worker.shutdown();

    let result = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("worker did not shut down");
    result.unwrap().unwrap();
}
