//! Job dispatch pass: backpressure and publish behavior

mod common;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::Semaphore;
use uuid::Uuid;

use common::{RecordingHandler, active_job, descriptor_file, framework_for, register_ok, wait_until};
use hive_bus::{JobQueue, MemoryBus, job_queue_name};
use hive_framework::store::MemoryJobStore;

#[tokio::test]
async fn publishes_one_reference_per_active_job() {
    let bus = MemoryBus::new();
    let store = MemoryJobStore::new();
    register_ok(&bus, Uuid::new_v4());

    let gate = Arc::new(Semaphore::new(0));
    let handler = Arc::new(RecordingHandler::new("alpha").gated(Arc::clone(&gate)));
    let framework = framework_for(handler.clone(), &bus, &store);
    let descriptor = descriptor_file("dc1");
    assert!(framework.register(descriptor.path()).await);

    let first = active_job("dc1");
    let second = active_job("dc1");
    let stopped = active_job("dc1");
    let elsewhere = active_job("dc2");

    store.insert(first.clone(), "alpha");
    store.insert(second.clone(), "alpha");
    store.insert(stopped.clone(), "alpha");
    store.insert(elsewhere, "alpha");
    store.stop_job(stopped.id);

    framework.publish_jobs().await;

    // Exactly two references in flight, one per active job.
    let queue = job_queue_name("alpha");
    assert_eq!(bus.depth(&queue).await.unwrap(), 2);

    gate.add_permits(2);
    assert!(
        wait_until(
            || handler.processed_jobs().len() == 2,
            Duration::from_secs(2)
        )
        .await
    );

    let processed: HashSet<Uuid> = handler.processed_jobs().into_iter().collect();
    assert_eq!(processed, HashSet::from([first.id, second.id]));
    assert!(wait_for_depth(&bus, &queue, 0).await);

    framework.stop().await;
}

// Poll the queue until it reaches the expected depth.
async fn wait_for_depth(bus: &MemoryBus, queue: &str, expected: u64) -> bool {
    for _ in 0..200 {
        if bus.depth(queue).await.unwrap_or(u64::MAX) == expected {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn nonzero_depth_skips_store_and_publish() {
    let bus = MemoryBus::new();
    let store = MemoryJobStore::new();
    register_ok(&bus, Uuid::new_v4());

    let gate = Arc::new(Semaphore::new(0));
    let handler = Arc::new(RecordingHandler::new("beta").gated(Arc::clone(&gate)));
    let framework = framework_for(handler, &bus, &store);
    let descriptor = descriptor_file("dc1");
    assert!(framework.register(descriptor.path()).await);

    let queue = job_queue_name("beta");
    for _ in 0..3 {
        JobQueue::publish(&bus, &queue, json!({ "job_id": Uuid::new_v4() }))
            .await
            .unwrap();
    }
    assert_eq!(bus.depth(&queue).await.unwrap(), 3);

    store.insert(active_job("dc1"), "beta");
    let baseline = store.query_count();

    framework.publish_jobs().await;

    // The pass returned without touching the store or the queue.
    assert_eq!(store.query_count(), baseline);
    assert_eq!(bus.depth(&queue).await.unwrap(), 3);

    // Unblock the handler so the consumer can drain and stop.
    gate.add_permits(10);
    framework.stop().await;
}

#[tokio::test]
async fn depth_check_failure_aborts_pass_and_loop_survives() {
    let bus = MemoryBus::new();
    let store = MemoryJobStore::new();
    register_ok(&bus, Uuid::new_v4());

    let gate = Arc::new(Semaphore::new(0));
    let handler = Arc::new(RecordingHandler::new("gamma").gated(Arc::clone(&gate)));
    let framework = framework_for(handler, &bus, &store);
    let descriptor = descriptor_file("dc1");
    assert!(framework.register(descriptor.path()).await);

    store.insert(active_job("dc1"), "gamma");
    let baseline = store.query_count();

    // Broker-side queue deletion makes the passive check fail.
    bus.remove_queue(&job_queue_name("gamma"));
    framework.publish_jobs().await;
    assert_eq!(store.query_count(), baseline);

    // The next pass works again once the queue is back.
    bus.declare_queue(&job_queue_name("gamma"));
    framework.publish_jobs().await;
    assert_eq!(store.query_count(), baseline + 1);
    assert_eq!(bus.depth(&job_queue_name("gamma")).await.unwrap(), 1);

    // Unblock the handler so the consumer can drain and stop.
    gate.add_permits(10);
    framework.stop().await;
}

#[tokio::test]
async fn publish_failure_aborts_pass_without_panicking() {
    let bus = MemoryBus::new();
    let store = MemoryJobStore::new();
    register_ok(&bus, Uuid::new_v4());

    let handler = Arc::new(RecordingHandler::new("delta"));
    let framework = framework_for(handler.clone(), &bus, &store);
    let descriptor = descriptor_file("dc1");
    assert!(framework.register(descriptor.path()).await);

    store.insert(active_job("dc1"), "delta");

    bus.close();
    framework.publish_jobs().await;

    assert!(handler.processed_jobs().is_empty());
    framework.stop().await;
}
