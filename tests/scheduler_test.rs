//! Integration tests for the tiered scheduler.

mod common;

use std::sync::Arc;

use common::{eventually, resolve, ScriptedTransport};
use tiered_http::scheduler::PriorityQueue;
use tiered_http::{HttpRequest, HttpScheduler, Priority, Scheduler, SchedulerConfig, SchedulerError};

fn scheduler(max_concurrency: usize, transport: &Arc<ScriptedTransport>) -> HttpScheduler {
    HttpScheduler::new(
        SchedulerConfig { priority: Priority::Background, max_concurrency },
        transport.clone(),
    )
}

#[test]
fn priority_queue_orders_by_tier() {
    let mut queue: PriorityQueue<&str> = PriorityQueue::new();

    queue.push("speculative", Priority::Speculative);
    queue.push("user", Priority::UserInitiated);
    queue.push("background", Priority::Background);

    assert_eq!(queue.pop(), Some("user"));
    assert_eq!(queue.pop(), Some("background"));
    assert_eq!(queue.pop(), Some("speculative"));
    assert_eq!(queue.pop(), None);
}

#[test]
fn priority_queue_fifo_within_same_tier() {
    let mut queue: PriorityQueue<&str> = PriorityQueue::new();

    queue.push("first", Priority::Background);
    queue.push("second", Priority::Background);
    queue.push("third", Priority::Background);

    assert_eq!(queue.pop(), Some("first"));
    assert_eq!(queue.pop(), Some("second"));
    assert_eq!(queue.pop(), Some("third"));
}

#[tokio::test]
async fn executing_never_exceeds_max_concurrency() {
    let transport = ScriptedTransport::gated();
    let sched = scheduler(3, &transport);

    let handles: Vec<_> = (0..20)
        .map(|i| sched.schedule_default(HttpRequest::get(format!("r{i}"))))
        .collect();
    transport.wait_for_calls(3).await;

    let stats = sched.stats();
    assert_eq!(stats.executing, 3);
    assert_eq!(stats.pending, 17);

    transport.release(20);
    for handle in handles {
        resolve(handle).await.unwrap();
    }
    assert_eq!(transport.call_count(), 20);
    assert!(transport.peak() <= 3);
    assert_eq!(sched.stats().peak_executing, 3);
}

#[tokio::test]
async fn higher_tier_dispatches_first_when_slot_frees() {
    let transport = ScriptedTransport::gated();
    let sched = scheduler(1, &transport);

    let r1 = sched.schedule(HttpRequest::get("R1"), Priority::UserInitiated);
    let r2 = sched.schedule(HttpRequest::get("R2"), Priority::Background);
    let r3 = sched.schedule(HttpRequest::get("R3"), Priority::UserInitiated);

    transport.release(3);
    for handle in [r1, r2, r3] {
        resolve(handle).await.unwrap();
    }
    assert_eq!(transport.calls(), vec!["R1", "R3", "R2"]);
}

#[tokio::test]
async fn cancel_all_resolves_every_outstanding_handle() {
    let transport = ScriptedTransport::gated();
    let sched = scheduler(2, &transport);

    let handles: Vec<_> = (0..5)
        .map(|i| sched.schedule_default(HttpRequest::get(format!("r{i}"))))
        .collect();
    transport.wait_for_calls(2).await;

    sched.cancel_all();

    let stats = sched.stats();
    assert_eq!((stats.pending, stats.executing), (0, 0));
    for handle in handles {
        assert_eq!(resolve(handle).await, Err(SchedulerError::Cancelled));
    }
    // Cancelled transport futures are dropped.
    eventually(|| transport.active() == 0).await;
}

#[tokio::test]
async fn dropped_handle_does_not_leak_slot() {
    let transport = ScriptedTransport::gated();
    let sched = scheduler(1, &transport);

    drop(sched.schedule_default(HttpRequest::get("abandoned")));
    let next = sched.schedule_default(HttpRequest::get("next"));

    transport.release(2);
    assert!(resolve(next).await.is_ok());
    assert_eq!(transport.calls(), vec!["abandoned", "next"]);
}

#[tokio::test]
async fn failure_is_delivered_and_not_retried() {
    let transport = ScriptedTransport::immediate();
    transport.fail("flaky");
    let sched = scheduler(1, &transport);

    let err = resolve(sched.schedule_default(HttpRequest::get("flaky"))).await.unwrap_err();
    assert!(err.is_transport());
    assert_eq!(err.to_string(), "Transport failed: unavailable: flaky");
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn close_rejects_new_work() {
    let transport = ScriptedTransport::immediate();
    let sched = scheduler(1, &transport);

    sched.close();
    let err = resolve(sched.schedule_default(HttpRequest::get("late"))).await.unwrap_err();
    assert_eq!(err, SchedulerError::SchedulerClosed);
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn transport_bookkeeping_holds_under_parallel_dispatch() {
    let transport = ScriptedTransport::immediate();
    transport.fail("r3");
    let sched = scheduler(4, &transport);

    let handles: Vec<_> = (0..16)
        .map(|i| sched.schedule_default(HttpRequest::get(format!("r{i}"))))
        .collect();
    let results = futures::future::join_all(handles.into_iter().map(resolve)).await;

    assert_eq!(transport.call_count(), 16);
    assert_eq!(results.iter().filter(|r| r.is_err()).count(), 1);
    assert!(transport.peak() <= 4);
    assert!(transport.calls().contains(&"r3".to_string()));
}
