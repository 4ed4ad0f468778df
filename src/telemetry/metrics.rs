//! Metrics recorded through the `metrics` facade.
//!
//! No exporter is installed here; the host process chooses a recorder.
//! Without one, every call is a no-op.

use crate::scheduler::Priority;

pub fn record_queue_depth(priority: Priority, depth: usize) {
    metrics::gauge!("tiered_http_queue_depth", "priority" => priority.as_str()).set(depth as f64);
}

pub fn record_executing(priority: Priority, executing: usize) {
    metrics::gauge!("tiered_http_executing", "priority" => priority.as_str())
        .set(executing as f64);
}

/// Count a finished request. `outcome` is `ok` or a `SchedulerError` label.
pub fn record_request(priority: Priority, outcome: &'static str) {
    metrics::counter!(
        "tiered_http_requests_total",
        "priority" => priority.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_cancelled(priority: Priority, count: usize) {
    metrics::counter!("tiered_http_cancelled_total", "priority" => priority.as_str())
        .increment(count as u64);
}

pub fn record_budget(remaining: u64) {
    metrics::gauge!("tiered_http_budget_remaining_bytes").set(remaining as f64);
}

/// Count requests newly refused admission by the byte budget.
pub fn record_budget_vetoes(count: u64) {
    metrics::counter!("tiered_http_budget_vetoes_total").increment(count);
}

pub fn record_cache_hit() {
    metrics::counter!("tiered_http_cache_hits_total").increment(1);
}

pub fn record_cache_coalesced() {
    metrics::counter!("tiered_http_cache_coalesced_total").increment(1);
}

pub fn record_cache_miss() {
    metrics::counter!("tiered_http_cache_misses_total").increment(1);
}
