//! Telemetry: structured logging, request spans, and metrics.

mod logging;
mod metrics;
mod spans;

pub use self::logging::{init_logging, LogConfig, LogError, LogFormat, LOG_FILE, LOG_FORMAT};
pub use self::metrics::{
    record_budget, record_budget_vetoes, record_cache_coalesced, record_cache_hit,
    record_cache_miss, record_cancelled, record_executing, record_queue_depth, record_request,
};
pub use self::spans::{RequestSpan, SpanExt};
