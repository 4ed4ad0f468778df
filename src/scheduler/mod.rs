//! Request scheduling.
//!
//! Three layers compose through the [`Scheduler`] trait:
//! [`HttpScheduler`] (tier queues + concurrency gate),
//! [`SpeculativeHttpScheduler`] (adds a byte budget), and
//! [`CachingHttpScheduler`] (single-flight coalescing and result caching in
//! front of either).

mod budget;
mod caching;
mod gate;
mod handle;
mod http;
mod priority;
mod speculative;

use std::sync::Arc;

use serde::Serialize;

use crate::request::HttpRequest;

pub use budget::BudgetTracker;
pub use caching::{CacheConfig, CacheStats, CachedResponse, CachingHttpScheduler};
pub use gate::ConcurrencyGate;
pub use handle::{ResponseHandle, ScheduleResult};
pub use http::{HttpScheduler, SchedulerConfig};
pub use priority::{Priority, PriorityQueue};
pub use speculative::{SpeculativeConfig, SpeculativeHttpScheduler};

/// Point-in-time view of one scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchedulerStats {
    /// Configured default tier.
    pub priority: Priority,
    pub pending: usize,
    pub executing: usize,
    /// Zero when the scheduler has no slot limit.
    pub max_concurrency: usize,
    pub peak_executing: usize,
    /// Present only for budgeted schedulers, as are the two budget counters below.
    pub remaining_budget: Option<u64>,
    /// Bytes charged since construction, across resets.
    pub budget_charged: Option<u64>,
    /// Requests refused admission, counted once per request per budget reset.
    pub budget_vetoes: Option<u64>,
    pub closed: bool,
}

/// Capability shared by every scheduler layer.
pub trait Scheduler: Send + Sync {
    /// Queue `request` under `priority`. Never blocks; the handle resolves
    /// once the request completes, fails, or is cancelled.
    fn schedule(&self, request: HttpRequest, priority: Priority) -> ResponseHandle;

    /// The tier this instance was configured for.
    fn priority(&self) -> Priority;

    /// Schedule under the configured tier.
    fn schedule_default(&self, request: HttpRequest) -> ResponseHandle {
        self.schedule(request, self.priority())
    }

    /// Fail every pending and executing request with `Cancelled`. Idempotent.
    fn cancel_all(&self);

    /// Reject further submissions with `SchedulerClosed`, then cancel everything.
    fn close(&self);

    fn stats(&self) -> SchedulerStats;
}

/// A scheduler whose admission is gated by a resettable byte budget.
pub trait SpeculativeScheduler: Scheduler {
    /// Replace the remaining budget; entries it now covers are admitted
    /// without re-submission.
    fn reset_limit(&self, bytes: u64);

    fn remaining_budget(&self) -> u64;
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
    fn schedule(&self, request: HttpRequest, priority: Priority) -> ResponseHandle {
        (**self).schedule(request, priority)
    }

    fn priority(&self) -> Priority {
        (**self).priority()
    }

    fn cancel_all(&self) {
        (**self).cancel_all()
    }

    fn close(&self) {
        (**self).close()
    }

    fn stats(&self) -> SchedulerStats {
        (**self).stats()
    }
}

impl<S: SpeculativeScheduler + ?Sized> SpeculativeScheduler for Arc<S> {
    fn reset_limit(&self, bytes: u64) {
        (**self).reset_limit(bytes)
    }

    fn remaining_budget(&self) -> u64 {
        (**self).remaining_budget()
    }
}
