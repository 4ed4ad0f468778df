//! Budget-gated scheduler for speculative prefetch traffic.
//!
//! Each request is charged its estimated size when admitted. A request whose
//! cost exceeds the remaining budget stays queued in place (not an error)
//! until [`SpeculativeScheduler::reset_limit`] raises the budget or the
//! scheduler is cancelled.

use std::sync::Arc;

use super::http::{HttpScheduler, SchedulerConfig};
use super::{Priority, ResponseHandle, Scheduler, SchedulerStats, SpeculativeScheduler};
use crate::request::HttpRequest;
use crate::transport::Transport;

/// Default charge for requests that carry no size estimate.
pub const DEFAULT_COST_BYTES: u64 = 64 * 1024;

/// Settings for a speculative scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeculativeConfig {
    pub priority: Priority,
    /// Zero leaves the byte budget as the only limiter.
    pub max_concurrency: usize,
    pub default_cost_bytes: u64,
}

impl Default for SpeculativeConfig {
    fn default() -> Self {
        Self {
            priority: Priority::Speculative,
            max_concurrency: 0,
            default_cost_bytes: DEFAULT_COST_BYTES,
        }
    }
}

/// An [`HttpScheduler`] whose admission is gated by a byte budget.
pub struct SpeculativeHttpScheduler {
    inner: HttpScheduler,
}

impl SpeculativeHttpScheduler {
    pub fn new(config: SpeculativeConfig, initial_bytes: u64, transport: Arc<dyn Transport>) -> Self {
        let base = SchedulerConfig {
            priority: config.priority,
            max_concurrency: config.max_concurrency,
        };
        Self {
            inner: HttpScheduler::with_budget(base, transport, initial_bytes, config.default_cost_bytes),
        }
    }
}

impl Scheduler for SpeculativeHttpScheduler {
    fn schedule(&self, request: HttpRequest, priority: Priority) -> ResponseHandle {
        self.inner.schedule(request, priority)
    }

    fn priority(&self) -> Priority {
        self.inner.priority()
    }

    fn cancel_all(&self) {
        self.inner.cancel_all();
    }

    fn close(&self) {
        self.inner.close();
    }

    fn stats(&self) -> SchedulerStats {
        self.inner.stats()
    }
}

impl SpeculativeScheduler for SpeculativeHttpScheduler {
    fn reset_limit(&self, bytes: u64) {
        self.inner.reset_budget(bytes);
    }

    fn remaining_budget(&self) -> u64 {
        self.inner.remaining_budget().unwrap_or(0)
    }
}
