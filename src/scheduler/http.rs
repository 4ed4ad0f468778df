//! Priority-aware HTTP scheduler.
//!
//! All mutable state (tier queues, executing table, concurrency gate, byte
//! budget) sits behind one mutex per instance. The transport runs on a
//! spawned task with that lock released; its completion re-enters the
//! scheduler, frees the slot and admits the next eligible entry.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, Instrument, Span};

use super::budget::BudgetTracker;
use super::gate::ConcurrencyGate;
use super::handle::{send, ResponseHandle, ResponseTx};
use super::priority::{Priority, PriorityQueue};
use super::{Scheduler, SchedulerStats};
use crate::error::{SchedulerError, TransportError};
use crate::request::{HttpRequest, HttpResponse};
use crate::telemetry::{self, RequestSpan, SpanExt};
use crate::transport::Transport;

/// Construction-time settings for one scheduler instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Tier used by [`Scheduler::schedule_default`].
    pub priority: Priority,
    /// Maximum simultaneously executing requests. Zero means no slot limit.
    pub max_concurrency: usize,
}

impl SchedulerConfig {
    pub fn background() -> Self {
        Self { priority: Priority::Background, max_concurrency: 1 }
    }

    pub fn user_initiated() -> Self {
        Self { priority: Priority::UserInitiated, max_concurrency: 3 }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::background()
    }
}

/// A request waiting for admission.
struct PendingEntry {
    id: u64,
    request: HttpRequest,
    cost: u64,
    /// Budget generation in which this entry was last refused.
    vetoed_in: Option<u64>,
    response_tx: ResponseTx,
}

/// A request whose transport call is running.
struct ExecutingEntry {
    priority: Priority,
    cancel: CancellationToken,
    response_tx: ResponseTx,
}

/// Work handed to a spawned transport task.
struct Dispatch {
    id: u64,
    priority: Priority,
    request: HttpRequest,
    cancel: CancellationToken,
}

struct SchedulerState {
    queue: PriorityQueue<PendingEntry>,
    executing: HashMap<u64, ExecutingEntry>,
    gate: ConcurrencyGate,
    budget: Option<BudgetTracker>,
    closed: bool,
    next_id: u64,
}

struct Shared {
    config: SchedulerConfig,
    /// Cost charged for requests without a size estimate (budgeted schedulers only).
    default_cost: u64,
    transport: Arc<dyn Transport>,
    state: Mutex<SchedulerState>,
}

/// Schedules HTTP requests by tier under a fixed concurrency limit.
///
/// `schedule` must be called from within a Tokio runtime; dispatch spawns
/// one task per admitted request.
pub struct HttpScheduler {
    shared: Arc<Shared>,
}

impl HttpScheduler {
    pub fn new(config: SchedulerConfig, transport: Arc<dyn Transport>) -> Self {
        Self::build(config, transport, None, 0)
    }

    /// A scheduler whose admission is additionally gated by a byte budget.
    pub(crate) fn with_budget(
        config: SchedulerConfig,
        transport: Arc<dyn Transport>,
        initial_bytes: u64,
        default_cost: u64,
    ) -> Self {
        Self::build(config, transport, Some(BudgetTracker::new(initial_bytes)), default_cost)
    }

    fn build(
        config: SchedulerConfig,
        transport: Arc<dyn Transport>,
        budget: Option<BudgetTracker>,
        default_cost: u64,
    ) -> Self {
        let state = SchedulerState {
            queue: PriorityQueue::new(),
            executing: HashMap::new(),
            gate: ConcurrencyGate::new(config.max_concurrency),
            budget,
            closed: false,
            next_id: 1,
        };
        Self {
            shared: Arc::new(Shared {
                config,
                default_cost,
                transport,
                state: Mutex::new(state),
            }),
        }
    }

    pub fn config(&self) -> SchedulerConfig {
        self.shared.config
    }

    /// Replace the remaining byte budget and admit anything it now covers.
    /// No-op for schedulers built without a budget.
    pub(crate) fn reset_budget(&self, bytes: u64) {
        {
            let mut state = self.shared.state.lock();
            let Some(budget) = state.budget.as_mut() else { return };
            let previous = budget.reset(bytes);
            info!(previous, remaining = bytes, "speculative budget reset");
            telemetry::record_budget(bytes);
        }
        self.shared.pump();
    }

    pub(crate) fn remaining_budget(&self) -> Option<u64> {
        self.shared.state.lock().budget.as_ref().map(BudgetTracker::remaining)
    }
}

impl Scheduler for HttpScheduler {
    fn schedule(&self, request: HttpRequest, priority: Priority) -> ResponseHandle {
        self.shared.schedule(request, priority)
    }

    fn priority(&self) -> Priority {
        self.shared.config.priority
    }

    fn cancel_all(&self) {
        self.shared.cancel_all();
    }

    fn close(&self) {
        let newly_closed = {
            let mut state = self.shared.state.lock();
            !std::mem::replace(&mut state.closed, true)
        };
        if newly_closed {
            info!(priority = self.priority().as_str(), "scheduler closed");
        }
        self.shared.cancel_all();
    }

    fn stats(&self) -> SchedulerStats {
        let state = self.shared.state.lock();
        SchedulerStats {
            priority: self.shared.config.priority,
            pending: state.queue.len(),
            executing: state.executing.len(),
            max_concurrency: state.gate.limit(),
            peak_executing: state.gate.peak(),
            remaining_budget: state.budget.as_ref().map(BudgetTracker::remaining),
            budget_charged: state.budget.as_ref().map(BudgetTracker::charged_total),
            budget_vetoes: state.budget.as_ref().map(BudgetTracker::vetoes),
            closed: state.closed,
        }
    }
}

impl Drop for HttpScheduler {
    fn drop(&mut self) {
        // Spawned tasks keep `shared` alive past the owner.
        self.shared.state.lock().closed = true;
        self.shared.cancel_all();
    }
}

/// Pop and charge the first entry the budget covers.
///
/// Entries skipped because they do not fit count as vetoes, once per entry
/// per budget generation, so repeated pumps against the same allowance do
/// not inflate the count.
fn pop_within_budget(
    queue: &mut PriorityQueue<PendingEntry>,
    budget: &mut BudgetTracker,
) -> Option<(Priority, PendingEntry)> {
    let generation = budget.generation();
    let mut refused = 0u64;
    let next = queue.pop_first_where(|entry| {
        if budget.covers(entry.cost) {
            return true;
        }
        if entry.vetoed_in != Some(generation) {
            entry.vetoed_in = Some(generation);
            refused += 1;
        }
        false
    });

    if refused > 0 {
        budget.record_vetoes(refused);
        telemetry::record_budget_vetoes(refused);
        debug!(refused, remaining = budget.remaining(), "admission deferred by budget");
    }
    if let Some((_, entry)) = &next {
        let charged = budget.try_charge(entry.cost);
        debug_assert!(charged, "eligibility checked against the same budget");
        telemetry::record_budget(budget.remaining());
    }
    next
}

impl Shared {
    fn schedule(self: &Arc<Self>, request: HttpRequest, priority: Priority) -> ResponseHandle {
        let (response_tx, handle) = ResponseHandle::channel();
        {
            let mut state = self.state.lock();
            if state.closed {
                drop(state);
                send(response_tx, Err(SchedulerError::SchedulerClosed));
                return handle;
            }
            let id = state.next_id;
            state.next_id += 1;
            let cost = request.estimated_bytes.unwrap_or(self.default_cost);
            debug!(id, priority = priority.as_str(), url = %request.url, cost, "request queued");
            state.queue.push(PendingEntry { id, request, cost, vetoed_in: None, response_tx }, priority);
            telemetry::record_queue_depth(priority, state.queue.len_of(priority));
        }
        self.pump();
        handle
    }

    /// Admit every eligible entry and spawn its transport call.
    fn pump(self: &Arc<Self>) {
        for dispatch in self.admit_ready() {
            self.spawn_execute(dispatch);
        }
    }

    fn admit_ready(&self) -> Vec<Dispatch> {
        let mut state = self.state.lock();
        let SchedulerState { queue, executing, gate, budget, closed, .. } = &mut *state;
        let mut admitted = Vec::new();
        if *closed {
            return admitted;
        }

        while gate.has_capacity() {
            let next = match budget.as_mut() {
                None => queue.pop_first_where(|_| true),
                Some(budget) => pop_within_budget(queue, budget),
            };
            let Some((priority, entry)) = next else { break };
            gate.try_acquire();

            let cancel = CancellationToken::new();
            executing.insert(
                entry.id,
                ExecutingEntry { priority, cancel: cancel.clone(), response_tx: entry.response_tx },
            );
            debug!(id = entry.id, priority = priority.as_str(), executing = gate.in_flight(), "request admitted");
            telemetry::record_queue_depth(priority, queue.len_of(priority));
            telemetry::record_executing(priority, gate.in_flight());
            admitted.push(Dispatch { id: entry.id, priority, request: entry.request, cancel });
        }
        admitted
    }

    fn spawn_execute(self: &Arc<Self>, dispatch: Dispatch) {
        let shared = Arc::clone(self);
        let span = RequestSpan::new(dispatch.id, dispatch.priority, &dispatch.request);
        tokio::spawn(
            async move {
                let Dispatch { id, request, cancel, .. } = dispatch;
                let outcome = tokio::select! {
                    biased;
                    () = cancel.cancelled() => None,
                    result = shared.transport.execute(&request) => Some(result),
                };
                if let Some(result) = outcome {
                    Span::current().record_result(&result);
                    shared.complete(id, result);
                }
            }
            .instrument(span),
        );
    }

    fn complete(self: &Arc<Self>, id: u64, result: Result<HttpResponse, TransportError>) {
        let entry = {
            let mut state = self.state.lock();
            let entry = state.executing.remove(&id);
            if entry.is_some() {
                state.gate.release();
            }
            entry
        };
        // Missing means bulk cancellation already answered this request.
        let Some(entry) = entry else { return };

        let result = result.map(Arc::new).map_err(SchedulerError::from);
        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.as_str(),
        };
        debug!(id, priority = entry.priority.as_str(), outcome, "request completed");
        telemetry::record_request(entry.priority, outcome);
        send(entry.response_tx, result);
        self.pump();
    }

    fn cancel_all(&self) {
        let (pending, executing) = {
            let mut state = self.state.lock();
            let pending = state.queue.drain();
            let executing: Vec<ExecutingEntry> =
                state.executing.drain().map(|(_, entry)| entry).collect();
            state.gate.release_all();
            (pending, executing)
        };
        let total = pending.len() + executing.len();
        if total == 0 {
            return;
        }

        info!(
            priority = self.config.priority.as_str(),
            pending = pending.len(),
            executing = executing.len(),
            "cancelling all requests"
        );
        for entry in executing {
            entry.cancel.cancel();
            send(entry.response_tx, Err(SchedulerError::Cancelled));
        }
        for entry in pending {
            send(entry.response_tx, Err(SchedulerError::Cancelled));
        }
        telemetry::record_cancelled(self.config.priority, total);
        for priority in Priority::DESCENDING {
            telemetry::record_queue_depth(priority, 0);
        }
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
