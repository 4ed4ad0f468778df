//! Host lifecycle signals.
//!
//! The host publishes [`LifecycleEvent`]s on a broadcast channel. A listener
//! task cancels every scheduler when the host is about to suspend and
//! re-probes the speculative budget on resume or connectivity change.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::probe::DataLimitProbe;
use crate::scheduler::{Scheduler, SpeculativeScheduler};

/// Signals emitted by the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The host is about to be suspended and should persist state.
    Suspending,
    /// The host resumed or was unpaused.
    Resuming,
    ConnectivityChanged,
}

/// Create the channel a host publishes lifecycle events on.
pub fn lifecycle_channel(capacity: usize) -> broadcast::Sender<LifecycleEvent> {
    broadcast::channel(capacity.max(1)).0
}

/// Schedulers affected by lifecycle events.
#[derive(Clone)]
pub struct LifecycleTargets {
    /// Cancelled on [`LifecycleEvent::Suspending`].
    pub schedulers: Vec<Arc<dyn Scheduler>>,
    /// Budget re-probed on resume and connectivity change. Also cancelled on suspend.
    pub speculative: Option<Arc<dyn SpeculativeScheduler>>,
    pub probe: Arc<dyn DataLimitProbe>,
}

impl LifecycleTargets {
    /// Apply one event synchronously.
    pub fn apply(&self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::Suspending => {
                tracing::info!(schedulers = self.schedulers.len(), "suspending: cancelling schedulers");
                for scheduler in &self.schedulers {
                    scheduler.cancel_all();
                }
                if let Some(speculative) = &self.speculative {
                    speculative.cancel_all();
                }
            }
            LifecycleEvent::Resuming | LifecycleEvent::ConnectivityChanged => {
                if let Some(speculative) = &self.speculative {
                    let limit = self.probe.data_limit();
                    tracing::info!(?event, limit, "resetting speculative budget");
                    speculative.reset_limit(limit);
                }
            }
        }
    }
}

/// Spawn the listener. It exits when the channel closes or `shutdown` fires.
pub fn spawn_lifecycle_listener(
    mut events: broadcast::Receiver<LifecycleEvent>,
    targets: LifecycleTargets,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => {
                    tracing::info!("lifecycle listener: shutdown signal received");
                    break;
                }
                received = events.recv() => match received {
                    Ok(event) => targets.apply(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "lifecycle listener lagged; events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
    })
}
