//! Tiered HTTP request scheduling.
//!
//! Outbound requests are split into three tiers so user-visible work is
//! never starved by background refreshes or speculative prefetching.
//!
//! # Layers
//!
//! - [`scheduler::HttpScheduler`]: strict-priority tier queues behind a
//!   fixed concurrency limit, FIFO within a tier.
//! - [`scheduler::SpeculativeHttpScheduler`]: adds a byte budget. Requests
//!   the budget cannot cover wait in place until it is reset.
//! - [`scheduler::CachingHttpScheduler`]: coalesces identical concurrent
//!   requests into one transport call and serves completed responses from
//!   memory.
//!
//! [`set::SchedulerSet`] wires the background, user-initiated and
//! speculative instances together and reacts to host lifecycle events.
//!
//! # Boundaries
//!
//! - Transport: injected through [`transport::Transport`]; never retried here.
//! - Network classification: injected through [`probe::DataLimitProbe`].
//! - Persistence: none. Caches live for the process lifetime.

pub mod cli;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod probe;
pub mod request;
pub mod scheduler;
pub mod set;
pub mod telemetry;
pub mod transport;

#[cfg(test)]
mod testing;

pub use error::{SchedulerError, TransportError};
pub use lifecycle::{lifecycle_channel, LifecycleEvent, LifecycleTargets};
pub use probe::{DataLimitProbe, FixedDataLimit, NetworkProfile, ProfileProbe};
pub use request::{CacheKey, HttpRequest, HttpResponse, Method};
pub use scheduler::{
    CacheConfig, CachingHttpScheduler, HttpScheduler, Priority, ResponseHandle, ScheduleResult,
    Scheduler, SchedulerConfig, SchedulerStats, SpeculativeConfig, SpeculativeHttpScheduler,
    SpeculativeScheduler,
};
pub use set::{SchedulerSet, SchedulerSetConfig};
pub use transport::{FnTransport, Transport};
