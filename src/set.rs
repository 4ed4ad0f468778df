//! The three process-wide schedulers and their wiring.
//!
//! Built once at startup from explicit configuration. The speculative
//! scheduler's initial budget comes from the injected probe.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{self, EnvConfig};
use crate::lifecycle::{spawn_lifecycle_listener, LifecycleEvent, LifecycleTargets};
use crate::probe::DataLimitProbe;
use crate::scheduler::{
    CacheConfig, CachingHttpScheduler, HttpScheduler, Priority, Scheduler, SchedulerConfig,
    SchedulerStats, SpeculativeConfig, SpeculativeHttpScheduler, SpeculativeScheduler,
};
use crate::transport::Transport;

/// Configuration for all three schedulers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSetConfig {
    pub background: SchedulerConfig,
    pub user_initiated: SchedulerConfig,
    pub speculative: SpeculativeConfig,
    pub cache: CacheConfig,
}

impl Default for SchedulerSetConfig {
    fn default() -> Self {
        Self {
            background: SchedulerConfig::background(),
            user_initiated: SchedulerConfig::user_initiated(),
            speculative: SpeculativeConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

pub type CachedScheduler = CachingHttpScheduler<HttpScheduler>;
pub type CachedSpeculativeScheduler = CachingHttpScheduler<SpeculativeHttpScheduler>;

/// Background, user-initiated and speculative schedulers, each behind its own cache.
pub struct SchedulerSet {
    background: Arc<CachedScheduler>,
    user_initiated: Arc<CachedScheduler>,
    speculative: Arc<CachedSpeculativeScheduler>,
    probe: Arc<dyn DataLimitProbe>,
}

impl SchedulerSet {
    pub fn new(
        config: SchedulerSetConfig,
        transport: Arc<dyn Transport>,
        probe: Arc<dyn DataLimitProbe>,
    ) -> Self {
        let background = CachingHttpScheduler::with_config(
            HttpScheduler::new(config.background, Arc::clone(&transport)),
            config.cache,
        );
        let user_initiated = CachingHttpScheduler::with_config(
            HttpScheduler::new(config.user_initiated, Arc::clone(&transport)),
            config.cache,
        );
        let initial_budget = probe.data_limit();
        let speculative = CachingHttpScheduler::with_config(
            SpeculativeHttpScheduler::new(config.speculative, initial_budget, transport),
            config.cache,
        );
        tracing::info!(
            background = config.background.max_concurrency,
            user_initiated = config.user_initiated.max_concurrency,
            speculative_budget = initial_budget,
            "scheduler set initialized"
        );

        Self {
            background: Arc::new(background),
            user_initiated: Arc::new(user_initiated),
            speculative: Arc::new(speculative),
            probe,
        }
    }

    /// Build from loaded configuration. A configured data limit replaces the
    /// network quota for the initial budget and every later reset.
    pub fn from_config(
        config: &EnvConfig,
        transport: Arc<dyn Transport>,
        network_limit: Arc<dyn DataLimitProbe>,
    ) -> Self {
        Self::new(config.schedulers, transport, config.limit_source(network_limit))
    }

    /// Build from the `TIERED_HTTP_*` environment.
    pub fn from_env(transport: Arc<dyn Transport>, network_limit: Arc<dyn DataLimitProbe>) -> Self {
        Self::from_config(&config::load(), transport, network_limit)
    }

    pub fn background(&self) -> &Arc<CachedScheduler> {
        &self.background
    }

    pub fn user_initiated(&self) -> &Arc<CachedScheduler> {
        &self.user_initiated
    }

    pub fn speculative(&self) -> &Arc<CachedSpeculativeScheduler> {
        &self.speculative
    }

    /// The scheduler registered for `priority`.
    pub fn for_priority(&self, priority: Priority) -> Arc<dyn Scheduler> {
        match priority {
            Priority::UserInitiated => self.user_initiated.clone(),
            Priority::Background => self.background.clone(),
            Priority::Speculative => self.speculative.clone(),
        }
    }

    /// Cancel outstanding work on all three schedulers.
    pub fn cancel_all(&self) {
        self.background.cancel_all();
        self.user_initiated.cancel_all();
        self.speculative.cancel_all();
    }

    /// Re-probe the data limit and apply it to the speculative scheduler.
    pub fn reset_speculative_limit(&self) -> u64 {
        let limit = self.probe.data_limit();
        self.speculative.reset_limit(limit);
        limit
    }

    pub fn close(&self) {
        self.background.close();
        self.user_initiated.close();
        self.speculative.close();
    }

    /// Stats for every scheduler, highest tier first.
    pub fn stats(&self) -> Vec<SchedulerStats> {
        vec![
            self.user_initiated.stats(),
            self.background.stats(),
            self.speculative.stats(),
        ]
    }

    pub fn lifecycle_targets(&self) -> LifecycleTargets {
        let background: Arc<dyn Scheduler> = self.background.clone();
        let user_initiated: Arc<dyn Scheduler> = self.user_initiated.clone();
        LifecycleTargets {
            schedulers: vec![background, user_initiated],
            speculative: Some(self.speculative.clone()),
            probe: Arc::clone(&self.probe),
        }
    }

    /// Subscribe to host lifecycle events until `shutdown` fires.
    pub fn attach_lifecycle(
        &self,
        events: &broadcast::Sender<LifecycleEvent>,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        spawn_lifecycle_listener(events.subscribe(), self.lifecycle_targets(), shutdown)
    }
}
