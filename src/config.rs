//! Runtime configuration loading from environment variables.
//!
//! All configuration values are loaded from `TIERED_HTTP_*` environment
//! variables with sensible defaults. Invalid values fall back to defaults
//! without crashing.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `TIERED_HTTP_BACKGROUND_CONCURRENCY` | 1 | Background slot limit |
//! | `TIERED_HTTP_USER_INITIATED_CONCURRENCY` | 3 | User-initiated slot limit |
//! | `TIERED_HTTP_SPECULATIVE_CONCURRENCY` | 0 | Speculative slot limit (0 = budget only) |
//! | `TIERED_HTTP_SPECULATIVE_DEFAULT_COST` | 65536 | Charge for requests without an estimate (bytes) |
//! | `TIERED_HTTP_CACHE_MAX_ENTRIES` | 0 | Completed entries kept per cache (0 = unbounded) |
//! | `TIERED_HTTP_DATA_LIMIT` | unset | Fixed speculative quota overriding the probe (bytes) |

use std::sync::Arc;

use serde::Serialize;

use crate::probe::{DataLimitProbe, FixedDataLimit};
use crate::scheduler::{CacheConfig, SchedulerConfig, SpeculativeConfig};
use crate::set::SchedulerSetConfig;

pub const BACKGROUND_CONCURRENCY: &str = "TIERED_HTTP_BACKGROUND_CONCURRENCY";
pub const USER_INITIATED_CONCURRENCY: &str = "TIERED_HTTP_USER_INITIATED_CONCURRENCY";
pub const SPECULATIVE_CONCURRENCY: &str = "TIERED_HTTP_SPECULATIVE_CONCURRENCY";
pub const SPECULATIVE_DEFAULT_COST: &str = "TIERED_HTTP_SPECULATIVE_DEFAULT_COST";
pub const CACHE_MAX_ENTRIES: &str = "TIERED_HTTP_CACHE_MAX_ENTRIES";
pub const DATA_LIMIT: &str = "TIERED_HTTP_DATA_LIMIT";

/// Every variable this module reads, in documentation order.
pub const ENV_KEYS: &[&str] = &[
    BACKGROUND_CONCURRENCY,
    USER_INITIATED_CONCURRENCY,
    SPECULATIVE_CONCURRENCY,
    SPECULATIVE_DEFAULT_COST,
    CACHE_MAX_ENTRIES,
    DATA_LIMIT,
];

/// Effective runtime configuration summary (serializable).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveConfig {
    pub background_concurrency: usize,
    pub user_initiated_concurrency: usize,
    pub speculative_concurrency: usize,
    pub speculative_default_cost: u64,
    pub cache_max_entries: usize,
    pub data_limit: Option<u64>,
}

/// All runtime configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    pub schedulers: SchedulerSetConfig,
    /// Overrides the network probe when set.
    pub data_limit: Option<u64>,
}

/// Parse a `usize` env var, returning `default` on missing or invalid.
fn parse_usize(key: &str, default: usize) -> usize {
    match std::env::var(key) {
        Ok(val) => val.trim().parse::<usize>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Parse a `u64` env var, returning `default` on missing or invalid.
fn parse_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(val) => val.trim().parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Parse an optional `u64` env var; invalid values count as unset.
fn parse_optional_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|val| val.trim().parse::<u64>().ok())
}

fn load_scheduler_config(key: &str, base: SchedulerConfig) -> SchedulerConfig {
    let max_concurrency = parse_usize(key, base.max_concurrency).max(1);
    SchedulerConfig { max_concurrency, ..base }
}

fn load_speculative_config() -> SpeculativeConfig {
    let defaults = SpeculativeConfig::default();
    let max_concurrency = parse_usize(SPECULATIVE_CONCURRENCY, defaults.max_concurrency);
    let default_cost_bytes = parse_u64(SPECULATIVE_DEFAULT_COST, defaults.default_cost_bytes);
    SpeculativeConfig { max_concurrency, default_cost_bytes, ..defaults }
}

/// Load all configuration from environment variables.
///
/// Missing or invalid values fall back to safe defaults without panicking.
pub fn load() -> EnvConfig {
    let schedulers = SchedulerSetConfig {
        background: load_scheduler_config(BACKGROUND_CONCURRENCY, SchedulerConfig::background()),
        user_initiated: load_scheduler_config(
            USER_INITIATED_CONCURRENCY,
            SchedulerConfig::user_initiated(),
        ),
        speculative: load_speculative_config(),
        cache: CacheConfig { max_entries: parse_usize(CACHE_MAX_ENTRIES, 0) },
    };
    EnvConfig { schedulers, data_limit: parse_optional_u64(DATA_LIMIT) }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self { schedulers: SchedulerSetConfig::default(), data_limit: None }
    }
}

impl EnvConfig {
    /// Where the speculative budget comes from: a fixed quota when
    /// `TIERED_HTTP_DATA_LIMIT` is set, `fallback` otherwise.
    pub fn limit_source(&self, fallback: Arc<dyn DataLimitProbe>) -> Arc<dyn DataLimitProbe> {
        match self.data_limit {
            Some(bytes) => {
                tracing::info!(bytes, "fixed data limit configured");
                Arc::new(FixedDataLimit(bytes))
            }
            None => fallback,
        }
    }

    /// Return a serializable summary of all effective values.
    pub fn effective_config(&self) -> EffectiveConfig {
        EffectiveConfig {
            background_concurrency: self.schedulers.background.max_concurrency,
            user_initiated_concurrency: self.schedulers.user_initiated.max_concurrency,
            speculative_concurrency: self.schedulers.speculative.max_concurrency,
            speculative_default_cost: self.schedulers.speculative.default_cost_bytes,
            cache_max_entries: self.schedulers.cache.max_entries,
            data_limit: self.data_limit,
        }
    }
}
