// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Config CLI subcommands: show, defaults, validate.
//!
//! These commands read configuration directly from environment variables.

use crate::config::{self, EffectiveConfig, EnvConfig};

/// Print effective config as key-value pairs to stdout.
pub fn run_show() {
    let cfg = config::load().effective_config();
    print!("{}", render(&cfg));
}

/// Print default config values (no env overrides) to stdout.
pub fn run_defaults() {
    print!("{}", render(&EnvConfig::default().effective_config()));
}

/// Validate configuration for obvious misconfigurations.
///
/// Returns 0 if valid, 1 if any warnings are found.
pub fn run_validate() -> i32 {
    let warnings = validate(&config::load().effective_config());
    if warnings.is_empty() {
        println!("Configuration is valid.");
        0
    } else {
        for warning in &warnings {
            eprintln!("WARNING: {}", warning);
        }
        1
    }
}

/// Collect warnings for settings that load fine but will misbehave.
pub fn validate(cfg: &EffectiveConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if cfg.speculative_default_cost == 0 {
        warnings.push(format!(
            "{} is 0; requests without an estimate will never consume budget",
            config::SPECULATIVE_DEFAULT_COST
        ));
    }

    if cfg.data_limit == Some(0) {
        warnings.push(format!(
            "{} is 0; speculative requests will stay pending",
            config::DATA_LIMIT
        ));
    }

    if let Some(limit) = cfg.data_limit {
        if limit > 0 && cfg.speculative_default_cost > limit {
            warnings.push(format!(
                "{} ({}) exceeds {} ({}); unestimated requests can never be admitted",
                config::SPECULATIVE_DEFAULT_COST,
                cfg.speculative_default_cost,
                config::DATA_LIMIT,
                limit
            ));
        }
    }

    warnings
}

fn render(cfg: &EffectiveConfig) -> String {
    let data_limit = cfg.data_limit.map(|v| v.to_string()).unwrap_or_default();
    format!(
        "{}={}\n{}={}\n{}={}\n{}={}\n{}={}\n{}={}\n",
        config::BACKGROUND_CONCURRENCY,
        cfg.background_concurrency,
        config::USER_INITIATED_CONCURRENCY,
        cfg.user_initiated_concurrency,
        config::SPECULATIVE_CONCURRENCY,
        cfg.speculative_concurrency,
        config::SPECULATIVE_DEFAULT_COST,
        cfg.speculative_default_cost,
        config::CACHE_MAX_ENTRIES,
        cfg.cache_max_entries,
        config::DATA_LIMIT,
        data_limit,
    )
}
