// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI subcommands for inspecting scheduler configuration.
//!
//! Every command reads the environment directly; nothing here needs a
//! running scheduler.
//!
//! ## Usage
//!
//! ```bash
//! tiered-http config show       # Effective values after env overrides
//! tiered-http config defaults   # Documented defaults
//! tiered-http config validate   # Warn on suspicious settings
//! tiered-http limits [--json]   # Speculative quota per network profile
//! ```

pub mod config_cmd;
pub mod limits_cmd;

/// Returns true when `flag` appears anywhere after the subcommand.
pub fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().skip(2).any(|arg| arg == flag)
}
