// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! `limits` subcommand: the speculative quota for each network profile.

use serde::Serialize;

use crate::config;
use crate::probe::NetworkProfile;

#[derive(Debug, Serialize)]
pub struct ProfileLimit {
    pub profile: NetworkProfile,
    pub name: &'static str,
    pub data_limit: u64,
}

/// Snapshot of every profile and its quota.
pub fn profile_limits() -> Vec<ProfileLimit> {
    NetworkProfile::ALL
        .iter()
        .map(|profile| ProfileLimit {
            profile: *profile,
            name: profile.as_str(),
            data_limit: profile.data_limit(),
        })
        .collect()
}

/// Print the quota table. Returns the process exit code.
pub fn run_limits(json_output: bool) -> i32 {
    let limits = profile_limits();
    let override_limit = config::load().data_limit;

    if json_output {
        let body = serde_json::json!({
            "profiles": limits,
            "override": override_limit,
        });
        match serde_json::to_string_pretty(&body) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Failed to serialize limits: {}", e);
                return 1;
            }
        }
        return 0;
    }

    println!("{:<12} {:>12}", "PROFILE", "BYTES");
    for limit in &limits {
        println!("{:<12} {:>12}", limit.name, limit.data_limit);
    }
    if let Some(bytes) = override_limit {
        println!("\n{} overrides the probe: {} bytes", config::DATA_LIMIT, bytes);
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_cover_every_profile() {
        let limits = profile_limits();
        assert_eq!(limits.len(), NetworkProfile::ALL.len());
        let desktop = limits.iter().find(|l| l.name == "desktop").unwrap();
        assert_eq!(desktop.data_limit, 10 * 1024 * 1024);
    }

    #[test]
    fn test_limits_serialize_with_profile_variant() {
        let json = serde_json::to_value(profile_limits()).unwrap();
        assert_eq!(json[0]["profile"], "Unknown");
        assert_eq!(json[0]["data_limit"], 512 * 1024);
    }
}
