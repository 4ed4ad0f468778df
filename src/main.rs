//! tiered-http command-line entry point.
//!
//! ## CLI Subcommands
//!
//! - `tiered-http config show|defaults|validate` - Inspect env configuration
//! - `tiered-http limits [--json]` - Speculative quota per network profile
//! - `tiered-http version` - Print the version

use std::process::ExitCode;

use tiered_http::cli::{config_cmd, has_flag, limits_cmd};
use tiered_http::telemetry::{init_logging, LogConfig};

fn main() -> ExitCode {
    if let Err(e) = init_logging(&LogConfig::from_env()) {
        eprintln!("Logging disabled: {}", e);
    }

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    match command {
        "config" => {
            let subcommand = args.get(2).map(|s| s.as_str()).unwrap_or("show");
            match subcommand {
                "show" => {
                    config_cmd::run_show();
                    ExitCode::SUCCESS
                }
                "defaults" => {
                    config_cmd::run_defaults();
                    ExitCode::SUCCESS
                }
                "validate" => exit_code(config_cmd::run_validate()),
                _ => {
                    eprintln!("Unknown config subcommand: {}", subcommand);
                    print_usage();
                    ExitCode::FAILURE
                }
            }
        }
        "limits" => exit_code(limits_cmd::run_limits(has_flag(&args, "--json"))),
        "version" | "--version" | "-V" => {
            println!("tiered-http {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        "help" | "--help" | "-h" => {
            print_usage();
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            ExitCode::FAILURE
        }
    }
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        "tiered-http v{}

USAGE:
    tiered-http [COMMAND] [OPTIONS]

COMMANDS:
    config show       Print effective configuration
    config defaults   Print default configuration
    config validate   Check configuration (exit 1 on warnings)
    limits            Speculative data limit per network profile
    version           Show version information
    help              Show this help message

OPTIONS:
    --json         Machine-readable output (limits)

ENVIRONMENT:
    TIERED_HTTP_BACKGROUND_CONCURRENCY      Background slot limit (default: 1)
    TIERED_HTTP_USER_INITIATED_CONCURRENCY  User-initiated slot limit (default: 3)
    TIERED_HTTP_SPECULATIVE_CONCURRENCY     Speculative slot limit (default: 0, budget only)
    TIERED_HTTP_SPECULATIVE_DEFAULT_COST    Bytes charged without an estimate (default: 65536)
    TIERED_HTTP_CACHE_MAX_ENTRIES           Completed entries per cache (default: 0, unbounded)
    TIERED_HTTP_DATA_LIMIT                  Fixed speculative quota in bytes
    TIERED_HTTP_LOG_FORMAT                  json or pretty
    TIERED_HTTP_LOG_FILE                    Append logs to this file instead of stderr
    RUST_LOG                                Log filter (debug, info, warn, error)

EXIT CODES:
    0  Success
    1  Failure or configuration warnings
",
        version
    );
}
