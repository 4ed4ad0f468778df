//! Subscriber setup for the CLI and embedding hosts.
//!
//! A single `fmt` layer, JSON or pretty, filtered with `RUST_LOG` syntax.
//! Output goes to stderr unless `TIERED_HTTP_LOG_FILE` names a file, which
//! is opened in append mode so restarts keep earlier records.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_subscriber::fmt::{self, writer::BoxMakeWriter};
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

pub const LOG_FORMAT: &str = "TIERED_HTTP_LOG_FORMAT";
pub const LOG_FILE: &str = "TIERED_HTTP_LOG_FILE";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Multi-line human-readable output.
    Pretty,
}

impl LogFormat {
    /// Parse `json` or `pretty`, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" => Some(Self::Pretty),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Filter directives, e.g. `info` or `tiered_http=debug`.
    pub level: String,
    /// Append to this file instead of writing to stderr.
    pub output_path: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { format: LogFormat::Json, level: "info".to_string(), output_path: None }
    }
}

impl LogConfig {
    /// Read `RUST_LOG`, `TIERED_HTTP_LOG_FORMAT` and `TIERED_HTTP_LOG_FILE`.
    /// Unset or unparsable values keep their defaults; an empty file path means stderr.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let level = std::env::var("RUST_LOG").unwrap_or(defaults.level);
        let format = std::env::var(LOG_FORMAT)
            .ok()
            .and_then(|v| LogFormat::parse(&v))
            .unwrap_or(defaults.format);
        let output_path = std::env::var_os(LOG_FILE)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self { format, level, output_path }
    }
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),
    #[error("Failed to open log file: {0}")]
    FileOpen(String),
    #[error("Subscriber already initialized")]
    AlreadyInitialized,
}

type FilteredRegistry = Layered<EnvFilter, Registry>;

fn make_writer(path: Option<&Path>) -> Result<BoxMakeWriter, LogError> {
    let Some(path) = path else {
        return Ok(BoxMakeWriter::new(std::io::stderr));
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| LogError::FileOpen(format!("{}: {}", path.display(), e)))?;
    Ok(BoxMakeWriter::new(std::sync::Mutex::new(file)))
}

/// Install the global subscriber. Call once at startup; later calls fail
/// with [`LogError::AlreadyInitialized`].
pub fn init_logging(config: &LogConfig) -> Result<(), LogError> {
    let filter = EnvFilter::try_new(&config.level)
        .map_err(|e| LogError::InvalidFilter(e.to_string()))?;
    let writer = make_writer(config.output_path.as_deref())?;
    let to_terminal = config.output_path.is_none();

    let layer: Box<dyn Layer<FilteredRegistry> + Send + Sync> = match config.format {
        LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_ansi(to_terminal)
            .with_writer(writer)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|_| LogError::AlreadyInitialized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_parse() {
        assert_eq!(LogFormat::parse("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse(" pretty "), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::parse("xml"), None);
    }

    #[test]
    fn from_env_reads_log_file() {
        std::env::set_var(LOG_FILE, "/var/log/tiered-http.log");
        std::env::set_var(LOG_FORMAT, "pretty");
        let config = LogConfig::from_env();
        std::env::set_var(LOG_FILE, "");
        let empty = LogConfig::from_env();
        std::env::remove_var(LOG_FILE);
        std::env::remove_var(LOG_FORMAT);

        assert_eq!(config.output_path, Some(PathBuf::from("/var/log/tiered-http.log")));
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(empty.output_path, None);
    }

    #[test]
    fn unopenable_log_file_is_reported() {
        let config = LogConfig {
            output_path: Some(PathBuf::from("/nonexistent-dir/tiered-http/out.log")),
            ..LogConfig::default()
        };
        assert!(matches!(init_logging(&config), Err(LogError::FileOpen(_))));
    }

    #[test]
    fn invalid_filter_is_reported() {
        let config = LogConfig { level: "tiered_http=loud".to_string(), ..LogConfig::default() };
        assert!(matches!(init_logging(&config), Err(LogError::InvalidFilter(_))));
    }
}
