//! Logging setup for the diagram engine
//!
//! Structured logging goes through `tracing`. Native builds install a
//! `tracing-subscriber` registry; wasm builds forward events to the browser
//! console through `tracing-wasm`.
//!
//! # Usage
//!
//! ```rust,no_run
//! use dfdraw::core::logging::init_logging;
//!
//! init_logging(Some("debug"), Some("pretty")).unwrap();
//! ```
//!
//! # Levels
//!
//! - `trace`: per-element work (placeholder resolution, hit tests, drag frames)
//! - `debug`: counts and reconcile summaries
//! - `info`: completed operations (render, export, proposal applied)
//! - `warn`: discarded proposer responses, duplicate node ids
//! - `error`: failures surfaced to the user
//!
//! # Environment Variables
//!
//! - `DFDRAW_LOG_LEVEL`: log level (trace|debug|info|warn|error|off)
//! - `DFDRAW_LOG_FORMAT`: output format (compact|pretty|json)
//! - `RUST_LOG`: standard `EnvFilter` directives, e.g.
//!   `RUST_LOG="info,dfdraw::scene=trace"`

use std::str::FromStr;

#[cfg(not(target_arch = "wasm32"))]
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Registry,
};

#[cfg(target_arch = "wasm32")]
use tracing_wasm::WASMLayerConfig;

/// Environment variable holding the default log level
pub const LOG_LEVEL_ENV: &str = "DFDRAW_LOG_LEVEL";

/// Environment variable holding the default log format
pub const LOG_FORMAT_ENV: &str = "DFDRAW_LOG_FORMAT";

/// Log format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact single-line format
    Compact,
    /// Pretty multi-line format with colors
    Pretty,
    /// JSON format for log aggregation
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(LogFormat::Compact),
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Unknown log format: {}", s)),
        }
    }
}

impl LogFormat {
    /// Get all valid format names
    pub fn variants() -> &'static [&'static str] {
        &["compact", "pretty", "json"]
    }
}

/// Resolve the effective level: argument, then `DFDRAW_LOG_LEVEL`, then
/// `RUST_LOG`, then `info`
pub fn resolve_level(level: Option<&str>) -> String {
    level
        .map(|s| s.to_string())
        .or_else(|| std::env::var(LOG_LEVEL_ENV).ok())
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info".to_string())
}

/// Resolve the effective format: argument, then `DFDRAW_LOG_FORMAT`, then
/// compact
pub fn resolve_format(format: Option<&str>) -> Result<LogFormat, String> {
    let name = format
        .map(|s| s.to_string())
        .or_else(|| std::env::var(LOG_FORMAT_ENV).ok())
        .unwrap_or_else(|| "compact".to_string());
    LogFormat::from_str(&name).map_err(|e| format!("Invalid log format: {}", e))
}

/// Initialize the global tracing subscriber
///
/// Returns an error when the format is unknown or a subscriber is already
/// installed.
pub fn init_logging(
    level: Option<&str>,
    format: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(target_arch = "wasm32")]
    {
        // The browser console has a single output format
        let _ = (level, format);
        tracing_wasm::set_as_global_default_with_config(WASMLayerConfig::default());
        Ok(())
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let log_level = resolve_level(level);
        let format = resolve_format(format)?;

        let filter = if log_level == "off" {
            EnvFilter::new("off")
        } else {
            EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info"))
        };

        match format {
            LogFormat::Compact => {
                Registry::default()
                    .with(filter)
                    .with(
                        fmt::Layer::default()
                            .with_writer(std::io::stderr)
                            .with_target(false)
                            .with_level(true)
                            .with_file(false)
                            .with_line_number(false)
                            .with_span_events(FmtSpan::NONE),
                    )
                    .try_init()?;
            }
            LogFormat::Pretty => {
                Registry::default()
                    .with(filter)
                    .with(
                        fmt::Layer::default()
                            .with_writer(std::io::stderr)
                            .with_target(true)
                            .with_level(true)
                            .with_file(true)
                            .with_line_number(true)
                            .with_span_events(FmtSpan::ACTIVE)
                            .pretty(),
                    )
                    .try_init()?;
            }
            LogFormat::Json => {
                Registry::default()
                    .with(filter)
                    .with(
                        fmt::Layer::default()
                            .with_writer(std::io::stderr)
                            .with_target(true)
                            .with_level(true)
                            .with_file(true)
                            .with_line_number(true)
                            .with_span_events(FmtSpan::ACTIVE)
                            .json(),
                    )
                    .try_init()?;
            }
        }

        Ok(())
    }
}

/// Initialize logging with default settings (info level, compact format)
pub fn init_default_logging() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(None, None)
}
