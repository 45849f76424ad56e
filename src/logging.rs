//! Structured logging setup.
//!
//! The crate only emits `tracing` events; installing a subscriber is the host
//! application's choice. [`init_logging`] is the ready-made one: an `EnvFilter`
//! from `RUST_LOG` (falling back to the configured level) feeding a JSON or
//! pretty `fmt` layer.

use anyhow::{Context, Result};
use std::env;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format: JSON for production, pretty-print for development.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// trace/debug/info/warn/error, used when `RUST_LOG` is unset
    pub log_level: String,
    pub format: LogFormat,
    /// Extra comma-separated filter directives, e.g. `verbtree::router=debug`
    pub target_filter: Option<String>,
    /// Include file:line in events
    pub include_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Json,
            target_filter: None,
            include_location: false,
        }
    }
}

impl LogConfig {
    /// `VERBTREE_LOG_LEVEL`, `VERBTREE_LOG_FORMAT`, `VERBTREE_LOG_TARGET_FILTER`,
    /// `VERBTREE_LOG_INCLUDE_LOCATION`.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            log_level: env::var("VERBTREE_LOG_LEVEL").unwrap_or(defaults.log_level),
            format: env::var("VERBTREE_LOG_FORMAT")
                .map(|s| LogFormat::parse(&s))
                .unwrap_or(defaults.format),
            target_filter: env::var("VERBTREE_LOG_TARGET_FILTER").ok(),
            include_location: env::var("VERBTREE_LOG_INCLUDE_LOCATION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.include_location),
        }
    }

    /// Pretty, debug-level output for local development and tests.
    #[must_use]
    pub fn default_dev() -> Self {
        Self {
            log_level: "debug".to_string(),
            format: LogFormat::Pretty,
            target_filter: None,
            include_location: true,
        }
    }
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn build_filter(config: &LogConfig) -> EnvFilter {
    let level = parse_level(&config.log_level);
    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    if let Some(targets) = &config.target_filter {
        for directive in targets.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            match directive.parse() {
                Ok(directive) => filter = filter.add_directive(directive),
                Err(e) => eprintln!("Warning: invalid log filter directive `{directive}`: {e}"),
            }
        }
    }
    filter
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(build_filter(config))
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    tracing::info!(
        format = ?config.format,
        level = %config.log_level,
        "Logging initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parse() {
        assert_eq!(LogFormat::parse("PRETTY"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("anything"), LogFormat::Json);
    }

    #[test]
    fn test_level_parse() {
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level("bogus"), Level::INFO);
    }

    #[test]
    fn test_second_init_fails() {
        let config = LogConfig::default_dev();
        let first = init_logging(&config);
        let second = init_logging(&config);
        // Another test binary thread may have won the race; at most one succeeds.
        assert!(first.is_err() || second.is_err());
    }
}
