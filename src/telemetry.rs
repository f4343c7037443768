//! Logging initialisation.
//!
//! Structured logging through `tracing`, configured from `VROUTER_LOG_*`
//! environment variables. Output goes to stderr so command output on stdout
//! stays machine readable.
//!
//! | Variable | Default | Meaning |
//! | --- | --- | --- |
//! | `VROUTER_LOG_LEVEL` | `info` | `trace` / `debug` / `info` / `warn` / `error` |
//! | `VROUTER_LOG_FORMAT` | `pretty` | `pretty` or `json` |
//! | `VROUTER_LOG_TARGET_FILTER` | unset | extra comma-separated filter directives |
//! | `VROUTER_LOG_INCLUDE_LOCATION` | `false` | add file and line to every event |
//!
//! `RUST_LOG` takes precedence over `VROUTER_LOG_LEVEL` when set.

use std::env;

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format: pretty for terminals, JSON for log shippers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Base level, used when `RUST_LOG` is unset
    pub log_level: String,
    pub format: LogFormat,
    /// Extra `EnvFilter` directives, e.g. `vrouter::render=debug`
    pub target_filter: Option<String>,
    /// Attach source file and line to each event
    pub include_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Pretty,
            target_filter: None,
            include_location: false,
        }
    }
}

impl LogConfig {
    /// Read the `VROUTER_LOG_*` variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            log_level: lookup("VROUTER_LOG_LEVEL").unwrap_or(defaults.log_level),
            format: lookup("VROUTER_LOG_FORMAT")
                .map_or(defaults.format, |value| LogFormat::parse(&value)),
            target_filter: lookup("VROUTER_LOG_TARGET_FILTER").filter(|f| !f.trim().is_empty()),
            include_location: lookup("VROUTER_LOG_INCLUDE_LOCATION")
                .map_or(defaults.include_location, |value| {
                    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on")
                }),
        }
    }

    fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

/// Install the global subscriber.
///
/// Fails if a subscriber is already installed.
///
/// ```no_run
/// use vrouter::telemetry::{init_logging_with_config, LogConfig};
///
/// init_logging_with_config(&LogConfig::from_env()).expect("Failed to initialize logging");
/// ```
pub fn init_logging_with_config(config: &LogConfig) -> Result<()> {
    let mut env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level().as_str()));

    if let Some(target_filter) = &config.target_filter {
        for filter in target_filter.split(',') {
            let filter = filter.trim();
            if filter.is_empty() {
                continue;
            }
            match filter.parse() {
                Ok(directive) => env_filter = env_filter.add_directive(directive),
                Err(_) => eprintln!("Warning: Invalid log filter directive: {filter}"),
            }
        }
    }

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(())
}
