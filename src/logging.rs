//! Structured logging initialization.
//!
//! Logs go through `tracing` with a `tracing-subscriber` registry: an
//! `EnvFilter` (`RUST_LOG` wins over the configured level), then a JSON or
//! pretty `fmt` layer, optionally behind a non-blocking `tracing-appender`
//! writer.
//!
//! | variable                      | default |
//! |-------------------------------|---------|
//! | `CRUDR_LOG_LEVEL`             | `info`  |
//! | `CRUDR_LOG_FORMAT`            | `json`  |
//! | `CRUDR_LOG_ASYNC`             | `false` |
//! | `CRUDR_LOG_TARGET_FILTER`     | unset   |
//! | `CRUDR_LOG_INCLUDE_LOCATION`  | `false` |

use anyhow::{Context, Result};
use std::env;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Stream the formatted events are written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
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

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// trace/debug/info/warn/error
    pub log_level: String,
    pub format: LogFormat,
    /// Write through a background worker thread
    pub async_logging: bool,
    /// Extra comma-separated filter directives
    pub target_filter: Option<String>,
    /// Include file:line in every event
    pub include_location: bool,
    pub output: LogOutput,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Json,
            async_logging: false,
            target_filter: None,
            include_location: false,
            output: LogOutput::Stdout,
        }
    }
}

fn parse_bool(var: &str) -> Option<bool> {
    env::var(var).ok().and_then(|s| s.parse().ok())
}

impl LogConfig {
    /// Read the `CRUDR_LOG_*` variables, falling back to defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            log_level: env::var("CRUDR_LOG_LEVEL").unwrap_or(defaults.log_level),
            format: env::var("CRUDR_LOG_FORMAT")
                .map(|s| LogFormat::parse(&s))
                .unwrap_or(defaults.format),
            async_logging: parse_bool("CRUDR_LOG_ASYNC").unwrap_or(defaults.async_logging),
            target_filter: env::var("CRUDR_LOG_TARGET_FILTER").ok(),
            include_location: parse_bool("CRUDR_LOG_INCLUDE_LOCATION")
                .unwrap_or(defaults.include_location),
            output: defaults.output,
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

    fn env_filter(&self) -> EnvFilter {
        let mut filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level().as_str()));
        if let Some(target_filter) = &self.target_filter {
            for directive in target_filter.split(',').map(str::trim).filter(|d| !d.is_empty()) {
                match directive.parse() {
                    Ok(directive) => filter = filter.add_directive(directive),
                    Err(_) => eprintln!("Warning: Invalid log filter directive: {directive}"),
                }
            }
        }
        filter
    }
}

/// Keeps the background writer alive; dropping it flushes pending events.
#[must_use = "dropping the guard stops asynchronous logging"]
#[derive(Debug)]
pub struct LoggingGuard {
    _worker: Option<WorkerGuard>,
}

/// Install the global subscriber described by `config`.
///
/// # Errors
///
/// Fails when a global subscriber is already installed.
pub fn init_logging_with_config(config: &LogConfig) -> Result<LoggingGuard> {
    let registry = tracing_subscriber::registry().with(config.env_filter());

    let (writer, worker) = match (config.output, config.async_logging) {
        (LogOutput::Stdout, true) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        (LogOutput::Stderr, true) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stderr());
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        (LogOutput::Stdout, false) => (BoxMakeWriter::new(std::io::stdout), None),
        (LogOutput::Stderr, false) => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_span_list(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
    };

    registry
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(LoggingGuard { _worker: worker })
}
