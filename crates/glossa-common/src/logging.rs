//! Structured logging infrastructure for Glossa

use crate::error::{GlossaError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, human oriented output with colors
    #[default]
    Pretty,
    /// Single-line output
    Compact,
    /// Newline delimited JSON records
    Json,
}

/// Configuration for the logging system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "glossa_i18n=debug")
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Optional file path for log output
    pub file_path: Option<String>,
    /// Whether to include span open/close events in the output
    pub include_spans: bool,
    /// Whether to include target module information
    pub include_targets: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            file_path: None,
            include_spans: false,
            include_targets: true,
        }
    }
}

impl LoggingConfig {
    fn span_events(&self) -> FmtSpan {
        if self.include_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.level).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Initialize the tracing subscriber with the given configuration.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let registry = tracing_subscriber::registry().with(config.env_filter());
    let span_events = config.span_events();

    let installed = match (config.format, config.file_path.as_deref()) {
        (LogFormat::Json, None) => registry
            .with(
                fmt::layer()
                    .json()
                    .with_span_events(span_events)
                    .with_target(config.include_targets)
                    .with_thread_ids(true),
            )
            .try_init(),
        (LogFormat::Json, Some(path)) => registry
            .with(
                fmt::layer()
                    .json()
                    .with_span_events(span_events)
                    .with_target(config.include_targets)
                    .with_thread_ids(true)
                    .with_writer(file_appender(path)?),
            )
            .try_init(),
        (LogFormat::Compact, None) => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_span_events(span_events)
                    .with_target(config.include_targets)
                    .with_thread_names(true),
            )
            .try_init(),
        (LogFormat::Compact, Some(path)) => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_ansi(false)
                    .with_span_events(span_events)
                    .with_target(config.include_targets)
                    .with_thread_names(true)
                    .with_writer(file_appender(path)?),
            )
            .try_init(),
        (LogFormat::Pretty, None) => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_span_events(span_events)
                    .with_target(config.include_targets)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .try_init(),
        (LogFormat::Pretty, Some(path)) => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_ansi(false)
                    .with_span_events(span_events)
                    .with_target(config.include_targets)
                    .with_thread_ids(true)
                    .with_thread_names(true)
                    .with_writer(file_appender(path)?),
            )
            .try_init(),
    };

    installed.map_err(|e| GlossaError::logging_with_source("Failed to install log subscriber", e))
}

/// Initialize logging with default configuration
pub fn init_default_logging() -> Result<()> {
    init_logging(&LoggingConfig::default())
}

/// Initialize logging for development (pretty, debug level)
pub fn init_dev_logging() -> Result<()> {
    init_logging(&LoggingConfig {
        level: "debug".to_string(),
        format: LogFormat::Pretty,
        include_spans: true,
        ..LoggingConfig::default()
    })
}

/// Initialize logging for production (JSON records appended to `log_file`)
pub fn init_prod_logging(log_file: impl Into<String>) -> Result<()> {
    init_logging(&LoggingConfig {
        level: "info".to_string(),
        format: LogFormat::Json,
        file_path: Some(log_file.into()),
        ..LoggingConfig::default()
    })
}

fn file_appender(path: &str) -> Result<tracing_appender::rolling::RollingFileAppender> {
    let path = Path::new(path);
    let file_name = path
        .file_name()
        .ok_or_else(|| GlossaError::validation_field("log file path has no file name", "logging.file_path"))?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(directory)?;
    Ok(tracing_appender::rolling::never(directory, file_name))
}
