//! Logging setup.
//!
//! Structured logging via the `tracing` crate: configurable level, text or
//! JSON output, and stdout/stderr/file destinations. Environment variables
//! override the config: `DRIFTSYNC_LOG` (filter), `DRIFTSYNC_LOG_FORMAT`,
//! `DRIFTSYNC_LOG_OUTPUT`, and `DRIFTSYNC_LOG_FILE`.

use crate::error::SyncError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Whether logging is enabled (default: true).
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level: trace, debug, info, warn, error, off.
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format: json, text (default: text).
    #[serde(default = "default_format")]
    pub format: String,

    /// Output destination: stdout, stderr, file, file+stderr.
    #[serde(default = "default_output")]
    pub output: String,

    /// Log file path when output includes file; None means the platform
    /// state directory.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

fn default_output() -> String {
    "stderr".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            level: default_level(),
            format: default_format(),
            output: default_output(),
            file: None,
        }
    }
}

/// Default log file location under the platform state directory.
pub fn default_log_file_path() -> Result<PathBuf, SyncError> {
    let dirs = directories::ProjectDirs::from("", "driftsync", "driftsync").ok_or_else(|| {
        SyncError::InvalidArgument(
            "could not determine platform state directory for log file".to_string(),
        )
    })?;
    let base = dirs
        .state_dir()
        .map(std::path::Path::to_path_buf)
        .unwrap_or_else(|| dirs.data_local_dir().to_path_buf());
    Ok(base.join("driftsync.log"))
}

/// Initialize the logging system. Call once per process.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), SyncError> {
    let disabled = config.map(|c| !c.enabled).unwrap_or(false);
    if disabled {
        Registry::default()
            .with(EnvFilter::new("off"))
            .with(fmt::layer().with_writer(std::io::sink))
            .init();
        return Ok(());
    }

    let filter = build_env_filter(config)?;
    let format = determine_format(config)?;
    let (writer, to_terminal) = make_writer(config)?;

    let base = Registry::default().with(filter);
    if format == "json" {
        base.with(
            fmt::layer()
                .json()
                .with_target(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_writer(writer),
        )
        .init();
    } else {
        base.with(
            fmt::layer()
                .with_target(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_ansi(to_terminal)
                .with_writer(writer),
        )
        .init();
    }
    Ok(())
}

/// Build the env filter: `DRIFTSYNC_LOG` wins, then the configured level.
fn build_env_filter(config: Option<&LoggingConfig>) -> Result<EnvFilter, SyncError> {
    if let Ok(filter) = EnvFilter::try_from_env("DRIFTSYNC_LOG") {
        return Ok(filter);
    }
    let level = config.map(|c| c.level.as_str()).unwrap_or("info");
    match level {
        "trace" | "debug" | "info" | "warn" | "error" | "off" => Ok(EnvFilter::new(level)),
        other => Err(SyncError::InvalidArgument(format!(
            "invalid log level: {other}"
        ))),
    }
}

fn determine_format(config: Option<&LoggingConfig>) -> Result<String, SyncError> {
    let format = std::env::var("DRIFTSYNC_LOG_FORMAT")
        .ok()
        .unwrap_or_else(|| {
            config
                .map(|c| c.format.clone())
                .unwrap_or_else(default_format)
        });
    if format != "json" && format != "text" {
        return Err(SyncError::InvalidArgument(format!(
            "invalid log format: {format} (must be 'json' or 'text')"
        )));
    }
    Ok(format)
}

/// Resolve the destination writer. The second value reports whether the
/// writer ends at a terminal stream, which gates ANSI color.
fn make_writer(config: Option<&LoggingConfig>) -> Result<(BoxMakeWriter, bool), SyncError> {
    let output = std::env::var("DRIFTSYNC_LOG_OUTPUT")
        .ok()
        .unwrap_or_else(|| {
            config
                .map(|c| c.output.clone())
                .unwrap_or_else(default_output)
        });
    match output.as_str() {
        "stdout" => Ok((BoxMakeWriter::new(std::io::stdout), true)),
        "stderr" => Ok((BoxMakeWriter::new(std::io::stderr), true)),
        "file" => Ok((BoxMakeWriter::new(open_log_file(config)?), false)),
        "file+stderr" => Ok((
            BoxMakeWriter::new(open_log_file(config)?.and(std::io::stderr)),
            false,
        )),
        other => Err(SyncError::InvalidArgument(format!(
            "invalid log output: {other} (must be 'stdout', 'stderr', 'file', or 'file+stderr')"
        ))),
    }
}

fn open_log_file(config: Option<&LoggingConfig>) -> Result<Arc<std::fs::File>, SyncError> {
    let path = std::env::var("DRIFTSYNC_LOG_FILE")
        .ok()
        .map(PathBuf::from)
        .or_else(|| config.and_then(|c| c.file.clone()))
        .map_or_else(default_log_file_path, Ok)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| SyncError::from_io(parent, e))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| SyncError::from_io(&path, e))?;
    Ok(Arc::new(file))
}
