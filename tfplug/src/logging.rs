//! Logging setup for provider processes
//!
//! Terraform captures a plugin's stderr and filters it by the TF_LOG level,
//! while stdout is reserved for the plugin handshake line. Logs therefore
//! always go to stderr.

use crate::error::{Result, TfplugError};
use std::str::FromStr;
use tracing::level_filters::LevelFilter;

/// Log level for the provider process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    /// Reads TF_LOG_PROVIDER, then TF_LOG; defaults to Info
    pub fn from_env() -> Self {
        std::env::var("TF_LOG_PROVIDER")
            .or_else(|_| std::env::var("TF_LOG"))
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(LogLevel::Info)
    }

    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Off => LevelFilter::OFF,
        }
    }
}

impl FromStr for LogLevel {
    type Err = TfplugError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TRACE" | "JSON" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            "OFF" => Ok(LogLevel::Off),
            _ => Err(TfplugError::LoggingError(format!(
                "unrecognised log level '{}'",
                s
            ))),
        }
    }
}

/// Installs a global fmt subscriber writing to stderr
///
/// Fails if another global subscriber is already installed.
pub fn init(level: LogLevel) -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(level.as_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| TfplugError::LoggingError(e.to_string()))
}

/// `init` with the level taken from the environment
pub fn init_from_env() -> Result<()> {
    init(LogLevel::from_env())
}
