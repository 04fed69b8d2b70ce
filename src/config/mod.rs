//! Command-line parsing and validation helpers.

mod defaults;
mod layout;
mod validation;

use clap::{Args, Parser, ValueEnum};
use std::path::PathBuf;

pub use defaults::{DEFAULT_BRIGHTNESS, DEFAULT_KEYS_FILE};
pub use layout::{FieldSpec, Layout};
pub use validation::PanelTarget;

/// CLI options for a panel application.
#[derive(Debug, Parser, Clone)]
#[command(about = "IR panel application", author, version)]
pub struct AppConfig {
    /// Unix socket path or HOST:PORT of the panel daemon
    #[arg(value_name = "SOCKET|HOST:PORT")]
    pub target: String,

    /// CSV key table mapping IR codes to key names
    #[arg(long, env = "IRPANEL_KEYS", default_value = DEFAULT_KEYS_FILE)]
    pub keys: PathBuf,

    /// Backlight brightness sent on connect (overrides the layout file)
    #[arg(long)]
    pub brightness: Option<u8>,

    /// YAML file with field positions and brightness
    #[arg(long, env = "IRPANEL_LAYOUT")]
    pub layout: Option<PathBuf>,

    #[command(flatten)]
    pub logging: LoggingConfig,
}

/// Logging flags shared by every binary.
#[derive(Debug, Args, Clone)]
pub struct LoggingConfig {
    /// Most verbose level that gets logged
    #[arg(
        long = "log-level",
        env = "IRPANEL_LOG_LEVEL",
        value_enum,
        default_value_t = LogLevel::Info
    )]
    pub log_level: LogLevel,

    /// Write JSON log lines to this file instead of stderr
    #[arg(long = "log-file", env = "IRPANEL_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Disable all logging (overrides the other log flags)
    #[arg(long = "no-logs", env = "IRPANEL_NO_LOGS", default_value_t = false)]
    pub no_logs: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_tracing(self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}
