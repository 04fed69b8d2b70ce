use crate::config::LoggingConfig;
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io;
use std::panic;
use std::sync::OnceLock;
use tracing_subscriber::fmt::time::UtcTime;

static TRACING_INIT: OnceLock<()> = OnceLock::new();
static PANIC_HOOK_INSTALLED: OnceLock<()> = OnceLock::new();

/// Install the global subscriber: human-readable lines on stderr, or JSON lines
/// appended to `--log-file`. Later calls are ignored.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    if config.no_logs || TRACING_INIT.get().is_some() {
        return Ok(());
    }
    let level = config.log_level.as_tracing();
    match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            let subscriber = tracing_subscriber::fmt()
                .json()
                .with_max_level(level)
                .with_timer(UtcTime::rfc_3339())
                .with_writer(file)
                .with_current_span(false)
                .with_span_list(false)
                .finish();
            let _ = tracing::subscriber::set_global_default(subscriber);
        }
        None => {
            let subscriber = tracing_subscriber::fmt()
                .with_max_level(level)
                .with_timer(UtcTime::rfc_3339())
                .with_writer(io::stderr)
                .with_target(false)
                .finish();
            let _ = tracing::subscriber::set_global_default(subscriber);
        }
    }
    let _ = TRACING_INIT.set(());
    install_panic_hook();
    Ok(())
}

/// Record panics (location and message) in the log before the default hook runs.
pub fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.get_or_init(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let location = info
                .location()
                .map(|loc| format!("{}:{}", loc.file(), loc.line()))
                .unwrap_or_else(|| "unknown".to_string());
            let payload = if let Some(text) = info.payload().downcast_ref::<&str>() {
                (*text).to_string()
            } else if let Some(text) = info.payload().downcast_ref::<String>() {
                text.clone()
            } else {
                "non-string panic payload".to_string()
            };
            tracing::error!(
                location = %location,
                version = env!("CARGO_PKG_VERSION"),
                "panic: {payload}"
            );
            previous(info);
        }));
    });
}
