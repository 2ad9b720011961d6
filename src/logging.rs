use crate::config::LoggingConfig;
use crate::{AckError, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Installs the global subscriber: a plain-text log file plus an optional console sink.
///
/// `RUST_LOG` takes precedence over `config.level`. `default_file` is used when the
/// configuration does not name a log file.
pub fn init(config: &LoggingConfig, default_file: &Path) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let path = config.file.as_deref().unwrap_or(default_file);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AckError::Config(format!("Failed to open log file {}: {e}", path.display())))?;

    let file_layer = fmt::layer().with_ansi(false).with_writer(Mutex::new(file));
    let console_layer = config
        .console
        .then(|| fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| AckError::Config(format!("Failed to install log subscriber: {e}")))
}
