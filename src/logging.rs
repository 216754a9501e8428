//! Tracing subscriber initialization for the binary.
//!
//! Events go to stderr and, when a log directory is given, are also
//! appended to a plain-text file there so CI can keep it as an artifact.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// File name used inside the log directory.
pub const LOG_FILE_NAME: &str = "nexacro_license_request.log";

/// Error type for logging initialization failures.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Failed to create log directory
    #[error("Failed to create log directory at {path:?}: {source}")]
    DirectoryCreation {
        /// The directory path that failed to be created
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Tracing subscriber already initialized
    #[error("Tracing subscriber already initialized")]
    SubscriberAlreadySet,
}

/// Default filter directive for a `-v` count.
pub fn level_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Create `dir` if needed and return the log file path inside it.
pub fn prepare_log_dir(dir: &Path) -> Result<PathBuf, LoggingError> {
    std::fs::create_dir_all(dir).map_err(|source| LoggingError::DirectoryCreation {
        path: dir.to_path_buf(),
        source,
    })?;
    Ok(dir.join(LOG_FILE_NAME))
}

/// Install the global subscriber.
///
/// Respects `RUST_LOG`; otherwise the level follows `verbose`.
///
/// # Errors
/// * `DirectoryCreation` - the log directory could not be created
/// * `SubscriberAlreadySet` - a global subscriber is already installed
pub fn init(verbose: u8, log_dir: Option<&Path>) -> Result<(), LoggingError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for_verbosity(verbose)));

    let file_layer = match log_dir {
        Some(dir) => {
            prepare_log_dir(dir)?;
            let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
            Some(fmt::layer().with_writer(appender).with_ansi(false))
        }
        None => None,
    };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .with_line_number(verbose >= 3);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|_| LoggingError::SubscriberAlreadySet)
}
