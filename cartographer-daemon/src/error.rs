use std::path::PathBuf;

use thiserror::Error;

/// Error surface for the runner. Everything here is fatal to the process.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(#[from] cartographer_core::ConfigError),

    #[error("sync error: {0}")]
    Sync(#[from] cartographer_sync::SyncError),

    #[error("{task} task failed: {message}")]
    Join { task: &'static str, message: String },

    #[error("ctrl-c handler failed: {0}")]
    Signal(String),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}
