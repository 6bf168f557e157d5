//! Error types for cartographer-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{DestinationName, SourceName};

/// All errors that can arise while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load, with file path and serde_yaml line context.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A `github` field that is not of the form `owner/repo`.
    #[error("invalid repository locator '{0}'; expected owner/repo")]
    InvalidLocator(String),

    #[error("source '{0}' is declared more than once")]
    DuplicateSource(SourceName),

    #[error("destination '{0}' is declared more than once")]
    DuplicateDestination(DestinationName),

    /// A declared source file that is empty, absolute or climbs out of the
    /// staging root with `..`.
    #[error("source '{source_name}' declares '{file}', which is not a path inside the repository")]
    InvalidSourceFile { source_name: SourceName, file: String },

    /// A route names a source that the app does not declare.
    #[error("route {route} references undeclared source '{name}'")]
    UnknownRouteSource { route: usize, name: SourceName },

    /// A route names a destination that the app does not declare.
    #[error("route {route} references undeclared destination '{name}'")]
    UnknownRouteDestination { route: usize, name: DestinationName },

    /// The token file could not be read.
    #[error("cannot read token file {path}: {source}")]
    TokenUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The token file exists but holds no token.
    #[error("token file {path} is empty")]
    TokenEmpty { path: PathBuf },
}

/// Convenience constructor for [`ConfigError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
