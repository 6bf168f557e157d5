//! Error types for cartographer-sync.
//!
//! The three enums follow the failure scopes of a cycle: [`SyncError`]
//! aborts one app, [`PrError`] aborts one intent, and [`HostingError`] is
//! the hosting API failure wrapped by [`PrError`].

use std::path::PathBuf;

use thiserror::Error;

use cartographer_core::{ConfigError, SourceName};

/// Errors that abort reconciliation of a single app.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Loading or validating the app descriptor failed.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The fetcher could not materialize a repository.
    #[error("failed to fetch {repo} (ref: {reference}): {message}")]
    Fetch {
        repo: String,
        reference: String,
        message: String,
    },

    /// A source declares a file that its staged tree does not contain.
    #[error("source '{source_name}' declares '{file}' but it is not present in {root}")]
    MissingSourceFile {
        source_name: SourceName,
        file: String,
        root: PathBuf,
    },

    /// A cycle was scoped to an app with no descriptor file.
    #[error("no app named '{0}'")]
    UnknownApp(String),
}

/// Failures reported by the hosting API.
#[derive(Debug, Error)]
pub enum HostingError {
    /// The API answered with a non-success status.
    #[error("{method} {url} returned {status}: {message}")]
    Status {
        method: String,
        url: String,
        status: u16,
        message: String,
    },

    /// The request never produced a response.
    #[error("{method} {url} failed: {message}")]
    Transport {
        method: String,
        url: String,
        message: String,
    },

    /// The response body did not match the expected shape.
    #[error("cannot decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that abort proposing a single pull-request intent.
#[derive(Debug, Error)]
pub enum PrError {
    #[error("pull request subject is empty; skipping PR creation")]
    MissingSubject,

    #[error("commit branch '{0}' is the same as the base branch")]
    BranchIsBase(String),

    #[error("commit branch '{0}' does not exist and no base branch is set")]
    BaseBranchUnset(String),

    #[error("base branch '{0}' does not exist")]
    BaseBranchMissing(String),

    #[error("no pull request base branch is set for '{0}'")]
    MissingPrBase(String),

    #[error("intent has no files to commit")]
    NoFiles,

    #[error("cannot read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Tree entries carry inline text content.
    #[error("{0} is not valid UTF-8; binary files are not supported")]
    NonUtf8(PathBuf),

    #[error("hosting API error: {0}")]
    Hosting(#[from] HostingError),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
