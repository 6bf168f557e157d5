//! Cartographer core library: app descriptor types, loaders, settings, errors.
//!
//! - [`types`]: newtypes and the declarative app model
//! - [`apps`]: discover and load app descriptor files
//! - [`settings`]: runtime settings and the hosting API token
//! - [`error`]: [`ConfigError`]

pub mod apps;
pub mod error;
pub mod settings;
pub mod types;

pub use error::ConfigError;
pub use settings::{LogFormat, Settings, Token};
pub use types::{
    is_staged_path, AppDescriptor, DestinationName, DestinationRef, RepoLocator, Route, SourceName,
    SourceRef,
};
