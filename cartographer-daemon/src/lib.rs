//! Cartographer runner: settings, logging and the reconcile-sleep loop.

mod error;
mod runtime;

pub use error::DaemonError;
pub use runtime::{init_tracing, run_once_blocking, start_blocking, Runner};
