//! # cartographer-sync
//!
//! Reconciliation engine and pull-request orchestration.
//!
//! Call [`reconcile::reconcile`] to turn an app descriptor into pull-request
//! intents, [`orchestrator::ensure_pull_request`] to propose one intent
//! idempotently, or [`pipeline::run_cycle`] to do both for every app in a
//! directory.

pub mod changeset;
pub mod error;
pub mod fetcher;
pub mod github;
pub mod hosting;
pub mod intent;
pub mod orchestrator;
pub mod pipeline;
pub mod reconcile;
pub mod staging;

pub use changeset::{ChangeSet, Fingerprint, UpdatePolicy};
pub use error::{HostingError, PrError, SyncError};
pub use fetcher::{Fetcher, GitFetcher};
pub use github::GitHubClient;
pub use hosting::HostingApi;
pub use intent::{resolve_head, FileSpec, PullRequestIntent};
pub use orchestrator::{ensure_pull_request, PrOutcome};
pub use pipeline::{
    plan_cycle, run_cycle, AppPlan, AppReport, CycleReport, CycleScope, IntentReport, IntentStatus,
};
pub use reconcile::{reconcile, CommitIdentity};
pub use staging::StagingArea;
