//! Shared cycle entrypoint used by the CLI and the daemon.
//!
//! One cycle visits every app file in the apps directory, in name order.
//! Only an unreadable apps directory fails the cycle; app and intent
//! failures are logged and recorded in the report.

use std::path::Path;

use serde::Serialize;

use cartographer_core::apps::{list_app_files_at, load_app_at, AppFile};
use cartographer_core::{DestinationName, SourceName};

use crate::error::SyncError;
use crate::fetcher::Fetcher;
use crate::hosting::HostingApi;
use crate::intent::PullRequestIntent;
use crate::orchestrator::{ensure_pull_request, PrOutcome};
use crate::reconcile::{reconcile, CommitIdentity};
use crate::staging::StagingArea;

/// Apps a cycle visits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleScope {
    /// Every app file in the apps directory.
    All,
    /// A single app, by file stem.
    App(String),
}

/// What happened to one intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IntentStatus {
    Created { number: u64, url: String },
    SkippedExisting { number: u64 },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntentReport {
    pub source: SourceName,
    pub destination: DestinationName,
    pub commit_branch: String,
    #[serde(flatten)]
    pub status: IntentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppReport {
    pub app: String,
    pub intents: Vec<IntentReport>,
    /// Set when the app was aborted before or during reconciliation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of one reconciliation cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub apps: Vec<AppReport>,
}

impl CycleReport {
    fn count(&self, pred: impl Fn(&IntentStatus) -> bool) -> usize {
        self.apps
            .iter()
            .flat_map(|a| &a.intents)
            .filter(|i| pred(&i.status))
            .count()
    }

    pub fn created(&self) -> usize {
        self.count(|s| matches!(s, IntentStatus::Created { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, IntentStatus::SkippedExisting { .. }))
    }

    pub fn failed_intents(&self) -> usize {
        self.count(|s| matches!(s, IntentStatus::Failed { .. }))
    }

    pub fn failed_apps(&self) -> usize {
        self.apps.iter().filter(|a| a.error.is_some()).count()
    }

    /// `true` when no app or intent failed.
    pub fn is_clean(&self) -> bool {
        self.failed_apps() == 0 && self.failed_intents() == 0
    }
}

/// Intents computed for one app without proposing them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppPlan {
    pub app: String,
    pub intents: Vec<PullRequestIntent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Run one full cycle: reconcile every app in scope and propose its intents.
pub fn run_cycle(
    apps_dir: &Path,
    staging_root: &Path,
    scope: &CycleScope,
    fetcher: &dyn Fetcher,
    host: &dyn HostingApi,
    identity: &CommitIdentity,
) -> Result<CycleReport, SyncError> {
    let mut report = CycleReport::default();
    for file in app_files(apps_dir, scope)? {
        let staging = StagingArea::new(staging_root, &file.name);
        let intents = match plan_app(&file, &staging, fetcher, identity) {
            Ok(intents) => intents,
            Err(err) => {
                tracing::warn!("app '{}' skipped this cycle: {}", file.name, err);
                report.apps.push(AppReport {
                    app: file.name,
                    intents: Vec::new(),
                    error: Some(err.to_string()),
                });
                continue;
            }
        };

        let intents = intents
            .iter()
            .map(|intent| propose(host, intent))
            .collect();
        report.apps.push(AppReport {
            app: file.name,
            intents,
            error: None,
        });
    }
    Ok(report)
}

/// Fetch and reconcile every app in scope; no hosting API calls are made.
pub fn plan_cycle(
    apps_dir: &Path,
    staging_root: &Path,
    scope: &CycleScope,
    fetcher: &dyn Fetcher,
    identity: &CommitIdentity,
) -> Result<Vec<AppPlan>, SyncError> {
    let plans = app_files(apps_dir, scope)?
        .into_iter()
        .map(|file| {
            let staging = StagingArea::new(staging_root, &file.name);
            match plan_app(&file, &staging, fetcher, identity) {
                Ok(intents) => AppPlan {
                    app: file.name,
                    intents,
                    error: None,
                },
                Err(err) => {
                    tracing::warn!("app '{}' could not be planned: {}", file.name, err);
                    AppPlan {
                        app: file.name,
                        intents: Vec::new(),
                        error: Some(err.to_string()),
                    }
                }
            }
        })
        .collect();
    Ok(plans)
}

fn app_files(apps_dir: &Path, scope: &CycleScope) -> Result<Vec<AppFile>, SyncError> {
    let files = list_app_files_at(apps_dir)?;
    match scope {
        CycleScope::All => Ok(files),
        CycleScope::App(name) => {
            let selected: Vec<_> = files.into_iter().filter(|f| &f.name == name).collect();
            if selected.is_empty() {
                return Err(SyncError::UnknownApp(name.clone()));
            }
            Ok(selected)
        }
    }
}

fn plan_app(
    file: &AppFile,
    staging: &StagingArea,
    fetcher: &dyn Fetcher,
    identity: &CommitIdentity,
) -> Result<Vec<PullRequestIntent>, SyncError> {
    let app = load_app_at(&file.path)?;
    let intents = reconcile(&app, staging, fetcher, identity)?;
    tracing::info!("app '{}': {} intent(s)", file.name, intents.len());
    Ok(intents)
}

fn propose(host: &dyn HostingApi, intent: &PullRequestIntent) -> IntentReport {
    let status = match ensure_pull_request(host, intent) {
        Ok(PrOutcome::Created(pr)) => IntentStatus::Created {
            number: pr.number,
            url: pr.html_url,
        },
        Ok(PrOutcome::SkippedExisting(pr)) => IntentStatus::SkippedExisting { number: pr.number },
        Err(err) => {
            tracing::warn!(
                "{} -> {} ({}): {}",
                intent.source,
                intent.destination,
                intent.commit_branch,
                err
            );
            IntentStatus::Failed {
                error: err.to_string(),
            }
        }
    };
    IntentReport {
        source: intent.source.clone(),
        destination: intent.destination.clone(),
        commit_branch: intent.commit_branch.clone(),
        status,
    }
}
