//! Reconciliation engine: app descriptor in, pull-request intents out.
//!
//! Sources are fetched first, then destinations, then every routed pairing
//! is diffed. All fetching happens before any diffing so a fetch failure
//! aborts the app without emitting partial intents.

use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as _;

use cartographer_core::{
    is_staged_path, AppDescriptor, DestinationName, DestinationRef, Settings, SourceRef,
};

use crate::changeset::ChangeSet;
use crate::error::SyncError;
use crate::fetcher::Fetcher;
use crate::intent::{commit_branch_name, pr_subject, FileSpec, PullRequestIntent};
use crate::staging::{self, StagingArea};

/// Author recorded on sync commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitIdentity {
    pub author_name: String,
    pub author_email: String,
}

impl From<&Settings> for CommitIdentity {
    fn from(settings: &Settings) -> Self {
        Self {
            author_name: settings.author_name.clone(),
            author_email: settings.author_email.clone(),
        }
    }
}

/// A fetched destination: its file listing and the branch it was read from.
struct StagedDestination {
    files: BTreeSet<String>,
    branch: Option<String>,
}

/// Fetch every repository `app` names into `staging` and compute one intent
/// per routed pairing that has files to create.
///
/// Identical inputs give identical intents, in pairing order.
pub fn reconcile(
    app: &AppDescriptor,
    staging: &StagingArea,
    fetcher: &dyn Fetcher,
    identity: &CommitIdentity,
) -> Result<Vec<PullRequestIntent>, SyncError> {
    for source in &app.sources {
        stage_source(source, staging, fetcher)?;
    }

    let mut destinations: HashMap<&DestinationName, StagedDestination> = HashMap::new();
    for destination in &app.destinations {
        let staged = stage_destination(destination, staging, fetcher)?;
        destinations.insert(&destination.name, staged);
    }

    let mut intents = Vec::new();
    for (source, destination) in app.pairings() {
        let Some(staged) = destinations.get(&destination.name) else {
            continue;
        };
        let changes =
            ChangeSet::compute(&source.files, &staged.files, |f| destination.target_path(f));

        if !changes.to_update.is_empty() {
            tracing::info!(
                "{} -> {}: {} file(s) already present, left for review (update policy: {:?})",
                source.name,
                destination.name,
                changes.to_update.len(),
                ChangeSet::UPDATE_POLICY
            );
        }
        if changes.is_empty() {
            tracing::debug!("{} -> {}: nothing to create", source.name, destination.name);
            continue;
        }

        intents.push(build_intent(
            source,
            destination,
            staged.branch.clone(),
            &changes,
            staging,
            identity,
        ));
    }
    Ok(intents)
}

fn stage_source(
    source: &SourceRef,
    staging: &StagingArea,
    fetcher: &dyn Fetcher,
) -> Result<(), SyncError> {
    let dir = staging.source_dir(&source.name);
    fetcher.fetch(&source.repo, &source.path, source.reference(), &dir)?;

    for file in &source.files {
        if !is_staged_path(file) || !dir.join(file).is_file() {
            return Err(SyncError::MissingSourceFile {
                source_name: source.name.clone(),
                file: file.clone(),
                root: dir,
            });
        }
    }
    tracing::debug!("staged source {} ({} file(s))", source.name, source.files.len());
    Ok(())
}

fn stage_destination(
    destination: &DestinationRef,
    staging: &StagingArea,
    fetcher: &dyn Fetcher,
) -> Result<StagedDestination, SyncError> {
    let dir = staging.destination_dir(&destination.name);
    let checked_out = fetcher.fetch(
        &destination.repo,
        &destination.path,
        destination.branch(),
        &dir,
    )?;
    let files = staging::list_files(&dir)?;
    tracing::debug!("staged destination {} ({} file(s))", destination.name, files.len());

    Ok(StagedDestination {
        files,
        branch: destination.branch().map(str::to_string).or(checked_out),
    })
}

fn build_intent(
    source: &SourceRef,
    destination: &DestinationRef,
    branch: Option<String>,
    changes: &ChangeSet,
    staging: &StagingArea,
    identity: &CommitIdentity,
) -> PullRequestIntent {
    let source_dir = staging.source_dir(&source.name);
    let source_files = changes
        .to_create
        .iter()
        .map(|f| FileSpec::new(source_dir.join(f), destination.target_path(f)))
        .collect();

    let fingerprint = changes.fingerprint.clone();
    PullRequestIntent {
        source: source.name.clone(),
        destination: destination.name.clone(),
        source_repo: destination.repo.clone(),
        commit_branch: commit_branch_name(&source.name, &fingerprint),
        base_branch: branch.clone(),
        commit_message: format!(
            "Cartographer: sync {} file(s) from {} [{}]",
            changes.to_create.len(),
            source.name,
            fingerprint
        ),
        pr_repo: destination.repo.clone(),
        pr_branch: branch,
        pr_subject: pr_subject(&source.name, &destination.name, &fingerprint),
        pr_description: describe(source, destination, changes),
        source_files,
        author_name: identity.author_name.clone(),
        author_email: identity.author_email.clone(),
        fingerprint,
    }
}

fn describe(source: &SourceRef, destination: &DestinationRef, changes: &ChangeSet) -> String {
    let mut body = format!(
        "Files declared by `{}` ({}) are missing from `{}` ({}).\n\n### Added\n",
        source.name, source.repo, destination.name, destination.repo
    );
    for file in &changes.to_create {
        let _ = writeln!(body, "- `{}`", destination.target_path(file));
    }
    if !changes.to_update.is_empty() {
        body.push_str("\n### Already present (not updated, please review)\n");
        for file in &changes.to_update {
            let _ = writeln!(body, "- `{}`", destination.target_path(file));
        }
    }
    let _ = write!(body, "\nFingerprint: `{}`\n", changes.fingerprint);
    body
}
