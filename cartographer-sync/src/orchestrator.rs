//! Idempotent pull-request lifecycle.
//!
//! ```text
//! CHECK_EXISTING ── open PR with same subject ──▶ SkippedExisting
//!       │
//!       ▼
//! ENSURE_REF ─▶ BUILD_TREE ─▶ CREATE_COMMIT ─▶ UPDATE_REF ─▶ CREATE_PR ─▶ Created
//! ```
//!
//! Staged files are read before ENSURE_REF, so a local failure leaves the
//! remote untouched. Any step error aborts the intent. Nothing is retried here; the next cycle
//! retries, and the subject check keeps that from duplicating work.

use std::path::Path;

use chrono::Utc;
use serde::Serialize;

use crate::error::PrError;
use crate::hosting::{
    BranchRef, CommitAuthor, HostingApi, NewCommit, NewPullRequest, PullRequest, TreeEntry,
};
use crate::intent::{resolve_head, PullRequestIntent};

/// Outcome of [`ensure_pull_request`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PrOutcome {
    /// A new pull request was opened.
    Created(PullRequest),
    /// An open pull request already carries this subject.
    SkippedExisting(PullRequest),
}

/// Make sure a pull request for `intent` is open, creating it if needed.
pub fn ensure_pull_request(
    api: &dyn HostingApi,
    intent: &PullRequestIntent,
) -> Result<PrOutcome, PrError> {
    if intent.pr_subject.trim().is_empty() {
        return Err(PrError::MissingSubject);
    }

    if let Some(existing) = find_existing(api, intent)? {
        tracing::info!(
            "pull request #{} already open for '{}'; skipping",
            existing.number,
            intent.pr_subject
        );
        return Ok(PrOutcome::SkippedExisting(existing));
    }

    let entries = build_tree_entries(intent)?;

    let branch = ensure_ref(api, intent)?;
    let parent = api.get_commit(&intent.source_repo, &branch.sha)?;
    let tree_sha = api.create_tree(&intent.source_repo, &parent.tree_sha, &entries)?;

    let commit = api.create_commit(
        &intent.source_repo,
        &NewCommit {
            message: intent.commit_message.clone(),
            tree_sha,
            parents: vec![parent.sha],
            author: CommitAuthor {
                name: intent.author_name.clone(),
                email: intent.author_email.clone(),
                date: Utc::now(),
            },
        },
    )?;
    api.update_branch(&intent.source_repo, &branch.name, &commit.sha, false)?;
    tracing::debug!("{} now at {}", branch.name, commit.sha);

    let created = create_pr(api, intent)?;
    tracing::info!("pull request created: {}", created.html_url);
    Ok(PrOutcome::Created(created))
}

fn find_existing(
    api: &dyn HostingApi,
    intent: &PullRequestIntent,
) -> Result<Option<PullRequest>, PrError> {
    Ok(api
        .list_open_pull_requests(&intent.pr_repo)?
        .into_iter()
        .find(|pr| pr.title == intent.pr_subject))
}

/// Fetch the commit branch, cutting it from the base branch when absent.
fn ensure_ref(api: &dyn HostingApi, intent: &PullRequestIntent) -> Result<BranchRef, PrError> {
    let branch = intent.commit_branch.as_str();
    if intent.base_branch.as_deref() == Some(branch) {
        return Err(PrError::BranchIsBase(branch.to_string()));
    }

    if let Some(existing) = api.get_branch(&intent.source_repo, branch)? {
        return Ok(existing);
    }

    let Some(base) = intent.base_branch.as_deref() else {
        return Err(PrError::BaseBranchUnset(branch.to_string()));
    };
    let base_ref = api
        .get_branch(&intent.source_repo, base)?
        .ok_or_else(|| PrError::BaseBranchMissing(base.to_string()))?;
    tracing::debug!("creating {} from {} at {}", branch, base, base_ref.sha);
    Ok(api.create_branch(&intent.source_repo, branch, &base_ref.sha)?)
}

fn build_tree_entries(intent: &PullRequestIntent) -> Result<Vec<TreeEntry>, PrError> {
    if intent.source_files.is_empty() {
        return Err(PrError::NoFiles);
    }
    intent
        .source_files
        .iter()
        .map(|file| Ok(TreeEntry::blob(file.target.clone(), read_text(&file.local)?)))
        .collect()
}

fn read_text(path: &Path) -> Result<String, PrError> {
    let bytes = std::fs::read(path).map_err(|source| PrError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|_| PrError::NonUtf8(path.to_path_buf()))
}

fn create_pr(api: &dyn HostingApi, intent: &PullRequestIntent) -> Result<PullRequest, PrError> {
    let base = intent
        .pr_branch
        .clone()
        .filter(|b| !b.is_empty())
        .ok_or_else(|| PrError::MissingPrBase(intent.pr_subject.clone()))?;
    let pull = NewPullRequest {
        title: intent.pr_subject.clone(),
        head: resolve_head(intent),
        base,
        body: intent.pr_description.clone(),
        maintainer_can_modify: true,
    };
    Ok(api.create_pull_request(&intent.pr_repo, &pull)?)
}
