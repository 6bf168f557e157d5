//! Hosting API seam for the pull-request lifecycle.
//!
//! The orchestrator only talks to this trait. [`crate::GitHubClient`] is the
//! production implementation; tests use in-memory fakes.

use chrono::{DateTime, Utc};
use serde::Serialize;

use cartographer_core::RepoLocator;

use crate::error::HostingError;

/// File mode for regular, non-executable blobs.
pub const BLOB_MODE: &str = "100644";

/// A branch and the commit it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRef {
    pub name: String,
    pub sha: String,
}

/// A commit and its root tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub sha: String,
    pub tree_sha: String,
}

/// One file to stage in a new tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeEntry {
    pub path: String,
    pub mode: &'static str,
    pub content: String,
}

impl TreeEntry {
    pub fn blob(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            mode: BLOB_MODE,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitAuthor {
    pub name: String,
    pub email: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCommit {
    pub message: String,
    pub tree_sha: String,
    pub parents: Vec<String>,
    pub author: CommitAuthor,
}

/// An open pull request, as far as the orchestrator cares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub html_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPullRequest {
    pub title: String,
    /// `branch` or `owner:branch` for cross-fork proposals.
    pub head: String,
    pub base: String,
    pub body: String,
    pub maintainer_can_modify: bool,
}

/// Operations the pull-request lifecycle needs from a hosting service.
pub trait HostingApi {
    /// `Ok(None)` when the branch does not exist.
    fn get_branch(&self, repo: &RepoLocator, branch: &str)
        -> Result<Option<BranchRef>, HostingError>;

    fn create_branch(
        &self,
        repo: &RepoLocator,
        branch: &str,
        sha: &str,
    ) -> Result<BranchRef, HostingError>;

    fn get_commit(&self, repo: &RepoLocator, sha: &str) -> Result<Commit, HostingError>;

    /// Create a tree on top of `base_tree`; returns the new tree SHA.
    fn create_tree(
        &self,
        repo: &RepoLocator,
        base_tree: &str,
        entries: &[TreeEntry],
    ) -> Result<String, HostingError>;

    fn create_commit(&self, repo: &RepoLocator, commit: &NewCommit)
        -> Result<Commit, HostingError>;

    /// Move `branch` to `sha`. With `force == false` the update must be a
    /// fast-forward.
    fn update_branch(
        &self,
        repo: &RepoLocator,
        branch: &str,
        sha: &str,
        force: bool,
    ) -> Result<BranchRef, HostingError>;

    fn list_open_pull_requests(&self, repo: &RepoLocator)
        -> Result<Vec<PullRequest>, HostingError>;

    fn create_pull_request(
        &self,
        repo: &RepoLocator,
        pull: &NewPullRequest,
    ) -> Result<PullRequest, HostingError>;
}
