//! Pull-request intents: immutable descriptions of one proposal.

use std::path::PathBuf;

use serde::Serialize;

use cartographer_core::{DestinationName, RepoLocator, SourceName};

use crate::changeset::Fingerprint;

/// A staged file and the path it gets in the target repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSpec {
    pub local: PathBuf,
    pub target: String,
}

impl FileSpec {
    pub fn new(local: impl Into<PathBuf>, target: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            target: target.into(),
        }
    }
}

/// Everything needed to propose one change-set as a pull request.
///
/// Built once per cycle by the reconciliation engine and only read after
/// that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestIntent {
    pub source: SourceName,
    pub destination: DestinationName,
    pub fingerprint: Fingerprint,

    /// Repository holding the commit branch.
    pub source_repo: RepoLocator,
    pub commit_branch: String,
    /// Branch the commit branch is cut from when it does not exist yet.
    pub base_branch: Option<String>,
    pub commit_message: String,

    /// Repository the pull request is opened against.
    pub pr_repo: RepoLocator,
    /// Branch the pull request merges into.
    pub pr_branch: Option<String>,
    pub pr_subject: String,
    pub pr_description: String,

    pub source_files: Vec<FileSpec>,
    pub author_name: String,
    pub author_email: String,
}

/// Head reference for the pull request.
///
/// Cross-fork proposals are qualified as `owner:branch`; otherwise the
/// branch name alone is used.
pub fn resolve_head(intent: &PullRequestIntent) -> String {
    if intent.pr_repo.owner() != intent.source_repo.owner() {
        format!("{}:{}", intent.source_repo.owner(), intent.commit_branch)
    } else {
        intent.commit_branch.clone()
    }
}

/// `cartographer/<source>/<fingerprint>`
pub fn commit_branch_name(source: &SourceName, fingerprint: &Fingerprint) -> String {
    format!("cartographer/{source}/{fingerprint}")
}

/// PR title; embeds the fingerprint so open proposals can be recognised.
pub fn pr_subject(
    source: &SourceName,
    destination: &DestinationName,
    fingerprint: &Fingerprint,
) -> String {
    format!("Cartographer: Update {destination} from {source} [{fingerprint}]")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent(source_owner: &str, pr_owner: &str) -> PullRequestIntent {
        let fingerprint = Fingerprint::of(["config.yaml"]);
        PullRequestIntent {
            source: SourceName::from("platform"),
            destination: DestinationName::from("billing"),
            commit_branch: commit_branch_name(&SourceName::from("platform"), &fingerprint),
            fingerprint,
            source_repo: RepoLocator::new(source_owner, "billing"),
            base_branch: Some("main".into()),
            commit_message: "sync".into(),
            pr_repo: RepoLocator::new(pr_owner, "billing"),
            pr_branch: Some("main".into()),
            pr_subject: "subject".into(),
            pr_description: String::new(),
            source_files: vec![FileSpec::new("/stage/a.txt", "a.txt")],
            author_name: "Cartographer".into(),
            author_email: "c@example.com".into(),
        }
    }

    #[test]
    fn same_owner_head_is_plain_branch() {
        let i = intent("acme", "acme");
        assert_eq!(resolve_head(&i), i.commit_branch);
    }

    #[test]
    fn cross_fork_head_is_owner_qualified() {
        let i = intent("fork-bot", "acme");
        assert_eq!(resolve_head(&i), format!("fork-bot:{}", i.commit_branch));
        assert!(!i.commit_branch.contains(':'), "intent itself is untouched");
    }

    #[test]
    fn branch_name_embeds_fingerprint() {
        let fp = Fingerprint::of(["config.yaml"]);
        assert_eq!(
            commit_branch_name(&SourceName::from("platform"), &fp),
            format!("cartographer/platform/{fp}")
        );
        assert_ne!(
            commit_branch_name(&SourceName::from("platform"), &fp),
            commit_branch_name(&SourceName::from("platform"), &Fingerprint::of(["other.yaml"]))
        );
    }
}
