//! Presence/absence classification of source files against a destination.
//!
//! A file is classified by exact relative-path equality only; contents are
//! never compared.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Hex characters kept from the digest.
pub const FINGERPRINT_LEN: usize = 7;

/// Short deterministic digest naming a change-set's branch and PR.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Digest of the sorted, de-duplicated identifiers joined by commas.
    ///
    /// Input order never affects the result.
    pub fn of<I, S>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let sorted: BTreeSet<String> = identifiers
            .into_iter()
            .map(|s| s.as_ref().to_owned())
            .collect();
        let joined = sorted.into_iter().collect::<Vec<_>>().join(",");

        let mut h = Sha256::new();
        h.update(joined.as_bytes());
        let mut digest = hex::encode(h.finalize());
        digest.truncate(FINGERPRINT_LEN);
        Self(digest)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What reconciliation does with files the destination already has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdatePolicy {
    /// Content updates are not proposed. The files are listed in the PR
    /// description and left to review.
    NotImplemented,
}

/// Files one source would contribute to one destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    /// Declared source files absent from the destination, sorted.
    pub to_create: Vec<String>,
    /// Declared source files already present in the destination, sorted.
    pub to_update: Vec<String>,
    /// Fingerprint over the destination paths of `to_create`.
    pub fingerprint: Fingerprint,
}

impl ChangeSet {
    pub const UPDATE_POLICY: UpdatePolicy = UpdatePolicy::NotImplemented;

    /// Classify `declared` source files against the `existing` destination
    /// listing. `target` maps a relative file to its identifier in the
    /// destination repository; those identifiers feed the fingerprint.
    pub fn compute<F>(declared: &[String], existing: &BTreeSet<String>, target: F) -> Self
    where
        F: Fn(&str) -> String,
    {
        let declared: BTreeSet<&str> = declared.iter().map(String::as_str).collect();
        let (present, missing): (Vec<&str>, Vec<&str>) =
            declared.into_iter().partition(|f| existing.contains(*f));

        let fingerprint = Fingerprint::of(missing.iter().map(|f| target(*f)));
        Self {
            to_create: missing.into_iter().map(str::to_owned).collect(),
            to_update: present.into_iter().map(str::to_owned).collect(),
            fingerprint,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty()
    }
}
