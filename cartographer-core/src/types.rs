//! Domain types for Cartographer app descriptors.
//!
//! An app descriptor is one YAML file: the sources to copy files from, the
//! destinations to propose them to, and the routes connecting the two.
//! Descriptors are immutable once loaded.

use std::collections::HashSet;
use std::fmt;
use std::path::{Component, Path};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed name for a declared source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceName(pub String);

impl fmt::Display for SourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for SourceName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SourceName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A strongly-typed name for a declared destination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DestinationName(pub String);

impl fmt::Display for DestinationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for DestinationName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DestinationName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A hosted repository addressed as `owner/repo`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoLocator {
    owner: String,
    repo: String,
}

impl RepoLocator {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }
}

impl fmt::Display for RepoLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for RepoLocator {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches(".git");
        match trimmed.split_once('/') {
            Some((owner, repo))
                if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') =>
            {
                Ok(Self::new(owner, repo))
            }
            _ => Err(ConfigError::InvalidLocator(s.to_owned())),
        }
    }
}

impl TryFrom<String> for RepoLocator {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<RepoLocator> for String {
    fn from(locator: RepoLocator) -> Self {
        locator.to_string()
    }
}

// ---------------------------------------------------------------------------
// Descriptor records
// ---------------------------------------------------------------------------

/// A remote location plus the explicit allowlist of files to propagate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub name: SourceName,
    #[serde(rename = "github")]
    pub repo: RepoLocator,
    /// Subdirectory of the repository that becomes the staging root.
    #[serde(default)]
    pub path: String,
    /// Paths relative to the staging root.
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default, rename = "branch", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl SourceRef {
    /// The ref to fetch, treating an empty `branch:` as unset.
    pub fn reference(&self) -> Option<&str> {
        non_empty(self.reference.as_deref())
    }
}

/// True when `file` names a path inside the staging root: non-empty, not
/// absolute, and free of `..` segments.
pub fn is_staged_path(file: &str) -> bool {
    !file.trim().is_empty()
        && Path::new(file)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// A remote location to reconcile into. Its file set is discovered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationRef {
    pub name: DestinationName,
    #[serde(rename = "github")]
    pub repo: RepoLocator,
    #[serde(default)]
    pub path: String,
    /// Base branch for proposals; the remote default branch when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl DestinationRef {
    pub fn branch(&self) -> Option<&str> {
        non_empty(self.branch.as_deref())
    }

    /// Path of `relative` inside the destination repository.
    pub fn target_path(&self, relative: &str) -> String {
        let prefix = self.path.trim_matches('/');
        if prefix.is_empty() {
            relative.to_owned()
        } else {
            format!("{prefix}/{relative}")
        }
    }
}

/// Scopes which sources feed which destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub sources: Vec<SourceName>,
    pub destination: DestinationName,
    /// Reserved; parsed and carried but not used for filtering.
    #[serde(default, rename = "objectTypes")]
    pub object_types: Vec<String>,
}

/// One declarative sync description: the contents of one app file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AppDescriptor {
    #[serde(default)]
    pub sources: Vec<SourceRef>,
    #[serde(default)]
    pub destinations: Vec<DestinationRef>,
    #[serde(default)]
    pub routes: Vec<Route>,
}

impl AppDescriptor {
    pub fn source(&self, name: &SourceName) -> Option<&SourceRef> {
        self.sources.iter().find(|s| &s.name == name)
    }

    pub fn destination(&self, name: &DestinationName) -> Option<&DestinationRef> {
        self.destinations.iter().find(|d| &d.name == name)
    }

    /// Check name uniqueness, that source files stay inside their staging
    /// root, and that every route resolves.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut sources = HashSet::new();
        for source in &self.sources {
            if !sources.insert(&source.name) {
                return Err(ConfigError::DuplicateSource(source.name.clone()));
            }
            if let Some(file) = source.files.iter().find(|f| !is_staged_path(f)) {
                return Err(ConfigError::InvalidSourceFile {
                    source_name: source.name.clone(),
                    file: file.clone(),
                });
            }
        }

        let mut destinations = HashSet::new();
        for destination in &self.destinations {
            if !destinations.insert(&destination.name) {
                return Err(ConfigError::DuplicateDestination(destination.name.clone()));
            }
        }

        for (index, route) in self.routes.iter().enumerate() {
            if let Some(name) = route.sources.iter().find(|n| !sources.contains(n)) {
                return Err(ConfigError::UnknownRouteSource {
                    route: index,
                    name: name.clone(),
                });
            }
            if !destinations.contains(&route.destination) {
                return Err(ConfigError::UnknownRouteDestination {
                    route: index,
                    name: route.destination.clone(),
                });
            }
        }
        Ok(())
    }

    /// Source/destination pairs to reconcile, in declaration order.
    ///
    /// With routes declared, only routed pairs are returned (each at most
    /// once). An app without routes pairs every source with every
    /// destination. Unresolvable route entries are skipped; call
    /// [`AppDescriptor::validate`] first to reject them instead.
    pub fn pairings(&self) -> Vec<(&SourceRef, &DestinationRef)> {
        if self.routes.is_empty() {
            return self
                .sources
                .iter()
                .flat_map(|s| self.destinations.iter().map(move |d| (s, d)))
                .collect();
        }

        let mut seen = HashSet::new();
        let mut pairs = Vec::new();
        for route in &self.routes {
            let Some(destination) = self.destination(&route.destination) else {
                continue;
            };
            for name in &route.sources {
                let Some(source) = self.source(name) else {
                    continue;
                };
                if seen.insert((&source.name, &destination.name)) {
                    pairs.push((source, destination));
                }
            }
        }
        pairs
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
