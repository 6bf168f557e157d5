//! Disposable staging tree for fetched repositories.
//!
//! ```text
//! <staging>/
//!   <app>/
//!     sources/<source_name>/            (source subpath, files relative to here)
//!     destinations/<destination_name>/  (destination subpath)
//! ```
//!
//! The whole tree belongs to the running cycle and is wiped at cycle start
//! and end.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use cartographer_core::{DestinationName, SourceName};

use crate::error::{io_err, SyncError};

/// Staging paths for one app within the cycle's staging root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    pub fn new(staging_root: &Path, app: &str) -> Self {
        Self {
            root: staging_root.join(app),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source_dir(&self, name: &SourceName) -> PathBuf {
        self.root.join("sources").join(&name.0)
    }

    pub fn destination_dir(&self, name: &DestinationName) -> PathBuf {
        self.root.join("destinations").join(&name.0)
    }
}

/// Every file below `root`, as `/`-separated paths relative to `root`.
///
/// The root itself and `.git` directories are excluded.
pub fn list_files(root: &Path) -> Result<BTreeSet<String>, SyncError> {
    let mut files = BTreeSet::new();
    let mut dirs = vec![root.to_path_buf()];
    while let Some(current) = dirs.pop() {
        let entries = std::fs::read_dir(&current).map_err(|e| io_err(&current, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| io_err(&current, e))?;
            let path = entry.path();
            let ty = entry.file_type().map_err(|e| io_err(&path, e))?;
            if ty.is_dir() {
                if entry.file_name() != ".git" {
                    dirs.push(path);
                }
                continue;
            }
            if let Some(relative) = relative_key(root, &path) {
                files.insert(relative);
            }
        }
    }
    Ok(files)
}

/// Remove a staging tree. A tree that is already gone is not an error.
pub fn wipe(root: &Path) -> Result<(), SyncError> {
    match std::fs::remove_dir_all(root) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(io_err(root, err)),
    }
}

fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lists_nested_files_relative_to_root() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        std::fs::create_dir_all(root.join("deploy/base")).unwrap();
        std::fs::create_dir_all(root.join(".git/objects")).unwrap();
        std::fs::write(root.join("a.txt"), "a").unwrap();
        std::fs::write(root.join("deploy/base/kustomization.yaml"), "k").unwrap();
        std::fs::write(root.join(".git/HEAD"), "ref").unwrap();
        std::fs::create_dir_all(root.join("empty")).unwrap();

        let files = list_files(root).unwrap();
        let files: Vec<_> = files.iter().map(String::as_str).collect();
        assert_eq!(files, vec!["a.txt", "deploy/base/kustomization.yaml"]);
    }

    #[test]
    fn wipe_tolerates_missing_tree() {
        let tmp = TempDir::new().unwrap();
        let staged = tmp.path().join("repos");
        wipe(&staged).expect("missing tree");
        std::fs::create_dir_all(staged.join("app/sources/a")).unwrap();
        wipe(&staged).expect("wipe");
        assert!(!staged.exists());
    }

    #[test]
    fn staging_paths_are_scoped_per_app() {
        let area = StagingArea::new(Path::new("/tmp/repos"), "billing");
        assert_eq!(
            area.source_dir(&SourceName::from("platform")),
            PathBuf::from("/tmp/repos/billing/sources/platform")
        );
        assert_eq!(
            area.destination_dir(&DestinationName::from("svc")),
            PathBuf::from("/tmp/repos/billing/destinations/svc")
        );
    }
}
