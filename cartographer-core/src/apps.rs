//! App descriptor discovery and loading.
//!
//! # Layout
//!
//! ```text
//! apps/
//!   billing.yaml     (one AppDescriptor per file)
//!   search.yml
//! ```
//!
//! The directory is rescanned every cycle. Only regular files ending in
//! `.yaml` or `.yml` are descriptors; anything else is ignored.

use std::path::{Path, PathBuf};

use crate::error::{io_err, ConfigError};
use crate::types::AppDescriptor;

/// A descriptor file found in the apps directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppFile {
    /// File stem, used as the app's name in logs and reports.
    pub name: String,
    pub path: PathBuf,
}

/// List the descriptor files under `dir`, sorted by file name.
///
/// An unreadable directory or entry is an error; callers treat it as fatal.
pub fn list_app_files_at(dir: &Path) -> Result<Vec<AppFile>, ConfigError> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| io_err(dir, e))? {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        if entry.file_type().map_err(|e| io_err(&path, e))?.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    Ok(paths
        .into_iter()
        .filter(|p| is_descriptor(p))
        .map(|path| AppFile {
            name: path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path,
        })
        .collect())
}

/// Load and validate a single descriptor.
///
/// Returns `ConfigError::Parse` (with path + line context) for malformed
/// YAML and the validation error for unresolvable routes or duplicate names.
pub fn load_app_at(path: &Path) -> Result<AppDescriptor, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let app: AppDescriptor = serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    app.validate()?;
    Ok(app)
}

fn is_descriptor(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
        .unwrap_or(false)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
