//! Runtime settings and the hosting API token.
//!
//! Cartographer takes no flags for its core loop. Everything comes from
//! files relative to the working directory:
//!
//! ```text
//! ./cartographer.yaml   (optional; every key defaulted)
//! ./apps/*.yaml         (app descriptors)
//! ./secret/token        (hosting API bearer token)
//! ./repos/              (staging, wiped every cycle)
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};

pub const SETTINGS_FILE: &str = "cartographer.yaml";

/// Log output format for the runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Process-wide settings, loaded once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub apps_dir: PathBuf,
    pub staging_dir: PathBuf,
    pub token_path: PathBuf,
    /// Sleep between reconciliation cycles.
    pub interval_secs: u64,
    pub author_name: String,
    pub author_email: String,
    pub log_format: LogFormat,
    pub api_base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            apps_dir: PathBuf::from("apps"),
            staging_dir: PathBuf::from("repos"),
            token_path: PathBuf::from("secret").join("token"),
            interval_secs: 60,
            author_name: "Cartographer".to_string(),
            author_email: "cartographer@users.noreply.github.com".to_string(),
            log_format: LogFormat::Text,
            api_base_url: "https://api.github.com".to_string(),
        }
    }
}

impl Settings {
    /// Load `<root>/cartographer.yaml` if present, else defaults.
    ///
    /// Relative paths in the result are resolved against `root`.
    pub fn load_at(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(SETTINGS_FILE);
        let settings = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
            serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse { path, source: e })?
        } else {
            Self::default()
        };
        Ok(settings.resolved_against(root))
    }

    fn resolved_against(mut self, root: &Path) -> Self {
        for path in [
            &mut self.apps_dir,
            &mut self.staging_dir,
            &mut self.token_path,
        ] {
            if path.is_relative() {
                *path = root.join(&*path);
            }
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// Bearer token for the hosting API. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

/// Read the token file, trimming the trailing newline.
///
/// A missing, unreadable or blank file is an error; the runner treats it
/// as fatal.
pub fn load_token_at(path: &Path) -> Result<Token, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::TokenUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let token = raw.trim_end();
    if token.is_empty() {
        return Err(ConfigError::TokenEmpty {
            path: path.to_path_buf(),
        });
    }
    Ok(Token::new(token))
}
