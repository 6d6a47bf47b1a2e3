//! Core runtime configuration.
//!
//! Resolved once at process startup and passed into services from there.
//! Nothing below this module reads environment variables; request handlers
//! and CLI commands see only the resolved paths.

use std::path::{Path, PathBuf};

/// Base directory used when no data directory is configured.
pub const DEFAULT_DATA_DIR: &str = "/laudo_data";

const REPORTS_DIR_NAME: &str = "reports";
const DRAFTS_DIR_NAME: &str = "drafts";

/// Errors raised while resolving the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configured path was empty or whitespace-only
    #[error("Configured {0} cannot be empty")]
    EmptyPath(&'static str),
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    draft_dir: PathBuf,
}

impl CoreConfig {
    /// Create a new `CoreConfig` from explicit directories.
    pub fn new(data_dir: PathBuf, draft_dir: PathBuf) -> Result<Self, ConfigError> {
        if data_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath("data directory"));
        }
        if draft_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath("draft directory"));
        }
        Ok(Self {
            data_dir,
            draft_dir,
        })
    }

    /// Resolve the configuration from optional environment values.
    ///
    /// Empty and whitespace-only values count as unset. The data directory
    /// defaults to [`DEFAULT_DATA_DIR`]; the draft directory defaults to
    /// `drafts/` under the data directory.
    pub fn from_env_values(
        data_dir: Option<String>,
        draft_dir: Option<String>,
    ) -> Result<Self, ConfigError> {
        let data_dir = present(data_dir)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let draft_dir = present(draft_dir)
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join(DRAFTS_DIR_NAME));
        Self::new(data_dir, draft_dir)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Directory where submitted reports are stored.
    pub fn reports_dir(&self) -> PathBuf {
        self.data_dir.join(REPORTS_DIR_NAME)
    }

    /// Directory backing the file draft medium.
    pub fn draft_dir(&self) -> &Path {
        &self.draft_dir
    }
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
