//! Engine configuration.

use crate::error::ConfigError;
use crate::scoring::ScoringPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding [`QuizConfig::data_dir`].
pub const DATA_DIR_ENV: &str = "EXCEPTION_QUIZ_DATA_DIR";

const APP_DIR_NAME: &str = "exception-quiz";

/// Where the engine keeps its files and how it scores.
///
/// All fields are optional in a config file; missing ones take defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
    pub data_dir: PathBuf,
    pub progress_file: String,
    pub leaderboard_file: String,
    pub leaderboard_size: usize,
    pub suggestion_limit: usize,
    pub scoring: ScoringPolicy,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self::in_dir(default_data_dir())
    }
}

impl QuizConfig {
    /// Defaults rooted at `data_dir`.
    pub fn in_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            progress_file: "progress.json".to_string(),
            leaderboard_file: "highscores.json".to_string(),
            leaderboard_size: 10,
            suggestion_limit: 10,
            scoring: ScoringPolicy::default(),
        }
    }

    /// Load a JSON config file over the defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply environment overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        self
    }

    pub fn progress_path(&self) -> PathBuf {
        self.data_dir.join(&self.progress_file)
    }

    pub fn leaderboard_path(&self) -> PathBuf {
        self.data_dir.join(&self.leaderboard_file)
    }
}

fn default_data_dir() -> PathBuf {
    // Use app data directory when available, fallback to current dir
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}
