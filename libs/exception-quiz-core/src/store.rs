//! File-backed persistence for progress and high scores.
//!
//! Both stores write JSON through a temp file in the destination directory
//! that is renamed over the target, so a failed write never leaves a
//! half-written file behind.

use crate::bank::QuestionBank;
use crate::error::StoreError;
use crate::types::{SavedProgress, ScoreEntry};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

type Result<T> = std::result::Result<T, StoreError>;

/// Repository for the single saved-progress record.
pub trait ProgressRepository {
    fn save(&self, progress: &SavedProgress) -> Result<()>;
    /// Returns [`StoreError::NotFound`] when nothing has been saved.
    fn load(&self) -> Result<SavedProgress>;
    fn clear(&self) -> Result<()>;
    fn exists(&self) -> bool;
}

/// Repository for the high-score table.
pub trait LeaderboardRepository {
    /// Returns an empty board when nothing has been saved.
    fn load(&self) -> Result<Vec<ScoreEntry>>;
    fn save(&self, board: &[ScoreEntry]) -> Result<()>;
}

/// Saved progress stored as a JSON file.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressRepository for ProgressStore {
    fn save(&self, progress: &SavedProgress) -> Result<()> {
        write_json_atomic(&self.path, progress)?;
        debug!(
            path = %self.path.display(),
            level = %progress.state.current_level,
            index = progress.state.current_question_index,
            "saved progress"
        );
        Ok(())
    }

    fn load(&self) -> Result<SavedProgress> {
        let progress: SavedProgress = read_json(&self.path)?.ok_or_else(|| StoreError::NotFound {
            path: self.path.clone(),
        })?;
        if progress.format_version != SavedProgress::FORMAT_VERSION {
            return Err(StoreError::Corrupt {
                path: self.path.clone(),
                reason: format!(
                    "unsupported format version {} (expected {})",
                    progress.format_version,
                    SavedProgress::FORMAT_VERSION
                ),
            });
        }
        Ok(progress)
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io("remove", &self.path, e)),
        }
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }
}

/// High scores stored as a JSON array.
#[derive(Debug, Clone)]
pub struct LeaderboardStore {
    path: PathBuf,
}

impl LeaderboardStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LeaderboardRepository for LeaderboardStore {
    fn load(&self) -> Result<Vec<ScoreEntry>> {
        Ok(read_json(&self.path)?.unwrap_or_default())
    }

    fn save(&self, board: &[ScoreEntry]) -> Result<()> {
        write_json_atomic(&self.path, board)?;
        debug!(path = %self.path.display(), entries = board.len(), "saved leaderboard");
        Ok(())
    }
}

/// Check that saved progress still points at a real question.
pub fn validate_against(progress: &SavedProgress, bank: &QuestionBank) -> Result<()> {
    let state = &progress.state;
    if !bank.contains_level(state.current_level) {
        return Err(StoreError::Stale {
            reason: format!("level {} is not in the question bank", state.current_level),
        });
    }

    let question = bank
        .question(state.current_level, state.current_question_index)
        .ok_or_else(|| StoreError::Stale {
            reason: format!(
                "level {} has no question {}",
                state.current_level,
                state.current_question_index + 1
            ),
        })?;

    if let Some(saved_id) = &progress.question_id {
        if *saved_id != question.id {
            return Err(StoreError::Stale {
                reason: format!(
                    "question {} of level {} is now {}, was {}",
                    state.current_question_index + 1,
                    state.current_level,
                    question.id,
                    saved_id
                ),
            });
        }
    }

    Ok(())
}

/// Read and parse `path`, returning `None` if it does not exist.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::io("read", path, e)),
    };

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| StoreError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Serialize `value` next to `path`, then swap it into place.
fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(|e| StoreError::io("create directory", &dir, e))?;

    let mut temp = NamedTempFile::new_in(&dir).map_err(|e| StoreError::io("create temp file in", &dir, e))?;
    temp.write_all(content.as_bytes())
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| StoreError::io("write", temp.path().to_path_buf(), e))?;

    // Dropping the temp file on error removes it
    temp.persist(path)
        .map_err(|e| StoreError::io("replace", path, e.error))?;
    Ok(())
}
