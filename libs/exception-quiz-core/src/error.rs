//! Error types for exception-quiz-core.

use crate::types::Level;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using ContentError.
pub type Result<T> = std::result::Result<T, ContentError>;

/// Errors that can occur while loading a question bank.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read question bank {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed question bank: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("question bank defines no levels")]
    NoLevels,

    #[error("level {level} is defined more than once")]
    DuplicateLevel { level: Level },

    #[error("level {level} has no questions")]
    EmptyLevel { level: Level },

    #[error("question {id} has no accepted answers")]
    MissingAnswers { id: String },

    #[error("question {position} of level {level} has a blank id")]
    BlankId { level: Level, position: usize },

    #[error("duplicate question id {id}")]
    DuplicateId { id: String },
}

/// Errors from the progress and leaderboard stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no saved data at {path}")]
    NotFound { path: PathBuf },

    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt data in {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("saved progress no longer matches the question bank: {reason}")]
    Stale { reason: String },

    #[error("failed to serialize: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

/// Errors from reading a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from calling the engine in the wrong state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("no session has been started")]
    NotStarted,

    #[error("a session has already been started")]
    AlreadyStarted,

    #[error("session is {status}, not in progress")]
    NotInProgress { status: &'static str },
}

/// Non-fatal problems surfaced to the player.
///
/// The `Display` text is safe to show on screen. Full diagnostics go to the
/// log where the failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warning {
    ProgressNotSaved,
    /// A finished game is still on disk; it is marked so it cannot be resumed.
    ProgressNotCleared,
    ProgressUnreadable,
    StaleProgress,
    LeaderboardNotSaved,
    LeaderboardUnavailable,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Self::ProgressNotSaved => "Your progress could not be saved. You can keep playing.",
            Self::ProgressNotCleared => "Your finished game could not be removed from your saves.",
            Self::ProgressUnreadable => "Your saved game could not be read, so a new game was started.",
            Self::StaleProgress => "The questions changed since your last game, so a new game was started.",
            Self::LeaderboardNotSaved => "Your score could not be added to the high scores.",
            Self::LeaderboardUnavailable => "High scores are unavailable right now.",
        };
        f.write_str(message)
    }
}
