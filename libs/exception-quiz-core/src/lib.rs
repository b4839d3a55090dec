//! Core engine for the exception quiz, shared by every front-end.
//!
//! Provides:
//! - Question bank loading and level progression
//! - Answer validation and prefix autocomplete over known exception names
//! - Scoring with streak bonuses and a bounded leaderboard
//! - Atomic save/load of session progress and high scores
//! - A session state machine (`GameEngine`) that front-ends drive

pub mod bank;
pub mod config;
pub mod engine;
pub mod error;
pub mod matching;
pub mod scoring;
pub mod store;
pub mod types;
pub mod vocabulary;

pub use bank::QuestionBank;
pub use config::QuizConfig;
pub use engine::{
    AnswerFeedback, GameEngine, GameStatus, Outcome, Progression, SessionSummary, StartMode,
    StartReport,
};
pub use error::{ConfigError, ContentError, EngineError, StoreError, Warning};
pub use matching::{canonicalize, AnswerMatcher, MatchResult};
pub use scoring::{Attempt, ScoreKeeper, ScoringPolicy};
pub use store::{LeaderboardRepository, LeaderboardStore, ProgressRepository, ProgressStore};
pub use types::{GameStats, Level, Question, SavedProgress, ScoreEntry, SessionState};
pub use vocabulary::ExceptionVocabulary;
