//! Core types for the exception quiz.

use crate::matching::canonicalize;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

/// Difficulty tier. Levels are traversed in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Simple,
    Intermediate,
    Expert,
}

impl Default for Level {
    fn default() -> Self {
        Self::Simple
    }
}

impl Level {
    /// Every level, easiest first.
    pub const ALL: [Level; 3] = [Self::Simple, Self::Intermediate, Self::Expert];

    /// Get the level name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Intermediate => "intermediate",
            Self::Expert => "expert",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "simple" => Some(Self::Simple),
            "intermediate" => Some(Self::Intermediate),
            "expert" => Some(Self::Expert),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single quiz question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub level: Level,
    /// Code snippet shown to the player.
    pub prompt_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Accepted exception names as authored, for display.
    pub answers: Vec<String>,
    /// Canonical forms of `answers`.
    pub accepted_answers: BTreeSet<String>,
    pub explanation: String,
}

impl Question {
    /// Build a question, canonicalizing its accepted answers.
    ///
    /// Blank answers are dropped and duplicates (by canonical form) keep
    /// their first spelling.
    pub fn new(
        id: impl Into<String>,
        level: Level,
        prompt_code: impl Into<String>,
        answers: impl IntoIterator<Item = impl AsRef<str>>,
        explanation: impl Into<String>,
    ) -> Self {
        let mut accepted_answers = BTreeSet::new();
        let mut display = Vec::new();
        for answer in answers {
            let trimmed = answer.as_ref().trim();
            if trimmed.is_empty() {
                continue;
            }
            if accepted_answers.insert(canonicalize(trimmed)) {
                display.push(trimmed.to_string());
            }
        }

        Self {
            id: id.into(),
            level,
            prompt_code: prompt_code.into(),
            context: None,
            answers: display,
            accepted_answers,
            explanation: explanation.into(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        self.context = if context.trim().is_empty() {
            None
        } else {
            Some(context)
        };
        self
    }

    /// First authored answer, shown as "the" correct answer.
    pub fn primary_answer(&self) -> Option<&str> {
        self.answers.first().map(String::as_str)
    }
}

/// Live state of one play session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub current_level: Level,
    /// Zero-based index into the current level's questions.
    pub current_question_index: usize,
    pub score: u32,
    pub streak: u32,
    pub answered_count: u32,
    pub correct_count: u32,
    pub elapsed: Duration,
}

impl SessionState {
    /// Fresh state positioned at the first question of `level`.
    pub fn starting_at(level: Level) -> Self {
        Self {
            current_level: level,
            current_question_index: 0,
            score: 0,
            streak: 0,
            answered_count: 0,
            correct_count: 0,
            elapsed: Duration::ZERO,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::starting_at(Level::default())
    }
}

/// One leaderboard row. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub player_label: String,
    pub score: u32,
    pub level_reached: Level,
    /// Whether the player cleared every level.
    #[serde(default)]
    pub completed: bool,
    pub timestamp: DateTime<Utc>,
}

/// On-disk projection of a session, enough to resume it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedProgress {
    pub format_version: u32,
    pub player_label: String,
    pub state: SessionState,
    /// Id of the question under the cursor when saved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
    /// Set when the session ended but the record could not be removed.
    /// A finished record is never resumed.
    #[serde(default)]
    pub finished: bool,
    pub saved_at: DateTime<Utc>,
}

impl SavedProgress {
    pub const FORMAT_VERSION: u32 = 1;
}

/// Progress numbers for live display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStats {
    pub total_questions: usize,
    pub completed_questions: usize,
    pub level_question_count: usize,
    /// 1-based position within the current level.
    pub question_number: usize,
    pub progress_percent: f64,
}
