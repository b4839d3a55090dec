//! Session state machine driven by a front-end.
//!
//! ```text
//! NotStarted --start--> InProgress --last correct answer--> Completed
//!                           |
//!                           +--------quit--------> Quit
//! ```

use crate::bank::QuestionBank;
use crate::config::QuizConfig;
use crate::error::{EngineError, StoreError, Warning};
use crate::matching::AnswerMatcher;
use crate::scoring::ScoreKeeper;
use crate::store::{
    validate_against, LeaderboardRepository, LeaderboardStore, ProgressRepository, ProgressStore,
};
use crate::types::{GameStats, Level, Question, SavedProgress, ScoreEntry, SessionState};
use chrono::Utc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

type Result<T> = std::result::Result<T, EngineError>;

const DEFAULT_PLAYER_LABEL: &str = "Player";

/// How a session begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    Fresh,
    /// Continue saved progress, falling back to a fresh game.
    Resume,
}

/// Lifecycle state of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    NotStarted,
    InProgress,
    Completed,
    Quit,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not started",
            Self::InProgress => "in progress",
            Self::Completed => "completed",
            Self::Quit => "quit",
        }
    }
}

/// How a finished session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every level was cleared.
    Completed,
    Quit,
}

/// What happened to the cursor after an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progression {
    /// Wrong answer; the same question stays up.
    Retry,
    NextQuestion,
    LevelUp { from: Level, to: Level },
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartReport {
    pub resumed: bool,
    pub warnings: Vec<Warning>,
}

/// Everything a front-end needs to render the result of one answer.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerFeedback {
    pub is_correct: bool,
    pub canonical_match: Option<String>,
    pub score_delta: u32,
    pub score: u32,
    pub streak: u32,
    /// Explanation of the question just cleared; `None` on a wrong answer.
    pub explanation: Option<String>,
    pub progression: Progression,
    /// Present when this answer finished the curriculum.
    pub summary: Option<SessionSummary>,
    pub warnings: Vec<Warning>,
}

/// Final result of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub player_label: String,
    pub score: u32,
    pub level_reached: Level,
    pub correct_count: u32,
    pub answered_count: u32,
    pub elapsed: Duration,
    pub outcome: Outcome,
    /// 1-based leaderboard position, if the score was recorded and made the cut.
    pub leaderboard_rank: Option<usize>,
    pub warnings: Vec<Warning>,
}

/// Owns one play session and everything it touches.
pub struct GameEngine {
    bank: QuestionBank,
    config: QuizConfig,
    keeper: ScoreKeeper,
    progress: Box<dyn ProgressRepository>,
    leaderboard: Box<dyn LeaderboardRepository>,
    status: GameStatus,
    session: SessionState,
    player_label: String,
    /// Start of the not-yet-counted stretch of play time.
    clock: Option<Instant>,
    summary: Option<SessionSummary>,
}

impl GameEngine {
    /// Engine persisting to the files named by `config`.
    pub fn new(bank: QuestionBank, config: QuizConfig) -> Self {
        let progress = ProgressStore::new(config.progress_path());
        let leaderboard = LeaderboardStore::new(config.leaderboard_path());
        Self::with_stores(bank, config, progress, leaderboard)
    }

    pub fn with_stores(
        bank: QuestionBank,
        config: QuizConfig,
        progress: impl ProgressRepository + 'static,
        leaderboard: impl LeaderboardRepository + 'static,
    ) -> Self {
        let keeper = ScoreKeeper::new(config.scoring.clone(), config.leaderboard_size);
        let session = SessionState::starting_at(bank.first_level());
        Self {
            bank,
            config,
            keeper,
            progress: Box::new(progress),
            leaderboard: Box::new(leaderboard),
            status: GameStatus::NotStarted,
            session,
            player_label: DEFAULT_PLAYER_LABEL.to_string(),
            clock: None,
            summary: None,
        }
    }

    /// Begin the session. Resume falls back to a fresh game when there is
    /// nothing usable on disk.
    pub fn start(&mut self, mode: StartMode, player_label: &str) -> Result<StartReport> {
        if self.status != GameStatus::NotStarted {
            return Err(EngineError::AlreadyStarted);
        }

        let mut report = StartReport {
            resumed: false,
            warnings: Vec::new(),
        };

        self.player_label = match player_label.trim() {
            "" => DEFAULT_PLAYER_LABEL.to_string(),
            label => label.to_string(),
        };
        self.session = SessionState::starting_at(self.bank.first_level());

        if mode == StartMode::Resume {
            match self.load_resumable() {
                Ok(Some(saved)) => {
                    self.session = saved.state;
                    self.player_label = saved.player_label;
                    report.resumed = true;
                }
                Ok(None) => {
                    debug!("saved progress belongs to a finished session, starting fresh");
                }
                Err(StoreError::NotFound { .. }) => {
                    debug!("no saved progress, starting fresh");
                }
                Err(e @ StoreError::Stale { .. }) => {
                    warn!(error = %e, "discarding stale progress");
                    report.warnings.push(Warning::StaleProgress);
                }
                Err(e) => {
                    warn!(error = %e, "could not read saved progress");
                    report.warnings.push(Warning::ProgressUnreadable);
                }
            }
        }

        self.status = GameStatus::InProgress;
        self.clock = Some(Instant::now());
        info!(
            player = %self.player_label,
            resumed = report.resumed,
            level = %self.session.current_level,
            index = self.session.current_question_index,
            "session started"
        );
        Ok(report)
    }

    /// `None` when the saved record is a finished-session marker.
    fn load_resumable(&self) -> std::result::Result<Option<SavedProgress>, StoreError> {
        let saved = self.progress.load()?;
        if saved.finished {
            return Ok(None);
        }
        validate_against(&saved, &self.bank)?;
        Ok(Some(saved))
    }

    /// Check an answer for the current question.
    ///
    /// A wrong answer keeps the cursor in place; the player retries until
    /// correct.
    pub fn submit_answer(&mut self, text: &str) -> Result<AnswerFeedback> {
        self.ensure_in_progress()?;

        let level = self.session.current_level;
        let (result, explanation) = {
            let question = self
                .bank
                .question(level, self.session.current_question_index)
                .ok_or(EngineError::NotInProgress {
                    status: self.status.as_str(),
                })?;
            let matcher = AnswerMatcher::new(self.bank.vocabulary());
            (matcher.validate(question, text), question.explanation.clone())
        };

        self.tick();
        let attempt = self
            .keeper
            .record_attempt(level, self.session.streak, result.is_correct);
        self.session.answered_count = self.session.answered_count.saturating_add(1);
        self.session.streak = attempt.streak;
        self.session.score = self.session.score.saturating_add(attempt.score_delta);

        let progression = if result.is_correct {
            self.session.correct_count = self.session.correct_count.saturating_add(1);
            self.advance()
        } else {
            Progression::Retry
        };

        debug!(
            correct = result.is_correct,
            delta = attempt.score_delta,
            score = self.session.score,
            streak = self.session.streak,
            ?progression,
            "answer recorded"
        );

        let mut warnings = Vec::new();
        let summary = if progression == Progression::Completed {
            let summary = self.finish(Outcome::Completed);
            warnings.extend(summary.warnings.iter().copied());
            Some(summary)
        } else {
            self.save_progress(&mut warnings);
            None
        };

        Ok(AnswerFeedback {
            is_correct: result.is_correct,
            canonical_match: result.canonical_match,
            score_delta: attempt.score_delta,
            score: self.session.score,
            streak: self.session.streak,
            explanation: result.is_correct.then_some(explanation),
            progression,
            summary,
            warnings,
        })
    }

    fn advance(&mut self) -> Progression {
        let level = self.session.current_level;
        let next_index = self.session.current_question_index + 1;

        if next_index < self.bank.questions_for(level).len() {
            self.session.current_question_index = next_index;
            return Progression::NextQuestion;
        }

        match self.bank.next_level(level) {
            Some(next) => {
                info!(from = %level, to = %next, "level cleared");
                self.session.current_level = next;
                self.session.current_question_index = 0;
                Progression::LevelUp { from: level, to: next }
            }
            None => {
                self.session.current_question_index = next_index;
                self.status = GameStatus::Completed;
                Progression::Completed
            }
        }
    }

    /// Autocomplete for the answer box. No effect on the session.
    pub fn request_hint_suggestions(&self, prefix: &str) -> Vec<String> {
        AnswerMatcher::new(self.bank.vocabulary()).suggest(prefix, self.config.suggestion_limit)
    }

    /// Every known exception name, sorted.
    pub fn all_exceptions(&self) -> Vec<String> {
        AnswerMatcher::new(self.bank.vocabulary()).all_exceptions()
    }

    /// End the session early, saving progress and recording the score.
    ///
    /// Calling it again returns the same summary without touching storage.
    pub fn quit(&mut self) -> Result<SessionSummary> {
        match self.status {
            GameStatus::NotStarted => Err(EngineError::NotStarted),
            GameStatus::InProgress => Ok(self.finish(Outcome::Quit)),
            GameStatus::Completed | GameStatus::Quit => {
                self.summary.clone().ok_or(EngineError::NotStarted)
            }
        }
    }

    fn finish(&mut self, outcome: Outcome) -> SessionSummary {
        self.tick();
        self.clock = None;

        let mut warnings = Vec::new();
        let completed = outcome == Outcome::Completed;
        match outcome {
            Outcome::Quit => {
                self.status = GameStatus::Quit;
                self.save_progress(&mut warnings);
            }
            Outcome::Completed => {
                self.status = GameStatus::Completed;
                if let Err(e) = self.progress.clear() {
                    warn!(error = %e, "could not clear finished progress");
                    warnings.push(Warning::ProgressNotCleared);
                    // Overwrite the record so a resume cannot replay this run
                    if let Err(e) = self.progress.save(&self.snapshot(true)) {
                        warn!(error = %e, "could not mark progress as finished");
                    }
                }
            }
        }

        let level_reached = self.session.current_level;
        let entry = self.keeper.finalize(
            &self.session,
            &self.player_label,
            level_reached,
            completed,
            Utc::now(),
        );
        let leaderboard_rank = self.record_score(entry, &mut warnings);

        let summary = SessionSummary {
            player_label: self.player_label.clone(),
            score: self.session.score,
            level_reached,
            correct_count: self.session.correct_count,
            answered_count: self.session.answered_count,
            elapsed: self.session.elapsed,
            outcome,
            leaderboard_rank,
            warnings,
        };
        info!(
            player = %summary.player_label,
            score = summary.score,
            level = %summary.level_reached,
            ?outcome,
            "session finished"
        );
        self.summary = Some(summary.clone());
        summary
    }

    fn record_score(&self, entry: ScoreEntry, warnings: &mut Vec<Warning>) -> Option<usize> {
        // An unreadable board is left alone rather than overwritten
        let board = match self.leaderboard.load() {
            Ok(board) => board,
            Err(e) => {
                warn!(error = %e, "could not read leaderboard");
                warnings.push(Warning::LeaderboardNotSaved);
                return None;
            }
        };

        let merged = self.keeper.merge_into_leaderboard(entry.clone(), board);
        if let Err(e) = self.leaderboard.save(&merged) {
            warn!(error = %e, "could not save leaderboard");
            warnings.push(Warning::LeaderboardNotSaved);
            return None;
        }
        self.keeper.rank_of(&entry, &merged)
    }

    fn snapshot(&self, finished: bool) -> SavedProgress {
        SavedProgress {
            format_version: SavedProgress::FORMAT_VERSION,
            player_label: self.player_label.clone(),
            state: self.session.clone(),
            question_id: self
                .bank
                .question(self.session.current_level, self.session.current_question_index)
                .map(|q| q.id.clone()),
            finished,
            saved_at: Utc::now(),
        }
    }

    fn save_progress(&self, warnings: &mut Vec<Warning>) {
        if let Err(e) = self.progress.save(&self.snapshot(false)) {
            warn!(error = %e, "could not save progress");
            warnings.push(Warning::ProgressNotSaved);
        }
    }

    /// Fold time since the last checkpoint into the session.
    fn tick(&mut self) {
        if let Some(started) = self.clock {
            let now = Instant::now();
            self.session.elapsed += now.duration_since(started);
            self.clock = Some(now);
        }
    }

    fn ensure_in_progress(&self) -> Result<()> {
        match self.status {
            GameStatus::InProgress => Ok(()),
            GameStatus::NotStarted => Err(EngineError::NotStarted),
            status => Err(EngineError::NotInProgress {
                status: status.as_str(),
            }),
        }
    }

    /// The question awaiting an answer; `None` unless in progress.
    pub fn current_question(&self) -> Option<&Question> {
        if self.status != GameStatus::InProgress {
            return None;
        }
        self.bank
            .question(self.session.current_level, self.session.current_question_index)
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn score(&self) -> u32 {
        self.session.score
    }

    pub fn streak(&self) -> u32 {
        self.session.streak
    }

    pub fn current_level(&self) -> Level {
        self.session.current_level
    }

    pub fn player_label(&self) -> &str {
        &self.player_label
    }

    /// Summary of a finished session.
    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    /// Position within the curriculum for a progress bar.
    pub fn stats(&self) -> GameStats {
        let level = self.session.current_level;
        let level_question_count = self.bank.questions_for(level).len();
        let index = self.session.current_question_index.min(level_question_count);
        let total_questions = self.bank.total_question_count();
        let completed_questions = self.bank.questions_before(level) + index;

        GameStats {
            total_questions,
            completed_questions,
            level_question_count,
            question_number: (index + 1).min(level_question_count),
            progress_percent: if total_questions > 0 {
                completed_questions as f64 * 100.0 / total_questions as f64
            } else {
                0.0
            },
        }
    }

    /// The stored leaderboard, best first.
    pub fn high_scores(&self) -> std::result::Result<Vec<ScoreEntry>, Warning> {
        self.leaderboard.load().map_err(|e| {
            warn!(error = %e, "could not read leaderboard");
            Warning::LeaderboardUnavailable
        })
    }

    /// Whether `start(StartMode::Resume)` would pick up a saved game.
    pub fn has_saved_progress(&self) -> bool {
        self.progress.exists() && matches!(self.load_resumable(), Ok(Some(_)))
    }
}
