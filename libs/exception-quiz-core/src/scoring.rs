//! Scoring policy, streak bonuses and leaderboard merging.

use crate::types::{Level, ScoreEntry, SessionState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point values awarded per correct answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    pub simple_points: u32,
    pub intermediate_points: u32,
    pub expert_points: u32,
    /// Consecutive correct answers needed per bonus point.
    pub streak_step: u32,
    pub max_streak_bonus: u32,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            simple_points: 1,
            intermediate_points: 2,
            expert_points: 3,
            streak_step: 3,
            max_streak_bonus: 3,
        }
    }
}

impl ScoringPolicy {
    pub fn base_points(&self, level: Level) -> u32 {
        match level {
            Level::Simple => self.simple_points,
            Level::Intermediate => self.intermediate_points,
            Level::Expert => self.expert_points,
        }
    }

    /// `floor(streak / step)`, capped at `max_streak_bonus`.
    pub fn streak_bonus(&self, streak: u32) -> u32 {
        if self.streak_step == 0 {
            return 0;
        }
        (streak / self.streak_step).min(self.max_streak_bonus)
    }
}

/// Outcome of recording one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    pub streak: u32,
    pub score_delta: u32,
}

/// Applies a [`ScoringPolicy`] and maintains a bounded leaderboard.
#[derive(Debug, Clone)]
pub struct ScoreKeeper {
    pub policy: ScoringPolicy,
    pub max_entries: usize,
}

impl Default for ScoreKeeper {
    fn default() -> Self {
        Self {
            policy: ScoringPolicy::default(),
            max_entries: 10,
        }
    }
}

impl ScoreKeeper {
    pub fn new(policy: ScoringPolicy, max_entries: usize) -> Self {
        Self {
            policy,
            max_entries,
        }
    }

    /// Score one answer given the streak before it.
    ///
    /// The bonus uses the streak including this answer. Wrong answers reset
    /// the streak and never subtract points.
    pub fn record_attempt(&self, level: Level, streak_before: u32, is_correct: bool) -> Attempt {
        if !is_correct {
            return Attempt {
                streak: 0,
                score_delta: 0,
            };
        }

        let streak = streak_before.saturating_add(1);
        Attempt {
            streak,
            score_delta: self.policy.base_points(level) + self.policy.streak_bonus(streak),
        }
    }

    /// Freeze a session into a leaderboard entry.
    pub fn finalize(
        &self,
        session: &SessionState,
        player_label: &str,
        level_reached: Level,
        completed: bool,
        now: DateTime<Utc>,
    ) -> ScoreEntry {
        ScoreEntry {
            player_label: player_label.to_string(),
            score: session.score,
            level_reached,
            completed,
            timestamp: now,
        }
    }

    /// Insert `entry`, sort by score descending (earlier timestamp wins
    /// ties), and keep at most `max_entries`.
    pub fn merge_into_leaderboard(
        &self,
        entry: ScoreEntry,
        existing_board: Vec<ScoreEntry>,
    ) -> Vec<ScoreEntry> {
        let mut board = existing_board;
        board.push(entry);
        board.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.timestamp.cmp(&b.timestamp))
        });
        board.truncate(self.max_entries);
        board
    }

    /// 1-based position of `entry` on `board`, if it made the cut.
    pub fn rank_of(&self, entry: &ScoreEntry, board: &[ScoreEntry]) -> Option<usize> {
        board.iter().position(|e| e == entry).map(|idx| idx + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn entry(label: &str, score: u32, secs: i64) -> ScoreEntry {
        ScoreEntry {
            player_label: label.to_string(),
            score,
            level_reached: Level::Simple,
            completed: false,
            timestamp: at(secs),
        }
    }

    #[test]
    fn base_points_scale_with_level() {
        let keeper = ScoreKeeper::default();
        assert_eq!(keeper.record_attempt(Level::Simple, 0, true).score_delta, 1);
        assert_eq!(keeper.record_attempt(Level::Intermediate, 0, true).score_delta, 2);
        assert_eq!(keeper.record_attempt(Level::Expert, 0, true).score_delta, 3);
    }

    #[test]
    fn streak_bonus_every_third_answer() {
        let keeper = ScoreKeeper::default();
        let deltas: Vec<u32> = (0..6)
            .map(|streak| keeper.record_attempt(Level::Simple, streak, true).score_delta)
            .collect();
        // streaks 1..=6 -> bonus 0,0,1,1,1,2
        assert_eq!(deltas, vec![1, 1, 2, 2, 2, 3]);
    }

    #[test]
    fn streak_bonus_is_capped() {
        let keeper = ScoreKeeper::default();
        let attempt = keeper.record_attempt(Level::Expert, 99, true);
        assert_eq!(attempt.streak, 100);
        assert_eq!(attempt.score_delta, 3 + 3);
    }

    #[test]
    fn incorrect_resets_streak_without_penalty() {
        let keeper = ScoreKeeper::default();
        let attempt = keeper.record_attempt(Level::Expert, 7, false);
        assert_eq!(attempt, Attempt { streak: 0, score_delta: 0 });
    }

    #[test]
    fn zero_step_disables_bonus() {
        let policy = ScoringPolicy {
            streak_step: 0,
            ..ScoringPolicy::default()
        };
        assert_eq!(policy.streak_bonus(12), 0);
    }

    #[test]
    fn finalize_copies_session_score() {
        let keeper = ScoreKeeper::default();
        let session = SessionState {
            score: 17,
            ..SessionState::starting_at(Level::Expert)
        };
        let result = keeper.finalize(&session, "ada", Level::Expert, true, at(0));
        assert_eq!(
            result,
            ScoreEntry {
                player_label: "ada".to_string(),
                score: 17,
                level_reached: Level::Expert,
                completed: true,
                timestamp: at(0),
            }
        );
    }

    #[test]
    fn merge_sorts_descending_and_breaks_ties_by_time() {
        let keeper = ScoreKeeper::default();
        let board = vec![entry("late", 5, 20), entry("high", 9, 30)];
        let merged = keeper.merge_into_leaderboard(entry("early", 5, 10), board);
        let labels: Vec<&str> = merged.iter().map(|e| e.player_label.as_str()).collect();
        assert_eq!(labels, vec!["high", "early", "late"]);
    }

    #[test]
    fn merge_evicts_lowest_on_overflow() {
        let keeper = ScoreKeeper::new(ScoringPolicy::default(), 3);
        let board = vec![entry("a", 10, 0), entry("b", 8, 1), entry("c", 6, 2)];

        let merged = keeper.merge_into_leaderboard(entry("d", 7, 3), board);
        let labels: Vec<&str> = merged.iter().map(|e| e.player_label.as_str()).collect();
        assert_eq!(labels, vec!["a", "b", "d"]);

        let newcomer = entry("e", 1, 4);
        let merged = keeper.merge_into_leaderboard(newcomer.clone(), merged);
        assert_eq!(merged.len(), 3);
        assert_eq!(keeper.rank_of(&newcomer, &merged), None);
    }

    #[test]
    fn rank_of_is_one_based() {
        let keeper = ScoreKeeper::default();
        let mine = entry("me", 4, 5);
        let merged = keeper.merge_into_leaderboard(mine.clone(), vec![entry("top", 9, 0)]);
        assert_eq!(keeper.rank_of(&mine, &merged), Some(2));
    }
}
