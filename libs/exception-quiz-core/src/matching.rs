//! Answer matching and autocomplete for exception names.

use crate::types::Question;
use crate::vocabulary::ExceptionVocabulary;
use serde::{Deserialize, Serialize};

/// Result of comparing a typed answer to a question's accepted answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Whether the answer is considered correct.
    pub is_correct: bool,
    /// The authored answer that matched, if any.
    pub canonical_match: Option<String>,
    /// Normalized typed answer (for display).
    pub typed_normalized: String,
}

/// Canonical form of an exception name: trimmed, whitespace collapsed, lowercased.
///
/// No stemming is applied, so `"Value"` and `"ValueError"` stay distinct.
pub fn canonicalize(s: &str) -> String {
    normalize_whitespace(s).to_lowercase()
}

/// Normalize whitespace in a string (trim and collapse multiple spaces).
fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Validates answers and produces suggestions from a fixed vocabulary.
#[derive(Debug, Clone, Copy)]
pub struct AnswerMatcher<'a> {
    vocabulary: &'a ExceptionVocabulary,
}

impl<'a> AnswerMatcher<'a> {
    pub fn new(vocabulary: &'a ExceptionVocabulary) -> Self {
        Self { vocabulary }
    }

    /// Check a typed answer against `question`. Exact match after
    /// canonicalization, no partial credit.
    pub fn validate(&self, question: &Question, raw_input: &str) -> MatchResult {
        validate(question, raw_input)
    }

    /// Vocabulary names starting with `prefix`, in lexicographic order, at most `limit`.
    ///
    /// A blank prefix yields nothing.
    pub fn suggest(&self, prefix: &str, limit: usize) -> Vec<String> {
        let prefix = canonicalize(prefix);
        if prefix.is_empty() {
            return Vec::new();
        }

        self.vocabulary
            .iter()
            .filter(|(canonical, _)| canonical.starts_with(&prefix))
            .map(|(_, display)| display.to_string())
            .take(limit)
            .collect()
    }

    /// Every known exception name, sorted.
    pub fn all_exceptions(&self) -> Vec<String> {
        self.vocabulary.names().map(str::to_string).collect()
    }
}

/// Compare a typed answer to a question's accepted answers.
pub fn validate(question: &Question, raw_input: &str) -> MatchResult {
    let typed_normalized = normalize_whitespace(raw_input);
    let typed = typed_normalized.to_lowercase();

    let canonical_match = if typed.is_empty() || !question.accepted_answers.contains(&typed) {
        None
    } else {
        question
            .answers
            .iter()
            .find(|answer| canonicalize(answer) == typed)
            .cloned()
    };

    MatchResult {
        is_correct: canonical_match.is_some(),
        canonical_match,
        typed_normalized,
    }
}
