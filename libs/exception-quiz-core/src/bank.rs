//! Question bank loading and level indexing.
//!
//! # Format
//! ```json
//! {
//!   "vocabulary": ["JSONDecodeError"],
//!   "levels": [
//!     {
//!       "difficulty": "simple",
//!       "questions": [
//!         {
//!           "id": "simple-1",
//!           "prompt_code": "int('abc')",
//!           "context": "Converting text to a number",
//!           "accepted_answers": ["ValueError"],
//!           "explanation": "int() rejects strings that are not numeric."
//!         }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! `code` is accepted as an alias for `prompt_code`, and a single
//! `correct_answer` may stand in for `accepted_answers`.

use crate::error::{ContentError, Result};
use crate::types::{Level, Question};
use crate::vocabulary::ExceptionVocabulary;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::info;

const BUILTIN_LEVELS: &str = include_str!("../data/levels.json");

#[derive(Debug, Deserialize)]
struct RawBank {
    #[serde(default)]
    vocabulary: Vec<String>,
    #[serde(default)]
    levels: Vec<RawLevel>,
}

#[derive(Debug, Deserialize)]
struct RawLevel {
    difficulty: Level,
    #[serde(default)]
    questions: Vec<RawQuestion>,
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    #[serde(default)]
    id: String,
    #[serde(alias = "code")]
    prompt_code: String,
    #[serde(default)]
    context: Option<String>,
    #[serde(default)]
    accepted_answers: Vec<String>,
    #[serde(default)]
    correct_answer: Option<String>,
    #[serde(default)]
    explanation: String,
}

/// Immutable, validated question corpus grouped by level.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    levels: BTreeMap<Level, Vec<Question>>,
    vocabulary: ExceptionVocabulary,
}

impl QuestionBank {
    /// Parse and validate a bank from JSON text.
    pub fn from_json(source: &str) -> Result<Self> {
        let raw: RawBank = serde_json::from_str(source)?;
        Self::from_raw(raw)
    }

    /// Read and parse a bank file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ContentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let bank = Self::from_json(&source)?;
        info!(
            path = %path.display(),
            questions = bank.total_question_count(),
            "loaded question bank"
        );
        Ok(bank)
    }

    /// The question bank bundled with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_LEVELS)
    }

    /// Build a bank from already-constructed questions, validated the same
    /// way as a parsed source.
    pub fn from_questions(questions: impl IntoIterator<Item = Question>) -> Result<Self> {
        let mut levels: BTreeMap<Level, Vec<Question>> = BTreeMap::new();
        for question in questions {
            levels.entry(question.level).or_default().push(question);
        }
        Self::validated(levels, ExceptionVocabulary::builtin())
    }

    fn from_raw(raw: RawBank) -> Result<Self> {
        let mut levels: BTreeMap<Level, Vec<Question>> = BTreeMap::new();
        for raw_level in raw.levels {
            let level = raw_level.difficulty;
            if levels.contains_key(&level) {
                return Err(ContentError::DuplicateLevel { level });
            }
            if raw_level.questions.is_empty() {
                return Err(ContentError::EmptyLevel { level });
            }

            let mut questions = Vec::with_capacity(raw_level.questions.len());
            for (idx, rq) in raw_level.questions.into_iter().enumerate() {
                if rq.id.trim().is_empty() {
                    return Err(ContentError::BlankId {
                        level,
                        position: idx + 1,
                    });
                }
                let answers = rq.accepted_answers.into_iter().chain(rq.correct_answer);
                let mut question = Question::new(
                    rq.id.trim(),
                    level,
                    rq.prompt_code,
                    answers,
                    rq.explanation.trim(),
                );
                if let Some(context) = rq.context {
                    question = question.with_context(context.trim());
                }
                questions.push(question);
            }
            levels.insert(level, questions);
        }

        let mut vocabulary = ExceptionVocabulary::builtin();
        vocabulary.extend(&raw.vocabulary);
        Self::validated(levels, vocabulary)
    }

    fn validated(
        levels: BTreeMap<Level, Vec<Question>>,
        mut vocabulary: ExceptionVocabulary,
    ) -> Result<Self> {
        if levels.is_empty() {
            return Err(ContentError::NoLevels);
        }

        let mut seen_ids = HashSet::new();
        for (level, questions) in &levels {
            if questions.is_empty() {
                return Err(ContentError::EmptyLevel { level: *level });
            }
            for question in questions {
                if question.accepted_answers.is_empty() {
                    return Err(ContentError::MissingAnswers {
                        id: question.id.clone(),
                    });
                }
                if !seen_ids.insert(question.id.as_str()) {
                    return Err(ContentError::DuplicateId {
                        id: question.id.clone(),
                    });
                }
            }
        }

        for questions in levels.values() {
            for question in questions {
                vocabulary.extend(&question.answers);
            }
        }

        Ok(Self { levels, vocabulary })
    }

    /// Questions of `level` in authored order; empty if the level is absent.
    pub fn questions_for(&self, level: Level) -> &[Question] {
        self.levels.get(&level).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn question(&self, level: Level, index: usize) -> Option<&Question> {
        self.questions_for(level).get(index)
    }

    /// Levels present in this bank, easiest first.
    pub fn levels(&self) -> impl Iterator<Item = Level> + '_ {
        self.levels.keys().copied()
    }

    pub fn contains_level(&self, level: Level) -> bool {
        self.levels.contains_key(&level)
    }

    pub fn first_level(&self) -> Level {
        self.levels().next().unwrap_or_default()
    }

    pub fn final_level(&self) -> Level {
        self.levels().last().unwrap_or_default()
    }

    /// The next level present after `level`, or `None` at the final level.
    pub fn next_level(&self, level: Level) -> Option<Level> {
        self.levels().find(|candidate| *candidate > level)
    }

    pub fn total_question_count(&self) -> usize {
        self.levels.values().map(Vec::len).sum()
    }

    /// Number of questions in all levels before `level`.
    pub fn questions_before(&self, level: Level) -> usize {
        self.levels
            .range(..level)
            .map(|(_, questions)| questions.len())
            .sum()
    }

    pub fn vocabulary(&self) -> &ExceptionVocabulary {
        &self.vocabulary
    }
}
