//! End-to-end sessions against on-disk stores.

use exception_quiz_core::store::validate_against;
use exception_quiz_core::{
    GameEngine, GameStatus, Level, Outcome, ProgressRepository, ProgressStore, Progression,
    QuestionBank, QuizConfig, StartMode, StoreError,
};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

const BANK: &str = r#"{
    "levels": [
        {
            "difficulty": "simple",
            "questions": [
                {"id": "s1", "prompt_code": "10 / 0", "accepted_answers": ["ZeroDivisionError"], "explanation": "division by zero"},
                {"id": "s2", "prompt_code": "[1, 2][5]", "accepted_answers": ["IndexError"], "explanation": "list index out of range"},
                {"id": "s3", "prompt_code": "{}['missing']", "accepted_answers": ["KeyError"], "explanation": "missing key"}
            ]
        },
        {
            "difficulty": "intermediate",
            "questions": [
                {"id": "i1", "prompt_code": "int('abc')", "accepted_answers": ["ValueError"], "explanation": "invalid literal"}
            ]
        },
        {
            "difficulty": "expert",
            "questions": [
                {"id": "e1", "prompt_code": "b'\\xff'.decode('utf-8')", "accepted_answers": ["UnicodeDecodeError", "UnicodeError"], "explanation": "invalid start byte"}
            ]
        }
    ]
}"#;

fn setup() -> (TempDir, QuizConfig) {
    let dir = TempDir::new().unwrap();
    let config = QuizConfig::in_dir(dir.path());
    (dir, config)
}

fn new_engine(config: &QuizConfig) -> GameEngine {
    GameEngine::new(QuestionBank::from_json(BANK).unwrap(), config.clone())
}

#[test]
fn simple_level_clears_into_intermediate() {
    let (_dir, config) = setup();
    let mut engine = new_engine(&config);
    engine.start(StartMode::Fresh, "ada").unwrap();

    let wrong = engine.submit_answer("TypeError").unwrap();
    assert!(!wrong.is_correct);
    assert_eq!(wrong.score_delta, 0);
    assert_eq!(engine.score(), 0);
    assert_eq!(engine.streak(), 0);

    engine.submit_answer("ZeroDivisionError").unwrap();
    engine.submit_answer("indexerror").unwrap();
    let third = engine.submit_answer("  KeyError ").unwrap();

    assert_eq!(
        third.progression,
        Progression::LevelUp {
            from: Level::Simple,
            to: Level::Intermediate
        }
    );
    assert_eq!(engine.current_level(), Level::Intermediate);
    assert_eq!(engine.session().current_question_index, 0);
    // three Simple answers at 1 point, plus one bonus point for the third in a row
    assert_eq!(engine.score(), 3 + 1);
    assert_eq!(engine.session().answered_count, 4);
    assert_eq!(engine.session().correct_count, 3);
}

#[test]
fn final_answer_completes_and_records_leaderboard() {
    let (_dir, config) = setup();
    let mut engine = new_engine(&config);
    engine.start(StartMode::Fresh, "ada").unwrap();

    for answer in ["ZeroDivisionError", "IndexError", "KeyError", "ValueError"] {
        assert!(engine.submit_answer(answer).unwrap().is_correct);
    }
    let last = engine.submit_answer("unicodeerror").unwrap();

    assert_eq!(last.progression, Progression::Completed);
    assert_eq!(last.canonical_match.as_deref(), Some("UnicodeError"));
    assert_eq!(engine.status(), GameStatus::Completed);
    assert!(engine.current_question().is_none());

    let board = engine.high_scores().unwrap();
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].level_reached, Level::Expert);
    assert!(board[0].completed);
    assert_eq!(board[0].player_label, "ada");
    assert_eq!(board[0].score, engine.score());
    assert!(!engine.has_saved_progress());

    let summary = engine.quit().unwrap();
    assert_eq!(summary.outcome, Outcome::Completed);
    assert_eq!(engine.high_scores().unwrap().len(), 1);
}

#[test]
fn first_run_resume_falls_back_to_fresh() {
    let (_dir, config) = setup();
    let store = ProgressStore::new(config.progress_path());
    assert!(matches!(store.load(), Err(StoreError::NotFound { .. })));

    let mut engine = new_engine(&config);
    let report = engine.start(StartMode::Resume, "ada").unwrap();
    assert!(!report.resumed);
    assert_eq!(engine.current_level(), Level::Simple);
    assert_eq!(engine.session().current_question_index, 0);
    assert_eq!(engine.current_question().unwrap().id, "s1");
}

#[test]
fn quit_then_resume_continues_where_left_off() {
    let (_dir, config) = setup();
    let mut engine = new_engine(&config);
    engine.start(StartMode::Fresh, "ada").unwrap();
    engine.submit_answer("ZeroDivisionError").unwrap();
    engine.submit_answer("nope").unwrap();
    let summary = engine.quit().unwrap();
    assert_eq!(summary.leaderboard_rank, Some(1));
    let saved_session = engine.session().clone();

    let store = ProgressStore::new(config.progress_path());
    let saved = store.load().unwrap();
    assert_eq!(saved.state, saved_session);
    assert!(validate_against(&saved, engine.bank()).is_ok());

    let mut resumed = new_engine(&config);
    let report = resumed.start(StartMode::Resume, "").unwrap();
    assert!(report.resumed);
    assert_eq!(resumed.session(), &saved_session);
    assert_eq!(resumed.player_label(), "ada");
    assert_eq!(resumed.current_question().unwrap().id, "s2");
}

#[test]
fn quit_twice_inserts_one_leaderboard_entry() {
    let (_dir, config) = setup();
    let mut engine = new_engine(&config);
    engine.start(StartMode::Fresh, "ada").unwrap();
    engine.submit_answer("ZeroDivisionError").unwrap();

    let first = engine.quit().unwrap();
    let second = engine.quit().unwrap();
    assert_eq!(first, second);
    assert_eq!(engine.high_scores().unwrap().len(), 1);
}

#[test]
fn changed_content_invalidates_saved_progress() {
    let (_dir, config) = setup();
    let mut engine = new_engine(&config);
    engine.start(StartMode::Fresh, "ada").unwrap();
    for answer in ["ZeroDivisionError", "IndexError", "KeyError"] {
        engine.submit_answer(answer).unwrap();
    }
    engine.quit().unwrap();

    // The replacement bank drops the intermediate level entirely
    let trimmed = r#"{"levels": [{"difficulty": "simple", "questions": [
        {"id": "s1", "prompt_code": "10 / 0", "accepted_answers": ["ZeroDivisionError"], "explanation": ""}
    ]}]}"#;
    let mut engine = GameEngine::new(QuestionBank::from_json(trimmed).unwrap(), config.clone());
    let report = engine.start(StartMode::Resume, "ada").unwrap();

    assert!(!report.resumed);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(engine.current_level(), Level::Simple);
    assert_eq!(engine.score(), 0);
}

#[test]
fn corrupt_progress_file_is_recovered() {
    let (_dir, config) = setup();
    fs::create_dir_all(&config.data_dir).unwrap();
    fs::write(config.progress_path(), "{ \"format_version\": 1, \"state\": ").unwrap();

    let mut engine = new_engine(&config);
    let report = engine.start(StartMode::Resume, "ada").unwrap();
    assert!(!report.resumed);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(engine.status(), GameStatus::InProgress);

    // The next save replaces the unreadable file with a valid one
    engine.submit_answer("ZeroDivisionError").unwrap();
    let saved = ProgressStore::new(config.progress_path()).load().unwrap();
    assert_eq!(saved.state.current_question_index, 1);
}

#[test]
fn leaderboard_keeps_top_entries_across_sessions() {
    let (_dir, mut config) = setup();
    config.leaderboard_size = 2;

    for (label, correct) in [("one", 1), ("three", 3), ("two", 2)] {
        let mut engine = new_engine(&config);
        engine.start(StartMode::Fresh, label).unwrap();
        for answer in ["ZeroDivisionError", "IndexError", "KeyError"].iter().take(correct) {
            engine.submit_answer(answer).unwrap();
        }
        engine.quit().unwrap();
    }

    let engine = new_engine(&config);
    let labels: Vec<String> = engine
        .high_scores()
        .unwrap()
        .into_iter()
        .map(|e| e.player_label)
        .collect();
    assert_eq!(labels, vec!["three".to_string(), "two".to_string()]);
}

#[test]
fn score_never_decreases() {
    let (_dir, config) = setup();
    let mut engine = new_engine(&config);
    engine.start(StartMode::Fresh, "ada").unwrap();

    let inputs = [
        "", "Zero", "ZeroDivisionError", "IndexError", "x", "KeyError", "KeyError", "ValueError",
        "UnicodeError",
    ];
    let mut last = 0;
    for input in inputs {
        let feedback = engine.submit_answer(input).unwrap();
        assert!(feedback.score >= last);
        if !feedback.is_correct {
            assert_eq!(feedback.score, last);
            assert_eq!(feedback.streak, 0);
        }
        last = feedback.score;
        if engine.status() != GameStatus::InProgress {
            break;
        }
    }
    assert_eq!(engine.status(), GameStatus::Completed);
}
