//! Question catalog loading.
//!
//! The catalog is static read-only input: a JSON array of questions loaded
//! once at startup. It is never mutated at runtime.

use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;
use tracing::warn;

use crate::models::Question;

/// Minimum number of options per question.
pub const MIN_OPTIONS: usize = 2;
/// Maximum number of options per question.
pub const MAX_OPTIONS: usize = 4;

/// Error loading or validating a question catalog.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("catalog must contain at least one question")]
    Empty,

    #[error("question {index}: expected {MIN_OPTIONS}-{MAX_OPTIONS} options, found {found}")]
    OptionCount { index: usize, found: usize },

    #[error("question {index}: time limit must be greater than zero")]
    ZeroTimeLimit { index: usize },
}

/// Load and validate a question catalog from a JSON file.
pub fn load_questions_from_json<P: AsRef<Path>>(path: P) -> Result<Vec<Question>, LoadError> {
    let path = path.as_ref();

    let json_content = fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let questions: Vec<Question> =
        serde_json::from_str(&json_content).map_err(|source| LoadError::Parse {
            path: path.display().to_string(),
            source,
        })?;

    validate(&questions)?;
    Ok(questions)
}

fn validate(questions: &[Question]) -> Result<(), LoadError> {
    if questions.is_empty() {
        return Err(LoadError::Empty);
    }

    for (index, question) in questions.iter().enumerate() {
        let found = question.options.len();
        if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&found) {
            return Err(LoadError::OptionCount { index, found });
        }

        if question.time_limit_seconds == 0 {
            return Err(LoadError::ZeroTimeLimit { index });
        }

        // An unmatchable correct answer is allowed (it means "no correct
        // answer"), but it is usually a typo, so flag it.
        if !question.options.iter().any(|o| o == &question.correct_answer) {
            warn!(index, "correct answer matches no option");
        }
    }

    Ok(())
}
