use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of options every question carries
pub const OPTION_COUNT: usize = 4;

/// Reasons a question cannot be constructed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizValidationError {
    #[error("question id cannot be empty")]
    EmptyId,

    #[error("question text cannot be empty")]
    EmptyQuestion,

    #[error("expected exactly 4 options, got {0}")]
    WrongOptionCount(usize),

    #[error("options cannot be empty")]
    EmptyOption,

    #[error("options must be distinct")]
    DuplicateOptions,

    #[error("correct_index must be in 0..4, got {0}")]
    InvalidCorrectIndex(String),

    #[error("explanation cannot be empty")]
    EmptyExplanation,
}

/// A validated multiple-choice question
///
/// Exactly four distinct non-empty options; fields are only reachable through
/// [`QuizQuestion::new`] or deserialization, which both validate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawQuizQuestion")]
pub struct QuizQuestion {
    id: String,
    question: String,
    options: [String; OPTION_COUNT],
    correct_index: usize,
    explanation: String,
}

#[derive(Deserialize)]
struct RawQuizQuestion {
    id: String,
    question: String,
    options: Vec<String>,
    correct_index: usize,
    explanation: String,
}

impl TryFrom<RawQuizQuestion> for QuizQuestion {
    type Error = QuizValidationError;

    fn try_from(raw: RawQuizQuestion) -> Result<Self, Self::Error> {
        Self::new(
            raw.id,
            raw.question,
            raw.options,
            raw.correct_index,
            raw.explanation,
        )
    }
}

impl QuizQuestion {
    pub fn new(
        id: impl Into<String>,
        question: impl Into<String>,
        options: Vec<String>,
        correct_index: usize,
        explanation: impl Into<String>,
    ) -> Result<Self, QuizValidationError> {
        let id = id.into().trim().to_string();
        if id.is_empty() {
            return Err(QuizValidationError::EmptyId);
        }

        let question = question.into().trim().to_string();
        if question.is_empty() {
            return Err(QuizValidationError::EmptyQuestion);
        }

        let options: Vec<String> = options.into_iter().map(|o| o.trim().to_string()).collect();
        let options: [String; OPTION_COUNT] = options
            .try_into()
            .map_err(|v: Vec<String>| QuizValidationError::WrongOptionCount(v.len()))?;

        if options.iter().any(|o| o.is_empty()) {
            return Err(QuizValidationError::EmptyOption);
        }

        let distinct: HashSet<&str> = options.iter().map(|o| o.as_str()).collect();
        if distinct.len() != OPTION_COUNT {
            return Err(QuizValidationError::DuplicateOptions);
        }

        if correct_index >= OPTION_COUNT {
            return Err(QuizValidationError::InvalidCorrectIndex(
                correct_index.to_string(),
            ));
        }

        let explanation = explanation.into().trim().to_string();
        if explanation.is_empty() {
            return Err(QuizValidationError::EmptyExplanation);
        }

        Ok(Self {
            id,
            question,
            options,
            correct_index,
            explanation,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    pub fn is_correct(&self, answer: usize) -> bool {
        answer == self.correct_index
    }

    /// Bracket-prefixed questions are generated placeholders
    pub fn is_placeholder(&self) -> bool {
        self.question.starts_with('[')
    }
}

/// Result of grading a set of answers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuizScore {
    pub correct: usize,
    pub total: usize,
    /// 0.0 to 100.0
    pub percentage: f64,
}

impl QuizScore {
    /// Grade answers positionally; extra answers are ignored
    pub fn calculate(questions: &[QuizQuestion], answers: &[usize]) -> Self {
        let total = questions.len();
        let correct = questions
            .iter()
            .zip(answers)
            .filter(|(q, a)| q.is_correct(**a))
            .count();

        let percentage = if total > 0 {
            correct as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        Self {
            correct,
            total,
            percentage,
        }
    }
}
