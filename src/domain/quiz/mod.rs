//! Quiz questions, validation and scoring

mod question;
mod request;
pub mod validator;

pub use question::{OPTION_COUNT, QuizQuestion, QuizScore, QuizValidationError};
pub use request::{DEFAULT_QUESTIONS, MAX_QUESTIONS, MIN_QUESTIONS, QuizRequest};
pub use validator::{fallback_questions, validate};
