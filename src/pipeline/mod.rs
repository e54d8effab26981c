//! Orchestration of model calls into content, quiz and chat results

mod chat;
mod content;
mod quiz;

pub use chat::{ChatPipeline, ChatRequest, DEFAULT_HISTORY_LIMIT};
pub use content::ContentPipeline;
pub use quiz::{DEFAULT_QUIZ_ATTEMPTS, QuizPipeline};
