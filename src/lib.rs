//! Mentor AI
//!
//! Reliable LLM pipelines for study material:
//! - Structured extraction from documents, images and videos
//! - Validated multiple-choice quiz generation
//! - Context-aware tutoring chat with streaming
//! - Retry, model fallback and an offline fallback mode

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod pipeline;
pub mod state;

pub use config::AppConfig;
pub use state::AppState;
