//! Domain layer - Core types, algorithms and trait seams

pub mod agent;
pub mod chunking;
pub mod content;
pub mod error;
pub mod error_report;
pub mod extraction;
pub mod llm;
pub mod quiz;
pub mod retry;
pub mod video;

pub use agent::{AgentKind, AgentPrompt, PromptCatalog};
pub use chunking::{Chunk, DocumentChunker};
pub use content::{ContentInput, Medium, Payload};
pub use error::DomainError;
pub use error_report::{ErrorCategory, ErrorReport};
pub use extraction::{Concept, ExtractionResult, ProcessingStatus, ResultAggregator};
pub use llm::{
    Completion, ContentPart, FinishReason, LlmProvider, Message, MessageRole, ModelRequest,
    ModelRequestBuilder, ModelResponse, TextStream, Usage,
};
pub use quiz::{QuizQuestion, QuizRequest, QuizScore, QuizValidationError};
pub use retry::{RetryConfig, RetryPolicy};
pub use video::{FrameExtractor, FrameSampler, VideoFrameSample, VideoMetadata};

#[cfg(test)]
pub use llm::MockLlmProvider;
