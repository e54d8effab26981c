//! LLM provider domain models and traits

mod message;
mod provider;
mod request;
mod response;

pub use message::{ContentPart, ImageUrl, Message, MessageRole};
pub use provider::LlmProvider;
pub use request::{ModelRequest, ModelRequestBuilder};
pub use response::{Completion, FinishReason, ModelResponse, TextStream, Usage};

#[cfg(test)]
pub use provider::mock::MockLlmProvider;
