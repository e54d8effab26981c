use async_trait::async_trait;
use std::fmt::Debug;

use super::{Completion, ModelRequest, TextStream};
use crate::domain::DomainError;

/// Backend capable of chat, vision and embedding calls
///
/// Vision calls are chat calls whose user message carries an image part.
#[async_trait]
pub trait LlmProvider: Send + Sync + Debug {
    /// Send a chat completion request
    async fn chat(&self, request: ModelRequest) -> Result<Completion, DomainError>;

    /// Send a streaming chat completion request
    async fn chat_stream(&self, request: ModelRequest) -> Result<TextStream, DomainError>;

    /// Embed one input string
    async fn embed(&self, model: &str, input: &str) -> Result<Vec<f32>, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}
