//! Role-aware entry point for every model call
//!
//! The gateway resolves per-role model settings, retries once against the
//! role's fallback model, and answers with labeled placeholder text when no
//! backend is configured.

use std::sync::Arc;
use std::time::Duration;

use futures::stream;
use tracing::{debug, info, warn};

use super::{HttpClient, OpenAiProvider};
use crate::config::{AiConfig, ModelRole, ModelSettings, ModelsConfig};
use crate::domain::{
    Completion, DomainError, FinishReason, LlmProvider, Message, MessageRole, ModelRequest,
    TextStream,
};

/// Length of the zero vector returned for embeddings in fallback mode
pub const FALLBACK_EMBEDDING_DIMENSIONS: usize = 4096;

/// Marker carried by context messages built for chat
pub const CONTENT_CONTEXT_MARKER: &str = "Content Context:";

const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone)]
pub struct ModelGateway {
    provider: Option<Arc<dyn LlmProvider>>,
    models: ModelsConfig,
}

impl ModelGateway {
    pub fn new(provider: Arc<dyn LlmProvider>, models: ModelsConfig) -> Self {
        Self {
            provider: Some(provider),
            models,
        }
    }

    /// Gateway without a backend; every call returns placeholder output
    pub fn fallback(models: ModelsConfig) -> Self {
        Self {
            provider: None,
            models,
        }
    }

    /// Build the HTTP-backed gateway, or a fallback gateway when no API key is set
    pub fn from_config(config: &AiConfig) -> Result<Self, DomainError> {
        let Some(api_key) = config.api_key.as_deref().filter(|_| config.has_api_key()) else {
            warn!(
                "No AI API key configured. Running in fallback mode with placeholder responses"
            );
            return Ok(Self::fallback(config.models.clone()));
        };

        let client = HttpClient::with_timeout(Duration::from_secs(config.timeout))?;
        let provider = OpenAiProvider::with_base_url(client, api_key, config.base_url.clone());
        info!(base_url = %config.base_url, "Model gateway initialized");

        Ok(Self::new(Arc::new(provider), config.models.clone()))
    }

    pub fn is_fallback_mode(&self) -> bool {
        self.provider.is_none()
    }

    pub fn settings(&self, role: ModelRole) -> &ModelSettings {
        self.models.get(role)
    }

    /// Complete a chat using the role's model settings
    pub async fn chat(&self, role: ModelRole, messages: Vec<Message>) -> Result<String, DomainError> {
        let Some(provider) = &self.provider else {
            return Ok(fallback_chat_text(&messages));
        };

        let settings = self.settings(role);
        let request = build_request(settings, messages, false);

        match provider.chat(request.clone()).await {
            Ok(completion) => Ok(completion_text(role, completion)),
            Err(e) => match &settings.fallback_model_id {
                Some(fallback) => {
                    warn!(
                        role = role.as_str(),
                        "Primary model '{}' failed: {}. Trying fallback model '{}'",
                        settings.model_id,
                        e,
                        fallback
                    );
                    let completion = provider.chat(request.with_model(fallback)).await?;
                    Ok(completion_text(role, completion))
                }
                None => Err(e),
            },
        }
    }

    /// Open a delta stream; the fallback model is tried only if opening fails
    pub async fn chat_stream(
        &self,
        role: ModelRole,
        messages: Vec<Message>,
    ) -> Result<TextStream, DomainError> {
        let Some(provider) = &self.provider else {
            return Ok(word_stream(fallback_chat_text(&messages)));
        };

        let settings = self.settings(role);
        let request = build_request(settings, messages, true);

        match provider.chat_stream(request.clone()).await {
            Ok(stream) => Ok(stream),
            Err(e) => match &settings.fallback_model_id {
                Some(fallback) => {
                    warn!(
                        role = role.as_str(),
                        "Primary model '{}' failed to stream: {}. Trying fallback model '{}'",
                        settings.model_id,
                        e,
                        fallback
                    );
                    provider.chat_stream(request.with_model(fallback)).await
                }
                None => Err(e),
            },
        }
    }

    /// Analyze one JPEG image with the vision model
    pub async fn vision(&self, prompt: &str, jpeg: &[u8]) -> Result<String, DomainError> {
        if self.is_fallback_mode() {
            return Ok(fallback_vision_text(prompt));
        }

        self.chat(ModelRole::Vision, vec![Message::user_with_image(prompt, jpeg)])
            .await
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let Some(provider) = &self.provider else {
            warn!("Returning fallback embedding (zero vector)");
            return Ok(vec![0.0; FALLBACK_EMBEDDING_DIMENSIONS]);
        };

        let settings = self.settings(ModelRole::Embedding);
        match provider.embed(&settings.model_id, text).await {
            Ok(embedding) => Ok(embedding),
            Err(e) => match &settings.fallback_model_id {
                Some(fallback) => {
                    warn!(
                        "Primary embedding model '{}' failed: {}. Trying fallback model '{}'",
                        settings.model_id, e, fallback
                    );
                    provider.embed(fallback, text).await
                }
                None => Err(e),
            },
        }
    }
}

/// Log token usage and truncation, then keep only the text
fn completion_text(role: ModelRole, completion: Completion) -> String {
    if let Some(usage) = &completion.usage {
        debug!(
            role = role.as_str(),
            model = %completion.model,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            total_tokens = usage.total_tokens,
            "Model usage"
        );
    }

    if completion.finish_reason == Some(FinishReason::Length) {
        warn!(
            role = role.as_str(),
            model = %completion.model,
            "Model reply hit the token limit and may be truncated"
        );
    }

    completion.content
}

fn build_request(settings: &ModelSettings, messages: Vec<Message>, stream: bool) -> ModelRequest {
    ModelRequest::builder(settings.model_id.clone())
        .messages(messages)
        .temperature(settings.temperature)
        .max_tokens(settings.max_tokens)
        .top_p(settings.top_p)
        .stream(stream)
        .build()
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

fn fallback_chat_text(messages: &[Message]) -> String {
    let user_message = messages
        .iter()
        .rev()
        .find(|m| m.role == MessageRole::User)
        .and_then(|m| m.content_text())
        .unwrap_or_default();
    let has_context = messages
        .iter()
        .filter_map(|m| m.content_text())
        .any(|text| text.contains(CONTENT_CONTEXT_MARKER));

    warn!("Returning fallback chat response");

    let situation = if has_context {
        "I have context from your uploaded content, but the AI service is currently unavailable."
    } else {
        "The AI service is currently unavailable."
    };

    format!(
        "⚠️ **Fallback Mode Active**\n\n\
         I received your message: \"{}\"\n\n\
         {}\n\n\
         **To enable real AI responses:**\n\
         1. Set the `AI_API_KEY` environment variable\n\
         2. Restart the application\n\n\
         _This is a placeholder response._",
        preview(user_message),
        situation
    )
}

fn fallback_vision_text(prompt: &str) -> String {
    warn!("Returning fallback vision response");

    format!(
        "⚠️ **Fallback Mode Active**\n\n\
         Vision analysis requested with prompt: \"{}\"\n\n\
         The AI vision service is currently unavailable.\n\n\
         **To enable real AI vision analysis:**\n\
         1. Set the `AI_API_KEY` environment variable\n\
         2. Restart the application\n\n\
         _This is a placeholder response._",
        preview(prompt)
    )
}

/// Replay a finished text as word-sized deltas
fn word_stream(text: String) -> TextStream {
    let deltas: Vec<Result<String, DomainError>> = text
        .split_inclusive(' ')
        .map(|word| Ok(word.to_string()))
        .collect();

    Box::pin(stream::iter(deltas))
}
