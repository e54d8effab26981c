use async_trait::async_trait;
use bytes::Bytes;
use futures::{StreamExt, stream};
use serde::Deserialize;
use tracing::debug;

use super::http_client::HttpClientTrait;
use crate::domain::{
    Completion, DomainError, FinishReason, LlmProvider, ModelRequest, TextStream, Usage,
};

pub const DEFAULT_BASE_URL: &str = "https://api.tokenfactory.nebius.com/v1/";

/// Provider for any OpenAI-compatible chat/embeddings endpoint
#[derive(Debug)]
pub struct OpenAiProvider<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
}

impl<C: HttpClientTrait> OpenAiProvider<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_BASE_URL)
    }

    /// `base_url` includes the API version segment, e.g. `https://host/v1`
    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let auth_header = format!("Bearer {}", api_key.into());
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Self {
            client,
            auth_header,
            base_url,
        }
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.base_url)
    }

    fn build_request(&self, request: &ModelRequest, stream: bool) -> serde_json::Value {
        // Domain messages serialize to the wire shape, image parts included
        let mut body = serde_json::json!({
            "model": request.model_id,
            "messages": request.messages,
            "stream": stream,
        });

        if let Some(temp) = request.temperature {
            body["temperature"] = serde_json::json!(temp);
        }

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if let Some(top_p) = request.top_p {
            body["top_p"] = serde_json::json!(top_p);
        }

        body
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<Completion, DomainError> {
        let response: ChatResponse = serde_json::from_value(json)
            .map_err(|e| DomainError::response(format!("Failed to parse response: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::response("No choices in response"))?;

        let mut completion = Completion::new(
            response.id.unwrap_or_default(),
            response.model.unwrap_or_default(),
            choice.message.content.unwrap_or_default(),
        );

        if let Some(reason) = choice.finish_reason {
            completion = completion.with_finish_reason(FinishReason::parse(&reason));
        }

        if let Some(usage) = response.usage {
            completion =
                completion.with_usage(Usage::new(usage.prompt_tokens, usage.completion_tokens));
        }

        Ok(completion)
    }
}

#[async_trait]
impl<C: HttpClientTrait> LlmProvider for OpenAiProvider<C> {
    async fn chat(&self, request: ModelRequest) -> Result<Completion, DomainError> {
        let url = self.chat_completions_url();
        let body = self.build_request(&request, false);
        let response = self.client.post_json(&url, self.headers(), &body).await?;

        self.parse_response(response)
    }

    async fn chat_stream(&self, request: ModelRequest) -> Result<TextStream, DomainError> {
        let url = self.chat_completions_url();
        let body = self.build_request(&request, true);
        let byte_stream = self
            .client
            .post_json_stream(&url, self.headers(), &body)
            .await?;

        let deltas = byte_stream
            .scan(SseDecoder::default(), |decoder, chunk: Result<Bytes, DomainError>| {
                let items = match chunk {
                    Ok(bytes) => decoder.push(&bytes),
                    Err(e) => vec![Err(e)],
                };
                futures::future::ready(Some(stream::iter(items)))
            })
            .flatten();

        Ok(Box::pin(deltas))
    }

    async fn embed(&self, model: &str, input: &str) -> Result<Vec<f32>, DomainError> {
        let url = self.embeddings_url();
        let body = serde_json::json!({
            "model": model,
            "input": input,
        });
        let response = self.client.post_json(&url, self.headers(), &body).await?;

        let parsed: EmbeddingResponse = serde_json::from_value(response)
            .map_err(|e| DomainError::response(format!("Failed to parse embedding: {}", e)))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| DomainError::response("No embedding in response"))
    }

    fn provider_name(&self) -> &'static str {
        "openai-compatible"
    }
}

/// Line-buffered server-sent-events decoder
///
/// Network chunks may split lines (and UTF-8 sequences) anywhere, so bytes are
/// held until a full line arrives.
#[derive(Debug, Default)]
struct SseDecoder {
    pending: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    fn push(&mut self, bytes: &[u8]) -> Vec<Result<String, DomainError>> {
        self.pending.extend_from_slice(bytes);

        let mut deltas = Vec::new();
        while let Some(newline) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=newline).collect();
            if self.done {
                continue;
            }
            if let Some(delta) = self.parse_line(&String::from_utf8_lossy(&line)) {
                deltas.push(Ok(delta));
            }
        }
        deltas
    }

    fn parse_line(&mut self, line: &str) -> Option<String> {
        let data = line.trim_end_matches(['\r', '\n']).strip_prefix("data:")?.trim_start();

        if data == "[DONE]" {
            self.done = true;
            return None;
        }

        match serde_json::from_str::<StreamChunk>(data) {
            Ok(chunk) => chunk
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.delta.content)
                .filter(|c| !c.is_empty()),
            Err(e) => {
                debug!("Skipping unparseable stream event: {}", e);
                None
            }
        }
    }
}

// Wire types

#[derive(Debug, Deserialize)]
struct ChatResponse {
    id: Option<String>,
    model: Option<String>,
    choices: Vec<ChatChoice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}
