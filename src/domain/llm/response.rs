use std::fmt;
use std::pin::Pin;

use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Finite, forward-only sequence of text deltas. Not restartable.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, DomainError>> + Send>>;

/// Reason why the generation finished
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Error,
}

impl FinishReason {
    pub fn parse(value: &str) -> Self {
        match value {
            "stop" => Self::Stop,
            "length" => Self::Length,
            "content_filter" => Self::ContentFilter,
            _ => Self::Error,
        }
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Complete (non-streamed) reply from a model backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub id: String,
    pub model: String,
    pub content: String,
    pub finish_reason: Option<FinishReason>,
    pub usage: Option<Usage>,
}

impl Completion {
    pub fn new(id: impl Into<String>, model: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            model: model.into(),
            content: content.into(),
            finish_reason: None,
            usage: None,
        }
    }

    pub fn with_finish_reason(mut self, reason: FinishReason) -> Self {
        self.finish_reason = Some(reason);
        self
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// Either a complete string or a lazily produced stream of deltas
pub enum ModelResponse {
    Complete(String),
    Stream(TextStream),
}

impl ModelResponse {
    /// Drain the response into one string
    pub async fn into_text(self) -> Result<String, DomainError> {
        use futures::StreamExt;

        match self {
            Self::Complete(text) => Ok(text),
            Self::Stream(mut stream) => {
                let mut text = String::new();
                while let Some(delta) = stream.next().await {
                    text.push_str(&delta?);
                }
                Ok(text)
            }
        }
    }
}

impl fmt::Debug for ModelResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complete(text) => f.debug_tuple("Complete").field(text).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[test]
    fn test_usage_calculation() {
        let usage = Usage::new(10, 20);
        assert_eq!(usage.total_tokens, 30);
    }

    #[test]
    fn test_finish_reason_parse() {
        assert_eq!(FinishReason::parse("stop"), FinishReason::Stop);
        assert_eq!(FinishReason::parse("length"), FinishReason::Length);
        assert_eq!(FinishReason::parse("weird"), FinishReason::Error);
    }

    #[tokio::test]
    async fn test_stream_into_text() {
        let deltas: Vec<Result<String, DomainError>> =
            vec![Ok("Hel".to_string()), Ok("lo".to_string())];
        let response = ModelResponse::Stream(Box::pin(stream::iter(deltas)));

        assert_eq!(response.into_text().await.unwrap(), "Hello");
    }

    #[tokio::test]
    async fn test_stream_into_text_propagates_error() {
        let deltas: Vec<Result<String, DomainError>> = vec![
            Ok("partial".to_string()),
            Err(DomainError::network("connection reset")),
        ];
        let response = ModelResponse::Stream(Box::pin(stream::iter(deltas)));

        assert!(response.into_text().await.is_err());
    }
}
