use serde::{Deserialize, Serialize};

use super::Message;

/// One call to a chat or vision model
///
/// Message order is significant: system messages first, the user message last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRequest {
    pub model_id: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(default)]
    pub stream: bool,
}

impl ModelRequest {
    pub fn new(model_id: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model_id: model_id.into(),
            messages,
            temperature: None,
            max_tokens: None,
            top_p: None,
            stream: false,
        }
    }

    pub fn builder(model_id: impl Into<String>) -> ModelRequestBuilder {
        ModelRequestBuilder::new(model_id)
    }

    /// Same request aimed at a different model
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    /// Text of the last user message, if any
    pub fn last_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == super::MessageRole::User)
            .and_then(|m| m.content_text())
    }
}

/// Builder for ModelRequest
#[derive(Debug)]
pub struct ModelRequestBuilder {
    model_id: String,
    messages: Vec<Message>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    top_p: Option<f32>,
    stream: bool,
}

impl ModelRequestBuilder {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            messages: Vec::new(),
            temperature: None,
            max_tokens: None,
            top_p: None,
            stream: false,
        }
    }

    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    pub fn system(self, content: impl Into<String>) -> Self {
        self.message(Message::system(content))
    }

    pub fn user(self, content: impl Into<String>) -> Self {
        self.message(Message::user(content))
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    pub fn top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn build(self) -> ModelRequest {
        ModelRequest {
            model_id: self.model_id,
            messages: self.messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            top_p: self.top_p,
            stream: self.stream,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = ModelRequest::builder("tutor-model")
            .system("You are a helpful tutor")
            .user("Explain photosynthesis")
            .temperature(0.7)
            .max_tokens(2048)
            .build();

        assert_eq!(request.model_id, "tutor-model");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.max_tokens, Some(2048));
        assert!(!request.stream);
        assert_eq!(request.last_user_text(), Some("Explain photosynthesis"));
    }

    #[test]
    fn test_with_model_keeps_messages() {
        let request = ModelRequest::builder("primary").user("Hi").build();
        let retargeted = request.clone().with_model("secondary");

        assert_eq!(retargeted.model_id, "secondary");
        assert_eq!(retargeted.messages, request.messages);
    }
}
