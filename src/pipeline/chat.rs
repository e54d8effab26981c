//! Tutoring chat

use std::sync::Arc;

use futures::{StreamExt, future, stream};
use tracing::{debug, warn};

use crate::config::ModelRole;
use crate::domain::{
    AgentPrompt, DomainError, ErrorReport, Message, ModelResponse, RetryPolicy, TextStream,
};
use crate::infrastructure::ModelGateway;
use crate::infrastructure::llm::CONTENT_CONTEXT_MARKER;

pub const DEFAULT_HISTORY_LIMIT: usize = 20;

const TUTOR_UNAVAILABLE: &str = "The tutor is not available right now. Please try again later.";

/// One user turn plus what the tutor should know about it
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub message: String,
    /// Snippets from the student's uploaded content
    pub context: Vec<String>,
    /// Earlier turns, oldest first
    pub history: Vec<Message>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn with_context(mut self, context: Vec<String>) -> Self {
        self.context = context;
        self
    }

    pub fn with_history(mut self, history: Vec<Message>) -> Self {
        self.history = history;
        self
    }
}

pub struct ChatPipeline {
    gateway: Arc<ModelGateway>,
    agent: Option<AgentPrompt>,
    retry: RetryPolicy,
    history_limit: usize,
}

impl ChatPipeline {
    pub fn new(gateway: Arc<ModelGateway>, agent: Option<AgentPrompt>, retry: RetryPolicy) -> Self {
        Self {
            gateway,
            agent,
            retry,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn with_history_limit(mut self, history_limit: usize) -> Self {
        self.history_limit = history_limit;
        self
    }

    /// Reply as one retried completion
    ///
    /// Failures become a caller-safe message instead of an error.
    pub async fn reply(&self, request: &ChatRequest) -> String {
        let Some(agent) = &self.agent else {
            warn!("Tutor agent not loaded");
            return TUTOR_UNAVAILABLE.to_string();
        };

        let messages = self.build_messages(agent, request);
        let result = self
            .retry
            .execute(|| self.gateway.chat(ModelRole::Tutor, messages.clone()))
            .await;

        match result {
            Ok(text) => text,
            Err(e) => safe_message(&e),
        }
    }

    /// Reply as a delta stream
    ///
    /// Streams are not retried. An error, on open or mid-stream, ends the
    /// stream with a caller-safe message.
    pub async fn reply_stream(&self, request: &ChatRequest) -> TextStream {
        let Some(agent) = &self.agent else {
            warn!("Tutor agent not loaded");
            return single(TUTOR_UNAVAILABLE.to_string());
        };

        let messages = self.build_messages(agent, request);
        match self.gateway.chat_stream(ModelRole::Tutor, messages).await {
            Ok(deltas) => Box::pin(deltas.scan(false, |failed, delta| {
                if *failed {
                    return future::ready(None);
                }
                let text = match delta {
                    Ok(text) => text,
                    Err(e) => {
                        *failed = true;
                        safe_message(&e)
                    }
                };
                future::ready(Some(Ok::<_, DomainError>(text)))
            })),
            Err(e) => single(safe_message(&e)),
        }
    }

    /// Either form, as a [`ModelResponse`]
    pub async fn respond(&self, request: &ChatRequest, stream: bool) -> ModelResponse {
        if stream {
            ModelResponse::Stream(self.reply_stream(request).await)
        } else {
            ModelResponse::Complete(self.reply(request).await)
        }
    }

    /// System prompt, optional context, recent history, then the user turn
    fn build_messages(&self, agent: &AgentPrompt, request: &ChatRequest) -> Vec<Message> {
        let has_context = !request.context.is_empty();

        let mut system = agent.system_prompt.clone();
        if has_context && !agent.context_guidance.is_empty() {
            system.push_str("\n\nContext Guidance:\n");
            for guidance in &agent.context_guidance {
                system.push_str(&format!("- {}\n", guidance));
            }
        }

        let mut messages = vec![Message::system(system)];

        if has_context {
            let snippets: Vec<String> = request.context.iter().map(|c| format!("- {}", c)).collect();
            messages.push(Message::system(format!(
                "{}\n{}",
                CONTENT_CONTEXT_MARKER,
                snippets.join("\n")
            )));
        }

        let skip = request.history.len().saturating_sub(self.history_limit);
        messages.extend(request.history.iter().skip(skip).cloned());
        messages.push(Message::user(request.message.clone()));

        debug!(messages = messages.len(), "Built chat messages");
        messages
    }
}

fn safe_message(error: &DomainError) -> String {
    let report = ErrorReport::from_error(error);
    report.log();
    report.user_message
}

fn single(text: String) -> TextStream {
    Box::pin(stream::once(future::ready(Ok::<_, DomainError>(text))))
}
