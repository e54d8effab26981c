use serde::{Deserialize, Serialize};

use crate::domain::DomainError;
use crate::domain::extraction::ExtractionResult;

pub const MIN_QUESTIONS: usize = 1;
pub const MAX_QUESTIONS: usize = 20;
pub const DEFAULT_QUESTIONS: usize = 5;

/// What to generate a quiz about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizRequest {
    topic: Option<String>,
    content: Option<String>,
    question_count: usize,
}

impl QuizRequest {
    /// Requires a topic or content and a count in `1..=20`
    pub fn new(
        topic: Option<String>,
        content: Option<String>,
        question_count: usize,
    ) -> Result<Self, DomainError> {
        let topic = topic.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
        let content = content.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());

        if topic.is_none() && content.is_none() {
            return Err(DomainError::validation(
                "Either a topic or content must be provided",
            ));
        }
        if question_count < MIN_QUESTIONS {
            return Err(DomainError::validation("Question count must be at least 1"));
        }
        if question_count > MAX_QUESTIONS {
            return Err(DomainError::validation("Question count cannot exceed 20"));
        }

        Ok(Self {
            topic,
            content,
            question_count,
        })
    }

    /// Quiz over previously extracted content, summarized from its key points
    pub fn from_extraction(
        topic: Option<String>,
        result: &ExtractionResult,
        question_count: usize,
    ) -> Result<Self, DomainError> {
        let content = if result.key_points.is_empty() {
            result.summary.clone()
        } else {
            result.key_points.join(". ")
        };
        Self::new(topic.or_else(|| Some(result.title.clone())), Some(content), question_count)
    }

    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn question_count(&self) -> usize {
        self.question_count
    }
}
