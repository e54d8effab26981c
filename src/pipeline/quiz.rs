//! Quiz generation with validation and stricter re-prompting

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::ModelRole;
use crate::domain::extraction::parse_array;
use crate::domain::quiz::{fallback_questions, validate};
use crate::domain::{AgentPrompt, ErrorReport, Message, QuizQuestion, QuizRequest, RetryPolicy};
use crate::infrastructure::ModelGateway;

pub const DEFAULT_QUIZ_ATTEMPTS: u32 = 3;

const JSON_FORMAT_INSTRUCTION: &str = r#"

IMPORTANT: You MUST respond with ONLY a valid JSON array. Do not include any text before or after the JSON.

The response must be a JSON array of question objects with this exact structure:
[
  {
    "id": "q1",
    "question": "Your question text here?",
    "options": ["Option A", "Option B", "Option C", "Option D"],
    "correct_index": 0,
    "explanation": "Explanation of why the correct answer is correct."
  }
]

Rules:
- Each question MUST have exactly 4 options
- correct_index MUST be 0, 1, 2, or 3 (the index of the correct option)
- All 4 options MUST be distinct (no duplicate options)
- Each question MUST have a non-empty explanation
- The id should be "q1", "q2", etc."#;

const STRICT_FORMAT_INSTRUCTION: &str = "\n\nCRITICAL: Your previous response was not valid JSON. \
You MUST respond with ONLY the JSON array, starting with [ and ending with ]. \
No markdown code blocks, no explanations, just the raw JSON array.";

const STRICT_REMINDER: &str = "Remember: Respond with ONLY the JSON array, no other text.";

/// Generates validated multiple-choice questions; never fails
pub struct QuizPipeline {
    gateway: Arc<ModelGateway>,
    agent: Option<AgentPrompt>,
    retry: RetryPolicy,
    max_attempts: u32,
}

impl QuizPipeline {
    pub fn new(gateway: Arc<ModelGateway>, agent: Option<AgentPrompt>, retry: RetryPolicy) -> Self {
        Self {
            gateway,
            agent,
            retry,
            max_attempts: DEFAULT_QUIZ_ATTEMPTS,
        }
    }

    /// Clamped to `1..=DEFAULT_QUIZ_ATTEMPTS`
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        if max_attempts > DEFAULT_QUIZ_ATTEMPTS {
            warn!(
                requested = max_attempts,
                limit = DEFAULT_QUIZ_ATTEMPTS,
                "Quiz attempts capped"
            );
        }
        self.max_attempts = max_attempts.clamp(1, DEFAULT_QUIZ_ATTEMPTS);
        self
    }

    /// Up to `max_attempts` generate-and-validate cycles
    ///
    /// Returns exactly the requested number of questions when an attempt
    /// produces enough, otherwise the largest valid set seen, otherwise
    /// labeled placeholder questions.
    pub async fn generate(&self, request: &QuizRequest) -> Vec<QuizQuestion> {
        let count = request.question_count();
        let Some(agent) = &self.agent else {
            warn!("Quiz agent not loaded, returning placeholder questions");
            return fallback_questions(request.topic(), count);
        };

        let mut best: Vec<QuizQuestion> = Vec::new();
        let mut strict = false;

        for attempt in 1..=self.max_attempts {
            let messages = quiz_messages(agent, request, strict);
            let reply = self
                .retry
                .execute(|| self.gateway.chat(ModelRole::Quiz, messages.clone()))
                .await;

            let text = match reply {
                Ok(text) => text,
                Err(e) => {
                    warn!(attempt, "Quiz generation failed");
                    ErrorReport::from_error(&e).log();
                    continue;
                }
            };

            let mut questions = parse_questions(&text);
            if questions.len() >= count {
                questions.truncate(count);
                info!(attempt, count, "Generated quiz");
                return questions;
            }

            warn!(
                attempt,
                valid = questions.len(),
                requested = count,
                "Quiz response did not contain enough valid questions. Retrying with stricter prompt"
            );
            if questions.len() > best.len() {
                best = questions;
            }
            strict = true;
        }

        if best.is_empty() {
            warn!("Quiz generation exhausted all attempts, returning placeholder questions");
            fallback_questions(request.topic(), count)
        } else {
            warn!(valid = best.len(), requested = count, "Returning partial quiz");
            best
        }
    }
}

fn parse_questions(text: &str) -> Vec<QuizQuestion> {
    let Some(items) = parse_array(text) else {
        warn!("Quiz response contained no JSON array");
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(i, raw)| validate(raw, i + 1))
        .collect()
}

fn quiz_messages(agent: &AgentPrompt, request: &QuizRequest, strict: bool) -> Vec<Message> {
    let mut system = format!("{}{}", agent.system_prompt, JSON_FORMAT_INSTRUCTION);
    if strict {
        system.push_str(STRICT_FORMAT_INSTRUCTION);
    }

    let mut parts = Vec::new();
    if let Some(topic) = request.topic() {
        parts.push(format!("Topic: {}", topic));
    }
    if let Some(content) = request.content() {
        parts.push(format!("Content Summary: {}", content));
    }
    parts.push(format!(
        "Generate exactly {} multiple-choice questions.",
        request.question_count()
    ));
    if strict {
        parts.push(STRICT_REMINDER.to_string());
    }

    vec![Message::system(system), Message::user(parts.join("\n\n"))]
}
