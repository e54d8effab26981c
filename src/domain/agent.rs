//! Agent prompt definitions
//!
//! A [`PromptCatalog`] is built once at startup and shared read-only.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The three agents the pipelines drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    Tutor,
    Quiz,
    Content,
}

impl AgentKind {
    pub const ALL: [AgentKind; 3] = [AgentKind::Tutor, AgentKind::Quiz, AgentKind::Content];

    /// Prompt file name without extension, e.g. `TutorAgent`
    pub fn file_stem(&self) -> &'static str {
        match self {
            Self::Tutor => "TutorAgent",
            Self::Quiz => "QuizAgent",
            Self::Content => "ContentAgent",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

/// Prompt configuration for one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentPrompt {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub system_prompt: String,
    #[serde(default)]
    pub example_format: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub context_guidance: Vec<String>,
}

impl AgentPrompt {
    pub fn is_valid(&self) -> bool {
        [&self.name, &self.role, &self.description, &self.system_prompt]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

/// Loaded agent prompts, keyed by kind
#[derive(Debug, Clone, Default)]
pub struct PromptCatalog {
    agents: HashMap<AgentKind, AgentPrompt>,
}

impl PromptCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Catalog with the built-in prompts for every agent
    pub fn builtin() -> Self {
        let mut catalog = Self::empty();
        for kind in AgentKind::ALL {
            catalog.insert(kind, builtin_prompt(kind));
        }
        catalog
    }

    /// Add or replace a prompt; invalid prompts are ignored
    pub fn insert(&mut self, kind: AgentKind, prompt: AgentPrompt) -> bool {
        if !prompt.is_valid() {
            return false;
        }
        self.agents.insert(kind, prompt);
        true
    }

    pub fn with(mut self, kind: AgentKind, prompt: AgentPrompt) -> Self {
        self.insert(kind, prompt);
        self
    }

    pub fn get(&self, kind: AgentKind) -> Option<&AgentPrompt> {
        self.agents.get(&kind)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

fn builtin_prompt(kind: AgentKind) -> AgentPrompt {
    let (role, description, system_prompt, guidance): (&str, &str, &str, &[&str]) = match kind {
        AgentKind::Tutor => (
            "Personal tutor",
            "Answers student questions and explains concepts step by step.",
            "You are a patient, encouraging tutor. Explain concepts clearly, \
             check understanding with short follow-up questions, and adapt \
             explanations to the student's level. Prefer concrete examples.",
            &[
                "Ground answers in the provided content when it is relevant",
                "Say so when the content does not cover the question",
            ],
        ),
        AgentKind::Quiz => (
            "Quiz author",
            "Writes multiple-choice questions that test understanding.",
            "You write clear multiple-choice questions for students. Each \
             question has one unambiguous correct answer and plausible \
             distractors, and every answer comes with a short explanation.",
            &["Base questions only on the supplied topic or content"],
        ),
        AgentKind::Content => (
            "Content analyst",
            "Extracts structured study material from documents, images and video.",
            "You analyze educational material and extract its title, a concise \
             summary, key points, important concepts with definitions, and the \
             topics it covers. Respond with JSON only.",
            &["Keep key points to complete sentences"],
        ),
    };

    AgentPrompt {
        name: kind.file_stem().to_string(),
        role: role.to_string(),
        description: description.to_string(),
        system_prompt: system_prompt.to_string(),
        example_format: serde_json::Map::new(),
        context_guidance: guidance.iter().map(|g| g.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_complete() {
        let catalog = PromptCatalog::builtin();

        assert_eq!(catalog.len(), 3);
        for kind in AgentKind::ALL {
            let prompt = catalog.get(kind).unwrap();
            assert!(prompt.is_valid());
            assert_eq!(prompt.name, kind.file_stem());
        }
    }

    #[test]
    fn test_invalid_prompt_rejected() {
        let mut catalog = PromptCatalog::empty();
        let prompt = AgentPrompt {
            name: "QuizAgent".to_string(),
            role: "Quiz".to_string(),
            description: String::new(),
            system_prompt: "Write questions".to_string(),
            example_format: serde_json::Map::new(),
            context_guidance: Vec::new(),
        };

        assert!(!catalog.insert(AgentKind::Quiz, prompt));
        assert!(catalog.get(AgentKind::Quiz).is_none());
    }

    #[test]
    fn test_prompt_deserializes_with_defaults() {
        let prompt: AgentPrompt = serde_json::from_str(
            r#"{"name":"TutorAgent","role":"Tutor","description":"d","system_prompt":"s"}"#,
        )
        .unwrap();

        assert!(prompt.is_valid());
        assert!(prompt.context_guidance.is_empty());
    }
}
