use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::content::Medium;

use super::parser;

/// Maximum entries kept in each list of an extraction result
pub const MAX_LIST_ENTRIES: usize = 10;

const DEFAULT_TITLE: &str = "Extracted Content";
const NO_SUMMARY: &str = "No summary available.";
const NO_KEY_POINTS: &str = "No key points extracted.";
const UNSTRUCTURED_KEY_POINT: &str = "Content was processed but structured extraction failed.";
const TITLE_MAX_CHARS: usize = 100;
const PLAIN_SUMMARY_CHARS: usize = 500;

/// Outcome of one extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Complete,
    /// Structured parsing degraded to a plain-text or fallback result
    Partial,
    Failed,
}

/// A term and its definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    pub term: String,
    pub definition: String,
}

/// Structured educational metadata extracted from one piece of content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub title: String,
    pub summary: String,
    pub key_points: Vec<String>,
    pub concepts: Vec<Concept>,
    pub topics: Vec<String>,
    pub source_type: Medium,
    #[serde(rename = "processing_status")]
    pub status: ProcessingStatus,
    pub error_message: Option<String>,
}

impl ExtractionResult {
    /// Parse raw model text, degrading to a plain-text summary when no object is found
    pub fn from_model_text(text: &str, source_type: Medium, filename: &str) -> Self {
        if text.trim().is_empty() {
            return Self::fallback(source_type, filename);
        }

        match parser::parse_object(text) {
            Some(data) => Self::from_model_output(&data, source_type, filename),
            None => Self::from_plain_text(text, source_type, filename),
        }
    }

    /// Normalize a decoded JSON object into a complete result
    pub fn from_model_output(data: &Map<String, Value>, source_type: Medium, filename: &str) -> Self {
        let title = data
            .get("title")
            .and_then(stringify)
            .unwrap_or_else(|| default_title(filename));

        let summary = data
            .get("summary")
            .and_then(stringify)
            .unwrap_or_else(|| NO_SUMMARY.to_string());

        let mut key_points = unique_strings(string_list(data.get("key_points")));
        if key_points.is_empty() {
            key_points.push(NO_KEY_POINTS.to_string());
        }

        let concepts = unique_concepts(concept_list(data.get("concepts")));
        let topics = unique_strings(string_list(data.get("topics")));

        Self {
            title,
            summary,
            key_points,
            concepts,
            topics,
            source_type,
            status: ProcessingStatus::Complete,
            error_message: None,
        }
    }

    /// Best-effort result built from prose when the model returned no JSON
    pub fn from_plain_text(text: &str, source_type: Medium, filename: &str) -> Self {
        let trimmed = text.trim();
        let lines: Vec<&str> = trimmed.lines().collect();

        let first_line = lines.first().map(|l| l.trim()).unwrap_or_default();
        let title = if first_line.is_empty() || first_line.chars().count() > TITLE_MAX_CHARS {
            default_title(filename)
        } else {
            first_line.to_string()
        };

        let rest = lines
            .iter()
            .skip(1)
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let summary = if rest.is_empty() {
            text.chars().take(PLAIN_SUMMARY_CHARS).collect()
        } else {
            rest
        };

        Self {
            title,
            summary,
            key_points: vec![UNSTRUCTURED_KEY_POINT.to_string()],
            concepts: Vec::new(),
            topics: Vec::new(),
            source_type,
            status: ProcessingStatus::Partial,
            error_message: Some("Could not parse structured response from AI.".to_string()),
        }
    }

    /// Clearly labeled placeholder used while the model backend is unavailable
    pub fn fallback(source_type: Medium, filename: &str) -> Self {
        let title = if filename.trim().is_empty() {
            "Uploaded Content".to_string()
        } else {
            filename.to_string()
        };

        Self {
            title,
            summary: format!(
                "[Fallback Mode] Content of type '{}' was uploaded. AI analysis is currently unavailable.",
                source_type
            ),
            key_points: vec![
                "[Fallback] Content uploaded successfully".to_string(),
                "[Fallback] AI analysis unavailable - configure an API key to enable it".to_string(),
            ],
            concepts: Vec::new(),
            topics: Vec::new(),
            source_type,
            status: ProcessingStatus::Partial,
            error_message: Some("AI service unavailable. Using fallback mode.".to_string()),
        }
    }

    /// Terminal failure carrying a caller-safe message
    pub fn failed(source_type: Medium, message: impl Into<String>) -> Self {
        Self {
            title: "Processing Failed".to_string(),
            summary: format!("Failed to process {} content.", source_type),
            key_points: Vec::new(),
            concepts: Vec::new(),
            topics: Vec::new(),
            source_type,
            status: ProcessingStatus::Failed,
            error_message: Some(message.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == ProcessingStatus::Failed
    }
}

/// Model placeholders are bracket-prefixed, e.g. "[Fallback] ..."
pub fn is_placeholder(value: &str) -> bool {
    value.trim_start().starts_with('[')
}

/// Stand-in key point written by a degraded extraction
pub(crate) fn is_filler_key_point(value: &str) -> bool {
    let value = value.trim();
    value == NO_KEY_POINTS || value == UNSTRUCTURED_KEY_POINT
}

pub(crate) fn dedup_key(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Case-insensitive dedup on trimmed values, first occurrence wins, capped
pub(crate) fn unique_strings<I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && seen.insert(dedup_key(v)))
        .take(MAX_LIST_ENTRIES)
        .collect()
}

/// Concepts deduplicated by lower-cased trimmed term, capped
pub(crate) fn unique_concepts<I>(concepts: I) -> Vec<Concept>
where
    I: IntoIterator<Item = Concept>,
{
    let mut seen = HashSet::new();
    concepts
        .into_iter()
        .filter(|c| !c.term.trim().is_empty() && seen.insert(dedup_key(&c.term)))
        .take(MAX_LIST_ENTRIES)
        .collect()
}

fn default_title(filename: &str) -> String {
    if filename.trim().is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        filename.to_string()
    }
}

/// Render a scalar JSON value as trimmed text; null and blank become `None`
fn stringify(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(stringify).collect(),
        _ => Vec::new(),
    }
}

fn concept_list(value: Option<&Value>) -> Vec<Concept> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let obj = item.as_object()?;
            let term = obj.get("term").and_then(stringify)?;
            let definition = obj
                .get("definition")
                .and_then(stringify)
                .unwrap_or_default();
            Some(Concept { term, definition })
        })
        .collect()
}
