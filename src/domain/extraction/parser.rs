//! Recovery of JSON values from free-form model output
//!
//! Malformed output is a normal case here: every function returns `None`
//! instead of an error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").expect("valid fence regex"));

/// Parse the first JSON object found in `text`
pub fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match decode(text, '{', '}')? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Parse the first JSON array found in `text`
pub fn parse_array(text: &str) -> Option<Vec<Value>> {
    match decode(text, '[', ']')? {
        Value::Array(items) => Some(items),
        _ => None,
    }
}

fn decode(text: &str, open: char, close: char) -> Option<Value> {
    let candidate = candidate_span(text, open, close);
    match serde_json::from_str(candidate) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Model output is not valid JSON: {}", e);
            None
        }
    }
}

/// Narrow `text` down to the span most likely to hold the JSON value
fn candidate_span(text: &str, open: char, close: char) -> &str {
    let mut span = text.trim();

    if span.starts_with("```") {
        if let Some(inner) = CODE_FENCE.captures(span).and_then(|c| c.get(1)) {
            span = inner.as_str().trim();
        }
    }

    if span.starts_with(open) {
        return span;
    }

    match span.find(open) {
        Some(start) => match matching_close(&span[start..], open, close) {
            Some(len) => &span[start..start + len],
            None => span,
        },
        None => span,
    }
}

/// Byte length of the balanced span starting at `text[0] == open`
///
/// Delimiters inside JSON string literals are ignored.
fn matching_close(text: &str, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        if c == '"' {
            in_string = true;
        } else if c == open {
            depth += 1;
        } else if c == close {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(i + c.len_utf8());
            }
        }
    }

    None
}
