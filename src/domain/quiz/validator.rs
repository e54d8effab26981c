//! Validation of model-generated quiz questions

use serde_json::{Map, Value};
use tracing::warn;

use super::question::{OPTION_COUNT, QuizQuestion};

const NO_EXPLANATION: &str = "No explanation provided.";

/// Validate one raw question; `index` is 1-based and names the default id
///
/// Rejections are logged and return `None`. A missing `correct_index`
/// defaults to 0, but a present value that is not an integer in `0..4` is
/// rejected.
pub fn validate(raw: &Value, index: usize) -> Option<QuizQuestion> {
    let Some(obj) = raw.as_object() else {
        warn!(index, "Quiz question is not an object");
        return None;
    };

    let question = obj.get("question").and_then(Value::as_str).unwrap_or("").trim();
    if question.is_empty() {
        warn!(index, "Quiz question has no question text");
        return None;
    }

    let options = match obj.get("options") {
        Some(Value::Array(items)) if items.len() == OPTION_COUNT => {
            items.iter().map(option_text).collect::<Vec<_>>()
        }
        _ => {
            warn!(index, "Quiz question does not have exactly 4 options");
            return None;
        }
    };

    let correct_index = match correct_index(obj) {
        Ok(i) => i,
        Err(raw_index) => {
            warn!(index, correct_index = %raw_index, "Quiz question has invalid correct_index");
            return None;
        }
    };

    let explanation = obj
        .get("explanation")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .unwrap_or(NO_EXPLANATION);

    let id = match obj.get("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => format!("q{}", index),
    };

    match QuizQuestion::new(id, question, options, correct_index, explanation) {
        Ok(q) => Some(q),
        Err(e) => {
            warn!(index, "Rejected quiz question: {}", e);
            None
        }
    }
}

fn option_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Accepts integers, integral floats and numeric strings; absent means 0
fn correct_index(obj: &Map<String, Value>) -> Result<usize, String> {
    let value = obj.get("correct_index").or_else(|| obj.get("correctIndex"));

    let parsed: Option<i64> = match value {
        None | Some(Value::Null) => return Ok(0),
        Some(Value::Number(n)) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.is_finite())
                .map(|f| f as i64)
        }),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        Some(_) => None,
    };

    match parsed {
        Some(i) if (0..OPTION_COUNT as i64).contains(&i) => Ok(i as usize),
        _ => Err(value.map(|v| v.to_string()).unwrap_or_default()),
    }
}

/// Clearly labeled placeholder questions used when generation fails
pub fn fallback_questions(topic: Option<&str>, count: usize) -> Vec<QuizQuestion> {
    let subject = topic
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or("the content");

    (1..=count)
        .filter_map(|i| {
            QuizQuestion::new(
                format!("q{}", i),
                format!("[Fallback] Sample question {} about {}?", i, subject),
                vec![
                    "Option A".to_string(),
                    "Option B".to_string(),
                    "Option C".to_string(),
                    "Option D".to_string(),
                ],
                0,
                "[Fallback] This is a placeholder question. The AI service was unavailable.",
            )
            .ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(correct_index: Value) -> Value {
        json!({
            "question": "What gas do plants absorb?",
            "options": ["Oxygen", "Carbon dioxide", "Nitrogen", "Helium"],
            "correct_index": correct_index,
            "explanation": "Plants absorb CO2 for photosynthesis."
        })
    }

    #[test]
    fn test_valid_question_accepted() {
        let q = validate(&raw(json!(1)), 3).unwrap();

        assert_eq!(q.id(), "q3");
        assert_eq!(q.correct_index(), 1);
        assert_eq!(q.options()[1], "Carbon dioxide");
    }

    #[test]
    fn test_correct_index_coercion() {
        assert_eq!(validate(&raw(json!("2")), 1).unwrap().correct_index(), 2);
        assert_eq!(validate(&raw(json!(3.0)), 1).unwrap().correct_index(), 3);
        assert_eq!(validate(&raw(Value::Null), 1).unwrap().correct_index(), 0);
    }

    #[test]
    fn test_invalid_correct_index_rejected() {
        assert!(validate(&raw(json!(4)), 1).is_none());
        assert!(validate(&raw(json!(-1)), 1).is_none());
        assert!(validate(&raw(json!("B")), 1).is_none());
        assert!(validate(&raw(json!(1.5)), 1).is_none());
        assert!(validate(&raw(json!(true)), 1).is_none());
    }

    #[test]
    fn test_missing_index_defaults_to_zero() {
        let mut value = raw(json!(2));
        value.as_object_mut().unwrap().remove("correct_index");

        assert_eq!(validate(&value, 1).unwrap().correct_index(), 0);
    }

    #[test]
    fn test_camel_case_index_accepted() {
        let value = json!({
            "question": "Q?",
            "options": ["A", "B", "C", "D"],
            "correctIndex": 2,
            "explanation": "E"
        });
        assert_eq!(validate(&value, 1).unwrap().correct_index(), 2);
    }

    #[test]
    fn test_duplicate_options_rejected() {
        let value = json!({
            "question": "Q?",
            "options": ["Paris", "paris", " Paris ", "Rome"],
            "correct_index": 0
        });
        assert!(validate(&value, 1).is_none());
    }

    #[test]
    fn test_structural_rejections() {
        assert!(validate(&json!("not an object"), 1).is_none());
        assert!(validate(&json!({"question": "", "options": ["A","B","C","D"]}), 1).is_none());
        assert!(validate(&json!({"question": "Q?", "options": ["A","B","C"]}), 1).is_none());
        assert!(validate(&json!({"question": "Q?", "options": ["A","B",null,"D"]}), 1).is_none());
    }

    #[test]
    fn test_missing_explanation_substituted() {
        let value = json!({
            "id": "custom",
            "question": "Q?",
            "options": ["A", "B", "C", "D"],
            "correct_index": 0
        });
        let q = validate(&value, 1).unwrap();

        assert_eq!(q.id(), "custom");
        assert_eq!(q.explanation(), "No explanation provided.");
    }

    #[test]
    fn test_fallback_questions() {
        let questions = fallback_questions(Some("Algebra"), 3);

        assert_eq!(questions.len(), 3);
        assert_eq!(questions[2].id(), "q3");
        assert_eq!(questions[0].question(), "[Fallback] Sample question 1 about Algebra?");
        assert!(questions.iter().all(|q| q.is_placeholder()));

        let untitled = fallback_questions(None, 1);
        assert!(untitled[0].question().contains("about the content"));
    }
}
