use serde_json::Value;
use thiserror::Error;

use ai_client::truncate_chars;
use bookwise_common::{Recommendation, RecommendError};

/// Used when the model omits confidence or sends a non-number.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Upper bound on model text carried in errors and responses.
pub const EXCERPT_CHARS: usize = 500;

pub fn excerpt(text: &str) -> String {
    truncate_chars(text, EXCERPT_CHARS).to_string()
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("Model response is not valid JSON: {0}")]
    MalformedJson(String),

    #[error("Invalid recommendations structure: {0}")]
    InvalidStructure(String),

    #[error("Recommendation {index} missing or invalid {field}")]
    InvalidField { field: &'static str, index: usize },
}

impl ValidationError {
    /// Attach an excerpt of the raw model response for the caller.
    pub fn with_raw_response(self, raw: &str) -> RecommendError {
        let raw_excerpt = excerpt(raw);
        match self {
            ValidationError::MalformedJson(message) => {
                RecommendError::MalformedJson { message, raw_excerpt }
            }
            ValidationError::InvalidStructure(reason) => {
                RecommendError::InvalidStructure { reason, raw_excerpt }
            }
            ValidationError::InvalidField { field, index } => RecommendError::InvalidField {
                field,
                index,
                raw_excerpt,
            },
        }
    }
}

/// Every element of `recommendations`, validated, untruncated. Any invalid
/// element fails the whole payload.
pub fn sanitize_recommendations(candidate: &str) -> Result<Vec<Recommendation>, ValidationError> {
    let value: Value =
        serde_json::from_str(candidate).map_err(|e| ValidationError::MalformedJson(e.to_string()))?;

    let object = value.as_object().ok_or_else(|| {
        ValidationError::InvalidStructure("top-level value is not an object".to_string())
    })?;
    let items = object
        .get("recommendations")
        .ok_or_else(|| {
            ValidationError::InvalidStructure("missing 'recommendations' field".to_string())
        })?
        .as_array()
        .ok_or_else(|| {
            ValidationError::InvalidStructure("'recommendations' is not an array".to_string())
        })?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| sanitize_item(item, i + 1))
        .collect()
}

fn sanitize_item(item: &Value, index: usize) -> Result<Recommendation, ValidationError> {
    Ok(Recommendation {
        title: required_text(item, "title", index)?,
        author: required_text(item, "author", index)?,
        reason: required_text(item, "reason", index)?,
        confidence: sanitize_confidence(item.get("confidence")),
    })
}

fn required_text(item: &Value, field: &'static str, index: usize) -> Result<String, ValidationError> {
    item.get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or(ValidationError::InvalidField { field, index })
}

/// Clamp numeric confidence into `[0, 1]`. Quoted numbers are accepted;
/// anything else becomes the default.
pub fn sanitize_confidence(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(c) if c.is_finite() => c.clamp(0.0, 1.0),
        _ => DEFAULT_CONFIDENCE,
    }
}
