use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Terminal failure category of a recommendation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    BadRequest,
    UpstreamUnavailable,
    AccessDenied,
    RateLimited,
    ExtractionFailed,
    MalformedJson,
    InvalidStructure,
    InvalidField,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::BadRequest => "bad_request",
            FailureKind::UpstreamUnavailable => "upstream_unavailable",
            FailureKind::AccessDenied => "access_denied",
            FailureKind::RateLimited => "rate_limited",
            FailureKind::ExtractionFailed => "extraction_failed",
            FailureKind::MalformedJson => "malformed_json",
            FailureKind::InvalidStructure => "invalid_structure",
            FailureKind::InvalidField => "invalid_field",
        }
    }

    /// Failures caused by unusable model output.
    pub fn is_model_output(&self) -> bool {
        matches!(
            self,
            FailureKind::ExtractionFailed
                | FailureKind::MalformedJson
                | FailureKind::InvalidStructure
                | FailureKind::InvalidField
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum RecommendError {
    #[error("Query is required")]
    EmptyQuery,

    #[error("Query too long: {length} characters (max {max})")]
    QueryTooLong { length: usize, max: usize },

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Catalog unavailable: {0}")]
    CatalogUnavailable(String),

    #[error("Model invocation failed: {0}")]
    ModelUnavailable(String),

    #[error("Model access denied: {0}")]
    AccessDenied(String),

    #[error("Model provider rate limit exceeded")]
    RateLimited { retry_after: Option<u64> },

    #[error("No JSON object found in model response")]
    ExtractionFailed { raw_excerpt: String },

    #[error("Model response is not valid JSON: {message}")]
    MalformedJson { message: String, raw_excerpt: String },

    #[error("Invalid recommendations structure: {reason}")]
    InvalidStructure { reason: String, raw_excerpt: String },

    #[error("Recommendation {index} missing or invalid {field}")]
    InvalidField {
        field: &'static str,
        /// 1-based position in the model's array.
        index: usize,
        raw_excerpt: String,
    },
}

impl RecommendError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RecommendError::EmptyQuery
            | RecommendError::QueryTooLong { .. }
            | RecommendError::InvalidBody(_) => FailureKind::BadRequest,
            RecommendError::CatalogUnavailable(_) | RecommendError::ModelUnavailable(_) => {
                FailureKind::UpstreamUnavailable
            }
            RecommendError::AccessDenied(_) => FailureKind::AccessDenied,
            RecommendError::RateLimited { .. } => FailureKind::RateLimited,
            RecommendError::ExtractionFailed { .. } => FailureKind::ExtractionFailed,
            RecommendError::MalformedJson { .. } => FailureKind::MalformedJson,
            RecommendError::InvalidStructure { .. } => FailureKind::InvalidStructure,
            RecommendError::InvalidField { .. } => FailureKind::InvalidField,
        }
    }

    /// Truncated model output attached to output-related failures.
    pub fn raw_excerpt(&self) -> Option<&str> {
        match self {
            RecommendError::ExtractionFailed { raw_excerpt }
            | RecommendError::MalformedJson { raw_excerpt, .. }
            | RecommendError::InvalidStructure { raw_excerpt, .. }
            | RecommendError::InvalidField { raw_excerpt, .. } => Some(raw_excerpt),
            _ => None,
        }
    }
}
