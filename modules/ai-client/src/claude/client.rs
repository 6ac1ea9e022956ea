use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, RETRY_AFTER};
use tracing::debug;

use super::types::*;
use crate::error::AiError;
use crate::util::truncate_chars;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Upstream error bodies are kept in errors only up to this many characters.
const ERROR_BODY_LIMIT: usize = 500;

pub(crate) struct ClaudeClient<'a> {
    api_key: &'a str,
    http: &'a reqwest::Client,
    base_url: &'a str,
    timeout: Option<Duration>,
}

impl<'a> ClaudeClient<'a> {
    pub fn new(api_key: &'a str, http: &'a reqwest::Client) -> Self {
        Self {
            api_key,
            http,
            base_url: ANTHROPIC_API_URL,
            timeout: None,
        }
    }

    pub fn with_base_url(mut self, url: &'a str) -> Self {
        self.base_url = url;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn headers(&self) -> Result<HeaderMap, AiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(self.api_key)
                .map_err(|e| AiError::Config(format!("invalid API key header: {e}")))?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AiError> {
        let url = format!("{}/messages", self.base_url.trim_end_matches('/'));

        debug!(model = %request.model, max_tokens = request.max_tokens, "Claude chat request");

        let mut builder = self.http.post(&url).headers(self.headers()?).json(request);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let error_text = response.text().await?;
            return Err(classify_error(status, retry_after, &error_text));
        }

        let body: ChatResponse = response.json().await?;
        if let Some(usage) = &body.usage {
            debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                stop_reason = body.stop_reason.as_deref().unwrap_or("unknown"),
                "Claude chat response"
            );
        }
        Ok(body)
    }
}

/// Map a non-success response onto the error taxonomy. The status code
/// decides first; the envelope's error type covers gateways that rewrite
/// statuses.
pub(crate) fn classify_error(status: u16, retry_after: Option<u64>, body: &str) -> AiError {
    let detail = serde_json::from_str::<ErrorEnvelope>(body).ok().map(|e| e.error);
    let kind = detail.as_ref().map(|d| d.kind.as_str()).unwrap_or_default();
    let message = match &detail {
        Some(d) if !d.message.is_empty() => d.message.clone(),
        _ => truncate_chars(body, ERROR_BODY_LIMIT).to_string(),
    };

    match (status, kind) {
        (401 | 403, _) | (_, "permission_error" | "authentication_error") => {
            AiError::AccessDenied { status, message }
        }
        (429 | 529, _) | (_, "rate_limit_error" | "overloaded_error") => AiError::RateLimited {
            status,
            message,
            retry_after,
        },
        _ => AiError::Api { status, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_is_access_denied() {
        let body = r#"{"type":"error","error":{"type":"permission_error","message":"model not enabled"}}"#;
        let err = classify_error(403, None, body);
        match err {
            AiError::AccessDenied { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "model not enabled");
            }
            other => panic!("expected AccessDenied, got {other:?}"),
        }
    }

    #[test]
    fn too_many_requests_keeps_retry_after() {
        let err = classify_error(429, Some(30), "slow down");
        match err {
            AiError::RateLimited { retry_after, message, .. } => {
                assert_eq!(retry_after, Some(30));
                assert_eq!(message, "slow down");
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[test]
    fn overloaded_is_rate_limited() {
        assert!(classify_error(529, None, "").is_rate_limited());
    }

    #[test]
    fn error_type_wins_over_generic_status() {
        let body = r#"{"type":"error","error":{"type":"rate_limit_error","message":"quota"}}"#;
        assert!(classify_error(400, None, body).is_rate_limited());
    }

    #[test]
    fn other_statuses_are_api_errors() {
        let err = classify_error(500, None, "internal");
        assert!(matches!(err, AiError::Api { status: 500, .. }));
    }

    #[test]
    fn long_unstructured_bodies_are_truncated() {
        let body = "x".repeat(2_000);
        match classify_error(502, None, &body) {
            AiError::Api { message, .. } => assert_eq!(message.chars().count(), ERROR_BODY_LIMIT),
            other => panic!("expected Api, got {other:?}"),
        }
    }
}
