use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use bookwise_common::{RecommendError, RecommendationQuery};

use crate::requestor::Requestor;
use crate::AppState;

/// Suggested wait when the provider throttles without saying how long.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

#[derive(Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    query: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_length: Option<usize>,
}

impl ErrorBody {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            ..Default::default()
        }
    }

    fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

pub async fn api_recommendations(
    State(state): State<Arc<AppState>>,
    Requestor(requestor): Requestor,
    body: Result<Json<RecommendRequest>, JsonRejection>,
) -> Response {
    let text = match body {
        Ok(Json(req)) => req.query,
        Err(rejection) => {
            let err = RecommendError::InvalidBody(rejection.body_text());
            warn!(requestor = %requestor, kind = %err.kind(), error = %err, "Rejected recommendation request");
            return failure_response(&err, state.pipeline.model_id());
        }
    };

    let query = RecommendationQuery::new(text, requestor);
    match state.pipeline.recommend(&query).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => failure_response(&e, state.pipeline.model_id()),
    }
}

/// Map a classified failure onto status and body. Upstream internals never
/// leave the service; only model-output failures echo the (truncated) text.
pub fn failure_response(err: &RecommendError, model_id: &str) -> Response {
    match err {
        RecommendError::EmptyQuery => {
            (StatusCode::BAD_REQUEST, Json(ErrorBody::new("Query is required"))).into_response()
        }
        RecommendError::QueryTooLong { max, .. } => {
            let mut body = ErrorBody::new("Query too long")
                .details(format!("Query must be {max} characters or less"));
            body.max_length = Some(*max);
            (StatusCode::BAD_REQUEST, Json(body)).into_response()
        }
        RecommendError::InvalidBody(reason) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody::new("Invalid request body").details(reason.clone())),
        )
            .into_response(),
        RecommendError::CatalogUnavailable(_) | RecommendError::ModelUnavailable(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::new("Failed to get recommendations")),
        )
            .into_response(),
        RecommendError::AccessDenied(_) => (
            StatusCode::FORBIDDEN,
            Json(
                ErrorBody::new("Model access denied").details(format!(
                    "Please ensure model access is enabled for {model_id}"
                )),
            ),
        )
            .into_response(),
        RecommendError::RateLimited { retry_after } => {
            let secs = retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            let mut body =
                ErrorBody::new("Rate limit exceeded").details("Please try again in a few moments");
            body.retry_after = Some(secs);
            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, secs.to_string())],
                Json(body),
            )
                .into_response()
        }
        RecommendError::ExtractionFailed { .. }
        | RecommendError::MalformedJson { .. }
        | RecommendError::InvalidStructure { .. }
        | RecommendError::InvalidField { .. } => {
            let mut body = ErrorBody::new("Failed to parse AI response").details(err.to_string());
            body.raw_response = err.raw_excerpt().map(str::to_string);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}
