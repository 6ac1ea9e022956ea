// Seams between the orchestrator and its two external collaborators.
//
// CatalogReader: point-in-time read of the books catalog.
// TextModel: one prompt in, raw text or a classified failure out.
//
// Both are swapped for MockCatalog / MockModel in tests.

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use bookwise_common::{CatalogItem, RecommendError};

// ---------------------------------------------------------------------------
// CatalogReader
// ---------------------------------------------------------------------------

#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// Every item currently available, in catalog order.
    async fn list_available(&self) -> Result<Vec<CatalogItem>>;
}

// ---------------------------------------------------------------------------
// TextModel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvokeError {
    #[error("model access denied: {0}")]
    AccessDenied(String),

    #[error("model provider throttled the request")]
    RateLimited { retry_after: Option<u64> },

    #[error("model invocation failed: {0}")]
    Upstream(String),
}

impl From<InvokeError> for RecommendError {
    fn from(e: InvokeError) -> Self {
        match e {
            InvokeError::AccessDenied(message) => RecommendError::AccessDenied(message),
            InvokeError::RateLimited { retry_after } => RecommendError::RateLimited { retry_after },
            InvokeError::Upstream(message) => RecommendError::ModelUnavailable(message),
        }
    }
}

#[async_trait]
pub trait TextModel: Send + Sync {
    /// Identifier reported in request logs.
    fn model_id(&self) -> &str;

    /// Single call, no retries.
    async fn invoke(&self, prompt: &str) -> std::result::Result<String, InvokeError>;
}
