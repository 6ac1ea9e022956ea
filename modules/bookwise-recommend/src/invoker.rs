use async_trait::async_trait;
use tracing::debug;

use ai_client::{AiError, Claude};
use bookwise_common::{ModelSettings, ResponseFormat};

use crate::traits::{InvokeError, TextModel};

const JSON_ONLY_SYSTEM: &str =
    "Respond with a single JSON object exactly as the user's format instructions describe.";

/// Model invoker backed by the Anthropic Messages API.
#[derive(Clone)]
pub struct ClaudeInvoker {
    claude: Claude,
    response_format: ResponseFormat,
}

impl ClaudeInvoker {
    pub fn new(api_key: impl Into<String>, settings: &ModelSettings) -> Self {
        let claude = Claude::new(api_key, settings.model.clone())
            .with_max_tokens(settings.max_tokens)
            .with_timeout(settings.timeout);
        Self {
            claude,
            response_format: settings.response_format,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.claude = self.claude.with_base_url(url);
        self
    }
}

#[async_trait]
impl TextModel for ClaudeInvoker {
    fn model_id(&self) -> &str {
        self.claude.model()
    }

    async fn invoke(&self, prompt: &str) -> Result<String, InvokeError> {
        debug!(
            model = self.claude.model(),
            prompt_chars = prompt.chars().count(),
            "Invoking model"
        );
        let response = match self.response_format {
            ResponseFormat::Json => self.claude.chat_completion(JSON_ONLY_SYSTEM, prompt).await,
            ResponseFormat::Text => self.claude.complete(prompt).await,
        };
        response.map_err(InvokeError::from)
    }
}

impl From<AiError> for InvokeError {
    fn from(e: AiError) -> Self {
        match e {
            AiError::AccessDenied { message, .. } => InvokeError::AccessDenied(message),
            AiError::RateLimited { retry_after, .. } => InvokeError::RateLimited { retry_after },
            other => InvokeError::Upstream(other.to_string()),
        }
    }
}
