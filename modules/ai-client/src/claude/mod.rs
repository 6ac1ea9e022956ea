mod client;
pub(crate) mod types;

use std::time::Duration;

use crate::error::AiError;

use client::ClaudeClient;
use types::*;

const DEFAULT_MAX_TOKENS: u32 = 4096;

// =============================================================================
// Claude Agent
// =============================================================================

#[derive(Clone)]
pub struct Claude {
    api_key: String,
    pub(crate) model: String,
    base_url: Option<String>,
    max_tokens: u32,
    timeout: Option<Duration>,
    http: reqwest::Client,
}

impl Claude {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: None,
            http: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Bound every request made by this agent. Timeouts surface as
    /// [`AiError::Timeout`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    fn client(&self) -> ClaudeClient<'_> {
        let client = ClaudeClient::new(&self.api_key, &self.http).with_timeout(self.timeout);
        if let Some(ref url) = self.base_url {
            client.with_base_url(url)
        } else {
            client
        }
    }

    // =========================================================================
    // Convenience methods
    // =========================================================================

    pub async fn chat_completion(
        &self,
        system: impl Into<String>,
        user: impl Into<String>,
    ) -> Result<String, AiError> {
        let request = ChatRequest::new(&self.model)
            .system(system)
            .message(WireMessage::user(user))
            .max_tokens(self.max_tokens)
            .temperature(0.0);

        self.send(&request).await
    }

    /// Single user turn with no system prompt.
    pub async fn complete(&self, prompt: &str) -> Result<String, AiError> {
        let request = ChatRequest::new(&self.model)
            .message(WireMessage::user(prompt))
            .max_tokens(self.max_tokens)
            .temperature(0.0);

        self.send(&request).await
    }

    async fn send(&self, request: &ChatRequest) -> Result<String, AiError> {
        let response = self.client().chat(request).await?;

        response
            .text()
            .ok_or_else(|| AiError::EmptyResponse("no text block in Claude response".to_string()))
    }
}
