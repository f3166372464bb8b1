//! LLM provider abstraction
//!
//! Message generation talks to a generative model through `LlmService`.
//! Only Gemini is wired up; the trait keeps the provider swappable.

mod error;
mod gemini;
mod types;

pub use error::LlmError;
pub use gemini::{GeminiService, DEFAULT_GEMINI_MODEL};
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for LLM providers
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Make a completion request
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Configuration for the LLM provider
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub gemini_api_key: Option<String>,
    pub gemini_model: Option<String>,
    /// Gateway URL; when set the key is implicit
    pub gateway: Option<String>,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self {
            gemini_api_key: std::env::var("GEMINI_API_KEY").ok(),
            gemini_model: std::env::var("GEMINI_MODEL").ok(),
            gateway: std::env::var("LLM_GATEWAY").ok(),
        }
    }

    /// Build the configured service wrapped in `LoggingService`.
    ///
    /// Returns `Ok(None)` when no key or gateway is configured.
    pub fn build_service(&self) -> Result<Option<Arc<dyn LlmService>>, LlmError> {
        let api_key = if self.gateway.is_some() {
            "implicit".to_string()
        } else {
            match self.gemini_api_key.as_deref() {
                Some(key) if !key.is_empty() => key.to_string(),
                _ => return Ok(None),
            }
        };

        let model = self.gemini_model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL);
        let service = GeminiService::new(api_key, model, self.gateway.as_deref())?;
        Ok(Some(Arc::new(LoggingService::new(Arc::new(service)))))
    }
}

/// Logging wrapper for LLM services
pub struct LoggingService {
    inner: Arc<dyn LlmService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl LlmService for LoggingService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    end_turn = response.end_turn,
                    "LLM request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    transient = e.kind.is_transient(),
                    "LLM request failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
