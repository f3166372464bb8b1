//! Outbound message generation
//!
//! Every message kind has fixed canonical wording. `LlmMessageSource` asks a
//! model to reproduce it, `StaticMessages` returns it directly, and
//! `FallbackMessages` sits in front of either one so callers always get text.

use crate::llm::{LlmError, LlmRequest, LlmService};
use crate::runtime::MessageSource;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;

const MAX_MESSAGE_TOKENS: u32 = 120;

/// Kinds of generated messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Initial,
    Decline,
    ThankYou,
    FollowUp,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Initial => "initial",
            MessageKind::Decline => "decline",
            MessageKind::ThankYou => "thank_you",
            MessageKind::FollowUp => "follow_up",
        }
    }

    /// Canonical wording; only `Initial` uses the lead's name
    pub fn canonical(self, name: Option<&str>) -> String {
        match self {
            MessageKind::Initial => format!(
                "Hey {}, thank you for filling out the form. I'd like to gather some information from you. Is that okay?",
                name.unwrap_or("there")
            ),
            MessageKind::Decline => "Alright, no problem. Have a great day!".to_string(),
            MessageKind::ThankYou => "Thank you for providing the information!".to_string(),
            MessageKind::FollowUp => "Just checking in to see if you're still interested. Let me know when you're ready to continue.".to_string(),
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
    #[error("Model returned an empty message")]
    EmptyResponse,
    #[error("Generation timed out after {0:?}")]
    TimedOut(Duration),
}

// ============================================================================
// Sources
// ============================================================================

/// Generates messages by asking a model to reproduce the canonical wording
pub struct LlmMessageSource {
    llm: Arc<dyn LlmService>,
}

impl LlmMessageSource {
    pub fn new(llm: Arc<dyn LlmService>) -> Self {
        Self { llm }
    }

    fn prompt(kind: MessageKind, name: Option<&str>) -> String {
        format!(
            "Generate the exact message: '{}' Do not modify the wording.",
            kind.canonical(name)
        )
    }
}

#[async_trait]
impl MessageSource for LlmMessageSource {
    async fn generate(
        &self,
        kind: MessageKind,
        name: Option<&str>,
    ) -> Result<String, GenerationError> {
        let request =
            LlmRequest::prompt(Self::prompt(kind, name)).with_max_tokens(MAX_MESSAGE_TOKENS);
        let response = self.llm.complete(&request).await?;

        let text = response.text.trim();
        if text.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(text.to_string())
    }
}

/// Canonical table, used when no model is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticMessages;

#[async_trait]
impl MessageSource for StaticMessages {
    async fn generate(
        &self,
        kind: MessageKind,
        name: Option<&str>,
    ) -> Result<String, GenerationError> {
        Ok(kind.canonical(name))
    }
}

// ============================================================================
// Fallback decorator
// ============================================================================

/// Infallible renderer: any failure of the inner source becomes canonical text
pub struct FallbackMessages<S: MessageSource> {
    inner: S,
    timeout: Option<Duration>,
}

impl<S: MessageSource> FallbackMessages<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, limit: Option<Duration>) -> Self {
        self.timeout = limit;
        self
    }

    pub async fn render(&self, kind: MessageKind, name: Option<&str>) -> String {
        match self.try_generate(kind, name).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(kind = %kind, error = %e, "Message generation failed, using canonical text");
                kind.canonical(name)
            }
        }
    }

    async fn try_generate(
        &self,
        kind: MessageKind,
        name: Option<&str>,
    ) -> Result<String, GenerationError> {
        match self.timeout {
            Some(limit) => timeout(limit, self.inner.generate(kind, name))
                .await
                .map_err(|_| GenerationError::TimedOut(limit))?,
            None => self.inner.generate(kind, name).await,
        }
    }
}
