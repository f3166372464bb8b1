//! Mock implementations for testing
//!
//! These mocks enable agent and scheduler tests without real I/O.

use super::traits::*;
use super::LeadAgent;
use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService};
use crate::messages::{FallbackMessages, GenerationError, MessageKind};
use crate::state_machine::QualificationContext;
use crate::store::{LeadRecord, StoreError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Mock LLM Client
// ============================================================================

/// Mock LLM service that returns queued responses
pub struct MockLlmClient {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    model_id: String,
    /// Record of all requests made
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmClient {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response
    pub fn queue_response(&self, response: LlmResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmService for MockLlmClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// ============================================================================
// Message Sources
// ============================================================================

/// Returns canonical text (or fails on demand) and records every request
pub struct RecordingMessageSource {
    calls: Mutex<Vec<MessageKind>>,
    failing: bool,
}

impl RecordingMessageSource {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: false,
        }
    }

    /// Every call fails, so the fallback decorator must supply the text
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> Vec<MessageKind> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for RecordingMessageSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageSource for RecordingMessageSource {
    async fn generate(
        &self,
        kind: MessageKind,
        name: Option<&str>,
    ) -> Result<String, GenerationError> {
        self.calls.lock().unwrap().push(kind);
        if self.failing {
            return Err(GenerationError::Llm(LlmError::network("mock outage")));
        }
        Ok(kind.canonical(name))
    }
}

/// Never completes; exercises generation timeouts
pub struct StalledMessageSource;

#[async_trait]
impl MessageSource for StalledMessageSource {
    async fn generate(
        &self,
        _kind: MessageKind,
        _name: Option<&str>,
    ) -> Result<String, GenerationError> {
        std::future::pending().await
    }
}

/// Canonical text, but `FollowUp` messages take `delay` to produce
pub struct SlowFollowUpSource {
    delay: Duration,
}

impl SlowFollowUpSource {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl MessageSource for SlowFollowUpSource {
    async fn generate(
        &self,
        kind: MessageKind,
        name: Option<&str>,
    ) -> Result<String, GenerationError> {
        if kind == MessageKind::FollowUp {
            tokio::time::sleep(self.delay).await;
        }
        Ok(kind.canonical(name))
    }
}

// ============================================================================
// Record Stores
// ============================================================================

/// In-memory record store
#[derive(Default)]
pub struct InMemoryRecordStore {
    records: Mutex<Vec<LeadRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LeadRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn append(&self, record: &LeadRecord) -> Result<(), StoreError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Store whose appends fail with an I/O error until switched off
pub struct FailingRecordStore {
    inner: InMemoryRecordStore,
    failing: AtomicBool,
}

impl FailingRecordStore {
    pub fn new() -> Self {
        Self {
            inner: InMemoryRecordStore::new(),
            failing: AtomicBool::new(true),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn inner(&self) -> &InMemoryRecordStore {
        &self.inner
    }
}

impl Default for FailingRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for FailingRecordStore {
    async fn append(&self, record: &LeadRecord) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other("disk full")));
        }
        self.inner.append(record).await
    }
}

// ============================================================================
// Test Agent
// ============================================================================

pub type TestAgent = LeadAgent<Arc<InMemoryRecordStore>, Arc<RecordingMessageSource>>;

/// Agent with the default questionnaire, a 5 second idle threshold, and
/// handles to its mocks
pub fn test_agent() -> (TestAgent, Arc<InMemoryRecordStore>, Arc<RecordingMessageSource>) {
    let store = Arc::new(InMemoryRecordStore::new());
    let messages = Arc::new(RecordingMessageSource::new());
    let agent = LeadAgent::new(
        QualificationContext::default(),
        Duration::from_secs(5),
        Arc::clone(&store),
        FallbackMessages::new(Arc::clone(&messages)),
    );
    (agent, store, messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Usage;

    #[tokio::test]
    async fn test_mock_llm_client() {
        let mock = MockLlmClient::new("test-model");
        mock.queue_response(LlmResponse {
            text: "Hello".to_string(),
            end_turn: true,
            usage: Usage::default(),
        });

        let request = LlmRequest::prompt("hi");
        let response = mock.complete(&request).await.unwrap();
        assert_eq!(response.text, "Hello");

        // Second call should fail (no more responses)
        assert!(mock.complete(&request).await.is_err());
        assert_eq!(mock.recorded_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_failing_store_toggles() {
        let store = FailingRecordStore::new();
        let record = LeadRecord {
            lead_id: "x".into(),
            name: "X".into(),
            age: String::new(),
            country: String::new(),
            interest: String::new(),
            status: crate::state_machine::state::LeadStatus::NoResponse,
        };

        assert!(store.append(&record).await.is_err());
        store.set_failing(false);
        store.append(&record).await.unwrap();
        assert_eq!(store.inner().records(), vec![record]);
    }
}
