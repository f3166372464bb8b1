//! Trait abstractions for runtime I/O
//!
//! These traits let the agent run against mock stores and generators in
//! tests.

use crate::messages::{GenerationError, MessageKind};
use crate::store::{CsvRecordStore, LeadRecord, RecordFile, StoreError};
use async_trait::async_trait;
use std::sync::Arc;

/// Durable sink for lead records
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Append one record. Must be durable when this returns `Ok`.
    async fn append(&self, record: &LeadRecord) -> Result<(), StoreError>;
}

/// A way of producing message text, which may fail
#[async_trait]
pub trait MessageSource: Send + Sync {
    async fn generate(
        &self,
        kind: MessageKind,
        name: Option<&str>,
    ) -> Result<String, GenerationError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
    async fn append(&self, record: &LeadRecord) -> Result<(), StoreError> {
        (**self).append(record).await
    }
}

#[async_trait]
impl<T: MessageSource + ?Sized> MessageSource for Arc<T> {
    async fn generate(
        &self,
        kind: MessageKind,
        name: Option<&str>,
    ) -> Result<String, GenerationError> {
        (**self).generate(kind, name).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

#[async_trait]
impl<F: RecordFile> RecordStore for CsvRecordStore<F> {
    async fn append(&self, record: &LeadRecord) -> Result<(), StoreError> {
        self.append_record(record)
    }
}
