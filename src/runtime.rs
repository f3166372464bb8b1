//! Runtime for executing lead conversations
//!
//! `LeadAgent` applies state machine transitions and performs their effects
//! against a record store and a message generator. `FollowUpScheduler`
//! drives the same agent on a timer to nudge idle leads.

mod executor;
mod registry;
mod scheduler;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::LeadAgent;
pub use scheduler::{FollowUpScheduler, FollowUpStream};
pub use traits::*;

use crate::state_machine::TransitionError;
use crate::store::{CsvRecordStore, StoreError};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Type alias for the production agent with concrete implementations
pub type ProductionAgent = LeadAgent<CsvRecordStore, Arc<dyn MessageSource>>;

/// Errors surfaced to callers of the agent
#[derive(Debug, Error)]
pub enum AgentError {
    /// A record could not be made durable; the lead keeps its previous state
    #[error("Failed to persist record for lead {lead_id}: {source}")]
    Persistence {
        lead_id: String,
        #[source]
        source: StoreError,
    },
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// A re-engagement message produced by the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowUp {
    pub lead_id: String,
    pub message: String,
}

impl fmt::Display for FollowUp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.lead_id, self.message)
    }
}
