//! In-memory registry of lead conversations
//!
//! One `LeadState` per lead id for the lifetime of the owning agent. Each
//! state sits behind its own mutex so transitions for one lead are serialized
//! while different leads proceed independently.

use crate::state_machine::LeadState;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

pub type SharedLead = Arc<Mutex<LeadState>>;

#[derive(Default)]
pub struct LeadRegistry {
    leads: RwLock<HashMap<String, SharedLead>>,
}

impl LeadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a lead, creating it when unseen. The flag is `true` only for
    /// the call that created the entry.
    pub async fn get_or_create(&self, lead_id: &str, name: &str) -> (SharedLead, bool) {
        {
            let leads = self.leads.read().await;
            if let Some(lead) = leads.get(lead_id) {
                return (Arc::clone(lead), false);
            }
        }

        // Re-check under the write lock; another task may have won the race
        let mut leads = self.leads.write().await;
        if let Some(lead) = leads.get(lead_id) {
            return (Arc::clone(lead), false);
        }

        let lead = Arc::new(Mutex::new(LeadState::new(lead_id, name, Instant::now())));
        leads.insert(lead_id.to_string(), Arc::clone(&lead));
        (lead, true)
    }

    pub async fn get(&self, lead_id: &str) -> Option<SharedLead> {
        self.leads.read().await.get(lead_id).cloned()
    }

    /// Snapshot of all entries; the map lock is released before returning
    pub async fn entries(&self) -> Vec<(String, SharedLead)> {
        self.leads
            .read()
            .await
            .iter()
            .map(|(id, lead)| (id.clone(), Arc::clone(lead)))
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.leads.read().await.len()
    }
}
