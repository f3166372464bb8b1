//! Lead conversation executor

use super::registry::LeadRegistry;
use super::traits::{MessageSource, RecordStore};
use super::{AgentError, FollowUp};

use crate::messages::{FallbackMessages, MessageKind};
use crate::state_machine::{
    transition, Event, LeadState, QualificationContext, Response, TransitionError, TransitionResult,
};
use std::time::Duration;
use tokio::time::Instant;

/// Reply for any event on a lead that already reached a terminal status
pub const COMPLETED_MESSAGE: &str = "Conversation completed.";

/// Generic lead agent that can work with any record store and message source
pub struct LeadAgent<S, G>
where
    S: RecordStore,
    G: MessageSource,
{
    context: QualificationContext,
    idle_threshold: Duration,
    registry: LeadRegistry,
    store: S,
    messages: FallbackMessages<G>,
}

impl<S, G> LeadAgent<S, G>
where
    S: RecordStore,
    G: MessageSource,
{
    pub fn new(
        context: QualificationContext,
        idle_threshold: Duration,
        store: S,
        messages: FallbackMessages<G>,
    ) -> Self {
        Self {
            context,
            idle_threshold,
            registry: LeadRegistry::new(),
            store,
            messages,
        }
    }

    pub fn idle_threshold(&self) -> Duration {
        self.idle_threshold
    }

    pub fn registry(&self) -> &LeadRegistry {
        &self.registry
    }

    /// Copy of a lead's current state
    pub async fn snapshot(&self, lead_id: &str) -> Option<LeadState> {
        let lead = self.registry.get(lead_id).await?;
        let state = lead.lock().await.clone();
        Some(state)
    }

    /// Advance a lead's conversation by one inbound event and return the
    /// message to send back.
    ///
    /// The first call for an unseen lead only creates it; `input` is ignored.
    pub async fn handle_interaction(
        &self,
        lead_id: &str,
        input: &str,
        name: &str,
    ) -> Result<String, AgentError> {
        let (lead, created) = self.registry.get_or_create(lead_id, name).await;
        if created {
            tracing::info!(lead_id = %lead_id, name = %name, "New lead");
            return Ok(self.messages.render(MessageKind::Initial, Some(name)).await);
        }

        // The lead lock covers the transition and its record write, and is
        // released before any generator call.
        let (response, lead_name) = {
            let mut state = lead.lock().await;
            let result = transition(&state, &self.context, Event::reply(input, Instant::now()))?;
            let response = result.response().cloned().unwrap_or(Response::Completed);
            self.apply(&mut state, result).await?;
            (response, state.name.clone())
        };

        Ok(match response {
            Response::Question(prompt) => prompt,
            Response::Generated(kind) => self.messages.render(kind, Some(&lead_name)).await,
            Response::Completed => COMPLETED_MESSAGE.to_string(),
        })
    }

    /// Ids of consented, non-terminal leads idle for at least the threshold
    pub async fn idle_leads(&self, now: Instant) -> Vec<String> {
        let mut idle = Vec::new();
        for (lead_id, lead) in self.registry.entries().await {
            let state = lead.lock().await;
            if !state.is_terminal()
                && state.consented
                && now.saturating_duration_since(state.last_interaction_at) >= self.idle_threshold
            {
                idle.push(lead_id);
            }
        }
        idle
    }

    /// Run one follow-up cycle for a lead.
    ///
    /// Eligibility is re-checked under the lead's lock, so a reply that
    /// arrived after the scan simply yields `Ok(None)`.
    pub async fn follow_up(&self, lead_id: &str, now: Instant) -> Result<Option<FollowUp>, AgentError> {
        let Some(lead) = self.registry.get(lead_id).await else {
            return Ok(None);
        };

        {
            let mut state = lead.lock().await;
            let event = Event::FollowUpDue {
                at: now,
                idle_threshold: self.idle_threshold,
            };
            let result = match transition(&state, &self.context, event) {
                Ok(result) => result,
                Err(TransitionError::NotEligible(reason)) => {
                    tracing::debug!(lead_id = %lead_id, reason, "Skipping follow-up");
                    return Ok(None);
                }
            };
            if !result.sends_follow_up() {
                return Ok(None);
            }
            self.apply(&mut state, result).await?;
        }

        tracing::info!(lead_id = %lead_id, "Sending follow-up to lead");
        let message = self.messages.render(MessageKind::FollowUp, None).await;
        Ok(Some(FollowUp {
            lead_id: lead_id.to_string(),
            message,
        }))
    }

    /// Persist the transition's records, then commit its state.
    ///
    /// If an append fails the lead keeps its previous state, so it is never
    /// terminal without a durable record.
    async fn apply(&self, state: &mut LeadState, result: TransitionResult) -> Result<(), AgentError> {
        for record in result.records() {
            self.store
                .append(record)
                .await
                .map_err(|source| AgentError::Persistence {
                    lead_id: state.lead_id.clone(),
                    source,
                })?;
        }

        let new_state = result.new_state;
        if new_state.status != state.status || new_state.consented != state.consented {
            tracing::info!(
                lead_id = %new_state.lead_id,
                status = %new_state.status,
                consented = new_state.consented,
                answered = new_state.current_question_index,
                "Lead state changed"
            );
        }
        *state = new_state;
        Ok(())
    }
}
