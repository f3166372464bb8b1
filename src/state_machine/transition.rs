//! Pure state transition function
//!
//! Given a lead's current state and an event, compute the next state and the
//! effects the runtime must execute. No I/O happens here; timestamps arrive
//! inside the event.

use super::effect::Response;
use super::state::{LeadState, LeadStatus, Phase, QualificationContext};
use super::{Effect, Event};
use crate::messages::MessageKind;
use crate::store::LeadRecord;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: LeadState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: LeadState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Record rows this transition wants persisted
    pub fn records(&self) -> impl Iterator<Item = &LeadRecord> {
        self.effects.iter().filter_map(|effect| match effect {
            Effect::PersistRecord(record) => Some(record),
            _ => None,
        })
    }

    /// The reply to send back, if any
    pub fn response(&self) -> Option<&Response> {
        self.effects.iter().find_map(|effect| match effect {
            Effect::Respond(response) => Some(response),
            _ => None,
        })
    }

    pub fn sends_follow_up(&self) -> bool {
        self.effects.contains(&Effect::SendFollowUp)
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Lead is not eligible for a follow-up: {0}")]
    NotEligible(&'static str),
}

/// Pure transition function
pub fn transition(
    state: &LeadState,
    context: &QualificationContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state.phase(), event) {
        // ============================================================
        // Terminal leads: late or duplicate replies change nothing
        // ============================================================
        (Phase::Declined | Phase::Complete, Event::Reply { .. }) => {
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::Respond(Response::Completed)))
        }

        (Phase::Declined | Phase::Complete, Event::FollowUpDue { .. }) => {
            Err(TransitionError::NotEligible("lead is terminal"))
        }

        // ============================================================
        // Consent
        // ============================================================
        (Phase::AwaitingConsent, Event::Reply { text, at }) => {
            let mut next = state.clone();
            next.last_interaction_at = at;

            if context.is_affirmative(&text) {
                next.consented = true;
                Ok(ask_or_secure(next, context))
            } else {
                next.status = LeadStatus::NoResponse;
                let record = LeadRecord::from_state(&next);
                Ok(TransitionResult::new(next)
                    .with_effect(Effect::PersistRecord(record))
                    .with_effect(Effect::generated(MessageKind::Decline)))
            }
        }

        (Phase::AwaitingConsent, Event::FollowUpDue { .. }) => {
            Err(TransitionError::NotEligible("lead has not consented"))
        }

        // ============================================================
        // Questionnaire
        // ============================================================
        (Phase::Asking { index }, Event::Reply { text, at }) => {
            let mut next = state.clone();
            next.last_interaction_at = at;

            if let Some(question) = context.question(index) {
                next.answers.entry(question.field).or_insert(text);
                next.current_question_index = index + 1;
            }
            Ok(ask_or_secure(next, context))
        }

        (
            Phase::Asking { index },
            Event::FollowUpDue {
                at,
                idle_threshold,
            },
        ) => {
            if at.saturating_duration_since(state.last_interaction_at) < idle_threshold {
                return Err(TransitionError::NotEligible("lead is not idle"));
            }

            let mut next = state.clone();
            next.last_interaction_at = at;

            let mut result = if index > 0 {
                // Log partial progress before nudging
                next.status = LeadStatus::Initiated;
                let record = LeadRecord::from_state(&next);
                TransitionResult::new(next).with_effect(Effect::PersistRecord(record))
            } else {
                TransitionResult::new(next)
            };
            result = result.with_effect(Effect::SendFollowUp);
            Ok(result)
        }
    }
}

/// Ask the question at the current index, or secure the lead when none remain
fn ask_or_secure(mut next: LeadState, context: &QualificationContext) -> TransitionResult {
    if let Some(question) = context.question(next.current_question_index) {
        let prompt = question.prompt.clone();
        return TransitionResult::new(next).with_effect(Effect::question(prompt));
    }

    next.status = LeadStatus::Secured;
    let record = LeadRecord::from_state(&next);
    TransitionResult::new(next)
        .with_effect(Effect::PersistRecord(record))
        .with_effect(Effect::generated(MessageKind::ThankYou))
}
