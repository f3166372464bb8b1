//! Effects produced by state transitions

use crate::messages::MessageKind;
use crate::store::LeadRecord;

/// What the lead should be told in reply to an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Question prompt, sent verbatim
    Question(String),
    /// Text produced by the message generator
    Generated(MessageKind),
    /// Fixed reply for leads that already reached a terminal status
    Completed,
}

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Append a row to the record store
    PersistRecord(LeadRecord),

    /// Reply to the inbound event
    Respond(Response),

    /// Emit a follow-up message on the scheduler stream
    SendFollowUp,
}

impl Effect {
    pub fn question(prompt: impl Into<String>) -> Self {
        Effect::Respond(Response::Question(prompt.into()))
    }

    pub fn generated(kind: MessageKind) -> Self {
        Effect::Respond(Response::Generated(kind))
    }
}
