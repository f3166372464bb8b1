//! Events that can occur in a lead conversation

use std::time::Duration;
use tokio::time::Instant;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    /// Inbound reply from the lead
    Reply { text: String, at: Instant },

    /// Scheduler scan found the lead possibly idle
    FollowUpDue {
        at: Instant,
        idle_threshold: Duration,
    },
}

impl Event {
    pub fn reply(text: impl Into<String>, at: Instant) -> Self {
        Event::Reply {
            text: text.into(),
            at,
        }
    }
}
