//! Lead conversation state types

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use tokio::time::Instant;

// ============================================================================
// Profile fields and questions
// ============================================================================

/// A profiling field collected by the questionnaire
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Age,
    Country,
    Interest,
}

impl Field {
    /// Record column holding this field
    pub fn column(self) -> &'static str {
        match self {
            Field::Age => "age",
            Field::Country => "country",
            Field::Interest => "interest",
        }
    }
}

/// A question prompt and the field its answer fills
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub field: Field,
    pub prompt: String,
}

impl Question {
    pub fn new(field: Field, prompt: impl Into<String>) -> Self {
        Self {
            field,
            prompt: prompt.into(),
        }
    }
}

/// The reference questionnaire
pub fn default_questions() -> Vec<Question> {
    vec![
        Question::new(Field::Age, "What is your age?"),
        Question::new(Field::Country, "Which country are you from?"),
        Question::new(
            Field::Interest,
            "What product or service are you interested in?",
        ),
    ]
}

// ============================================================================
// Lead State
// ============================================================================

/// Persisted lead status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    #[default]
    Initiated,
    Secured,
    NoResponse,
}

impl LeadStatus {
    /// Secured and declined leads never change again
    pub fn is_terminal(self) -> bool {
        matches!(self, LeadStatus::Secured | LeadStatus::NoResponse)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LeadStatus::Initiated => "initiated",
            LeadStatus::Secured => "secured",
            LeadStatus::NoResponse => "no_response",
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a lead is in the qualification flow, derived from `LeadState`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingConsent,
    Asking { index: usize },
    Declined,
    Complete,
}

/// Conversation state for a single lead
#[derive(Debug, Clone, PartialEq)]
pub struct LeadState {
    pub lead_id: String,
    pub name: String,
    pub status: LeadStatus,
    pub current_question_index: usize,
    pub answers: BTreeMap<Field, String>,
    pub consented: bool,
    pub last_interaction_at: Instant,
}

impl LeadState {
    pub fn new(lead_id: impl Into<String>, name: impl Into<String>, now: Instant) -> Self {
        Self {
            lead_id: lead_id.into(),
            name: name.into(),
            status: LeadStatus::Initiated,
            current_question_index: 0,
            answers: BTreeMap::new(),
            consented: false,
            last_interaction_at: now,
        }
    }

    pub fn phase(&self) -> Phase {
        match self.status {
            LeadStatus::NoResponse => Phase::Declined,
            LeadStatus::Secured => Phase::Complete,
            LeadStatus::Initiated if !self.consented => Phase::AwaitingConsent,
            LeadStatus::Initiated => Phase::Asking {
                index: self.current_question_index,
            },
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn answer(&self, field: Field) -> Option<&str> {
        self.answers.get(&field).map(String::as_str)
    }
}

// ============================================================================
// Context
// ============================================================================

/// Immutable configuration shared by every lead's transitions
#[derive(Debug, Clone)]
pub struct QualificationContext {
    pub questions: Vec<Question>,
    /// Lowercased affirmation tokens
    affirmations: HashSet<String>,
}

impl QualificationContext {
    pub fn new<I, S>(questions: Vec<Question>, affirmations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            questions,
            affirmations: affirmations
                .into_iter()
                .map(|token| token.as_ref().trim().to_lowercase())
                .filter(|token| !token.is_empty())
                .collect(),
        }
    }

    /// Closed two-way consent branch: an exact token match is consent,
    /// anything else is a decline.
    pub fn is_affirmative(&self, input: &str) -> bool {
        self.affirmations.contains(&input.trim().to_lowercase())
    }

    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }
}

impl Default for QualificationContext {
    fn default() -> Self {
        Self::new(default_questions(), ["yes", "okay", "sure"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affirmation_is_case_insensitive() {
        let ctx = QualificationContext::default();
        assert!(ctx.is_affirmative("Yes"));
        assert!(ctx.is_affirmative("OKAY"));
        assert!(ctx.is_affirmative(" sure "));
        assert!(!ctx.is_affirmative("No"));
        assert!(!ctx.is_affirmative("yes please"));
        assert!(!ctx.is_affirmative(""));
    }

    #[test]
    fn test_phase_derivation() {
        let mut state = LeadState::new("lead-1", "Ada", Instant::now());
        assert_eq!(state.phase(), Phase::AwaitingConsent);

        state.consented = true;
        assert_eq!(state.phase(), Phase::Asking { index: 0 });

        state.status = LeadStatus::Secured;
        assert_eq!(state.phase(), Phase::Complete);
        assert!(state.is_terminal());

        state.status = LeadStatus::NoResponse;
        assert_eq!(state.phase(), Phase::Declined);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&LeadStatus::NoResponse).unwrap(),
            "\"no_response\""
        );
        assert_eq!(LeadStatus::Secured.to_string(), "secured");
    }
}
