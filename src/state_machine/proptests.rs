//! Property-based tests for the state machine
//!
//! These tests verify the lead invariants hold across arbitrary event
//! sequences.

use super::state::*;
use super::transition::*;
use super::*;
use crate::store::LeadRecord;
use proptest::prelude::*;
use std::time::Duration;
use tokio::time::Instant;

const IDLE_THRESHOLD: Duration = Duration::from_secs(5);

// ============================================================================
// Arbitrary Generators
// ============================================================================

#[derive(Debug, Clone)]
enum Step {
    Reply { text: String, delay_ms: u64 },
    FollowUp { delay_ms: u64 },
}

fn arb_reply_text() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("yes".to_string()),
        Just("OKAY".to_string()),
        Just(" Sure".to_string()),
        "[a-zA-Z0-9 ]{0,12}",
    ]
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => (arb_reply_text(), 0u64..2_000).prop_map(|(text, delay_ms)| Step::Reply { text, delay_ms }),
        1 => (0u64..12_000).prop_map(|delay_ms| Step::FollowUp { delay_ms }),
    ]
}

// ============================================================================
// Invariant checks
// ============================================================================

fn check_state_invariants(state: &LeadState, context: &QualificationContext) {
    assert!(state.current_question_index <= context.questions.len());
    if state.current_question_index > 0 {
        assert!(state.consented, "questions answered without consent");
    }
    assert_eq!(state.answers.len(), state.current_question_index);

    match state.status {
        LeadStatus::Secured => {
            for question in &context.questions {
                assert!(state.answers.contains_key(&question.field));
            }
        }
        LeadStatus::NoResponse => {
            assert!(!state.consented);
            assert!(state.answers.is_empty());
        }
        LeadStatus::Initiated => {}
    }
}

fn check_step(before: &LeadState, result: &TransitionResult) {
    let after = &result.new_state;

    assert_eq!(after.lead_id, before.lead_id);
    assert_eq!(after.name, before.name);
    assert!(after.current_question_index >= before.current_question_index);
    assert!(!before.consented || after.consented, "consent reverted");
    for (field, text) in &before.answers {
        assert_eq!(after.answers.get(field), Some(text), "answer overwritten");
    }

    if before.is_terminal() {
        assert_eq!(after, before, "terminal lead mutated");
        assert_eq!(result.records().count(), 0);
    }

    let records: Vec<_> = result.records().collect();
    assert!(records.len() <= 1, "more than one record per transition");
    if let Some(record) = records.first() {
        assert_eq!(**record, LeadRecord::from_state(after));
    }
}

proptest! {
    #[test]
    fn prop_invariants_hold_for_any_sequence(steps in proptest::collection::vec(arb_step(), 0..20)) {
        let context = QualificationContext::default();
        let mut now = Instant::now();
        let mut state = LeadState::new("lead-prop", "Prop", now);

        for step in steps {
            let event = match step {
                Step::Reply { text, delay_ms } => {
                    now += Duration::from_millis(delay_ms);
                    Event::reply(text, now)
                }
                Step::FollowUp { delay_ms } => {
                    now += Duration::from_millis(delay_ms);
                    Event::FollowUpDue { at: now, idle_threshold: IDLE_THRESHOLD }
                }
            };

            match transition(&state, &context, event) {
                Ok(result) => {
                    check_step(&state, &result);
                    check_state_invariants(&result.new_state, &context);
                    if !state.is_terminal() {
                        prop_assert_eq!(result.new_state.last_interaction_at, now);
                    }
                    state = result.new_state;
                }
                Err(TransitionError::NotEligible(_)) => {}
            }
        }
    }

    #[test]
    fn prop_non_affirmative_first_reply_declines(text in "[a-zA-Z0-9 ]{0,12}") {
        let context = QualificationContext::default();
        prop_assume!(!context.is_affirmative(&text));

        let state = LeadState::new("lead-prop", "Prop", Instant::now());
        let result = transition(&state, &context, Event::reply(text, Instant::now())).unwrap();

        prop_assert_eq!(result.new_state.status, LeadStatus::NoResponse);
        prop_assert_eq!(result.records().count(), 1);
    }

    #[test]
    fn prop_follow_up_never_fires_twice_without_idle(extra_ms in 0u64..4_999) {
        let context = QualificationContext::default();
        let start = Instant::now();
        let state = LeadState::new("lead-prop", "Prop", start);
        let consented = transition(&state, &context, Event::reply("yes", start)).unwrap().new_state;

        let due = start + IDLE_THRESHOLD;
        let fired = transition(
            &consented,
            &context,
            Event::FollowUpDue { at: due, idle_threshold: IDLE_THRESHOLD },
        ).unwrap();
        prop_assert!(fired.sends_follow_up());

        let again = transition(
            &fired.new_state,
            &context,
            Event::FollowUpDue { at: due + Duration::from_millis(extra_ms), idle_threshold: IDLE_THRESHOLD },
        );
        prop_assert!(again.is_err());
    }
}
