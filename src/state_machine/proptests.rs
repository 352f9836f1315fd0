//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across arbitrary event sequences.

use super::state::*;
use super::transition::*;
use super::*;
use crate::api::TransportError;
use crate::store::Role;
use proptest::prelude::*;

// ============================================================================
// Simulated log
// ============================================================================

/// Minimal stand-in for the store that applies effects the way the runtime does
#[derive(Debug, Default)]
struct Applied {
    log: Vec<(Role, String)>,
    loading: bool,
    streaming: bool,
}

impl Applied {
    fn apply(&mut self, effects: &[Effect]) {
        for effect in effects {
            match effect {
                Effect::AppendMessage { role, content } => self.log.push((*role, content.clone())),
                Effect::AmendLast { content } => {
                    if let Some(last) = self.log.last_mut() {
                        last.1.clone_from(content);
                    }
                }
                Effect::SetLoading(v) => self.loading = *v,
                Effect::SetStreaming(v) => self.streaming = *v,
                Effect::ClearLog => *self = Applied::default(),
                Effect::SetLastError(_) | Effect::OpenStream { .. } | Effect::DropStream { .. } => {}
            }
        }
    }
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

/// Stream events carry an epoch offset relative to the current one, so both
/// live and stale events are generated
#[derive(Debug, Clone)]
enum Step {
    Send(String),
    Cancel,
    Reset,
    Opened(u64),
    Delta(u64, String),
    Ended(u64),
    Failed(u64),
}

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => "[a-zA-Z ]{1,12}",
        1 => "[ \t\n]{0,3}",
    ]
}

fn arb_lag() -> impl Strategy<Value = u64> {
    prop_oneof![4 => Just(0u64), 1 => 1u64..3]
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        2 => arb_text().prop_map(Step::Send),
        1 => Just(Step::Cancel),
        1 => Just(Step::Reset),
        2 => arb_lag().prop_map(Step::Opened),
        4 => (arb_lag(), "[a-z ]{0,6}").prop_map(|(lag, text)| Step::Delta(lag, text)),
        1 => arb_lag().prop_map(Step::Ended),
        1 => arb_lag().prop_map(Step::Failed),
    ]
}

fn to_event(step: &Step, state: &ChatState) -> Event {
    let epoch = |lag: u64| state.epoch.saturating_sub(lag);
    match step {
        Step::Send(text) => Event::user_message(text.clone()),
        Step::Cancel => Event::UserCancel,
        Step::Reset => Event::Reset,
        Step::Opened(lag) => Event::StreamOpened { epoch: epoch(*lag) },
        Step::Delta(lag, content) => Event::Delta {
            epoch: epoch(*lag),
            content: content.clone(),
        },
        Step::Ended(lag) => Event::StreamEnded {
            epoch: epoch(*lag),
            reason: EndReason::Sentinel,
        },
        Step::Failed(lag) => Event::TransportFailed {
            epoch: epoch(*lag),
            error: TransportError::network("down"),
        },
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_stale_events_change_nothing(
        steps in proptest::collection::vec(arb_step(), 0..30),
    ) {
        let mut state = ChatState::new();
        for step in &steps {
            let event = to_event(step, &state);
            let stale = event.epoch().is_some_and(|e| e != state.epoch);
            match transition(&state, event) {
                Ok(result) => {
                    prop_assert!(!stale, "stale event accepted: {:?}", step);
                    state = result.new_state;
                }
                Err(TransitionError::StaleEpoch { .. }) => {}
                Err(e) => prop_assert!(!stale, "stale event gave {:?}", e),
            }
        }
    }

    #[test]
    fn prop_blank_text_rejected_in_every_state(
        steps in proptest::collection::vec(arb_step(), 0..20),
        blank in "[ \t\n]{0,4}",
    ) {
        let mut state = ChatState::new();
        for step in &steps {
            if let Ok(result) = transition(&state, to_event(step, &state)) {
                state = result.new_state;
            }
        }
        prop_assert_eq!(
            transition(&state, Event::user_message(blank)).unwrap_err(),
            TransitionError::EmptyMessage
        );
    }

    #[test]
    fn prop_epoch_never_decreases(
        steps in proptest::collection::vec(arb_step(), 0..30),
    ) {
        let mut state = ChatState::new();
        for step in &steps {
            if let Ok(result) = transition(&state, to_event(step, &state)) {
                prop_assert!(result.new_state.epoch >= state.epoch);
                state = result.new_state;
            }
        }
    }

    #[test]
    fn prop_flags_mirror_state(
        steps in proptest::collection::vec(arb_step(), 0..40),
    ) {
        let mut state = ChatState::new();
        let mut applied = Applied::default();
        for step in &steps {
            if let Ok(result) = transition(&state, to_event(step, &state)) {
                applied.apply(&result.effects);
                state = result.new_state;
            }
            prop_assert_eq!(applied.loading, state.is_loading());
            prop_assert_eq!(applied.streaming, state.is_streaming());
            // Streaming implies loading
            prop_assert!(!applied.streaming || applied.loading);
        }
    }

    #[test]
    fn prop_user_messages_are_never_rewritten(
        steps in proptest::collection::vec(arb_step(), 0..40),
    ) {
        let mut state = ChatState::new();
        let mut applied = Applied::default();
        let mut sent: Vec<String> = Vec::new();
        for step in &steps {
            if let Ok(result) = transition(&state, to_event(step, &state)) {
                if matches!(step, Step::Reset) {
                    sent.clear();
                }
                if let Step::Send(text) = step {
                    sent.push(text.trim().to_string());
                }
                applied.apply(&result.effects);
                state = result.new_state;
            }
        }
        let users: Vec<String> = applied
            .log
            .iter()
            .filter(|(role, _)| *role == Role::User)
            .map(|(_, content)| content.clone())
            .collect();
        prop_assert_eq!(users, sent);
    }
}
