//! State transition function

use super::effect::Effect;
use super::event::{EndReason, Event};
use super::state::{ChatState, Phase};
use thiserror::Error;

/// Text that replaces the assistant placeholder when a turn fails
pub const FAILURE_NOTICE: &str = "죄송합니다. 메시지 전송에 실패했습니다. 다시 시도해 주세요.";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ChatState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ChatState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    #[must_use]
    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Message is empty")]
    EmptyMessage,
    #[error("A request is already in flight (cancel it first)")]
    Busy,
    #[error("Event from turn {event} arrived during turn {current}")]
    StaleEpoch { event: u64, current: u64 },
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
///
/// Given the same state and event it always produces the same result, with no
/// I/O. On `Err` the state is unchanged and no effects may be executed.
pub fn transition(state: &ChatState, event: Event) -> Result<TransitionResult, TransitionError> {
    if let Some(epoch) = event.epoch() {
        if epoch != state.epoch || state.is_idle() {
            return Err(TransitionError::StaleEpoch {
                event: epoch,
                current: state.epoch,
            });
        }
    }

    match (&state.phase, event) {
        // ============================================================
        // Sending
        // ============================================================
        (_, Event::UserMessage { text }) if text.trim().is_empty() => {
            Err(TransitionError::EmptyMessage)
        }

        (Phase::Sending, Event::UserMessage { .. }) => Err(TransitionError::Busy),

        (Phase::Idle, Event::UserMessage { text }) => Ok(begin_turn(state, &text, vec![])),

        // A new send while streaming supersedes the current turn
        (Phase::Streaming { .. }, Event::UserMessage { text }) => Ok(begin_turn(
            state,
            &text,
            vec![
                Effect::DropStream { epoch: state.epoch },
                Effect::SetStreaming(false),
            ],
        )),

        // ============================================================
        // Streaming
        // ============================================================
        (Phase::Sending, Event::StreamOpened { .. }) => Ok(TransitionResult::new(
            state.with_phase(Phase::Streaming {
                accumulated: String::new(),
            }),
        )
        .with_effect(Effect::SetStreaming(true))),

        // Content without an explicit open still means the stream is live
        (Phase::Sending, Event::Delta { content, .. }) => Ok(TransitionResult::new(
            state.with_phase(Phase::Streaming {
                accumulated: content.clone(),
            }),
        )
        .with_effect(Effect::SetStreaming(true))
        .with_effect(Effect::amend_last(content))),

        (Phase::Streaming { accumulated }, Event::Delta { content, .. }) => {
            let accumulated = format!("{accumulated}{content}");
            Ok(TransitionResult::new(state.with_phase(Phase::Streaming {
                accumulated: accumulated.clone(),
            }))
            .with_effect(Effect::amend_last(accumulated)))
        }

        (Phase::Streaming { .. }, Event::StreamOpened { .. }) => Err(
            TransitionError::InvalidTransition("stream opened twice".to_string()),
        ),

        // ============================================================
        // Completion
        // ============================================================
        (Phase::Sending | Phase::Streaming { .. }, Event::StreamEnded { reason, .. }) => {
            if reason == EndReason::Exhausted {
                tracing::debug!(epoch = state.epoch, "Stream ended without sentinel");
            }
            Ok(finish_turn(state, vec![]))
        }

        (Phase::Sending | Phase::Streaming { .. }, Event::TransportFailed { error, .. }) => {
            Ok(finish_turn(
                state,
                vec![
                    Effect::amend_last(FAILURE_NOTICE),
                    Effect::SetLastError(Some(error.message)),
                ],
            ))
        }

        // ============================================================
        // Cancellation and reset
        // ============================================================
        (Phase::Idle, Event::UserCancel) => Ok(TransitionResult::new(state.clone())),

        // Partial content already in the log stays as it is
        (Phase::Sending | Phase::Streaming { .. }, Event::UserCancel) => {
            Ok(TransitionResult::new(state.advanced(Phase::Idle))
                .with_effect(Effect::DropStream { epoch: state.epoch })
                .with_effect(Effect::SetStreaming(false))
                .with_effect(Effect::SetLoading(false)))
        }

        (_, Event::Reset) => Ok(TransitionResult::new(state.advanced(Phase::Idle))
            .with_effect(Effect::DropStream { epoch: state.epoch })
            .with_effect(Effect::ClearLog)),

        // Stale and idle stream events were rejected above
        (Phase::Idle, event) => Err(TransitionError::InvalidTransition(format!(
            "{event:?} while idle"
        ))),
    }
}

fn begin_turn(state: &ChatState, text: &str, mut effects: Vec<Effect>) -> TransitionResult {
    let next = state.advanced(Phase::Sending);
    effects.extend([
        Effect::SetLastError(None),
        Effect::append_user(text.trim()),
        Effect::append_assistant(""),
        Effect::SetLoading(true),
        Effect::OpenStream {
            epoch: next.epoch,
            text: text.trim().to_string(),
        },
    ]);
    TransitionResult::new(next).with_effects(effects)
}

fn finish_turn(state: &ChatState, mut effects: Vec<Effect>) -> TransitionResult {
    effects.extend([
        Effect::SetStreaming(false),
        Effect::SetLoading(false),
        Effect::DropStream { epoch: state.epoch },
    ]);
    TransitionResult::new(state.with_phase(Phase::Idle)).with_effects(effects)
}
