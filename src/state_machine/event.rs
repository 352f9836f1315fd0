//! Events that drive the chat state machine

use crate::api::TransportError;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    UserMessage {
        text: String,
    },
    UserCancel,
    Reset,

    // Stream events, tagged with the epoch of the turn that opened them
    StreamOpened {
        epoch: u64,
    },
    Delta {
        epoch: u64,
        content: String,
    },
    StreamEnded {
        epoch: u64,
        reason: EndReason,
    },
    TransportFailed {
        epoch: u64,
        error: TransportError,
    },
}

impl Event {
    /// Epoch carried by stream events; `None` for user events
    pub fn epoch(&self) -> Option<u64> {
        match self {
            Event::StreamOpened { epoch }
            | Event::Delta { epoch, .. }
            | Event::StreamEnded { epoch, .. }
            | Event::TransportFailed { epoch, .. } => Some(*epoch),
            Event::UserMessage { .. } | Event::UserCancel | Event::Reset => None,
        }
    }

    pub fn user_message(text: impl Into<String>) -> Self {
        Event::UserMessage { text: text.into() }
    }
}

/// Why a stream finished normally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The `[DONE]` sentinel arrived
    Sentinel,
    /// The body ended without a sentinel
    Exhausted,
}
