//! Effects produced by state transitions

use crate::store::Role;

/// Effects to be executed after a state transition, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append a message to the log; the runtime assigns id and timestamp
    AppendMessage { role: Role, content: String },

    /// Replace the content of the last message
    AmendLast { content: String },

    SetLoading(bool),

    SetStreaming(bool),

    /// Record or clear the user-visible error of the last turn
    SetLastError(Option<String>),

    /// Issue the request for a turn and start consuming its stream
    OpenStream { epoch: u64, text: String },

    /// Stop consuming the stream of a turn, if it is still active
    DropStream { epoch: u64 },

    /// Empty the conversation log
    ClearLog,
}

impl Effect {
    pub fn append_user(content: impl Into<String>) -> Self {
        Effect::AppendMessage {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn append_assistant(content: impl Into<String>) -> Self {
        Effect::AppendMessage {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn amend_last(content: impl Into<String>) -> Self {
        Effect::AmendLast {
            content: content.into(),
        }
    }
}
