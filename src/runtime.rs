//! Runtime for executing a chat session
//!
//! [`ChatSession`] owns the state machine, the conversation store and the one
//! active reply stream. Callers drive it through a cloneable
//! [`SessionHandle`].

mod executor;
pub mod traits;


pub use executor::ChatSession;
pub use traits::*;

use crate::state_machine::TransitionError;
use crate::store::ConversationView;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};

/// Session settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Messages requested when hydrating
    pub history_limit: u32,
    /// Assistant message installed when there is no history
    pub greeting: Option<String>,
    /// Load history before accepting commands
    pub hydrate_on_start: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_limit: crate::config::DEFAULT_HISTORY_LIMIT,
            greeting: None,
            hydrate_on_start: false,
        }
    }
}

/// Why a command was not accepted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("Message is empty")]
    Empty,
    #[error("A reply is still pending")]
    Busy,
    #[error("Chat session has stopped")]
    SessionClosed,
}

impl SendError {
    pub(crate) fn from_transition(err: &TransitionError) -> Self {
        match err {
            TransitionError::EmptyMessage => SendError::Empty,
            TransitionError::Busy
            | TransitionError::StaleEpoch { .. }
            | TransitionError::InvalidTransition(_) => SendError::Busy,
        }
    }
}

/// Requests from handles to the session loop
#[derive(Debug)]
pub(crate) enum Command {
    Send {
        text: String,
        reply: oneshot::Sender<Result<(), SendError>>,
    },
    Cancel {
        reply: oneshot::Sender<()>,
    },
    Reset {
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable handle to a running [`ChatSession`]
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<ConversationView>,
}

impl SessionHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<Command>,
        view: watch::Receiver<ConversationView>,
    ) -> Self {
        Self { commands, view }
    }

    /// Send a user message.
    ///
    /// Resolves once the message and the assistant placeholder are in the
    /// log and the request has been issued; the reply streams in afterwards.
    pub async fn send(&self, text: impl Into<String>) -> Result<(), SendError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Send {
                text: text.into(),
                reply,
            })
            .await
            .map_err(|_| SendError::SessionClosed)?;
        rx.await.map_err(|_| SendError::SessionClosed)?
    }

    /// Abandon the active reply, keeping whatever content has arrived
    pub async fn cancel(&self) -> Result<(), SendError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Cancel { reply })
            .await
            .map_err(|_| SendError::SessionClosed)?;
        rx.await.map_err(|_| SendError::SessionClosed)
    }

    /// Abandon the active reply and clear the conversation
    pub async fn reset(&self) -> Result<(), SendError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Reset { reply })
            .await
            .map_err(|_| SendError::SessionClosed)?;
        rx.await.map_err(|_| SendError::SessionClosed)
    }

    pub fn subscribe(&self) -> watch::Receiver<ConversationView> {
        self.view.clone()
    }

    pub fn snapshot(&self) -> ConversationView {
        self.view.borrow().clone()
    }
}
