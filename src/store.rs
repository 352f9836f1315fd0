//! Conversation store
//!
//! Owns the ordered message log and the stream flags. Every mutation is a
//! single update of a `watch` channel, so a subscribed renderer observes either
//! the state before a mutation or the state after it, never a partial write.

mod message;

pub use message::{Message, MessageId, Role};

use tokio::sync::watch;

/// Request/stream flags. `is_streaming` implies `is_loading`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamState {
    /// Request in flight, no content guaranteed yet
    pub is_loading: bool,
    /// Deltas are arriving for the last assistant message
    pub is_streaming: bool,
}

impl StreamState {
    pub fn is_idle(self) -> bool {
        !self.is_loading && !self.is_streaming
    }
}

/// Everything a renderer needs to draw the conversation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationView {
    pub messages: Vec<Message>,
    pub stream: StreamState,
    /// Annotation left by the most recent failed turn
    pub last_error: Option<String>,
}

impl ConversationView {
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// State container for one chat session
///
/// Constructed explicitly and handed to the session runtime, which is its only
/// writer. Readers subscribe for change notifications.
pub struct ConversationStore {
    state: watch::Sender<ConversationView>,
}

impl ConversationStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(ConversationView::default());
        Self { state }
    }

    /// Subscribe to every change of the conversation view
    pub fn subscribe(&self) -> watch::Receiver<ConversationView> {
        self.state.subscribe()
    }

    /// Copy of the current view
    pub fn snapshot(&self) -> ConversationView {
        self.state.borrow().clone()
    }

    /// Identifier for the next message to append
    pub fn next_message_id(&self) -> MessageId {
        self.state
            .borrow()
            .messages
            .iter()
            .map(|m| m.id)
            .max()
            .map_or(MessageId(1), MessageId::next)
    }

    /// Append a message at the end of the log
    pub fn append(&self, message: Message) {
        self.state.send_modify(|view| view.messages.push(message));
    }

    /// Replace the content of the last message.
    ///
    /// Returns `false` (and changes nothing) when the log is empty.
    pub fn amend_last(&self, content: impl Into<String>) -> bool {
        let content = content.into();
        self.state.send_if_modified(|view| match view.messages.last_mut() {
            Some(last) => {
                last.content = content;
                true
            }
            None => false,
        })
    }

    pub fn set_loading(&self, loading: bool) {
        self.state.send_if_modified(|view| {
            let changed = view.stream.is_loading != loading;
            view.stream.is_loading = loading;
            changed
        });
    }

    pub fn set_streaming(&self, streaming: bool) {
        self.state.send_if_modified(|view| {
            let changed = view.stream.is_streaming != streaming;
            view.stream.is_streaming = streaming;
            changed
        });
    }

    pub fn set_last_error(&self, error: Option<String>) {
        self.state.send_if_modified(|view| {
            let changed = view.last_error != error;
            view.last_error = error;
            changed
        });
    }

    /// Empty the log and clear both flags
    pub fn reset(&self) {
        self.state.send_modify(|view| *view = ConversationView::default());
    }

    /// Replace the whole log with `history`, preserving its order
    pub fn hydrate(&self, history: Vec<Message>) {
        self.state.send_modify(|view| view.messages = history);
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}
