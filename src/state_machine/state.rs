//! Chat state types

/// Where the current turn is
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    /// No request outstanding
    #[default]
    Idle,
    /// Request issued, waiting for the stream to open
    Sending,
    /// Stream open, deltas arriving
    Streaming {
        /// Concatenation of every delta received this turn
        accumulated: String,
    },
}

/// State of the chat session.
///
/// `epoch` identifies the current turn. Every send, cancel and reset moves
/// it forward, so events tagged with an older epoch belong to an abandoned
/// stream.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatState {
    pub epoch: u64,
    pub phase: Phase,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A request is outstanding (`isLoading`)
    pub fn is_loading(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }

    /// Deltas are arriving (`isStreaming`)
    pub fn is_streaming(&self) -> bool {
        matches!(self.phase, Phase::Streaming { .. })
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Idle)
    }

    /// Text streamed so far in the current turn
    pub fn accumulated(&self) -> Option<&str> {
        match &self.phase {
            Phase::Streaming { accumulated } => Some(accumulated),
            Phase::Idle | Phase::Sending => None,
        }
    }

    pub(crate) fn advanced(&self, phase: Phase) -> Self {
        Self {
            epoch: self.epoch + 1,
            phase,
        }
    }

    pub(crate) fn with_phase(&self, phase: Phase) -> Self {
        Self {
            epoch: self.epoch,
            phase,
        }
    }
}
