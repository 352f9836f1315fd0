//! Transport error types

use thiserror::Error;

/// Failure talking to the chat backend, with classification
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
    /// HTTP status, when the server answered
    pub status: Option<u16>,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Network, message)
    }

    pub fn aborted(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Aborted, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Decode, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Unknown, message)
    }

    /// Classify a non-success HTTP status
    pub fn from_status(status: u16, detail: &str) -> Self {
        let kind = match status {
            401 | 403 => TransportErrorKind::Auth,
            400 | 404 | 422 => TransportErrorKind::InvalidRequest,
            429 => TransportErrorKind::RateLimit,
            500..=599 => TransportErrorKind::ServerError,
            _ => TransportErrorKind::Unknown,
        };
        Self::new(kind, format!("HTTP {status}: {detail}")).with_status(status)
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection failures and timeouts
    Network,
    /// Body read failed after the response started
    Aborted,
    /// 401, 403
    Auth,
    /// 400, 404, 422
    InvalidRequest,
    /// 429
    RateLimit,
    /// 5xx
    ServerError,
    /// Response body could not be decoded
    Decode,
    Unknown,
}

impl TransportErrorKind {
    /// Whether resending the same message may succeed.
    ///
    /// Nothing is retried automatically; this only informs the user-facing hint.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Network | Self::Aborted | Self::RateLimit | Self::ServerError
        )
    }
}
