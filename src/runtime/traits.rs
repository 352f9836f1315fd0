//! Trait abstractions for runtime I/O
//!
//! The session talks to the backend only through [`ChatTransport`], so the
//! executor can be driven by mock transports in tests.

use crate::api::TransportError;
use crate::store::Message;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::sync::Arc;

/// Raw body of a streaming reply, as it arrives
pub type ByteStream = BoxStream<'static, Result<Bytes, TransportError>>;

/// Client for the chat backend
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send a user message and return the reply body once the response has
    /// started successfully. Non-success statuses are errors here.
    async fn open_stream(&self, text: &str) -> Result<ByteStream, TransportError>;

    /// Fetch up to `limit` past messages, oldest first
    async fn fetch_history(&self, limit: u32) -> Result<Vec<Message>, TransportError>;
}

// ============================================================================
// Arc implementation for shared transports
// ============================================================================

#[async_trait]
impl<T: ChatTransport + ?Sized> ChatTransport for Arc<T> {
    async fn open_stream(&self, text: &str) -> Result<ByteStream, TransportError> {
        (**self).open_stream(text).await
    }

    async fn fetch_history(&self, limit: u32) -> Result<Vec<Message>, TransportError> {
        (**self).fetch_history(limit).await
    }
}
