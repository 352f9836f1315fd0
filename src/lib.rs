//! ETF chat client core
//!
//! Streams assistant replies from the ETF investment chat backend into an
//! ordered conversation log. The pieces, leaves first:
//!
//! - [`store`]: the conversation log and stream flags, observable by renderers
//! - [`sse`]: decodes the framed `data: ` byte stream into content deltas
//! - [`state_machine`]: pure send/stream/cancel transitions
//! - [`runtime`]: the session event loop that applies transitions to the store
//! - [`api`]: the HTTP transport for the stream and history endpoints
//! - [`terminal`]: a read-only line renderer for the binary

pub mod api;
pub mod config;
pub mod runtime;
pub mod sse;
pub mod state_machine;
pub mod store;
pub mod terminal;

pub use api::{AuthHeaders, BearerToken, HttpTransport, TransportError, TransportErrorKind};
pub use config::{ClientConfig, ConfigError};
pub use runtime::{ChatSession, ChatTransport, SendError, SessionConfig, SessionHandle};
pub use sse::{DeltaFrame, StreamDecoder};
pub use store::{ConversationStore, ConversationView, Message, MessageId, Role, StreamState};
