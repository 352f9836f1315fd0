//! HTTP collaborators of the chat core
//!
//! Implements the two chat endpoints the client depends on:
//! - `POST /chat/stream`: sends a message and receives the reply as framed deltas
//! - `GET /chat/history`: returns past messages of the signed-in user

mod auth;
mod client;
mod error;
pub mod types;

pub use auth::{AuthHeaders, BearerToken};
pub use client::HttpTransport;
pub use error::{TransportError, TransportErrorKind};
