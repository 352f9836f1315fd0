//! HTTP transport for the chat backend

use super::auth::AuthHeaders;
use super::error::TransportError;
use super::types::{error_detail, HistoryResponse, StreamRequest};
use crate::config::ClientConfig;
use crate::runtime::{ByteStream, ChatTransport};
use crate::store::Message;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder, Response};
use std::sync::Arc;

/// reqwest-backed [`ChatTransport`]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    auth: Arc<dyn AuthHeaders>,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig, auth: Arc<dyn AuthHeaders>) -> Result<Self, TransportError> {
        let mut builder = Client::builder().connect_timeout(config.connect_timeout);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, TransportError> {
        let response = request
            .headers(self.auth.headers())
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = error_detail(&body).unwrap_or_else(|| status.to_string());
        tracing::warn!(status = status.as_u16(), detail = %detail, "Backend returned an error");
        Err(TransportError::from_status(status.as_u16(), &detail))
    }
}

fn request_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::network(format!("Request timeout: {e}"))
    } else if e.is_connect() {
        TransportError::network(format!("Connection failed: {e}"))
    } else if e.is_request() {
        TransportError::network(format!("Request failed: {e}"))
    } else {
        TransportError::unknown(format!("Request failed: {e}"))
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn open_stream(&self, text: &str) -> Result<ByteStream, TransportError> {
        let request = self
            .client
            .post(self.url("/chat/stream"))
            .json(&StreamRequest { content: text });
        let response = self.send(request).await?;

        let body = response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| {
                if e.is_timeout() {
                    TransportError::network(format!("Stream timed out: {e}"))
                } else {
                    TransportError::aborted(format!("Stream read failed: {e}"))
                }
            })
        });
        Ok(body.boxed())
    }

    async fn fetch_history(&self, limit: u32) -> Result<Vec<Message>, TransportError> {
        let request = self
            .client
            .get(self.url("/chat/history"))
            .query(&[("limit", limit)]);
        let response = self.send(request).await?;

        let history: HistoryResponse = response
            .json()
            .await
            .map_err(|e| TransportError::decode(format!("Failed to parse history: {e}")))?;
        tracing::debug!(
            returned = history.messages.len(),
            total = ?history.total_count,
            "Fetched chat history"
        );
        Ok(history.into_messages())
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
