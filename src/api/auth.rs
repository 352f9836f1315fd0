//! Request header providers
//!
//! Session storage lives outside this crate; the client only asks for the
//! headers of the current session on every request.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

/// Produces authentication headers for the current session
pub trait AuthHeaders: Send + Sync {
    fn headers(&self) -> HeaderMap;
}

impl<F> AuthHeaders for F
where
    F: Fn() -> HeaderMap + Send + Sync,
{
    fn headers(&self) -> HeaderMap {
        self()
    }
}

/// `Authorization: Bearer <token>` when a token is present, nothing otherwise
#[derive(Debug, Clone, Default)]
pub struct BearerToken {
    token: Option<String>,
}

impl BearerToken {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    pub fn anonymous() -> Self {
        Self { token: None }
    }
}

impl AuthHeaders for BearerToken {
    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.token {
            match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(AUTHORIZATION, value);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Session token is not a valid header value");
                }
            }
        }
        headers
    }
}
