//! Wire types for the chat endpoints

use crate::store::{Message, MessageId, Role};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /chat/stream`
#[derive(Debug, Serialize)]
pub struct StreamRequest<'a> {
    pub content: &'a str,
}

/// Body of `GET /chat/history`
#[derive(Debug, Deserialize)]
pub struct HistoryResponse {
    pub messages: Vec<HistoryMessage>,
    #[serde(default)]
    pub total_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryMessage {
    pub id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub role: WireRole,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireRole {
    User,
    Assistant,
    #[serde(other)]
    Other,
}

/// Error body of non-success responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl HistoryResponse {
    /// Convert to log messages in server order (oldest first).
    ///
    /// Entries with a role this client does not display are skipped.
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
            .into_iter()
            .filter_map(HistoryMessage::into_message)
            .collect()
    }
}

impl HistoryMessage {
    fn into_message(self) -> Option<Message> {
        let role = match self.role {
            WireRole::User => Role::User,
            WireRole::Assistant => Role::Assistant,
            WireRole::Other => {
                tracing::warn!(id = self.id, "Skipping history entry with unknown role");
                return None;
            }
        };
        let timestamp = parse_timestamp(&self.created_at).unwrap_or_else(|| {
            tracing::warn!(id = self.id, created_at = %self.created_at, "Unparseable timestamp");
            DateTime::<Utc>::default()
        });
        Some(Message::new(MessageId(self.id), role, self.content).with_timestamp(timestamp))
    }
}

/// RFC 3339, or a naive ISO-8601 timestamp taken as UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Human-readable reason from an error body, when it has one
pub fn error_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}
