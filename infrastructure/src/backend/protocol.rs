//! Wire types of the backend's session API.
//!
//! Every response is wrapped in an envelope with a `success` flag. Ids are
//! numbers on some deployments and strings on others; both are accepted and
//! normalised to strings. Timestamps may be RFC 3339 or naive ISO 8601
//! (read as UTC).

use super::error::{BackendError, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use kubechat_application::{CreatedSession, HistoryEntry, SessionSummary};
use kubechat_domain::{DEFAULT_SESSION_TITLE, Role, SessionId};
use serde::{Deserialize, Deserializer, Serialize};

/// Request body for create and rename.
#[derive(Debug, Clone, Serialize)]
pub struct TitleRequest<'a> {
    pub title: &'a str,
}

/// Common envelope fields.
pub trait Envelope {
    fn success(&self) -> Option<bool>;
    fn error(&self) -> Option<&str>;

    /// Accept the response only if the backend reported `success: true`.
    fn check(self) -> Result<Self>
    where
        Self: Sized,
    {
        match self.success() {
            Some(true) => Ok(self),
            Some(false) => {
                let reason = self.error().unwrap_or("unknown error").to_string();
                Err(BackendError::Rejected(reason))
            }
            None => Err(BackendError::Rejected("missing success flag".to_string())),
        }
    }
}

macro_rules! envelope {
    ($ty:ty) => {
        impl Envelope for $ty {
            fn success(&self) -> Option<bool> {
                self.success
            }

            fn error(&self) -> Option<&str> {
                self.error.as_deref()
            }
        }
    };
}

/// `GET /users/{user_id}/sessions`
#[derive(Debug, Deserialize)]
pub struct SessionListResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default, alias = "message")]
    pub error: Option<String>,
    #[serde(default)]
    pub sessions: Vec<WireSession>,
}
envelope!(SessionListResponse);

/// `GET /users/{user_id}/sessions/{session_id}/history`
#[derive(Debug, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default, alias = "message")]
    pub error: Option<String>,
    #[serde(default)]
    pub history: Vec<WireHistoryEntry>,
}
envelope!(HistoryResponse);

/// `POST /users/{user_id}/sessions`
#[derive(Debug, Deserialize)]
pub struct CreateSessionResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default, alias = "message")]
    pub error: Option<String>,
    pub data: Option<WireCreatedSession>,
}
envelope!(CreateSessionResponse);

/// `PUT` / `DELETE` on `/users/{user_id}/sessions/{session_id}`
#[derive(Debug, Default, Deserialize)]
pub struct AckResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default, alias = "message")]
    pub error: Option<String>,
}
envelope!(AckResponse);

#[derive(Debug, Deserialize)]
pub struct WireSession {
    #[serde(deserialize_with = "flexible_id")]
    pub session_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub last_activity: Option<String>,
    #[serde(default)]
    pub message_count: u32,
}

impl WireSession {
    pub fn into_summary(self) -> SessionSummary {
        let created_at = parse_timestamp(self.created_at.as_deref());
        let last_activity = self
            .last_activity
            .as_deref()
            .map(|s| parse_timestamp(Some(s)))
            .unwrap_or(created_at);
        SessionSummary {
            session_id: SessionId::new(self.session_id),
            title: self
                .title
                .unwrap_or_else(|| DEFAULT_SESSION_TITLE.to_string()),
            created_at,
            last_activity,
            message_count: self.message_count,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WireHistoryEntry {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    pub role: String,
    #[serde(alias = "content")]
    pub message: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl WireHistoryEntry {
    pub fn into_entry(self) -> HistoryEntry {
        let role = if self.role.eq_ignore_ascii_case("user") {
            Role::User
        } else {
            Role::Assistant
        };
        HistoryEntry {
            id: self.id,
            role,
            message: self.message,
            timestamp: parse_timestamp(self.timestamp.as_deref()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WireCreatedSession {
    #[serde(deserialize_with = "flexible_id")]
    pub session_id: String,
    #[serde(default)]
    pub title: Option<String>,
}

impl WireCreatedSession {
    pub fn into_created(self) -> CreatedSession {
        CreatedSession {
            session_id: SessionId::new(self.session_id),
            title: self
                .title
                .unwrap_or_else(|| DEFAULT_SESSION_TITLE.to_string()),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Number(i64),
    Text(String),
}

fn flexible_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match WireId::deserialize(deserializer)? {
        WireId::Number(n) => n.to_string(),
        WireId::Text(s) => s,
    })
}

/// Parse a wire timestamp; missing or unparsable values read as now.
pub fn parse_timestamp(value: Option<&str>) -> DateTime<Utc> {
    let Some(value) = value else {
        return Utc::now();
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return ts.with_timezone(&Utc);
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return naive.and_utc();
        }
    }
    tracing::debug!("Unparsable timestamp '{}', using now", value);
    Utc::now()
}
