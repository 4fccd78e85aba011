//! Chat stream port
//!
//! Defines how the application opens one streaming exchange against the
//! backend. Adapters own the wire format (HTTP + SSE framing) and hand back
//! already-decoded [`ChatEvent`]s in arrival order.

use async_trait::async_trait;
use futures::stream::BoxStream;
use kubechat_domain::{ChatEvent, SessionId};
use serde::Serialize;
use thiserror::Error;

/// Transport-level failures of a streaming exchange.
///
/// All of these are terminal for the exchange; none is retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("HTTP error! status: {0}")]
    Status(u16),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to read response body: {0}")]
    Body(String),
}

/// Body of a chat stream request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: SessionId,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, session_id: SessionId) -> Self {
        Self {
            message: message.into(),
            session_id,
        }
    }
}

/// Decoded events of one exchange. An `Err` item ends the exchange.
pub type EventStream = BoxStream<'static, Result<ChatEvent, StreamError>>;

/// Opens streaming exchanges against the chat backend.
#[async_trait]
pub trait ChatStreamPort: Send + Sync {
    /// Issue the request and return the event stream once the response
    /// headers arrived with a success status.
    ///
    /// Dropping the returned stream releases the underlying connection.
    async fn open_stream(&self, request: &ChatRequest) -> Result<EventStream, StreamError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_wire_fields() {
        let request = ChatRequest::new("list pods", SessionId::from("42"));
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"message": "list pods", "session_id": "42"})
        );
    }

    #[test]
    fn status_error_display() {
        assert_eq!(StreamError::Status(500).to_string(), "HTTP error! status: 500");
    }
}
