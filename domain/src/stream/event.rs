//! Protocol events decoded from the chat stream.

use serde::{Deserialize, Serialize};

/// Response kind announced by the `metadata` event for investigations.
pub const RESPONSE_KIND_INVESTIGATION: &str = "investigation";

/// One event of the chat stream, decoded from a `data: <json>` frame.
///
/// Missing payload fields fall back to their defaults; an unknown `type`
/// decodes to [`ChatEvent::Unknown`] so it can be ignored without failing
/// the stream.
///
/// ```
/// use kubechat_domain::stream::event::ChatEvent;
///
/// let event = ChatEvent::from_json(r#"{"type":"content","content":"Hel"}"#).unwrap();
/// assert_eq!(event, ChatEvent::Content { content: "Hel".to_string() });
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    Metadata {
        #[serde(default)]
        response_type: Option<String>,
    },
    Content {
        #[serde(default)]
        content: String,
    },
    CommandExecuting {
        #[serde(default)]
        command: String,
    },
    CommandCompleted {
        #[serde(default)]
        command: String,
        #[serde(default)]
        success: bool,
    },
    CommandBlocked {
        #[serde(default)]
        command: String,
        #[serde(default)]
        reason: String,
    },
    AnalysisStart,
    Error {
        #[serde(default)]
        error: String,
    },
    Done {
        #[serde(default)]
        commands_executed: Option<Vec<String>>,
    },
    #[serde(other)]
    Unknown,
}

impl ChatEvent {
    /// Decode an event from a frame payload.
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    /// Wire name of the event type, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatEvent::Metadata { .. } => "metadata",
            ChatEvent::Content { .. } => "content",
            ChatEvent::CommandExecuting { .. } => "command_executing",
            ChatEvent::CommandCompleted { .. } => "command_completed",
            ChatEvent::CommandBlocked { .. } => "command_blocked",
            ChatEvent::AnalysisStart => "analysis_start",
            ChatEvent::Error { .. } => "error",
            ChatEvent::Done { .. } => "done",
            ChatEvent::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_metadata() {
        let event = ChatEvent::from_json(r#"{"type":"metadata","response_type":"investigation"}"#)
            .unwrap();
        assert_eq!(
            event,
            ChatEvent::Metadata {
                response_type: Some("investigation".to_string())
            }
        );
    }

    #[test]
    fn decode_command_completed() {
        let event = ChatEvent::from_json(
            r#"{"type":"command_completed","command":"kubectl get pods","success":true}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            ChatEvent::CommandCompleted {
                command: "kubectl get pods".to_string(),
                success: true
            }
        );
    }

    #[test]
    fn decode_done_with_and_without_commands() {
        let event =
            ChatEvent::from_json(r#"{"type":"done","commands_executed":["kubectl top nodes"]}"#)
                .unwrap();
        assert_eq!(
            event,
            ChatEvent::Done {
                commands_executed: Some(vec!["kubectl top nodes".to_string()])
            }
        );

        let event = ChatEvent::from_json(r#"{"type":"done"}"#).unwrap();
        assert_eq!(
            event,
            ChatEvent::Done {
                commands_executed: None
            }
        );
    }

    #[test]
    fn decode_analysis_start_ignores_extra_fields() {
        let event = ChatEvent::from_json(r#"{"type":"analysis_start","step":2}"#).unwrap();
        assert_eq!(event, ChatEvent::AnalysisStart);
    }

    #[test]
    fn decode_unknown_type() {
        let event = ChatEvent::from_json(r#"{"type":"heartbeat","ts":1}"#).unwrap();
        assert_eq!(event, ChatEvent::Unknown);
    }

    #[test]
    fn decode_rejects_missing_type_and_bad_json() {
        assert!(ChatEvent::from_json(r#"{"content":"x"}"#).is_err());
        assert!(ChatEvent::from_json("not json").is_err());
    }
}
