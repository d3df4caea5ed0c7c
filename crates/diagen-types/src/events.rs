use serde::{Deserialize, Serialize};

/// Events pushed to the caller for one generation request.
///
/// Ordering: `Connected` first, zero or more `Content`, then exactly one of
/// `Done` or `Error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayEvent {
    /// Channel acknowledged
    Connected {},

    /// Newly visible display text
    Content {
        delta: String,
        #[serde(rename = "fullSoFar")]
        full_so_far: String,
    },

    /// Generation finished
    Done {
        #[serde(rename = "sessionId")]
        session_id: String,
        #[serde(rename = "messageId")]
        message_id: String,
        #[serde(rename = "documentId")]
        document_id: Option<String>,
    },

    /// Generation failed
    Error {
        message: String,
    },
}

impl RelayEvent {
    pub fn connected() -> Self {
        Self::Connected {}
    }

    pub fn content(delta: impl Into<String>, full_so_far: impl Into<String>) -> Self {
        Self::Content {
            delta: delta.into(),
            full_so_far: full_so_far.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// SSE event name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::Content { .. } => "content",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }

    /// Event payload without the type tag
    pub fn payload(&self) -> serde_json::Value {
        match self {
            Self::Connected {} => serde_json::json!({}),
            Self::Content { delta, full_so_far } => serde_json::json!({
                "delta": delta,
                "fullSoFar": full_so_far,
            }),
            Self::Done { session_id, message_id, document_id } => serde_json::json!({
                "sessionId": session_id,
                "messageId": message_id,
                "documentId": document_id,
            }),
            Self::Error { message } => serde_json::json!({
                "message": message,
            }),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_done_serializes_camel_case() {
        let event = RelayEvent::Done {
            session_id: "s1".to_string(),
            message_id: "m1".to_string(),
            document_id: None,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "done");
        assert_eq!(json["sessionId"], "s1");
        assert_eq!(json["messageId"], "m1");
        assert!(json["documentId"].is_null());
    }

    #[test]
    fn test_payload_drops_type_tag() {
        let payload = RelayEvent::content("a", "ab").payload();

        assert_eq!(payload, serde_json::json!({ "delta": "a", "fullSoFar": "ab" }));
        assert_eq!(RelayEvent::connected().payload(), serde_json::json!({}));
    }

    #[test]
    fn test_terminal_events() {
        assert!(!RelayEvent::connected().is_terminal());
        assert!(!RelayEvent::content("x", "x").is_terminal());
        assert!(RelayEvent::error("boom").is_terminal());
    }

    #[test]
    fn test_round_trip_content() {
        let json = r#"{"type":"content","delta":"Hi","fullSoFar":"Hi"}"#;
        let event: RelayEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event, RelayEvent::content("Hi", "Hi"));
        assert_eq!(event.name(), "content");
    }
}
