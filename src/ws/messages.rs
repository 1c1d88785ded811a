//! WebSocket message types: envelope, commands, and events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level WebSocket message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsMessage {
    /// Client-provided ID for requests; server-generated for events.
    #[serde(default)]
    pub id: String,
    /// Message type discriminator.
    #[serde(rename = "type")]
    pub msg_type: WsMessageType,
    /// ISO-8601 timestamp. Optional on client commands.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Variant-specific payload.
    pub payload: serde_json::Value,
}

impl WsMessage {
    /// Builds a server message stamped now.
    #[must_use]
    pub fn new(id: impl Into<String>, msg_type: WsMessageType, payload: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            msg_type,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Builds an error reply.
    #[must_use]
    pub fn error(id: impl Into<String>, code: u16, message: &str) -> Self {
        Self::new(
            id,
            WsMessageType::Error,
            serde_json::json!({ "code": code, "message": message }),
        )
    }

    /// Serializes to JSON text; `None` only if serialization fails.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        serde_json::to_string(self).ok()
    }
}

/// Discriminator for WebSocket message types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WsMessageType {
    /// Client → Server command.
    Command,
    /// Server → Client response to a command.
    Response,
    /// Server → Client broadcast event.
    Event,
    /// Server → Client error.
    Error,
}

/// Commands that a client can send over WebSocket, carried in the
/// envelope payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum WsCommand {
    /// Subscribe to lifecycle events for specific addresses.
    Subscribe {
        /// Account addresses. Use `["*"]` for every watch.
        addresses: Vec<String>,
    },
    /// Unsubscribe from specific addresses.
    Unsubscribe {
        /// Account addresses.
        addresses: Vec<String>,
    },
    /// Snapshot of all live watches.
    ListWatches,
    /// Cancel one watch.
    Cancel {
        /// Account address.
        address: String,
    },
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn client_envelope_may_omit_timestamp() {
        let raw = r#"{"id":"7","type":"command","payload":{"command":"subscribe","addresses":["*"]}}"#;
        let Ok(msg) = serde_json::from_str::<WsMessage>(raw) else {
            panic!("envelope rejected");
        };
        assert_eq!(msg.msg_type, WsMessageType::Command);
        let Ok(cmd) = serde_json::from_value::<WsCommand>(msg.payload) else {
            panic!("command rejected");
        };
        assert_eq!(
            cmd,
            WsCommand::Subscribe {
                addresses: vec!["*".to_string()]
            }
        );
    }

    #[test]
    fn unit_command_parses() {
        let Ok(cmd) = serde_json::from_str::<WsCommand>(r#"{"command":"list_watches"}"#) else {
            panic!("command rejected");
        };
        assert_eq!(cmd, WsCommand::ListWatches);
    }

    #[test]
    fn error_reply_shape() {
        let Some(text) = WsMessage::error("1", 400, "malformed JSON").to_text() else {
            panic!("serialization failed");
        };
        assert!(text.contains(r#""type":"error""#));
        assert!(text.contains("malformed JSON"));
    }
}
