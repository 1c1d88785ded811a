//! Subset of the Telegram Bot API object model.

use serde::{Deserialize, Serialize};

use crate::trigger::InboundMessage;

/// Envelope of every Bot API reply.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the call succeeded.
    pub ok: bool,
    /// Payload on success.
    pub result: Option<T>,
    /// Error text on failure.
    pub description: Option<String>,
}

/// One incoming update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Update {
    /// Monotonic update identifier.
    pub update_id: i64,
    /// New message in a private chat or group.
    #[serde(default)]
    pub message: Option<Message>,
    /// New post in a channel.
    #[serde(default)]
    pub channel_post: Option<Message>,
}

impl Update {
    /// The message carried by this update, whichever kind it is.
    #[must_use]
    pub fn message(&self) -> Option<&Message> {
        self.message.as_ref().or(self.channel_post.as_ref())
    }
}

/// Chat a message belongs to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Chat {
    /// Chat identifier.
    pub id: i64,
}

/// A chat message or channel post.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Message {
    /// Originating chat.
    pub chat: Chat,
    /// Message text.
    #[serde(default)]
    pub text: Option<String>,
    /// Caption of a media message.
    #[serde(default)]
    pub caption: Option<String>,
    /// Entities in `text`.
    #[serde(default)]
    pub entities: Vec<MessageEntity>,
    /// Entities in `caption`.
    #[serde(default)]
    pub caption_entities: Vec<MessageEntity>,
}

impl Message {
    /// Text or caption, whichever is present.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.text.as_deref().or(self.caption.as_deref())
    }

    /// Converts to the platform-neutral form used by the classifier.
    ///
    /// Returns `None` for messages without text or caption.
    #[must_use]
    pub fn to_inbound(&self) -> Option<InboundMessage> {
        let (text, entities) = match (&self.text, &self.caption) {
            (Some(text), _) => (text, &self.entities),
            (None, Some(caption)) => (caption, &self.caption_entities),
            (None, None) => return None,
        };
        Some(InboundMessage {
            chat_id: Some(self.chat.id),
            text: text.clone(),
            links: entities
                .iter()
                .filter(|e| e.kind == "text_link")
                .filter_map(|e| e.url.clone())
                .collect(),
        })
    }
}

/// Formatting span inside a message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageEntity {
    /// Entity type (`"text_link"`, `"url"`, `"bold"`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Offset in UTF-16 code units.
    pub offset: i64,
    /// Length in UTF-16 code units.
    pub length: i64,
    /// Target of a `text_link`.
    #[serde(default)]
    pub url: Option<String>,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn channel_post_with_text_links() {
        let raw = r#"{
            "update_id": 10,
            "channel_post": {
                "chat": {"id": -1001},
                "text": "Transfer to wallet",
                "entities": [
                    {"type": "bold", "offset": 0, "length": 8},
                    {"type": "text_link", "offset": 12, "length": 6, "url": "https://solscan.io/account/X"}
                ]
            }
        }"#;
        let Ok(update) = serde_json::from_str::<Update>(raw) else {
            panic!("update rejected");
        };
        let Some(inbound) = update.message().and_then(Message::to_inbound) else {
            panic!("no inbound message");
        };
        assert_eq!(inbound.chat_id, Some(-1001));
        assert_eq!(inbound.links, vec!["https://solscan.io/account/X".to_string()]);
    }

    #[test]
    fn caption_uses_caption_entities() {
        let raw = r#"{
            "update_id": 11,
            "message": {
                "chat": {"id": 5},
                "caption": "photo caption",
                "caption_entities": [
                    {"type": "text_link", "offset": 0, "length": 5, "url": "https://x/account/Y"}
                ]
            }
        }"#;
        let Ok(update) = serde_json::from_str::<Update>(raw) else {
            panic!("update rejected");
        };
        let Some(inbound) = update.message().and_then(Message::to_inbound) else {
            panic!("no inbound message");
        };
        assert_eq!(inbound.text, "photo caption");
        assert_eq!(inbound.links.len(), 1);
    }

    #[test]
    fn textless_message_is_skipped() {
        let message = Message::default();
        assert!(message.to_inbound().is_none());
    }

    #[test]
    fn error_envelope_parses() {
        let raw = r#"{"ok": false, "description": "Unauthorized"}"#;
        let Ok(resp) = serde_json::from_str::<ApiResponse<Vec<Update>>>(raw) else {
            panic!("envelope rejected");
        };
        assert!(!resp.ok);
        assert_eq!(resp.description.as_deref(), Some("Unauthorized"));
    }
}
