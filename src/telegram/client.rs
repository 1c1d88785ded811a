//! Minimal Bot API client over `reqwest`.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::types::{ApiResponse, Update};
use crate::error::WatchError;
use crate::notify::NotificationSink;

/// Slack added to the HTTP timeout on top of the long-poll timeout.
const HTTP_TIMEOUT_SLACK: Duration = Duration::from_secs(10);

/// Telegram Bot API client.
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
    poll_timeout_secs: u64,
}

impl fmt::Debug for TelegramClient {
    // The base URL embeds the bot token.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramClient")
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    /// Builds a client for `token` against `api_url`.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Notification`] if the HTTP client cannot be
    /// built.
    pub fn new(api_url: &str, token: &str, poll_timeout_secs: u64) -> Result<Self, WatchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(poll_timeout_secs) + HTTP_TIMEOUT_SLACK)
            .build()?;
        Ok(Self {
            http,
            base_url: format!("{}/bot{token}", api_url.trim_end_matches('/')),
            poll_timeout_secs,
        })
    }

    /// Long-polls for updates after `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Notification`] on transport failure or an
    /// API-level error.
    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, WatchError> {
        self.call("getUpdates", &get_updates_payload(offset, self.poll_timeout_secs))
            .await
    }

    /// Sends an HTML message to `chat_id` with link previews disabled.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Notification`] on transport failure or an
    /// API-level error.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<(), WatchError> {
        let _: Value = self
            .call("sendMessage", &send_message_payload(chat_id, text))
            .await?;
        Ok(())
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, body: &Value) -> Result<T, WatchError> {
        let response: ApiResponse<T> = self
            .http
            .post(format!("{}/{method}", self.base_url))
            .json(body)
            .send()
            .await?
            .json()
            .await?;
        match response {
            ApiResponse {
                ok: true,
                result: Some(result),
                ..
            } => Ok(result),
            ApiResponse { description, .. } => Err(WatchError::Notification(format!(
                "{method}: {}",
                description.unwrap_or_else(|| "no result".to_string())
            ))),
        }
    }
}

#[async_trait]
impl NotificationSink for TelegramClient {
    async fn deliver(&self, channel: &str, text: &str) -> Result<(), WatchError> {
        self.send_message(channel, text).await
    }
}

/// Body of a `getUpdates` call.
fn get_updates_payload(offset: Option<i64>, timeout_secs: u64) -> Value {
    let mut body = json!({
        "timeout": timeout_secs,
        "allowed_updates": ["message", "channel_post"],
    });
    if let (Some(offset), Some(obj)) = (offset, body.as_object_mut()) {
        obj.insert("offset".to_string(), json!(offset));
    }
    body
}

/// Body of a `sendMessage` call.
fn send_message_payload(chat_id: &str, text: &str) -> Value {
    json!({
        "chat_id": chat_id,
        "text": text,
        "parse_mode": "HTML",
        "disable_web_page_preview": true,
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn send_message_is_html_without_previews() {
        let payload = send_message_payload("-100", "<b>hi</b>");
        assert_eq!(
            payload,
            json!({
                "chat_id": "-100",
                "text": "<b>hi</b>",
                "parse_mode": "HTML",
                "disable_web_page_preview": true,
            })
        );
    }

    #[test]
    fn get_updates_offset_is_optional() {
        let first = get_updates_payload(None, 30);
        assert!(first.get("offset").is_none());
        assert_eq!(first["timeout"], 30);

        let next = get_updates_payload(Some(42), 30);
        assert_eq!(next["offset"], 42);
        assert_eq!(next["allowed_updates"][1], "channel_post");
    }

    #[test]
    fn debug_hides_token() {
        let Ok(client) = TelegramClient::new("https://api.telegram.org/", "123:SECRET", 30) else {
            panic!("client build failed");
        };
        assert!(!format!("{client:?}").contains("SECRET"));
        assert_eq!(client.base_url, "https://api.telegram.org/bot123:SECRET");
    }

    #[tokio::test]
    async fn transport_errors_do_not_carry_token() {
        let Ok(client) = TelegramClient::new("http://127.0.0.1:1", "123:SUPERSECRET", 1) else {
            panic!("client build failed");
        };
        let Err(err) = client.get_updates(None).await else {
            panic!("nothing listens on port 1");
        };
        assert!(matches!(err, WatchError::Notification(_)));
        let text = err.to_string();
        assert!(!text.contains("SUPERSECRET"), "token in error: {text}");
        assert!(!format!("{err:?}").contains("SUPERSECRET"));

        let Err(err) = client.send_message("-100", "hi").await else {
            panic!("nothing listens on port 1");
        };
        assert!(!err.to_string().contains("SUPERSECRET"));
    }
}
