//! JSON-RPC frames exchanged with the log subscription endpoint.
//!
//! Outbound: one `logsSubscribe` request per connection, and a
//! `logsUnsubscribe` on orderly close. Inbound: log notifications exposing
//! `params.result.value.{logs, signature, mentions}`, the subscribe
//! acknowledgement, and JSON-RPC errors. Anything else is [`FeedFrame::Other`].

use serde_json::{Value, json};

use crate::domain::AccountAddress;

/// Placeholder mint subject when the notification carries no mentions.
pub const UNKNOWN_MINT: &str = "unknown";

/// Request id used for the subscribe request.
pub const SUBSCRIBE_REQUEST_ID: u64 = 1;

/// Request id used for the unsubscribe request.
pub const UNSUBSCRIBE_REQUEST_ID: u64 = 2;

/// Subscription parameters sent with `logsSubscribe`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeOptions {
    /// Commitment level (`"confirmed"` by default).
    pub commitment: String,
    /// Optional encoding hint (`"jsonParsed"` on some providers).
    pub encoding: Option<String>,
}

impl Default for SubscribeOptions {
    fn default() -> Self {
        Self {
            commitment: "confirmed".to_string(),
            encoding: None,
        }
    }
}

/// Builds the `logsSubscribe` request for `address`.
#[must_use]
pub fn logs_subscribe_request(address: &AccountAddress, options: &SubscribeOptions) -> Value {
    let mut config = json!({ "commitment": options.commitment });
    if let (Some(encoding), Some(obj)) = (&options.encoding, config.as_object_mut()) {
        obj.insert("encoding".to_string(), Value::String(encoding.clone()));
    }
    json!({
        "jsonrpc": "2.0",
        "id": SUBSCRIBE_REQUEST_ID,
        "method": "logsSubscribe",
        "params": [
            { "mentions": [address.as_str()] },
            config,
        ],
    })
}

/// Builds the `logsUnsubscribe` request for a server subscription id.
#[must_use]
pub fn logs_unsubscribe_request(subscription_id: u64) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": UNSUBSCRIBE_REQUEST_ID,
        "method": "logsUnsubscribe",
        "params": [subscription_id],
    })
}

/// One batch of log lines from a single transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogBatch {
    /// Transaction signature, if the provider included one.
    pub signature: Option<String>,
    /// Program log lines.
    pub logs: Vec<String>,
    /// Accounts the provider reports as mentioned.
    pub mentions: Vec<String>,
}

impl LogBatch {
    /// Returns `true` if any log line contains any of `markers`.
    #[must_use]
    pub fn contains_marker(&self, markers: &[String]) -> bool {
        self.logs
            .iter()
            .any(|line| markers.iter().any(|marker| line.contains(marker.as_str())))
    }

    /// First mentioned account, or [`UNKNOWN_MINT`].
    #[must_use]
    pub fn mint_subject(&self) -> &str {
        self.mentions
            .first()
            .map_or(UNKNOWN_MINT, String::as_str)
    }
}

/// Classified inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedFrame {
    /// A log notification.
    Logs(LogBatch),
    /// The server accepted the subscription and assigned this id.
    SubscribeAck(u64),
    /// The server answered a request with a JSON-RPC error.
    RpcError(String),
    /// Unparseable or irrelevant frame.
    Other,
}

/// Classifies a text frame received from the feed.
#[must_use]
pub fn parse_frame(text: &str) -> FeedFrame {
    let Ok(value) = serde_json::from_str::<Value>(text) else {
        return FeedFrame::Other;
    };

    if let Some(error) = value.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| error.to_string(), ToString::to_string);
        return FeedFrame::RpcError(message);
    }

    if value.get("id").and_then(Value::as_u64) == Some(SUBSCRIBE_REQUEST_ID)
        && let Some(subscription) = value.get("result").and_then(Value::as_u64)
    {
        return FeedFrame::SubscribeAck(subscription);
    }

    let Some(event) = value
        .get("params")
        .and_then(|p| p.get("result"))
        .and_then(|r| r.get("value"))
    else {
        return FeedFrame::Other;
    };

    let Some(logs) = event.get("logs").and_then(Value::as_array) else {
        return FeedFrame::Other;
    };

    let signature = event
        .get("signature")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string);

    FeedFrame::Logs(LogBatch {
        signature,
        logs: string_array(logs),
        mentions: event
            .get("mentions")
            .and_then(Value::as_array)
            .map(|arr| string_array(arr.as_slice()))
            .unwrap_or_default(),
    })
}

fn string_array(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .filter_map(Value::as_str)
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn address() -> AccountAddress {
        let Ok(a) = AccountAddress::parse("7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU") else {
            panic!("valid address rejected");
        };
        a
    }

    #[test]
    fn subscribe_request_shape() {
        let req = logs_subscribe_request(&address(), &SubscribeOptions::default());
        assert_eq!(req["method"], "logsSubscribe");
        assert_eq!(req["params"][0]["mentions"][0], address().as_str());
        assert_eq!(req["params"][1]["commitment"], "confirmed");
        assert!(req["params"][1].get("encoding").is_none());
    }

    #[test]
    fn subscribe_request_with_encoding() {
        let options = SubscribeOptions {
            commitment: "confirmed".to_string(),
            encoding: Some("jsonParsed".to_string()),
        };
        let req = logs_subscribe_request(&address(), &options);
        assert_eq!(req["params"][1]["encoding"], "jsonParsed");
    }

    #[test]
    fn parses_log_notification() {
        let text = r#"{
            "jsonrpc": "2.0",
            "method": "logsNotification",
            "params": {
                "result": {
                    "context": { "slot": 5208469 },
                    "value": {
                        "signature": "SIG1",
                        "err": null,
                        "logs": ["Program log: Instruction: InitializeMint2"],
                        "mentions": ["MINT_XYZ"]
                    }
                },
                "subscription": 24040
            }
        }"#;
        let FeedFrame::Logs(batch) = parse_frame(text) else {
            panic!("expected logs frame");
        };
        assert_eq!(batch.signature.as_deref(), Some("SIG1"));
        assert_eq!(batch.mint_subject(), "MINT_XYZ");
        assert!(batch.contains_marker(&["InitializeMint2".to_string()]));
    }

    #[test]
    fn missing_mentions_yield_unknown_subject() {
        let text = r#"{"params":{"result":{"value":{"signature":"S","logs":[]}}}}"#;
        let FeedFrame::Logs(batch) = parse_frame(text) else {
            panic!("expected logs frame");
        };
        assert_eq!(batch.mint_subject(), UNKNOWN_MINT);
    }

    #[test]
    fn empty_signature_is_none() {
        let text = r#"{"params":{"result":{"value":{"signature":"","logs":["x"]}}}}"#;
        let FeedFrame::Logs(batch) = parse_frame(text) else {
            panic!("expected logs frame");
        };
        assert!(batch.signature.is_none());
    }

    #[test]
    fn ack_and_errors_are_classified() {
        assert_eq!(
            parse_frame(r#"{"jsonrpc":"2.0","result":24040,"id":1}"#),
            FeedFrame::SubscribeAck(24040)
        );
        assert_eq!(
            parse_frame(r#"{"jsonrpc":"2.0","error":{"code":-32602,"message":"Invalid params"},"id":1}"#),
            FeedFrame::RpcError("Invalid params".to_string())
        );
    }

    #[test]
    fn garbage_is_other() {
        assert_eq!(parse_frame("not json"), FeedFrame::Other);
        assert_eq!(parse_frame(r#"{"params":{"result":{}}}"#), FeedFrame::Other);
        assert_eq!(parse_frame(r#"{"jsonrpc":"2.0","result":true,"id":2}"#), FeedFrame::Other);
    }

    #[test]
    fn marker_is_substring_match() {
        let batch = LogBatch {
            signature: Some("S".to_string()),
            logs: vec!["Program log: Instruction: InitializeMint".to_string()],
            mentions: vec![],
        };
        let markers = vec!["InitializeMint2".to_string(), "InitializeMint".to_string()];
        assert!(batch.contains_marker(&markers));
        assert!(!batch.contains_marker(&["Transfer".to_string()]));
    }
}
