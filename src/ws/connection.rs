//! WebSocket connection loop.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding filtered lifecycle events.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::SubscriptionManager;
use crate::domain::{AccountAddress, WatchEvent};
use crate::service::WatchService;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them.
/// - Forwards matching events from the [`broadcast::Receiver`] to the client.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<WatchEvent>,
    watch_service: Arc<WatchService>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_text_message(&text, &mut subs, &watch_service).await;
                        if let Some(json) = reply.to_text()
                            && ws_tx.send(Message::text(json)).await.is_err()
                        {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            event = event_rx.recv() => {
                match event {
                    Ok(event) => {
                        if !subs.matches(event.address()) {
                            continue;
                        }
                        if let Some(json) = event_message(&event).to_text()
                            && ws_tx.send(Message::text(json)).await.is_err()
                        {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

/// Wraps a lifecycle event in the server envelope.
#[must_use]
pub fn event_message(event: &WatchEvent) -> WsMessage {
    WsMessage::new(
        uuid::Uuid::new_v4().to_string(),
        WsMessageType::Event,
        serde_json::to_value(event).unwrap_or_default(),
    )
}

/// Handles a text message from the client and returns the reply.
pub async fn handle_text_message(
    text: &str,
    subs: &mut SubscriptionManager,
    watch_service: &WatchService,
) -> WsMessage {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return WsMessage::error("", 400, "malformed JSON");
    };
    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        return WsMessage::error(msg.id, 404, "unknown command");
    };

    match command {
        WsCommand::Subscribe { addresses } => {
            let (parsed, wildcard, rejected) = parse_addresses(&addresses);
            subs.subscribe(&parsed, wildcard);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "subscribed": parsed.iter().map(AccountAddress::as_str).collect::<Vec<_>>(),
                    "rejected": rejected,
                    "count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            )
        }
        WsCommand::Unsubscribe { addresses } => {
            let (parsed, wildcard, rejected) = parse_addresses(&addresses);
            subs.unsubscribe(&parsed, wildcard);
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "unsubscribed": parsed.iter().map(AccountAddress::as_str).collect::<Vec<_>>(),
                    "rejected": rejected,
                    "remaining_count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            )
        }
        WsCommand::ListWatches => {
            let watches = watch_service.list().await;
            WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({ "watches": watches }),
            )
        }
        WsCommand::Cancel { address } => {
            let result = match AccountAddress::parse(&address) {
                Ok(address) => watch_service.cancel(&address).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(summary) => WsMessage::new(
                    msg.id,
                    WsMessageType::Response,
                    serde_json::json!({ "cancelled": summary }),
                ),
                Err(e) => WsMessage::error(msg.id, e.status_code().as_u16(), &e.to_string()),
            }
        }
    }
}

/// Splits raw subscription targets into valid addresses, the wildcard
/// flag and rejected entries.
fn parse_addresses(raw: &[String]) -> (Vec<AccountAddress>, bool, Vec<String>) {
    let mut parsed = Vec::new();
    let mut wildcard = false;
    let mut rejected = Vec::new();
    for item in raw {
        if item == "*" {
            wildcard = true;
        } else if let Ok(address) = AccountAddress::parse(item) {
            parsed.push(address);
        } else {
            rejected.push(item.clone());
        }
    }
    (parsed, wildcard, rejected)
}
