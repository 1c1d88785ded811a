//! WebSocket transport for `logsSubscribe` subscriptions.
//!
//! One connection per watched address, driven by a spawned task that
//! bridges the socket and the subscription's [`FeedEndpoint`]. The task
//! never retries: any failure is reported once and the task ends.

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use super::messages::{FeedFrame, logs_subscribe_request, logs_unsubscribe_request, parse_frame};
use super::{FeedClient, FeedControl, FeedEndpoint, FeedSignal, FeedSubscription, SubscribeOptions};
use crate::domain::AccountAddress;

/// Feed client backed by a Solana-compatible JSON-RPC WebSocket endpoint.
#[derive(Debug, Clone)]
pub struct WsFeedClient {
    url: String,
    options: SubscribeOptions,
    queue_capacity: usize,
}

impl WsFeedClient {
    /// Creates a client for `url` (e.g. `wss://rpc.helius.xyz/?api-key=...`).
    #[must_use]
    pub fn new(url: String, options: SubscribeOptions, queue_capacity: usize) -> Self {
        Self {
            url,
            options,
            queue_capacity,
        }
    }
}

impl FeedClient for WsFeedClient {
    fn subscribe(&self, address: &AccountAddress) -> FeedSubscription {
        let (subscription, endpoint) = FeedSubscription::channel(self.queue_capacity);
        tokio::spawn(run_transport(
            self.url.clone(),
            address.clone(),
            self.options.clone(),
            endpoint,
        ));
        subscription
    }
}

/// Runs one subscription until the remote side or the watcher ends it.
async fn run_transport(
    url: String,
    address: AccountAddress,
    options: SubscribeOptions,
    mut endpoint: FeedEndpoint,
) {
    let ws_stream = match connect_async(url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            tracing::warn!(%address, error = %e, "feed connect failed");
            endpoint.emit(FeedSignal::Error(e.to_string())).await;
            return;
        }
    };
    let (mut write, mut read) = ws_stream.split();

    let request = logs_subscribe_request(&address, &options);
    if let Err(e) = write.send(Message::text(request.to_string())).await {
        tracing::warn!(%address, error = %e, "feed subscribe send failed");
        endpoint.emit(FeedSignal::Error(e.to_string())).await;
        return;
    }
    tracing::debug!(%address, "logsSubscribe sent");

    if !endpoint.emit(FeedSignal::Opened).await {
        let _ = write.close().await;
        return;
    }

    let mut subscription_id: Option<u64> = None;

    loop {
        tokio::select! {
            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => match parse_frame(text.as_str()) {
                        FeedFrame::Logs(batch) => {
                            if !endpoint.emit(FeedSignal::Logs(batch)).await {
                                break;
                            }
                        }
                        FeedFrame::SubscribeAck(id) => {
                            tracing::debug!(%address, subscription = id, "logsSubscribe acknowledged");
                            subscription_id = Some(id);
                        }
                        FeedFrame::RpcError(message) => {
                            tracing::warn!(%address, %message, "feed rejected request");
                            endpoint.emit(FeedSignal::Error(message)).await;
                            break;
                        }
                        FeedFrame::Other => {
                            tracing::trace!(%address, "ignoring unrecognised feed frame");
                        }
                    },
                    Some(Ok(Message::Ping(payload))) => {
                        let _ = write.send(Message::Pong(payload)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        endpoint.emit(FeedSignal::Closed).await;
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        endpoint.emit(FeedSignal::Error(e.to_string())).await;
                        break;
                    }
                }
            }
            control = endpoint.next_control() => {
                match control {
                    Some(FeedControl::Ping) => {
                        if let Err(e) = write.send(Message::Ping(Vec::<u8>::new().into())).await {
                            endpoint.emit(FeedSignal::Error(e.to_string())).await;
                            break;
                        }
                    }
                    Some(FeedControl::Close) | None => {
                        if let Some(id) = subscription_id {
                            let unsubscribe = logs_unsubscribe_request(id);
                            let _ = write.send(Message::text(unsubscribe.to_string())).await;
                        }
                        let _ = write.close().await;
                        break;
                    }
                }
            }
        }
    }

    tracing::debug!(%address, "feed transport finished");
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use tokio::net::TcpListener;

    use super::*;

    const ADDR: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";

    /// One-connection feed server: acknowledges the subscription, pushes a
    /// single notification and returns the two frames the client sent.
    async fn serve_once(listener: TcpListener) -> (String, String) {
        let Ok((tcp, _)) = listener.accept().await else {
            panic!("accept failed");
        };
        let Ok(mut ws) = tokio_tungstenite::accept_async(tcp).await else {
            panic!("handshake failed");
        };
        let Some(Ok(Message::Text(subscribe))) = ws.next().await else {
            panic!("no subscribe request");
        };
        let ack = r#"{"jsonrpc":"2.0","result":42,"id":1}"#;
        let notification = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "logsNotification",
            "params": {
                "result": {
                    "context": { "slot": 7 },
                    "value": {
                        "signature": "SIG1",
                        "err": null,
                        "logs": ["Program log: Instruction: InitializeMint2"],
                        "mentions": ["MINT_XYZ"],
                    },
                },
                "subscription": 42,
            },
        });
        let (Ok(()), Ok(())) = (
            ws.send(Message::text(ack.to_string())).await,
            ws.send(Message::text(notification.to_string())).await,
        ) else {
            panic!("server send failed");
        };
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(unsubscribe))) => {
                    return (subscribe.as_str().to_string(), unsubscribe.as_str().to_string());
                }
                Some(Ok(_)) => {}
                _ => panic!("connection ended before unsubscribe"),
            }
        }
    }

    #[tokio::test]
    async fn subscribes_streams_and_unsubscribes() {
        let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind failed");
        };
        let Ok(local) = listener.local_addr() else {
            panic!("no local addr");
        };
        let server = tokio::spawn(serve_once(listener));

        let Ok(address) = AccountAddress::parse(ADDR) else {
            panic!("valid address rejected");
        };
        let client = WsFeedClient::new(format!("ws://{local}"), SubscribeOptions::default(), 8);
        let mut subscription = client.subscribe(&address);

        let Ok(Some(FeedSignal::Opened)) =
            tokio::time::timeout(Duration::from_secs(5), subscription.recv()).await
        else {
            panic!("subscription did not open");
        };
        let Ok(Some(FeedSignal::Logs(batch))) =
            tokio::time::timeout(Duration::from_secs(5), subscription.recv()).await
        else {
            panic!("no log batch");
        };
        assert_eq!(batch.signature.as_deref(), Some("SIG1"));
        assert_eq!(batch.mint_subject(), "MINT_XYZ");

        subscription.close();
        let Ok(Ok((subscribe, unsubscribe))) =
            tokio::time::timeout(Duration::from_secs(5), server).await
        else {
            panic!("server did not finish");
        };
        let Ok(subscribe) = serde_json::from_str::<serde_json::Value>(&subscribe) else {
            panic!("subscribe is not json");
        };
        assert_eq!(subscribe["method"], "logsSubscribe");
        assert_eq!(subscribe["params"][0]["mentions"][0], ADDR);
        assert_eq!(subscribe["params"][1]["commitment"], "confirmed");
        assert!(unsubscribe.contains("logsUnsubscribe"));
        assert!(unsubscribe.contains("[42]"));
    }

    #[tokio::test]
    async fn connect_failure_is_reported_once() {
        let Ok(address) = AccountAddress::parse(ADDR) else {
            panic!("valid address rejected");
        };
        // Nothing listens on port 1.
        let client = WsFeedClient::new("ws://127.0.0.1:1".to_string(), SubscribeOptions::default(), 8);
        let mut subscription = client.subscribe(&address);
        let Ok(Some(FeedSignal::Error(_))) =
            tokio::time::timeout(Duration::from_secs(5), subscription.recv()).await
        else {
            panic!("expected connect error");
        };
        let end = tokio::time::timeout(Duration::from_secs(5), subscription.recv()).await;
        assert!(matches!(end, Ok(None)));
    }
}
