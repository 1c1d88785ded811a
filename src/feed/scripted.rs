//! In-memory feed for driving watchers from tests.
//!
//! Every `subscribe` call hands the transport side to the test through an
//! unbounded channel, so the test decides when the subscription opens,
//! which notifications arrive, and how it ends.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::{FeedClient, FeedControl, FeedEndpoint, FeedSignal, FeedSubscription, LogBatch};
use crate::domain::AccountAddress;

/// Test feed client.
#[derive(Debug)]
pub(crate) struct ScriptedFeed {
    peers: mpsc::UnboundedSender<ScriptedPeer>,
}

impl ScriptedFeed {
    /// Creates a feed and the receiver of its subscription peers.
    pub(crate) fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<ScriptedPeer>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { peers: tx }), rx)
    }
}

impl FeedClient for ScriptedFeed {
    fn subscribe(&self, address: &AccountAddress) -> FeedSubscription {
        let (subscription, endpoint) = FeedSubscription::channel(16);
        let _ = self.peers.send(ScriptedPeer {
            address: address.clone(),
            endpoint,
        });
        subscription
    }
}

/// Transport side of one scripted subscription.
#[derive(Debug)]
pub(crate) struct ScriptedPeer {
    pub(crate) address: AccountAddress,
    endpoint: FeedEndpoint,
}

impl ScriptedPeer {
    pub(crate) async fn open(&self) -> bool {
        self.endpoint.emit(FeedSignal::Opened).await
    }

    pub(crate) async fn logs(&self, signature: Option<&str>, logs: &[&str], mentions: &[&str]) -> bool {
        self.endpoint
            .emit(FeedSignal::Logs(LogBatch {
                signature: signature.map(ToString::to_string),
                logs: logs.iter().map(ToString::to_string).collect(),
                mentions: mentions.iter().map(ToString::to_string).collect(),
            }))
            .await
    }

    pub(crate) async fn hang_up(&self) -> bool {
        self.endpoint.emit(FeedSignal::Closed).await
    }

    pub(crate) async fn fail(&self, reason: &str) -> bool {
        self.endpoint.emit(FeedSignal::Error(reason.to_string())).await
    }

    /// Drains pending control requests.
    pub(crate) fn drain_control(&mut self) -> Vec<FeedControl> {
        let mut out = Vec::new();
        while let Some(control) = self.endpoint.try_next_control() {
            out.push(control);
        }
        out
    }

    /// Waits until the watcher drops or closes its subscription.
    pub(crate) async fn closed(&mut self) {
        while let Some(control) = self.endpoint.next_control().await {
            if control == FeedControl::Close {
                return;
            }
        }
    }
}
