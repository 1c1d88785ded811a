//! Event feed: per-address log subscriptions.
//!
//! A [`FeedClient`] opens a [`FeedSubscription`] for one watched address.
//! The subscription is a pair of bounded channels: the transport side
//! ([`FeedEndpoint`]) pushes [`FeedSignal`]s in delivery order, and the
//! watcher sends [`FeedControl`] requests (heartbeat probe, close) back.
//! Opening never blocks the caller; the transport reports `Opened`,
//! `Closed` or `Error` asynchronously.

pub mod messages;
#[cfg(test)]
pub(crate) mod scripted;
pub mod websocket;

use std::fmt;

use tokio::sync::mpsc;

use crate::domain::AccountAddress;

pub use messages::{LogBatch, SubscribeOptions};
pub use websocket::WsFeedClient;

/// Capacity of the watcher → transport control channel.
const CONTROL_CAPACITY: usize = 8;

/// Transport → watcher signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSignal {
    /// Connection established and subscribe request sent.
    Opened,
    /// One log notification.
    Logs(LogBatch),
    /// The remote end closed the connection.
    Closed,
    /// The transport failed.
    Error(String),
}

/// Watcher → transport request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedControl {
    /// Send a liveness probe.
    Ping,
    /// Unsubscribe and close the connection.
    Close,
}

/// Watcher-owned side of one subscription.
///
/// Dropping it is equivalent to [`FeedSubscription::close`]: the transport
/// sees its control channel end and shuts down.
#[derive(Debug)]
pub struct FeedSubscription {
    events: mpsc::Receiver<FeedSignal>,
    control: mpsc::Sender<FeedControl>,
}

impl FeedSubscription {
    /// Creates a connected subscription / endpoint pair whose event queue
    /// holds at most `capacity` undelivered signals.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, FeedEndpoint) {
        let (event_tx, event_rx) = mpsc::channel(capacity.max(1));
        let (control_tx, control_rx) = mpsc::channel(CONTROL_CAPACITY);
        (
            Self {
                events: event_rx,
                control: control_tx,
            },
            FeedEndpoint {
                events: event_tx,
                control: control_rx,
            },
        )
    }

    /// Receives the next signal; `None` once the transport is gone.
    pub async fn recv(&mut self) -> Option<FeedSignal> {
        self.events.recv().await
    }

    /// Requests a liveness probe without waiting.
    ///
    /// Returns `false` if the request could not be queued.
    pub fn ping(&self) -> bool {
        self.control.try_send(FeedControl::Ping).is_ok()
    }

    /// Requests an orderly close without waiting. Best-effort.
    pub fn close(&self) {
        let _ = self.control.try_send(FeedControl::Close);
    }
}

/// Transport-owned side of one subscription.
#[derive(Debug)]
pub struct FeedEndpoint {
    events: mpsc::Sender<FeedSignal>,
    control: mpsc::Receiver<FeedControl>,
}

impl FeedEndpoint {
    /// Delivers a signal to the watcher.
    ///
    /// Returns `false` if the watcher has dropped its subscription.
    pub async fn emit(&self, signal: FeedSignal) -> bool {
        self.events.send(signal).await.is_ok()
    }

    /// Receives the next control request; `None` once the watcher has
    /// dropped its subscription.
    pub async fn next_control(&mut self) -> Option<FeedControl> {
        self.control.recv().await
    }

    /// Non-blocking variant of [`FeedEndpoint::next_control`].
    pub fn try_next_control(&mut self) -> Option<FeedControl> {
        self.control.try_recv().ok()
    }
}

/// Capability to open per-address log subscriptions.
pub trait FeedClient: Send + Sync + fmt::Debug {
    /// Starts a `mentions = [address]` subscription and returns immediately.
    fn subscribe(&self, address: &AccountAddress) -> FeedSubscription;
}
