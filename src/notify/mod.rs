//! Outcome notifications.
//!
//! [`Notifier::notify`] renders a [`Notification`] and enqueues it without
//! waiting; a single delivery task hands queued messages to the configured
//! [`NotificationSink`]. Delivery failures are logged and dropped, never
//! retried, and never reach the watcher that emitted them.

pub mod format;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::domain::AccountAddress;
use crate::error::WatchError;

pub use format::MessageFormatter;

/// What happened to a watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationKind {
    /// The subscription opened; the watch is live.
    Armed,
    /// A mint initialization was observed.
    MintFound {
        /// Mint subject (first mentioned account or `"unknown"`).
        mint: String,
        /// Transaction signature.
        signature: String,
    },
    /// The deadline passed without a mint.
    TimedOut,
    /// The feed failed or closed; the watch ended without an outcome.
    WatchFailed {
        /// Human-readable cause.
        reason: String,
    },
}

/// One notification addressed to a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Destination channel (Telegram chat id).
    pub channel: String,
    /// Label of the rule that armed the watch.
    pub rule_label: String,
    /// Watched account.
    pub address: AccountAddress,
    /// Outcome.
    pub kind: NotificationKind,
}

/// A rendered message waiting for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Destination channel.
    pub channel: String,
    /// Rendered text (Telegram HTML).
    pub text: String,
}

/// Delivery backend for rendered messages.
#[async_trait]
pub trait NotificationSink: Send + Sync + fmt::Debug {
    /// Delivers `text` to `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::Notification`] if the backend rejects or
    /// cannot reach the destination.
    async fn deliver(&self, channel: &str, text: &str) -> Result<(), WatchError>;
}

/// Sink that only logs; used when no bot token is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn deliver(&self, channel: &str, text: &str) -> Result<(), WatchError> {
        tracing::info!(channel, text, "notification");
        Ok(())
    }
}

/// Fire-and-forget front end of the notification sink.
#[derive(Debug, Clone)]
pub struct Notifier {
    queue: mpsc::UnboundedSender<OutboundMessage>,
    formatter: MessageFormatter,
}

impl Notifier {
    /// Starts the delivery task for `sink` and returns the notifier
    /// handle together with the task handle.
    ///
    /// The task ends once every `Notifier` clone has been dropped and the
    /// queue is drained.
    #[must_use]
    pub fn spawn(
        sink: Arc<dyn NotificationSink>,
        formatter: MessageFormatter,
    ) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<OutboundMessage>();
        let task = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                if let Err(e) = sink.deliver(&message.channel, &message.text).await {
                    tracing::warn!(channel = %message.channel, error = %e, "notification delivery failed");
                }
            }
        });
        (
            Self {
                queue: tx,
                formatter,
            },
            task,
        )
    }

    /// Renders and enqueues a watch notification.
    pub fn notify(&self, notification: &Notification) {
        let text = self.formatter.render(notification);
        self.send_text(&notification.channel, text);
    }

    /// Enqueues a pre-rendered message (operator replies).
    pub fn send_text(&self, channel: &str, text: String) {
        let message = OutboundMessage {
            channel: channel.to_string(),
            text,
        };
        if self.queue.send(message).is_err() {
            tracing::warn!(channel, "notification queue closed; message dropped");
        }
    }

    /// Formatter used for watch notifications.
    #[must_use]
    pub fn formatter(&self) -> &MessageFormatter {
        &self.formatter
    }
}


#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::testing::{ChannelSink, FailingSink};
    use super::*;

    fn notification() -> Notification {
        let Ok(address) = AccountAddress::parse(&"F".repeat(40)) else {
            panic!("valid address rejected");
        };
        Notification {
            channel: "-100".to_string(),
            rule_label: "rule".to_string(),
            address,
            kind: NotificationKind::TimedOut,
        }
    }

    #[tokio::test]
    async fn notify_delivers_rendered_text() {
        let (sink, mut rx) = ChannelSink::new();
        let (notifier, _task) = Notifier::spawn(sink, MessageFormatter::default());
        notifier.notify(&notification());

        let Some(message) = rx.recv().await else {
            panic!("nothing delivered");
        };
        assert_eq!(message.channel, "-100");
        assert!(message.text.contains("Timer expired"));
    }

    #[tokio::test]
    async fn failures_do_not_stop_delivery_task() {
        let (notifier, task) = Notifier::spawn(Arc::new(FailingSink), MessageFormatter::default());
        notifier.notify(&notification());
        notifier.notify(&notification());
        drop(notifier);
        let finished = tokio::time::timeout(std::time::Duration::from_secs(1), task).await;
        assert!(matches!(finished, Ok(Ok(()))));
    }
}
