//! Per-address mint watcher.
//!
//! A [`MintWatcher`] is a task that owns one feed subscription, one
//! heartbeat timer and one deadline timer. It consumes its subscription's
//! signal queue in delivery order and drives itself through
//!
//! ```text
//! CONNECTING ──opened──▶ LISTENING ──▶ MINT_FOUND | TIMED_OUT | FEED_ERROR | FEED_CLOSED
//!      └────────────── cancel (operator) ──────────────▶ CANCELLED
//! ```
//!
//! Whatever the exit path, the watcher emits at most one outcome
//! notification, closes its subscription, drops both timers and releases
//! its own registry entry before the task ends.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::domain::{
    Cancellation, EventBus, SignatureSet, WatchEntry, WatchEvent, WatchRegistry,
};
use crate::error::WatchError;
use crate::feed::{FeedClient, FeedSignal, FeedSubscription, LogBatch};
use crate::notify::{Notification, NotificationKind, Notifier};

/// Shortest accepted heartbeat interval.
pub const MIN_HEARTBEAT: Duration = Duration::from_secs(50);

/// Longest accepted heartbeat interval.
pub const MAX_HEARTBEAT: Duration = Duration::from_secs(180);

/// What a watcher does when the remote end closes its subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedClosePolicy {
    /// End the watch.
    #[default]
    Terminate,
    /// Re-subscribe once, then end the watch on the next close.
    ReconnectOnce,
}

impl FeedClosePolicy {
    const fn reconnects(self) -> u8 {
        match self {
            Self::Terminate => 0,
            Self::ReconnectOnce => 1,
        }
    }
}

impl FromStr for FeedClosePolicy {
    type Err = WatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "terminate" => Ok(Self::Terminate),
            "reconnect_once" | "reconnect-once" => Ok(Self::ReconnectOnce),
            other => Err(WatchError::InvalidRequest(format!(
                "unknown feed close policy: {other}"
            ))),
        }
    }
}

/// Rule-independent watcher tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherSettings {
    /// Interval between liveness probes, within 50–180 s.
    pub heartbeat_interval: Duration,
    /// Log substrings denoting a mint initialization.
    pub mint_markers: Vec<String>,
    /// Reaction to a remote close.
    pub close_policy: FeedClosePolicy,
}

impl WatcherSettings {
    /// Clamps `interval` into the accepted heartbeat range.
    #[must_use]
    pub fn clamp_heartbeat(interval: Duration) -> Duration {
        interval.clamp(MIN_HEARTBEAT, MAX_HEARTBEAT)
    }
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            heartbeat_interval: MIN_HEARTBEAT,
            mint_markers: vec!["InitializeMint2".to_string(), "InitializeMint".to_string()],
            close_policy: FeedClosePolicy::Terminate,
        }
    }
}

/// Watcher lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WatcherState {
    /// Subscription requested, not yet open.
    Connecting,
    /// Subscription open; classifying events.
    Listening,
    /// A mint was observed.
    MintFound,
    /// The deadline passed.
    TimedOut,
    /// The feed failed.
    FeedError,
    /// The remote end closed the feed.
    FeedClosed,
    /// An operator cancelled the watch.
    Cancelled,
}

impl WatcherState {
    /// Returns `true` for end states.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Connecting | Self::Listening)
    }
}

/// Shared collaborators every watcher needs.
#[derive(Debug, Clone)]
pub(crate) struct WatcherContext {
    pub(crate) registry: Arc<WatchRegistry>,
    pub(crate) signatures: Arc<SignatureSet>,
    pub(crate) feed: Arc<dyn FeedClient>,
    pub(crate) notifier: Notifier,
    pub(crate) event_bus: EventBus,
    pub(crate) settings: Arc<WatcherSettings>,
}

/// Why [`MintWatcher::listen`] returned.
#[derive(Debug)]
enum Ending {
    Mint { mint: String, signature: String },
    Deadline,
    Closed,
    Failed(String),
    Cancelled,
}

/// State machine for one watched address.
#[derive(Debug)]
pub(crate) struct MintWatcher {
    entry: WatchEntry,
    state: WatcherState,
    deadline: Instant,
    announced: bool,
    reconnects_left: u8,
    ctx: WatcherContext,
}

impl MintWatcher {
    /// Spawns the watcher task for a freshly registered `entry`.
    pub(crate) fn spawn(
        entry: WatchEntry,
        cancel: Cancellation,
        ctx: WatcherContext,
    ) -> JoinHandle<WatcherState> {
        let now = Instant::now();
        let deadline = now
            .checked_add(entry.timeout)
            .unwrap_or_else(|| now + Duration::from_secs(100 * 365 * 24 * 3600));
        let watcher = Self {
            reconnects_left: ctx.settings.close_policy.reconnects(),
            entry,
            state: WatcherState::Connecting,
            deadline,
            announced: false,
            ctx,
        };
        tokio::spawn(watcher.run(cancel))
    }

    async fn run(mut self, mut cancel: Cancellation) -> WatcherState {
        let mut subscription = self.ctx.feed.subscribe(&self.entry.address);
        let ending = self.listen(&mut subscription, &mut cancel).await;
        self.finish(ending, subscription).await
    }

    /// Event loop. Both timers live in this frame, so returning stops them.
    async fn listen(
        &mut self,
        subscription: &mut FeedSubscription,
        cancel: &mut Cancellation,
    ) -> Ending {
        let deadline = tokio::time::sleep_until(self.deadline);
        tokio::pin!(deadline);

        let period = self.ctx.settings.heartbeat_interval;
        let mut heartbeat = tokio::time::interval_at(Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => return Ending::Cancelled,

                signal = subscription.recv() => match signal {
                    Some(FeedSignal::Opened) => self.on_opened(),
                    Some(FeedSignal::Logs(batch)) => {
                        if let Some(ending) = self.on_logs(&batch).await {
                            return ending;
                        }
                    }
                    Some(FeedSignal::Closed) | None => {
                        if self.reconnects_left == 0 {
                            return Ending::Closed;
                        }
                        self.reconnects_left -= 1;
                        tracing::info!(
                            address = %self.entry.address,
                            watch_id = %self.entry.watch_id,
                            "feed closed, re-subscribing once"
                        );
                        self.publish(WatchEvent::FeedClosed {
                            watch_id: self.entry.watch_id,
                            address: self.entry.address.clone(),
                            reconnecting: true,
                            timestamp: Utc::now(),
                        });
                        *subscription = self.ctx.feed.subscribe(&self.entry.address);
                        self.state = WatcherState::Connecting;
                    }
                    Some(FeedSignal::Error(reason)) => return Ending::Failed(reason),
                },

                _ = heartbeat.tick(), if self.state == WatcherState::Listening => {
                    if !subscription.ping() {
                        tracing::debug!(address = %self.entry.address, "heartbeat not queued");
                    }
                }

                () = &mut deadline => return Ending::Deadline,
            }
        }
    }

    fn on_opened(&mut self) {
        if self.state != WatcherState::Connecting {
            return;
        }
        self.state = WatcherState::Listening;
        tracing::info!(
            address = %self.entry.address,
            rule = %self.entry.rule_label,
            "listening for mint"
        );
        self.publish(WatchEvent::FeedOpened {
            watch_id: self.entry.watch_id,
            address: self.entry.address.clone(),
            timestamp: Utc::now(),
        });
        if !self.announced {
            self.announced = true;
            if self.entry.announce_armed {
                self.ctx.notifier.notify(&self.notification(NotificationKind::Armed));
            }
        }
    }

    /// Returns an ending if `batch` is a fresh mint initialization.
    async fn on_logs(&mut self, batch: &LogBatch) -> Option<Ending> {
        let Some(signature) = batch.signature.as_deref() else {
            tracing::trace!(address = %self.entry.address, "dropping notification without signature");
            return None;
        };
        if self.ctx.signatures.seen(signature).await {
            tracing::debug!(address = %self.entry.address, signature, "signature already handled");
            return None;
        }
        if !batch.contains_marker(&self.ctx.settings.mint_markers) {
            return None;
        }
        // Another watcher may have claimed the signature since `seen`.
        if !self.ctx.signatures.mark_seen(signature).await {
            return None;
        }
        Some(Ending::Mint {
            mint: batch.mint_subject().to_string(),
            signature: signature.to_string(),
        })
    }

    async fn finish(mut self, ending: Ending, subscription: FeedSubscription) -> WatcherState {
        let watch_id = self.entry.watch_id;
        let address = self.entry.address.clone();
        let now = Utc::now();

        let (state, kind, event) = match ending {
            Ending::Mint { mint, signature } => {
                tracing::info!(%address, rule = %self.entry.rule_label, %mint, %signature, "mint detected");
                (
                    WatcherState::MintFound,
                    Some(NotificationKind::MintFound {
                        mint: mint.clone(),
                        signature: signature.clone(),
                    }),
                    WatchEvent::MintFound {
                        watch_id,
                        address: address.clone(),
                        rule_label: self.entry.rule_label.clone(),
                        mint,
                        signature,
                        timestamp: now,
                    },
                )
            }
            Ending::Deadline => {
                tracing::info!(%address, rule = %self.entry.rule_label, "deadline reached, closing watch");
                (
                    WatcherState::TimedOut,
                    Some(NotificationKind::TimedOut),
                    WatchEvent::WatchTimedOut {
                        watch_id,
                        address: address.clone(),
                        rule_label: self.entry.rule_label.clone(),
                        timestamp: now,
                    },
                )
            }
            Ending::Closed => {
                tracing::info!(%address, "feed closed for watch");
                // Only a watch that reached LISTENING was ever announced.
                let notice = self.announced.then(|| NotificationKind::WatchFailed {
                    reason: "feed connection closed".to_string(),
                });
                (
                    WatcherState::FeedClosed,
                    notice,
                    WatchEvent::FeedClosed {
                        watch_id,
                        address: address.clone(),
                        reconnecting: false,
                        timestamp: now,
                    },
                )
            }
            Ending::Failed(reason) => {
                tracing::warn!(%address, %reason, "feed error, abandoning watch");
                (
                    WatcherState::FeedError,
                    Some(NotificationKind::WatchFailed {
                        reason: format!("feed error: {reason}"),
                    }),
                    WatchEvent::FeedFailed {
                        watch_id,
                        address: address.clone(),
                        reason,
                        timestamp: now,
                    },
                )
            }
            Ending::Cancelled => {
                tracing::info!(%address, "watch cancelled");
                (
                    WatcherState::Cancelled,
                    None,
                    WatchEvent::WatchCancelled {
                        watch_id,
                        address: address.clone(),
                        timestamp: now,
                    },
                )
            }
        };

        if let Some(kind) = kind {
            self.ctx.notifier.notify(&self.notification(kind));
        }
        subscription.close();
        drop(subscription);
        self.state = state;
        self.ctx.registry.release(&address, watch_id).await;
        self.publish(event);
        self.state
    }

    fn notification(&self, kind: NotificationKind) -> Notification {
        Notification {
            channel: self.entry.notify_channel.clone(),
            rule_label: self.entry.rule_label.clone(),
            address: self.entry.address.clone(),
            kind,
        }
    }

    fn publish(&self, event: WatchEvent) {
        let _ = self.ctx.event_bus.publish(event);
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn close_policy_parses() {
        assert_eq!(
            "terminate".parse::<FeedClosePolicy>().ok(),
            Some(FeedClosePolicy::Terminate)
        );
        assert_eq!(
            "RECONNECT_ONCE".parse::<FeedClosePolicy>().ok(),
            Some(FeedClosePolicy::ReconnectOnce)
        );
        assert!("retry_forever".parse::<FeedClosePolicy>().is_err());
    }

    #[test]
    fn heartbeat_is_clamped() {
        assert_eq!(
            WatcherSettings::clamp_heartbeat(Duration::from_secs(5)),
            MIN_HEARTBEAT
        );
        assert_eq!(
            WatcherSettings::clamp_heartbeat(Duration::from_secs(600)),
            MAX_HEARTBEAT
        );
        assert_eq!(
            WatcherSettings::clamp_heartbeat(Duration::from_secs(90)),
            Duration::from_secs(90)
        );
    }

    #[test]
    fn terminal_states() {
        assert!(!WatcherState::Connecting.is_terminal());
        assert!(!WatcherState::Listening.is_terminal());
        assert!(WatcherState::MintFound.is_terminal());
        assert!(WatcherState::Cancelled.is_terminal());
    }

    #[test]
    fn default_markers_cover_both_instruction_versions() {
        let markers = WatcherSettings::default().mint_markers;
        assert!(markers.iter().any(|m| m == "InitializeMint"));
        assert!(markers.iter().any(|m| m == "InitializeMint2"));
    }
}
