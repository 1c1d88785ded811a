//! Domain events reflecting watch lifecycle transitions.
//!
//! Every transition emits a [`WatchEvent`] through the [`super::EventBus`].
//! Events are streamed to operator WebSocket clients and appended to the
//! audit trail.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{AccountAddress, WatchId};

/// Domain event emitted after every watch lifecycle transition.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum WatchEvent {
    /// A trigger registered a new watch (state `CONNECTING`).
    WatchArmed {
        /// Watch identifier.
        watch_id: WatchId,
        /// Watched account.
        address: AccountAddress,
        /// Arming rule label.
        rule_label: String,
        /// Expiry timestamp.
        deadline: DateTime<Utc>,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// The feed subscription opened (state `LISTENING`).
    FeedOpened {
        /// Watch identifier.
        watch_id: WatchId,
        /// Watched account.
        address: AccountAddress,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A mint initialization was observed.
    MintFound {
        /// Watch identifier.
        watch_id: WatchId,
        /// Watched account.
        address: AccountAddress,
        /// Arming rule label.
        rule_label: String,
        /// Mint subject (first mentioned account or `"unknown"`).
        mint: String,
        /// Transaction signature.
        signature: String,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// The deadline passed without a mint.
    WatchTimedOut {
        /// Watch identifier.
        watch_id: WatchId,
        /// Watched account.
        address: AccountAddress,
        /// Arming rule label.
        rule_label: String,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// The remote end closed the subscription.
    FeedClosed {
        /// Watch identifier.
        watch_id: WatchId,
        /// Watched account.
        address: AccountAddress,
        /// Whether a re-subscription was attempted instead of ending.
        reconnecting: bool,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// The subscription failed.
    FeedFailed {
        /// Watch identifier.
        watch_id: WatchId,
        /// Watched account.
        address: AccountAddress,
        /// Transport error description.
        reason: String,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// An operator cancelled the watch.
    WatchCancelled {
        /// Watch identifier.
        watch_id: WatchId,
        /// Watched account.
        address: AccountAddress,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl WatchEvent {
    /// Returns the watched address associated with this event.
    #[must_use]
    pub fn address(&self) -> &AccountAddress {
        match self {
            Self::WatchArmed { address, .. }
            | Self::FeedOpened { address, .. }
            | Self::MintFound { address, .. }
            | Self::WatchTimedOut { address, .. }
            | Self::FeedClosed { address, .. }
            | Self::FeedFailed { address, .. }
            | Self::WatchCancelled { address, .. } => address,
        }
    }

    /// Returns the watch generation associated with this event.
    #[must_use]
    pub fn watch_id(&self) -> WatchId {
        match self {
            Self::WatchArmed { watch_id, .. }
            | Self::FeedOpened { watch_id, .. }
            | Self::MintFound { watch_id, .. }
            | Self::WatchTimedOut { watch_id, .. }
            | Self::FeedClosed { watch_id, .. }
            | Self::FeedFailed { watch_id, .. }
            | Self::WatchCancelled { watch_id, .. } => *watch_id,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::WatchArmed { .. } => "watch_armed",
            Self::FeedOpened { .. } => "feed_opened",
            Self::MintFound { .. } => "mint_found",
            Self::WatchTimedOut { .. } => "watch_timed_out",
            Self::FeedClosed { .. } => "feed_closed",
            Self::FeedFailed { .. } => "feed_failed",
            Self::WatchCancelled { .. } => "watch_cancelled",
        }
    }

    /// Returns `true` if the event ends the watch.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        match self {
            Self::MintFound { .. }
            | Self::WatchTimedOut { .. }
            | Self::FeedFailed { .. }
            | Self::WatchCancelled { .. } => true,
            Self::FeedClosed { reconnecting, .. } => !*reconnecting,
            Self::WatchArmed { .. } | Self::FeedOpened { .. } => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn addr() -> AccountAddress {
        let Ok(a) = AccountAddress::parse(&"C".repeat(40)) else {
            panic!("valid address rejected");
        };
        a
    }

    #[test]
    fn mint_found_serializes_with_tag() {
        let event = WatchEvent::MintFound {
            watch_id: WatchId::new(),
            address: addr(),
            rule_label: "r".to_string(),
            mint: "MINT".to_string(),
            signature: "SIG1".to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap_or_default();
        assert!(json.contains("\"event_type\":\"mint_found\""));
        assert!(json.contains("SIG1"));
        assert!(event.is_terminal());
    }

    #[test]
    fn reconnecting_close_is_not_terminal() {
        let event = WatchEvent::FeedClosed {
            watch_id: WatchId::new(),
            address: addr(),
            reconnecting: true,
            timestamp: Utc::now(),
        };
        assert!(!event.is_terminal());
        assert_eq!(event.event_type_str(), "feed_closed");
    }

    #[test]
    fn address_accessor() {
        let event = WatchEvent::WatchCancelled {
            watch_id: WatchId::new(),
            address: addr(),
            timestamp: Utc::now(),
        };
        assert_eq!(event.address(), &addr());
    }
}
