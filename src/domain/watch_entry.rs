//! Registry entry describing one armed watch.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{AccountAddress, Rule, WatchId};

/// A watched address with the rule metadata that armed it.
///
/// Immutable once created; a re-armed address gets a new entry with a new
/// [`WatchId`].
#[derive(Debug, Clone)]
pub struct WatchEntry {
    /// Identifier of this watch generation.
    pub watch_id: WatchId,

    /// Watched account (registry key).
    pub address: AccountAddress,

    /// Label of the rule that armed the watch.
    pub rule_label: String,

    /// Registration timestamp.
    pub armed_at: DateTime<Utc>,

    /// Watch lifetime, fixed by the rule.
    pub timeout: Duration,

    /// Destination for outcome notifications.
    pub notify_channel: String,

    /// Whether the armed notice is sent.
    pub announce_armed: bool,
}

impl WatchEntry {
    /// Creates an entry armed now by `rule`.
    #[must_use]
    pub fn new(address: AccountAddress, rule: &Rule) -> Self {
        Self {
            watch_id: WatchId::new(),
            address,
            rule_label: rule.label.clone(),
            armed_at: Utc::now(),
            timeout: rule.timeout(),
            notify_channel: rule.notify_channel.clone(),
            announce_armed: rule.announce_armed,
        }
    }

    /// Wall-clock deadline (`armed_at + timeout`).
    #[must_use]
    pub fn deadline(&self) -> DateTime<Utc> {
        chrono::Duration::from_std(self.timeout)
            .ok()
            .and_then(|d| self.armed_at.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

/// Lightweight snapshot of an entry for operator listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchSummary {
    /// Watch identifier.
    pub watch_id: WatchId,
    /// Watched account.
    pub address: AccountAddress,
    /// Arming rule label.
    pub rule_label: String,
    /// Registration timestamp.
    pub armed_at: DateTime<Utc>,
    /// Expiry timestamp.
    pub deadline: DateTime<Utc>,
}

impl From<&WatchEntry> for WatchSummary {
    fn from(entry: &WatchEntry) -> Self {
        Self {
            watch_id: entry.watch_id,
            address: entry.address.clone(),
            rule_label: entry.rule_label.clone(),
            armed_at: entry.armed_at,
            deadline: entry.deadline(),
        }
    }
}
