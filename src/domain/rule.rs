//! Declarative trigger rules.
//!
//! A [`Rule`] says which inbound messages arm a watch, how long the watch
//! lives, and where its outcome messages go. The whole table is consumed by
//! a single [`crate::trigger::TriggerClassifier`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::WatchError;

/// One row of the rule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Rule {
    /// Human-readable label used in notifications (e.g. `"Kucoin 1"`).
    pub label: String,

    /// Substring the inbound message must contain (counterparty marker).
    pub match_text: String,

    /// Transfer amount the message must contain, as written (e.g. `"99.99"`).
    pub amount: String,

    /// Lifetime of a watch armed by this rule, in hours.
    pub timeout_hours: u64,

    /// Whether an "armed" notice is sent when the subscription opens.
    #[serde(default = "default_announce_armed")]
    pub announce_armed: bool,

    /// Destination channel (Telegram chat id) for outcome messages.
    pub notify_channel: String,
}

fn default_announce_armed() -> bool {
    true
}

impl Rule {
    /// Returns `true` if `text` carries both the counterparty marker and
    /// the amount of this rule.
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        text.contains(&self.match_text) && text.contains(&self.amount)
    }

    /// Watch lifetime as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_hours.saturating_mul(3600))
    }

    /// Checks that the rule can actually match and route.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::InvalidRule`] if a required field is empty or
    /// the timeout is zero.
    pub fn validate(&self) -> Result<(), WatchError> {
        if self.label.trim().is_empty() {
            return Err(WatchError::InvalidRule("label must not be empty".to_string()));
        }
        if self.match_text.is_empty() || self.amount.is_empty() {
            return Err(WatchError::InvalidRule(format!(
                "rule {}: match_text and amount are required",
                self.label
            )));
        }
        if self.timeout_hours == 0 {
            return Err(WatchError::InvalidRule(format!(
                "rule {}: timeout_hours must be positive",
                self.label
            )));
        }
        if self.notify_channel.trim().is_empty() {
            return Err(WatchError::InvalidRule(format!(
                "rule {}: notify_channel is not configured",
                self.label
            )));
        }
        Ok(())
    }
}
