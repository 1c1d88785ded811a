//! Per-connection subscription manager.
//!
//! Tracks which account addresses a WebSocket client follows and
//! provides server-side event filtering.

use std::collections::HashSet;

use crate::domain::AccountAddress;

/// Manages the set of address subscriptions for a single WebSocket
/// connection.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    /// Subscribed addresses. If `subscribe_all` is true, this set is ignored.
    addresses: HashSet<AccountAddress>,
    /// Whether the client follows every watch (wildcard `"*"`).
    subscribe_all: bool,
}

impl SubscriptionManager {
    /// Creates a new empty subscription manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds addresses to the subscription set. `wildcard` enables `"*"`.
    pub fn subscribe(&mut self, addresses: &[AccountAddress], wildcard: bool) {
        if wildcard {
            self.subscribe_all = true;
        }
        self.addresses.extend(addresses.iter().cloned());
    }

    /// Removes addresses from the subscription set. `wildcard` clears `"*"`.
    pub fn unsubscribe(&mut self, addresses: &[AccountAddress], wildcard: bool) {
        if wildcard {
            self.subscribe_all = false;
        }
        for address in addresses {
            self.addresses.remove(address);
        }
    }

    /// Returns `true` if events for `address` should be forwarded.
    #[must_use]
    pub fn matches(&self, address: &AccountAddress) -> bool {
        self.subscribe_all || self.addresses.contains(address)
    }

    /// Returns the number of explicitly subscribed addresses.
    #[must_use]
    pub fn count(&self) -> usize {
        self.addresses.len()
    }

    /// Returns `true` if the wildcard subscription is active.
    #[must_use]
    pub fn is_subscribed_all(&self) -> bool {
        self.subscribe_all
    }
}
