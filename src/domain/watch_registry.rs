//! Concurrent address → watcher map enforcing one watch per address.
//!
//! [`WatchRegistry`] stores one handle per watched address behind a single
//! [`tokio::sync::RwLock`]. The handle owns the sending half of the
//! watcher's cancellation signal, so removing an entry is what cancels a
//! watcher; no caller reaches into a watcher directly.

use std::collections::HashMap;

use tokio::sync::{RwLock, oneshot};

use super::watch_entry::{WatchEntry, WatchSummary};
use super::{AccountAddress, WatchId};

/// Registry-side handle of a live watcher.
#[derive(Debug)]
struct WatchHandle {
    entry: WatchEntry,
    // Dropping the sender resolves the watcher's `Cancellation`.
    _cancel: oneshot::Sender<()>,
}

/// Watcher-side view of its cancellation signal.
///
/// Resolves once the registry entry is removed by anyone other than the
/// watcher itself (operator cancel, bulk cancel, registry drop).
#[derive(Debug)]
pub struct Cancellation(oneshot::Receiver<()>);

impl Cancellation {
    /// Waits until the watch is cancelled.
    ///
    /// Must not be polled again after it has completed.
    pub async fn cancelled(&mut self) {
        let _ = (&mut self.0).await;
    }
}

/// Outcome of [`WatchRegistry::try_register`].
#[derive(Debug)]
pub enum Registration {
    /// The address was free; the watcher should start with this signal.
    Registered(Cancellation),
    /// A live watcher already covers the address; nothing was changed.
    AlreadyWatched,
}

/// Central store of all live watches.
///
/// # Concurrency
///
/// Every mutation takes the write lock, so check-and-insert is atomic and
/// two concurrent triggers for one address cannot both register.
#[derive(Debug)]
pub struct WatchRegistry {
    watches: RwLock<HashMap<AccountAddress, WatchHandle>>,
}

impl WatchRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            watches: RwLock::new(HashMap::new()),
        }
    }

    /// Registers `entry` unless its address is already watched.
    pub async fn try_register(&self, entry: WatchEntry) -> Registration {
        let mut map = self.watches.write().await;
        if map.contains_key(&entry.address) {
            return Registration::AlreadyWatched;
        }
        let (tx, rx) = oneshot::channel();
        map.insert(
            entry.address.clone(),
            WatchHandle {
                entry,
                _cancel: tx,
            },
        );
        Registration::Registered(Cancellation(rx))
    }

    /// Removes and cancels the watcher for `address`.
    ///
    /// Idempotent: returns `None` when nothing was registered.
    pub async fn unregister(&self, address: &AccountAddress) -> Option<WatchEntry> {
        let mut map = self.watches.write().await;
        map.remove(address).map(|handle| handle.entry)
    }

    /// Removes the entry for `address` only if it still belongs to
    /// `watch_id`. Used by a watcher on its own terminal transition.
    ///
    /// Returns `true` if an entry was removed.
    pub async fn release(&self, address: &AccountAddress, watch_id: WatchId) -> bool {
        let mut map = self.watches.write().await;
        match map.get(address) {
            Some(handle) if handle.entry.watch_id == watch_id => {
                map.remove(address);
                true
            }
            _ => false,
        }
    }

    /// Cancels every live watcher and empties the registry.
    pub async fn unregister_all(&self) -> Vec<WatchEntry> {
        let mut map = self.watches.write().await;
        map.drain().map(|(_, handle)| handle.entry).collect()
    }

    /// Returns summaries of all live watches, oldest first.
    pub async fn list(&self) -> Vec<WatchSummary> {
        let map = self.watches.read().await;
        let mut summaries: Vec<WatchSummary> = map
            .values()
            .map(|handle| WatchSummary::from(&handle.entry))
            .collect();
        summaries.sort_by(|a, b| {
            a.armed_at
                .cmp(&b.armed_at)
                .then_with(|| a.address.cmp(&b.address))
        });
        summaries
    }

    /// Returns the summary for one address, if watched.
    pub async fn get(&self, address: &AccountAddress) -> Option<WatchSummary> {
        let map = self.watches.read().await;
        map.get(address).map(|handle| WatchSummary::from(&handle.entry))
    }

    /// Returns `true` if `address` is currently watched.
    pub async fn contains(&self, address: &AccountAddress) -> bool {
        self.watches.read().await.contains_key(address)
    }

    /// Returns the number of live watches.
    pub async fn len(&self) -> usize {
        self.watches.read().await.len()
    }

    /// Returns `true` if nothing is watched.
    pub async fn is_empty(&self) -> bool {
        self.watches.read().await.is_empty()
    }
}

impl Default for WatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}
