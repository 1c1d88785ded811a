//! Process-wide set of transaction signatures already acted upon.
//!
//! The feed delivers at-least-once and the same transaction can mention
//! several watched accounts, so a signature that produced a mint
//! notification is remembered and never produces another one.

use std::collections::{HashSet, VecDeque};

use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Inner {
    members: HashSet<String>,
    order: VecDeque<String>,
}

/// Deduplication set for transaction signatures.
///
/// Retains at most `capacity` signatures; past that the oldest are evicted
/// first. Watchers live for hours and act on a single signature each, so
/// the cap only bounds memory of a long-running process.
#[derive(Debug)]
pub struct SignatureSet {
    inner: RwLock<Inner>,
    capacity: usize,
}

impl SignatureSet {
    /// Creates an empty set retaining up to `capacity` signatures.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            capacity: capacity.max(1),
        }
    }

    /// Returns `true` if `signature` has already been recorded.
    pub async fn seen(&self, signature: &str) -> bool {
        self.inner.read().await.members.contains(signature)
    }

    /// Records `signature`.
    ///
    /// Returns `true` if it was newly inserted, `false` if it was already
    /// present. Membership test and insert happen under one write lock, so
    /// exactly one concurrent caller wins for a given signature.
    pub async fn mark_seen(&self, signature: &str) -> bool {
        let mut inner = self.inner.write().await;
        if !inner.members.insert(signature.to_string()) {
            return false;
        }
        inner.order.push_back(signature.to_string());
        while inner.order.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.members.remove(&oldest);
            }
        }
        true
    }

    /// Number of retained signatures.
    pub async fn len(&self) -> usize {
        self.inner.read().await.members.len()
    }

    /// Returns `true` if no signature is retained.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.members.is_empty()
    }
}

impl Default for SignatureSet {
    fn default() -> Self {
        Self::new(100_000)
    }
}
