//! Watch service: arms, lists and cancels watches.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use super::watcher::{MintWatcher, WatcherContext, WatcherSettings};
use crate::domain::{
    AccountAddress, EventBus, Registration, Rule, SignatureSet, WatchEntry, WatchEvent, WatchId,
    WatchRegistry, WatchSummary,
};
use crate::error::WatchError;
use crate::feed::FeedClient;
use crate::notify::Notifier;
use crate::trigger::{InboundMessage, TriggerClassifier};

/// Result of feeding one trigger into the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TriggerOutcome {
    /// A new watcher was started.
    Armed {
        /// New watch generation.
        watch_id: WatchId,
        /// Watched account.
        address: AccountAddress,
        /// Rule that matched.
        rule_label: String,
    },
    /// The address is already watched; nothing changed.
    AlreadyWatched {
        /// Watched account.
        address: AccountAddress,
    },
    /// The message matched no rule or carried no address.
    Ignored,
}

/// Orchestration layer for the watcher lifecycle.
///
/// Owns references to the process-wide [`WatchRegistry`] and
/// [`SignatureSet`], the feed capability, the notifier and the event bus.
/// Every watcher it starts receives the same collaborators.
#[derive(Debug, Clone)]
pub struct WatchService {
    classifier: Arc<TriggerClassifier>,
    ctx: WatcherContext,
}

impl WatchService {
    /// Creates a new `WatchService`.
    #[must_use]
    pub fn new(
        registry: Arc<WatchRegistry>,
        signatures: Arc<SignatureSet>,
        classifier: Arc<TriggerClassifier>,
        feed: Arc<dyn FeedClient>,
        notifier: Notifier,
        event_bus: EventBus,
        settings: WatcherSettings,
    ) -> Self {
        Self {
            classifier,
            ctx: WatcherContext {
                registry,
                signatures,
                feed,
                notifier,
                event_bus,
                settings: Arc::new(settings),
            },
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.ctx.event_bus
    }

    /// Returns a reference to the inner [`WatchRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<WatchRegistry> {
        &self.ctx.registry
    }

    /// Returns the notifier, for operator replies.
    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.ctx.notifier
    }

    /// Active rule table.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        self.classifier.rules()
    }

    /// Classifies `message` and arms a watch if it is a trigger.
    pub async fn handle_message(&self, message: &InboundMessage) -> TriggerOutcome {
        match self.classifier.classify(message) {
            Some(trigger) => self.on_trigger(trigger.address, &trigger.rule).await,
            None => {
                tracing::trace!("message ignored");
                TriggerOutcome::Ignored
            }
        }
    }

    /// Arms a watch on `address` for `rule` unless one is already live.
    pub async fn on_trigger(&self, address: AccountAddress, rule: &Rule) -> TriggerOutcome {
        let entry = WatchEntry::new(address.clone(), rule);
        let watch_id = entry.watch_id;

        let Registration::Registered(cancel) = self.ctx.registry.try_register(entry.clone()).await
        else {
            tracing::debug!(%address, rule = %rule.label, "address already watched");
            return TriggerOutcome::AlreadyWatched { address };
        };

        let _ = self.ctx.event_bus.publish(WatchEvent::WatchArmed {
            watch_id,
            address: address.clone(),
            rule_label: rule.label.clone(),
            deadline: entry.deadline(),
            timestamp: Utc::now(),
        });
        tracing::info!(%address, rule = %rule.label, %watch_id, timeout_hours = rule.timeout_hours, "watch armed");

        drop(MintWatcher::spawn(entry, cancel, self.ctx.clone()));

        TriggerOutcome::Armed {
            watch_id,
            address,
            rule_label: rule.label.clone(),
        }
    }

    /// Snapshot of all live watches, oldest first.
    pub async fn list(&self) -> Vec<WatchSummary> {
        self.ctx.registry.list().await
    }

    /// Snapshot of one watch.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::WatchNotFound`] if `address` is not watched.
    pub async fn get(&self, address: &AccountAddress) -> Result<WatchSummary, WatchError> {
        self.ctx
            .registry
            .get(address)
            .await
            .ok_or_else(|| WatchError::WatchNotFound(address.to_string()))
    }

    /// Cancels the watch on `address`.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::WatchNotFound`] if `address` is not watched.
    pub async fn cancel(&self, address: &AccountAddress) -> Result<WatchSummary, WatchError> {
        let entry = self
            .ctx
            .registry
            .unregister(address)
            .await
            .ok_or_else(|| WatchError::WatchNotFound(address.to_string()))?;
        tracing::info!(%address, watch_id = %entry.watch_id, "watch cancelled by operator");
        Ok(WatchSummary::from(&entry))
    }

    /// Cancels every live watch; returns how many were cancelled.
    pub async fn cancel_all(&self) -> usize {
        let removed = self.ctx.registry.unregister_all().await;
        tracing::info!(count = removed.len(), "all watches cancelled by operator");
        removed.len()
    }
}
