//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::EventBus;
use crate::service::WatchService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Watch service for all lifecycle operations.
    pub watch_service: Arc<WatchService>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
}

impl AppState {
    /// Builds the state around `watch_service`, sharing its event bus.
    #[must_use]
    pub fn new(watch_service: Arc<WatchService>) -> Self {
        let event_bus = watch_service.event_bus().clone();
        Self {
            watch_service,
            event_bus,
        }
    }
}
