//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` streams watch lifecycle events to
//! operators, filtered per connection by address (or `"*"`), and accepts
//! a small command set for listing and cancelling watches.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;

use axum::Router;
use axum::routing::get;

use crate::app_state::AppState;

/// WebSocket route mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new().route("/ws", get(handler::ws_handler))
}
