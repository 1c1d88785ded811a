//! Domain layer: core types, watch registry, signature dedup, and events.
//!
//! This module contains the process-owned shared state of the watcher
//! lifecycle manager (the [`WatchRegistry`] and the [`SignatureSet`]), the
//! declarative [`Rule`] table row, and the [`EventBus`] that broadcasts
//! lifecycle transitions.

pub mod account_address;
pub mod event_bus;
pub mod rule;
pub mod signature_set;
pub mod watch_entry;
pub mod watch_event;
pub mod watch_id;
pub mod watch_registry;

pub use account_address::AccountAddress;
pub use event_bus::EventBus;
pub use rule::Rule;
pub use signature_set::SignatureSet;
pub use watch_entry::{WatchEntry, WatchSummary};
pub use watch_event::WatchEvent;
pub use watch_id::WatchId;
pub use watch_registry::{Cancellation, Registration, WatchRegistry};
