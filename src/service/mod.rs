//! Service layer: watcher lifecycle management.
//!
//! [`WatchService`] is the single entry point for arming, listing and
//! cancelling watches; [`watcher`] holds the per-address state machine.

pub mod watch_service;
pub mod watcher;

pub use watch_service::{TriggerOutcome, WatchService};
pub use watcher::{FeedClosePolicy, WatcherSettings, WatcherState};
