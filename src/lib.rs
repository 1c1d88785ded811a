//! # mint-watch-gateway
//!
//! Watches Solana accounts named in exchange transfer notifications and
//! reports when one of them initializes a token mint.
//!
//! A transfer notification that matches a [`domain::Rule`] arms a watch on
//! the account it links to. Each watch opens its own `logsSubscribe`
//! subscription, keeps it alive with heartbeats, and ends on the first
//! fresh `InitializeMint` log, on the rule's deadline, or when the feed
//! fails. Outcomes go to the rule's Telegram chat; every lifecycle
//! transition is broadcast to operator WebSocket clients and the audit
//! trail.
//!
//! ## Architecture
//!
//! ```text
//! Telegram getUpdates ─┐        Operators (HTTP, WebSocket)
//!                      │            │
//!                      ├── TriggerClassifier (trigger/)
//!                      │            │
//!                      └──▶ WatchService (service/) ◀── REST (api/), WS (ws/)
//!                               │
//!                 ┌─────────────┼──────────────┐
//!                 │             │              │
//!          WatchRegistry   MintWatcher ×N   EventBus (domain/)
//!          SignatureSet     │       │          │
//!                           │       │          └── audit trail (persistence/)
//!                 FeedClient (feed/)  Notifier (notify/) ── TelegramClient (telegram/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod feed;
pub mod notify;
pub mod persistence;
pub mod service;
pub mod telegram;
pub mod trigger;
pub mod ws;
