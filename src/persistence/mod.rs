//! Persistence layer: audit trail of watch lifecycle events.
//!
//! An audit task subscribes to the [`EventBus`] and hands every event to an
//! [`AuditSink`]: a plain text file ([`FileAuditLog`]) or a PostgreSQL
//! `watch_events` table ([`PostgresAuditLog`]). Lag and write failures are
//! logged and skipped; the watchers never wait on the audit trail.

pub mod file;
pub mod models;
pub mod postgres;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::domain::{EventBus, WatchEvent};
use crate::error::WatchError;

pub use file::FileAuditLog;
pub use models::AuditRecord;
pub use postgres::PostgresAuditLog;

/// Durable destination for audit records.
#[async_trait]
pub trait AuditSink: Send + Sync + fmt::Debug {
    /// Appends one record.
    ///
    /// # Errors
    ///
    /// Returns [`WatchError::PersistenceError`] on write failure.
    async fn record(&self, record: &AuditRecord) -> Result<(), WatchError>;
}

/// Subscribes to `event_bus` and starts the audit task.
#[must_use]
pub fn spawn_audit(event_bus: &EventBus, sink: Arc<dyn AuditSink>) -> JoinHandle<()> {
    let rx = event_bus.subscribe();
    tokio::spawn(run_audit(rx, sink))
}

/// Drains `rx` into `sink` until the bus closes.
pub async fn run_audit(mut rx: broadcast::Receiver<WatchEvent>, sink: Arc<dyn AuditSink>) {
    loop {
        match rx.recv().await {
            Ok(event) => {
                let record = AuditRecord::from_event(&event);
                if let Err(e) = sink.record(&record).await {
                    tracing::warn!(
                        error = %e,
                        event_type = %record.event_type,
                        address = %record.address,
                        "audit write failed"
                    );
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!(skipped = n, "audit trail lagged behind event bus");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    tracing::debug!("audit task stopped");
}
