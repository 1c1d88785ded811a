//! PostgreSQL audit sink.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::AuditSink;
use super::models::AuditRecord;
use crate::error::WatchError;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS watch_events (\
    id BIGSERIAL PRIMARY KEY, \
    watch_id UUID NOT NULL, \
    address TEXT NOT NULL, \
    event_type TEXT NOT NULL, \
    payload JSONB NOT NULL, \
    recorded_at TIMESTAMPTZ NOT NULL DEFAULT now())";

const CREATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS watch_events_address_idx ON watch_events (address, recorded_at)";

/// PostgreSQL-backed audit trail using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresAuditLog {
    pool: PgPool,
}

impl PostgresAuditLog {
    /// Creates an audit log over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `database_url` and makes sure the table exists.
    ///
    /// # Errors
    ///
    /// Returns a [`WatchError::PersistenceError`] on connection or DDL
    /// failure.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, WatchError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(database_url)
            .await?;
        let log = Self::new(pool);
        log.ensure_schema().await?;
        Ok(log)
    }

    /// Creates the `watch_events` table and its index if missing.
    ///
    /// # Errors
    ///
    /// Returns a [`WatchError::PersistenceError`] on database failure.
    pub async fn ensure_schema(&self) -> Result<(), WatchError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        sqlx::query(CREATE_INDEX).execute(&self.pool).await?;
        Ok(())
    }

    /// Appends a record and returns its row id.
    ///
    /// # Errors
    ///
    /// Returns a [`WatchError::PersistenceError`] on database failure.
    pub async fn save_record(&self, record: &AuditRecord) -> Result<i64, WatchError> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO watch_events (watch_id, address, event_type, payload, recorded_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(record.watch_id)
        .bind(&record.address)
        .bind(&record.event_type)
        .bind(&record.payload)
        .bind(record.recorded_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }
}

#[async_trait]
impl AuditSink for PostgresAuditLog {
    async fn record(&self, record: &AuditRecord) -> Result<(), WatchError> {
        self.save_record(record).await.map(|_| ())
    }
}
