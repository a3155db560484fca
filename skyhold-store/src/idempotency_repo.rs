use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::debug;

use skyhold_domain::repository::IdempotencyStore;
use skyhold_domain::{BookingError, IdempotencyRecord, NewIdempotencyRecord};

pub struct PgIdempotencyStore {
    pool: PgPool,
}

impl PgIdempotencyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct IdempotencyRow {
    request_id: String,
    route: String,
    user_id: String,
    response_hash: String,
    response_body: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl From<IdempotencyRow> for IdempotencyRecord {
    fn from(row: IdempotencyRow) -> Self {
        IdempotencyRecord {
            request_id: row.request_id,
            route: row.route,
            user_id: row.user_id,
            response_hash: row.response_hash,
            response_body: row.response_body,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl IdempotencyStore for PgIdempotencyStore {
    async fn find(
        &self,
        request_id: &str,
        route: &str,
    ) -> Result<Option<IdempotencyRecord>, BookingError> {
        let row: Option<IdempotencyRow> = sqlx::query_as(
            "SELECT request_id, route, user_id, response_hash, response_body, created_at
             FROM idempotency_keys WHERE request_id = $1 AND route = $2",
        )
        .bind(request_id)
        .bind(route)
        .fetch_optional(&self.pool)
        .await
        .context("failed to check idempotency key")?;

        Ok(row.map(Into::into))
    }

    async fn record(&self, record: NewIdempotencyRecord) -> Result<(), BookingError> {
        // First writer wins; a racing duplicate is not an error.
        sqlx::query(
            "INSERT INTO idempotency_keys
                 (request_id, route, user_id, response_hash, response_body, created_at)
             VALUES ($1, $2, $3, $4, $5, now())
             ON CONFLICT (request_id, route) DO NOTHING",
        )
        .bind(&record.request_id)
        .bind(&record.route)
        .bind(&record.user_id)
        .bind(&record.response_hash)
        .bind(&record.response_body)
        .execute(&self.pool)
        .await
        .context("failed to store idempotency key")?;

        Ok(())
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, BookingError> {
        let result = sqlx::query("DELETE FROM idempotency_keys WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .context("failed to purge idempotency keys")?;

        let purged = result.rows_affected();
        debug!(purged, "Idempotency keys purged");
        Ok(purged)
    }
}
