use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{debug, info};

use skyhold_domain::repository::SeatLockStore;
use skyhold_domain::{BookingError, SeatHold};

/// The seat lock engine. Every state change on a (flight_id, seat_no) key
/// goes through a single predicated statement so contention is decided by
/// the database, never by a read-then-write in this process.
pub struct PgSeatLockStore {
    pool: PgPool,
}

impl PgSeatLockStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct HoldRow {
    id: i64,
    flight_id: i64,
    seat_no: String,
    holder_id: String,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<HoldRow> for SeatHold {
    fn from(row: HoldRow) -> Self {
        SeatHold {
            id: row.id,
            flight_id: row.flight_id,
            seat_no: row.seat_no,
            holder_id: row.holder_id,
            expires_at: row.expires_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl SeatLockStore for PgSeatLockStore {
    async fn acquire(
        &self,
        flight_id: i64,
        seat_no: &str,
        holder_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), BookingError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin acquire transaction")?;

        // The sold check and the CAS share one transaction so a ticket
        // committed between them cannot be missed.
        let (sold,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM tickets WHERE flight_id = $1 AND seat_no = $2)",
        )
        .bind(flight_id)
        .bind(seat_no)
        .fetch_one(&mut *tx)
        .await
        .context("failed to check ticket existence")?;

        if sold {
            return Err(BookingError::AlreadySold);
        }

        // Compare-and-set: insert wins an empty cell; the update arm takes
        // over only when the requester already owns the (unconfirmed) hold
        // or the current hold has expired. Zero rows affected means an
        // active hold belongs to someone else. A confirmed hold
        // (expires_at IS NULL) is terminal for everyone, owner included.
        let result = sqlx::query(
            r#"
            INSERT INTO seat_holds
                (flight_id, seat_no, holder_id, expires_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, now(), now())
            ON CONFLICT (flight_id, seat_no) DO UPDATE SET
                holder_id = EXCLUDED.holder_id,
                expires_at = EXCLUDED.expires_at,
                updated_at = now()
            WHERE (seat_holds.holder_id = $3 AND seat_holds.expires_at IS NOT NULL)
               OR (seat_holds.expires_at IS NOT NULL AND seat_holds.expires_at < now())
            "#,
        )
        .bind(flight_id)
        .bind(seat_no)
        .bind(holder_id)
        .bind(expires_at)
        .execute(&mut *tx)
        .await
        .context("failed to upsert seat hold")?;

        if result.rows_affected() == 0 {
            return Err(BookingError::HeldByAnother);
        }

        tx.commit().await.context("failed to commit acquire")?;

        info!(flight_id, seat_no, holder_id, %expires_at, "Seat hold acquired");
        Ok(())
    }

    async fn confirm(
        &self,
        flight_id: i64,
        seat_no: &str,
        holder_id: &str,
    ) -> Result<(), BookingError> {
        let result = sqlx::query(
            "UPDATE seat_holds
             SET expires_at = NULL, updated_at = now()
             WHERE flight_id = $1 AND seat_no = $2 AND holder_id = $3
               AND expires_at IS NOT NULL AND expires_at > now()",
        )
        .bind(flight_id)
        .bind(seat_no)
        .bind(holder_id)
        .execute(&self.pool)
        .await
        .context("failed to confirm seat hold")?;

        if result.rows_affected() == 0 {
            return Err(BookingError::NoValidHold);
        }

        info!(flight_id, seat_no, holder_id, "Seat hold confirmed");
        Ok(())
    }

    async fn release(
        &self,
        flight_id: i64,
        seat_no: &str,
        holder_id: &str,
    ) -> Result<(), BookingError> {
        sqlx::query(
            "DELETE FROM seat_holds
             WHERE flight_id = $1 AND seat_no = $2 AND holder_id = $3
               AND expires_at IS NOT NULL",
        )
        .bind(flight_id)
        .bind(seat_no)
        .bind(holder_id)
        .execute(&self.pool)
        .await
        .context("failed to release seat hold")?;

        info!(flight_id, seat_no, holder_id, "Seat hold released");
        Ok(())
    }

    async fn reclaim_expired(&self) -> Result<u64, BookingError> {
        let result = sqlx::query(
            "DELETE FROM seat_holds
             WHERE expires_at IS NOT NULL AND expires_at < now()",
        )
        .execute(&self.pool)
        .await
        .context("failed to reclaim expired holds")?;

        let reclaimed = result.rows_affected();
        debug!(reclaimed, "Expired holds reclaimed");
        Ok(reclaimed)
    }

    async fn get_hold(
        &self,
        flight_id: i64,
        seat_no: &str,
    ) -> Result<Option<SeatHold>, BookingError> {
        let row: Option<HoldRow> = sqlx::query_as(
            "SELECT id, flight_id, seat_no, holder_id, expires_at, created_at, updated_at
             FROM seat_holds WHERE flight_id = $1 AND seat_no = $2",
        )
        .bind(flight_id)
        .bind(seat_no)
        .fetch_optional(&self.pool)
        .await
        .context("failed to get seat hold")?;

        Ok(row.map(Into::into))
    }

    async fn list_holds(&self, flight_id: i64) -> Result<Vec<SeatHold>, BookingError> {
        let rows: Vec<HoldRow> = sqlx::query_as(
            "SELECT id, flight_id, seat_no, holder_id, expires_at, created_at, updated_at
             FROM seat_holds WHERE flight_id = $1",
        )
        .bind(flight_id)
        .fetch_all(&self.pool)
        .await
        .context("failed to list seat holds")?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
