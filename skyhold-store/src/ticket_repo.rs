use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{info, warn};

use skyhold_domain::repository::TicketStore;
use skyhold_domain::ticket::generate_pnr;
use skyhold_domain::{BookingError, Ticket, TicketDraft};

const PNR_ATTEMPTS: u32 = 5;

pub struct PgTicketStore {
    pool: PgPool,
}

impl PgTicketStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct TicketRow {
    id: i64,
    flight_id: i64,
    seat_no: String,
    user_id: String,
    price_amount: i64,
    currency: String,
    pnr_code: String,
    payment_ref: String,
    issued_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl From<TicketRow> for Ticket {
    fn from(row: TicketRow) -> Self {
        Ticket {
            id: row.id,
            flight_id: row.flight_id,
            seat_no: row.seat_no,
            user_id: row.user_id,
            price_amount: row.price_amount,
            currency: row.currency,
            pnr_code: row.pnr_code,
            payment_ref: row.payment_ref,
            issued_at: row.issued_at,
            created_at: row.created_at,
        }
    }
}

fn is_seat_conflict(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[async_trait]
impl TicketStore for PgTicketStore {
    async fn issue_ticket(&self, draft: TicketDraft) -> Result<Ticket, BookingError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin ticket transaction")?;

        // Confirm the hold inside the same transaction as the insert; a
        // failure on either side rolls both back and the hold keeps its
        // prior expiry.
        let confirmed = sqlx::query(
            "UPDATE seat_holds
             SET expires_at = NULL, updated_at = now()
             WHERE flight_id = $1 AND seat_no = $2 AND holder_id = $3
               AND expires_at IS NOT NULL AND expires_at > now()",
        )
        .bind(draft.flight_id)
        .bind(&draft.seat_no)
        .bind(&draft.user_id)
        .execute(&mut *tx)
        .await
        .context("failed to confirm hold for ticket")?;

        if confirmed.rows_affected() == 0 {
            return Err(BookingError::NoValidHold);
        }

        // The PNR is sampled inside the transaction. A locator collision
        // hits ON CONFLICT DO NOTHING (zero rows, transaction still
        // usable) and is retried with a fresh sample; a (flight_id,
        // seat_no) collision raises the unique violation and means the
        // seat was sold out from under us.
        let mut attempt = 0;
        let row: TicketRow = loop {
            attempt += 1;
            let pnr = generate_pnr();

            let inserted: Option<TicketRow> = sqlx::query_as(
                r#"
                INSERT INTO tickets
                    (flight_id, seat_no, user_id, price_amount, currency,
                     pnr_code, payment_ref, issued_at, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, now(), now())
                ON CONFLICT (pnr_code) DO NOTHING
                RETURNING id, flight_id, seat_no, user_id, price_amount, currency,
                          pnr_code, payment_ref, issued_at, created_at
                "#,
            )
            .bind(draft.flight_id)
            .bind(&draft.seat_no)
            .bind(&draft.user_id)
            .bind(draft.price_amount)
            .bind(&draft.currency)
            .bind(&pnr)
            .bind(&draft.payment_ref)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|err| {
                if is_seat_conflict(&err) {
                    BookingError::AlreadySold
                } else {
                    BookingError::Storage(
                        anyhow::Error::new(err).context("failed to insert ticket"),
                    )
                }
            })?;

            match inserted {
                Some(row) => break row,
                None if attempt < PNR_ATTEMPTS => {
                    warn!(attempt, "PNR collision, regenerating");
                }
                None => {
                    return Err(BookingError::Storage(anyhow::anyhow!(
                        "exhausted {PNR_ATTEMPTS} PNR generation attempts"
                    )));
                }
            }
        };

        tx.commit().await.context("failed to commit ticket")?;

        info!(
            ticket_id = row.id,
            pnr_code = %row.pnr_code,
            flight_id = row.flight_id,
            seat_no = %row.seat_no,
            "Ticket issued"
        );
        Ok(row.into())
    }

    async fn get_by_seat(
        &self,
        flight_id: i64,
        seat_no: &str,
    ) -> Result<Option<Ticket>, BookingError> {
        let row: Option<TicketRow> = sqlx::query_as(
            "SELECT id, flight_id, seat_no, user_id, price_amount, currency,
                    pnr_code, payment_ref, issued_at, created_at
             FROM tickets WHERE flight_id = $1 AND seat_no = $2",
        )
        .bind(flight_id)
        .bind(seat_no)
        .fetch_optional(&self.pool)
        .await
        .context("failed to get ticket by seat")?;

        Ok(row.map(Into::into))
    }

    async fn list_for_flight(&self, flight_id: i64) -> Result<Vec<Ticket>, BookingError> {
        let rows: Vec<TicketRow> = sqlx::query_as(
            "SELECT id, flight_id, seat_no, user_id, price_amount, currency,
                    pnr_code, payment_ref, issued_at, created_at
             FROM tickets WHERE flight_id = $1",
        )
        .bind(flight_id)
        .fetch_all(&self.pool)
        .await
        .context("failed to list tickets")?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
