use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::info;

use skyhold_domain::{FlightSearchQuery, FlightSearchResult};

use crate::documents::{FlightDocument, HoldDocument, TicketDocument};
use crate::{ProjectionError, SearchIndex};

/// Postgres-backed projection. Runs on its own pool so the read model can
/// live in a separate database from the authoritative store.
#[derive(Clone)]
pub struct PgSearchIndex {
    pool: PgPool,
}

#[derive(FromRow)]
struct FlightDocRow {
    id: i64,
    origin: String,
    destination: String,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    airline: String,
    aircraft: String,
    fare_class: String,
    base_price: f64,
}

impl From<FlightDocRow> for FlightSearchResult {
    fn from(row: FlightDocRow) -> Self {
        FlightSearchResult {
            id: row.id,
            origin: row.origin,
            destination: row.destination,
            departure_time: row.departure_time,
            arrival_time: row.arrival_time,
            airline: row.airline,
            aircraft: row.aircraft,
            fare_class: row.fare_class,
            base_price: row.base_price,
            available_seats: 0,
        }
    }
}

impl PgSearchIndex {
    pub async fn connect(url: &str) -> Result<Self, ProjectionError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the document tables if missing. The projection owns its
    /// schema the way a search service owns its index mappings.
    pub async fn ensure_schema(&self) -> Result<(), ProjectionError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS flight_docs (
                id             BIGINT PRIMARY KEY,
                origin         TEXT NOT NULL,
                destination    TEXT NOT NULL,
                departure_time TIMESTAMPTZ NOT NULL,
                arrival_time   TIMESTAMPTZ NOT NULL,
                airline        TEXT NOT NULL,
                aircraft       TEXT NOT NULL,
                fare_class     TEXT NOT NULL,
                base_price     DOUBLE PRECISION NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS flight_docs_route_departure_idx
             ON flight_docs (origin, destination, departure_time)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS hold_docs (
                id         BIGINT PRIMARY KEY,
                flight_id  BIGINT NOT NULL,
                seat_no    TEXT NOT NULL,
                holder_id  TEXT NOT NULL,
                expires_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL,
                status     TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS ticket_docs (
                id           BIGINT PRIMARY KEY,
                flight_id    BIGINT NOT NULL,
                seat_no      TEXT NOT NULL,
                user_id      TEXT NOT NULL,
                price_amount BIGINT NOT NULL,
                currency     TEXT NOT NULL,
                issued_at    TIMESTAMPTZ NOT NULL,
                pnr_code     TEXT NOT NULL,
                payment_ref  TEXT NOT NULL,
                created_at   TIMESTAMPTZ NOT NULL,
                status       TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("Search projection schema verified");
        Ok(())
    }
}

#[async_trait]
impl SearchIndex for PgSearchIndex {
    async fn upsert_flight(&self, doc: FlightDocument) -> Result<(), ProjectionError> {
        sqlx::query(
            r#"
            INSERT INTO flight_docs
                (id, origin, destination, departure_time, arrival_time,
                 airline, aircraft, fare_class, base_price)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                origin = EXCLUDED.origin,
                destination = EXCLUDED.destination,
                departure_time = EXCLUDED.departure_time,
                arrival_time = EXCLUDED.arrival_time,
                airline = EXCLUDED.airline,
                aircraft = EXCLUDED.aircraft,
                fare_class = EXCLUDED.fare_class,
                base_price = EXCLUDED.base_price
            "#,
        )
        .bind(doc.id)
        .bind(&doc.origin)
        .bind(&doc.destination)
        .bind(doc.departure_time)
        .bind(doc.arrival_time)
        .bind(&doc.airline)
        .bind(&doc.aircraft)
        .bind(&doc.fare_class)
        .bind(doc.base_price)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert_hold(&self, doc: HoldDocument) -> Result<(), ProjectionError> {
        sqlx::query(
            r#"
            INSERT INTO hold_docs
                (id, flight_id, seat_no, holder_id, expires_at,
                 created_at, updated_at, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                holder_id = EXCLUDED.holder_id,
                expires_at = EXCLUDED.expires_at,
                updated_at = EXCLUDED.updated_at,
                status = EXCLUDED.status
            "#,
        )
        .bind(doc.id)
        .bind(doc.flight_id)
        .bind(&doc.seat_no)
        .bind(&doc.holder_id)
        .bind(doc.expires_at)
        .bind(doc.created_at)
        .bind(doc.updated_at)
        .bind(&doc.status)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_hold_status(&self, hold_id: i64, status: &str) -> Result<(), ProjectionError> {
        sqlx::query("UPDATE hold_docs SET status = $2, updated_at = now() WHERE id = $1")
            .bind(hold_id)
            .bind(status)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_hold(&self, hold_id: i64) -> Result<(), ProjectionError> {
        sqlx::query("DELETE FROM hold_docs WHERE id = $1")
            .bind(hold_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn upsert_ticket(&self, doc: TicketDocument) -> Result<(), ProjectionError> {
        sqlx::query(
            r#"
            INSERT INTO ticket_docs
                (id, flight_id, seat_no, user_id, price_amount, currency,
                 issued_at, pnr_code, payment_ref, created_at, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO UPDATE SET
                price_amount = EXCLUDED.price_amount,
                payment_ref = EXCLUDED.payment_ref,
                status = EXCLUDED.status
            "#,
        )
        .bind(doc.id)
        .bind(doc.flight_id)
        .bind(&doc.seat_no)
        .bind(&doc.user_id)
        .bind(doc.price_amount)
        .bind(&doc.currency)
        .bind(doc.issued_at)
        .bind(&doc.pnr_code)
        .bind(&doc.payment_ref)
        .bind(doc.created_at)
        .bind(&doc.status)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn search_flights(
        &self,
        query: &FlightSearchQuery,
    ) -> Result<(Vec<FlightSearchResult>, i64), ProjectionError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM flight_docs");
        push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new(
            "SELECT id, origin, destination, departure_time, arrival_time, \
             airline, aircraft, fare_class, base_price FROM flight_docs",
        );
        push_filters(&mut select, query);
        select.push(" ORDER BY departure_time ASC");
        select.push(" LIMIT ").push_bind(i64::from(query.size));
        select.push(" OFFSET ").push_bind(query.offset());

        let rows: Vec<FlightDocRow> = select.build_query_as().fetch_all(&self.pool).await?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }
}

/// AND of the term filters plus the departure-day range; shared by the
/// count and select arms of a search.
fn push_filters<'args>(builder: &mut QueryBuilder<'args, Postgres>, query: &FlightSearchQuery) {
    let (window_start, window_end) = query.departure_window();

    builder.push(" WHERE origin = ").push_bind(query.origin.clone());
    builder.push(" AND destination = ").push_bind(query.destination.clone());
    builder.push(" AND departure_time >= ").push_bind(window_start);
    builder.push(" AND departure_time <= ").push_bind(window_end);
    if let Some(fare_class) = &query.fare_class {
        builder.push(" AND fare_class = ").push_bind(fare_class.clone());
    }
    if let Some(airline) = &query.airline {
        builder.push(" AND airline = ").push_bind(airline.clone());
    }
}
