use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::info;

use skyhold_domain::repository::FlightStore;
use skyhold_domain::{BookingError, Flight, NewFlight, Seat, SeatAssignment};

pub struct PgFlightStore {
    pool: PgPool,
}

impl PgFlightStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct FlightRow {
    id: i64,
    origin: String,
    destination: String,
    departure_time: DateTime<Utc>,
    arrival_time: DateTime<Utc>,
    airline: String,
    aircraft: String,
    fare_class: String,
    base_price_cents: i64,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<FlightRow> for Flight {
    fn from(row: FlightRow) -> Self {
        Flight {
            id: row.id,
            origin: row.origin,
            destination: row.destination,
            departure_time: row.departure_time,
            arrival_time: row.arrival_time,
            airline: row.airline,
            aircraft: row.aircraft,
            fare_class: row.fare_class,
            base_price_cents: row.base_price_cents,
            currency: row.currency,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct SeatRow {
    id: i64,
    flight_id: i64,
    seat_no: String,
    class: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SeatRow> for Seat {
    fn from(row: SeatRow) -> Self {
        Seat {
            id: row.id,
            flight_id: row.flight_id,
            seat_no: row.seat_no,
            class: row.class,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl FlightStore for PgFlightStore {
    async fn create_flight(&self, flight: NewFlight) -> Result<Flight, BookingError> {
        let row: FlightRow = sqlx::query_as(
            r#"
            INSERT INTO flights
                (origin, destination, departure_time, arrival_time,
                 airline, aircraft, fare_class, base_price_cents, currency,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now(), now())
            RETURNING id, origin, destination, departure_time, arrival_time,
                      airline, aircraft, fare_class, base_price_cents, currency,
                      created_at, updated_at
            "#,
        )
        .bind(&flight.origin)
        .bind(&flight.destination)
        .bind(flight.departure_time)
        .bind(flight.arrival_time)
        .bind(&flight.airline)
        .bind(&flight.aircraft)
        .bind(&flight.fare_class)
        .bind(flight.base_price_cents)
        .bind(&flight.currency)
        .fetch_one(&self.pool)
        .await
        .context("failed to create flight")?;

        info!(
            flight_id = row.id,
            origin = %row.origin,
            destination = %row.destination,
            "Flight created"
        );
        Ok(row.into())
    }

    async fn get_flight(&self, id: i64) -> Result<Option<Flight>, BookingError> {
        let row: Option<FlightRow> = sqlx::query_as(
            "SELECT id, origin, destination, departure_time, arrival_time,
                    airline, aircraft, fare_class, base_price_cents, currency,
                    created_at, updated_at
             FROM flights WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to get flight")?;

        Ok(row.map(Into::into))
    }

    async fn create_seats(
        &self,
        flight_id: i64,
        seats: &[SeatAssignment],
    ) -> Result<(), BookingError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("failed to begin seat transaction")?;

        for seat in seats {
            sqlx::query(
                "INSERT INTO seats (flight_id, seat_no, class, created_at, updated_at)
                 VALUES ($1, $2, $3, now(), now())",
            )
            .bind(flight_id)
            .bind(&seat.seat_no)
            .bind(&seat.class)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to create seat {}", seat.seat_no))?;
        }

        tx.commit().await.context("failed to commit seats")?;

        info!(flight_id, count = seats.len(), "Seats created");
        Ok(())
    }

    async fn list_seats(&self, flight_id: i64) -> Result<Vec<Seat>, BookingError> {
        let rows: Vec<SeatRow> = sqlx::query_as(
            "SELECT id, flight_id, seat_no, class, created_at, updated_at
             FROM seats WHERE flight_id = $1 ORDER BY id",
        )
        .bind(flight_id)
        .fetch_all(&self.pool)
        .await
        .context("failed to list seats")?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
