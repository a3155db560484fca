use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scheduled flight. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flight {
    pub id: i64,
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub airline: String,
    pub aircraft: String,
    pub fare_class: String,
    /// Base fare in integer minor units (cents).
    pub base_price_cents: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Flight attributes prior to insertion.
#[derive(Debug, Clone)]
pub struct NewFlight {
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub airline: String,
    pub aircraft: String,
    pub fare_class: String,
    pub base_price_cents: i64,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Seat {
    pub id: i64,
    pub flight_id: i64,
    pub seat_no: String,
    pub class: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A (seat_no, class) pair to be attached to a flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatAssignment {
    pub seat_no: String,
    pub class: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeatConfiguration {
    pub economy_rows: u32,
    #[serde(default)]
    pub business_rows: u32,
    #[serde(default)]
    pub first_class_rows: u32,
    pub seats_per_row: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateFlightRequest {
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub airline: String,
    pub aircraft: String,
    pub fare_class: String,
    /// Base fare in major units, converted to cents at insertion.
    pub base_price: f64,
    #[serde(default)]
    pub seat_config: Option<SeatConfiguration>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFlightResponse {
    pub id: i64,
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub airline: String,
    pub aircraft: String,
    pub fare_class: String,
    pub base_price: f64,
    pub seats_created: usize,
    pub created_at: DateTime<Utc>,
}
