use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skyhold_domain::{Flight, SeatHold, Ticket};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightDocument {
    pub id: i64,
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub airline: String,
    pub aircraft: String,
    pub fare_class: String,
    /// Base fare in major units, as exposed on the search wire.
    pub base_price: f64,
}

impl From<&Flight> for FlightDocument {
    fn from(flight: &Flight) -> Self {
        Self {
            id: flight.id,
            origin: flight.origin.clone(),
            destination: flight.destination.clone(),
            departure_time: flight.departure_time,
            arrival_time: flight.arrival_time,
            airline: flight.airline.clone(),
            aircraft: flight.aircraft.clone(),
            fare_class: flight.fare_class.clone(),
            base_price: flight.base_price_cents as f64 / 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldDocument {
    pub id: i64,
    pub flight_id: i64,
    pub seat_no: String,
    pub holder_id: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// "active" or "confirmed".
    pub status: String,
}

impl HoldDocument {
    pub fn from_hold(hold: &SeatHold, status: &str) -> Self {
        Self {
            id: hold.id,
            flight_id: hold.flight_id,
            seat_no: hold.seat_no.clone(),
            holder_id: hold.holder_id.clone(),
            expires_at: hold.expires_at,
            created_at: hold.created_at,
            updated_at: hold.updated_at,
            status: status.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketDocument {
    pub id: i64,
    pub flight_id: i64,
    pub seat_no: String,
    pub user_id: String,
    pub price_amount: i64,
    pub currency: String,
    pub issued_at: DateTime<Utc>,
    pub pnr_code: String,
    pub payment_ref: String,
    pub created_at: DateTime<Utc>,
    pub status: String,
}

impl TicketDocument {
    pub fn from_ticket(ticket: &Ticket, status: &str) -> Self {
        Self {
            id: ticket.id,
            flight_id: ticket.flight_id,
            seat_no: ticket.seat_no.clone(),
            user_id: ticket.user_id.clone(),
            price_amount: ticket.price_amount,
            currency: ticket.currency.clone(),
            issued_at: ticket.issued_at,
            pnr_code: ticket.pnr_code.clone(),
            payment_ref: ticket.payment_ref.clone(),
            created_at: ticket.created_at,
            status: status.to_string(),
        }
    }
}
