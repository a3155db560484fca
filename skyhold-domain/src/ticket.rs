use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const PNR_LENGTH: usize = 6;
pub const PNR_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A durable record of sale. Coexists with a confirmed hold on the same
/// (flight_id, seat_no).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub flight_id: i64,
    pub seat_no: String,
    pub user_id: String,
    /// Price in integer minor units (cents).
    pub price_amount: i64,
    pub currency: String,
    pub pnr_code: String,
    pub payment_ref: String,
    pub issued_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to issue a ticket except the PNR, which the store
/// generates inside the issuing transaction.
#[derive(Debug, Clone)]
pub struct TicketDraft {
    pub flight_id: i64,
    pub seat_no: String,
    pub user_id: String,
    pub price_amount: i64,
    pub currency: String,
    pub payment_ref: String,
}

/// Sample a record locator: 6 characters from [A-Z0-9]. Uniqueness is
/// enforced by the store; collisions are retried at the call site.
pub fn generate_pnr() -> String {
    let mut rng = rand::thread_rng();
    (0..PNR_LENGTH)
        .map(|_| PNR_ALPHABET[rng.gen_range(0..PNR_ALPHABET.len())] as char)
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmTicketRequest {
    pub flight_id: i64,
    pub seat_no: String,
    pub payment_ref: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmTicketResponse {
    pub ticket_id: i64,
    pub flight_id: i64,
    pub seat_no: String,
    pub pnr_code: String,
    pub payment_ref: String,
}
