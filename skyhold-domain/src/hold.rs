use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reservation record on a (flight_id, seat_no) key.
///
/// `expires_at` in the future means the hold is active; in the past means
/// it is expired and acquirable by anyone; `None` means it has been
/// confirmed and now pins a sold seat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatHold {
    pub id: i64,
    pub flight_id: i64,
    pub seat_no: String,
    pub holder_id: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SeatHold {
    pub fn is_confirmed(&self) -> bool {
        self.expires_at.is_none()
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(false, |t| t > now)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(false, |t| t <= now)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateHoldRequest {
    pub flight_id: i64,
    pub seat_no: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHoldResponse {
    pub flight_id: i64,
    pub seat_no: String,
    pub holder_id: String,
    pub expires_at: DateTime<Utc>,
}
