use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The state of a seat, derived from authoritative hold and ticket records.
/// The wire JSON is derived from the variant: the tag becomes the `status`
/// field and an active hold carries its expiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SeatState {
    Available,
    Held {
        #[serde(skip_serializing_if = "Option::is_none")]
        expires_at: Option<DateTime<Utc>>,
    },
    Sold,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatAvailability {
    pub seat_no: String,
    pub class: String,
    #[serde(flatten)]
    pub state: SeatState,
    /// Flight base fare in integer minor units (cents).
    pub price: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn wire_shape_of_each_state() {
        let expires = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();

        let held = SeatAvailability {
            seat_no: "12A".to_string(),
            class: "economy".to_string(),
            state: SeatState::Held { expires_at: Some(expires) },
            price: 29900,
        };
        let json = serde_json::to_value(&held).unwrap();
        assert_eq!(json["status"], "held");
        assert_eq!(json["seat_no"], "12A");
        assert!(json["expires_at"].is_string());

        let sold = SeatAvailability {
            seat_no: "12B".to_string(),
            class: "economy".to_string(),
            state: SeatState::Sold,
            price: 29900,
        };
        let json = serde_json::to_value(&sold).unwrap();
        assert_eq!(json["status"], "sold");
        assert!(json.get("expires_at").is_none());

        let free = SeatAvailability {
            seat_no: "12C".to_string(),
            class: "economy".to_string(),
            state: SeatState::Available,
            price: 29900,
        };
        let json = serde_json::to_value(&free).unwrap();
        assert_eq!(json["status"], "available");
    }
}
