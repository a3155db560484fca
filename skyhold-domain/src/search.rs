use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Search criteria over the flight projection. Term filters AND together;
/// the date selects a whole day of departures (UTC).
#[derive(Debug, Clone)]
pub struct FlightSearchQuery {
    pub origin: String,
    pub destination: String,
    pub date: NaiveDate,
    pub fare_class: Option<String>,
    pub airline: Option<String>,
    /// 1-based.
    pub page: u32,
    pub size: u32,
}

impl FlightSearchQuery {
    /// Departure-time window covered by the requested date.
    pub fn departure_window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self
            .date
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always valid")
            .and_utc();
        let end = self
            .date
            .and_hms_opt(23, 59, 59)
            .expect("end of day is always valid")
            .and_utc();
        (start, end)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.size)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightSearchResult {
    pub id: i64,
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub airline: String,
    pub aircraft: String,
    pub fare_class: String,
    pub base_price: f64,
    pub available_seats: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightSearchResponse {
    pub flights: Vec<FlightSearchResult>,
    pub total: i64,
    pub page: u32,
    pub size: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: u32, size: u32) -> FlightSearchQuery {
        FlightSearchQuery {
            origin: "JFK".to_string(),
            destination: "LAX".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            fare_class: None,
            airline: None,
            page,
            size,
        }
    }

    #[test]
    fn departure_window_spans_the_day() {
        let (start, end) = query(1, 10).departure_window();
        assert_eq!(start.to_rfc3339(), "2026-03-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2026-03-01T23:59:59+00:00");
    }

    #[test]
    fn offset_is_zero_based_from_page_one() {
        assert_eq!(query(1, 10).offset(), 0);
        assert_eq!(query(3, 25).offset(), 50);
        // page 0 is clamped rather than underflowing
        assert_eq!(query(0, 10).offset(), 0);
    }
}
