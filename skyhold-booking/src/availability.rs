use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::warn;

use skyhold_domain::{Seat, SeatAvailability, SeatHold, SeatState, Ticket};

/// Derive the state of every seat on a flight from authoritative hold and
/// ticket records.
pub fn seat_states(
    seats: &[Seat],
    holds: &[SeatHold],
    tickets: &[Ticket],
    base_price: i64,
    now: DateTime<Utc>,
) -> Vec<SeatAvailability> {
    let hold_by_seat: HashMap<&str, &SeatHold> =
        holds.iter().map(|h| (h.seat_no.as_str(), h)).collect();
    let ticketed: HashMap<&str, &Ticket> =
        tickets.iter().map(|t| (t.seat_no.as_str(), t)).collect();

    seats
        .iter()
        .map(|seat| {
            let state = if ticketed.contains_key(seat.seat_no.as_str()) {
                SeatState::Sold
            } else if let Some(hold) = hold_by_seat.get(seat.seat_no.as_str()) {
                if hold.is_confirmed() {
                    // A confirmed hold must coexist with a ticket; report
                    // the seat as held so it cannot be re-acquired, and
                    // leave a trace for reconciliation.
                    warn!(
                        flight_id = seat.flight_id,
                        seat_no = %seat.seat_no,
                        hold_id = hold.id,
                        "Confirmed hold without ticket; data integrity warning"
                    );
                    SeatState::Held { expires_at: None }
                } else if hold.is_active_at(now) {
                    SeatState::Held { expires_at: hold.expires_at }
                } else {
                    SeatState::Available
                }
            } else {
                SeatState::Available
            };

            SeatAvailability {
                seat_no: seat.seat_no.clone(),
                class: seat.class.clone(),
                state,
                price: base_price,
            }
        })
        .collect()
}

/// Count of seats a new hold could take right now.
pub fn available_count(states: &[SeatAvailability]) -> i64 {
    states
        .iter()
        .filter(|s| s.state == SeatState::Available)
        .count() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn seat(seat_no: &str) -> Seat {
        let now = Utc::now();
        Seat {
            id: 0,
            flight_id: 1,
            seat_no: seat_no.to_string(),
            class: "economy".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn hold(seat_no: &str, expires_at: Option<DateTime<Utc>>) -> SeatHold {
        let now = Utc::now();
        SeatHold {
            id: 7,
            flight_id: 1,
            seat_no: seat_no.to_string(),
            holder_id: "user_1".to_string(),
            expires_at,
            created_at: now,
            updated_at: now,
        }
    }

    fn ticket(seat_no: &str) -> Ticket {
        let now = Utc::now();
        Ticket {
            id: 1,
            flight_id: 1,
            seat_no: seat_no.to_string(),
            user_id: "user_1".to_string(),
            price_amount: 29900,
            currency: "USD".to_string(),
            pnr_code: "AB12CD".to_string(),
            payment_ref: "pay_1".to_string(),
            issued_at: now,
            created_at: now,
        }
    }

    #[test]
    fn ticket_wins_over_hold() {
        let now = Utc::now();
        let states = seat_states(
            &[seat("12A")],
            &[hold("12A", None)],
            &[ticket("12A")],
            29900,
            now,
        );
        assert_eq!(states[0].state, SeatState::Sold);
    }

    #[test]
    fn active_hold_reports_held_with_expiry() {
        let now = Utc::now();
        let expires = now + Duration::minutes(10);
        let states = seat_states(&[seat("12A")], &[hold("12A", Some(expires))], &[], 29900, now);
        assert_eq!(states[0].state, SeatState::Held { expires_at: Some(expires) });
    }

    #[test]
    fn expired_hold_reports_available() {
        let now = Utc::now();
        let states = seat_states(
            &[seat("12A")],
            &[hold("12A", Some(now - Duration::seconds(5)))],
            &[],
            29900,
            now,
        );
        assert_eq!(states[0].state, SeatState::Available);
    }

    #[test]
    fn confirmed_hold_without_ticket_reports_held() {
        let now = Utc::now();
        let states = seat_states(&[seat("12A")], &[hold("12A", None)], &[], 29900, now);
        assert_eq!(states[0].state, SeatState::Held { expires_at: None });
    }

    #[test]
    fn untouched_seat_is_available_and_counted() {
        let now = Utc::now();
        let states = seat_states(&[seat("12A"), seat("12B")], &[], &[ticket("12B")], 29900, now);
        assert_eq!(states[0].state, SeatState::Available);
        assert_eq!(states[1].state, SeatState::Sold);
        assert_eq!(available_count(&states), 1);
    }
}
