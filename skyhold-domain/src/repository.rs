use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::BookingError;
use crate::flight::{Flight, NewFlight, Seat, SeatAssignment};
use crate::hold::SeatHold;
use crate::idempotency::{IdempotencyRecord, NewIdempotencyRecord};
use crate::ticket::{Ticket, TicketDraft};

/// Flight and seat catalog access.
#[async_trait]
pub trait FlightStore: Send + Sync {
    async fn create_flight(&self, flight: NewFlight) -> Result<Flight, BookingError>;

    async fn get_flight(&self, id: i64) -> Result<Option<Flight>, BookingError>;

    async fn create_seats(
        &self,
        flight_id: i64,
        seats: &[SeatAssignment],
    ) -> Result<(), BookingError>;

    async fn list_seats(&self, flight_id: i64) -> Result<Vec<Seat>, BookingError>;
}

/// The seat lock engine. Mediates every state change on a (flight, seat)
/// key; implementations MUST make each operation a single atomic
/// statement (or one transaction) — never read-then-write.
#[async_trait]
pub trait SeatLockStore: Send + Sync {
    /// Make `holder_id` the active owner until `expires_at`. Succeeds when
    /// no record exists, when the requester already owns an unconfirmed
    /// hold (renewal), or when the current hold has expired. Fails with
    /// `HeldByAnother` when an active hold belongs to someone else and
    /// `AlreadySold` when a ticket exists for the seat.
    async fn acquire(
        &self,
        flight_id: i64,
        seat_no: &str,
        holder_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), BookingError>;

    /// Transition an active hold owned by `holder_id` to confirmed
    /// (expires_at = NULL). Fails with `NoValidHold` otherwise.
    async fn confirm(
        &self,
        flight_id: i64,
        seat_no: &str,
        holder_id: &str,
    ) -> Result<(), BookingError>;

    /// Delete the hold iff owned by `holder_id` and not confirmed.
    /// A missing, foreign, or confirmed record is a no-op.
    async fn release(
        &self,
        flight_id: i64,
        seat_no: &str,
        holder_id: &str,
    ) -> Result<(), BookingError>;

    /// Delete every expired hold. Returns the reclaimed row count.
    async fn reclaim_expired(&self) -> Result<u64, BookingError>;

    async fn get_hold(
        &self,
        flight_id: i64,
        seat_no: &str,
    ) -> Result<Option<SeatHold>, BookingError>;

    async fn list_holds(&self, flight_id: i64) -> Result<Vec<SeatHold>, BookingError>;
}

/// Ticket issuance and lookup.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Atomically confirm the holder's active hold and insert the ticket
    /// in one transaction, generating a unique PNR inside it. Fails with
    /// `NoValidHold` when no active hold matches and `AlreadySold` when
    /// the seat is already ticketed; either failure leaves the hold in
    /// its prior state.
    async fn issue_ticket(&self, draft: TicketDraft) -> Result<Ticket, BookingError>;

    async fn get_by_seat(
        &self,
        flight_id: i64,
        seat_no: &str,
    ) -> Result<Option<Ticket>, BookingError>;

    async fn list_for_flight(&self, flight_id: i64) -> Result<Vec<Ticket>, BookingError>;
}

/// Request deduplication records.
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    async fn find(
        &self,
        request_id: &str,
        route: &str,
    ) -> Result<Option<IdempotencyRecord>, BookingError>;

    /// First writer wins; a concurrent duplicate insert is not an error.
    async fn record(&self, record: NewIdempotencyRecord) -> Result<(), BookingError>;

    /// Drop records created before `cutoff`. Returns the purged count.
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, BookingError>;
}
