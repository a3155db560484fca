//! The search projection: a secondary, eventually consistent index over
//! flights, holds, and tickets. Documents are keyed by the authoritative
//! numeric id, so every write is an idempotent upsert. Clients needing
//! strong guarantees must re-read the authoritative store.

pub mod documents;
pub mod index;

pub use documents::{FlightDocument, HoldDocument, TicketDocument};
pub use index::PgSearchIndex;

use async_trait::async_trait;
use skyhold_domain::{FlightSearchQuery, FlightSearchResult};
use thiserror::Error;

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_CONFIRMED: &str = "confirmed";

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("projection storage error: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for ProjectionError {
    fn from(err: sqlx::Error) -> Self {
        ProjectionError::Storage(err.to_string())
    }
}

/// Write and query surface of the projection. Mutation-path callers treat
/// failures as best-effort; the search read path surfaces them.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    async fn upsert_flight(&self, doc: FlightDocument) -> Result<(), ProjectionError>;

    async fn upsert_hold(&self, doc: HoldDocument) -> Result<(), ProjectionError>;

    async fn set_hold_status(&self, hold_id: i64, status: &str) -> Result<(), ProjectionError>;

    async fn delete_hold(&self, hold_id: i64) -> Result<(), ProjectionError>;

    async fn upsert_ticket(&self, doc: TicketDocument) -> Result<(), ProjectionError>;

    /// Term-filtered, date-ranged page of flights sorted by departure
    /// time ascending. `available_seats` is left at zero; the coordinator
    /// enriches it from authoritative data.
    async fn search_flights(
        &self,
        query: &FlightSearchQuery,
    ) -> Result<(Vec<FlightSearchResult>, i64), ProjectionError>;
}
