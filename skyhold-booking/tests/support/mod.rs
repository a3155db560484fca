//! In-memory implementations of the storage traits and the search index.
//! Every operation takes the single state mutex for its whole critical
//! section, which models the per-statement atomicity the production store
//! gets from the database.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use skyhold_booking::BookingCoordinator;
use skyhold_domain::repository::{FlightStore, IdempotencyStore, SeatLockStore, TicketStore};
use skyhold_domain::ticket::generate_pnr;
use skyhold_domain::{
    BookingError, Flight, FlightSearchQuery, FlightSearchResult, IdempotencyRecord, NewFlight,
    NewIdempotencyRecord, Seat, SeatAssignment, SeatHold, Ticket, TicketDraft,
};
use skyhold_search::{
    FlightDocument, HoldDocument, ProjectionError, SearchIndex, TicketDocument,
};

#[derive(Default)]
pub struct State {
    next_flight_id: i64,
    next_seat_id: i64,
    next_hold_id: i64,
    next_ticket_id: i64,
    pub flights: HashMap<i64, Flight>,
    pub seats: Vec<Seat>,
    pub holds: HashMap<(i64, String), SeatHold>,
    pub tickets: HashMap<(i64, String), Ticket>,
    pub pnrs: HashSet<String>,
    pub idempotency: HashMap<(String, String), IdempotencyRecord>,
    pub flight_docs: HashMap<i64, FlightDocument>,
    pub hold_docs: HashMap<i64, HoldDocument>,
    pub ticket_docs: HashMap<i64, TicketDocument>,
}

/// Shared backend; clones see the same state.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<State>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Seed a hold directly, bypassing the engine (e.g. already expired).
    pub fn seed_hold(
        &self,
        flight_id: i64,
        seat_no: &str,
        holder_id: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> i64 {
        let mut state = self.state();
        state.next_hold_id += 1;
        let id = state.next_hold_id;
        let now = Utc::now();
        state.holds.insert(
            (flight_id, seat_no.to_string()),
            SeatHold {
                id,
                flight_id,
                seat_no: seat_no.to_string(),
                holder_id: holder_id.to_string(),
                expires_at,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }
}

#[async_trait]
impl FlightStore for InMemoryBackend {
    async fn create_flight(&self, flight: NewFlight) -> Result<Flight, BookingError> {
        let mut state = self.state();
        state.next_flight_id += 1;
        let now = Utc::now();
        let flight = Flight {
            id: state.next_flight_id,
            origin: flight.origin,
            destination: flight.destination,
            departure_time: flight.departure_time,
            arrival_time: flight.arrival_time,
            airline: flight.airline,
            aircraft: flight.aircraft,
            fare_class: flight.fare_class,
            base_price_cents: flight.base_price_cents,
            currency: flight.currency,
            created_at: now,
            updated_at: now,
        };
        state.flights.insert(flight.id, flight.clone());
        Ok(flight)
    }

    async fn get_flight(&self, id: i64) -> Result<Option<Flight>, BookingError> {
        Ok(self.state().flights.get(&id).cloned())
    }

    async fn create_seats(
        &self,
        flight_id: i64,
        seats: &[SeatAssignment],
    ) -> Result<(), BookingError> {
        let mut state = self.state();
        let now = Utc::now();
        for assignment in seats {
            state.next_seat_id += 1;
            let id = state.next_seat_id;
            state.seats.push(Seat {
                id,
                flight_id,
                seat_no: assignment.seat_no.clone(),
                class: assignment.class.clone(),
                created_at: now,
                updated_at: now,
            });
        }
        Ok(())
    }

    async fn list_seats(&self, flight_id: i64) -> Result<Vec<Seat>, BookingError> {
        Ok(self
            .state()
            .seats
            .iter()
            .filter(|s| s.flight_id == flight_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SeatLockStore for InMemoryBackend {
    async fn acquire(
        &self,
        flight_id: i64,
        seat_no: &str,
        holder_id: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), BookingError> {
        let mut state = self.state();
        let now = Utc::now();
        let key = (flight_id, seat_no.to_string());

        if state.tickets.contains_key(&key) {
            return Err(BookingError::AlreadySold);
        }

        // Same predicate as the production CAS: an empty cell, an
        // unconfirmed hold by the requester, or an expired hold.
        let takeable = match state.holds.get(&key) {
            None => true,
            Some(hold) => {
                (hold.holder_id == holder_id && hold.expires_at.is_some())
                    || hold.expires_at.map_or(false, |t| t < now)
            }
        };
        if !takeable {
            return Err(BookingError::HeldByAnother);
        }

        if state.holds.contains_key(&key) {
            let hold = state.holds.get_mut(&key).unwrap();
            hold.holder_id = holder_id.to_string();
            hold.expires_at = Some(expires_at);
            hold.updated_at = now;
        } else {
            state.next_hold_id += 1;
            let id = state.next_hold_id;
            state.holds.insert(
                key,
                SeatHold {
                    id,
                    flight_id,
                    seat_no: seat_no.to_string(),
                    holder_id: holder_id.to_string(),
                    expires_at: Some(expires_at),
                    created_at: now,
                    updated_at: now,
                },
            );
        }
        Ok(())
    }

    async fn confirm(
        &self,
        flight_id: i64,
        seat_no: &str,
        holder_id: &str,
    ) -> Result<(), BookingError> {
        let mut state = self.state();
        let now = Utc::now();
        match state.holds.get_mut(&(flight_id, seat_no.to_string())) {
            Some(hold)
                if hold.holder_id == holder_id
                    && hold.expires_at.map_or(false, |t| t > now) =>
            {
                hold.expires_at = None;
                hold.updated_at = now;
                Ok(())
            }
            _ => Err(BookingError::NoValidHold),
        }
    }

    async fn release(
        &self,
        flight_id: i64,
        seat_no: &str,
        holder_id: &str,
    ) -> Result<(), BookingError> {
        let mut state = self.state();
        let key = (flight_id, seat_no.to_string());
        let owned_and_unconfirmed = state
            .holds
            .get(&key)
            .map_or(false, |hold| hold.holder_id == holder_id && hold.expires_at.is_some());
        if owned_and_unconfirmed {
            state.holds.remove(&key);
        }
        Ok(())
    }

    async fn reclaim_expired(&self) -> Result<u64, BookingError> {
        let mut state = self.state();
        let now = Utc::now();
        let before = state.holds.len();
        state
            .holds
            .retain(|_, hold| !hold.expires_at.map_or(false, |t| t < now));
        Ok((before - state.holds.len()) as u64)
    }

    async fn get_hold(
        &self,
        flight_id: i64,
        seat_no: &str,
    ) -> Result<Option<SeatHold>, BookingError> {
        Ok(self
            .state()
            .holds
            .get(&(flight_id, seat_no.to_string()))
            .cloned())
    }

    async fn list_holds(&self, flight_id: i64) -> Result<Vec<SeatHold>, BookingError> {
        Ok(self
            .state()
            .holds
            .values()
            .filter(|h| h.flight_id == flight_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TicketStore for InMemoryBackend {
    async fn issue_ticket(&self, draft: TicketDraft) -> Result<Ticket, BookingError> {
        let mut state = self.state();
        let now = Utc::now();
        let key = (draft.flight_id, draft.seat_no.clone());

        if state.tickets.contains_key(&key) {
            return Err(BookingError::AlreadySold);
        }

        // Confirm-then-insert under one lock: the in-memory equivalent of
        // the single store transaction.
        match state.holds.get(&key) {
            Some(hold)
                if hold.holder_id == draft.user_id
                    && hold.expires_at.map_or(false, |t| t > now) => {}
            _ => return Err(BookingError::NoValidHold),
        }

        let mut pnr = generate_pnr();
        let mut attempts = 1;
        while state.pnrs.contains(&pnr) {
            if attempts >= 5 {
                return Err(BookingError::Storage(anyhow::anyhow!(
                    "exhausted PNR generation attempts"
                )));
            }
            pnr = generate_pnr();
            attempts += 1;
        }

        let hold = state.holds.get_mut(&key).unwrap();
        hold.expires_at = None;
        hold.updated_at = now;

        state.next_ticket_id += 1;
        let ticket = Ticket {
            id: state.next_ticket_id,
            flight_id: draft.flight_id,
            seat_no: draft.seat_no.clone(),
            user_id: draft.user_id,
            price_amount: draft.price_amount,
            currency: draft.currency,
            pnr_code: pnr.clone(),
            payment_ref: draft.payment_ref,
            issued_at: now,
            created_at: now,
        };
        state.pnrs.insert(pnr);
        state.tickets.insert(key, ticket.clone());
        Ok(ticket)
    }

    async fn get_by_seat(
        &self,
        flight_id: i64,
        seat_no: &str,
    ) -> Result<Option<Ticket>, BookingError> {
        Ok(self
            .state()
            .tickets
            .get(&(flight_id, seat_no.to_string()))
            .cloned())
    }

    async fn list_for_flight(&self, flight_id: i64) -> Result<Vec<Ticket>, BookingError> {
        Ok(self
            .state()
            .tickets
            .values()
            .filter(|t| t.flight_id == flight_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl IdempotencyStore for InMemoryBackend {
    async fn find(
        &self,
        request_id: &str,
        route: &str,
    ) -> Result<Option<IdempotencyRecord>, BookingError> {
        Ok(self
            .state()
            .idempotency
            .get(&(request_id.to_string(), route.to_string()))
            .cloned())
    }

    async fn record(&self, record: NewIdempotencyRecord) -> Result<(), BookingError> {
        let mut state = self.state();
        let key = (record.request_id.clone(), record.route.clone());
        state.idempotency.entry(key).or_insert(IdempotencyRecord {
            request_id: record.request_id,
            route: record.route,
            user_id: record.user_id,
            response_hash: record.response_hash,
            response_body: record.response_body,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, BookingError> {
        let mut state = self.state();
        let before = state.idempotency.len();
        state.idempotency.retain(|_, rec| rec.created_at >= cutoff);
        Ok((before - state.idempotency.len()) as u64)
    }
}

#[async_trait]
impl SearchIndex for InMemoryBackend {
    async fn upsert_flight(&self, doc: FlightDocument) -> Result<(), ProjectionError> {
        self.state().flight_docs.insert(doc.id, doc);
        Ok(())
    }

    async fn upsert_hold(&self, doc: HoldDocument) -> Result<(), ProjectionError> {
        self.state().hold_docs.insert(doc.id, doc);
        Ok(())
    }

    async fn set_hold_status(&self, hold_id: i64, status: &str) -> Result<(), ProjectionError> {
        if let Some(doc) = self.state().hold_docs.get_mut(&hold_id) {
            doc.status = status.to_string();
        }
        Ok(())
    }

    async fn delete_hold(&self, hold_id: i64) -> Result<(), ProjectionError> {
        self.state().hold_docs.remove(&hold_id);
        Ok(())
    }

    async fn upsert_ticket(&self, doc: TicketDocument) -> Result<(), ProjectionError> {
        self.state().ticket_docs.insert(doc.id, doc);
        Ok(())
    }

    async fn search_flights(
        &self,
        query: &FlightSearchQuery,
    ) -> Result<(Vec<FlightSearchResult>, i64), ProjectionError> {
        let state = self.state();
        let (window_start, window_end) = query.departure_window();

        let mut hits: Vec<&FlightDocument> = state
            .flight_docs
            .values()
            .filter(|doc| {
                doc.origin == query.origin
                    && doc.destination == query.destination
                    && doc.departure_time >= window_start
                    && doc.departure_time <= window_end
                    && query
                        .fare_class
                        .as_ref()
                        .map_or(true, |fc| &doc.fare_class == fc)
                    && query.airline.as_ref().map_or(true, |a| &doc.airline == a)
            })
            .collect();
        hits.sort_by_key(|doc| doc.departure_time);

        let total = hits.len() as i64;
        let results = hits
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.size as usize)
            .map(|doc| FlightSearchResult {
                id: doc.id,
                origin: doc.origin.clone(),
                destination: doc.destination.clone(),
                departure_time: doc.departure_time,
                arrival_time: doc.arrival_time,
                airline: doc.airline.clone(),
                aircraft: doc.aircraft.clone(),
                fare_class: doc.fare_class.clone(),
                base_price: doc.base_price,
                available_seats: 0,
            })
            .collect();

        Ok((results, total))
    }
}

/// A projection that always fails, for checking write-through is truly
/// best-effort.
#[derive(Clone, Default)]
pub struct FailingSearchIndex;

#[async_trait]
impl SearchIndex for FailingSearchIndex {
    async fn upsert_flight(&self, _doc: FlightDocument) -> Result<(), ProjectionError> {
        Err(ProjectionError::Storage("index unavailable".to_string()))
    }

    async fn upsert_hold(&self, _doc: HoldDocument) -> Result<(), ProjectionError> {
        Err(ProjectionError::Storage("index unavailable".to_string()))
    }

    async fn set_hold_status(&self, _hold_id: i64, _status: &str) -> Result<(), ProjectionError> {
        Err(ProjectionError::Storage("index unavailable".to_string()))
    }

    async fn delete_hold(&self, _hold_id: i64) -> Result<(), ProjectionError> {
        Err(ProjectionError::Storage("index unavailable".to_string()))
    }

    async fn upsert_ticket(&self, _doc: TicketDocument) -> Result<(), ProjectionError> {
        Err(ProjectionError::Storage("index unavailable".to_string()))
    }

    async fn search_flights(
        &self,
        _query: &FlightSearchQuery,
    ) -> Result<(Vec<FlightSearchResult>, i64), ProjectionError> {
        Err(ProjectionError::Storage("index unavailable".to_string()))
    }
}

pub const DEFAULT_TTL_MINUTES: i64 = 15;

/// Coordinator wired to a fresh shared in-memory backend.
pub fn coordinator(backend: &InMemoryBackend) -> Arc<BookingCoordinator> {
    coordinator_with_ttl(backend, Duration::minutes(DEFAULT_TTL_MINUTES))
}

pub fn coordinator_with_ttl(
    backend: &InMemoryBackend,
    hold_ttl: Duration,
) -> Arc<BookingCoordinator> {
    Arc::new(BookingCoordinator::new(
        Arc::new(backend.clone()),
        Arc::new(backend.clone()),
        Arc::new(backend.clone()),
        Arc::new(backend.clone()),
        Arc::new(backend.clone()),
        hold_ttl,
        Duration::hours(24),
    ))
}

pub fn coordinator_with_search(
    backend: &InMemoryBackend,
    search: Arc<dyn SearchIndex>,
) -> Arc<BookingCoordinator> {
    Arc::new(BookingCoordinator::new(
        Arc::new(backend.clone()),
        Arc::new(backend.clone()),
        Arc::new(backend.clone()),
        Arc::new(backend.clone()),
        search,
        Duration::minutes(DEFAULT_TTL_MINUTES),
        Duration::hours(24),
    ))
}
