use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, info, warn};

use skyhold_domain::repository::{FlightStore, IdempotencyStore, SeatLockStore, TicketStore};
use skyhold_domain::{
    BookingError, ConfirmTicketRequest, ConfirmTicketResponse, CreateFlightRequest,
    CreateFlightResponse, CreateHoldRequest, CreateHoldResponse, FlightSearchQuery,
    FlightSearchResponse, NewFlight, NewIdempotencyRecord, SeatAvailability, TicketDraft,
};
use skyhold_search::{
    FlightDocument, HoldDocument, SearchIndex, TicketDocument, STATUS_ACTIVE, STATUS_CONFIRMED,
};

use crate::availability;
use crate::seatmap;

pub const HOLDS_ROUTE: &str = "POST /holds";
pub const TICKETS_ROUTE: &str = "POST /tickets/confirm";

/// The public surface of the reservation engine. Orchestrates the
/// authoritative stores, applies idempotency, and writes the search
/// projection through best-effort.
pub struct BookingCoordinator {
    flights: Arc<dyn FlightStore>,
    locks: Arc<dyn SeatLockStore>,
    tickets: Arc<dyn TicketStore>,
    idempotency: Arc<dyn IdempotencyStore>,
    search: Arc<dyn SearchIndex>,
    hold_ttl: Duration,
    idempotency_retention: Duration,
}

impl BookingCoordinator {
    pub fn new(
        flights: Arc<dyn FlightStore>,
        locks: Arc<dyn SeatLockStore>,
        tickets: Arc<dyn TicketStore>,
        idempotency: Arc<dyn IdempotencyStore>,
        search: Arc<dyn SearchIndex>,
        hold_ttl: Duration,
        idempotency_retention: Duration,
    ) -> Self {
        Self {
            flights,
            locks,
            tickets,
            idempotency,
            search,
            hold_ttl,
            idempotency_retention,
        }
    }

    pub async fn create_hold(
        &self,
        req: CreateHoldRequest,
        holder_id: &str,
        idempotency_key: Option<&str>,
    ) -> Result<CreateHoldResponse, BookingError> {
        if let Some(cached) = self
            .replay::<CreateHoldResponse>(idempotency_key, HOLDS_ROUTE, holder_id)
            .await?
        {
            return Ok(cached);
        }

        self.flights
            .get_flight(req.flight_id)
            .await?
            .ok_or(BookingError::FlightNotFound)?;

        if self
            .tickets
            .get_by_seat(req.flight_id, &req.seat_no)
            .await?
            .is_some()
        {
            return Err(BookingError::AlreadySold);
        }

        let expires_at = Utc::now() + self.hold_ttl;
        self.locks
            .acquire(req.flight_id, &req.seat_no, holder_id, expires_at)
            .await?;

        // Projection write-through; the authoritative record is already
        // committed, so a failure here is logged, never surfaced.
        match self.locks.get_hold(req.flight_id, &req.seat_no).await {
            Ok(Some(hold)) => {
                if let Err(err) = self
                    .search
                    .upsert_hold(HoldDocument::from_hold(&hold, STATUS_ACTIVE))
                    .await
                {
                    error!(hold_id = hold.id, %err, "Failed to index hold");
                }
            }
            Ok(None) => {}
            Err(err) => warn!(%err, "Failed to load hold for indexing"),
        }

        let response = CreateHoldResponse {
            flight_id: req.flight_id,
            seat_no: req.seat_no.clone(),
            holder_id: holder_id.to_string(),
            expires_at,
        };

        self.store_idempotency(idempotency_key, HOLDS_ROUTE, holder_id, &response)
            .await;

        info!(
            flight_id = req.flight_id,
            seat_no = %req.seat_no,
            holder_id,
            "Hold created"
        );
        Ok(response)
    }

    pub async fn confirm_ticket(
        &self,
        req: ConfirmTicketRequest,
        user_id: &str,
        idempotency_key: Option<&str>,
    ) -> Result<ConfirmTicketResponse, BookingError> {
        if let Some(cached) = self
            .replay::<ConfirmTicketResponse>(idempotency_key, TICKETS_ROUTE, user_id)
            .await?
        {
            return Ok(cached);
        }

        let flight = self
            .flights
            .get_flight(req.flight_id)
            .await?
            .ok_or(BookingError::FlightNotFound)?;

        // Hold confirmation and ticket insert commit or roll back as one;
        // the ticket is priced from the flight's current base fare.
        let ticket = self
            .tickets
            .issue_ticket(TicketDraft {
                flight_id: req.flight_id,
                seat_no: req.seat_no.clone(),
                user_id: user_id.to_string(),
                price_amount: flight.base_price_cents,
                currency: flight.currency.clone(),
                payment_ref: req.payment_ref.clone(),
            })
            .await?;

        if let Err(err) = self
            .search
            .upsert_ticket(TicketDocument::from_ticket(&ticket, STATUS_CONFIRMED))
            .await
        {
            error!(ticket_id = ticket.id, %err, "Failed to index ticket");
        }

        match self.locks.get_hold(req.flight_id, &req.seat_no).await {
            Ok(Some(hold)) => {
                if let Err(err) = self.search.set_hold_status(hold.id, STATUS_CONFIRMED).await {
                    warn!(hold_id = hold.id, %err, "Failed to update hold status in index");
                }
            }
            Ok(None) => {}
            Err(err) => warn!(%err, "Failed to load hold for status update"),
        }

        let response = ConfirmTicketResponse {
            ticket_id: ticket.id,
            flight_id: ticket.flight_id,
            seat_no: ticket.seat_no.clone(),
            pnr_code: ticket.pnr_code.clone(),
            payment_ref: ticket.payment_ref.clone(),
        };

        self.store_idempotency(idempotency_key, TICKETS_ROUTE, user_id, &response)
            .await;

        info!(
            ticket_id = ticket.id,
            pnr_code = %ticket.pnr_code,
            flight_id = req.flight_id,
            seat_no = %req.seat_no,
            "Ticket confirmed"
        );
        Ok(response)
    }

    pub async fn release_hold(
        &self,
        flight_id: i64,
        seat_no: &str,
        holder_id: &str,
    ) -> Result<(), BookingError> {
        // Look the hold up first: once released, its id is gone and the
        // projection document could never be cleaned up.
        let hold = match self.locks.get_hold(flight_id, seat_no).await {
            Ok(hold) => hold,
            Err(err) => {
                warn!(%err, "Failed to load hold before release");
                None
            }
        };

        self.locks.release(flight_id, seat_no, holder_id).await?;

        if let Some(hold) = hold {
            if hold.holder_id == holder_id && !hold.is_confirmed() {
                if let Err(err) = self.search.delete_hold(hold.id).await {
                    warn!(hold_id = hold.id, %err, "Failed to delete hold from index");
                }
            }
        }

        info!(flight_id, seat_no, holder_id, "Hold released");
        Ok(())
    }

    pub async fn seat_availability(
        &self,
        flight_id: i64,
    ) -> Result<Vec<SeatAvailability>, BookingError> {
        let flight = self
            .flights
            .get_flight(flight_id)
            .await?
            .ok_or(BookingError::FlightNotFound)?;

        let seats = self.flights.list_seats(flight_id).await?;
        let holds = self.locks.list_holds(flight_id).await?;
        let tickets = self.tickets.list_for_flight(flight_id).await?;

        Ok(availability::seat_states(
            &seats,
            &holds,
            &tickets,
            flight.base_price_cents,
            Utc::now(),
        ))
    }

    pub async fn search_flights(
        &self,
        query: FlightSearchQuery,
    ) -> Result<FlightSearchResponse, BookingError> {
        // Unlike mutation-path projection writes, a failure on the search
        // read path has nothing authoritative to fall back on.
        let (mut flights, total) = self
            .search
            .search_flights(&query)
            .await
            .map_err(|err| BookingError::Storage(anyhow::anyhow!(err)))?;

        for flight in &mut flights {
            match self.seat_availability(flight.id).await {
                Ok(states) => flight.available_seats = availability::available_count(&states),
                Err(err) => {
                    warn!(flight_id = flight.id, %err, "Failed to compute seat availability")
                }
            }
        }

        Ok(FlightSearchResponse {
            flights,
            total,
            page: query.page,
            size: query.size,
        })
    }

    pub async fn create_flight(
        &self,
        req: CreateFlightRequest,
    ) -> Result<CreateFlightResponse, BookingError> {
        if req.arrival_time <= req.departure_time {
            return Err(BookingError::InvalidRequest(
                "arrival time must be after departure time".to_string(),
            ));
        }
        if req.base_price < 0.0 {
            return Err(BookingError::InvalidRequest(
                "base price must not be negative".to_string(),
            ));
        }

        let base_price_cents = (req.base_price * 100.0).round() as i64;
        let flight = self
            .flights
            .create_flight(NewFlight {
                origin: req.origin.clone(),
                destination: req.destination.clone(),
                departure_time: req.departure_time,
                arrival_time: req.arrival_time,
                airline: req.airline.clone(),
                aircraft: req.aircraft.clone(),
                fare_class: req.fare_class.clone(),
                base_price_cents,
                currency: "USD".to_string(),
            })
            .await?;

        let mut seats_created = 0;
        if let Some(config) = &req.seat_config {
            let seats = seatmap::generate_seats(config);
            match self.flights.create_seats(flight.id, &seats).await {
                Ok(()) => seats_created = seats.len(),
                Err(err) => warn!(flight_id = flight.id, %err, "Failed to create seats"),
            }
        }

        if let Err(err) = self.search.upsert_flight(FlightDocument::from(&flight)).await {
            error!(flight_id = flight.id, %err, "Failed to index flight");
        }

        info!(
            flight_id = flight.id,
            origin = %flight.origin,
            destination = %flight.destination,
            seats_created,
            "Flight created"
        );

        Ok(CreateFlightResponse {
            id: flight.id,
            origin: flight.origin,
            destination: flight.destination,
            departure_time: flight.departure_time,
            arrival_time: flight.arrival_time,
            airline: flight.airline,
            aircraft: flight.aircraft,
            fare_class: flight.fare_class,
            base_price: req.base_price,
            seats_created,
            created_at: flight.created_at,
        })
    }

    /// Sweep expired holds. Liveness never depends on this: the acquire
    /// predicate already treats an expired hold as free.
    pub async fn reclaim_expired_holds(&self) -> Result<u64, BookingError> {
        self.locks.reclaim_expired().await
    }

    pub async fn purge_idempotency_keys(&self) -> Result<u64, BookingError> {
        let cutoff = Utc::now() - self.idempotency_retention;
        self.idempotency.purge_older_than(cutoff).await
    }

    async fn replay<T: DeserializeOwned>(
        &self,
        idempotency_key: Option<&str>,
        route: &str,
        user_id: &str,
    ) -> Result<Option<T>, BookingError> {
        let Some(key) = idempotency_key else {
            return Ok(None);
        };
        let Some(record) = self.idempotency.find(key, route).await? else {
            return Ok(None);
        };
        if record.user_id != user_id {
            return Ok(None);
        }

        let response = serde_json::from_value(record.response_body)
            .map_err(|err| BookingError::Storage(anyhow::anyhow!(err)))?;
        info!(request_id = key, route, "Idempotent request replayed");
        Ok(Some(response))
    }

    async fn store_idempotency<T: Serialize>(
        &self,
        idempotency_key: Option<&str>,
        route: &str,
        user_id: &str,
        response: &T,
    ) {
        let Some(key) = idempotency_key else { return };

        match NewIdempotencyRecord::capture(key, route, user_id, response) {
            Ok(record) => {
                if let Err(err) = self.idempotency.record(record).await {
                    warn!(request_id = key, %err, "Failed to store idempotency key");
                }
            }
            Err(err) => warn!(request_id = key, %err, "Failed to encode idempotency record"),
        }
    }
}
