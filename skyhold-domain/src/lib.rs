pub mod availability;
pub mod error;
pub mod flight;
pub mod hold;
pub mod idempotency;
pub mod repository;
pub mod search;
pub mod ticket;

pub use availability::{SeatAvailability, SeatState};
pub use error::BookingError;
pub use flight::{CreateFlightRequest, CreateFlightResponse, Flight, NewFlight, Seat, SeatAssignment, SeatConfiguration};
pub use hold::{CreateHoldRequest, CreateHoldResponse, SeatHold};
pub use idempotency::{IdempotencyRecord, NewIdempotencyRecord};
pub use search::{FlightSearchQuery, FlightSearchResponse, FlightSearchResult};
pub use ticket::{ConfirmTicketRequest, ConfirmTicketResponse, Ticket, TicketDraft};
