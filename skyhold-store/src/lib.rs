pub mod app_config;
pub mod database;
pub mod flight_repo;
pub mod idempotency_repo;
pub mod seat_repo;
pub mod ticket_repo;

pub use app_config::Config;
pub use database::DbClient;
pub use flight_repo::PgFlightStore;
pub use idempotency_repo::PgIdempotencyStore;
pub use seat_repo::PgSeatLockStore;
pub use ticket_repo::PgTicketStore;
