pub mod availability;
pub mod coordinator;
pub mod reclaim;
pub mod seatmap;

pub use coordinator::{BookingCoordinator, HOLDS_ROUTE, TICKETS_ROUTE};
pub use reclaim::spawn_reclaim_scheduler;
