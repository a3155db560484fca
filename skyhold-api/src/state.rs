use std::sync::Arc;

use skyhold_booking::BookingCoordinator;

use crate::middleware::rate_limit::RateLimiter;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<BookingCoordinator>,
    pub limiter: Arc<RateLimiter>,
}
