use thiserror::Error;

/// Typed outcome of every authoritative booking operation. Storage faults
/// are carried opaquely so callers above the seam never see driver types.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("flight not found")]
    FlightNotFound,

    #[error("seat is already held by another user")]
    HeldByAnother,

    #[error("seat is already sold")]
    AlreadySold,

    #[error("no valid hold found to confirm")]
    NoValidHold,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl BookingError {
    /// True for the contention outcomes a client can recover from by
    /// picking another seat or retrying later.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            BookingError::HeldByAnother | BookingError::AlreadySold | BookingError::NoValidHold
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_classification() {
        assert!(BookingError::HeldByAnother.is_conflict());
        assert!(BookingError::AlreadySold.is_conflict());
        assert!(BookingError::NoValidHold.is_conflict());
        assert!(!BookingError::FlightNotFound.is_conflict());
        assert!(!BookingError::InvalidRequest("x".into()).is_conflict());
    }
}
