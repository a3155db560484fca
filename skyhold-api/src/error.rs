use std::any::Any;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use skyhold_domain::BookingError;

/// HTTP-boundary error. Every variant maps onto the closed error-code
/// vocabulary of the wire envelope `{code, message, details?}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("User-ID header is required")]
    MissingUserId,
    #[error("invalid flight id")]
    InvalidFlightId,
    #[error("invalid seat number")]
    InvalidSeatNo,
    #[error("seat unavailable: {0}")]
    SeatUnavailable(String),
    #[error("no valid hold: {0}")]
    NoValidHold(String),
    #[error("rate limit exceeded")]
    RateLimitExceeded,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::InvalidRequest(msg) => ApiError::InvalidRequest(msg),
            BookingError::FlightNotFound => ApiError::InvalidFlightId,
            BookingError::HeldByAnother | BookingError::AlreadySold => {
                ApiError::SeatUnavailable(err.to_string())
            }
            BookingError::NoValidHold => ApiError::NoValidHold(err.to_string()),
            BookingError::Storage(inner) => ApiError::Internal(inner),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match self {
            ApiError::InvalidRequest(details) => (
                StatusCode::BAD_REQUEST,
                "INVALID_REQUEST",
                "Invalid request".to_string(),
                Some(details),
            ),
            ApiError::MissingUserId => (
                StatusCode::BAD_REQUEST,
                "MISSING_USER_ID",
                "User-ID header is required".to_string(),
                None,
            ),
            ApiError::InvalidFlightId => (
                StatusCode::BAD_REQUEST,
                "INVALID_FLIGHT_ID",
                "Invalid flight ID".to_string(),
                None,
            ),
            ApiError::InvalidSeatNo => (
                StatusCode::BAD_REQUEST,
                "INVALID_SEAT_NO",
                "Seat number is required".to_string(),
                None,
            ),
            ApiError::SeatUnavailable(message) => (
                StatusCode::CONFLICT,
                "SEAT_UNAVAILABLE",
                message,
                None,
            ),
            ApiError::NoValidHold(message) => {
                (StatusCode::CONFLICT, "NO_VALID_HOLD", message, None)
            }
            ApiError::RateLimitExceeded => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMIT_EXCEEDED",
                "Too many requests".to_string(),
                None,
            ),
            ApiError::Internal(err) => {
                tracing::error!(%err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let mut body = json!({ "code": code, "message": message });
        if let Some(details) = details {
            body["details"] = json!(details);
        }

        (status, Json(body)).into_response()
    }
}

/// Panics caught at the HTTP boundary surface as a plain 500 envelope
/// without leaking internals.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| err.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic".to_string());
    tracing::error!(panic = %detail, "Panic recovered");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "code": "INTERNAL_ERROR", "message": "Internal server error" })),
    )
        .into_response()
}
