use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, post};
use axum::{Json, Router};

use skyhold_domain::CreateHoldRequest;

use crate::error::ApiError;
use crate::extract::{AppJson, IdempotencyKey, UserId};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/holds", post(create_hold))
        .route("/holds/:flight_id/:seat_no", delete(release_hold))
}

async fn create_hold(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    IdempotencyKey(idempotency_key): IdempotencyKey,
    AppJson(req): AppJson<CreateHoldRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.flight_id <= 0 {
        return Err(ApiError::InvalidFlightId);
    }
    if req.seat_no.is_empty() {
        return Err(ApiError::InvalidSeatNo);
    }

    let response = state
        .coordinator
        .create_hold(req, &user_id, idempotency_key.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

async fn release_hold(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Path((flight_id, seat_no)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let flight_id: i64 = flight_id.parse().map_err(|_| ApiError::InvalidFlightId)?;
    if seat_no.is_empty() {
        return Err(ApiError::InvalidSeatNo);
    }

    state
        .coordinator
        .release_hold(flight_id, &seat_no, &user_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
