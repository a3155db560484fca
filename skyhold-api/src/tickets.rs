use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use skyhold_domain::ConfirmTicketRequest;

use crate::error::ApiError;
use crate::extract::{AppJson, IdempotencyKey, UserId};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/tickets/confirm", post(confirm_ticket))
}

async fn confirm_ticket(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    IdempotencyKey(idempotency_key): IdempotencyKey,
    AppJson(req): AppJson<ConfirmTicketRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.flight_id <= 0 {
        return Err(ApiError::InvalidFlightId);
    }
    if req.seat_no.is_empty() {
        return Err(ApiError::InvalidSeatNo);
    }
    if req.payment_ref.is_empty() {
        return Err(ApiError::InvalidRequest(
            "payment_ref is required".to_string(),
        ));
    }

    let response = state
        .coordinator
        .confirm_ticket(req, &user_id, idempotency_key.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}
