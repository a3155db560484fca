use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde::Deserialize;

use skyhold_domain::{CreateFlightRequest, FlightSearchQuery};

use crate::error::ApiError;
use crate::extract::{AppJson, AppQuery};
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 100;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/flights", post(create_flight))
        .route("/flights/search", get(search_flights))
        .route("/flights/:flight_id/seats", get(flight_seats))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    origin: Option<String>,
    destination: Option<String>,
    date: Option<String>,
    fare_class: Option<String>,
    airline: Option<String>,
    page: Option<u32>,
    size: Option<u32>,
}

impl SearchParams {
    fn into_query(self) -> Result<FlightSearchQuery, ApiError> {
        let origin = required(self.origin, "origin")?;
        let destination = required(self.destination, "destination")?;
        let date = required(self.date, "date")?;
        let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|_| ApiError::InvalidRequest("date must be YYYY-MM-DD".to_string()))?;

        let page = self.page.filter(|p| *p >= 1).unwrap_or(1);
        let size = match self.size {
            None | Some(0) => DEFAULT_PAGE_SIZE,
            Some(size) => size.min(MAX_PAGE_SIZE),
        };

        Ok(FlightSearchQuery {
            origin,
            destination,
            date,
            fare_class: self.fare_class.filter(|v| !v.is_empty()),
            airline: self.airline.filter(|v| !v.is_empty()),
            page,
            size,
        })
    }
}

fn required(value: Option<String>, name: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::InvalidRequest(format!("{name} is required")))
}

async fn search_flights(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = params.into_query()?;
    let response = state.coordinator.search_flights(query).await?;
    Ok(Json(response))
}

async fn create_flight(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateFlightRequest>,
) -> Result<impl IntoResponse, ApiError> {
    for (value, name) in [
        (&req.origin, "origin"),
        (&req.destination, "destination"),
        (&req.airline, "airline"),
        (&req.aircraft, "aircraft"),
        (&req.fare_class, "fare_class"),
    ] {
        if value.is_empty() {
            return Err(ApiError::InvalidRequest(format!("{name} is required")));
        }
    }

    let response = state.coordinator.create_flight(req).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn flight_seats(
    State(state): State<AppState>,
    Path(flight_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let flight_id: i64 = flight_id.parse().map_err(|_| ApiError::InvalidFlightId)?;

    let seats = state.coordinator.seat_availability(flight_id).await?;
    Ok(Json(seats))
}
