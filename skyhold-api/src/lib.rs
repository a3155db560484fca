use axum::http::{header, HeaderName, Method};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod error;
pub mod extract;
pub mod flights;
pub mod holds;
pub mod middleware;
pub mod state;
pub mod tickets;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("user-id"),
            HeaderName::from_static("idempotency-key"),
        ]);

    let api = Router::new()
        .merge(holds::routes())
        .merge(tickets::routes())
        .merge(flights::routes())
        .route("/health", get(health));

    Router::new()
        .nest("/api/v1", api)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit::rate_limit_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(error::handle_panic))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}
