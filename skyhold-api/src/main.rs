use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use skyhold_api::{app, middleware::rate_limit::RateLimiter, AppState};
use skyhold_booking::{spawn_reclaim_scheduler, BookingCoordinator};
use skyhold_search::PgSearchIndex;
use skyhold_store::app_config::LogConfig;
use skyhold_store::{
    Config, DbClient, PgFlightStore, PgIdempotencyStore, PgSeatLockStore, PgTicketStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load();
    init_tracing(&config.log);

    info!(env = %config.app.env, "Starting skyhold API");

    let db = DbClient::connect(&config.database.dsn()).await?;
    db.migrate().await?;

    let search = PgSearchIndex::connect(&config.search.dsn_or(&config.database.dsn())).await?;
    search.ensure_schema().await?;

    let coordinator = Arc::new(BookingCoordinator::new(
        Arc::new(PgFlightStore::new(db.pool.clone())),
        Arc::new(PgSeatLockStore::new(db.pool.clone())),
        Arc::new(PgTicketStore::new(db.pool.clone())),
        Arc::new(PgIdempotencyStore::new(db.pool.clone())),
        Arc::new(search),
        config.hold.ttl(),
        config.idempotency.retention(),
    ));

    let scheduler = spawn_reclaim_scheduler(Arc::clone(&coordinator));

    let state = AppState {
        coordinator,
        limiter: Arc::new(RateLimiter::new(config.rate_limit.per_minute)),
    };

    let addr: SocketAddr = format!("{}:{}", config.app.host, config.app.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {addr}");

    axum::serve(
        listener,
        app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    scheduler.abort();
    db.close().await;
    info!("Server exited");
    Ok(())
}

fn init_tracing(log: &LogConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));

    if log.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutting down server...");
}
