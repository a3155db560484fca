//! Demo seeder: loads the configuration, migrates, and creates a small
//! schedule of flights with generated seat maps through the coordinator so
//! the search projection is populated alongside the authoritative store.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::info;
use tracing_subscriber::EnvFilter;

use skyhold_booking::BookingCoordinator;
use skyhold_domain::{CreateFlightRequest, SeatConfiguration};
use skyhold_search::PgSearchIndex;
use skyhold_store::{
    Config, DbClient, PgFlightStore, PgIdempotencyStore, PgSeatLockStore, PgTicketStore,
};

struct Route {
    origin: &'static str,
    destination: &'static str,
    airline: &'static str,
    aircraft: &'static str,
    base_price: f64,
    departure_hour: i64,
    duration_hours: i64,
}

const ROUTES: &[Route] = &[
    Route { origin: "JFK", destination: "LAX", airline: "AA", aircraft: "Boeing 737", base_price: 299.0, departure_hour: 8, duration_hours: 6 },
    Route { origin: "LAX", destination: "JFK", airline: "AA", aircraft: "Boeing 737", base_price: 315.0, departure_hour: 15, duration_hours: 5 },
    Route { origin: "SFO", destination: "SEA", airline: "UA", aircraft: "Airbus A320", base_price: 149.0, departure_hour: 10, duration_hours: 2 },
    Route { origin: "ORD", destination: "MIA", airline: "DL", aircraft: "Boeing 757", base_price: 219.0, departure_hour: 12, duration_hours: 3 },
];

const SEED_DAYS: i64 = 7;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load();

    let db = DbClient::connect(&config.database.dsn()).await?;
    db.migrate().await?;

    let search = PgSearchIndex::connect(&config.search.dsn_or(&config.database.dsn())).await?;
    search.ensure_schema().await?;

    let coordinator = BookingCoordinator::new(
        Arc::new(PgFlightStore::new(db.pool.clone())),
        Arc::new(PgSeatLockStore::new(db.pool.clone())),
        Arc::new(PgTicketStore::new(db.pool.clone())),
        Arc::new(PgIdempotencyStore::new(db.pool.clone())),
        Arc::new(search),
        config.hold.ttl(),
        config.idempotency.retention(),
    );

    let today = Utc::now().date_naive();
    let mut flights = 0usize;
    let mut seats = 0usize;

    for day in 1..=SEED_DAYS {
        let date = today + Duration::days(day);
        for route in ROUTES {
            let departure = date
                .and_hms_opt(route.departure_hour as u32, 0, 0)
                .expect("valid departure hour")
                .and_utc();

            let created = coordinator
                .create_flight(CreateFlightRequest {
                    origin: route.origin.to_string(),
                    destination: route.destination.to_string(),
                    departure_time: departure,
                    arrival_time: departure + Duration::hours(route.duration_hours),
                    airline: route.airline.to_string(),
                    aircraft: route.aircraft.to_string(),
                    fare_class: "economy".to_string(),
                    base_price: route.base_price,
                    seat_config: Some(SeatConfiguration {
                        first_class_rows: 2,
                        business_rows: 4,
                        economy_rows: 20,
                        seats_per_row: 6,
                    }),
                })
                .await
                .map_err(|err| anyhow::anyhow!("failed to seed flight: {err}"))?;

            flights += 1;
            seats += created.seats_created;
        }
    }

    info!(flights, seats, "Seed completed");
    db.close().await;
    Ok(())
}
