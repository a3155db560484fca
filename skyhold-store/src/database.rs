use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use tracing::info;

/// Shared handle on the authoritative database.
#[derive(Clone)]
pub struct DbClient {
    pub pool: Pool<Postgres>,
}

impl DbClient {
    pub async fn connect(dsn: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(25)
            .min_connections(5)
            .max_lifetime(Duration::from_secs(5 * 60))
            .acquire_timeout(Duration::from_secs(3))
            .connect(dsn)
            .await?;

        info!("Connected to database");
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Migrations completed successfully.");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
