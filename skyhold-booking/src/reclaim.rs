use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::coordinator::BookingCoordinator;

const RECLAIM_INTERVAL: Duration = Duration::from_secs(60);
const PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Spawn the single per-process reclamation task: a 60-second sweep of
/// expired holds and an hourly purge of aged idempotency keys. Abort the
/// returned handle on shutdown.
///
/// Sweeping only reclaims storage; a hold becomes acquirable the instant
/// it expires via the lock-engine predicate, and concurrent sweeps are
/// safe because reclamation is idempotent.
pub fn spawn_reclaim_scheduler(coordinator: Arc<BookingCoordinator>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut reclaim = interval(RECLAIM_INTERVAL);
        reclaim.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut purge = interval(PURGE_INTERVAL);
        purge.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Reclamation scheduler started");

        loop {
            tokio::select! {
                _ = reclaim.tick() => {
                    match coordinator.reclaim_expired_holds().await {
                        Ok(reclaimed) => debug!(reclaimed, "Expired holds swept"),
                        Err(err) => error!(%err, "Failed to sweep expired holds"),
                    }
                }
                _ = purge.tick() => {
                    match coordinator.purge_idempotency_keys().await {
                        Ok(purged) => debug!(purged, "Idempotency keys purged"),
                        Err(err) => error!(%err, "Failed to purge idempotency keys"),
                    }
                }
            }
        }
    })
}
