//! Periodic removal of expired pastes.
//!
//! Stores hide expired keys from reads on their own; the sweep only reclaims
//! the space they still occupy.

use sadbin_core::PasteService;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Run one sweep on the blocking pool and return how many entries it removed.
pub async fn purge_once(service: Arc<PasteService>) -> usize {
    match tokio::task::spawn_blocking(move || service.purge_expired()).await {
        Ok(Ok(removed)) => {
            if removed > 0 {
                tracing::info!("Purged {} expired paste(s)", removed);
            }
            removed
        }
        Ok(Err(err)) => {
            tracing::warn!("Expired paste sweep failed: {}", err);
            0
        }
        Err(err) => {
            tracing::warn!("Expired paste sweep task failed: {}", err);
            0
        }
    }
}

/// Sweep expired entries every `every` until the runtime shuts down.
pub fn spawn_purge_task(service: Arc<PasteService>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            purge_once(service.clone()).await;
        }
    })
}
