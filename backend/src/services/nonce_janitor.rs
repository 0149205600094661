//! Background sweep of expired challenge nonces.
//!
//! Expired nonces are already unusable; the sweep only bounds memory held by
//! addresses that asked for a challenge and never logged in.

use std::sync::Arc;
use std::time::Duration;

use adapters::NonceStore;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Spawn a task that purges expired nonces every `interval`.
pub fn spawn_nonce_janitor(store: Arc<dyn NonceStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            sweep(store.as_ref()).await;
        }
    })
}

/// Run one purge pass, logging the outcome.
pub async fn sweep(store: &dyn NonceStore) -> usize {
    match store.purge_expired().await {
        Ok(0) => 0,
        Ok(removed) => {
            tracing::debug!(removed, "purged expired nonces");
            removed
        }
        Err(e) => {
            tracing::error!(error = %e, "nonce sweep failed");
            0
        }
    }
}
