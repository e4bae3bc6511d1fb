use crate::application_port::*;
use crate::domain_port::*;
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Periodically deletes blacklist entries whose tokens have expired.
/// Reads already ignore such entries; this only keeps storage small.
pub struct BlacklistSweeper {
    store: Arc<dyn BlacklistStore>,
    interval: Duration,
    cancellation_token: CancellationToken,
}

impl BlacklistSweeper {
    pub fn new(
        store: Arc<dyn BlacklistStore>,
        interval: Duration,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            store,
            interval,
            cancellation_token,
        }
    }

    pub async fn sweep_once(&self) -> Result<u64, AuthError> {
        let started = Instant::now();
        let cutoff = Utc::now();
        let deleted_count = self.store.purge_expired(cutoff).await?;
        tracing::info!(
            target: "blacklist_cleanup",
            %cutoff,
            deleted_count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "expired blacklist entries purged"
        );
        Ok(deleted_count)
    }

    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = self.cancellation_token.cancelled() => {
                    tracing::info!("blacklist sweeper shutting down...");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep_once().await {
                        tracing::error!("blacklist sweep failed: {:#?}", e);
                    }
                }
            }
        }
    }
}
