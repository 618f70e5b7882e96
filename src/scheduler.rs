// src/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::update::{UpdateError, UpdateRequest, Updater};

#[derive(Clone, Copy, Debug)]
pub struct SchedulerCfg {
    pub interval_secs: u64,
}

/// Spawn the periodic refresh loop. The first tick fires immediately, so a
/// fresh process fetches once on startup. Returns `None` when disabled
/// (`interval_secs == 0`).
pub fn spawn_update_scheduler(cfg: SchedulerCfg, updater: Arc<Updater>) -> Option<JoinHandle<()>> {
    if cfg.interval_secs == 0 {
        tracing::info!(target: "radar::update", "scheduler disabled");
        return None;
    }

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(cfg.interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match updater.run_update(UpdateRequest::default()).await {
                Ok(report) => tracing::info!(
                    target: "radar::update",
                    records = report.records,
                    "scheduled update completed"
                ),
                Err(UpdateError::Busy) => tracing::info!(
                    target: "radar::update",
                    "scheduled update skipped, another run in progress"
                ),
                // Failure is already counted and logged by the updater.
                Err(_) => {}
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RadarConfig;
    use crate::research::{FixtureClient, MOCK_RESPONSE};
    use crate::store::{CountryStore, StoreHandle};

    fn updater() -> Arc<Updater> {
        let cfg = RadarConfig::default();
        let store = StoreHandle::new(CountryStore::new(cfg.store_policy()));
        Arc::new(Updater::new(
            store,
            Arc::new(FixtureClient::new(MOCK_RESPONSE)),
            &cfg,
        ))
    }

    #[tokio::test]
    async fn zero_interval_disables() {
        assert!(spawn_update_scheduler(SchedulerCfg { interval_secs: 0 }, updater()).is_none());
    }

    #[tokio::test]
    async fn first_tick_runs_immediately() {
        let u = updater();
        let handle =
            spawn_update_scheduler(SchedulerCfg { interval_secs: 3600 }, u.clone()).unwrap();

        let mut populated = false;
        for _ in 0..50 {
            if u.store().read().last_updated().is_some() {
                populated = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        handle.abort();
        assert!(populated, "scheduler did not run on startup");
    }
}
