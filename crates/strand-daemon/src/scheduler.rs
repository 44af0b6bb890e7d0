// crates/strand-daemon/src/scheduler.rs
//
// Re-probe scheduler for the Strand daemon.
//
// Every interval, probes the members of each known pool (bounded by
// max_concurrency) and then refreshes the pool so members that fell below
// the participation floor or were evicted drop out.

use std::time::Duration;

use tokio::sync::watch;

use strand_probe::sweep_pool;
use strand_rpc::NodeServices;

/// Counters from one sweep over all pools.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub pools: usize,
    pub probes: usize,
    pub successes: usize,
    pub evictions: usize,
}

pub struct ReprobeScheduler {
    services: NodeServices,
    interval: Duration,
    max_concurrency: usize,
}

impl ReprobeScheduler {
    pub fn new(services: NodeServices, interval: Duration, max_concurrency: usize) -> Self {
        Self {
            services,
            interval,
            max_concurrency,
        }
    }

    /// Run sweeps until `shutdown` flips to true.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            "Re-probe scheduler started (interval={:?}, max_concurrency={})",
            self.interval,
            self.max_concurrency
        );

        let mut ticker = tokio::time::interval(self.interval);
        // The first tick fires immediately; skip it so start-up is not a sweep.
        ticker.tick().await;

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Re-probe scheduler received shutdown signal");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let summary = self.sweep_once().await;
                    tracing::info!(
                        "Sweep done: {} pools, {} probes, {} ok, {} evicted",
                        summary.pools,
                        summary.probes,
                        summary.successes,
                        summary.evictions
                    );
                }
            }
        }
    }

    /// Probe every pool once and refresh its membership.
    pub async fn sweep_once(&self) -> SweepSummary {
        let self_id = self.services.self_id();
        let mut summary = SweepSummary::default();

        for pool in self.services.pools.list().await {
            let reports = sweep_pool(
                &pool,
                self.services.prober.clone(),
                &self_id,
                self.max_concurrency,
            )
            .await;

            summary.pools += 1;
            summary.probes += reports.len();
            summary.successes += reports.iter().filter(|(_, r)| r.result.is_success()).count();
            summary.evictions += reports.iter().filter(|(_, r)| r.evicted()).count();

            if let Err(e) = self.services.pools.refresh_pool(&pool).await {
                tracing::warn!("Failed to refresh pool {}: {}", pool.id, e);
            }
        }

        summary
    }
}
