// crates/strand-probe/src/sweep.rs
//
// Probe every member of a pool with bounded concurrency.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use strand_core::ids::NodeId;
use strand_core::pool::Pool;

use crate::prober::{ProbeReport, Prober};

/// Probe all members of `pool` except `self_id`, at most `max_concurrency`
/// at a time. Reports come back in completion order.
pub async fn sweep_pool(
    pool: &Pool,
    prober: Arc<Prober>,
    self_id: &NodeId,
    max_concurrency: usize,
) -> Vec<(NodeId, ProbeReport)> {
    let permits = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for member in pool.members.iter().filter(|m| *m != self_id) {
        let member = *member;
        let hash = pool.hash;
        let prober = prober.clone();
        let permits = permits.clone();
        tasks.spawn(async move {
            // Never closed while tasks are running.
            let _permit = permits.acquire_owned().await.ok();
            let report = prober.probe(&hash, &member, None).await;
            (member, report)
        });
    }

    let mut reports = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(report) => reports.push(report),
            Err(e) => tracing::warn!("Probe task for pool {} failed: {}", pool.id, e),
        }
    }

    tracing::debug!(
        "Swept pool {} ({}): {} probes",
        pool.id,
        pool.hash.short(),
        reports.len()
    );
    reports
}
