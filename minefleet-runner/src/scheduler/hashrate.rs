//! Hashrate aggregator
//!
//! Periodically samples every slot's throughput counter into a
//! [`FleetStats`] view. Reads slot state, never writes it.

use anyhow::{Context, Result};
use minefleet_core::domain::stats::{FleetStats, format_hashrate};
use parking_lot::RwLock;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::pool::TaskPool;
use crate::service::ResultPipeline;
use crate::slot::WorkerSlot;

/// Hashrate document for mining OS dashboards
#[derive(Debug, Serialize)]
struct StatsFile {
    total_hashrate: u64,
    per_device: Vec<DeviceRate>,
    uptime_secs: u64,
    accepted: u64,
    rejected: u64,
}

#[derive(Debug, Serialize)]
struct DeviceRate {
    device_id: u32,
    platform_id: u32,
    model: String,
    hashrate: u64,
}

impl From<&FleetStats> for StatsFile {
    fn from(stats: &FleetStats) -> Self {
        Self {
            total_hashrate: stats.total_hashrate,
            per_device: stats
                .slots
                .iter()
                .map(|slot| DeviceRate {
                    device_id: slot.device_id,
                    platform_id: slot.platform_id,
                    model: slot.model.clone(),
                    hashrate: slot.hashrate,
                })
                .collect(),
            uptime_secs: stats.uptime_secs,
            accepted: stats.accepted_shares,
            rejected: stats.rejected_shares,
        }
    }
}

pub struct HashrateAggregator {
    slots: Vec<Arc<WorkerSlot>>,
    pool: Arc<TaskPool>,
    pipeline: Arc<ResultPipeline>,
    interval: Duration,
    stats_file: Option<PathBuf>,
    started: Instant,
    latest: RwLock<Option<FleetStats>>,
}

impl HashrateAggregator {
    pub fn new(
        slots: Vec<Arc<WorkerSlot>>,
        pool: Arc<TaskPool>,
        pipeline: Arc<ResultPipeline>,
        interval: Duration,
        stats_file: Option<PathBuf>,
    ) -> Self {
        Self {
            slots,
            pool,
            pipeline,
            interval,
            stats_file,
            started: Instant::now(),
            latest: RwLock::new(None),
        }
    }

    pub fn slots(&self) -> &[Arc<WorkerSlot>] {
        &self.slots
    }

    /// Takes a fresh sample of every slot
    pub fn sample(&self) -> FleetStats {
        let slots: Vec<_> = self.slots.iter().map(|slot| slot.stats()).collect();
        let snapshot = self.pool.snapshot();

        FleetStats {
            total_hashrate: slots.iter().map(|slot| slot.hashrate).sum(),
            slots,
            accepted_shares: self.pipeline.accepted(),
            rejected_shares: self.pipeline.rejected(),
            tasks_available: snapshot.len(),
            last_refresh: snapshot.refreshed_at(),
            uptime_secs: self.started.elapsed().as_secs(),
        }
    }

    /// Most recently published sample, or a fresh one before the first tick
    pub fn latest(&self) -> FleetStats {
        match self.latest.read().as_ref() {
            Some(stats) => stats.clone(),
            None => self.sample(),
        }
    }

    /// Starts the sampling loop
    pub async fn run(self: Arc<Self>) {
        info!("Starting hashrate aggregator (interval: {:?})", self.interval);

        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            let stats = self.sample();
            debug!("Total hashrate: {}", format_hashrate(stats.total_hashrate));

            if let Some(path) = &self.stats_file {
                if let Err(e) = write_stats_file(path, &stats).await {
                    warn!("Failed to write stats file: {:#}", e);
                }
            }

            *self.latest.write() = Some(stats);
        }
    }
}

/// Writes the stats document next to `path` and renames it into place
async fn write_stats_file(path: &Path, stats: &FleetStats) -> Result<()> {
    let body = serde_json::to_vec_pretty(&StatsFile::from(stats))?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, body)
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to move stats file to {}", path.display()))?;
    Ok(())
}
