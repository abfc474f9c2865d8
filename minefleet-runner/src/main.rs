//! Minefleet Runner
//!
//! Supervises one compute process per accelerator device, keeping every
//! device busy on a current pool task.
//!
//! Architecture:
//! - Configuration: Load settings from environment
//! - Repositories: HTTP communication with the mining pool (tasks, solutions)
//! - Services: Process supervision, output interpretation, device discovery,
//!   result submission
//! - Scheduler: Task refresh, per-slot cycle driving, hashrate sampling
//! - API: Optional local stats and control server
//!
//! The runner refreshes the pool's task list in the background and drives
//! each device slot through cycles of draw, launch, watch and evaluate. A
//! process whose task goes stale is killed and its output discarded.

mod api;
mod config;
mod pool;
mod repository;
mod scheduler;
mod service;
mod slot;

use anyhow::{Context, Result};
use minefleet_client::{ClientError, PoolClient};
use minefleet_core::dto::auth::AuthResponse;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, oneshot};
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::AppState;
use crate::config::Config;
use crate::pool::TaskPool;
use crate::repository::{PoolSolutionRepository, PoolTaskRepository};
use crate::scheduler::{HashrateAggregator, SlotDriver, TaskRefresher};
use crate::service::discovery::log_device_summary;
use crate::service::{
    DeviceDiscovery, MessageBodyEncoder, MinerDiscovery, MinerSettings, ProcessSupervisor,
    ResultPipeline, platform,
};
use crate::slot::WorkerSlot;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "minefleet_runner=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Minefleet Runner");

    if let Err(e) = run().await {
        error!("Fatal: {:#}", e);
        return Err(e);
    }

    Ok(())
}

async fn run() -> Result<()> {
    // Load configuration
    let config = load_config()?;
    info!(
        "Loaded configuration: pool_url={}, miner_dir={}",
        config.pool_url,
        config.miner_dir.display()
    );

    platform::check_current()?;

    // Initialize pool client
    let client = Arc::new(PoolClient::new(
        config.pool_url.clone(),
        config.pool_token.clone(),
    ));

    info!("Authenticating with pool");
    let auth = authenticate_with_retry(&client).await?;
    info!(
        "Authorized as user {}, mining for {}",
        auth.user.id, auth.pool_address
    );

    // Discover devices
    let discovery = MinerDiscovery::new(config.cuda_path(), config.opencl_path());
    let devices = discovery
        .discover()
        .await
        .context("Failed to discover devices")?;
    log_device_summary(&devices);

    // Start task refresh and wait for the first task list
    let pool = Arc::new(TaskPool::new());
    let refresher = TaskRefresher::new(
        Arc::clone(&pool),
        Arc::new(PoolTaskRepository::new(Arc::clone(&client))),
        config.refresh_interval,
    );
    let (first_sync_tx, first_sync_rx) = oneshot::channel();
    tokio::spawn(refresher.run(first_sync_tx));

    info!("Waiting for the first task list");
    first_sync_rx
        .await
        .context("Task refresher stopped before the first sync")?;

    // Initialize services
    let supervisor = Arc::new(ProcessSupervisor::new(
        Arc::clone(&pool),
        config.stale_check_interval,
    ));
    let pipeline = Arc::new(ResultPipeline::new(
        Arc::new(MessageBodyEncoder),
        Arc::new(PoolSolutionRepository::new(Arc::clone(&client))),
    ));
    let settings = Arc::new(MinerSettings::from_config(&config, auth.pool_address));

    let slots: Vec<_> = devices
        .into_iter()
        .enumerate()
        .map(|(index, device)| WorkerSlot::new(index, device))
        .collect();

    // Start one driver per slot
    let mut drivers = JoinSet::new();
    for slot in &slots {
        let driver = SlotDriver::new(
            Arc::clone(slot),
            Arc::clone(&pool),
            Arc::clone(&supervisor),
            Arc::clone(&pipeline),
            Arc::clone(&settings),
            config.stale_check_interval,
        );
        drivers.spawn(driver.run());
    }
    info!("Started {} slot(s)", slots.len());

    let aggregator = Arc::new(HashrateAggregator::new(
        slots,
        pool,
        pipeline,
        config.hashrate_interval,
        config.stats_file.clone(),
    ));
    tokio::spawn(Arc::clone(&aggregator).run());

    let kill = Arc::new(Notify::new());
    if config.serve_stats {
        let state = AppState {
            aggregator,
            kill: Arc::clone(&kill),
            handle_kill: config.handle_kill,
        };
        let addr = config.stats_bind_addr.clone();
        tokio::spawn(async move {
            if let Err(e) = api::serve(&addr, state).await {
                error!("{:#}", e);
            }
        });
    } else if config.handle_kill {
        warn!("HANDLE_KILL has no effect without SERVE_STATS");
    }

    tokio::select! {
        result = wait_for_drivers(&mut drivers) => result,
        _ = kill.notified() => {
            info!("Kill requested, shutting down");
            // Let the 202 reach the caller before the runtime goes away
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok(())
        }
    }
}

/// Loads configuration from environment variables and validates it
fn load_config() -> Result<Config> {
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate()?;
    Ok(config)
}

/// Authenticate with the pool, retrying transport failures with exponential
/// backoff
///
/// A rejected token is fatal; anything else is assumed to be the pool or
/// network not being reachable yet.
async fn authenticate_with_retry(client: &PoolClient) -> Result<AuthResponse> {
    const INITIAL_DELAY_MS: u64 = 500;
    const MAX_DELAY_MS: u64 = 30_000;

    let mut attempt: u32 = 0;
    let mut delay_ms = INITIAL_DELAY_MS;

    loop {
        attempt += 1;

        match client.authenticate().await {
            Ok(auth) => {
                if attempt > 1 {
                    info!("Authenticated with pool after {} attempt(s)", attempt);
                }
                return Ok(auth);
            }
            Err(ClientError::Unauthorized) => {
                return Err(anyhow::anyhow!("Pool rejected the POOL_ID token"));
            }
            Err(e) => {
                warn!("Failed to authenticate with pool (attempt {}): {}", attempt, e);
                warn!("Retrying in {} ms...", delay_ms);

                tokio::time::sleep(Duration::from_millis(delay_ms)).await;

                // Exponential backoff with cap
                delay_ms = (delay_ms * 2).min(MAX_DELAY_MS);
            }
        }
    }
}

/// Resolves with the first fatal slot error
async fn wait_for_drivers(drivers: &mut JoinSet<Result<()>>) -> Result<()> {
    while let Some(joined) = drivers.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(e) => return Err(anyhow::anyhow!("Slot driver panicked: {}", e)),
        }
    }
    Ok(())
}
