//! Process supervisor
//!
//! Runs one compute process per cycle:
//! - resets the slot's diagnostic buffer and spawns the process
//! - streams its stderr into the buffer, sampling throughput on the way
//! - races natural exit against the stale watcher, killing on staleness
//! - interprets the captured output and reports exactly one
//!   [`CycleOutcome`] through a oneshot channel

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, Command};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::pool::{Staleness, TaskPool};
use crate::service::command::MinerCommand;
use crate::service::diagnostics::{self, MinerReport};
use crate::service::stale_watcher::watch_stale;
use crate::slot::{ExecutionCycle, WorkerSlot};

/// How long output capture may lag behind a killed process
///
/// A killed process can leave grandchildren holding the stderr pipe open.
const CAPTURE_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("failed to start compute process `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cycle supervision ended without reporting an outcome")]
    Abandoned,
}

/// How a cycle ended
#[derive(Debug)]
pub enum CycleOutcome {
    /// The process exited on its own
    CompletedNaturally(MinerReport),
    /// The process was killed because its task went stale; the report is
    /// kept for logging only and must never be submitted
    KilledStale {
        reason: Staleness,
        report: MinerReport,
    },
    /// The process could not be started
    LaunchFailed(SupervisorError),
}

/// Single-use completion signal of a launched cycle
pub struct CycleHandle {
    rx: oneshot::Receiver<CycleOutcome>,
}

impl CycleHandle {
    /// Waits until the process has exited and its output was evaluated
    pub async fn outcome(self) -> Result<CycleOutcome, SupervisorError> {
        self.rx.await.map_err(|_| SupervisorError::Abandoned)
    }
}

pub struct ProcessSupervisor {
    pool: Arc<TaskPool>,
    stale_check_interval: Duration,
}

impl ProcessSupervisor {
    pub fn new(pool: Arc<TaskPool>, stale_check_interval: Duration) -> Self {
        Self {
            pool,
            stale_check_interval,
        }
    }

    /// Starts supervising `command` for `cycle`
    pub fn launch(&self, cycle: &ExecutionCycle, command: MinerCommand) -> CycleHandle {
        let (tx, rx) = oneshot::channel();
        let slot = Arc::clone(cycle.slot());
        let pool = Arc::clone(&self.pool);
        let task_id = cycle.task.id;
        let interval = self.stale_check_interval;

        tokio::spawn(async move {
            let outcome = supervise(slot, pool, task_id, command, interval).await;
            let _ = tx.send(outcome);
        });

        CycleHandle { rx }
    }
}

async fn supervise(
    slot: Arc<WorkerSlot>,
    pool: Arc<TaskPool>,
    task_id: i64,
    command: MinerCommand,
    interval: Duration,
) -> CycleOutcome {
    slot.reset_diagnostics();

    let mut child = match Command::new(&command.program)
        .args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
    {
        Ok(child) => child,
        Err(source) => {
            return CycleOutcome::LaunchFailed(SupervisorError::Launch {
                command: command.display(),
                source,
            });
        }
    };

    slot.mark_running(child.id());
    debug!(
        "Slot {} started pid {:?} for task {}",
        slot.index(),
        child.id(),
        task_id
    );

    let capture = child
        .stderr
        .take()
        .map(|stderr| tokio::spawn(capture_diagnostics(Arc::clone(&slot), stderr)));

    let stale = tokio::select! {
        status = child.wait() => {
            match status {
                Ok(status) => debug!("Slot {} process exited: {}", slot.index(), status),
                Err(e) => warn!("Slot {} failed to wait on process: {}", slot.index(), e),
            }
            None
        }
        reason = watch_stale(&pool, task_id, interval) => {
            debug!("Slot {} task {} is stale ({:?}), killing", slot.index(), task_id, reason);
            if let Err(e) = child.start_kill() {
                warn!("Slot {} failed to kill process: {}", slot.index(), e);
            }
            if let Err(e) = child.wait().await {
                warn!("Slot {} failed to reap killed process: {}", slot.index(), e);
            }
            Some(reason)
        }
    };

    if let Some(mut capture) = capture {
        if tokio::time::timeout(CAPTURE_GRACE, &mut capture).await.is_err() {
            warn!(
                "Slot {} diagnostic stream still open after exit; truncating",
                slot.index()
            );
            capture.abort();
        }
    }

    let report = diagnostics::interpret(&slot.diagnostics());
    match stale {
        None => CycleOutcome::CompletedNaturally(report),
        Some(reason) => CycleOutcome::KilledStale { reason, report },
    }
}

/// Copies the process's stderr into the slot buffer until EOF
async fn capture_diagnostics(slot: Arc<WorkerSlot>, stderr: ChildStderr) {
    let mut reader = BufReader::new(stderr);
    let mut chunk = Vec::new();

    loop {
        chunk.clear();
        match reader.read_until(b'\n', &mut chunk).await {
            Ok(0) => break,
            Ok(_) => {
                slot.append_diagnostics(&chunk);
                if let Some(speed) = diagnostics::parse_speed(&String::from_utf8_lossy(&chunk)) {
                    slot.record_throughput(speed);
                }
            }
            Err(e) => {
                warn!("Slot {} diagnostic read failed: {}", slot.index(), e);
                break;
            }
        }
    }
}
