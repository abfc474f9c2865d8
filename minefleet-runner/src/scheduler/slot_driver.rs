//! Slot driver
//!
//! Drives one worker slot through its cycles: draw a task, launch the
//! compute process, wait for the outcome, hand a found proof to the result
//! pipeline, repeat while the slot is kept alive.

use anyhow::{Context, Result, bail};
use minefleet_core::domain::stats::SlotState;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, error, info};

use crate::pool::TaskPool;
use crate::service::diagnostics::MinerReport;
use crate::service::{
    CycleOutcome, MinerCommand, MinerSettings, ProcessSupervisor, ResultPipeline,
    SolutionAttempt, SubmissionVerdict,
};
use crate::slot::{ExecutionCycle, WorkerSlot};

/// What a single pass of the driver did
#[derive(Debug)]
pub enum CycleStep {
    /// No tasks to draw from; nothing was launched
    PoolEmpty,
    /// The drawn task had already expired; nothing was launched
    SkippedExpired(i64),
    /// The drawn task could not be formatted for the compute process
    SkippedInvalid(i64),
    /// A cycle ran to its end
    Finished {
        task_id: i64,
        state: SlotState,
        /// Pending submission when the process found a solution
        submission: Option<JoinHandle<SubmissionVerdict>>,
    },
}

pub struct SlotDriver {
    slot: Arc<WorkerSlot>,
    pool: Arc<TaskPool>,
    supervisor: Arc<ProcessSupervisor>,
    pipeline: Arc<ResultPipeline>,
    settings: Arc<MinerSettings>,
    /// Pause before redrawing after a skipped task
    retry_delay: Duration,
}

impl SlotDriver {
    pub fn new(
        slot: Arc<WorkerSlot>,
        pool: Arc<TaskPool>,
        supervisor: Arc<ProcessSupervisor>,
        pipeline: Arc<ResultPipeline>,
        settings: Arc<MinerSettings>,
        retry_delay: Duration,
    ) -> Self {
        Self {
            slot,
            pool,
            supervisor,
            pipeline,
            settings,
            retry_delay,
        }
    }

    /// Runs cycles until a fatal error
    pub async fn run(self) -> Result<()> {
        let device = self.slot.device();
        info!(
            "Slot {} driving {} #{} ({})",
            self.slot.index(),
            device.model,
            device.device_id,
            device.backend
        );

        loop {
            self.slot.armed().await;

            match self.run_once().await? {
                CycleStep::PoolEmpty => {
                    tokio::select! {
                        _ = self.pool.refreshed() => {}
                        _ = self.slot.rearmed() => {}
                    }
                }
                CycleStep::SkippedExpired(task_id) | CycleStep::SkippedInvalid(task_id) => {
                    debug!(
                        "Slot {} skipped task {}, redrawing in {:?}",
                        self.slot.index(),
                        task_id,
                        self.retry_delay
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                CycleStep::Finished {
                    task_id,
                    state,
                    submission,
                } => {
                    debug!(
                        "Slot {} finished task {} as {}{}",
                        self.slot.index(),
                        task_id,
                        state,
                        if submission.is_some() {
                            ", share submitted"
                        } else {
                            ""
                        }
                    );
                }
            }
        }
    }

    /// Draws one task and runs it to completion
    ///
    /// Only a launch failure or lost supervision is an error; everything
    /// else is reported through the returned step.
    pub async fn run_once(&self) -> Result<CycleStep> {
        let index = self.slot.index();

        let Some(task) = self.pool.draw() else {
            error!("Slot {}: no tasks available, waiting for refresh", index);
            return Ok(CycleStep::PoolEmpty);
        };

        if task.is_expired() {
            debug!("Slot {}: drawn task {} already expired", index, task.id);
            return Ok(CycleStep::SkippedExpired(task.id));
        }

        let command = match MinerCommand::build(self.slot.device(), &task, &self.settings) {
            Ok(command) => command,
            Err(e) => {
                error!("Slot {}: {}", index, e);
                return Ok(CycleStep::SkippedInvalid(task.id));
            }
        };

        let Some(cycle) = self.slot.begin_cycle(task) else {
            bail!("Slot {} already has an open cycle", index);
        };
        let task_id = cycle.task.id;
        debug!("Slot {} cycle {} starts task {}", index, cycle.id, task_id);

        let outcome = self
            .supervisor
            .launch(&cycle, command)
            .outcome()
            .await
            .with_context(|| format!("Slot {} lost its cycle", index))?;

        let (state, submission) = match outcome {
            CycleOutcome::CompletedNaturally(report) => {
                self.slot.mark_finished(SlotState::Completed);
                (SlotState::Completed, self.handle_report(&cycle, report))
            }
            CycleOutcome::KilledStale { reason, report } => {
                self.slot.mark_finished(SlotState::KilledStale);
                debug!("Slot {} killed task {} ({:?})", index, task_id, reason);
                if matches!(report, MinerReport::Found(_)) {
                    debug!(
                        "Slot {}: discarding solution for stale task {}",
                        index, task_id
                    );
                }
                (SlotState::KilledStale, None)
            }
            CycleOutcome::LaunchFailed(e) => {
                return Err(e).with_context(|| {
                    format!("Slot {} could not start its compute process", index)
                });
            }
        };

        let elapsed = chrono::Utc::now() - cycle.started_at;
        debug!(
            "Slot {} cycle {} ended after {} ms",
            index,
            cycle.id,
            elapsed.num_milliseconds()
        );
        drop(cycle);
        Ok(CycleStep::Finished {
            task_id,
            state,
            submission,
        })
    }

    fn handle_report(
        &self,
        cycle: &ExecutionCycle,
        report: MinerReport,
    ) -> Option<JoinHandle<SubmissionVerdict>> {
        let device = self.slot.device();
        match report {
            MinerReport::Nominal | MinerReport::NoSolution => {
                info!(
                    "Slot {} ({} #{}): working, no shares found for task {}",
                    self.slot.index(),
                    device.model,
                    device.device_id,
                    cycle.task.id
                );
                None
            }
            MinerReport::Malformed(e) => {
                error!(
                    "Slot {}: could not decode proof for task {}: {}",
                    self.slot.index(),
                    cycle.task.id,
                    e
                );
                None
            }
            MinerReport::Found(proof) => Some(self.pipeline.dispatch(SolutionAttempt {
                proof,
                task: cycle.task.clone(),
                device: device.clone(),
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::test_task;
    use crate::service::MessageBodyEncoder;
    use crate::service::command::test_settings;
    use crate::service::diagnostics::{SUCCESS_MARKER, sample_proof_hex};
    use crate::service::submission::test_support::RecordingSink;
    use crate::service::supervisor::test_support::write_script;
    use crate::slot::test_device;
    use std::path::Path;

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    struct Harness {
        pool: Arc<TaskPool>,
        slot: Arc<WorkerSlot>,
        sink: Arc<RecordingSink>,
        driver: SlotDriver,
    }

    fn harness(executable: &Path) -> Harness {
        let pool = Arc::new(TaskPool::new());
        let mut device = test_device();
        device.executable_path = executable.to_path_buf();
        let slot = WorkerSlot::new(0, device);
        let sink = RecordingSink::accepting();
        let pipeline = Arc::new(ResultPipeline::new(
            Arc::new(MessageBodyEncoder),
            sink.clone(),
        ));
        let supervisor = Arc::new(ProcessSupervisor::new(
            Arc::clone(&pool),
            Duration::from_millis(20),
        ));
        let driver = SlotDriver::new(
            Arc::clone(&slot),
            Arc::clone(&pool),
            supervisor,
            pipeline,
            Arc::new(test_settings()),
            Duration::from_millis(20),
        );
        Harness {
            pool,
            slot,
            sink,
            driver,
        }
    }

    fn found_script(tail: &str) -> String {
        format!(
            "echo working >&2\necho '{}' >&2\necho '{}' >&2\n{}",
            SUCCESS_MARKER,
            sample_proof_hex(),
            tail
        )
    }

    #[tokio::test]
    async fn test_found_solution_is_submitted() {
        let dir = tempfile::tempdir().unwrap();
        let miner = write_script(dir.path(), "miner", &found_script(""));
        let h = harness(&miner);
        h.pool.replace(vec![test_task(7, now() + 60)]);

        let step = h.driver.run_once().await.unwrap();
        let CycleStep::Finished {
            task_id,
            state,
            submission,
        } = step
        else {
            panic!("unexpected step {:?}", step);
        };

        assert_eq!(task_id, 7);
        assert_eq!(state, SlotState::Completed);
        let verdict = submission.expect("solution should be dispatched").await.unwrap();
        assert_eq!(verdict, SubmissionVerdict::Accepted);

        let calls = h.sink.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, 7);
        assert_eq!(calls[0].0, "ab".repeat(121));
        assert_eq!(h.slot.state(), SlotState::Idle);
        assert_eq!(h.slot.cycles(), 1);
    }

    #[tokio::test]
    async fn test_stale_cycle_is_never_submitted() {
        let dir = tempfile::tempdir().unwrap();
        let miner = write_script(dir.path(), "miner", &found_script("exec sleep 30"));
        let h = harness(&miner);
        h.pool.replace(vec![test_task(7, now() + 60)]);

        let pool = Arc::clone(&h.pool);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            pool.replace(vec![test_task(8, now() + 60)]);
        });

        let step = tokio::time::timeout(Duration::from_secs(5), h.driver.run_once())
            .await
            .expect("stale cycle should end")
            .unwrap();

        assert!(matches!(
            step,
            CycleStep::Finished {
                task_id: 7,
                state: SlotState::KilledStale,
                submission: None
            }
        ));
        assert!(h.sink.calls().is_empty());
    }

    #[tokio::test]
    async fn test_task_expiring_mid_run_is_killed() {
        let dir = tempfile::tempdir().unwrap();
        let miner = write_script(dir.path(), "miner", &found_script("exec sleep 30"));
        let h = harness(&miner);
        h.pool.replace(vec![test_task(7, now() + 1)]);

        let step = tokio::time::timeout(Duration::from_secs(5), h.driver.run_once())
            .await
            .expect("expired cycle should end")
            .unwrap();

        assert!(matches!(
            step,
            CycleStep::Finished {
                task_id: 7,
                state: SlotState::KilledStale,
                submission: None
            }
        ));
        assert!(h.sink.calls().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_proof_is_not_submitted() {
        let dir = tempfile::tempdir().unwrap();
        let miner = write_script(
            dir.path(),
            "miner",
            &format!("echo a >&2\necho '{}' >&2\necho abcd >&2", SUCCESS_MARKER),
        );
        let h = harness(&miner);
        h.pool.replace(vec![test_task(7, now() + 60)]);

        let step = h.driver.run_once().await.unwrap();
        assert!(matches!(step, CycleStep::Finished { submission: None, .. }));
        assert!(h.sink.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_pool_launches_nothing() {
        let h = harness(Path::new("/nonexistent/miner"));

        let step = h.driver.run_once().await.unwrap();
        assert!(matches!(step, CycleStep::PoolEmpty));
        assert_eq!(h.slot.cycles(), 0);
    }

    #[tokio::test]
    async fn test_expired_task_is_skipped() {
        let h = harness(Path::new("/nonexistent/miner"));
        h.pool.replace(vec![test_task(3, now() - 5)]);

        let step = h.driver.run_once().await.unwrap();
        assert!(matches!(step, CycleStep::SkippedExpired(3)));
        assert_eq!(h.slot.cycles(), 0);
    }

    #[tokio::test]
    async fn test_launch_failure_is_fatal() {
        let h = harness(Path::new("/nonexistent/miner"));
        h.pool.replace(vec![test_task(7, now() + 60)]);

        assert!(h.driver.run_once().await.is_err());
        assert!(!h.slot.has_open_cycle());
    }

    #[tokio::test]
    async fn test_paused_slot_stays_idle_until_resumed() {
        let dir = tempfile::tempdir().unwrap();
        let miner = write_script(dir.path(), "miner", "echo idle-run >&2");
        let h = harness(&miner);
        h.pool.replace(vec![test_task(7, now() + 60)]);
        h.slot.set_keep_alive(false);

        let slot = Arc::clone(&h.slot);
        let handle = tokio::spawn(h.driver.run());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(slot.cycles(), 0);

        slot.set_keep_alive(true);
        tokio::time::timeout(Duration::from_secs(5), async {
            while slot.cycles() == 0 {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .expect("resumed slot should run a cycle");
        handle.abort();
    }
}
