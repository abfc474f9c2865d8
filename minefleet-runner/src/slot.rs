//! Worker slots
//!
//! A slot is bound one-to-one to an accelerator device for the lifetime of
//! the process. It owns at most one open [`ExecutionCycle`] at a time; the
//! cycle is a guard that returns the slot to `Idle` when dropped.

use chrono::{DateTime, Utc};
use minefleet_core::domain::device::DeviceDescriptor;
use minefleet_core::domain::stats::{SlotState, SlotStats};
use minefleet_core::domain::task::Task;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Notify;
use uuid::Uuid;

#[derive(Debug)]
struct SlotStatus {
    state: SlotState,
    task_id: Option<i64>,
    pid: Option<u32>,
}

/// Supervision unit for one device
pub struct WorkerSlot {
    index: usize,
    device: DeviceDescriptor,
    keep_alive: AtomicBool,
    rearm: Notify,
    cycle_open: AtomicBool,
    status: Mutex<SlotStatus>,
    /// Diagnostic stream of the current cycle's process
    diagnostics: Mutex<Vec<u8>>,
    /// Latest throughput sample, hashes per second
    throughput: AtomicU64,
    cycles: AtomicU64,
}

impl WorkerSlot {
    /// Creates an idle slot armed for its first task
    pub fn new(index: usize, device: DeviceDescriptor) -> Arc<Self> {
        Arc::new(Self {
            index,
            device,
            keep_alive: AtomicBool::new(true),
            rearm: Notify::new(),
            cycle_open: AtomicBool::new(false),
            status: Mutex::new(SlotStatus {
                state: SlotState::Idle,
                task_id: None,
                pid: None,
            }),
            diagnostics: Mutex::new(Vec::new()),
            throughput: AtomicU64::new(0),
            cycles: AtomicU64::new(0),
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn device(&self) -> &DeviceDescriptor {
        &self.device
    }

    // =============================================================================
    // Keep-alive
    // =============================================================================

    pub fn keep_alive(&self) -> bool {
        self.keep_alive.load(Ordering::SeqCst)
    }

    /// Pauses or resumes task pickup
    ///
    /// Pausing never interrupts a running cycle; the slot simply stays idle
    /// once that cycle ends. Resuming wakes an idle slot.
    pub fn set_keep_alive(&self, keep_alive: bool) {
        self.keep_alive.store(keep_alive, Ordering::SeqCst);
        if keep_alive {
            self.rearm.notify_one();
        }
    }

    /// Resolves once the slot is allowed to draw a task
    pub async fn armed(&self) {
        while !self.keep_alive() {
            self.rearm.notified().await;
        }
    }

    /// Resolves on the next resume
    pub async fn rearmed(&self) {
        self.rearm.notified().await;
    }

    // =============================================================================
    // Cycles
    // =============================================================================

    /// Opens a cycle for `task`
    ///
    /// Returns `None` if a cycle is already open on this slot.
    pub fn begin_cycle(self: &Arc<Self>, task: Task) -> Option<ExecutionCycle> {
        if self
            .cycle_open
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return None;
        }

        {
            let mut status = self.status.lock();
            status.state = SlotState::Assigned;
            status.task_id = Some(task.id);
            status.pid = None;
        }

        Some(ExecutionCycle {
            id: Uuid::new_v4(),
            task,
            started_at: Utc::now(),
            slot: Arc::clone(self),
        })
    }

    #[cfg(test)]
    pub fn has_open_cycle(&self) -> bool {
        self.cycle_open.load(Ordering::Acquire)
    }

    #[cfg(test)]
    pub fn state(&self) -> SlotState {
        self.status.lock().state
    }

    #[cfg(test)]
    pub fn active_pid(&self) -> Option<u32> {
        self.status.lock().pid
    }

    pub(crate) fn mark_running(&self, pid: Option<u32>) {
        let mut status = self.status.lock();
        status.state = SlotState::Running;
        status.pid = pid;
    }

    pub(crate) fn mark_finished(&self, state: SlotState) {
        let mut status = self.status.lock();
        status.state = state;
        status.pid = None;
    }

    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    // =============================================================================
    // Diagnostics and throughput
    // =============================================================================

    pub(crate) fn reset_diagnostics(&self) {
        self.diagnostics.lock().clear();
    }

    pub(crate) fn append_diagnostics(&self, chunk: &[u8]) {
        self.diagnostics.lock().extend_from_slice(chunk);
    }

    /// Captured diagnostic stream of the current (or last) cycle
    pub fn diagnostics(&self) -> String {
        String::from_utf8_lossy(&self.diagnostics.lock()).into_owned()
    }

    pub(crate) fn record_throughput(&self, hashes_per_sec: u64) {
        self.throughput.store(hashes_per_sec, Ordering::Relaxed);
    }

    /// Latest throughput sample in hashes per second
    pub fn throughput(&self) -> u64 {
        self.throughput.load(Ordering::Relaxed)
    }

    /// Point-in-time view for the stats surface
    pub fn stats(&self) -> SlotStats {
        let status = self.status.lock();
        SlotStats {
            index: self.index,
            device_id: self.device.device_id,
            platform_id: self.device.platform_id,
            model: self.device.model.clone(),
            backend: self.device.backend,
            state: status.state,
            keep_alive: self.keep_alive(),
            pid: status.pid,
            task_id: status.task_id,
            hashrate: self.throughput(),
            cycles: self.cycles(),
        }
    }
}

/// One task attempt on one slot
///
/// Holding the cycle is what makes the slot busy. Dropping it closes the
/// cycle and returns the slot to `Idle`.
pub struct ExecutionCycle {
    pub id: Uuid,
    pub task: Task,
    pub started_at: DateTime<Utc>,
    slot: Arc<WorkerSlot>,
}

impl ExecutionCycle {
    pub fn slot(&self) -> &Arc<WorkerSlot> {
        &self.slot
    }
}

impl Drop for ExecutionCycle {
    fn drop(&mut self) {
        {
            let mut status = self.slot.status.lock();
            status.state = SlotState::Idle;
            status.task_id = None;
            status.pid = None;
        }
        self.slot.throughput.store(0, Ordering::Relaxed);
        self.slot.cycles.fetch_add(1, Ordering::Relaxed);
        self.slot.cycle_open.store(false, Ordering::Release);
    }
}

#[cfg(test)]
pub(crate) fn test_device() -> DeviceDescriptor {
    use minefleet_core::domain::device::DeviceBackend;

    DeviceDescriptor {
        device_id: 1,
        platform_id: 0,
        model: "Test GPU".to_string(),
        executable_path: std::path::PathBuf::from("/bin/true"),
        backend: DeviceBackend::OpenCl,
    }
}
