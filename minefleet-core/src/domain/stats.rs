//! Fleet statistics
//!
//! Read-only view of the worker slots, exposed by the runner's control
//! server and rendered by the CLI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::device::DeviceBackend;

/// Lifecycle state of a worker slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotState {
    /// No cycle open; waiting for a task or to be re-armed
    Idle,
    /// A task was drawn, process not yet running
    Assigned,
    /// Compute process is running
    Running,
    /// Process exited on its own, output being evaluated
    Completed,
    /// Process was killed because its task went stale
    KilledStale,
}

impl std::fmt::Display for SlotState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotState::Idle => write!(f, "Idle"),
            SlotState::Assigned => write!(f, "Assigned"),
            SlotState::Running => write!(f, "Running"),
            SlotState::Completed => write!(f, "Completed"),
            SlotState::KilledStale => write!(f, "KilledStale"),
        }
    }
}

/// Snapshot of a single worker slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotStats {
    pub index: usize,
    pub device_id: u32,
    pub platform_id: u32,
    pub model: String,
    pub backend: DeviceBackend,
    pub state: SlotState,
    pub keep_alive: bool,
    pub pid: Option<u32>,
    pub task_id: Option<i64>,
    /// Latest throughput sample in hashes per second
    pub hashrate: u64,
    /// Number of cycles this slot has finished
    pub cycles: u64,
}

/// Aggregate view of the whole fleet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetStats {
    pub total_hashrate: u64,
    pub slots: Vec<SlotStats>,
    pub accepted_shares: u64,
    pub rejected_shares: u64,
    pub tasks_available: usize,
    pub last_refresh: Option<DateTime<Utc>>,
    pub uptime_secs: u64,
}

/// Formats a hashes-per-second value with a metric suffix
pub fn format_hashrate(hashes_per_sec: u64) -> String {
    const UNITS: [&str; 5] = ["H/s", "KH/s", "MH/s", "GH/s", "TH/s"];
    let mut value = hashes_per_sec as f64;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", hashes_per_sec, UNITS[0])
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}
