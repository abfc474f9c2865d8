//! Service layer
//!
//! Services contain the runner's supervision logic: launching and watching
//! compute processes, interpreting their output, discovering devices and
//! submitting solutions.
//!
//! Seams that touch the outside world (device discovery, proof encoding)
//! are trait-based to enable testing.

pub mod command;
pub mod diagnostics;
pub mod discovery;
pub mod platform;
pub mod stale_watcher;
pub mod submission;
pub mod supervisor;

// Re-export traits
pub use discovery::DeviceDiscovery;

// Re-export implementations
pub use command::{MinerCommand, MinerSettings};
pub use discovery::MinerDiscovery;
pub use submission::{MessageBodyEncoder, ResultPipeline, SolutionAttempt, SubmissionVerdict};
pub use supervisor::{CycleOutcome, ProcessSupervisor};
