//! Scheduler layer for the runner
//!
//! This layer runs the long-lived loops: refreshing the task pool, driving
//! each worker slot through its cycles and sampling fleet hashrate.

pub mod hashrate;
pub mod refresher;
pub mod slot_driver;

pub use hashrate::HashrateAggregator;
pub use refresher::TaskRefresher;
pub use slot_driver::SlotDriver;
