//! Core domain types
//!
//! These types represent the entities the runner supervises and reports on.
//! They are shared between the runner (which owns them) and the CLI (which
//! renders them).

pub mod device;
pub mod stats;
pub mod task;
