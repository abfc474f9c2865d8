//! Repository layer
//!
//! Repositories abstract communication with the mining pool behind narrow
//! traits so the scheduler and services can be tested without a network.

mod solutions;
mod tasks;

// Re-export traits
pub use solutions::SolutionRepository;
pub use tasks::TaskRepository;

// Re-export implementations
pub use solutions::PoolSolutionRepository;
pub use tasks::PoolTaskRepository;
