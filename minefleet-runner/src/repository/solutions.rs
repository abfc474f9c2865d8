//! Solutions repository
//!
//! Submits encoded solutions to the pool, one call per solution.

use anyhow::{Context, Result};
use async_trait::async_trait;
use minefleet_client::PoolClient;
use minefleet_core::domain::task::Task;
use minefleet_core::dto::solution::SubmitSolutionResponse;
use std::sync::Arc;

/// Repository trait for the remote result sink
#[async_trait]
pub trait SolutionRepository: Send + Sync {
    /// Submits an encoded payload for `task`
    ///
    /// # Returns
    /// The pool's verdict; `Err` only for transport or decoding failures
    async fn submit(&self, payload: String, task: &Task) -> Result<SubmitSolutionResponse>;
}

/// Pool API implementation of SolutionRepository
pub struct PoolSolutionRepository {
    client: Arc<PoolClient>,
}

impl PoolSolutionRepository {
    pub fn new(client: Arc<PoolClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SolutionRepository for PoolSolutionRepository {
    async fn submit(&self, payload: String, task: &Task) -> Result<SubmitSolutionResponse> {
        self.client
            .submit_solution(payload, task)
            .await
            .context("Failed to submit solution")
    }
}
