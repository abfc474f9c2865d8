//! Tasks repository
//!
//! Fetches the currently issued task list from the pool.

use anyhow::{Context, Result};
use async_trait::async_trait;
use minefleet_client::PoolClient;
use minefleet_core::domain::task::Task;
use std::sync::Arc;

/// Repository trait for the remote task source
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Fetches the full list of currently issued tasks
    async fn fetch_tasks(&self) -> Result<Vec<Task>>;
}

/// Pool API implementation of TaskRepository
pub struct PoolTaskRepository {
    client: Arc<PoolClient>,
}

impl PoolTaskRepository {
    pub fn new(client: Arc<PoolClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TaskRepository for PoolTaskRepository {
    async fn fetch_tasks(&self) -> Result<Vec<Task>> {
        self.client
            .fetch_tasks()
            .await
            .context("Failed to fetch tasks")
    }
}
