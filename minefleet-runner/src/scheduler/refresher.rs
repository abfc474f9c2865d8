//! Task refresher
//!
//! Polls the pool for the current task list and swaps it into the shared
//! [`TaskPool`]. Failures and empty answers keep the previous snapshot.

use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::pool::TaskPool;
use crate::repository::TaskRepository;

/// Task refresh loop
pub struct TaskRefresher {
    pool: Arc<TaskPool>,
    source: Arc<dyn TaskRepository>,
    interval: Duration,
}

impl TaskRefresher {
    pub fn new(pool: Arc<TaskPool>, source: Arc<dyn TaskRepository>, interval: Duration) -> Self {
        Self {
            pool,
            source,
            interval,
        }
    }

    /// Starts the refresh loop
    ///
    /// `first_sync` fires after the first successful replacement.
    pub async fn run(self, first_sync: oneshot::Sender<()>) {
        info!("Starting task refresher (interval: {:?})", self.interval);

        let mut first_sync = Some(first_sync);
        let mut interval = time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            if self.refresh_once().await {
                if let Some(tx) = first_sync.take() {
                    info!("Initial task list received");
                    let _ = tx.send(());
                }
            }
        }
    }

    /// Performs a single refresh; returns whether the snapshot was replaced
    pub async fn refresh_once(&self) -> bool {
        match self.source.fetch_tasks().await {
            Ok(tasks) => {
                let count = tasks.len();
                if self.pool.replace(tasks) {
                    debug!("Task pool refreshed with {} task(s)", count);
                    true
                } else {
                    warn!("Pool returned no tasks, keeping previous snapshot");
                    false
                }
            }
            Err(e) => {
                error!("Error refreshing tasks: {:#}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::test_task;
    use anyhow::Result;
    use async_trait::async_trait;
    use minefleet_core::domain::task::Task;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Replays scripted answers, then keeps failing
    struct ScriptedSource {
        answers: Mutex<VecDeque<Result<Vec<Task>>>>,
    }

    impl ScriptedSource {
        fn new(answers: Vec<Result<Vec<Task>>>) -> Arc<Self> {
            Arc::new(Self {
                answers: Mutex::new(answers.into()),
            })
        }
    }

    #[async_trait]
    impl TaskRepository for ScriptedSource {
        async fn fetch_tasks(&self) -> Result<Vec<Task>> {
            self.answers
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow::anyhow!("pool unreachable")))
        }
    }

    #[tokio::test]
    async fn test_failures_and_empty_answers_keep_snapshot() {
        let pool = Arc::new(TaskPool::new());
        let source = ScriptedSource::new(vec![
            Ok(vec![test_task(1, i64::MAX), test_task(2, i64::MAX)]),
            Err(anyhow::anyhow!("timeout")),
            Ok(vec![]),
            Ok(vec![test_task(3, i64::MAX)]),
        ]);
        let refresher = TaskRefresher::new(Arc::clone(&pool), source, Duration::from_millis(10));

        assert!(refresher.refresh_once().await);
        assert!(!refresher.refresh_once().await);
        assert!(!refresher.refresh_once().await);
        assert_eq!(pool.snapshot().len(), 2);

        assert!(refresher.refresh_once().await);
        assert!(pool.snapshot().find(3).is_some());
        assert!(pool.snapshot().find(1).is_none());
    }

    #[tokio::test]
    async fn test_first_sync_waits_for_tasks() {
        let pool = Arc::new(TaskPool::new());
        let source = ScriptedSource::new(vec![
            Err(anyhow::anyhow!("not yet")),
            Ok(vec![]),
            Ok(vec![test_task(5, i64::MAX)]),
        ]);
        let refresher = TaskRefresher::new(Arc::clone(&pool), source, Duration::from_millis(10));

        let (tx, rx) = oneshot::channel();
        let handle = tokio::spawn(refresher.run(tx));

        time::timeout(Duration::from_secs(2), rx)
            .await
            .expect("first sync should fire")
            .unwrap();
        assert_eq!(pool.snapshot().len(), 1);
        handle.abort();
    }
}
