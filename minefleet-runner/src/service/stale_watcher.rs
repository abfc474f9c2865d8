//! Stale task detection for running cycles

use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};

use crate::pool::{Staleness, TaskPool};

/// Polls the pool until the bound task is dropped or expires
///
/// Resolves with the reason the task went stale. The future never resolves
/// for a task that stays current, so callers race it against process exit
/// and drop it once the process is gone.
pub async fn watch_stale(pool: &TaskPool, task_id: i64, interval: Duration) -> Staleness {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let staleness = pool.staleness(task_id, chrono::Utc::now().timestamp());
        if staleness.is_stale() {
            return staleness;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::test_task;
    use std::sync::Arc;

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }

    #[tokio::test]
    async fn test_dropped_task_detected_within_interval() {
        let pool = Arc::new(TaskPool::new());
        pool.replace(vec![test_task(7, now() + 60), test_task(8, now() + 60)]);

        let watcher = {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move { watch_stale(&pool, 7, Duration::from_millis(20)).await })
        };

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!watcher.is_finished());

        pool.replace(vec![test_task(8, now() + 60)]);
        let reason = time::timeout(Duration::from_secs(1), watcher)
            .await
            .expect("watcher should notice the drop")
            .unwrap();
        assert_eq!(reason, Staleness::Dropped);
    }

    #[tokio::test]
    async fn test_expired_task_detected() {
        let pool = TaskPool::new();
        pool.replace(vec![test_task(3, now() - 1)]);

        let reason = time::timeout(
            Duration::from_secs(1),
            watch_stale(&pool, 3, Duration::from_millis(10)),
        )
        .await
        .unwrap();
        assert_eq!(reason, Staleness::Expired);
    }

    #[tokio::test]
    async fn test_other_tasks_leaving_is_not_staleness() {
        let pool = TaskPool::new();
        pool.replace(vec![test_task(1, now() + 60), test_task(2, now() + 60)]);
        pool.replace(vec![test_task(1, now() + 60)]);

        let result = time::timeout(
            Duration::from_millis(100),
            watch_stale(&pool, 1, Duration::from_millis(10)),
        )
        .await;
        assert!(result.is_err(), "task 1 is still current");
    }
}
