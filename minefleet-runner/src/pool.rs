//! Task pool
//!
//! Process-wide snapshot of the currently issued tasks. The refresh loop is
//! the only writer; slots and their stale watchers are readers. A refresh
//! swaps in a whole new immutable snapshot, so a reader holding an
//! `Arc<TaskSnapshot>` never sees a partially replaced list.

use chrono::{DateTime, Utc};
use minefleet_core::domain::task::Task;
use parking_lot::RwLock;
use rand::Rng;
use rand::seq::SliceRandom;
use std::sync::Arc;
use tokio::sync::Notify;

/// Immutable list of tasks as returned by one refresh
#[derive(Debug, Default)]
pub struct TaskSnapshot {
    tasks: Vec<Task>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl TaskSnapshot {
    #[cfg(test)]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// When this snapshot was taken; `None` before the first refresh
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    pub fn find(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Uniformly random task; independent draws may return the same task
    pub fn pick_random<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Task> {
        self.tasks.choose(rng)
    }
}

/// Whether a task bound to a running cycle is still worth computing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staleness {
    Current,
    /// The task id is no longer issued
    Dropped,
    /// Still issued but past its expiry
    Expired,
}

impl Staleness {
    pub fn is_stale(self) -> bool {
        self != Staleness::Current
    }
}

/// Shared, atomically replaced task snapshot
pub struct TaskPool {
    current: RwLock<Arc<TaskSnapshot>>,
    refreshed: Notify,
}

impl TaskPool {
    /// Creates an empty pool
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(TaskSnapshot::default())),
            refreshed: Notify::new(),
        }
    }

    /// Current snapshot; stays valid and unchanged while held
    pub fn snapshot(&self) -> Arc<TaskSnapshot> {
        self.current.read().clone()
    }

    /// Replaces the snapshot wholesale
    ///
    /// An empty list is ignored so a transient empty answer never wipes the
    /// last known tasks. Returns whether the snapshot was replaced.
    pub fn replace(&self, tasks: Vec<Task>) -> bool {
        if tasks.is_empty() {
            return false;
        }

        let snapshot = Arc::new(TaskSnapshot {
            tasks,
            refreshed_at: Some(Utc::now()),
        });
        *self.current.write() = snapshot;
        self.refreshed.notify_waiters();
        true
    }

    /// Draws one task uniformly at random from the current snapshot
    pub fn draw(&self) -> Option<Task> {
        self.snapshot()
            .pick_random(&mut rand::thread_rng())
            .cloned()
    }

    /// Checks a task id against the current snapshot at `now` (unix seconds)
    ///
    /// Only this task's presence and expiry matter; other tasks coming and
    /// going, or the pool being otherwise empty, do not.
    pub fn staleness(&self, task_id: i64, now: i64) -> Staleness {
        match self.snapshot().find(task_id) {
            None => Staleness::Dropped,
            Some(task) if task.is_expired_at(now) => Staleness::Expired,
            Some(_) => Staleness::Current,
        }
    }

    /// Resolves after the next successful replacement
    pub async fn refreshed(&self) {
        self.refreshed.notified().await;
    }
}

impl Default for TaskPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) fn test_task(id: i64, expiry: i64) -> Task {
    Task {
        id,
        seed: "0a0b0c".to_string(),
        complexity: "00ff".to_string(),
        recipient: "EQgiver".to_string(),
        expiry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn test_empty_pool_draws_nothing() {
        let pool = TaskPool::new();
        assert!(pool.snapshot().is_empty());
        assert!(pool.snapshot().refreshed_at().is_none());
        assert!(pool.draw().is_none());
    }

    #[test]
    fn test_replace_ignores_empty_list() {
        let pool = TaskPool::new();
        assert!(pool.replace(vec![test_task(1, 100)]));
        assert!(!pool.replace(vec![]));

        let snapshot = pool.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.tasks()[0].id, 1);
        assert!(snapshot.refreshed_at().is_some());
    }

    #[test]
    fn test_held_snapshot_is_unaffected_by_replace() {
        let pool = TaskPool::new();
        pool.replace(vec![test_task(1, 100), test_task(2, 100)]);

        let held = pool.snapshot();
        pool.replace(vec![test_task(3, 100)]);

        assert_eq!(held.len(), 2);
        assert!(held.find(1).is_some());
        assert!(pool.snapshot().find(1).is_none());
    }

    #[test]
    fn test_staleness() {
        let pool = TaskPool::new();
        pool.replace(vec![test_task(7, 160), test_task(8, 90)]);

        assert_eq!(pool.staleness(7, 100), Staleness::Current);
        assert_eq!(pool.staleness(8, 100), Staleness::Expired);
        assert_eq!(pool.staleness(9, 100), Staleness::Dropped);
        assert!(!Staleness::Current.is_stale());
        assert!(Staleness::Dropped.is_stale());
    }

    #[test]
    fn test_single_task_draws_can_collide() {
        let pool = TaskPool::new();
        pool.replace(vec![test_task(5, i64::MAX)]);

        let a = pool.draw().unwrap();
        let b = pool.draw().unwrap();
        assert_eq!(a.id, 5);
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_pick_random_covers_all_tasks() {
        let snapshot = TaskSnapshot {
            tasks: (0..4).map(|id| test_task(id, 100)).collect(),
            refreshed_at: None,
        };
        let mut rng = StdRng::seed_from_u64(11);
        let seen: HashSet<i64> = (0..200)
            .filter_map(|_| snapshot.pick_random(&mut rng).map(|t| t.id))
            .collect();
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_readers_never_see_partial_replacement() {
        let pool = Arc::new(TaskPool::new());
        let small: Vec<Task> = (0..3).map(|id| test_task(id, 100)).collect();
        let large: Vec<Task> = (10..15).map(|id| test_task(id, 100)).collect();
        pool.replace(small.clone());

        let writer = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || {
                for i in 0..500 {
                    if i % 2 == 0 {
                        pool.replace(large.clone());
                    } else {
                        pool.replace(small.clone());
                    }
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    for _ in 0..500 {
                        let snapshot = pool.snapshot();
                        let ids: Vec<i64> = snapshot.tasks().iter().map(|t| t.id).collect();
                        assert!(ids == vec![0, 1, 2] || ids == vec![10, 11, 12, 13, 14]);
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }

    #[tokio::test]
    async fn test_refreshed_wakes_waiter() {
        let pool = Arc::new(TaskPool::new());
        let waiter = {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move { pool.refreshed().await })
        };

        tokio::task::yield_now().await;
        // replace until the waiter has registered and observed it
        let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(2);
        while !waiter.is_finished() && tokio::time::Instant::now() < deadline {
            pool.replace(vec![test_task(1, 100)]);
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert!(waiter.is_finished());
    }
}
