//! Explicit, ownership-correct replacement for the `weakref.WeakSet` +
//! done-callback task bookkeeping pattern: every spawned background task's
//! `JoinHandle` is held directly, named, and abortable.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::warn;

/// A snapshot of one tracked task's state, as surfaced on `/status`.
#[derive(Debug, Clone)]
pub struct TrackedTaskStatus {
    pub id: u64,
    pub name: String,
    pub finished: bool,
}

struct Entry {
    id: u64,
    name: String,
    handle: JoinHandle<()>,
}

/// Owns every background task spawned by a service, so shutdown can cancel
/// and await all of them under one deadline instead of leaking tasks.
pub struct TaskTracker {
    entries: Mutex<Vec<Entry>>,
    next_id: Mutex<u64>,
}

impl Default for TaskTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskTracker {
    #[must_use]
    pub fn new() -> Self {
        TaskTracker {
            entries: Mutex::new(Vec::new()),
            next_id: Mutex::new(1),
        }
    }

    /// Spawn a future as a named, tracked task.
    pub fn spawn_tracked<F>(&self, name: impl Into<String>, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = {
            let mut next_id = self.next_id.lock().unwrap();
            let id = *next_id;
            *next_id += 1;
            id
        };
        let name = name.into();
        let handle = tokio::spawn(fut);
        self.entries.lock().unwrap().push(Entry { id, name, handle });
    }

    /// A snapshot of every task's id, name, and completion state.
    #[must_use]
    pub fn status(&self) -> Vec<TrackedTaskStatus> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|e| TrackedTaskStatus {
                id: e.id,
                name: e.name.clone(),
                finished: e.handle.is_finished(),
            })
            .collect()
    }

    /// Abort every tracked task and await completion up to `timeout`,
    /// logging a warning naming any task still outstanding when the ceiling
    /// elapses. Survivors are simply dropped — Tokio detaches the
    /// underlying task rather than leaking an OS thread.
    pub async fn shutdown(&self, timeout: Duration) {
        let entries = std::mem::take(&mut *self.entries.lock().unwrap());
        for entry in &entries {
            entry.handle.abort();
        }

        let names: Vec<String> = entries.iter().map(|e| e.name.clone()).collect();
        let joined = futures_util::future::join_all(entries.into_iter().map(|e| e.handle));

        match tokio::time::timeout(timeout, joined).await {
            Ok(_) => {}
            Err(_) => {
                warn!(
                    tasks = ?names,
                    timeout_secs = timeout.as_secs(),
                    "tasks did not complete before shutdown ceiling; abandoning"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn status_reports_finished_tasks() {
        let tracker = TaskTracker::new();
        tracker.spawn_tracked("noop", async {});
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        let status = tracker.status();
        assert_eq!(status.len(), 1);
        assert_eq!(status[0].name, "noop");
        assert!(status[0].finished);
    }

    #[tokio::test]
    async fn shutdown_aborts_long_running_tasks_within_ceiling() {
        let tracker = TaskTracker::new();
        let ran_to_completion = Arc::new(AtomicBool::new(false));
        let flag = ran_to_completion.clone();
        tracker.spawn_tracked("forever", async move {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            flag.store(true, Ordering::SeqCst);
        });

        let start = tokio::time::Instant::now();
        tracker.shutdown(Duration::from_millis(50)).await;
        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(!ran_to_completion.load(Ordering::SeqCst));
    }
}
