//! Detached work that outlives the request that started it.
//!
//! Stale-cache refreshes and timed-out roast generations are submitted here
//! instead of being spawned ad hoc, so failures land in one place (the log and
//! the `framecard_background_failures_total` counter) and shutdown can wait
//! for in-flight work.

use std::fmt::Display;
use std::future::Future;

use metrics::counter;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct BackgroundTasks {
    tracker: TaskTracker,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` to completion independently of the caller.
    ///
    /// The returned handle yields `None` when the task failed; dropping it
    /// does not cancel the task.
    pub fn spawn<F, T, E>(&self, name: &'static str, task: F) -> JoinHandle<Option<T>>
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        self.tracker.spawn(async move {
            match task.await {
                Ok(value) => {
                    debug!(target = "framecard::background", task = name, "task finished");
                    Some(value)
                }
                Err(err) => {
                    warn!(
                        target = "framecard::background",
                        task = name,
                        error = %err,
                        "background task failed"
                    );
                    counter!("framecard_background_failures_total", "task" => name).increment(1);
                    None
                }
            }
        })
    }

    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Wait for every task spawned so far, then accept new work again.
    pub async fn drain(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn failures_resolve_to_none() {
        let tasks = BackgroundTasks::new();
        let handle = tasks.spawn("failing", async { Err::<(), _>("boom") });
        assert_eq!(handle.await.unwrap(), None);
    }

    #[tokio::test]
    async fn drain_waits_for_dropped_handles() {
        let tasks = BackgroundTasks::new();
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let done = done.clone();
            drop(tasks.spawn("counting", async move {
                tokio::task::yield_now().await;
                done.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(())
            }));
        }

        tasks.drain().await;
        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert_eq!(tasks.in_flight(), 0);
    }
}
