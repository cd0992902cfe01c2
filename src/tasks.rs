//! Managed worker threads for slow jobs (AI calls, async expansions).
//!
//! Jobs are fire-and-forget: one named OS thread per job, no bound, no
//! dedup, no ordering. The spawner keeps a shutdown flag that workers can
//! observe through a [`CancelToken`] before touching the foreground app.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::error::panic_message;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Read-only view of the spawner's shutdown flag.
#[derive(Debug, Clone)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Handle to one spawned job. Dropping it detaches the worker.
pub struct TaskHandle {
    id: Uuid,
    label: String,
    state: Arc<Mutex<JobState>>,
    join: Option<JoinHandle<()>>,
}

impl TaskHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn state(&self) -> JobState {
        *self.state.lock()
    }

    /// Wait for the worker and return its final state.
    pub fn join(mut self) -> JobState {
        if let Some(handle) = self.join.take() {
            if handle.join().is_err() {
                // The work closure is already wrapped in catch_unwind
                *self.state.lock() = JobState::Failed;
            }
        }
        self.state()
    }
}

impl std::fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("state", &self.state())
            .finish()
    }
}

/// Decrements the in-flight counter however the worker exits.
struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Spawns detached workers. Cheap to clone; clones share the shutdown flag.
#[derive(Clone, Default)]
pub struct TaskSpawner {
    shutdown: Arc<AtomicBool>,
    in_flight: Arc<AtomicUsize>,
}

impl TaskSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `work` on its own thread. Returns `None` after shutdown or if
    /// the OS refuses to create the thread.
    pub fn spawn<F>(&self, label: &str, work: F) -> Option<TaskHandle>
    where
        F: FnOnce(&CancelToken) -> anyhow::Result<()> + Send + 'static,
    {
        if self.is_shut_down() {
            debug!(label, "Spawner is shut down, dropping job");
            return None;
        }

        let id = Uuid::new_v4();
        let state = Arc::new(Mutex::new(JobState::Pending));
        let token = self.token();
        let in_flight = Arc::clone(&self.in_flight);
        in_flight.fetch_add(1, Ordering::SeqCst);

        let worker_state = Arc::clone(&state);
        let worker_label = label.to_string();
        let builder = std::thread::Builder::new().name(format!("job-{}", label));
        let spawned = builder.spawn(move || {
            let _guard = InFlightGuard(in_flight);
            *worker_state.lock() = JobState::Running;
            debug!(job_id = %id, label = %worker_label, "Job running");

            let outcome = catch_unwind(AssertUnwindSafe(|| work(&token)));
            let final_state = match outcome {
                Ok(Ok(())) => {
                    debug!(job_id = %id, label = %worker_label, "Job completed");
                    JobState::Completed
                }
                Ok(Err(e)) => {
                    warn!(job_id = %id, label = %worker_label, error = %e, "Job failed");
                    JobState::Failed
                }
                Err(payload) => {
                    error!(
                        job_id = %id,
                        label = %worker_label,
                        panic = %panic_message(payload.as_ref()),
                        "Job panicked"
                    );
                    JobState::Failed
                }
            };
            *worker_state.lock() = final_state;
        });

        match spawned {
            Ok(join) => Some(TaskHandle {
                id,
                label: label.to_string(),
                state,
                join: Some(join),
            }),
            Err(e) => {
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                error!(label, error = %e, "Failed to spawn worker thread");
                None
            }
        }
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            flag: Arc::clone(&self.shutdown),
        }
    }

    /// Refuse new jobs and signal running ones. Workers are not joined.
    pub fn shutdown(&self) {
        if !self.shutdown.swap(true, Ordering::SeqCst) {
            debug!(in_flight = self.in_flight(), "Task spawner shut down");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Number of jobs currently running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn completed_job() {
        let spawner = TaskSpawner::new();
        let handle = spawner.spawn("ok", |_| Ok(())).unwrap();
        assert!(!handle.label().is_empty());
        assert_eq!(handle.join(), JobState::Completed);
        assert_eq!(spawner.in_flight(), 0);
    }

    #[test]
    fn failed_and_panicking_jobs() {
        let spawner = TaskSpawner::new();
        let failed = spawner.spawn("err", |_| anyhow::bail!("nope")).unwrap();
        assert_eq!(failed.join(), JobState::Failed);

        let panicked = spawner
            .spawn("panic", |_| -> anyhow::Result<()> { panic!("boom") })
            .unwrap();
        assert_eq!(panicked.join(), JobState::Failed);
        assert_eq!(spawner.in_flight(), 0);
    }

    #[test]
    fn in_flight_counts_running_jobs() {
        let spawner = TaskSpawner::new();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let (started_tx, started_rx) = mpsc::channel::<()>();
        let handle = spawner
            .spawn("wait", move |_| {
                started_tx.send(()).ok();
                release_rx.recv().ok();
                Ok(())
            })
            .unwrap();

        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(spawner.in_flight(), 1);
        assert_eq!(handle.state(), JobState::Running);
        release_tx.send(()).unwrap();
        assert_eq!(handle.join(), JobState::Completed);
        assert_eq!(spawner.in_flight(), 0);
    }

    #[test]
    fn shutdown_refuses_new_jobs_and_signals_running_ones() {
        let spawner = TaskSpawner::new();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let handle = spawner
            .spawn("observe", move |token| {
                release_rx.recv().ok();
                if token.is_cancelled() {
                    anyhow::bail!("cancelled");
                }
                Ok(())
            })
            .unwrap();

        spawner.shutdown();
        assert!(spawner.is_shut_down());
        assert!(spawner.spawn("late", |_| Ok(())).is_none());

        release_tx.send(()).unwrap();
        assert_eq!(handle.join(), JobState::Failed);
    }

    #[test]
    fn handles_have_distinct_ids() {
        let spawner = TaskSpawner::new();
        let a = spawner.spawn("a", |_| Ok(())).unwrap();
        let b = spawner.spawn("b", |_| Ok(())).unwrap();
        assert_ne!(a.id(), b.id());
        a.join();
        b.join();
    }
}
