//! Periodic task scheduler
//!
//! Every task registered with [`Scheduler::spawn_periodic`] runs on its own
//! tokio interval and returns a [`TaskHandle`] that stops it. A cycle that is
//! in flight when a stop is requested is dropped at its next await point, so
//! once a handle is shut down (or the scheduler is) the job never runs again.

use passpilot_util::TaskId;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Owns the shutdown signal shared by every task it spawns
#[derive(Debug)]
pub struct Scheduler {
    shutdown_tx: watch::Sender<bool>,
    running: Arc<watch::Sender<usize>>,
}

impl Scheduler {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        let (running, _) = watch::channel(0);
        Self {
            shutdown_tx,
            running: Arc::new(running),
        }
    }

    /// Run `job` every `period`, starting immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_periodic<F, Fut>(&self, name: &str, period: Duration, mut job: F) -> TaskHandle
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = TaskId::new();
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        self.running.send_modify(|n| *n += 1);
        let guard = RunningGuard(self.running.clone());
        let task_name = name.to_string();

        let join = tokio::spawn(async move {
            let _guard = guard;
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            debug!(task = %task_name, task_id = %id, period_ms = period.as_millis() as u64, "Task started");

            loop {
                tokio::select! {
                    biased;
                    _ = stopped(&mut stop_rx) => break,
                    _ = stopped(&mut shutdown_rx) => break,
                    _ = interval.tick() => {
                        tokio::select! {
                            biased;
                            _ = stopped(&mut stop_rx) => break,
                            _ = stopped(&mut shutdown_rx) => break,
                            _ = job() => {}
                        }
                    }
                }
            }

            debug!(task = %task_name, task_id = %id, "Task stopped");
        });

        TaskHandle {
            id,
            name: name.to_string(),
            stop_tx,
            join: Some(join),
        }
    }

    /// Number of tasks that have not finished yet
    pub fn running(&self) -> usize {
        *self.running.borrow()
    }

    /// Stop every task spawned by this scheduler and wait for all of them
    pub async fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);

        let mut running = self.running.subscribe();
        let _ = running.wait_for(|n| *n == 0).await;
        info!("Scheduler stopped");
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Disposer for one periodic task.
///
/// Dropping the handle stops the task as well.
#[derive(Debug)]
pub struct TaskHandle {
    id: TaskId,
    name: String,
    stop_tx: watch::Sender<bool>,
    join: Option<JoinHandle<()>>,
}

impl TaskHandle {
    /// Stop the task without waiting for it
    pub fn dispose(self) {
        drop(self);
    }

    /// Stop the task and wait until it has exited
    pub async fn shutdown(mut self) {
        self.stop_tx.send_replace(true);
        if let Some(join) = self.join.take() {
            if let Err(e) = join.await {
                warn!(task = %self.name, task_id = %self.id, error = %e, "Task ended abnormally");
            }
        }
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        if !self.stop_tx.send_replace(true) {
            debug!(task = %self.name, task_id = %self.id, "Stop requested");
        }
    }
}

/// Resolves once the flag is raised or its sender is gone
async fn stopped(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}

struct RunningGuard(Arc<watch::Sender<usize>>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.send_modify(|n| *n = n.saturating_sub(1));
    }
}
