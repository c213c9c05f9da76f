//! Consumer side of the job queue: the single worker task.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::queue::{Job, JobHandler};

/// Counters kept by the worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub jobs_processed: u64,
    pub jobs_succeeded: u64,
    pub jobs_failed: u64,
}

/// Handle to a running worker.
///
/// Dropping the handle detaches the worker; it keeps draining the queue
/// until every [`JobQueue`](super::JobQueue) clone is gone.
#[derive(Debug)]
pub struct WorkerHandle {
    name: String,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
    stats: Arc<Mutex<WorkerStats>>,
}

impl WorkerHandle {
    /// Snapshot of the worker counters.
    pub fn stats(&self) -> WorkerStats {
        *lock(&self.stats)
    }

    /// Stop accepting jobs, run everything already queued, then stop.
    pub async fn shutdown(self) -> WorkerStats {
        let _ = self.shutdown.send(());
        if let Err(e) = self.task.await {
            tracing::error!(worker = %self.name, error = %e, "worker task ended abnormally");
        }
        let stats = *lock(&self.stats);
        tracing::info!(
            worker = %self.name,
            processed = stats.jobs_processed,
            failed = stats.jobs_failed,
            "worker stopped"
        );
        stats
    }
}

fn lock(stats: &Mutex<WorkerStats>) -> MutexGuard<'_, WorkerStats> {
    stats.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(super) fn spawn<J, H>(
    name: String,
    mut receiver: mpsc::UnboundedReceiver<J>,
    handler: Arc<H>,
    pending: Arc<AtomicUsize>,
) -> WorkerHandle
where
    J: Job,
    H: JobHandler<J>,
{
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
    let stats = Arc::new(Mutex::new(WorkerStats::default()));

    let task = {
        let name = name.clone();
        let stats = stats.clone();
        tokio::spawn(async move {
            tracing::info!(worker = %name, "worker started");
            let mut listening_for_shutdown = true;

            loop {
                tokio::select! {
                    biased;

                    signal = &mut shutdown_rx, if listening_for_shutdown => {
                        listening_for_shutdown = false;
                        if signal.is_ok() {
                            tracing::debug!(worker = %name, "shutdown requested, draining queue");
                            receiver.close();
                        }
                    }

                    next = receiver.recv() => {
                        let Some(job) = next else { break };
                        pending.fetch_sub(1, Ordering::SeqCst);
                        let succeeded = run_job(&name, handler.clone(), job).await;

                        let mut stats = lock(&stats);
                        stats.jobs_processed += 1;
                        if succeeded {
                            stats.jobs_succeeded += 1;
                        } else {
                            stats.jobs_failed += 1;
                        }
                    }
                }
            }
        })
    };

    WorkerHandle {
        name,
        shutdown: shutdown_tx,
        task,
        stats,
    }
}

/// Run one job on its own task so a panic stays contained.
async fn run_job<J, H>(worker: &str, handler: Arc<H>, job: J) -> bool
where
    J: Job,
    H: JobHandler<J>,
{
    let kind = job.kind();
    tracing::debug!(worker, kind, "job started");

    match tokio::spawn(async move { handler.run(job).await }).await {
        Ok(Ok(())) => {
            tracing::debug!(worker, kind, "job completed");
            true
        }
        Ok(Err(e)) => {
            tracing::warn!(worker, kind, error = %e, "job failed");
            false
        }
        Err(e) if e.is_panic() => {
            tracing::error!(worker, kind, "job panicked");
            false
        }
        Err(e) => {
            tracing::error!(worker, kind, error = %e, "job cancelled");
            false
        }
    }
}
