//! Producer side of the job queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::worker::{self, WorkerHandle};

/// A unit of deferred work.
///
/// Jobs carry plain data; the behaviour lives in a [`JobHandler`].
pub trait Job: Send + 'static {
    /// Short, stable name used in logs.
    fn kind(&self) -> &'static str;
}

/// Executes jobs taken off the queue.
#[async_trait]
pub trait JobHandler<J: Job>: Send + Sync + 'static {
    type Error: std::fmt::Display + Send + 'static;

    async fn run(&self, job: J) -> Result<(), Self::Error>;
}

/// Job queue error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobQueueError {
    #[error("job queue is closed")]
    Closed,
}

/// Cloneable, non-blocking producer handle.
pub struct JobQueue<J> {
    sender: mpsc::UnboundedSender<J>,
    pending: Arc<AtomicUsize>,
}

impl<J> Clone for JobQueue<J> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            pending: self.pending.clone(),
        }
    }
}

impl<J> std::fmt::Debug for JobQueue<J> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobQueue")
            .field("pending", &self.pending.load(Ordering::Relaxed))
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

impl<J: Job> JobQueue<J> {
    /// Spawn the worker task on the current Tokio runtime.
    ///
    /// Must be called from within a runtime.
    pub fn spawn<H>(name: impl Into<String>, handler: H) -> (Self, WorkerHandle)
    where
        H: JobHandler<J>,
    {
        let (sender, receiver) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));

        let handle = worker::spawn(name.into(), receiver, Arc::new(handler), pending.clone());

        (Self { sender, pending }, handle)
    }

    /// Submit a job. Never blocks; safe from any thread.
    pub fn put(&self, job: J) -> Result<(), JobQueueError> {
        let kind = job.kind();
        self.pending.fetch_add(1, Ordering::SeqCst);

        if self.sender.send(job).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            tracing::warn!(kind, "job dropped: queue is closed");
            return Err(JobQueueError::Closed);
        }

        tracing::debug!(kind, "job queued");
        Ok(())
    }

    /// Alias of [`put`](Self::put) for call sites that read better as "do this later".
    pub fn perform_later(&self, job: J) -> Result<(), JobQueueError> {
        self.put(job)
    }

    /// Jobs submitted but not yet picked up by the worker.
    pub fn len(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True once the worker has stopped accepting jobs.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Debug)]
    enum TestJob {
        Record(u32),
        Fail(u32),
        Panic,
        Slow(u32),
    }

    impl Job for TestJob {
        fn kind(&self) -> &'static str {
            match self {
                TestJob::Record(_) => "record",
                TestJob::Fail(_) => "fail",
                TestJob::Panic => "panic",
                TestJob::Slow(_) => "slow",
            }
        }
    }

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<u32>>,
    }

    #[async_trait]
    impl JobHandler<TestJob> for Arc<Recorder> {
        type Error = String;

        async fn run(&self, job: TestJob) -> Result<(), String> {
            match job {
                TestJob::Record(n) => {
                    self.seen.lock().unwrap().push(n);
                    Ok(())
                }
                TestJob::Fail(n) => Err(format!("job {n} failed")),
                TestJob::Panic => panic!("job blew up"),
                TestJob::Slow(n) => {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    self.seen.lock().unwrap().push(n);
                    Ok(())
                }
            }
        }
    }

    #[tokio::test]
    async fn jobs_run_in_submission_order() {
        let recorder = Arc::new(Recorder::default());
        let (queue, worker) = JobQueue::spawn("test", recorder.clone());
        assert_eq!(worker.stats(), crate::jobs::WorkerStats::default());

        queue.put(TestJob::Slow(1)).unwrap();
        queue.put(TestJob::Record(2)).unwrap();
        queue.perform_later(TestJob::Slow(3)).unwrap();
        queue.put(TestJob::Record(4)).unwrap();

        let stats = worker.shutdown().await;

        assert_eq!(*recorder.seen.lock().unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(stats.jobs_succeeded, 4);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn failing_and_panicking_jobs_do_not_stop_the_worker() {
        let recorder = Arc::new(Recorder::default());
        let (queue, worker) = JobQueue::spawn("test", recorder.clone());

        queue.put(TestJob::Fail(1)).unwrap();
        queue.put(TestJob::Record(2)).unwrap();
        queue.put(TestJob::Panic).unwrap();
        queue.put(TestJob::Record(3)).unwrap();

        let stats = worker.shutdown().await;

        assert_eq!(*recorder.seen.lock().unwrap(), vec![2, 3]);
        assert_eq!(stats.jobs_processed, 4);
        assert_eq!(stats.jobs_succeeded, 2);
        assert_eq!(stats.jobs_failed, 2);
    }

    #[tokio::test]
    async fn concurrent_producers_never_lose_jobs() {
        let recorder = Arc::new(Recorder::default());
        let (queue, worker) = JobQueue::spawn("test", recorder.clone());

        let producers: Vec<_> = (0..4u32)
            .map(|p| {
                let queue = queue.clone();
                std::thread::spawn(move || {
                    for i in 0..25u32 {
                        queue.put(TestJob::Record(p * 100 + i)).unwrap();
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        worker.shutdown().await;

        let mut seen = recorder.seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 100);

        // Per-producer order is preserved.
        for p in 0..4u32 {
            let mine: Vec<u32> = seen.iter().copied().filter(|n| n / 100 == p).collect();
            let mut sorted = mine.clone();
            sorted.sort_unstable();
            assert_eq!(mine, sorted);
        }
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 100);
    }

    #[tokio::test]
    async fn put_after_shutdown_is_rejected() {
        let recorder = Arc::new(Recorder::default());
        let (queue, worker) = JobQueue::spawn("test", recorder.clone());

        worker.shutdown().await;

        assert!(queue.is_closed());
        assert_eq!(queue.put(TestJob::Record(1)), Err(JobQueueError::Closed));
        assert_eq!(queue.len(), 0);
    }
}
