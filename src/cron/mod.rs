//! One-shot Job Scheduling
//!
//! Registers delayed callbacks keyed by a job ID, used by the voting
//! engine to trigger autonomous poll closing. Registration is
//! fire-and-forget; duplicate job IDs are ignored while the original
//! job is still pending.

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// One-shot delayed job registration.
pub trait Scheduler: Send + Sync {
    /// Run `job` once after `delay`. Keyed by `job_id`; a job ID that
    /// is already pending is not registered twice.
    fn schedule_once(&self, delay: Duration, job_id: &str, job: BoxFuture<'static, ()>);
}

/// Tokio-backed scheduler: each job is a spawned task that sleeps for
/// its delay and then runs its payload.
#[derive(Debug, Default)]
pub struct TokioScheduler {
    pending: Arc<Mutex<HashSet<String>>>,
}

impl TokioScheduler {
    /// Create a new scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of jobs currently pending.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_once(&self, delay: Duration, job_id: &str, job: BoxFuture<'static, ()>) {
        {
            let mut pending = self.pending.lock();
            if !pending.insert(job_id.to_string()) {
                debug!(job_id = %job_id, "job already pending, registration ignored");
                return;
            }
        }

        info!(job_id = %job_id, delay_secs = delay.as_secs(), "one-shot job scheduled");

        let pending = self.pending.clone();
        let job_id = job_id.to_string();
        // Capture the deadline at registration time, not at first poll
        // of the spawned task.
        let sleep = tokio::time::sleep(delay);
        tokio::spawn(async move {
            sleep.await;
            debug!(job_id = %job_id, "one-shot job firing");
            job.await;
            pending.lock().remove(&job_id);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_job_fires_after_delay() {
        let scheduler = TokioScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        scheduler.schedule_once(
            Duration::from_secs(60),
            "job-1",
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        tokio::time::advance(Duration::from_secs(59)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::advance(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_job_id_ignored() {
        let scheduler = TokioScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let counter = fired.clone();
            scheduler.schedule_once(
                Duration::from_secs(10),
                "job-1",
                Box::pin(async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            );
        }
        assert_eq!(scheduler.pending_count(), 1);

        tokio::time::advance(Duration::from_secs(11)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_job_id_reusable_after_fire() {
        let scheduler = TokioScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        scheduler.schedule_once(
            Duration::from_secs(5),
            "job-1",
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        tokio::time::advance(Duration::from_secs(6)).await;
        tokio::task::yield_now().await;

        let counter = fired.clone();
        scheduler.schedule_once(
            Duration::from_secs(5),
            "job-1",
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        tokio::time::advance(Duration::from_secs(6)).await;
        tokio::task::yield_now().await;

        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }
}
