//! Bounded worker pool
//!
//! A producer task feeds jobs into a queue bounded to the worker count, a
//! fixed number of worker tasks drain it and push results into a second
//! queue of the same capacity, and the caller drains that queue until it
//! closes. The results queue closes once the last worker has exited, which
//! happens when the job queue is exhausted or the pool is cancelled.
//!
//! Cancellation stops the producer, wakes workers parked on either queue
//! and drops in-flight jobs. Whatever finished before that is returned. A
//! pool with a deadline cancels its own run when the deadline passes; the
//! token it was built with is left untouched.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

#[derive(Debug, Clone)]
pub struct WorkerPool {
    workers: usize,
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl WorkerPool {
    pub fn new(workers: usize, cancel: CancellationToken) -> Self {
        Self {
            workers: workers.max(1),
            cancel,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `handler` over every job and collect the results in completion
    /// order. Returns immediately, without spawning anything, when `jobs` is
    /// empty.
    pub async fn run<J, R, F, Fut>(&self, jobs: Vec<J>, handler: F) -> Vec<R>
    where
        J: Send + 'static,
        R: Send + 'static,
        F: Fn(J) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        if jobs.is_empty() {
            return Vec::new();
        }

        let cancel = self.cancel.child_token();
        // Stops the deadline timer once the run is over.
        let _run_guard = cancel.clone().drop_guard();
        if let Some(deadline) = self.deadline {
            let timer = cancel.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = timer.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {
                        warn!("Worker pool deadline reached, abandoning remaining jobs");
                        timer.cancel();
                    }
                }
            });
        }

        let total = jobs.len();
        let workers = self.workers.min(total);
        let (job_tx, job_rx) = mpsc::channel::<J>(workers);
        let (result_tx, mut result_rx) = mpsc::channel::<R>(workers);
        let job_rx = Arc::new(Mutex::new(job_rx));
        let handler = Arc::new(handler);

        let producer_cancel = cancel.clone();
        let producer = tokio::spawn(async move {
            for job in jobs {
                tokio::select! {
                    biased;
                    _ = producer_cancel.cancelled() => break,
                    sent = job_tx.send(job) => {
                        // every worker is gone
                        if sent.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let job_rx = Arc::clone(&job_rx);
            let result_tx = result_tx.clone();
            let handler = Arc::clone(&handler);
            let cancel = cancel.clone();

            handles.push(tokio::spawn(async move {
                let mut processed = 0usize;
                loop {
                    let next = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => None,
                        job = async { job_rx.lock().await.recv().await } => job,
                    };
                    let Some(job) = next else { break };

                    let result = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        result = (*handler)(job) => result,
                    };

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        sent = result_tx.send(result) => {
                            if sent.is_err() {
                                break;
                            }
                        }
                    }
                    processed += 1;
                }
                debug!(worker_id, processed, "Worker finished");
            }));
        }
        // Only workers hold senders now, so the queue closes with the last one.
        drop(result_tx);

        let mut results = Vec::with_capacity(total);
        while let Some(result) = result_rx.recv().await {
            results.push(result);
        }

        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Worker task failed");
            }
        }
        if let Err(e) = producer.await {
            error!(error = %e, "Job producer failed");
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn pool(workers: usize) -> WorkerPool {
        WorkerPool::new(workers, CancellationToken::new())
    }

    #[tokio::test]
    async fn test_empty_jobs_never_call_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let results: Vec<u32> = pool(4)
            .run(Vec::<u32>::new(), move |job| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move { job }
            })
            .await;

        assert!(results.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_every_job_produces_one_result() {
        let jobs: Vec<u64> = (0..50).collect();

        let results = pool(4)
            .run(jobs, |job| async move {
                // finish out of order
                tokio::time::sleep(Duration::from_millis(50 - job)).await;
                job * 2
            })
            .await;

        assert_eq!(results.len(), 50);
        let unique: HashSet<u64> = results.into_iter().collect();
        let expected: HashSet<u64> = (0..50).map(|j| j * 2).collect();
        assert_eq!(unique, expected);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded_by_worker_count() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (a, p) = (Arc::clone(&active), Arc::clone(&peak));

        pool(3)
            .run((0..20).collect::<Vec<u32>>(), move |_| {
                let (active, peak) = (Arc::clone(&a), Arc::clone(&p));
                async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                }
            })
            .await;

        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_panicking_job_does_not_stop_siblings() {
        let results = pool(2)
            .run(vec![1, 2, 3, 4], |job: u32| async move {
                if job == 3 {
                    panic!("job 3 exploded");
                }
                job
            })
            .await;

        let got: HashSet<u32> = results.into_iter().collect();
        assert!(!got.contains(&3));
        assert!(got.contains(&1));
        assert!(got.contains(&2));
    }

    #[tokio::test]
    async fn test_cancelled_before_start_runs_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let results = WorkerPool::new(4, cancel)
            .run(vec![1, 2, 3], move |job: u32| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move { job }
            })
            .await;

        assert!(results.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_unblocks_stuck_workers() {
        let cancel = CancellationToken::new();
        let pool = WorkerPool::new(2, cancel.clone());

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let run = pool.run(vec![1u32, 2, 3, 4, 5], |job| async move {
            if job == 1 {
                return job;
            }
            std::future::pending::<u32>().await
        });
        let results = tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .expect("pool did not stop after cancellation");

        assert!(results.len() <= 1);
    }

    #[tokio::test]
    async fn test_deadline_returns_finished_results() {
        let cancel = CancellationToken::new();
        let pool = WorkerPool::new(2, cancel.clone())
            .with_deadline(Instant::now() + Duration::from_millis(50));

        let run = pool.run(vec![1u32, 2, 3], |job| async move {
            if job == 1 {
                return job;
            }
            std::future::pending::<u32>().await
        });
        let results = tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .expect("pool ignored its deadline");

        assert_eq!(results, vec![1]);
        // the deadline ends this run only
        assert!(!cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_pool_is_reusable_after_deadline_run() {
        let pool = WorkerPool::new(2, CancellationToken::new());
        let expired = pool.clone().with_deadline(Instant::now());

        let first = expired
            .run(vec![1u32], |job| async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                job
            })
            .await;
        assert!(first.is_empty());

        let second = pool.run(vec![1u32, 2], |job| async move { job }).await;
        assert_eq!(second.len(), 2);
    }
}
