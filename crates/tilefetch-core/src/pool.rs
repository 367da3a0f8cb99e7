//! Bounded worker pool.
//!
//! A fixed set of threads pulls jobs from one bounded FIFO queue. The
//! producer blocks while the queue is full, so arbitrarily long job
//! iterators are consumed lazily. Results are handed back while the run is
//! in progress (`run_each`) or collected (`run`); both return only after the
//! queue is closed and every worker has drained it.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::Mutex;
use std::thread;

/// Results of one pool run.
#[derive(Debug)]
pub struct PoolOutcome<R> {
    /// One result per completed job, in completion order.
    pub results: Vec<R>,
    /// Jobs whose handler panicked. They produced no result.
    pub panicked: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    workers: usize,
    queue_capacity: usize,
}

impl WorkerPool {
    /// Pool of `workers` threads (at least one) with a queue of twice that size.
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        Self {
            workers,
            queue_capacity: workers.saturating_mul(2),
        }
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Runs `handler` once for every job and collects the results.
    /// Blocks until all jobs are processed.
    pub fn run<J, R, I, F>(&self, jobs: I, handler: F) -> PoolOutcome<R>
    where
        I: IntoIterator<Item = J>,
        I::IntoIter: Send,
        J: Send,
        R: Send,
        F: Fn(J) -> R + Sync,
    {
        let mut results = Vec::new();
        let panicked = self.run_each(jobs, handler, |r| results.push(r));
        PoolOutcome { results, panicked }
    }

    /// Runs `handler` once for every job and passes each result to
    /// `on_result` on the calling thread as soon as it arrives. Returns the
    /// number of jobs whose handler panicked.
    ///
    /// Jobs are fed from a separate producer thread while the caller drains
    /// results, so neither side accumulates more than the queue holds.
    /// A panic inside `handler` is caught at the worker boundary and counted;
    /// the worker then continues with the next job.
    pub fn run_each<J, R, I, F, S>(&self, jobs: I, handler: F, mut on_result: S) -> usize
    where
        I: IntoIterator<Item = J>,
        I::IntoIter: Send,
        J: Send,
        R: Send,
        F: Fn(J) -> R + Sync,
        S: FnMut(R),
    {
        let (job_tx, job_rx) = mpsc::sync_channel::<J>(self.queue_capacity);
        let job_rx = Mutex::new(job_rx);
        let (result_tx, result_rx) = mpsc::channel::<Option<R>>();
        let jobs = jobs.into_iter();

        thread::scope(|scope| {
            for worker_id in 0..self.workers {
                let job_rx = &job_rx;
                let handler = &handler;
                let result_tx = result_tx.clone();
                scope.spawn(move || loop {
                    // Guard is released before the job runs.
                    let next = match job_rx.lock() {
                        Ok(rx) => rx.recv(),
                        Err(poisoned) => poisoned.into_inner().recv(),
                    };
                    let Ok(job) = next else {
                        break;
                    };
                    let res = panic::catch_unwind(AssertUnwindSafe(|| handler(job))).ok();
                    if res.is_none() {
                        tracing::error!(worker = worker_id, "job handler panicked");
                    }
                    let _ = result_tx.send(res);
                });
            }
            drop(result_tx);

            scope.spawn(move || {
                for job in jobs {
                    // The receiver lives until the scope ends, so this only blocks.
                    let _ = job_tx.send(job);
                }
                // Dropping job_tx closes the queue; workers exit once it is drained.
            });

            // Ends when the last worker drops its sender.
            let mut panicked = 0;
            for res in result_rx {
                match res {
                    Some(r) => on_result(r),
                    None => panicked += 1,
                }
            }
            panicked
        })
    }
}
