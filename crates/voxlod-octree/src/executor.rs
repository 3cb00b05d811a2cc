//! Worker pools that run extraction jobs.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use voxlod_core::Result;

/// Opaque unit of work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs each submitted job exactly once, eventually, on some thread.
pub trait Executor: Send + Sync {
    fn execute(&self, job: Job);
}

/// Fixed set of named worker threads fed from a shared channel.
pub struct WorkerPool {
    name: String,
    sender: Mutex<Option<Sender<Job>>>,
    receiver: Receiver<Job>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    discard: Arc<AtomicBool>,
    thread_count: usize,
}

impl WorkerPool {
    /// Spawn `thread_count` workers named `"{name}-{i}"`.
    pub fn new(name: &str, thread_count: usize) -> Result<Self> {
        let thread_count = thread_count.max(1);
        let (sender, receiver) = channel::unbounded::<Job>();
        let discard = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(thread_count);
        for i in 0..thread_count {
            let receiver = receiver.clone();
            let discard = Arc::clone(&discard);
            let handle = thread::Builder::new()
                .name(format!("{name}-{i}"))
                .spawn(move || Self::worker_loop(&receiver, &discard))?;
            workers.push(handle);
        }

        info!(pool = name, threads = thread_count, "Worker pool started");
        Ok(Self {
            name: name.to_string(),
            sender: Mutex::new(Some(sender)),
            receiver,
            workers: Mutex::new(workers),
            discard,
            thread_count,
        })
    }

    /// Pool sized to the machine's available parallelism.
    pub fn with_available_parallelism(name: &str) -> Result<Self> {
        let threads = thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get);
        Self::new(name, threads)
    }

    /// Blocks on the channel until every sender is gone and the queue is empty.
    fn worker_loop(receiver: &Receiver<Job>, discard: &AtomicBool) {
        while let Ok(job) = receiver.recv() {
            if discard.load(Ordering::Acquire) {
                continue;
            }
            if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                let thread = thread::current();
                warn!(worker = thread.name().unwrap_or("?"), "Job panicked");
            }
        }
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    /// Jobs submitted but not yet picked up by a worker.
    pub fn queued_jobs(&self) -> usize {
        self.receiver.len()
    }

    /// Stop accepting jobs and join every worker.
    ///
    /// With `wait` the queued jobs still run first; without it they are
    /// dropped unrun. Calling this twice is harmless.
    pub fn shutdown(&self, wait: bool) {
        if !wait {
            self.discard.store(true, Ordering::Release);
        }
        let sender = self.sender.lock().take();
        if sender.is_none() {
            return;
        }
        drop(sender);

        let workers = std::mem::take(&mut *self.workers.lock());
        for handle in workers {
            if handle.join().is_err() {
                warn!(pool = %self.name, "Worker thread panicked");
            }
        }
        info!(pool = %self.name, wait, "Worker pool stopped");
    }
}

impl Executor for WorkerPool {
    fn execute(&self, job: Job) {
        match self.sender.lock().as_ref() {
            Some(sender) => {
                // Workers hold the receiver until every sender is dropped.
                let _ = sender.send(job);
            }
            None => debug!(pool = %self.name, "Job submitted after shutdown was dropped"),
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown(true);
    }
}

/// Runs jobs on rayon's global thread pool.
#[derive(Clone, Copy, Debug, Default)]
pub struct RayonExecutor;

impl Executor for RayonExecutor {
    fn execute(&self, job: Job) {
        rayon::spawn(job);
    }
}

/// Holds jobs until the caller runs them, on the caller's thread.
///
/// Gives tests and single-threaded hosts full control over when work
/// completes.
#[derive(Default)]
pub struct SteppedExecutor {
    jobs: Mutex<VecDeque<Job>>,
}

impl SteppedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of jobs waiting to run.
    pub fn queued(&self) -> usize {
        self.jobs.lock().len()
    }

    /// Run the oldest job. Returns `false` when nothing was queued.
    pub fn run_one(&self) -> bool {
        // Release the lock first so jobs can submit more jobs.
        let job = self.jobs.lock().pop_front();
        job.map(|job| job()).is_some()
    }

    /// Run jobs until the queue is empty, including jobs queued meanwhile.
    pub fn run_all(&self) -> usize {
        let mut count = 0;
        while self.run_one() {
            count += 1;
        }
        count
    }

    /// Drop every queued job without running it.
    pub fn clear(&self) -> usize {
        let mut jobs = self.jobs.lock();
        let count = jobs.len();
        jobs.clear();
        count
    }
}

impl Executor for SteppedExecutor {
    fn execute(&self, job: Job) {
        self.jobs.lock().push_back(job);
    }
}
