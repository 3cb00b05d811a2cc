//! Applies finished extraction tasks on the owning thread.

use std::collections::VecDeque;
use std::thread::{self, ThreadId};
use std::time::Duration;

use crate::queue::{ConcurrentQueue, QueueProducer};
use crate::task::SurfaceExtractionTask;

/// Finished task as it travels through the result queue.
pub type FinishedTask = Box<SurfaceExtractionTask>;

/// Receiver of finished tasks.
pub trait TaskTarget {
    fn apply_task(&mut self, task: FinishedTask);
}

impl<F> TaskTarget for F
where
    F: FnMut(FinishedTask),
{
    fn apply_task(&mut self, task: FinishedTask) {
        self(task);
    }
}

/// Drains finished tasks and hands them to a [`TaskTarget`].
///
/// Must only be driven from the thread that created it: this is the one
/// place where meshes are installed and uploaded.
pub struct MainThreadTaskProcessor {
    finished: ConcurrentQueue<FinishedTask>,
    pending: VecDeque<FinishedTask>,
    owner: ThreadId,
}

impl MainThreadTaskProcessor {
    pub fn new() -> Self {
        Self {
            finished: ConcurrentQueue::new(),
            pending: VecDeque::new(),
            owner: thread::current().id(),
        }
    }

    /// Handle for workers to push finished tasks.
    pub fn producer(&self) -> QueueProducer<FinishedTask> {
        self.finished.producer()
    }

    /// Queue a task that finished on the owning thread.
    pub fn add_task(&mut self, task: FinishedTask) {
        self.pending.push_back(task);
    }

    /// Whether any finished task is waiting to be applied.
    pub fn has_tasks(&self) -> bool {
        !self.pending.is_empty() || !self.finished.is_empty()
    }

    /// Number of finished tasks waiting to be applied.
    pub fn task_count(&self) -> usize {
        self.pending.len() + self.finished.len()
    }

    fn next_task(&mut self) -> Option<FinishedTask> {
        self.pending
            .pop_front()
            .or_else(|| self.finished.try_pop())
    }

    /// Block until a worker finishes a task or `timeout` passes.
    ///
    /// Returns whether a task is now available.
    pub fn wait_for_task(&mut self, timeout: Duration) -> bool {
        if !self.pending.is_empty() {
            return true;
        }
        match self.finished.pop_timeout(timeout) {
            Some(task) => {
                self.pending.push_back(task);
                true
            }
            None => false,
        }
    }

    /// Apply at most one finished task. Never blocks.
    pub fn process_one_task<T: TaskTarget + ?Sized>(&mut self, target: &mut T) -> bool {
        debug_assert_eq!(
            thread::current().id(),
            self.owner,
            "finished tasks must be applied on the owning thread"
        );
        match self.next_task() {
            Some(task) => {
                target.apply_task(task);
                true
            }
            None => false,
        }
    }

    /// Apply finished tasks until none are left. Returns how many were applied.
    ///
    /// Tasks that finish while draining are picked up as well.
    #[cfg_attr(
        feature = "profiling-tracy",
        tracing::instrument(level = "trace", skip_all)
    )]
    pub fn process_all_tasks<T: TaskTarget + ?Sized>(&mut self, target: &mut T) -> usize {
        let mut applied = 0;
        while self.process_one_task(target) {
            applied += 1;
        }
        applied
    }
}

impl Default for MainThreadTaskProcessor {
    fn default() -> Self {
        Self::new()
    }
}
