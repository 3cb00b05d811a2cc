//! Creates extraction tasks and hands them to the executor.

use std::sync::Arc;

use hashbrown::HashSet;
use tracing::trace;
use voxlod_volume::{SurfaceExtractor, Volume};

use crate::executor::Executor;
use crate::node::{NodeIndex, OctreeNode};
use crate::processor::FinishedTask;
use crate::queue::QueueProducer;
use crate::task::{SurfaceExtractionTask, TaskId};

/// Owns task identity and the set of tasks currently in flight.
pub struct ExtractionScheduler {
    volume: Arc<dyn Volume>,
    extractor: Arc<dyn SurfaceExtractor>,
    executor: Arc<dyn Executor>,
    finished: QueueProducer<FinishedTask>,
    next_id: u64,
    in_flight: HashSet<TaskId>,
    scheduled: u64,
}

impl ExtractionScheduler {
    pub fn new(
        volume: Arc<dyn Volume>,
        extractor: Arc<dyn SurfaceExtractor>,
        executor: Arc<dyn Executor>,
        finished: QueueProducer<FinishedTask>,
    ) -> Self {
        Self {
            volume,
            extractor,
            executor,
            finished,
            next_id: 0,
            in_flight: HashSet::new(),
            scheduled: 0,
        }
    }

    /// Submit an extraction of `node` at `lod`.
    ///
    /// The node's current data version is captured by the task. A node may
    /// only have one task in flight.
    pub fn schedule(&mut self, index: NodeIndex, node: &mut OctreeNode, lod: u32) -> TaskId {
        assert!(
            node.pending_task.is_none(),
            "node {index} already has task {:?} in flight",
            node.pending_task
        );

        let id = TaskId(self.next_id);
        self.next_id += 1;
        node.pending_task = Some(id);
        self.in_flight.insert(id);
        self.scheduled += 1;

        let mut task = Box::new(SurfaceExtractionTask::new(
            id,
            index,
            node.region,
            lod,
            node.data_stamp(),
            Arc::clone(&self.volume),
            Arc::clone(&self.extractor),
        ));
        trace!(task = id.0, node = index.0, lod, "Scheduling extraction");

        let finished = self.finished.clone();
        self.executor.execute(Box::new(move || {
            task.execute();
            finished.push(task);
        }));
        id
    }

    /// Forget a task that came back. Returns whether it was in flight.
    pub fn complete(&mut self, id: TaskId) -> bool {
        self.in_flight.remove(&id)
    }

    pub fn is_in_flight(&self, id: TaskId) -> bool {
        self.in_flight.contains(&id)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Tasks scheduled since creation.
    pub const fn scheduled_count(&self) -> u64 {
        self.scheduled
    }

    pub fn volume(&self) -> &Arc<dyn Volume> {
        &self.volume
    }
}
