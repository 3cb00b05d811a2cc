//! Octree instrumentation counters.

use serde::Serialize;

/// Snapshot of scheduling counters and the current frame's node sets.
///
/// Task counters are cumulative since the octree was built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OctreeStats {
    /// Extraction tasks handed to the executor.
    pub tasks_scheduled: u64,
    /// Tasks whose mesh was installed.
    pub tasks_completed: u64,
    /// Tasks thrown away because their node changed while they ran.
    pub tasks_discarded: u64,
    /// Tasks whose extraction returned an error.
    pub tasks_failed: u64,
    /// Selected nodes needing a mesh that already had a task in flight.
    pub tasks_deferred: u64,
    /// Tasks scheduled but not yet applied.
    pub tasks_in_flight: usize,
    pub active_nodes: usize,
    pub rendered_nodes: usize,
}

impl OctreeStats {
    /// Tasks that came back, whatever their outcome.
    pub const fn tasks_returned(&self) -> u64 {
        self.tasks_completed + self.tasks_discarded + self.tasks_failed
    }
}
