//! Background surface extraction work units.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use voxlod_core::{Error, Region, Result, Timestamp};
use voxlod_volume::{Mesh, SurfaceExtractor, Volume};

use crate::node::{DataStamp, NodeIndex};

/// Identifier of one scheduled extraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub u64);

/// Converts one node's region into a mesh at a target LOD.
///
/// Built on the owning thread, executed on a worker, then handed back
/// through the result queue. `execute` never touches the node itself.
pub struct SurfaceExtractionTask {
    id: TaskId,
    node: NodeIndex,
    region: Region,
    lod: u32,
    data: DataStamp,
    volume: Arc<dyn Volume>,
    extractor: Arc<dyn SurfaceExtractor>,
    result: Option<Result<Mesh>>,
    elapsed: Duration,
}

impl SurfaceExtractionTask {
    pub fn new(
        id: TaskId,
        node: NodeIndex,
        region: Region,
        lod: u32,
        data: DataStamp,
        volume: Arc<dyn Volume>,
        extractor: Arc<dyn SurfaceExtractor>,
    ) -> Self {
        Self {
            id,
            node,
            region,
            lod,
            data,
            volume,
            extractor,
            result: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Read the region and extract its surface, storing the outcome.
    ///
    /// A panicking extractor is reported as an extraction error so the task
    /// still makes it back to its owner.
    pub fn execute(&mut self) {
        let start = Instant::now();
        let volume = &self.volume;
        let extractor = &self.extractor;
        let region = self.region;
        let lod = self.lod;

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let block = volume.read(&region, lod)?;
            extractor.extract(&block)
        }))
        .unwrap_or_else(|payload| {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "extractor panicked".to_string());
            Err(Error::Extraction(message))
        });

        self.elapsed = start.elapsed();
        self.result = Some(result);
    }

    #[inline]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    #[inline]
    pub const fn node(&self) -> NodeIndex {
        self.node
    }

    #[inline]
    pub const fn region(&self) -> Region {
        self.region
    }

    #[inline]
    pub const fn lod(&self) -> u32 {
        self.lod
    }

    /// Node data version captured when the task was scheduled.
    #[inline]
    pub const fn data(&self) -> DataStamp {
        self.data
    }

    /// Node modification time captured when the task was scheduled.
    #[inline]
    pub const fn data_timestamp(&self) -> Timestamp {
        self.data.timestamp
    }

    /// Whether `execute` has run.
    #[inline]
    pub const fn is_finished(&self) -> bool {
        self.result.is_some()
    }

    /// Wall time spent in `execute`.
    #[inline]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Take the extraction outcome, `None` if the task never ran.
    pub fn take_result(&mut self) -> Option<Result<Mesh>> {
        self.result.take()
    }
}

impl fmt::Debug for SurfaceExtractionTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfaceExtractionTask")
            .field("id", &self.id)
            .field("node", &self.node)
            .field("region", &self.region)
            .field("lod", &self.lod)
            .field("data", &self.data)
            .field("finished", &self.is_finished())
            .field("elapsed", &self.elapsed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::IVec3;
    use voxlod_volume::{BlockId, CubicExtractor, DenseVolume, VoxelBlock};

    struct PanickingExtractor;

    impl SurfaceExtractor for PanickingExtractor {
        fn extract(&self, _block: &VoxelBlock) -> Result<Mesh> {
            panic!("broken extractor");
        }
    }

    fn task(extractor: Arc<dyn SurfaceExtractor>) -> SurfaceExtractionTask {
        let volume = DenseVolume::with_size(16).unwrap();
        volume.set(IVec3::new(3, 3, 3), BlockId::STONE);
        let region = Region::from_lower_and_size(IVec3::ZERO, IVec3::splat(8));
        SurfaceExtractionTask::new(
            TaskId(1),
            NodeIndex(4),
            region,
            0,
            DataStamp {
                timestamp: 1000,
                revision: 0,
            },
            Arc::new(volume),
            extractor,
        )
    }

    #[test]
    fn execute_stores_mesh() {
        let mut task = task(Arc::new(CubicExtractor));
        assert!(!task.is_finished());

        task.execute();
        assert!(task.is_finished());
        assert_eq!(task.node(), NodeIndex(4));
        assert_eq!(task.data_timestamp(), 1000);

        let mesh = task.take_result().unwrap().unwrap();
        assert_eq!(mesh.triangle_count(), 12);
        assert!(task.take_result().is_none());
    }

    #[test]
    fn extractor_panic_becomes_error() {
        let mut task = task(Arc::new(PanickingExtractor));
        task.execute();

        match task.take_result() {
            Some(Err(Error::Extraction(message))) => assert!(message.contains("broken")),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
