#![allow(dead_code)]

use std::sync::Arc;

use glam::IVec3;
use voxlod_core::Region;
use voxlod_octree::{NodeIndex, Octree, OctreeConfig, SteppedExecutor};
use voxlod_volume::{BlockId, CubicExtractor, DenseVolume};

/// Cube of `size` voxels with its lower half filled with stone.
pub fn half_filled_volume(size: i32) -> Arc<DenseVolume> {
    let volume = Arc::new(DenseVolume::with_size(size).unwrap());
    volume.fill(
        &Region::new(IVec3::ZERO, IVec3::new(size - 1, size / 2 - 1, size - 1)),
        BlockId::STONE,
    );
    volume
}

/// Octree whose extraction jobs only run when the test steps the executor.
pub fn stepped_octree(
    volume: &Arc<DenseVolume>,
    config: OctreeConfig,
) -> (Octree, Arc<SteppedExecutor>) {
    let executor = Arc::new(SteppedExecutor::new());
    let octree = Octree::new(
        volume.clone(),
        Arc::new(CubicExtractor),
        executor.clone(),
        config,
    )
    .unwrap();
    (octree, executor)
}

pub fn all_nodes(octree: &Octree) -> impl Iterator<Item = NodeIndex> {
    (0..octree.node_count() as u32).map(NodeIndex)
}

/// Number of active nodes on the path from `index` up to the root.
pub fn active_on_chain(octree: &Octree, index: NodeIndex) -> usize {
    let mut count = 0;
    let mut current = Some(index);
    while let Some(i) = current {
        let node = octree.node(i);
        count += usize::from(node.active);
        current = node.parent;
    }
    count
}

/// Every leaf has exactly one active node among itself and its ancestors.
pub fn assert_one_active_per_column(octree: &Octree) {
    for index in all_nodes(octree) {
        if octree.node(index).has_children() {
            continue;
        }
        assert_eq!(
            active_on_chain(octree, index),
            1,
            "leaf {index} has {} active nodes on its chain",
            active_on_chain(octree, index)
        );
    }
}

/// Small deterministic generator so stress runs are reproducible.
pub struct Lcg(u64);

impl Lcg {
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next_u32(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.0 >> 33) as u32
    }

    pub fn below(&mut self, bound: i32) -> i32 {
        (self.next_u32() % bound as u32) as i32
    }
}
