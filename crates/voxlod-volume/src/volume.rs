//! The voxel source boundary.

use voxlod_core::{Region, Result};

use crate::block::VoxelBlock;

/// Thread-safe source of voxel data.
///
/// Implementations are read from worker threads while the owner keeps
/// editing, so `read` must return an owned snapshot rather than a view.
pub trait Volume: Send + Sync {
    /// Authoritative extent of the voxel data.
    fn enclosing_region(&self) -> Region;

    /// Snapshot `region` sampled at `lod`, including a one-sample apron.
    fn read(&self, region: &Region, lod: u32) -> Result<VoxelBlock>;
}
