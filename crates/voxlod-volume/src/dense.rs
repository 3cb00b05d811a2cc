//! In-memory dense voxel volume.

use glam::IVec3;
use parking_lot::RwLock;
use rayon::prelude::*;
use tracing::{debug, warn};
use voxlod_core::{BlockId, Error, Region, Result};

use crate::block::VoxelBlock;
use crate::volume::Volume;

/// A dense grid of voxels covering a fixed region.
///
/// Reads take a shared lock for the duration of one snapshot, so workers see
/// either all or none of a concurrent edit to a single voxel.
pub struct DenseVolume {
    region: Region,
    voxels: RwLock<Vec<BlockId>>,
}

impl DenseVolume {
    /// Create an all-air volume covering `region`.
    pub fn new(region: Region) -> Result<Self> {
        if !region.is_valid() {
            return Err(Error::EmptyVolume);
        }
        let len = usize::try_from(region.voxel_count())
            .map_err(|_| Error::OutOfBounds(format!("{region:?} is too large")))?;
        debug!(?region, voxels = len, "Allocating dense volume");
        Ok(Self {
            region,
            voxels: RwLock::new(vec![BlockId::AIR; len]),
        })
    }

    /// Create an all-air cube with `size` voxels per axis starting at the origin.
    pub fn with_size(size: i32) -> Result<Self> {
        Self::new(Region::from_lower_and_size(IVec3::ZERO, IVec3::splat(size)))
    }

    #[inline]
    fn index(region: &Region, position: IVec3) -> Option<usize> {
        if !region.contains_point(position) {
            return None;
        }
        let local = position - region.lower;
        let dims = region.dimensions();
        Some((local.x + local.y * dims.x + local.z * dims.x * dims.y) as usize)
    }

    /// Voxel at `position`, air outside the volume.
    pub fn get(&self, position: IVec3) -> BlockId {
        Self::index(&self.region, position).map_or(BlockId::AIR, |i| self.voxels.read()[i])
    }

    /// Write one voxel. Returns whether the stored value changed.
    ///
    /// Writes outside the volume are ignored.
    pub fn set(&self, position: IVec3, block: BlockId) -> bool {
        let Some(i) = Self::index(&self.region, position) else {
            return false;
        };
        let mut voxels = self.voxels.write();
        let changed = voxels[i] != block;
        voxels[i] = block;
        changed
    }

    /// Fill the part of `region` inside the volume. Returns the voxel count written.
    pub fn fill(&self, region: &Region, block: BlockId) -> u64 {
        let Some(clipped) = self.region.intersection(region) else {
            return 0;
        };
        let mut voxels = self.voxels.write();
        for z in clipped.lower.z..=clipped.upper.z {
            for y in clipped.lower.y..=clipped.upper.y {
                for x in clipped.lower.x..=clipped.upper.x {
                    if let Some(i) = Self::index(&self.region, IVec3::new(x, y, z)) {
                        voxels[i] = block;
                    }
                }
            }
        }
        clipped.voxel_count()
    }

    /// Overwrite every voxel from a position function, one Z slice per rayon task.
    pub fn fill_with<F>(&self, f: F)
    where
        F: Fn(IVec3) -> BlockId + Sync,
    {
        let region = self.region;
        let dims = region.dimensions();
        let slice_len = (dims.x * dims.y) as usize;
        let mut voxels = self.voxels.write();
        voxels
            .par_chunks_mut(slice_len)
            .enumerate()
            .for_each(|(z, slice)| {
                let z = region.lower.z + z as i32;
                for y in 0..dims.y {
                    for x in 0..dims.x {
                        let i = (x + y * dims.x) as usize;
                        slice[i] = f(IVec3::new(region.lower.x + x, region.lower.y + y, z));
                    }
                }
            });
    }

    /// Number of non-air voxels.
    pub fn solid_count(&self) -> usize {
        self.voxels.read().par_iter().filter(|b| b.is_solid()).count()
    }
}

impl Volume for DenseVolume {
    fn enclosing_region(&self) -> Region {
        self.region
    }

    fn read(&self, region: &Region, lod: u32) -> Result<VoxelBlock> {
        if !region.is_valid() {
            warn!(?region, lod, "Rejecting read of an empty region");
            return Err(Error::OutOfBounds(format!("invalid read region {region:?}")));
        }
        let voxels = self.voxels.read();
        let block = VoxelBlock::from_fn(*region, lod, |p| {
            Self::index(&self.region, p).map_or(BlockId::AIR, |i| voxels[i])
        });
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_region_is_rejected() {
        let region = Region::new(IVec3::ONE, IVec3::ZERO);
        assert!(matches!(DenseVolume::new(region), Err(Error::EmptyVolume)));
    }

    #[test]
    fn set_reports_changes() {
        let volume = DenseVolume::with_size(8).unwrap();
        let p = IVec3::new(1, 2, 3);

        assert!(volume.set(p, BlockId::STONE));
        assert!(!volume.set(p, BlockId::STONE));
        assert_eq!(volume.get(p), BlockId::STONE);
        assert!(!volume.set(IVec3::splat(100), BlockId::STONE));
        assert_eq!(volume.get(IVec3::splat(-1)), BlockId::AIR);
    }

    #[test]
    fn fill_clips_to_volume() {
        let volume = DenseVolume::with_size(8).unwrap();
        let region = Region::new(IVec3::new(-4, 0, 0), IVec3::new(1, 1, 1));

        assert_eq!(volume.fill(&region, BlockId::DIRT), 2 * 2 * 2);
        assert_eq!(volume.solid_count(), 8);
    }

    #[test]
    fn fill_with_covers_every_voxel() {
        let volume = DenseVolume::with_size(16).unwrap();
        volume.fill_with(|p| if p.y < 4 { BlockId::STONE } else { BlockId::AIR });

        assert_eq!(volume.solid_count(), 16 * 4 * 16);
        assert_eq!(volume.get(IVec3::new(15, 3, 15)), BlockId::STONE);
        assert_eq!(volume.get(IVec3::new(15, 4, 15)), BlockId::AIR);
    }

    #[test]
    fn read_returns_snapshot() {
        let volume = DenseVolume::with_size(8).unwrap();
        volume.fill(&volume.enclosing_region(), BlockId::STONE);

        let region = Region::from_lower_and_size(IVec3::ZERO, IVec3::splat(4));
        let block = volume.read(&region, 0).unwrap();
        volume.fill(&volume.enclosing_region(), BlockId::AIR);

        assert_eq!(block.solid_count(), 64);
        // Apron outside the volume reads as air.
        assert_eq!(block.get(IVec3::splat(-1)), BlockId::AIR);
        assert_eq!(block.get(IVec3::new(4, 0, 0)), BlockId::STONE);
    }

    #[test]
    fn inverted_read_region_is_an_error() {
        let volume = DenseVolume::with_size(8).unwrap();
        let region = Region::new(IVec3::splat(4), IVec3::ZERO);
        assert!(matches!(volume.read(&region, 0), Err(Error::OutOfBounds(_))));
    }
}
