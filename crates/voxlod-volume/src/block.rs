//! Owned voxel snapshots at a fixed level of detail.

use glam::IVec3;
use voxlod_core::{BlockId, Region};

/// Reduce the voxels of one coarse cell to a single block.
///
/// The cell becomes air when fewer than a quarter of its voxels are solid.
/// Otherwise the most common solid block wins, ties going to the lowest id.
pub fn downsample_cell<I>(voxels: I) -> BlockId
where
    I: IntoIterator<Item = BlockId>,
{
    let mut counts = Vec::with_capacity(4);
    downsample_cell_with(&mut counts, voxels)
}

fn downsample_cell_with<I>(counts: &mut Vec<(BlockId, u32)>, voxels: I) -> BlockId
where
    I: IntoIterator<Item = BlockId>,
{
    counts.clear();
    let mut total = 0u32;
    let mut solid = 0u32;
    for voxel in voxels {
        total += 1;
        if voxel.is_air() {
            continue;
        }
        solid += 1;
        match counts.iter_mut().find(|(id, _)| *id == voxel) {
            Some((_, count)) => *count += 1,
            None => counts.push((voxel, 1)),
        }
    }

    if solid * 4 < total || solid == 0 {
        return BlockId::AIR;
    }

    let mut best = BlockId::AIR;
    let mut best_count = 0;
    for &(id, count) in counts.iter() {
        if count > best_count || (count == best_count && id < best) {
            best = id;
            best_count = count;
        }
    }
    best
}

/// A snapshot of a region sampled every `2^lod` voxels.
///
/// Samples are addressed from `-1` to `samples_per_axis()` inclusive on each
/// axis. The outer ring is an apron taken from the neighbouring space so
/// extractors can decide boundary faces without another read.
#[derive(Clone, Debug)]
pub struct VoxelBlock {
    region: Region,
    lod: u32,
    samples: IVec3,
    data: Vec<BlockId>,
}

impl VoxelBlock {
    /// Build a snapshot by sampling voxels through `voxel_at`.
    ///
    /// At LOD 0 every sample is a single voxel; above that each sample is
    /// reduced from its `step³` cell with [`downsample_cell`].
    pub fn from_fn<F>(region: Region, lod: u32, voxel_at: F) -> Self
    where
        F: Fn(IVec3) -> BlockId,
    {
        let step = 1i32 << lod;
        let dims = region.dimensions().max(IVec3::ZERO);
        let samples = (dims + IVec3::splat(step - 1)) / step;
        let stored = samples + IVec3::splat(2);
        let len = (stored.x * stored.y * stored.z) as usize;

        let mut data = Vec::with_capacity(len);
        let mut counts = Vec::with_capacity(4);
        for z in -1..=samples.z {
            for y in -1..=samples.y {
                for x in -1..=samples.x {
                    let cell = region.lower + IVec3::new(x, y, z) * step;
                    let block = if step == 1 {
                        voxel_at(cell)
                    } else {
                        let voxels = (0..step).flat_map(|dz| {
                            (0..step).flat_map(move |dy| {
                                (0..step).map(move |dx| cell + IVec3::new(dx, dy, dz))
                            })
                        });
                        downsample_cell_with(&mut counts, voxels.map(&voxel_at))
                    };
                    data.push(block);
                }
            }
        }

        Self {
            region,
            lod,
            samples,
            data,
        }
    }

    /// Region this snapshot was taken from.
    #[inline]
    pub const fn region(&self) -> Region {
        self.region
    }

    /// Level of detail the samples were taken at.
    #[inline]
    pub const fn lod(&self) -> u32 {
        self.lod
    }

    /// Distance between samples, in voxels.
    #[inline]
    pub const fn step(&self) -> i32 {
        1 << self.lod
    }

    /// Number of interior samples per axis, apron excluded.
    #[inline]
    pub const fn samples_per_axis(&self) -> IVec3 {
        self.samples
    }

    /// World-space voxel position of the sample at `index`.
    #[inline]
    pub fn sample_origin(&self, index: IVec3) -> IVec3 {
        self.region.lower + index * self.step()
    }

    /// Sample at `index`, where each component lies in `-1..=samples_per_axis()`.
    ///
    /// Indices outside the apron read as air.
    pub fn get(&self, index: IVec3) -> BlockId {
        let stored = self.samples + IVec3::splat(2);
        let p = index + IVec3::ONE;
        if p.cmplt(IVec3::ZERO).any() || p.cmpge(stored).any() {
            return BlockId::AIR;
        }
        let i = p.x + p.y * stored.x + p.z * stored.x * stored.y;
        self.data[i as usize]
    }

    /// Number of solid interior samples.
    pub fn solid_count(&self) -> usize {
        let mut count = 0;
        for z in 0..self.samples.z {
            for y in 0..self.samples.y {
                for x in 0..self.samples.x {
                    if self.get(IVec3::new(x, y, z)).is_solid() {
                        count += 1;
                    }
                }
            }
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downsample_quarter_threshold() {
        let mut cell = [BlockId::AIR; 8];
        cell[0] = BlockId::STONE;
        assert_eq!(downsample_cell(cell), BlockId::AIR);

        cell[1] = BlockId::STONE;
        assert_eq!(downsample_cell(cell), BlockId::STONE);
    }

    #[test]
    fn downsample_prefers_majority_then_lowest_id() {
        let cell = [
            BlockId::GRASS,
            BlockId::GRASS,
            BlockId::GRASS,
            BlockId::DIRT,
            BlockId::DIRT,
            BlockId::AIR,
            BlockId::AIR,
            BlockId::AIR,
        ];
        assert_eq!(downsample_cell(cell), BlockId::GRASS);

        let tie = [
            BlockId::SAND,
            BlockId::SAND,
            BlockId::DIRT,
            BlockId::DIRT,
            BlockId::AIR,
            BlockId::AIR,
            BlockId::AIR,
            BlockId::AIR,
        ];
        assert_eq!(downsample_cell(tie), BlockId::DIRT);
    }

    #[test]
    fn lod_zero_copies_voxels_with_apron() {
        let region = Region::from_lower_and_size(IVec3::ZERO, IVec3::splat(4));
        let block = VoxelBlock::from_fn(region, 0, |p| {
            if p.y < 2 {
                BlockId::STONE
            } else {
                BlockId::AIR
            }
        });

        assert_eq!(block.samples_per_axis(), IVec3::splat(4));
        assert_eq!(block.get(IVec3::new(0, 1, 0)), BlockId::STONE);
        assert_eq!(block.get(IVec3::new(0, 2, 0)), BlockId::AIR);
        // Apron below the region is sampled from outside it.
        assert_eq!(block.get(IVec3::new(0, -1, 0)), BlockId::STONE);
        assert_eq!(block.get(IVec3::new(0, -2, 0)), BlockId::AIR);
        assert_eq!(block.solid_count(), 4 * 2 * 4);
    }

    #[test]
    fn coarse_lod_reduces_sample_count() {
        let region = Region::from_lower_and_size(IVec3::ZERO, IVec3::splat(16));
        let block = VoxelBlock::from_fn(region, 2, |_| BlockId::STONE);

        assert_eq!(block.step(), 4);
        assert_eq!(block.samples_per_axis(), IVec3::splat(4));
        assert_eq!(block.sample_origin(IVec3::new(1, 2, 3)), IVec3::new(4, 8, 12));
        assert_eq!(block.solid_count(), 64);
    }
}
