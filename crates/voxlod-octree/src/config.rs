//! Octree configuration.

use serde::{Deserialize, Serialize};
use voxlod_core::constants::{DEFAULT_BASE_NODE_SIZE, DEFAULT_MAXIMUM_LOD, DEFAULT_MINIMUM_LOD};
use voxlod_core::{Error, Result};

/// Largest accepted base node size and covered cube edge, so every node
/// edge fits in an `i32` coordinate.
pub const MAX_NODE_SIZE: u32 = 1 << 30;

/// Construction parameters for an [`Octree`](crate::Octree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeConfig {
    /// Edge length in voxels of the smallest node. Must be a power of two.
    pub base_node_size: u32,
    /// Least detailed LOD ever rendered (numerically largest).
    pub minimum_lod: u32,
    /// Most detailed LOD ever rendered (0 = full resolution).
    pub maximum_lod: u32,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            base_node_size: DEFAULT_BASE_NODE_SIZE,
            minimum_lod: DEFAULT_MINIMUM_LOD,
            maximum_lod: DEFAULT_MAXIMUM_LOD,
        }
    }
}

impl OctreeConfig {
    #[must_use]
    pub const fn with_base_node_size(mut self, size: u32) -> Self {
        self.base_node_size = size;
        self
    }

    #[must_use]
    pub const fn with_lod_range(mut self, minimum_lod: u32, maximum_lod: u32) -> Self {
        self.minimum_lod = minimum_lod;
        self.maximum_lod = maximum_lod;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.base_node_size.is_power_of_two() || self.base_node_size > MAX_NODE_SIZE {
            return Err(Error::InvalidBaseNodeSize(self.base_node_size));
        }
        validate_lod_range(self.minimum_lod, self.maximum_lod)
    }

    /// LOD a node of the given height is extracted at.
    #[inline]
    pub fn lod_for_height(&self, height: u32) -> u32 {
        height.max(self.maximum_lod).min(self.minimum_lod)
    }
}

pub(crate) fn validate_lod_range(minimum_lod: u32, maximum_lod: u32) -> Result<()> {
    if minimum_lod < maximum_lod {
        return Err(Error::InvalidLodRange {
            minimum: minimum_lod,
            maximum: maximum_lod,
        });
    }
    Ok(())
}
