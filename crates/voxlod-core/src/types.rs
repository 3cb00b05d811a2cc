//! Core voxel types.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Material identifier stored in every voxel.
///
/// Block ID 0 is reserved for air (empty space).
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Pod,
    Zeroable,
    Serialize,
    Deserialize,
)]
#[repr(transparent)]
pub struct BlockId(pub u16);

impl BlockId {
    /// Air block (empty space)
    pub const AIR: Self = Self(0);
    /// Stone block
    pub const STONE: Self = Self(1);
    /// Dirt block
    pub const DIRT: Self = Self(2);
    /// Grass block
    pub const GRASS: Self = Self(3);
    /// Snow block
    pub const SNOW: Self = Self(4);
    /// Sand block
    pub const SAND: Self = Self(5);

    /// Returns true if this block is air (empty)
    #[inline]
    pub const fn is_air(self) -> bool {
        self.0 == 0
    }

    /// Returns true if this block is solid (not air)
    #[inline]
    pub const fn is_solid(self) -> bool {
        self.0 != 0
    }
}

impl From<u16> for BlockId {
    #[inline]
    fn from(value: u16) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn air_is_default_and_empty() {
        assert_eq!(BlockId::default(), BlockId::AIR);
        assert!(BlockId::AIR.is_air());
        assert!(!BlockId::AIR.is_solid());
        assert!(BlockId::STONE.is_solid());
    }

    #[test]
    fn block_ids_cast_to_bytes() {
        let blocks = [BlockId::STONE, BlockId::GRASS];
        let bytes: &[u8] = bytemuck::cast_slice(&blocks);
        assert_eq!(bytes.len(), 4);
    }
}
