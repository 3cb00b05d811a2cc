//! Axis-aligned integer regions of voxel space.

use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};

/// An axis-aligned box of voxels with inclusive lower and upper corners.
///
/// A region `lower = (0, 0, 0)`, `upper = (31, 31, 31)` covers 32 voxels per
/// axis. Regions are immutable once handed to an octree node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    /// Minimum corner (inclusive).
    pub lower: IVec3,
    /// Maximum corner (inclusive).
    pub upper: IVec3,
}

impl Region {
    /// Create a new region from inclusive corners.
    #[inline]
    pub const fn new(lower: IVec3, upper: IVec3) -> Self {
        Self { lower, upper }
    }

    /// Create a region from its lower corner and its size in voxels per axis.
    #[inline]
    pub fn from_lower_and_size(lower: IVec3, size: IVec3) -> Self {
        Self {
            lower,
            upper: lower + size - IVec3::ONE,
        }
    }

    /// A region is valid when `lower <= upper` on every axis.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.lower.cmple(self.upper).all()
    }

    /// Number of voxels per axis.
    #[inline]
    pub fn dimensions(&self) -> IVec3 {
        self.upper - self.lower + IVec3::ONE
    }

    /// Number of voxels along X.
    #[inline]
    pub fn width(&self) -> i32 {
        self.dimensions().x
    }

    /// Number of voxels along Y.
    #[inline]
    pub fn height(&self) -> i32 {
        self.dimensions().y
    }

    /// Number of voxels along Z.
    #[inline]
    pub fn depth(&self) -> i32 {
        self.dimensions().z
    }

    /// Total number of voxels, zero for invalid regions.
    pub fn voxel_count(&self) -> u64 {
        if !self.is_valid() {
            return 0;
        }
        let d = self.dimensions().as_i64vec3();
        (d.x * d.y * d.z) as u64
    }

    /// Geometric centre of the covered space.
    ///
    /// Voxel `v` spans `[v, v + 1)`, so the centre of `0..=255` is 128.
    #[inline]
    pub fn centre(&self) -> Vec3 {
        (self.lower + self.upper + IVec3::ONE).as_vec3() * 0.5
    }

    /// Length of the space diagonal.
    #[inline]
    pub fn diagonal_length(&self) -> f32 {
        self.dimensions().as_vec3().length()
    }

    /// Check if a voxel position lies inside the region.
    #[inline]
    pub fn contains_point(&self, point: IVec3) -> bool {
        point.cmpge(self.lower).all() && point.cmple(self.upper).all()
    }

    /// Check if `other` lies entirely inside this region.
    #[inline]
    pub fn contains_region(&self, other: &Self) -> bool {
        self.contains_point(other.lower) && self.contains_point(other.upper)
    }

    /// Check if this region shares at least one voxel with another.
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        self.lower.x <= other.upper.x
            && self.upper.x >= other.lower.x
            && self.lower.y <= other.upper.y
            && self.upper.y >= other.lower.y
            && self.lower.z <= other.upper.z
            && self.upper.z >= other.lower.z
    }

    /// The voxels shared by both regions, if any.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let region = Self {
            lower: self.lower.max(other.lower),
            upper: self.upper.min(other.upper),
        };
        region.is_valid().then_some(region)
    }

    /// One of the eight equally sized sub-regions.
    ///
    /// Octant bits select the upper half per axis:
    /// - bit 0: X
    /// - bit 1: Y
    /// - bit 2: Z
    pub fn octant(&self, octant: u8) -> Self {
        debug_assert!(octant < 8);
        let half = self.dimensions() / 2;
        debug_assert!(half.cmpgt(IVec3::ZERO).all(), "region too small to split");
        let offset = IVec3::new(
            i32::from(octant & 1),
            i32::from((octant >> 1) & 1),
            i32::from((octant >> 2) & 1),
        );
        Self::from_lower_and_size(self.lower + offset * half, half)
    }

    /// Octant index of the sub-region containing `point`.
    pub fn octant_containing(&self, point: IVec3) -> u8 {
        let split = self.lower + self.dimensions() / 2;
        u8::from(point.x >= split.x)
            | (u8::from(point.y >= split.y) << 1)
            | (u8::from(point.z >= split.z) << 2)
    }
}
