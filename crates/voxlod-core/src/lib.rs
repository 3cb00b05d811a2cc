//! Core types and traits for the voxlod engine.
//!
//! This crate provides the foundational types shared by every other crate:
//! - Integer-space regions used to partition the volume
//! - The logical clock that orders modifications and extractions
//! - Voxel block identifiers
//! - Engine constants and the common error type

pub mod error;
pub mod region;
pub mod time;
pub mod types;

pub use error::{Error, Result};
pub use region::Region;
pub use time::{LogicalClock, Timestamp};
pub use types::BlockId;

/// Engine-wide constants
pub mod constants {
    /// Default edge length, in voxels, of the smallest octree node.
    pub const DEFAULT_BASE_NODE_SIZE: u32 = 32;
    /// Default least detailed LOD that is ever rendered.
    pub const DEFAULT_MINIMUM_LOD: u32 = 2;
    /// Default most detailed LOD that is ever rendered (LOD 0 = raw voxels).
    pub const DEFAULT_MAXIMUM_LOD: u32 = 0;
    /// Value of the logical clock when an octree is created.
    pub const INITIAL_TIMESTAMP: u64 = 1000;
}
