//! Voxel data sources and surface extraction for the voxlod engine.
//!
//! The octree treats everything in this crate as an external collaborator:
//! - [`Volume`] supplies voxel snapshots for a region at a given LOD
//! - [`SurfaceExtractor`] turns a snapshot into a [`Mesh`]

pub mod block;
pub mod dense;
pub mod extractor;
pub mod mesh;
pub mod volume;

pub use block::{downsample_cell, VoxelBlock};
pub use dense::DenseVolume;
pub use extractor::{CubicExtractor, SurfaceExtractor};
pub use mesh::{Mesh, Vertex};
pub use volume::Volume;
pub use voxlod_core::BlockId;
