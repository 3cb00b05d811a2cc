//! Error types for the engine.

use thiserror::Error;

/// Engine-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    /// LOD range where the least detailed level is finer than the most detailed one
    #[error("Invalid LOD range: minimum LOD {minimum} must be >= maximum LOD {maximum}")]
    InvalidLodRange { minimum: u32, maximum: u32 },

    /// Base node size that cannot seed a power-of-two hierarchy
    #[error("Invalid base node size {0}: must be a non-zero power of two")]
    InvalidBaseNodeSize(u32),

    /// Volume without any voxels to cover
    #[error("Volume has an empty enclosing region")]
    EmptyVolume,

    /// Out of bounds access
    #[error("Out of bounds: {0}")]
    OutOfBounds(String),

    /// Surface extraction failed for a region
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// I/O error while reading voxel data
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
