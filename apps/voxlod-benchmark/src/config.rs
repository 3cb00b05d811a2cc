//! Benchmark parameters, overridable through `VOXLOD_*` environment variables.

use std::str::FromStr;

use anyhow::Context;
use voxlod_octree::OctreeConfig;

#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Voxels per axis of the cubic volume.
    pub volume_size: i32,
    pub octree: OctreeConfig,
    pub lod_threshold: f32,
    pub frames: u32,
    /// Worker threads; zero uses the available parallelism.
    pub workers: usize,
    pub seed: u32,
    /// Frames between voxel edits; zero disables editing.
    pub edit_interval: u32,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            volume_size: 256,
            octree: OctreeConfig::default(),
            lod_threshold: 1.0,
            frames: 600,
            workers: 0,
            seed: 42,
            edit_interval: 10,
        }
    }
}

fn env_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {name}: {value:?}")),
        Err(_) => Ok(default),
    }
}

impl BenchConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        let octree = OctreeConfig {
            base_node_size: env_or("VOXLOD_BASE_NODE_SIZE", defaults.octree.base_node_size)?,
            minimum_lod: env_or("VOXLOD_MIN_LOD", defaults.octree.minimum_lod)?,
            maximum_lod: env_or("VOXLOD_MAX_LOD", defaults.octree.maximum_lod)?,
        };
        octree.validate()?;

        let config = Self {
            volume_size: env_or("VOXLOD_VOLUME_SIZE", defaults.volume_size)?,
            octree,
            lod_threshold: env_or("VOXLOD_LOD_THRESHOLD", defaults.lod_threshold)?,
            frames: env_or("VOXLOD_FRAMES", defaults.frames)?,
            workers: env_or("VOXLOD_WORKERS", defaults.workers)?,
            seed: env_or("VOXLOD_SEED", defaults.seed)?,
            edit_interval: env_or("VOXLOD_EDIT_INTERVAL", defaults.edit_interval)?,
        };
        anyhow::ensure!(config.volume_size > 0, "VOXLOD_VOLUME_SIZE must be positive");
        anyhow::ensure!(
            config.lod_threshold >= 0.0,
            "VOXLOD_LOD_THRESHOLD must not be negative"
        );
        Ok(config)
    }
}
