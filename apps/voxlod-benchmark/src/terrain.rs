//! Procedural heightfield terrain used to populate the benchmark volume.

use glam::IVec3;
use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use voxlod_volume::{BlockId, DenseVolume};

/// Terrain generator configuration.
#[derive(Debug, Clone)]
pub struct TerrainConfig {
    /// Seed for noise generation.
    pub seed: u32,
    /// Lowest surface height (Y coordinate).
    pub base_height: i32,
    /// Horizontal scale of terrain features.
    pub terrain_scale: f64,
    /// Maximum surface height variation above `base_height`.
    pub terrain_height: f64,
    /// Number of noise octaves.
    pub octaves: usize,
    /// Frequency multiplier between octaves.
    pub lacunarity: f64,
    /// Amplitude multiplier between octaves.
    pub persistence: f64,
    /// Depth of the dirt layer below the surface.
    pub dirt_depth: i32,
    /// Surfaces at or above this height are capped with snow.
    pub snow_line: i32,
}

impl TerrainConfig {
    /// Terrain proportioned to a cubic volume of `size` voxels per axis.
    pub fn for_volume_size(seed: u32, size: i32) -> Self {
        let base_height = size / 4;
        let terrain_height = f64::from(size / 2);
        Self {
            seed,
            base_height,
            terrain_scale: f64::from(size.max(64)) / 2.0,
            terrain_height,
            octaves: 5,
            lacunarity: 2.0,
            persistence: 0.5,
            dirt_depth: 4,
            snow_line: base_height + (terrain_height * 0.8) as i32,
        }
    }
}

/// Fractal-noise heightfield.
pub struct TerrainGenerator {
    config: TerrainConfig,
    height_noise: Fbm<Perlin>,
}

impl TerrainGenerator {
    pub fn new(config: TerrainConfig) -> Self {
        let height_noise = Fbm::<Perlin>::new(config.seed)
            .set_octaves(config.octaves)
            .set_lacunarity(config.lacunarity)
            .set_persistence(config.persistence);

        Self {
            config,
            height_noise,
        }
    }

    pub const fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// Surface height at world XZ coordinates.
    pub fn height_at(&self, x: i32, z: i32) -> i32 {
        let nx = f64::from(x) / self.config.terrain_scale;
        let nz = f64::from(z) / self.config.terrain_scale;

        // Noise is in [-1, 1]
        let value = self.height_noise.get([nx, nz]).clamp(-1.0, 1.0);
        ((value + 1.0) * 0.5 * self.config.terrain_height) as i32 + self.config.base_height
    }

    fn block_at_depth(&self, y: i32, surface: i32) -> BlockId {
        if y > surface {
            BlockId::AIR
        } else if y == surface {
            if surface >= self.config.snow_line {
                BlockId::SNOW
            } else {
                BlockId::GRASS
            }
        } else if y > surface - self.config.dirt_depth {
            BlockId::DIRT
        } else {
            BlockId::STONE
        }
    }

    pub fn block_at(&self, position: IVec3) -> BlockId {
        self.block_at_depth(position.y, self.height_at(position.x, position.z))
    }

    /// Overwrite `volume` with this terrain.
    pub fn populate(&self, volume: &DenseVolume) {
        volume.fill_with(|p| self.block_at(p));
    }
}
