//! Surface extraction from voxel snapshots.

use glam::{IVec3, Vec3};
use voxlod_core::Result;

use crate::block::VoxelBlock;
use crate::mesh::Mesh;

/// Turns a voxel snapshot into renderable geometry.
///
/// Called only from worker threads; implementations must not touch any
/// renderer state.
pub trait SurfaceExtractor: Send + Sync {
    fn extract(&self, block: &VoxelBlock) -> Result<Mesh>;
}

/// Face directions with their normal axis and sign.
const FACES: [(usize, i32); 6] = [(0, 1), (0, -1), (1, 1), (1, -1), (2, 1), (2, -1)];

/// Blocky extractor emitting one quad per solid face that borders air.
///
/// Samples at coarse LODs become cubes `2^lod` voxels wide, positioned in
/// world voxel coordinates.
#[derive(Clone, Copy, Debug, Default)]
pub struct CubicExtractor;

impl CubicExtractor {
    fn face_corners(origin: Vec3, size: f32, axis: usize, sign: i32) -> [Vec3; 4] {
        let u = (axis + 1) % 3;
        let v = (axis + 2) % 3;
        let mut base = origin;
        if sign > 0 {
            base[axis] += size;
        }
        let corner = |a: f32, b: f32| {
            let mut p = base;
            p[u] += a * size;
            p[v] += b * size;
            p
        };
        // Counter-clockwise seen from outside the cube.
        if sign > 0 {
            [corner(0.0, 0.0), corner(1.0, 0.0), corner(1.0, 1.0), corner(0.0, 1.0)]
        } else {
            [corner(0.0, 0.0), corner(0.0, 1.0), corner(1.0, 1.0), corner(1.0, 0.0)]
        }
    }
}

impl SurfaceExtractor for CubicExtractor {
    fn extract(&self, block: &VoxelBlock) -> Result<Mesh> {
        let mut mesh = Mesh::new(block.lod());
        let samples = block.samples_per_axis();
        let size = block.step() as f32;

        for z in 0..samples.z {
            for y in 0..samples.y {
                for x in 0..samples.x {
                    let index = IVec3::new(x, y, z);
                    let voxel = block.get(index);
                    if voxel.is_air() {
                        continue;
                    }
                    let origin = block.sample_origin(index).as_vec3();
                    for &(axis, sign) in &FACES {
                        let mut offset = IVec3::ZERO;
                        offset[axis] = sign;
                        if block.get(index + offset).is_solid() {
                            continue;
                        }
                        let mut normal = Vec3::ZERO;
                        normal[axis] = sign as f32;
                        mesh.push_quad(
                            Self::face_corners(origin, size, axis, sign),
                            normal,
                            voxel,
                        );
                    }
                }
            }
        }

        Ok(mesh)
    }
}
