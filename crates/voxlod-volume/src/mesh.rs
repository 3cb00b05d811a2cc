//! Renderable mesh buffers produced by surface extraction.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use voxlod_core::BlockId;

/// GPU-ready vertex.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub block: u32,
}

impl Vertex {
    #[inline]
    pub fn new(position: Vec3, normal: Vec3, block: BlockId) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            block: u32::from(block.0),
        }
    }
}

/// Indexed triangle list for one octree node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    /// Level of detail the mesh was extracted at.
    pub lod: u32,
}

impl Mesh {
    pub const fn new(lod: u32) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            lod,
        }
    }

    /// A mesh without indices has nothing to draw.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Bytes held by the vertex and index buffers.
    pub fn memory_usage(&self) -> usize {
        self.vertices.len() * std::mem::size_of::<Vertex>()
            + self.indices.len() * std::mem::size_of::<u32>()
    }

    /// Append a quad as two triangles sharing its first and third corner.
    pub fn push_quad(&mut self, corners: [Vec3; 4], normal: Vec3, block: BlockId) {
        let base = self.vertices.len() as u32;
        self.vertices
            .extend(corners.iter().map(|&c| Vertex::new(c, normal, block)));
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Vertex buffer as raw bytes for upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_adds_two_triangles() {
        let mut mesh = Mesh::new(0);
        assert!(mesh.is_empty());

        mesh.push_quad([Vec3::ZERO, Vec3::X, Vec3::ONE, Vec3::Y], Vec3::Z, BlockId::STONE);
        mesh.push_quad([Vec3::ZERO, Vec3::X, Vec3::ONE, Vec3::Y], Vec3::Z, BlockId::STONE);

        assert_eq!(mesh.triangle_count(), 4);
        assert_eq!(&mesh.indices[6..], &[4, 5, 6, 4, 6, 7]);
        assert_eq!(mesh.vertex_bytes().len(), 8 * 28);
        assert_eq!(mesh.memory_usage(), 8 * 28 + 12 * 4);
    }
}
