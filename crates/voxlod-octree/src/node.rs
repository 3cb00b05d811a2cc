//! Octree node state.

use std::fmt;
use std::sync::Arc;

use voxlod_core::{Region, Timestamp};
use voxlod_volume::Mesh;

use crate::task::TaskId;

/// Stable handle to a node in the octree's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Version of a node's voxel data as seen by an extraction task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DataStamp {
    pub timestamp: Timestamp,
    pub revision: u64,
}

/// One node of the spatial hierarchy.
///
/// Nodes only hold state. The octree decides activation and the task
/// processor is the only writer of the mesh fields.
#[derive(Clone)]
pub struct OctreeNode {
    /// Space covered by this node.
    pub region: Region,
    /// Parent link, `None` for the root.
    pub parent: Option<NodeIndex>,
    /// Child links by octant; absent children lie outside the volume.
    pub children: [Option<NodeIndex>; 8],
    /// Levels above the base node size (0 = base-size node).
    pub height: u32,
    /// Logical time of the latest voxel change inside `region`.
    pub last_modified: Timestamp,
    /// Number of accepted modifications, including repeats at the same time.
    pub revision: u64,
    /// Selected for rendering this frame.
    pub active: bool,
    /// Drawn this frame, either because it is active or as a fallback.
    pub drawn: bool,
    /// Every active node in this subtree has a mesh.
    pub(crate) subtree_ready: bool,
    /// Most recently installed mesh.
    pub mesh: Option<Arc<Mesh>>,
    /// Data timestamp the installed mesh was extracted from.
    pub mesh_timestamp: Timestamp,
    /// `revision` the installed mesh was extracted from.
    pub mesh_revision: u64,
    /// Extraction task currently in flight for this node.
    pub pending_task: Option<TaskId>,
}

impl OctreeNode {
    pub fn new(region: Region, parent: Option<NodeIndex>, height: u32, now: Timestamp) -> Self {
        Self {
            region,
            parent,
            children: [None; 8],
            height,
            last_modified: now,
            revision: 0,
            active: false,
            drawn: false,
            subtree_ready: false,
            mesh: None,
            mesh_timestamp: 0,
            mesh_revision: 0,
            pending_task: None,
        }
    }

    /// Current data version, captured by tasks when they are scheduled.
    #[inline]
    pub const fn data_stamp(&self) -> DataStamp {
        DataStamp {
            timestamp: self.last_modified,
            revision: self.revision,
        }
    }

    /// Whether data described by `stamp` has since been modified.
    #[inline]
    pub const fn is_newer_than(&self, stamp: DataStamp) -> bool {
        self.revision > stamp.revision
    }

    /// Existing children in octant order.
    pub fn children(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.children.iter().flatten().copied()
    }

    #[inline]
    pub fn has_children(&self) -> bool {
        self.children.iter().any(Option::is_some)
    }

    #[inline]
    pub const fn is_mesh_ready(&self) -> bool {
        self.mesh.is_some()
    }

    /// Whether the node has a mesh with something to draw.
    pub fn is_renderable(&self) -> bool {
        self.mesh.as_ref().is_some_and(|mesh| !mesh.is_empty())
    }

    /// No mesh yet, or the data changed since the mesh was extracted.
    #[inline]
    pub const fn is_stale(&self) -> bool {
        self.mesh.is_none() || self.revision > self.mesh_revision
    }

    /// Whether a mesh at `lod` has to be extracted: the node is stale or the
    /// installed mesh was built at a different LOD.
    pub fn needs_extraction(&self, lod: u32) -> bool {
        self.is_stale() || self.mesh.as_ref().is_some_and(|mesh| mesh.lod != lod)
    }

    /// Record a modification at `timestamp`.
    ///
    /// `last_modified` becomes the later of the two times. A mark older than
    /// the stored time is ignored; any other mark bumps `revision`, so a
    /// change at the same logical time still invalidates in-flight tasks.
    /// Returns whether the mark was accepted.
    pub fn mark_modified(&mut self, timestamp: Timestamp) -> bool {
        if timestamp < self.last_modified {
            return false;
        }
        self.last_modified = timestamp;
        self.revision += 1;
        true
    }
}

impl fmt::Debug for OctreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OctreeNode")
            .field("region", &self.region)
            .field("parent", &self.parent)
            .field("height", &self.height)
            .field("last_modified", &self.last_modified)
            .field("revision", &self.revision)
            .field("active", &self.active)
            .field("drawn", &self.drawn)
            .field("mesh", &self.mesh.as_ref().map(|m| m.triangle_count()))
            .field("mesh_timestamp", &self.mesh_timestamp)
            .field("mesh_revision", &self.mesh_revision)
            .field("pending_task", &self.pending_task)
            .finish_non_exhaustive()
    }
}
