//! Index-addressed node arena.

use std::ops::{Index, IndexMut};

use crate::node::{NodeIndex, OctreeNode};

/// Flat arena owning every octree node.
///
/// Nodes are only ever appended, so a [`NodeIndex`] held by a task stays
/// valid for the lifetime of the store. Indexing with a handle from another
/// store is a contract violation and panics.
#[derive(Debug, Default)]
pub struct NodeStore {
    nodes: Vec<OctreeNode>,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Append a node and return its handle.
    pub fn insert(&mut self, node: OctreeNode) -> NodeIndex {
        let index = u32::try_from(self.nodes.len()).expect("node arena exceeded u32 indices");
        self.nodes.push(node);
        NodeIndex(index)
    }

    pub fn get(&self, index: NodeIndex) -> Option<&OctreeNode> {
        self.nodes.get(index.as_usize())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &OctreeNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeIndex(i as u32), node))
    }
}

impl Index<NodeIndex> for NodeStore {
    type Output = OctreeNode;

    #[inline]
    fn index(&self, index: NodeIndex) -> &Self::Output {
        &self.nodes[index.as_usize()]
    }
}

impl IndexMut<NodeIndex> for NodeStore {
    #[inline]
    fn index_mut(&mut self, index: NodeIndex) -> &mut Self::Output {
        &mut self.nodes[index.as_usize()]
    }
}
