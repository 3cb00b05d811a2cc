//! LOD selection and render-set derivation.

use glam::Vec3;

use crate::node::{NodeIndex, OctreeNode};
use crate::store::NodeStore;
use crate::visitor::{walk, walk_mut, NodeVisitor};

/// Viewer input for one selection pass.
#[derive(Debug, Clone, Copy)]
pub struct ViewParams {
    pub position: Vec3,
    /// Multiple of a node's edge length within which it splits into children.
    pub lod_threshold: f32,
    /// Nodes at or below this height never split.
    pub maximum_lod: u32,
}

impl ViewParams {
    /// Whether `node` should be replaced by its children.
    ///
    /// A node only splits once it has a mesh of its own, so coarse geometry
    /// is always available while finer meshes are being built. The distance
    /// test grows with node size, so moving away never selects finer nodes.
    pub fn should_refine(&self, node: &OctreeNode) -> bool {
        if node.height <= self.maximum_lod || !node.has_children() || !node.is_mesh_ready() {
            return false;
        }
        let edge = node.region.width() as f32;
        self.position.distance(node.region.centre()) < self.lod_threshold * edge
    }
}

/// Choose the nodes to render, one per covered column of the hierarchy.
#[cfg_attr(
    feature = "profiling-tracy",
    tracing::instrument(level = "trace", skip_all)
)]
pub fn determine_active_nodes(store: &NodeStore, root: NodeIndex, view: &ViewParams) -> Vec<NodeIndex> {
    let mut selection = Vec::new();
    let mut visitor = NodeVisitor::pre_order(|index: NodeIndex, node: &OctreeNode| {
        if view.should_refine(node) {
            return true;
        }
        selection.push(index);
        false
    });
    walk(store, root, &mut visitor);
    selection
}

/// Replace the active flags of `previous` with those of `next`.
pub fn apply_selection(store: &mut NodeStore, previous: &[NodeIndex], next: &[NodeIndex]) {
    for &index in previous {
        store[index].active = false;
    }
    for &index in next {
        store[index].active = true;
    }
}

/// Decide which nodes are drawn, writing them into `drawn`.
///
/// Active nodes with a mesh are drawn. Where some active nodes below an
/// inactive node still lack meshes, the nearest ancestor with a mesh is drawn
/// in their place and nothing below it is.
pub fn update_render_set(store: &mut NodeStore, root: NodeIndex, drawn: &mut Vec<NodeIndex>) {
    for &index in drawn.iter() {
        store[index].drawn = false;
    }
    drawn.clear();

    let mut readiness = NodeVisitor::new(
        |store: &mut NodeStore, index: NodeIndex| !store[index].active,
        |store: &mut NodeStore, index: NodeIndex| {
            let node = &store[index];
            let ready = if node.active {
                node.is_mesh_ready()
            } else {
                node.children().all(|child| store[child].subtree_ready)
            };
            store[index].subtree_ready = ready;
        },
    );
    walk_mut(store, root, &mut readiness);

    let mut marking = NodeVisitor::pre_order_mut(|store: &mut NodeStore, index: NodeIndex| {
        let node = &mut store[index];
        if node.active || (!node.subtree_ready && node.is_mesh_ready()) {
            if node.is_mesh_ready() {
                node.drawn = true;
                drawn.push(index);
            }
            return false;
        }
        true
    });
    walk_mut(store, root, &mut marking);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use glam::IVec3;
    use voxlod_core::Region;
    use voxlod_volume::Mesh;

    /// Root of height 1 over a 64³ region with all eight children.
    fn two_level_tree() -> NodeStore {
        let mut store = NodeStore::new();
        let region = Region::from_lower_and_size(IVec3::ZERO, IVec3::splat(64));
        let root = store.insert(OctreeNode::new(region, None, 1, 0));
        for i in 0..8 {
            let child = store.insert(OctreeNode::new(region.octant(i), Some(root), 0, 0));
            store[root].children[usize::from(i)] = Some(child);
        }
        store
    }

    fn give_mesh(store: &mut NodeStore, index: NodeIndex) {
        store[index].mesh = Some(Arc::new(Mesh::new(0)));
    }

    fn view(position: Vec3, lod_threshold: f32) -> ViewParams {
        ViewParams {
            position,
            lod_threshold,
            maximum_lod: 0,
        }
    }

    #[test]
    fn root_without_mesh_is_selected() {
        let store = two_level_tree();
        let selection = determine_active_nodes(&store, NodeIndex(0), &view(Vec3::splat(32.0), 10.0));
        assert_eq!(selection, vec![NodeIndex(0)]);
    }

    #[test]
    fn close_viewer_refines_meshed_root() {
        let mut store = two_level_tree();
        give_mesh(&mut store, NodeIndex(0));

        let near = determine_active_nodes(&store, NodeIndex(0), &view(Vec3::splat(32.0), 1.0));
        assert_eq!(near.len(), 8);

        let far = determine_active_nodes(&store, NodeIndex(0), &view(Vec3::splat(1000.0), 1.0));
        assert_eq!(far, vec![NodeIndex(0)]);
    }

    #[test]
    fn maximum_lod_stops_refinement() {
        let mut store = two_level_tree();
        give_mesh(&mut store, NodeIndex(0));
        let params = ViewParams {
            maximum_lod: 1,
            ..view(Vec3::splat(32.0), 1.0)
        };
        assert_eq!(determine_active_nodes(&store, NodeIndex(0), &params), vec![NodeIndex(0)]);
    }

    #[test]
    fn parent_is_drawn_until_children_are_ready() {
        let mut store = two_level_tree();
        give_mesh(&mut store, NodeIndex(0));
        let selection = determine_active_nodes(&store, NodeIndex(0), &view(Vec3::splat(32.0), 1.0));
        apply_selection(&mut store, &[], &selection);

        let mut drawn = Vec::new();
        for &child in &selection[..7] {
            give_mesh(&mut store, child);
        }
        update_render_set(&mut store, NodeIndex(0), &mut drawn);
        assert_eq!(drawn, vec![NodeIndex(0)]);
        assert!(store[NodeIndex(0)].drawn);

        give_mesh(&mut store, selection[7]);
        update_render_set(&mut store, NodeIndex(0), &mut drawn);
        assert_eq!(drawn, selection);
        assert!(!store[NodeIndex(0)].drawn);
    }

    #[test]
    fn active_nodes_without_fallback_are_skipped() {
        let mut store = two_level_tree();
        give_mesh(&mut store, NodeIndex(0));
        let selection = determine_active_nodes(&store, NodeIndex(0), &view(Vec3::splat(32.0), 1.0));
        apply_selection(&mut store, &[], &selection);
        store[NodeIndex(0)].mesh = None;
        give_mesh(&mut store, selection[0]);

        let mut drawn = Vec::new();
        update_render_set(&mut store, NodeIndex(0), &mut drawn);
        assert_eq!(drawn, vec![selection[0]]);
    }
}
