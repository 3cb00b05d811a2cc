//! The 256³ walkthrough: coarse root first, children once the root has a mesh.

mod common;

use approx::assert_relative_eq;
use glam::Vec3;
use voxlod_octree::OctreeConfig;

use common::{assert_one_active_per_column, half_filled_volume, stepped_octree};

#[test]
fn root_first_then_children() {
    let volume = half_filled_volume(256);
    let config = OctreeConfig::default();
    assert_eq!((config.base_node_size, config.minimum_lod, config.maximum_lod), (32, 2, 0));
    let (mut octree, executor) = stepped_octree(&volume, config);

    assert_eq!(octree.node_count(), 1 + 8 + 64 + 512);
    let root = octree.root();
    let centre = octree.region_to_cover().centre();
    assert_relative_eq!(centre.x, 128.0);
    assert_relative_eq!(centre.y, 128.0);
    assert_relative_eq!(centre.z, 128.0);

    // First update: only the root can be selected, and it has no mesh yet.
    assert_eq!(octree.update(1, centre, 1.0), 1);
    assert_eq!(octree.active_nodes(), &[root]);
    assert_eq!(octree.stats().tasks_scheduled, 1);
    assert_eq!(executor.queued(), 1);
    assert!(octree.root_node().pending_task.is_some());

    executor.run_all();

    // Second update: still only the root, whose mesh arrives during the update.
    assert_eq!(octree.update(1, centre, 1.0), 1);
    assert!(octree.root_node().active);
    assert!(octree.root_node().is_renderable());
    assert_eq!(octree.root_node().mesh.as_ref().unwrap().lod, 2);
    let stats = octree.stats();
    assert_eq!(stats.tasks_scheduled, 1);
    assert_eq!(stats.tasks_completed, 1);
    assert_eq!(stats.tasks_in_flight, 0);

    // Third update: the viewer is inside the root, which now splits.
    assert_eq!(octree.update(1, centre, 1.0), 8);
    assert_one_active_per_column(&octree);
    let root_node = octree.root_node();
    assert!(!root_node.active);
    assert!(root_node.mesh.is_some(), "parent mesh stays cached");
    for &child in octree.active_nodes() {
        let node = octree.node(child);
        assert_eq!(node.parent, Some(root));
        assert!(node.pending_task.is_some());
    }
    assert_eq!(octree.stats().tasks_scheduled, 9);
    assert_eq!(executor.queued(), 8);

    // Until the children have meshes, the parent is drawn in their place.
    let drawn: Vec<_> = octree.renderable_nodes().map(|(index, _)| index).collect();
    assert_eq!(drawn, vec![root]);

    executor.run_all();
    assert_eq!(octree.update(1, centre, 1.0), 8);

    // Only the four lower children contain a surface.
    let drawn: Vec<_> = octree.renderable_nodes().map(|(index, _)| index).collect();
    assert_eq!(drawn.len(), 4);
    assert!(!drawn.contains(&root));
    assert!(!octree.root_node().drawn);
    for index in drawn {
        let node = octree.node(index);
        assert!(node.active);
        assert_eq!(node.region.width(), 128);
        assert_eq!(node.mesh.as_ref().unwrap().lod, 2);
    }
}

#[test]
fn distant_viewer_keeps_root_until_approaching() {
    let volume = half_filled_volume(256);
    let (mut octree, executor) = stepped_octree(&volume, OctreeConfig::default());
    let far = Vec3::new(128.0, 128.0, 5000.0);

    assert_eq!(octree.update(1, far, 1.0), 1);
    executor.run_all();
    for _ in 0..3 {
        assert_eq!(octree.update(1, far, 1.0), 1);
        assert!(octree.root_node().active);
    }
    assert_eq!(octree.stats().tasks_scheduled, 1);
    assert_eq!(executor.queued(), 0);

    let near = octree.region_to_cover().centre();
    assert_eq!(octree.update(1, near, 1.0), 8);
    assert_eq!(octree.stats().tasks_scheduled, 9);
    assert_one_active_per_column(&octree);

    // Moving away again reactivates the cached root without new work.
    assert_eq!(octree.update(1, far, 1.0), 1);
    assert!(octree.root_node().active);
    assert_eq!(octree.stats().tasks_scheduled, 9);
}

#[test]
fn zero_threshold_never_refines() {
    let volume = half_filled_volume(256);
    let (mut octree, executor) = stepped_octree(&volume, OctreeConfig::default());
    let centre = octree.region_to_cover().centre();

    for _ in 0..4 {
        assert_eq!(octree.update(1, centre, 0.0), 1);
        executor.run_all();
    }
    assert_eq!(octree.stats().tasks_scheduled, 1);
}

#[test]
fn refinement_reaches_base_nodes_near_viewer() {
    let volume = half_filled_volume(256);
    let (mut octree, executor) = stepped_octree(&volume, OctreeConfig::default());
    let viewer = Vec3::new(16.0, 120.0, 16.0);

    for _ in 0..8 {
        octree.update(1, viewer, 1.0);
        executor.run_all();
    }
    octree.update(1, viewer, 1.0);
    assert_one_active_per_column(&octree);

    let under_viewer = octree
        .active_nodes()
        .iter()
        .map(|&index| octree.node(index))
        .find(|node| node.region.contains_point(viewer.as_ivec3()))
        .expect("viewer lies inside the volume");
    assert_eq!(under_viewer.height, 0);
    assert_eq!(under_viewer.mesh.as_ref().map_or(u32::MAX, |m| m.lod), 0);

    // Nodes far from the viewer stay coarse.
    let coarse = octree
        .active_nodes()
        .iter()
        .any(|&index| octree.node(index).height >= 2);
    assert!(coarse);
}
