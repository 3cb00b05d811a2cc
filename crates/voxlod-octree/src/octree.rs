//! The octree: hierarchy construction, LOD activation and mesh scheduling.

use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::{IVec3, Vec3};
use tracing::{debug, trace, warn};
use voxlod_core::{Error, LogicalClock, Region, Result, Timestamp};
use voxlod_volume::{CubicExtractor, Mesh, SurfaceExtractor, Volume};

use crate::config::{validate_lod_range, OctreeConfig, MAX_NODE_SIZE};
use crate::executor::{Executor, RayonExecutor};
use crate::node::{NodeIndex, OctreeNode};
use crate::processor::{FinishedTask, MainThreadTaskProcessor, TaskTarget};
use crate::scheduler::ExtractionScheduler;
use crate::selection::{apply_selection, determine_active_nodes, update_render_set, ViewParams};
use crate::stats::OctreeStats;
use crate::store::NodeStore;
use crate::visitor::{walk, walk_mut, NodeVisitor};

/// Receives meshes as they are installed, on the octree's own thread.
///
/// This is where renderer buffers get created or replaced.
pub trait MeshUploader {
    fn upload(&mut self, node: NodeIndex, mesh: &Arc<Mesh>);
}

impl<F> MeshUploader for F
where
    F: FnMut(NodeIndex, &Arc<Mesh>),
{
    fn upload(&mut self, node: NodeIndex, mesh: &Arc<Mesh>) {
        self(node, mesh);
    }
}

/// Spatial LOD hierarchy over a voxel volume.
///
/// All methods run on the thread that created the octree. Extraction runs
/// on the executor and results come back through the task processor during
/// [`update`](Self::update).
pub struct Octree {
    config: OctreeConfig,
    clock: LogicalClock,
    volume: Arc<dyn Volume>,
    region_to_cover: Region,
    nodes: NodeStore,
    root: NodeIndex,
    scheduler: ExtractionScheduler,
    processor: MainThreadTaskProcessor,
    uploader: Option<Box<dyn MeshUploader>>,
    active: Vec<NodeIndex>,
    drawn: Vec<NodeIndex>,
    stats: OctreeStats,
}

impl Octree {
    /// Build the full hierarchy over `volume`.
    pub fn new(
        volume: Arc<dyn Volume>,
        extractor: Arc<dyn SurfaceExtractor>,
        executor: Arc<dyn Executor>,
        config: OctreeConfig,
    ) -> Result<Self> {
        config.validate()?;
        let enclosing = volume.enclosing_region();
        if !enclosing.is_valid() {
            return Err(Error::EmptyVolume);
        }

        let region_to_cover = Self::compute_region_to_cover(&enclosing, config.base_node_size)?;
        let clock = LogicalClock::default();
        let root_height = (region_to_cover.width() as u32 / config.base_node_size).trailing_zeros();

        let mut nodes = NodeStore::new();
        let root = build_subtree(
            &mut nodes,
            &enclosing,
            region_to_cover,
            None,
            root_height,
            clock.now(),
        );

        let processor = MainThreadTaskProcessor::new();
        let scheduler = ExtractionScheduler::new(
            Arc::clone(&volume),
            extractor,
            executor,
            processor.producer(),
        );

        debug!(
            nodes = nodes.len(),
            root_height,
            cover = ?region_to_cover,
            "Octree built"
        );

        Ok(Self {
            config,
            clock,
            volume,
            region_to_cover,
            nodes,
            root,
            scheduler,
            processor,
            uploader: None,
            active: Vec::new(),
            drawn: Vec::new(),
            stats: OctreeStats::default(),
        })
    }

    /// Octree meshing with [`CubicExtractor`] on rayon's global pool.
    pub fn with_rayon(volume: Arc<dyn Volume>, config: OctreeConfig) -> Result<Self> {
        Self::new(
            volume,
            Arc::new(CubicExtractor),
            Arc::new(RayonExecutor),
            config,
        )
    }

    /// Power-of-two cube anchored at the volume's lower corner, at least one
    /// base node wide.
    fn compute_region_to_cover(enclosing: &Region, base_node_size: u32) -> Result<Region> {
        let largest = enclosing.dimensions().max_element().max(1) as u32;
        let size = largest.next_power_of_two().max(base_node_size);
        let fits = size <= MAX_NODE_SIZE
            && enclosing.lower.max_element().checked_add(size as i32).is_some();
        if !fits {
            return Err(Error::OutOfBounds(format!(
                "cannot cover {enclosing:?} with a cube of edge {size}"
            )));
        }
        Ok(Region::from_lower_and_size(
            enclosing.lower,
            IVec3::splat(size as i32),
        ))
    }

    /// Advance time, reselect active nodes, schedule extractions and apply
    /// finished tasks. Returns the number of active nodes.
    #[cfg_attr(
        feature = "profiling-tracy",
        tracing::instrument(level = "trace", skip_all)
    )]
    pub fn update(&mut self, dt: Timestamp, view_position: Vec3, lod_threshold: f32) -> usize {
        self.clock.advance(dt);

        let view = ViewParams {
            position: view_position,
            lod_threshold,
            maximum_lod: self.config.maximum_lod,
        };
        let selection = determine_active_nodes(&self.nodes, self.root, &view);
        apply_selection(&mut self.nodes, &self.active, &selection);
        self.active = selection;

        self.schedule_extractions();
        self.apply_finished_tasks();
        update_render_set(&mut self.nodes, self.root, &mut self.drawn);

        self.active.len()
    }

    fn schedule_extractions(&mut self) {
        for &index in &self.active {
            let node = &mut self.nodes[index];
            let lod = self.config.lod_for_height(node.height);
            if !node.needs_extraction(lod) {
                continue;
            }
            if node.pending_task.is_some() {
                self.stats.tasks_deferred += 1;
                continue;
            }
            self.scheduler.schedule(index, node, lod);
        }
    }

    fn apply_finished_tasks(&mut self) -> usize {
        let mut context = TaskContext {
            config: &self.config,
            nodes: &mut self.nodes,
            scheduler: &mut self.scheduler,
            uploader: self.uploader.as_mut(),
            stats: &mut self.stats,
        };
        self.processor.process_all_tasks(&mut context)
    }

    /// Apply at most one finished task. Never blocks.
    pub fn process_one_task(&mut self) -> bool {
        let mut context = TaskContext {
            config: &self.config,
            nodes: &mut self.nodes,
            scheduler: &mut self.scheduler,
            uploader: self.uploader.as_mut(),
            stats: &mut self.stats,
        };
        let applied = self.processor.process_one_task(&mut context);
        if applied {
            update_render_set(&mut self.nodes, self.root, &mut self.drawn);
        }
        applied
    }

    /// Apply every finished task that is waiting. Never blocks.
    pub fn process_all_tasks(&mut self) -> usize {
        let applied = self.apply_finished_tasks();
        if applied > 0 {
            update_render_set(&mut self.nodes, self.root, &mut self.drawn);
        }
        applied
    }

    /// Queue a task that was executed on this thread for the next drain.
    pub fn add_task(&mut self, task: FinishedTask) {
        self.processor.add_task(task);
    }

    /// Whether finished tasks are waiting to be applied.
    pub fn has_tasks(&self) -> bool {
        self.processor.has_tasks()
    }

    /// Block until no task is in flight or `timeout` passes.
    ///
    /// Stale results rescheduled while draining are waited for as well.
    /// Returns whether everything was drained.
    pub fn finish_pending(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let drained = loop {
            self.apply_finished_tasks();
            if self.scheduler.in_flight_count() == 0 {
                break true;
            }
            let now = Instant::now();
            if now >= deadline {
                break false;
            }
            self.processor.wait_for_task(deadline - now);
        };
        update_render_set(&mut self.nodes, self.root, &mut self.drawn);
        drained
    }

    /// Record that the voxel at `position` changed at `timestamp`.
    ///
    /// Marks the containing node at every level. Returns the number of nodes
    /// marked, zero when the point is outside the covered region.
    pub fn mark_data_as_modified(&mut self, position: IVec3, timestamp: Timestamp) -> usize {
        let mut marked = 0;
        let mut current = Some(self.root);
        while let Some(index) = current {
            let node = &mut self.nodes[index];
            if !node.region.contains_point(position) {
                break;
            }
            node.mark_modified(timestamp);
            marked += 1;
            current = node.children[usize::from(node.region.octant_containing(position))];
        }
        trace!(?position, timestamp, marked, "Marked point modified");
        marked
    }

    /// Record that voxels inside `region` changed at `timestamp`.
    ///
    /// Every node overlapping the region is marked, which includes all of
    /// their ancestors. Returns the number of nodes marked.
    pub fn mark_region_as_modified(&mut self, region: &Region, timestamp: Timestamp) -> usize {
        let mut marked = 0;
        let mut visitor = NodeVisitor::pre_order_mut(|store: &mut NodeStore, index: NodeIndex| {
            let node = &mut store[index];
            if !node.region.intersects(region) {
                return false;
            }
            node.mark_modified(timestamp);
            marked += 1;
            true
        });
        walk_mut(&mut self.nodes, self.root, &mut visitor);
        trace!(?region, timestamp, marked, "Marked region modified");
        marked
    }

    /// Change the range of rendered LODs. Takes effect on the next update,
    /// which re-extracts active nodes whose mesh LOD no longer matches.
    pub fn set_lod_range(&mut self, minimum_lod: u32, maximum_lod: u32) -> Result<()> {
        validate_lod_range(minimum_lod, maximum_lod)?;
        self.config.minimum_lod = minimum_lod;
        self.config.maximum_lod = maximum_lod;
        debug!(minimum_lod, maximum_lod, "LOD range changed");
        Ok(())
    }

    /// Install the hook that receives every newly installed mesh.
    pub fn set_mesh_uploader(&mut self, uploader: impl MeshUploader + 'static) {
        self.uploader = Some(Box::new(uploader));
    }

    /// Run `visitor` over the whole hierarchy.
    pub fn accept_visitor<Pre, Post>(&self, visitor: &mut NodeVisitor<Pre, Post>)
    where
        Pre: FnMut(NodeIndex, &OctreeNode) -> bool,
        Post: FnMut(NodeIndex, &OctreeNode),
    {
        walk(&self.nodes, self.root, visitor);
    }

    /// Nodes selected by the last update.
    pub fn active_nodes(&self) -> &[NodeIndex] {
        &self.active
    }

    /// Nodes to draw this frame that have geometry, fallbacks included.
    pub fn renderable_nodes(&self) -> impl Iterator<Item = (NodeIndex, &OctreeNode)> + '_ {
        self.drawn
            .iter()
            .map(|&index| (index, &self.nodes[index]))
            .filter(|(_, node)| node.is_renderable())
    }

    pub fn stats(&self) -> OctreeStats {
        OctreeStats {
            tasks_scheduled: self.scheduler.scheduled_count(),
            tasks_in_flight: self.scheduler.in_flight_count(),
            active_nodes: self.active.len(),
            rendered_nodes: self.renderable_nodes().count(),
            ..self.stats
        }
    }

    /// Current logical time.
    pub const fn time(&self) -> Timestamp {
        self.clock.now()
    }

    pub const fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn root_node(&self) -> &OctreeNode {
        &self.nodes[self.root]
    }

    /// Node by index. Panics on an index this octree did not hand out.
    pub fn node(&self, index: NodeIndex) -> &OctreeNode {
        &self.nodes[index]
    }

    pub fn get_node(&self, index: NodeIndex) -> Option<&OctreeNode> {
        self.nodes.get(index)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn volume(&self) -> &Arc<dyn Volume> {
        &self.volume
    }

    /// Power-of-two region spanned by the root node.
    pub const fn region_to_cover(&self) -> Region {
        self.region_to_cover
    }

    pub const fn minimum_lod(&self) -> u32 {
        self.config.minimum_lod
    }

    pub const fn maximum_lod(&self) -> u32 {
        self.config.maximum_lod
    }

    pub const fn config(&self) -> &OctreeConfig {
        &self.config
    }
}

/// Create the node for `region` and, above base size, its children that
/// overlap `bounds`.
fn build_subtree(
    nodes: &mut NodeStore,
    bounds: &Region,
    region: Region,
    parent: Option<NodeIndex>,
    height: u32,
    now: Timestamp,
) -> NodeIndex {
    let index = nodes.insert(OctreeNode::new(region, parent, height, now));
    if height > 0 {
        for octant in 0..8u8 {
            let child_region = region.octant(octant);
            if !child_region.intersects(bounds) {
                continue;
            }
            let child = build_subtree(nodes, bounds, child_region, Some(index), height - 1, now);
            nodes[index].children[usize::from(octant)] = Some(child);
        }
    }
    index
}

/// Disjoint borrows of the octree state that finished tasks write to.
struct TaskContext<'a> {
    config: &'a OctreeConfig,
    nodes: &'a mut NodeStore,
    scheduler: &'a mut ExtractionScheduler,
    uploader: Option<&'a mut Box<dyn MeshUploader>>,
    stats: &'a mut OctreeStats,
}

impl TaskTarget for TaskContext<'_> {
    fn apply_task(&mut self, mut task: FinishedTask) {
        let id = task.id();
        let index = task.node();
        self.scheduler.complete(id);

        let node = &mut self.nodes[index];
        if node.pending_task == Some(id) {
            node.pending_task = None;
        }

        if node.is_newer_than(task.data()) {
            self.stats.tasks_discarded += 1;
            trace!(
                task = id.0,
                node = index.0,
                data = task.data_timestamp(),
                modified = node.last_modified,
                revision = node.revision,
                "Discarding stale extraction"
            );
            if node.pending_task.is_none() {
                let lod = self.config.lod_for_height(node.height);
                self.scheduler.schedule(index, node, lod);
            }
            return;
        }

        match task.take_result() {
            Some(Ok(mesh)) => {
                let mesh = Arc::new(mesh);
                trace!(
                    task = id.0,
                    node = index.0,
                    triangles = mesh.triangle_count(),
                    elapsed_us = task.elapsed().as_micros() as u64,
                    "Installing mesh"
                );
                node.mesh = Some(Arc::clone(&mesh));
                node.mesh_timestamp = task.data_timestamp();
                node.mesh_revision = task.data().revision;
                self.stats.tasks_completed += 1;
                if let Some(uploader) = self.uploader.as_mut() {
                    uploader.upload(index, &mesh);
                }
            }
            Some(Err(err)) => {
                self.stats.tasks_failed += 1;
                warn!(node = index.0, region = ?task.region(), "Surface extraction failed: {err}");
            }
            None => {
                self.stats.tasks_failed += 1;
                warn!(node = index.0, "Extraction task returned without running");
            }
        }
    }
}
