//! Headless voxlod flythrough.
//!
//! Generates terrain, flies a viewer over it while carving occasional
//! craters, and reports scheduling counters and frame timings.

mod config;
mod terrain;

use std::cell::Cell;
use std::f32::consts::TAU;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::{IVec3, Vec3};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
#[cfg(feature = "profiling-tracy")]
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use voxlod_core::Region;
use voxlod_octree::{NodeIndex, Octree, WorkerPool};
use voxlod_volume::{BlockId, CubicExtractor, DenseVolume, Mesh, Volume};

use crate::config::BenchConfig;
use crate::terrain::{TerrainConfig, TerrainGenerator};

const CRATER_RADIUS: i32 = 6;
const REPORT_INTERVAL: u32 = 60;
const DRAIN_TIMEOUT: Duration = Duration::from_secs(60);

fn init_logging() {
    #[cfg(feature = "profiling-tracy")]
    {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,voxlod_octree=trace,voxlod_volume=trace,voxlod_benchmark=trace")
        });
        let tracy_layer = tracing_tracy::TracyLayer::default();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .with(tracy_layer)
            .init();
    }
    #[cfg(not(feature = "profiling-tracy"))]
    {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .init();
    }
}

/// Viewer position on a slow orbit around the volume centre, dipping toward
/// the surface and climbing back out.
fn viewer_at(frame: u32, frames: u32, bounds: &Region) -> Vec3 {
    let t = frame as f32 / frames.max(1) as f32;
    let centre = bounds.centre();
    let extent = bounds.width() as f32;
    let angle = t * TAU;
    let radius = extent * 0.35;
    let altitude = extent * (0.55 + 0.3 * (t * TAU * 2.0).cos());
    Vec3::new(
        centre.x + radius * angle.cos(),
        bounds.lower.y as f32 + altitude,
        centre.z + radius * angle.sin(),
    )
}

/// Remove a box of voxels around the terrain surface below the viewer.
fn carve_crater(
    volume: &DenseVolume,
    generator: &TerrainGenerator,
    octree: &mut Octree,
    viewer: Vec3,
) -> usize {
    let bounds = volume.enclosing_region();
    let x = (viewer.x as i32).clamp(bounds.lower.x, bounds.upper.x);
    let z = (viewer.z as i32).clamp(bounds.lower.z, bounds.upper.z);
    let surface = generator.height_at(x, z);
    let centre = IVec3::new(x, surface, z);
    let crater = Region::new(
        centre - IVec3::splat(CRATER_RADIUS),
        centre + IVec3::splat(CRATER_RADIUS),
    );

    if volume.fill(&crater, BlockId::AIR) == 0 {
        return 0;
    }
    octree.mark_region_as_modified(&crater, octree.time())
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let config = BenchConfig::from_env()?;
    info!(?config, "voxlod benchmark starting");

    let volume = Arc::new(DenseVolume::with_size(config.volume_size)?);
    let generator = TerrainGenerator::new(TerrainConfig::for_volume_size(
        config.seed,
        config.volume_size,
    ));
    let start = Instant::now();
    generator.populate(&volume);
    info!(
        solid = volume.solid_count(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1e3,
        "Terrain generated"
    );

    let pool = Arc::new(if config.workers == 0 {
        WorkerPool::with_available_parallelism("voxlod-worker")?
    } else {
        WorkerPool::new("voxlod-worker", config.workers)?
    });

    let start = Instant::now();
    let mut octree = Octree::new(
        volume.clone(),
        Arc::new(CubicExtractor),
        pool.clone(),
        config.octree,
    )?;
    info!(
        nodes = octree.node_count(),
        cover = ?octree.region_to_cover(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1e3,
        "Octree built"
    );

    let uploaded_bytes = Rc::new(Cell::new(0usize));
    let uploads = Rc::new(Cell::new(0u64));
    {
        let uploaded_bytes = Rc::clone(&uploaded_bytes);
        let uploads = Rc::clone(&uploads);
        octree.set_mesh_uploader(move |_: NodeIndex, mesh: &Arc<Mesh>| {
            uploaded_bytes.set(uploaded_bytes.get() + mesh.memory_usage());
            uploads.set(uploads.get() + 1);
        });
    }

    let bounds = volume.enclosing_region();
    let mut update_time = Duration::ZERO;
    let mut slowest = Duration::ZERO;
    let mut carved = 0usize;

    for frame in 0..config.frames {
        let viewer = viewer_at(frame, config.frames, &bounds);

        let frame_start = Instant::now();
        let active = octree.update(1, viewer, config.lod_threshold);
        let elapsed = frame_start.elapsed();
        update_time += elapsed;
        slowest = slowest.max(elapsed);

        if config.edit_interval > 0 && frame > 0 && frame % config.edit_interval == 0 {
            carved += carve_crater(&volume, &generator, &mut octree, viewer);
        }

        if frame % REPORT_INTERVAL == 0 {
            let stats = octree.stats();
            info!(
                frame,
                active,
                rendered = stats.rendered_nodes,
                in_flight = stats.tasks_in_flight,
                scheduled = stats.tasks_scheduled,
                completed = stats.tasks_completed,
                discarded = stats.tasks_discarded,
                queued_jobs = pool.queued_jobs(),
                "Frame"
            );
        }
    }

    let start = Instant::now();
    if !octree.finish_pending(DRAIN_TIMEOUT) {
        warn!(
            in_flight = octree.stats().tasks_in_flight,
            "Timed out waiting for extraction tasks"
        );
    }
    let drain_time = start.elapsed();

    let stats = octree.stats();
    let frames = config.frames.max(1);
    info!(
        frames = config.frames,
        avg_update_ms = (update_time / frames).as_secs_f64() * 1e3,
        max_update_ms = slowest.as_secs_f64() * 1e3,
        drain_ms = drain_time.as_secs_f64() * 1e3,
        "Update timings"
    );
    info!(
        scheduled = stats.tasks_scheduled,
        completed = stats.tasks_completed,
        discarded = stats.tasks_discarded,
        failed = stats.tasks_failed,
        deferred = stats.tasks_deferred,
        nodes_marked = carved,
        uploads = uploads.get(),
        uploaded_kib = uploaded_bytes.get() / 1024,
        "Task summary"
    );

    drop(octree);
    pool.shutdown(true);
    Ok(())
}
