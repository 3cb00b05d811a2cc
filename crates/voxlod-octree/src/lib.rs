//! Level-of-detail octree for the voxlod engine.
//!
//! The octree partitions a voxel volume into a static hierarchy of regions.
//! Each update it selects which nodes to render for the viewer, schedules
//! surface extraction for those that need geometry and installs finished
//! meshes on the owning thread.

pub mod config;
pub mod executor;
pub mod node;
pub mod octree;
pub mod processor;
pub mod queue;
pub mod scheduler;
pub mod selection;
pub mod stats;
pub mod store;
pub mod task;
pub mod visitor;

pub use config::OctreeConfig;
pub use executor::{Executor, Job, RayonExecutor, SteppedExecutor, WorkerPool};
pub use node::{DataStamp, NodeIndex, OctreeNode};
pub use octree::{MeshUploader, Octree};
pub use processor::{FinishedTask, MainThreadTaskProcessor, TaskTarget};
pub use queue::{ConcurrentQueue, QueueProducer};
pub use stats::OctreeStats;
pub use store::NodeStore;
pub use task::{SurfaceExtractionTask, TaskId};
pub use visitor::NodeVisitor;
