#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

//! Data and execution core for a real-time, GPU-driven procedural city
//! simulation: a toroidal streamed tile grid, an archetype ECS, an
//! independent vehicle-traffic ring, and the GPU memory/frame-graph
//! plumbing tying them together. [`Engine`] is the single entry point a
//! host embeds; everything else here is re-exported from the crates it
//! composes.

pub mod engine;
pub mod errors;
pub mod jobs;

pub use bc_core::{Clock, SimConfig};
pub use bc_ecs::{ArchetypeId, ComponentId, EntityStore, InstanceRef, Transaction, ZoneId, ZoneSet};
pub use bc_gpu::{CopyCommand, GpuMemory};
pub use bc_spatial::{Aabb, FreeFlyCamera, Obb};
pub use bc_tiles::{LocalTilePosition, TileManager, WorldTilePosition};
pub use bc_traffic::{CarGpuIndex, TileChange, TrafficManager};
pub use bc_vehicle::{Car, CarControl, CarMovement, CarSettings, CarTarget, CarTuning, GpuCarInstance, PlayerInput};
pub use bc_render::{PassDesc, ResourceStates, Submitter, TransientPool};

pub use engine::{Engine, FrameState};
pub use errors::{BoxCityError, Result};
pub use jobs::{round_robin_worker, JobFence, JobSystem, ThreadPoolJobSystem};
