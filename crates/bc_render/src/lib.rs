#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

//! Frame graph: per-frame pass scheduling by declared resource
//! pre-conditions/post-updates, a transient resource pool matched by
//! descriptor, render-item sorting with a priority lookup table, and
//! fence-gated submission.

pub mod command_stream;
pub mod errors;
pub mod graph;
pub mod pass;
pub mod render_item;
pub mod resource;
pub mod submit;
pub mod transient_pool;

pub use command_stream::{CommandBuffer, Offset, RecordedOp};
pub use errors::{RenderError, Result};
pub use graph::RenderGraph;
pub use pass::{PassDesc, SubPass};
pub use render_item::{PointOfView, PriorityTable, RenderItem};
pub use resource::{Barrier, ResourceId, ResourceState, ResourceStates};
pub use submit::Submitter;
pub use transient_pool::{PoolRequest, ResourceKind, TransientPool};
