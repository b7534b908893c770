#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

//! Foundational types shared by every Box City crate: the handle pool
//! (C1), per-worker storage, simulation configuration, timing, and the
//! base error types each higher layer's own error enum wraps.

pub mod clock;
pub mod config;
pub mod errors;
pub mod per_worker;
pub mod pool;

pub use clock::Clock;
pub use config::SimConfig;
pub use errors::CoreError;
pub use per_worker::PerWorker;
pub use pool::{GraphicPool, Handle, Pool, WeakHandle};
