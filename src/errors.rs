//! Error types for the umbrella engine.
//!
//! One enum wrapping each crate's own error type with `#[from]`, the
//! same grouped-variant style every lower layer already uses, plus a
//! handful of variants for failures that only make sense at the
//! orchestration layer itself (device loss, config overlay).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BoxCityError {
    #[error("handle pool error: {0}")]
    Core(#[from] bc_core::CoreError),

    #[error("gpu allocator error: {0}")]
    Gpu(#[from] bc_gpu::AllocError),

    #[error("entity store error: {0}")]
    Ecs(#[from] bc_ecs::EcsError),

    #[error("tile manager error: {0}")]
    Tiles(#[from] bc_tiles::TileError),

    #[error("traffic manager error: {0}")]
    Traffic(#[from] bc_traffic::TrafficError),

    #[error("frame graph error: {0}")]
    Render(#[from] bc_render::RenderError),

    #[error("config overlay failed: {0}")]
    Config(#[from] serde_json::Error),

    /// The display device reported a lost device; fatal per the error
    /// handling design's "surface to the host and exit cleanly" rule.
    #[error("GPU device lost")]
    DeviceLost,
}

pub type Result<T> = std::result::Result<T, BoxCityError>;
