//! Error types for tile streaming and generation.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileError {
    #[error("local tile coordinate ({i}, {j}) is outside the ring")]
    OutOfRing { i: u32, j: u32 },

    #[error("lod level {0} is out of range (expected 0..=2)")]
    InvalidLod(u32),

    #[error("gpu allocation failed for a tile lod group")]
    Allocation(#[from] bc_gpu::AllocError),

    #[error("entity store rejected a tile operation")]
    Ecs(#[from] bc_ecs::EcsError),
}

pub type Result<T> = std::result::Result<T, TileError>;
