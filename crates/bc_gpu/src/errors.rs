//! Error types for the allocator and GPU memory layers (C2/C3).

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    /// No free block (or segment) large enough to satisfy the request.
    #[error("GPU slab exhausted: requested {requested} bytes")]
    ExhaustedSlab { requested: u64 },

    /// A dynamic-ring allocation requested more than one segment can
    /// hold; the caller must split it.
    #[error("chunk of {requested} bytes exceeds segment size {seg_size}")]
    ChunkTooLarge { requested: u64, seg_size: u64 },

    /// `set_committed_size` asked for more than the reserved capacity.
    #[error("requested commit of {requested} bytes exceeds reserved capacity {capacity}")]
    NotCommitted { requested: usize, capacity: usize },

    /// The handle does not refer to a live allocation (already freed, or
    /// from a different allocator instance).
    #[error("unknown or already-freed allocation handle")]
    UnknownAllocation,
}

pub type Result<T> = std::result::Result<T, AllocError>;
