//! Error Types
//!
//! Base error kinds shared across crates. Each higher-level crate defines
//! its own `thiserror` enum and wraps these with `#[from]` where a lower
//! layer's failure propagates cleanly, following the same grouped-variant
//! style throughout the workspace.

use thiserror::Error;

/// Errors produced by [`crate::pool::Pool`] and [`crate::pool::GraphicPool`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreError {
    /// The pool has reached `max_size` and has no free slot to reuse.
    #[error("handle pool exhausted (max_size reached)")]
    OutOfHandles,

    /// The handle's generation does not match the slot's current
    /// generation (the slot was freed and possibly reused since).
    #[error("stale or invalid handle")]
    InvalidHandle,
}

/// Alias for `Result<T, CoreError>`.
pub type Result<T> = std::result::Result<T, CoreError>;
