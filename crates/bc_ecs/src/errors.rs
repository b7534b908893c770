//! Error types for the entity store (C4).

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcsError {
    /// The referenced `InstanceRef` has already been deallocated, or was
    /// never allocated by this store.
    #[error("stale or unknown instance reference")]
    StaleInstanceRef,

    /// A component type used in a query was never registered.
    #[error("component type was never registered with this store")]
    UnknownComponent,

    /// An archetype id used in `alloc` was never registered.
    #[error("archetype id was never registered with this store")]
    UnknownArchetype,
}

pub type Result<T> = std::result::Result<T, EcsError>;
