#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

//! Archetype x zone entity store (C4): component columns, stable
//! `InstanceRef` indirection, per-worker deferred mutation, and a
//! read-only `process` query usable from parallel jobs.

pub mod archetype;
pub mod component;
pub mod errors;
pub mod instance_ref;
pub mod store;
pub mod zone;

pub use archetype::{ArchetypeId, ArchetypeRegistry, ComponentMask};
pub use component::{AnyColumn, Component, ComponentId, ComponentRegistry, TypedColumn};
pub use errors::EcsError;
pub use instance_ref::InstanceRef;
pub use store::{EntityIter, EntityStore, Transaction};
pub use zone::{ZoneId, ZoneSet};
