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

//! Toroidal tile streaming, deterministic procedural generation, and
//! LOD management (C6).

pub mod boxes;
pub mod errors;
pub mod generation;
pub mod lod;
pub mod manager;
pub mod tile;
pub mod traffic_target;

pub use boxes::{AnimatedBoxData, AnimatedPanelData, AnimationBox, BoxData, BuildingInstance, GpuBuildingInstance, LodGroupData, PanelData};
pub use errors::{Result, TileError};
pub use lod::{LodGroup, ALL_LOD_GROUPS};
pub use manager::TileManager;
pub use tile::{LocalTilePosition, Tile, WorldTilePosition, TILE_Z_MAX, TILE_Z_MIN};
pub use traffic_target::TrafficTarget;
