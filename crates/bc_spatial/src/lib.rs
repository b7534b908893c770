#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

//! Spatial primitives shared by the tile, traffic and vehicle crates:
//! the linear BVH (C5) and the free-fly/follow camera with frustum
//! extraction (C10).

pub mod aabb;
pub mod camera;
pub mod frustum;
pub mod lbvh;
pub mod morton;
pub mod obb;
pub mod segment;

pub use aabb::Aabb;
pub use camera::{FollowCamera, FreeFlyCamera};
pub use frustum::{perspective_matrix, Frustum};
pub use lbvh::Lbvh;
pub use obb::{collision_features_obb_vs_obb, collision_obb_vs_obb, CollisionResult, Obb};
pub use segment::{closest_point_on_segment, closest_points_between_segments};
