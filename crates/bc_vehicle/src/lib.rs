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

//! Vehicle components and the time-sliced AI/physics controller that
//! drives traffic: player input, building avoidance, target steering,
//! and semi-implicit Euler integration.

pub mod components;
pub mod controller;
pub mod input;
pub mod tuning;

pub use components::{Car, CarBuildingsCache, CarControl, CarMovement, CarSettings, CarTarget, CachedBuilding, GpuCarInstance, NUM_CACHED_BUILDINGS};
pub use controller::{calculate_collision_forces, calculate_control_forces, integrate_car, setup_car_target, update_ai_control, update_player_control};
pub use input::PlayerInput;
pub use tuning::CarTuning;
