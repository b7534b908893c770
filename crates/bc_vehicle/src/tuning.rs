//! Vehicle controller tunables.
//!
//! Grounded on `box_city_car_control.cpp`'s `CONTROL_VARIABLE`/
//! `CONTROL_VARIABLE_BOOL` declarations; each field keeps the source's
//! default. The source exposes these as independent global hot-reloadable
//! variables wired to a debug UI; this workspace has no such UI, so they
//! collect into one plain struct a caller can override wholesale (e.g.
//! from `SimConfig`).

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CarTuning {
    pub avoidance_enable: bool,
    pub targeting_enable: bool,
    pub collision_enable: bool,

    pub y_range: f32,
    pub y_mouse_factor: f32,
    pub y_keyboard_factor: f32,
    pub inverse_y: bool,
    pub y_absorber: f32,

    pub x_range: f32,
    pub x_mouse_factor: f32,
    pub x_keyboard_factor: f32,
    pub x_absorber: f32,

    pub forward_mouse_factor: f32,
    pub forward_keyboard_factor: f32,

    pub y_pitch_force: f32,
    pub y_pitch_linear_force: f32,

    pub x_roll_angular_force: f32,
    pub x_jaw_angular_force: f32,
    pub x_linear_force: f32,

    pub forward_force: f32,
    pub forward_kill_height_force: f32,

    pub friction_linear_force: f32,
    pub friction_angular_force: f32,

    pub ai_forward: f32,
    pub ai_min_forward: f32,
    pub ai_avoidance_calculation_distance: f32,
    pub ai_visibility_distance: f32,
    pub ai_visibility_side_distance: f32,
    pub ai_avoidance_extra_distance: f32,
    pub ai_avoidance_distance_expansion: f32,
    pub ai_avoidance_reaction_factor: f32,
    pub ai_avoidance_reaction_power: f32,
    pub ai_avoidance_slow_factor: f32,
    pub ai_min_target_distance: f32,
    pub ai_close_target_distance: f32,
    pub ai_close_target_distance_slow: f32,

    /// Tile height band the forward force's soft walls push back from.
    pub tile_height_top: f32,
    pub tile_height_bottom: f32,
}

impl Default for CarTuning {
    fn default() -> Self {
        Self {
            avoidance_enable: false,
            targeting_enable: true,
            collision_enable: false,

            y_range: 0.7,
            y_mouse_factor: 0.2,
            y_keyboard_factor: 2.0,
            inverse_y: false,
            y_absorber: 0.15,

            x_range: 0.5,
            x_mouse_factor: 0.2,
            x_keyboard_factor: 2.0,
            x_absorber: 0.15,

            forward_mouse_factor: 2.25,
            forward_keyboard_factor: 1.25,

            y_pitch_force: 0.02,
            y_pitch_linear_force: 0.0,

            x_roll_angular_force: 0.02,
            x_jaw_angular_force: 0.05,
            x_linear_force: 0.0,

            forward_force: 300.0,
            forward_kill_height_force: 2.0,

            friction_linear_force: 1.8,
            friction_angular_force: 1.8,

            ai_forward: 0.6,
            ai_min_forward: 0.2,
            ai_avoidance_calculation_distance: 1000.0,
            ai_visibility_distance: 150.0,
            ai_visibility_side_distance: 80.0,
            ai_avoidance_extra_distance: 15.0,
            ai_avoidance_distance_expansion: 80.0,
            ai_avoidance_reaction_factor: 1.2,
            ai_avoidance_reaction_power: 0.8,
            ai_avoidance_slow_factor: 0.0,
            ai_min_target_distance: 100.0,
            ai_close_target_distance: 200.0,
            ai_close_target_distance_slow: 0.5,

            tile_height_top: bc_tiles::TILE_Z_MAX,
            tile_height_bottom: bc_tiles::TILE_Z_MIN,
        }
    }
}

/// Frames between AI updates scales with distance to camera.
pub const AI_TIMESLICE_MAX_RATE: u32 = 8;
pub const AI_TIMESLICE_MIN_RANGE: f32 = 500.0;
pub const AI_TIMESLICE_MAX_RANGE: f32 = 3000.0;
/// Avoidance cache is rebuilt on a coarser cadence than the rest of AI.
pub const AVOIDANCE_CACHE_REBUILD_RATE: u32 = 4;
