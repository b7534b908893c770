//! Player input snapshot consumed by [`crate::controller::update_player_control`].
//!
//! Grounded on `box_city_car_control.cpp`'s `UpdatePlayerControl`, which
//! polls `platform::Game` directly for mouse deltas, key states and
//! wheel events. This workspace carries no input/platform crate, so the
//! controller takes this already-resolved snapshot instead — whatever
//! owns the window loop fills it in once per frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlayerInput {
    pub mouse_delta_x: f32,
    pub mouse_delta_y: f32,
    pub wheel_delta: f32,
    pub key_w: bool,
    pub key_s: bool,
    pub key_a: bool,
    pub key_d: bool,
    pub key_q: bool,
    pub key_e: bool,
}
