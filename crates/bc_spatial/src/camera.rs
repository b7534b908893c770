//! Free-fly and follow camera controllers (C10).
//!
//! Plain-field controller structs with public tunables, damped internal
//! state, and an `update(.., dt)` method: free-fly (critically damped
//! acceleration towards an input direction) and follow (exponential-
//! lerped chase position). Device polling and screen-space mouse deltas
//! are an external collaborator's job, so both controllers take
//! already-resolved direction/delta vectors rather than an `Input`
//! struct.

use glam::{Quat, Vec2, Vec3};

use crate::frustum::{perspective_matrix, Frustum};

/// WASD-plus-mouse-look camera with critically damped acceleration
/// towards the requested move direction.
pub struct FreeFlyCamera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,

    pub look_speed: f32,
    pub max_speed: f32,
    /// Rate constant of the exponential approach to the target velocity;
    /// higher is snappier, lower is floatier.
    pub acceleration: f32,

    velocity: Vec3,
}

impl FreeFlyCamera {
    #[must_use]
    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        Self {
            position,
            yaw,
            pitch,
            look_speed: 0.003,
            max_speed: 20.0,
            acceleration: 8.0,
            velocity: Vec3::ZERO,
        }
    }

    #[must_use]
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(glam::EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.rotation() * -Vec3::Z
    }

    /// Advances the controller. `move_input` is a local-space desired
    /// direction (need not be normalized; zero means decelerate to
    /// rest); `look_delta` is a screen-space mouse delta; `speed_scale`
    /// lets the caller apply a wheel-adjusted speed multiplier.
    pub fn update(&mut self, move_input: Vec3, look_delta: Vec2, speed_scale: f32, dt: f32) {
        const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_2 - 0.001;

        self.yaw -= look_delta.x * self.look_speed;
        self.pitch = (self.pitch - look_delta.y * self.look_speed).clamp(-PITCH_LIMIT, PITCH_LIMIT);

        let rotation = self.rotation();
        let world_dir = if move_input.length_squared() > 0.0 {
            (rotation * move_input.normalize()).normalize()
        } else {
            Vec3::ZERO
        };
        let target_velocity = world_dir * self.max_speed * speed_scale;

        let lerp = 1.0 - (-self.acceleration * dt).exp();
        self.velocity += (target_velocity - self.velocity) * lerp;
        self.position += self.velocity * dt;
    }

    #[must_use]
    pub fn view_matrix(&self) -> glam::Mat4 {
        glam::Mat4::look_to_rh(self.position, self.forward(), Vec3::Y)
    }

    #[must_use]
    pub fn view_projection(&self, aspect: f32, fov_y: f32, near: f32, far: f32, reverse_z: bool) -> glam::Mat4 {
        perspective_matrix(fov_y, aspect, near, far, reverse_z) * self.view_matrix()
    }

    #[must_use]
    pub fn frustum(&self, aspect: f32, fov_y: f32, near: f32, far: f32, reverse_z: bool) -> Frustum {
        Frustum::from_view_projection(self.view_projection(aspect, fov_y, near, far, reverse_z))
    }
}

/// Chases a target position with an exponential lerp, holding a fixed
/// local-space offset behind/above it.
pub struct FollowCamera {
    pub offset: Vec3,
    pub look_offset: Vec3,
    pub lerp_rate: f32,
    position: Vec3,
}

impl FollowCamera {
    #[must_use]
    pub fn new(initial_target: Vec3, offset: Vec3) -> Self {
        Self { offset, look_offset: Vec3::ZERO, lerp_rate: 6.0, position: initial_target + offset }
    }

    pub fn update(&mut self, target_position: Vec3, target_rotation: Quat, dt: f32) {
        let desired = target_position + target_rotation * self.offset;
        let t = 1.0 - (-self.lerp_rate * dt).exp();
        self.position += (desired - self.position) * t;
    }

    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[must_use]
    pub fn view_matrix(&self, target_position: Vec3) -> glam::Mat4 {
        glam::Mat4::look_at_rh(self.position, target_position + self.look_offset, Vec3::Y)
    }

    #[must_use]
    pub fn view_projection(
        &self,
        target_position: Vec3,
        aspect: f32,
        fov_y: f32,
        near: f32,
        far: f32,
        reverse_z: bool,
    ) -> glam::Mat4 {
        perspective_matrix(fov_y, aspect, near, far, reverse_z) * self.view_matrix(target_position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_fly_accelerates_towards_requested_direction() {
        let mut cam = FreeFlyCamera::new(Vec3::ZERO, 0.0, 0.0);
        for _ in 0..120 {
            cam.update(Vec3::new(0.0, 0.0, -1.0), Vec2::ZERO, 1.0, 1.0 / 60.0);
        }
        assert!(cam.position.z < -1.0, "camera should have moved forward: {:?}", cam.position);
    }

    #[test]
    fn follow_camera_converges_on_the_target_offset() {
        let mut cam = FollowCamera::new(Vec3::ZERO, Vec3::new(0.0, 2.0, 5.0));
        let target = Vec3::new(10.0, 0.0, 0.0);
        for _ in 0..300 {
            cam.update(target, Quat::IDENTITY, 1.0 / 60.0);
        }
        let expected = target + Vec3::new(0.0, 2.0, 5.0);
        assert!((cam.position() - expected).length() < 0.01);
    }
}
