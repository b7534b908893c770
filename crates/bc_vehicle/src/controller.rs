//! Vehicle AI/physics controller.
//!
//! Grounded on `box_city_car_control.cpp`: `NeedsUpdate`'s two overloads,
//! `UpdatePlayerControl`, `SetupCarTarget`, `UpdateAIControl`,
//! `CalculateControlForces`, `CalculateCollisionForces` and
//! `IntegrateCar`. Building geometry comes back from
//! `bc_tiles::TileManager::visit_buildings` directly as an `Obb` rather
//! than requiring a second ECS lookup by `InstanceRef`.

use glam::{Mat3, Quat, Vec3};
use rand::Rng;

use bc_spatial::{closest_point_on_segment, closest_points_between_segments, collision_features_obb_vs_obb, Aabb, Obb};
use bc_tiles::TileManager;

use crate::components::{Car, CarBuildingsCache, CarControl, CarMovement, CarSettings, CarTarget};
use crate::input::PlayerInput;
use crate::tuning::{CarTuning, AVOIDANCE_CACHE_REBUILD_RATE};

/// `instance_index / 8` staggers neighboring entities onto different
/// frames so per-frame workload stays smooth instead of updating every
/// entity of a timeslice group on the same tick.
#[must_use]
fn needs_update(instance_index: u32, frame_index: u32, frame_rate: u32) -> bool {
    (frame_index + instance_index / 8) % frame_rate == 0
}

/// Frame rate scaled by how far `factor` sits inside `[min_range,
/// max_range]`: close up, update every frame; at `max_range` and beyond,
/// update only one frame in `max_frame_rate`.
#[must_use]
fn needs_update_scaled(instance_index: u32, frame_index: u32, max_frame_rate: u32, min_range: f32, max_range: f32, factor: f32) -> bool {
    let t = ((factor - min_range) / (max_range - min_range)).clamp(0.0, 1.0);
    let frame_rate = (t * max_frame_rate as f32).ceil() as u32;
    let frame_rate = frame_rate.clamp(1, max_frame_rate);
    needs_update(instance_index, frame_index, frame_rate)
}

/// Applies mouse/keyboard input to a car's control targets with
/// absorber decay pulling them back to zero when idle.
pub fn update_player_control(input: &PlayerInput, car_control: &mut CarControl, elapsed_time: f32, tuning: &CarTuning) {
    if car_control.y_target > 0.0 {
        car_control.y_target = (car_control.y_target - tuning.y_absorber * elapsed_time).max(0.0);
    } else {
        car_control.y_target = (car_control.y_target + tuning.y_absorber * elapsed_time).min(0.0);
    }
    let mut pitch_offset = input.mouse_delta_y * tuning.y_mouse_factor;
    pitch_offset += if input.key_q { tuning.y_keyboard_factor } else { 0.0 };
    pitch_offset -= if input.key_e { tuning.y_keyboard_factor } else { 0.0 };
    car_control.y_target += pitch_offset * if tuning.inverse_y { -1.0 } else { 1.0 } * elapsed_time;
    car_control.y_target = car_control.y_target.clamp(-tuning.y_range, tuning.y_range);

    if car_control.x_target > 0.0 {
        car_control.x_target = (car_control.x_target - tuning.x_absorber * elapsed_time).max(0.0);
    } else {
        car_control.x_target = (car_control.x_target + tuning.x_absorber * elapsed_time).min(0.0);
    }
    let mut roll_offset = input.mouse_delta_x * tuning.x_mouse_factor;
    roll_offset += if input.key_d { tuning.x_keyboard_factor } else { 0.0 };
    roll_offset -= if input.key_a { tuning.x_keyboard_factor } else { 0.0 };
    car_control.x_target += roll_offset * elapsed_time;
    car_control.x_target = car_control.x_target.clamp(-tuning.x_range, tuning.x_range);

    let mut forward_offset = tuning.forward_mouse_factor * input.wheel_delta;
    forward_offset += if input.key_w { tuning.forward_keyboard_factor } else { 0.0 };
    forward_offset -= if input.key_s { tuning.forward_keyboard_factor } else { 0.0 };
    car_control.forward = (car_control.forward + forward_offset * elapsed_time).clamp(0.0, 1.0);
}

/// Picks a new target from the tile manager's traffic-target grid.
/// `reset` anchors the outgoing blend segment at the car's current
/// position instead of its previous target (used the first time a car
/// gets a target at all).
pub fn setup_car_target(rng: &mut impl Rng, tile_manager: &TileManager, car: &Car, car_target: &mut CarTarget, reset: bool) {
    let last_target = if reset { car.position } else { car_target.target };
    match tile_manager.next_traffic_target(rng, car.position) {
        Some(target) => {
            car_target.target = target;
            car_target.target_valid = true;
            car_target.last_target = last_target;
        }
        None => car_target.target_valid = false,
    }
}

fn insert_cached_building(cache: &mut CarBuildingsCache, distances: &mut [f32; crate::components::NUM_CACHED_BUILDINGS], position: Vec3, extent: Vec3, size: f32, distance: f32) {
    for i in 0..distances.len() {
        if distance < distances[i] {
            for j in (i..distances.len() - 1).rev() {
                cache.buildings[j + 1] = cache.buildings[j];
                distances[j + 1] = distances[j];
            }
            cache.buildings[i] = crate::components::CachedBuilding { position, extent, size };
            distances[i] = distance;
            break;
        }
    }
}

/// Per-frame AI step: building avoidance, target steering, and the
/// resulting `(X, Y, forward)` control targets. A no-op on frames this
/// instance isn't timesliced to run on.
#[allow(clippy::too_many_arguments)]
pub fn update_ai_control(
    rng: &mut impl Rng,
    instance_index: u32,
    car_control: &mut CarControl,
    car: &Car,
    car_movement: &CarMovement,
    car_settings: &CarSettings,
    car_target: &mut CarTarget,
    car_buildings_cache: &mut CarBuildingsCache,
    frame_index: u32,
    elapsed_time: f32,
    tile_manager: &TileManager,
    camera_pos: Vec3,
    tuning: &CarTuning,
) {
    use crate::tuning::{AI_TIMESLICE_MAX_RANGE, AI_TIMESLICE_MAX_RATE, AI_TIMESLICE_MIN_RANGE};

    let car_position = car.position;
    let camera_distance2 = camera_pos.distance_squared(car_position);

    if !needs_update_scaled(instance_index, frame_index, AI_TIMESLICE_MAX_RATE, AI_TIMESLICE_MIN_RANGE, AI_TIMESLICE_MAX_RANGE, camera_distance2.sqrt()) {
        return;
    }

    let car_matrix = Mat3::from_quat(car.rotation);
    let car_left = car_matrix.row(0);
    let car_front = car_matrix.row(1);
    let car_left_flat = Vec3::new(car_left.x, car_left.y, 0.0).normalize_or_zero();
    let car_radius = car_settings.radius();

    car_control.forward = tuning.ai_forward;

    let mut avoidance_target_x = 0.0_f32;
    let mut avoidance_target_y = 0.0_f32;
    let mut avoidance_factor = 0.0_f32;

    if tuning.avoidance_enable && camera_distance2 < tuning.ai_avoidance_calculation_distance * tuning.ai_avoidance_calculation_distance {
        let car_direction = car_movement.lineal_velocity.normalize_or_zero();

        if needs_update(instance_index, frame_index, AVOIDANCE_CACHE_REBUILD_RATE) {
            let mut frustum = Aabb::EMPTY;
            frustum.add(Aabb::new(car_position - car_direction * tuning.ai_visibility_distance * 0.05, car_position - car_direction * tuning.ai_visibility_distance * 0.05));
            let up = Vec3::new(0.0, 0.0, 1.0);
            for (z_sign, left_sign) in [(1.0, 1.0), (1.0, -1.0), (-1.0, 1.0), (-1.0, -1.0)] {
                let point = car_position + up * (z_sign * tuning.ai_visibility_side_distance) + car_left_flat * (left_sign * tuning.ai_visibility_side_distance)
                    + car_direction * tuning.ai_visibility_distance;
                frustum.add(Aabb::new(point, point));
            }

            for building in &mut car_buildings_cache.buildings {
                building.size = 0.0;
            }
            let mut distances = [f32::MAX; crate::components::NUM_CACHED_BUILDINGS];

            tile_manager.visit_buildings(&frustum, |_instance, obb| {
                let extent = obb.rotation.row(2) * obb.extents.z;
                let building_bottom = obb.position - extent;
                let building_top = obb.position + extent;
                let closest_point = closest_point_on_segment(car_position, building_bottom, building_top);
                let distance = car_position.distance_squared(closest_point);
                let size = Vec3::new(obb.extents.x, obb.extents.y, 0.0).length();
                insert_cached_building(car_buildings_cache, &mut distances, obb.position, extent, size, distance);
            });
        }

        for building in &car_buildings_cache.buildings {
            if building.size <= 0.0 {
                continue;
            }
            let building_bottom = building.position - building.extent;
            let building_top = building.position + building.extent;

            let (car_point, box_point, car_t, _box_t) =
                closest_points_between_segments(car_position, car_position + car_direction * tuning.ai_visibility_distance, building_bottom, building_top);

            let expansion = car_t * tuning.ai_avoidance_distance_expansion;
            let threshold = building.size + expansion + tuning.ai_avoidance_extra_distance + car_radius;
            if car_point.distance_squared(box_point) < threshold * threshold {
                let car_avoid_direction = (box_point - car_position).normalize_or_zero();

                let mut xx = car_avoid_direction.dot(car_left_flat);
                xx = (xx.signum() - xx) * tuning.ai_avoidance_reaction_factor;
                xx = xx.signum() * xx.abs().powf(tuning.ai_avoidance_reaction_power);
                avoidance_target_x += xx;

                let mut yy = car_avoid_direction.z;
                yy = (yy.signum() - yy) * tuning.ai_avoidance_reaction_factor;
                yy = yy.signum() * yy.abs().powf(tuning.ai_avoidance_reaction_power);
                avoidance_target_y += yy;

                car_control.forward -= tuning.ai_avoidance_slow_factor * (1.0 - car_t);
                avoidance_factor = avoidance_factor.max(1.0 - car_t);
            }
        }
    }

    let mut target_x = avoidance_target_x;
    let mut target_y = avoidance_target_y;

    let target_distance2 = car_position.distance_squared(car_target.target);
    if target_distance2 < tuning.ai_min_target_distance * tuning.ai_min_target_distance || !car_target.target_valid {
        setup_car_target(rng, tile_manager, car, car_target, false);
    }

    if tuning.targeting_enable && car_target.target_valid {
        let avoidance_adjusted = (1.0 - avoidance_factor).max(0.0).sqrt();

        let car_in_target_line = closest_point_on_segment(car_position, car_target.last_target, car_target.target);
        let car_target_direction = car_target.target.lerp(car_in_target_line, 0.85) - car_position;
        let car_target_direction = car_target_direction.normalize_or_zero();

        if car_front.dot(car_target_direction) < 0.0 {
            target_x += if car_target_direction.dot(car_left_flat) > 0.0 { -1.0 } else { 1.0 } * avoidance_adjusted;
            car_control.forward -= tuning.ai_close_target_distance_slow;
        } else {
            target_x += -car_target_direction.dot(car_left_flat);
            car_control.forward -= tuning.ai_close_target_distance_slow * car_target_direction.dot(car_left_flat).abs();
        }
        target_y += -car_target_direction.z * avoidance_adjusted;

        if target_distance2 < tuning.ai_close_target_distance * tuning.ai_close_target_distance {
            let t = (target_distance2 / (tuning.ai_close_target_distance * tuning.ai_close_target_distance)).clamp(0.0, 1.0);
            car_control.forward -= tuning.ai_close_target_distance_slow * (1.0 - t);
        }
    }
    car_control.forward = car_control.forward.max(tuning.ai_min_forward);

    car_control.x_target = target_x.clamp(-tuning.x_range, tuning.x_range);
    car_control.y_target = target_y.clamp(-tuning.y_range, tuning.y_range);
    car_control.forward = car_control.forward.clamp(0.0, 1.0);
}

/// Converts the current control targets into linear/angular forces for
/// this frame: pitch and roll torques toward the targets, forward thrust
/// with soft altitude walls, and velocity damping.
#[must_use]
pub fn calculate_control_forces(car: &Car, car_movement: &CarMovement, car_settings: &CarSettings, car_control: &CarControl, elapsed_time: f32, tuning: &CarTuning) -> (Vec3, Vec3) {
    let car_matrix = Mat3::from_quat(car.rotation);
    let car_left = car_matrix.row(0);
    let car_front = car_matrix.row(1);
    let car_up = car_matrix.row(2);
    let up_vector = Vec3::new(0.0, 0.0, 1.0);
    let car_left_flat = Vec3::new(car_left.x, car_left.y, 0.0).normalize_or_zero();

    let mut linear = Vec3::ZERO;
    let mut angular = Vec3::ZERO;

    {
        let target = car_control.y_target * std::f32::consts::FRAC_PI_2;
        let diff_angle = target - (car_front.angle_between(up_vector) - std::f32::consts::FRAC_PI_2);
        angular += car_left_flat * diff_angle * tuning.y_pitch_force;
        linear += car_up * tuning.y_pitch_linear_force * car_control.y_target;
    }
    {
        let target = car_control.x_target * std::f32::consts::FRAC_PI_2;
        let diff_angle = target - (car_left.angle_between(-up_vector) - std::f32::consts::FRAC_PI_2);
        angular += car_front * diff_angle * tuning.x_roll_angular_force;
        angular -= up_vector * tuning.x_jaw_angular_force * car_control.x_target;
        linear += car_left_flat * tuning.x_linear_force * car_control.x_target;
    }
    {
        let mut forward_force = car_control.forward * tuning.forward_force * car_front;

        let distance_top = car.position.z - tuning.tile_height_top;
        if distance_top > 0.0 {
            forward_force.z -= distance_top * tuning.forward_kill_height_force;
        }
        let distance_bottom = car.position.z - tuning.tile_height_bottom;
        if distance_bottom < 0.0 {
            forward_force.z -= distance_bottom * tuning.forward_kill_height_force;
        }
        linear += forward_force;
    }
    {
        linear -= car_movement.lineal_velocity * (tuning.friction_linear_force * elapsed_time).clamp(0.0, 1.0) / elapsed_time;
        angular -= car_movement.rotation_velocity * (tuning.friction_angular_force * elapsed_time).clamp(0.0, 1.0) / elapsed_time;
    }

    (linear, angular)
}

/// Position-only push-out from overlapping any visited building's OBB.
/// No impulse is applied, matching the source (its linear-force term is
/// dead code there too).
#[must_use]
pub fn calculate_collision_forces(tile_manager: &TileManager, camera_pos: Vec3, query_aabb: &Aabb, car_obb: &Obb, tuning: &CarTuning) -> Vec3 {
    let mut position_offset = Vec3::ZERO;
    if tuning.collision_enable && car_obb.position.distance_squared(camera_pos) < tuning.ai_avoidance_calculation_distance * tuning.ai_avoidance_calculation_distance {
        tile_manager.visit_buildings(query_aabb, |_instance, building_obb| {
            if let Some(result) = collision_features_obb_vs_obb(car_obb, &building_obb) {
                position_offset -= result.normal * result.depth;
            }
        });
    }
    position_offset
}

/// Semi-implicit Euler step: integrates velocities from forces, then
/// position and rotation from velocities, applying `position_offset` as
/// an un-integrated correction (collision push-out).
pub fn integrate_car(car: &mut Car, car_movement: &mut CarMovement, car_settings: &CarSettings, linear_forces: Vec3, angular_forces: Vec3, position_offset: Vec3, elapsed_time: f32) {
    car_movement.lineal_velocity += linear_forces * car_settings.inv_mass * elapsed_time;

    let car_matrix = Mat3::from_quat(car.rotation);
    let inv_inertia = car_settings.inv_mass_inertia;
    let inertia_matrix = Mat3::from_cols(Vec3::new(inv_inertia.x, 0.0, 0.0), Vec3::new(0.0, inv_inertia.y, 0.0), Vec3::new(0.0, 0.0, inv_inertia.z));
    let world_inv_mass_inertia = car_matrix * inertia_matrix * car_matrix.inverse();
    car_movement.rotation_velocity += world_inv_mass_inertia * (angular_forces * elapsed_time);

    car.position += car_movement.lineal_velocity * elapsed_time + position_offset;

    let rotation_angle = (car_movement.rotation_velocity * elapsed_time).length();
    if rotation_angle > 0.000_001 {
        let axis = car_movement.rotation_velocity / rotation_angle;
        car.rotation = (car.rotation * Quat::from_axis_angle(axis, rotation_angle)).normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn needs_update_fires_once_per_frame_rate_cycle() {
        assert!(needs_update(0, 0, 4));
        assert!(!needs_update(0, 1, 4));
        assert!(!needs_update(0, 2, 4));
        assert!(needs_update(0, 4, 4));
    }

    #[test]
    fn needs_update_scaled_updates_every_frame_when_close() {
        assert!(needs_update_scaled(0, 0, 8, 500.0, 3000.0, 0.0));
        assert!(needs_update_scaled(0, 1, 8, 500.0, 3000.0, 0.0));
    }

    #[test]
    fn needs_update_scaled_throttles_when_far() {
        let far_factor = 10_000.0;
        let updates: usize = (0..8).filter(|&f| needs_update_scaled(0, f, 8, 500.0, 3000.0, far_factor)).count();
        assert_eq!(updates, 1);
    }

    #[test]
    fn player_control_clamps_targets_to_their_ranges() {
        let tuning = CarTuning::default();
        let mut control = CarControl::default();
        let input = PlayerInput { mouse_delta_y: 1000.0, ..Default::default() };
        for _ in 0..240 {
            update_player_control(&input, &mut control, 1.0 / 60.0, &tuning);
        }
        assert!(control.y_target <= tuning.y_range + 1e-4);
    }

    #[test]
    fn absorber_relaxes_targets_back_to_zero_without_input() {
        let tuning = CarTuning::default();
        let mut control = CarControl { y_target: 0.5, x_target: -0.3, forward: 0.0 };
        let input = PlayerInput::default();
        for _ in 0..600 {
            update_player_control(&input, &mut control, 1.0 / 60.0, &tuning);
        }
        assert!(control.y_target.abs() < 1e-3);
        assert!(control.x_target.abs() < 1e-3);
    }

    #[test]
    fn integrate_car_advances_position_along_forward_force() {
        let mut car = Car::default();
        let mut movement = CarMovement::default();
        let settings = CarSettings::new(2.0, 1000.0, Vec3::splat(1000.0), 0);
        integrate_car(&mut car, &mut movement, &settings, Vec3::new(0.0, 1000.0, 0.0), Vec3::ZERO, Vec3::ZERO, 1.0 / 60.0);
        assert!(car.position.y > 0.0);
    }

    #[test]
    fn insert_cached_building_keeps_the_nearest_four_sorted() {
        let mut cache = CarBuildingsCache::default();
        let mut distances = [f32::MAX; crate::components::NUM_CACHED_BUILDINGS];
        for (i, d) in [50.0_f32, 10.0, 30.0, 5.0, 1.0].into_iter().enumerate() {
            insert_cached_building(&mut cache, &mut distances, Vec3::splat(i as f32), Vec3::ONE, 1.0, d);
        }
        assert_eq!(distances, [1.0, 5.0, 10.0, 30.0]);
    }
}
