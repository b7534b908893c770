//! Per-vehicle components.
//!
//! Grounded on `box_city_components.h`'s `Car`/`CarMovement`/
//! `CarSettings`/`CarTarget`/`CarControl`/`CarBuildingsCache`. The
//! source's `platform::Interpolated<T>` wrapper around position/rotation
//! buffers two frames for render-thread smoothing; that's a render-side
//! concern and is left to whatever consumes these components for
//! display, so `Car` holds plain current values here.

use glam::{Quat, Vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Car {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for Car {
    fn default() -> Self {
        Self { position: Vec3::ZERO, rotation: Quat::IDENTITY }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CarMovement {
    pub lineal_velocity: Vec3,
    pub rotation_velocity: Vec3,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CarSettings {
    pub size: f32,
    pub inv_mass: f32,
    pub inv_mass_inertia: Vec3,
    pub car_type: u32,
}

impl CarSettings {
    #[must_use]
    pub fn new(size: f32, mass: f32, mass_inertia: Vec3, car_type: u32) -> Self {
        Self { size, inv_mass: 1.0 / mass, inv_mass_inertia: 1.0 / mass_inertia, car_type }
    }

    #[must_use]
    pub fn radius(&self) -> f32 {
        self.size.abs()
    }
}

impl Default for CarSettings {
    fn default() -> Self {
        Self::new(1.0, 1000.0, Vec3::splat(1000.0), 0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CarControl {
    pub y_target: f32,
    pub x_target: f32,
    pub forward: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CarTarget {
    pub target: Vec3,
    pub last_target: Vec3,
    pub target_valid: bool,
}

impl CarTarget {
    #[must_use]
    pub fn new(target: Vec3) -> Self {
        Self { target, last_target: target, target_valid: true }
    }
}

impl Default for CarTarget {
    fn default() -> Self {
        Self { target: Vec3::ZERO, last_target: Vec3::ZERO, target_valid: false }
    }
}

/// One building cached by distance for the current avoidance pass.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CachedBuilding {
    pub position: Vec3,
    pub extent: Vec3,
    /// Zero means the slot holds no building (cleared every rebuild).
    pub size: f32,
}

pub const NUM_CACHED_BUILDINGS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CarBuildingsCache {
    pub buildings: [CachedBuilding; NUM_CACHED_BUILDINGS],
}

impl Default for CarBuildingsCache {
    fn default() -> Self {
        Self { buildings: [CachedBuilding::default(); NUM_CACHED_BUILDINGS] }
    }
}

/// The GPU-visible mirror of a car's render-relevant state, written into
/// the traffic manager's shared car data array at `car_data_offset`.
/// 16-byte aligned to match the static slab's copy-queue granularity.
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct GpuCarInstance {
    pub position: Vec3,
    pub _pad0: f32,
    pub rotation: Quat,
    pub car_type: u32,
    pub _pad1: [u32; 3],
}

impl GpuCarInstance {
    #[must_use]
    pub fn from_car(car: &Car, settings: &CarSettings) -> Self {
        Self { position: car.position, _pad0: 0.0, rotation: car.rotation, car_type: settings.car_type, _pad1: [0; 3] }
    }
}
