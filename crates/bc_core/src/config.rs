//! Simulation configuration.
//!
//! There is no CLI or environment-variable surface for the simulation
//! itself, but a host process still needs to parametrize ring sizes,
//! tick rate and feature toggles. `SimConfig::default()` reproduces
//! every constant named by the source; a host overrides fields by
//! deserializing JSON over the default.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// `K` in the building-tile ring. Must be odd.
    pub tile_ring_k: u32,
    /// World-space side length of one tile (`TILE_SIZE`).
    pub tile_size: f32,
    /// `K` in the independent vehicle-tile ring.
    pub vehicle_tile_ring_k: u32,
    /// Vehicles per active traffic tile (`kNumCars` in the source).
    pub cars_per_tile: u32,
    /// Upper bound on render items buffered per frame.
    pub max_render_items: u32,
    /// Deferred-free ring depth for GPU-visible handle pools.
    pub graphic_pool_deferred_frames: u32,
    /// Gates the `CalculateCollisionForces` path. Off by default,
    /// matching the source's control variable default.
    pub collisions_enabled: bool,
    /// Distance from the camera below which a tile streams in at LOD 0
    /// (full detail, buildings included in the avoidance BVH).
    pub lod_near_distance: f32,
    /// Distance from the camera beyond which a tile drops to LOD 2
    /// (top-building silhouettes only). Tiles between
    /// `lod_near_distance` and this fall back to LOD 1.
    pub lod_far_distance: f32,
    /// Vertical field of view, in radians, of the frustum used to gate
    /// which ring tiles get LOD-updated.
    pub camera_fov_y_radians: f32,
    /// Width-over-height ratio for the same frustum. A host with a real
    /// window overrides this with its live swapchain aspect.
    pub camera_aspect: f32,
    pub camera_near: f32,
    pub camera_far: f32,
    /// Whether the frustum (and any depth buffer it implies) uses a
    /// reversed `[1, 0]` depth range for better far-plane precision.
    pub camera_reverse_z: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tile_ring_k: 5,
            tile_size: 1000.0,
            vehicle_tile_ring_k: 5,
            cars_per_tile: 2000,
            max_render_items: 65536,
            graphic_pool_deferred_frames: 3,
            collisions_enabled: false,
            lod_near_distance: 400.0,
            lod_far_distance: 1500.0,
            camera_fov_y_radians: std::f32::consts::FRAC_PI_3,
            camera_aspect: 16.0 / 9.0,
            camera_near: 1.0,
            camera_far: 5000.0,
            camera_reverse_z: true,
        }
    }
}

impl SimConfig {
    /// Loads a config by overlaying JSON fields onto [`SimConfig::default`].
    pub fn from_json(reader: impl std::io::Read) -> serde_json::Result<Self> {
        serde_json::from_reader(reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_spec_constants() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.tile_ring_k, 5);
        assert_eq!(cfg.tile_size, 1000.0);
        assert_eq!(cfg.cars_per_tile, 2000);
        assert!(!cfg.collisions_enabled);
    }

    #[test]
    fn partial_json_overlay_keeps_other_defaults() {
        let json = r#"{"tile_size": 500.0}"#;
        let cfg = SimConfig::from_json(json.as_bytes()).unwrap();
        assert_eq!(cfg.tile_size, 500.0);
        assert_eq!(cfg.tile_ring_k, 5);
    }
}
