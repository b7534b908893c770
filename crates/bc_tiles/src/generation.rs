//! Deterministic per-tile building generation.
//!
//! Grounded on `box_city_tile.cpp`'s `Tile::BuildTileData` and
//! `box_city_descriptors.h`'s `ZoneDescriptor`
//! table (length/angle/size/animation ranges, `static_range`). The
//! bodies of `Manager::GetZoneDescriptorIndex`/`GetBuildingArchetype`
//! are not present in the retrieved source subset — `classify_position`
//! below is a documented, fully deterministic stand-in satisfying the
//! same contract ("corridor lookup keyed on position" -> reject,
//! otherwise pick a descriptor and a matching archetype), built from a
//! macro-cell grid over the tile rather than a content-authored lookup
//! table.

use glam::{Mat3, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use bc_spatial::Obb;

use crate::boxes::AnimationBox;

#[derive(Clone, Copy, Debug)]
pub struct ZoneDescriptor {
    pub length_range: (f32, f32),
    pub angle_inc_range: (f32, f32),
    pub size_range: (f32, f32),
    pub animation_distance_range: (f32, f32),
    pub animation_frequency_range: (f32, f32),
    pub animation_offset_range: (f32, f32),
    pub static_range: f32,
}

/// Mirrors `kZoneDescriptors`' length/angle/size/animation columns (the
/// panel-specific columns have no consumer yet and are dropped).
pub const ZONE_DESCRIPTORS: [ZoneDescriptor; 6] = [
    ZoneDescriptor {
        length_range: (50.0, 150.0),
        angle_inc_range: (-0.314, 0.314),
        size_range: (20.0, 30.0),
        animation_distance_range: (0.0, 50.0),
        animation_frequency_range: (0.3, 1.0),
        animation_offset_range: (0.0, 40.0),
        static_range: 10.0,
    },
    ZoneDescriptor {
        length_range: (100.0, 250.0),
        angle_inc_range: (-0.628, 0.628),
        size_range: (15.0, 25.0),
        animation_distance_range: (0.0, 60.0),
        animation_frequency_range: (0.3, 2.0),
        animation_offset_range: (0.0, 30.0),
        static_range: 5.0,
    },
    ZoneDescriptor {
        length_range: (30.0, 50.0),
        angle_inc_range: (-1.099, 1.099),
        size_range: (20.0, 30.0),
        animation_distance_range: (0.0, 20.0),
        animation_frequency_range: (0.3, 0.5),
        animation_offset_range: (0.0, 20.0),
        static_range: 5.0,
    },
    ZoneDescriptor {
        length_range: (40.0, 60.0),
        angle_inc_range: (-0.314, 0.314),
        size_range: (20.0, 60.0),
        animation_distance_range: (0.0, 70.0),
        animation_frequency_range: (0.6, 2.0),
        animation_offset_range: (0.0, 10.0),
        static_range: 1.0,
    },
    ZoneDescriptor {
        length_range: (200.0, 350.0),
        angle_inc_range: (-0.157, 0.157),
        size_range: (20.0, 40.0),
        animation_distance_range: (0.0, 50.0),
        animation_frequency_range: (0.1, 0.5),
        animation_offset_range: (0.0, 10.0),
        static_range: 2.0,
    },
    ZoneDescriptor {
        length_range: (50.0, 250.0),
        angle_inc_range: (-0.785, 0.785),
        size_range: (20.0, 70.0),
        animation_distance_range: (0.0, 250.0),
        animation_frequency_range: (0.05, 1.0),
        animation_offset_range: (0.0, 10.0),
        static_range: 10.0,
    },
];

const MACRO_CELLS_PER_TILE: u32 = 4;
const CORRIDOR_WIDTH_RATIO: f32 = 0.06;

/// Deterministic corridor / zone-descriptor classification keyed purely
/// on world position: the tile is divided into a `4x4` macro-cell grid;
/// a band `CORRIDOR_WIDTH_RATIO` of each cell's width around every edge
/// is a corridor (kept clear for traffic), the rest belongs to whichever
/// descriptor the cell hashes to. Returns `None` inside a corridor.
#[must_use]
pub fn classify_position(tile_origin_xy: (f32, f32), tile_size: f32, position: Vec3) -> Option<usize> {
    let cell_size = tile_size / MACRO_CELLS_PER_TILE as f32;
    let local_x = position.x - tile_origin_xy.0;
    let local_y = position.y - tile_origin_xy.1;

    let max_cell = (MACRO_CELLS_PER_TILE - 1) as f32;
    let cx = (local_x / cell_size).floor().clamp(0.0, max_cell);
    let cy = (local_y / cell_size).floor().clamp(0.0, max_cell);

    let within_x = local_x - cx * cell_size;
    let within_y = local_y - cy * cell_size;
    let band = cell_size * CORRIDOR_WIDTH_RATIO;
    if within_x < band || within_x > cell_size - band || within_y < band || within_y > cell_size - band {
        return None;
    }

    let descriptor_index = ((cx as u32) * 7 + (cy as u32) * 13) as usize % ZONE_DESCRIPTORS.len();
    Some(descriptor_index)
}

pub struct GeneratedBuilding {
    pub obb: Obb,
    pub animation: AnimationBox,
    pub dynamic: bool,
}

/// Samples one candidate building at `position` for the zone descriptor
/// at `descriptor_index`, mirroring `Tile::BuildTileData`'s per-box
/// sampling (extents, rotation, animation range, static/dynamic split).
#[must_use]
pub fn sample_building(rng: &mut StdRng, descriptor_index: usize, position: Vec3) -> GeneratedBuilding {
    let descriptor = &ZONE_DESCRIPTORS[descriptor_index];

    let size = rng.random_range(descriptor.size_range.0..descriptor.size_range.1);
    let height = rng.random_range(descriptor.length_range.0..descriptor.length_range.1);
    let extents = Vec3::new(size, size, height * 0.5);

    let angle_inc = rng.random_range(descriptor.angle_inc_range.0..descriptor.angle_inc_range.1);
    let angle_rotation = rng.random_range(0.0..std::f32::consts::TAU);
    let rotation = Mat3::from_rotation_z(angle_rotation) * Mat3::from_rotation_x(angle_inc);

    let animation = AnimationBox {
        original_position: position,
        range: rng.random_range(descriptor.animation_distance_range.0..descriptor.animation_distance_range.1),
        offset: rng.random_range(descriptor.animation_offset_range.0..descriptor.animation_offset_range.1),
        frequency: rng.random_range(descriptor.animation_frequency_range.0..descriptor.animation_frequency_range.1),
    };
    let dynamic = animation.range >= descriptor.static_range;

    GeneratedBuilding { obb: Obb::new(position, rotation, extents), animation, dynamic }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_of_a_macro_cell_is_never_a_corridor() {
        let cell_size = 1000.0 / MACRO_CELLS_PER_TILE as f32;
        let position = Vec3::new(cell_size * 0.5, cell_size * 0.5, 0.0);
        assert!(classify_position((0.0, 0.0), 1000.0, position).is_some());
    }

    #[test]
    fn cell_boundary_is_a_corridor() {
        let position = Vec3::new(0.0, 0.0, 0.0);
        assert!(classify_position((0.0, 0.0), 1000.0, position).is_none());
    }

    #[test]
    fn sampling_is_deterministic_for_the_same_rng_state() {
        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);
        let a = sample_building(&mut rng_a, 0, Vec3::ZERO);
        let b = sample_building(&mut rng_b, 0, Vec3::ZERO);
        assert_eq!(a.obb.extents, b.obb.extents);
        assert_eq!(a.dynamic, b.dynamic);
    }
}
