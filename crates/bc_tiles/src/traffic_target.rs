//! Per-tile traffic target grid.
//!
//! Grounded on `box_city_tile.cpp`'s `FillTargetPositions`/
//! `Tile::BuildTileData`: a `2x2x4` grid of 16
//! targets per tile, each carrying six neighbor links (up/down/
//! left/right/far/near) resolved by reaching into the *independently
//! recomputable* target grid of whichever tile the neighbor falls in —
//! a tile never needs its neighbor loaded to link to it.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

use crate::tile::{WorldTilePosition, TILE_Z_MAX, TILE_Z_MIN};

pub const TARGETS_PER_TILE: usize = 16;
const GRID_X: u32 = 2;
const GRID_Y: u32 = 2;
const GRID_Z: u32 = 4;

#[derive(Clone, Copy, Debug)]
pub struct TrafficTarget {
    pub position: Vec3,
    /// Up, down, left, right, far, near, in that order.
    pub next_position: [Vec3; 6],
}

fn tile_seed(world_tile: WorldTilePosition) -> u64 {
    let i = 100_000i64 + i64::from(world_tile.i);
    let j = 100_000i64 + i64::from(world_tile.j);
    (i + j * 1000) as u64
}

/// Recomputes the 16 raw target positions for `world_tile` without
/// requiring the tile itself to be generated or loaded.
#[must_use]
pub fn fill_target_positions(world_tile: WorldTilePosition, tile_size: f32) -> [Vec3; TARGETS_PER_TILE] {
    let mut rng = StdRng::seed_from_u64(tile_seed(world_tile));
    let begin_x = world_tile.i as f32 * tile_size;
    let begin_y = world_tile.j as f32 * tile_size;

    let mut positions = [Vec3::ZERO; TARGETS_PER_TILE];
    for (j, slot) in positions.iter_mut().enumerate() {
        let x = (j as u32) % GRID_X;
        let y = ((j as u32) % (GRID_X * GRID_Y)) / GRID_X;
        let z = (j as u32) / (GRID_X * GRID_Y);

        let offset_x: f32 = rng.random_range(0.1..0.9);
        let offset_y: f32 = rng.random_range(0.1..0.9);
        let offset_z: f32 = rng.random_range(0.1..0.9);

        *slot = Vec3::new(
            begin_x + (x as f32 * 0.5 + offset_x * 0.5) * tile_size,
            begin_y + (y as f32 * 0.5 + offset_y * 0.5) * tile_size,
            TILE_Z_MIN + (TILE_Z_MAX - TILE_Z_MIN) * (z as f32 * 0.25 + offset_z * 0.25),
        );
    }
    positions
}

/// Builds the full traffic-target grid for `world_tile`, including every
/// target's six neighbor links, by recomputing whatever adjacent tiles'
/// grids the links fall into.
#[must_use]
pub fn build_traffic_targets(world_tile: WorldTilePosition, tile_size: f32) -> [TrafficTarget; TARGETS_PER_TILE] {
    let center = fill_target_positions(world_tile, tile_size);
    let north = fill_target_positions(WorldTilePosition { i: world_tile.i, j: world_tile.j + 1 }, tile_size);
    let south = fill_target_positions(WorldTilePosition { i: world_tile.i, j: world_tile.j - 1 }, tile_size);
    let east = fill_target_positions(WorldTilePosition { i: world_tile.i + 1, j: world_tile.j }, tile_size);
    let west = fill_target_positions(WorldTilePosition { i: world_tile.i - 1, j: world_tile.j }, tile_size);
    // Indexed the same way the source indexes its 3x3 neighbor array:
    // only the four axis-adjacent tiles are reachable from any in-tile
    // target (every link moves at most one tile over), so the four
    // diagonal neighbor slots are simply never read.
    let neighbors = |tile_i: u32, tile_j: u32| -> &[Vec3; TARGETS_PER_TILE] {
        match (tile_i, tile_j) {
            (1, 1) => &center,
            (1, 2) => &north,
            (1, 0) => &south,
            (2, 1) => &east,
            (0, 1) => &west,
            _ => unreachable!("traffic target links never cross more than one tile"),
        }
    };

    let mut targets = [TrafficTarget { position: Vec3::ZERO, next_position: [Vec3::ZERO; 6] }; TARGETS_PER_TILE];
    for (j, target) in targets.iter_mut().enumerate() {
        target.position = center[j];

        let x = (j as u32) % GRID_X;
        let y = ((j as u32) % (GRID_X * GRID_Y)) / GRID_X;
        let z = (j as u32) / (GRID_X * GRID_Y);

        for k in 0..6 {
            // "2" is the middle tile in a conceptual 3-wide local grid
            // (local = 2*GRID + own offset), mirroring the source's
            // `world_i = 2 + j % 2` addressing.
            let mut world_i: i32 = 2 + x as i32;
            let mut world_j: i32 = 2 + y as i32;
            let mut world_k: i32 = z as i32;
            match k {
                0 => world_k += 1, // up
                1 => world_k -= 1, // down
                2 => world_i -= 1, // left
                3 => world_i += 1, // right
                4 => world_j -= 1, // far
                _ => world_j += 1, // near
            }
            world_k = world_k.clamp(0, (GRID_Z - 1) as i32);

            let tile_i = (world_i as u32) / GRID_X;
            let tile_j = (world_j as u32) / GRID_Y;
            let offset_i = (world_i as u32) % GRID_X;
            let offset_j = (world_j as u32) % GRID_Y;
            let offset_k = world_k as u32;

            let grid = neighbors(tile_i, tile_j);
            let index = (offset_i + offset_j * GRID_X + offset_k * GRID_X * GRID_Y) as usize;
            target.next_position[k] = grid[index];
        }
    }
    targets
}

/// Returns the raw target position `i + j*2 + k*4`, matching
/// `Tile::GetTrafficTargetPosition`.
#[must_use]
pub fn target_index(i: u32, j: u32, k: u32) -> usize {
    (i + j * GRID_X + k * GRID_X * GRID_Y) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic_for_the_same_world_tile() {
        let a = fill_target_positions(WorldTilePosition { i: 3, j: -2 }, 1000.0);
        let b = fill_target_positions(WorldTilePosition { i: 3, j: -2 }, 1000.0);
        assert_eq!(a, b);
    }

    #[test]
    fn targets_fall_within_the_tile_footprint() {
        let tile = WorldTilePosition { i: 1, j: 1 };
        let targets = fill_target_positions(tile, 1000.0);
        for t in targets {
            assert!(t.x >= 1000.0 && t.x <= 2000.0);
            assert!(t.y >= 1000.0 && t.y <= 2000.0);
        }
    }

    #[test]
    fn neighbor_links_resolve_without_the_neighbor_tile_loaded() {
        let targets = build_traffic_targets(WorldTilePosition { i: 0, j: 0 }, 1000.0);
        // Every neighbor link must land inside one of the five
        // recomputed tiles' combined footprint (own tile +/- one).
        for t in targets {
            for n in t.next_position {
                assert!(n.x >= -1000.0 && n.x <= 2000.0);
                assert!(n.y >= -1000.0 && n.y <= 2000.0);
            }
        }
    }
}
