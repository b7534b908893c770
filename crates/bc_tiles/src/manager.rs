//! Toroidal tile ring and camera-driven regeneration.
//!
//! Grounded on `box_city_tile_manager.h`'s flat `kTileDimension` array
//! of tiles keyed by `(i, j) mod K`, plus
//! `Tile::BuildTileData`'s neighbor lookups reused here to decide which
//! ring slots need regenerating when the camera crosses a tile boundary.

use bc_ecs::{ArchetypeId, EntityStore, ZoneId};
use bc_gpu::GpuMemory;
use bc_spatial::{Aabb, Frustum, Obb};

use crate::errors::Result;
use crate::lod::LodGroup;
use crate::tile::{LocalTilePosition, Tile, WorldTilePosition};

/// Owns the `K x K` ring of tiles kept loaded around a moving camera.
/// `K` must be odd so the camera's tile always sits at the ring center.
pub struct TileManager {
    k: u32,
    tile_size: f32,
    slots: Vec<Tile>,
    camera_world_tile: WorldTilePosition,
}

fn world_mod(value: i32, k: u32) -> u32 {
    let k = k as i32;
    (((value % k) + k) % k) as u32
}

impl TileManager {
    /// # Panics
    /// Panics if `k` is even or zero.
    #[must_use]
    pub fn new(k: u32, tile_size: f32) -> Self {
        assert!(k > 0 && k % 2 == 1, "tile ring dimension must be odd");
        let slot_count = (k * k) as usize;
        Self {
            k,
            tile_size,
            slots: (0..slot_count).map(|_| Tile::new()).collect(),
            camera_world_tile: WorldTilePosition { i: 0, j: 0 },
        }
    }

    #[must_use]
    pub fn from_config(config: &bc_core::SimConfig) -> Self {
        Self::new(config.tile_ring_k, config.tile_size)
    }

    #[must_use]
    pub fn ring_dimension(&self) -> u32 {
        self.k
    }

    #[must_use]
    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    #[must_use]
    pub fn camera_world_tile(&self) -> WorldTilePosition {
        self.camera_world_tile
    }

    fn local(&self, world: WorldTilePosition) -> LocalTilePosition {
        LocalTilePosition { i: world_mod(world.i, self.k), j: world_mod(world.j, self.k) }
    }

    fn slot_index(&self, local: LocalTilePosition) -> usize {
        (local.j * self.k + local.i) as usize
    }

    #[must_use]
    pub fn tile_at_local(&self, local: LocalTilePosition) -> Option<&Tile> {
        self.slots.get(self.slot_index(local))
    }

    #[must_use]
    pub fn tile_at_world(&self, world: WorldTilePosition) -> Option<&Tile> {
        let local = self.local(world);
        self.tile_at_local(local).filter(|tile| tile.world_tile_position() == world && tile.is_loaded())
    }

    #[must_use]
    pub fn world_tile_of(&self, position: glam::Vec3) -> WorldTilePosition {
        WorldTilePosition {
            i: (position.x / self.tile_size).floor() as i32,
            j: (position.y / self.tile_size).floor() as i32,
        }
    }

    /// Recomputes the ring around `camera_world_tile`, regenerating any
    /// slot whose current occupant no longer matches the world tile it
    /// should hold: crossing a tile boundary shifts the ring and
    /// regenerates the slots that scrolled in. `zone_of` maps
    /// a ring slot to the `ZoneId` its entities should live in.
    pub fn recenter(&mut self, camera_world_tile: WorldTilePosition, mut zone_of: impl FnMut(LocalTilePosition) -> ZoneId) {
        self.camera_world_tile = camera_world_tile;
        let half = ((self.k - 1) / 2) as i32;

        for dj in -half..=half {
            for di in -half..=half {
                let world = WorldTilePosition { i: camera_world_tile.i + di, j: camera_world_tile.j + dj };
                let local = self.local(world);
                let index = self.slot_index(local);
                if self.slots[index].world_tile_position() == world && self.slots[index].is_loaded() {
                    continue;
                }
                self.regenerate_slot(index, world, zone_of(local));
            }
        }
    }

    fn regenerate_slot(&mut self, index: usize, world: WorldTilePosition, zone: ZoneId) {
        log::debug!("regenerating tile slot {index} for world tile ({}, {})", world.i, world.j);
        self.slots[index].added_to_loading_queue();

        let k = self.k;
        let tile_size = self.tile_size;
        let neighbor_offsets: [(i32, i32); 8] =
            [(-1, -1), (0, -1), (1, -1), (-1, 0), (1, 0), (-1, 1), (0, 1), (1, 1)];

        // Collect neighbor OBBs/AABBs separately so the closure below
        // doesn't need to borrow `self.slots` while `self.slots[index]`
        // is borrowed mutably for `Tile::build`.
        let neighbor_boxes: Vec<Vec<(Aabb, Obb)>> = neighbor_offsets
            .iter()
            .filter_map(|(di, dj)| {
                let neighbor_world = WorldTilePosition { i: world.i + di, j: world.j + dj };
                let neighbor_local = LocalTilePosition { i: world_mod(neighbor_world.i, k), j: world_mod(neighbor_world.j, k) };
                let neighbor_index = (neighbor_local.j * k + neighbor_local.i) as usize;
                let neighbor = &self.slots[neighbor_index];
                if neighbor.world_tile_position() == neighbor_world && neighbor.is_loaded() {
                    Some(neighbor.boxes_snapshot())
                } else {
                    None
                }
            })
            .collect();

        self.slots[index].build(zone, world, tile_size, |aabb, obb| {
            neighbor_boxes.iter().any(|boxes| boxes.iter().any(|(n_aabb, n_obb)| aabb.intersects(n_aabb) && bc_spatial::collision_obb_vs_obb(n_obb, obb)))
        });
    }

    /// Updates every loaded slot's LOD from its distance to
    /// `camera_position` against `lod_distances` (ascending thresholds,
    /// one per non-zero LOD level). A tile whose bounding box falls
    /// entirely outside `frustum` is skipped rather than LOD-updated,
    /// keeping whatever groups it already has spawned until it comes
    /// back into view.
    pub fn update_lods(
        &mut self,
        camera_position: glam::Vec3,
        lod_distances: [f32; 2],
        frustum: &Frustum,
        store: &EntityStore,
        worker_id: usize,
        archetype_of: impl Fn(LodGroup) -> ArchetypeId + Copy,
        instance_byte_size_of: impl Fn(LodGroup) -> u64 + Copy,
        gpu: &mut GpuMemory,
        producing_frame: u64,
    ) -> Result<()> {
        for tile in &mut self.slots {
            if !tile.is_loaded() {
                continue;
            }
            let Some(zone) = tile.zone_id() else { continue };
            let bounding_box = tile.bounding_box();
            if !frustum.intersects_aabb(&bounding_box) {
                continue;
            }
            let distance = bounding_box.center().distance(camera_position);
            let lod = if distance < lod_distances[0] {
                0
            } else if distance < lod_distances[1] {
                1
            } else {
                2
            };
            tile.lod_tile(lod, store, worker_id, zone, archetype_of, instance_byte_size_of, gpu, producing_frame)?;
        }
        Ok(())
    }

    /// Broad-phase collision test against every loaded tile; used by
    /// vehicle AI and by generation itself before a neighbor tile's BVH
    /// exists.
    #[must_use]
    pub fn collides_any_loaded(&self, aabb: &Aabb, obb: &Obb) -> bool {
        self.slots.iter().any(|tile| tile.is_loaded() && tile.collision_vs_loaded(aabb, obb))
    }

    pub fn visit_buildings(&self, aabb: &Aabb, mut visitor: impl FnMut(bc_ecs::InstanceRef, Obb)) {
        for tile in &self.slots {
            if tile.current_lod() == 0 {
                tile.visit_buildings(aabb, &mut visitor);
            }
        }
    }

    #[must_use]
    pub fn local_tile_count(&self) -> u32 {
        self.k * self.k
    }

    /// Picks a fresh traffic target for a vehicle sitting at `position`:
    /// finds the tile it's in, samples a random grid cell, and returns a
    /// random one of that cell's six neighbor positions instead of the
    /// cell's own center, so retargeting keeps cars moving instead of
    /// settling on a single point per cell. `None` if the tile isn't
    /// loaded (the vehicle keeps its current target until it is).
    pub fn next_traffic_target(&self, rng: &mut impl rand::Rng, position: glam::Vec3) -> Option<glam::Vec3> {
        let tile = self.tile_at_world(self.world_tile_of(position))?;
        let i = rng.random_range(0..2);
        let j = rng.random_range(0..2);
        let k = rng.random_range(0..4);
        let direction = rng.random_range(0..6);
        Some(tile.traffic_target_next(i, j, k, direction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_mod_wraps_negative_indices_into_the_ring() {
        assert_eq!(world_mod(-1, 5), 4);
        assert_eq!(world_mod(-6, 5), 4);
        assert_eq!(world_mod(5, 5), 0);
    }

    #[test]
    #[should_panic(expected = "odd")]
    fn rejects_an_even_ring_dimension() {
        TileManager::new(4, 1000.0);
    }

    #[test]
    fn recenter_loads_every_slot_in_the_initial_ring() {
        let mut manager = TileManager::new(3, 1000.0);
        manager.recenter(WorldTilePosition { i: 0, j: 0 }, |local| ZoneId(local.i + local.j * 3));
        for dj in -1..=1 {
            for di in -1..=1 {
                let world = WorldTilePosition { i: di, j: dj };
                assert!(manager.tile_at_world(world).is_some());
            }
        }
    }

    #[test]
    fn recentering_onto_the_same_camera_tile_is_a_no_op() {
        let mut manager = TileManager::new(3, 1000.0);
        manager.recenter(WorldTilePosition { i: 0, j: 0 }, |local| ZoneId(local.i + local.j * 3));
        let before: Vec<usize> = manager.slots.iter().map(|t| t.world_tile_position().i as usize).collect();
        manager.recenter(WorldTilePosition { i: 0, j: 0 }, |local| ZoneId(local.i + local.j * 3));
        let after: Vec<usize> = manager.slots.iter().map(|t| t.world_tile_position().i as usize).collect();
        assert_eq!(before, after);
    }
}
