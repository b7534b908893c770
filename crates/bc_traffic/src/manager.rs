//! Vehicle tile ring, GPU instance-list bookkeeping, and invalidation
//! tracking.
//!
//! Grounded on `box_city_traffic_manager.h`/`.cpp`: `Manager::Update`'s
//! toroidal ring recentering, `RegisterECSChange`/`InvalidateZone`, and
//! `ProcessCarMoves`'s block-patch path (the full-instance-list-upload
//! path collapses into the same code here, since this crate's
//! [`bc_ecs::EntityStore`] has no notion of a "this frame's upload mode"
//! flag — every invalidated block is patched individually either way).

use rustc_hash::FxHashMap;

use bc_ecs::{ArchetypeId, EntityStore, Transaction, ZoneId};
use bc_gpu::{GpuMemory, StaticAlloc};
use bc_tiles::{LocalTilePosition, WorldTilePosition};

use crate::components::CarGpuIndex;
use crate::errors::{Result, TrafficError};
use crate::vehicle_tile::{TileChange, VehicleTile, EMPTY_SLOT};

/// Rounds a byte offset down to the nearest 16-byte boundary, matching
/// `render::RoundOffsetDown16Bytes`.
fn round_down_16(offset: u32) -> u32 {
    offset & !0xF
}

fn world_mod(value: i32, k: u32) -> u32 {
    let k = k as i32;
    (((value % k) + k) % k) as u32
}

/// Owns the vehicle tile ring: one zone per ring slot, each with a fixed
/// GPU instance-list allocation and the shared car GPU-data array every
/// slot's offsets point into.
pub struct TrafficManager {
    k: u32,
    tile_size: f32,
    cars_per_tile: u32,
    instance_list_words: u32,
    slots: Vec<VehicleTile>,
    slot_by_zone: FxHashMap<ZoneId, usize>,
    camera_world_tile: WorldTilePosition,
    car_archetype: ArchetypeId,
    car_instance_byte_size: u64,
    car_data: StaticAlloc,
    free_gpu_slots: Vec<u32>,
    invalidated_zones: Vec<ZoneId>,
    invalidated_memory_blocks: FxHashMap<ZoneId, Vec<u32>>,
}

impl TrafficManager {
    /// # Panics
    /// Panics if `k` is zero.
    pub fn new(
        k: u32,
        tile_size: f32,
        cars_per_tile: u32,
        car_archetype: ArchetypeId,
        car_instance_byte_size: u64,
        gpu: &mut GpuMemory,
    ) -> Result<Self> {
        assert!(k > 0, "vehicle tile ring dimension must be positive");
        let slot_count = (k * k) as usize;
        // Slot 0 carries the live count; the remaining `2 * cars_per_tile
        // - 1` slots hold GPU offsets, with slack past `cars_per_tile` so
        // patches never force a reallocation.
        let instance_list_words = 2 * cars_per_tile;
        let total_cars = slot_count as u64 * u64::from(cars_per_tile);
        let car_data = gpu.alloc_static(total_cars * car_instance_byte_size)?;
        let free_gpu_slots = (0..u32::try_from(total_cars).unwrap()).rev().collect();

        let mut slots = Vec::with_capacity(slot_count);
        let mut slot_by_zone = FxHashMap::default();
        for index in 0..slot_count {
            let instance_list = gpu.alloc_static(u64::from(instance_list_words) * 4)?;
            let zone = ZoneId(u32::try_from(index).unwrap());
            slots.push(VehicleTile::new(zone, instance_list));
            slot_by_zone.insert(zone, index);
        }

        Ok(Self {
            k,
            tile_size,
            cars_per_tile,
            instance_list_words,
            slots,
            slot_by_zone,
            camera_world_tile: WorldTilePosition { i: 0, j: 0 },
            car_archetype,
            car_instance_byte_size,
            car_data,
            free_gpu_slots,
            invalidated_zones: Vec::new(),
            invalidated_memory_blocks: FxHashMap::default(),
        })
    }

    pub fn from_config(
        config: &bc_core::SimConfig,
        car_archetype: ArchetypeId,
        car_instance_byte_size: u64,
        gpu: &mut GpuMemory,
    ) -> Result<Self> {
        Self::new(config.vehicle_tile_ring_k, config.tile_size, config.cars_per_tile, car_archetype, car_instance_byte_size, gpu)
    }

    #[must_use]
    pub fn ring_dimension(&self) -> u32 {
        self.k
    }

    #[must_use]
    pub fn cars_per_tile(&self) -> u32 {
        self.cars_per_tile
    }

    #[must_use]
    pub fn camera_world_tile(&self) -> WorldTilePosition {
        self.camera_world_tile
    }

    #[must_use]
    pub fn car_archetype(&self) -> ArchetypeId {
        self.car_archetype
    }

    /// Reserves a free slot in the shared car GPU-data array.
    pub fn alloc_gpu_slot(&mut self) -> Result<u32> {
        self.free_gpu_slots.pop().ok_or(TrafficError::NoFreeCarSlot)
    }

    pub fn free_gpu_slot(&mut self, slot: u32) {
        self.free_gpu_slots.push(slot);
    }

    /// Byte offset in the static GPU slab of car data for `gpu_slot`.
    #[must_use]
    pub fn car_data_offset(&self, gpu_slot: u32) -> u64 {
        self.car_data.offset + u64::from(gpu_slot) * self.car_instance_byte_size
    }

    fn local(&self, world: WorldTilePosition) -> LocalTilePosition {
        LocalTilePosition { i: world_mod(world.i, self.k), j: world_mod(world.j, self.k) }
    }

    fn slot_index(&self, local: LocalTilePosition) -> usize {
        (local.j * self.k + local.i) as usize
    }

    #[must_use]
    pub fn tile_at(&self, world: WorldTilePosition) -> Option<&VehicleTile> {
        let index = self.slot_index(self.local(world));
        self.slots.get(index).filter(|t| t.tile_position() == world && t.is_activated())
    }

    #[must_use]
    pub fn slot(&self, index: usize) -> &VehicleTile {
        &self.slots[index]
    }

    /// Recenters the ring around `camera_world_tile`, activating any slot
    /// whose world tile changed and reporting it back so the caller can
    /// spawn or re-seed cars for that zone. Mirrors `Manager::Update`'s
    /// tile-descriptor sweep.
    pub fn recenter(&mut self, camera_world_tile: WorldTilePosition) -> Vec<TileChange> {
        self.camera_world_tile = camera_world_tile;
        let half = ((self.k - 1) / 2) as i32;
        let mut changes = Vec::new();

        for dj in -half..=half {
            for di in -half..=half {
                let world = WorldTilePosition { i: camera_world_tile.i + di, j: camera_world_tile.j + dj };
                let index = self.slot_index(self.local(world));
                let slot = &mut self.slots[index];
                if slot.tile_position() == world && slot.is_activated() {
                    continue;
                }
                let was_activated = slot.is_activated();
                let zone = slot.zone();
                slot.activate(world);
                log::debug!("vehicle tile slot {index} now world tile ({}, {}), reseed={was_activated}", world.i, world.j);
                changes.push(TileChange { slot: index, zone, tile_position: world, was_activated });
                self.invalidate_zone(zone);
            }
        }
        changes
    }

    /// Computes the world-space offset a vehicle's position/target needs
    /// when it jumps from `source_tile` to `dest_tile`'s actual stored
    /// world position, keeping it inside the destination tile's bounds
    /// across ring wrap-around.
    #[must_use]
    pub fn toroidal_fixup(&self, source_tile: WorldTilePosition, dest_tile: WorldTilePosition) -> glam::Vec3 {
        let source = glam::Vec3::new(source_tile.i as f32 * self.tile_size, source_tile.j as f32 * self.tile_size, 0.0);
        let dest = glam::Vec3::new(dest_tile.i as f32 * self.tile_size, dest_tile.j as f32 * self.tile_size, 0.0);
        dest - source
    }

    /// Called from the entity store's transaction callback for every car
    /// affected by a deletion or zone move.
    pub fn on_transaction(&mut self, txn: Transaction) {
        match txn {
            Transaction::Dealloc { zone, archetype, index } if archetype == self.car_archetype => {
                self.register_ecs_change(zone, index);
            }
            Transaction::Move { from_zone, from_archetype, from_index, to_zone, to_archetype, to_index }
                if from_archetype == self.car_archetype || to_archetype == self.car_archetype =>
            {
                self.register_ecs_change(from_zone, from_index);
                self.register_ecs_change(to_zone, to_index);
            }
            _ => {}
        }
    }

    /// Marks the 16-byte block covering `instance_index` as needing a
    /// refresh, and the zone as needing its live count republished.
    pub fn register_ecs_change(&mut self, zone: ZoneId, instance_index: u32) {
        let block_offset = round_down_16((instance_index + 1) * 4);
        let blocks = self.invalidated_memory_blocks.entry(zone).or_default();
        if blocks.contains(&block_offset) {
            return;
        }
        blocks.push(block_offset);
        self.invalidate_zone(zone);
    }

    pub fn invalidate_zone(&mut self, zone: ZoneId) {
        if !self.invalidated_zones.contains(&zone) {
            self.invalidated_zones.push(zone);
        }
    }

    /// Computes the 4 instance-list words for `base_index..base_index+4`
    /// (or, for `base_index == u32::MAX`, the leading count word followed
    /// by the first 3 offsets): each live index resolves to its car's GPU
    /// data offset, each index past `live_count` is [`EMPTY_SLOT`].
    fn block_values(&self, store: &EntityStore, zone: ZoneId, live_count: u32, base_index: u32) -> [u32; 4] {
        let mut values = [EMPTY_SLOT; 4];
        let start = if base_index == u32::MAX {
            values[0] = live_count;
            0
        } else {
            base_index
        };
        let first = if base_index == u32::MAX { 1 } else { 0 };
        for (slot, instance_index) in (first..4).zip(start..) {
            if instance_index >= live_count {
                break;
            }
            if let Some(gpu_index) = store.component_at::<CarGpuIndex>(zone, self.car_archetype, instance_index) {
                if gpu_index.is_valid() {
                    values[slot] = u32::try_from(self.car_data_offset(gpu_index.gpu_slot)).unwrap_or(EMPTY_SLOT);
                }
            }
        }
        values
    }

    /// Rewrites every invalidated instance-list block for every
    /// invalidated zone, then clears both invalidation sets. Mirrors
    /// `Manager::ProcessCarMoves`'s block-patch path. Returns the
    /// `(byte_offset, words)` pairs a render layer needs to actually copy
    /// into the instance-list buffer.
    pub fn process_car_moves(
        &mut self,
        store: &EntityStore,
        gpu: &mut GpuMemory,
        worker_id: usize,
        frame: u64,
    ) -> Result<Vec<(u64, [u32; 4])>> {
        let mut writes = Vec::new();

        for &zone in &self.invalidated_zones {
            let Some(&slot_index) = self.slot_by_zone.get(&zone) else { continue };
            let Some(instance_list) = self.slots[slot_index].instance_list() else { continue };
            let live_count = store.live_count(zone, self.car_archetype);

            if let Some(blocks) = self.invalidated_memory_blocks.get(&zone) {
                for &block_offset in blocks {
                    // Block 0 is the leading count word followed by the
                    // first 3 offsets, not `block_offset / 4 - 1` (which
                    // would underflow); it's handled identically to the
                    // mandatory re-publish below.
                    let base_index = if block_offset == 0 { u32::MAX } else { block_offset / 4 - 1 };
                    let values = self.block_values(store, zone, live_count, base_index);
                    writes.push((instance_list.offset + u64::from(block_offset), values));
                    gpu.update_static(worker_id, frame, 16, instance_list.offset + u64::from(block_offset))?;
                }
            }

            // Block 0 always needs republishing after any change in this
            // zone, since its slot 0 carries the live count.
            let values = self.block_values(store, zone, live_count, u32::MAX);
            writes.push((instance_list.offset, values));
            gpu.update_static(worker_id, frame, 16, instance_list.offset)?;
            debug_assert!(self.instance_list_words >= live_count + 1, "instance list too small for live count");
        }

        self.invalidated_zones.clear();
        self.invalidated_memory_blocks.clear();
        Ok(writes)
    }

    /// Rewrites an entire zone's instance list, used when a tile is
    /// (re)activated rather than merely patched. Returns the full word
    /// list a render layer needs to copy into the instance-list buffer.
    pub fn rewrite_tile(
        &mut self,
        zone: ZoneId,
        store: &EntityStore,
        gpu: &mut GpuMemory,
        worker_id: usize,
        frame: u64,
    ) -> Result<Vec<u32>> {
        let Some(&slot_index) = self.slot_by_zone.get(&zone) else { return Ok(Vec::new()) };
        let Some(instance_list) = self.slots[slot_index].instance_list() else { return Ok(Vec::new()) };
        let live_count = store.live_count(zone, self.car_archetype);
        debug_assert!(live_count <= self.cars_per_tile * 2, "more live cars than the instance list can index");

        let mut words = vec![live_count];
        for instance_index in 0..live_count {
            let offset = store
                .component_at::<CarGpuIndex>(zone, self.car_archetype, instance_index)
                .filter(CarGpuIndex::is_valid)
                .map_or(EMPTY_SLOT, |gpu_index| u32::try_from(self.car_data_offset(gpu_index.gpu_slot)).unwrap_or(EMPTY_SLOT));
            words.push(offset);
        }
        words.resize(self.instance_list_words as usize, EMPTY_SLOT);

        let size = u64::from(self.instance_list_words) * 4;
        gpu.update_static(worker_id, frame, size, instance_list.offset)?;
        self.invalidated_zones.retain(|&z| z != zone);
        self.invalidated_memory_blocks.remove(&zone);
        Ok(words)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gpu() -> GpuMemory {
        GpuMemory::new(1 << 20, 4, 4096, 1)
    }

    #[test]
    fn recenter_activates_every_slot_in_the_initial_ring() {
        let mut gpu = gpu();
        let mut manager = TrafficManager::new(3, 1000.0, 8, ArchetypeId(0), 64, &mut gpu).unwrap();
        let changes = manager.recenter(WorldTilePosition { i: 0, j: 0 });
        assert_eq!(changes.len(), 9);
        for dj in -1..=1 {
            for di in -1..=1 {
                assert!(manager.tile_at(WorldTilePosition { i: di, j: dj }).is_some());
            }
        }
    }

    #[test]
    fn recentering_onto_the_same_tile_reports_no_changes() {
        let mut gpu = gpu();
        let mut manager = TrafficManager::new(3, 1000.0, 8, ArchetypeId(0), 64, &mut gpu).unwrap();
        manager.recenter(WorldTilePosition { i: 0, j: 0 });
        let changes = manager.recenter(WorldTilePosition { i: 0, j: 0 });
        assert!(changes.is_empty());
    }

    #[test]
    fn register_ecs_change_deduplicates_the_same_block() {
        let mut gpu = gpu();
        let mut manager = TrafficManager::new(3, 1000.0, 8, ArchetypeId(0), 64, &mut gpu).unwrap();
        manager.register_ecs_change(ZoneId(0), 0);
        manager.register_ecs_change(ZoneId(0), 1);
        manager.register_ecs_change(ZoneId(0), 2);
        assert_eq!(manager.invalidated_memory_blocks[&ZoneId(0)].len(), 1);
    }

    #[test]
    fn alloc_gpu_slot_never_hands_out_the_same_slot_twice() {
        let mut gpu = gpu();
        let mut manager = TrafficManager::new(3, 1000.0, 2, ArchetypeId(0), 64, &mut gpu).unwrap();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..(3 * 3 * 2) {
            assert!(seen.insert(manager.alloc_gpu_slot().unwrap()));
        }
        assert!(manager.alloc_gpu_slot().is_err());
    }

    #[test]
    fn toroidal_fixup_offsets_by_exactly_one_tile_size() {
        let mut gpu = gpu();
        let manager = TrafficManager::new(3, 1000.0, 8, ArchetypeId(0), 64, &mut gpu).unwrap();
        let offset = manager.toroidal_fixup(WorldTilePosition { i: 2, j: 0 }, WorldTilePosition { i: -3, j: 0 });
        assert_eq!(offset, glam::Vec3::new(-5000.0, 0.0, 0.0));
    }
}
