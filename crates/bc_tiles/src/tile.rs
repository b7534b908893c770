//! A single streamed tile: state machine, generated content, LOD
//! spawn/despawn, and the two BVHs over its boxes.
//!
//! Grounded on `box_city_tile.h`'s `Tile`:
//! `CollisionBoxVsLoadedTile`/`CollisionBoxVsLoadingTile`,
//! `BuildTileData`, `SpawnLodGroup`/`SpawnTile`/`DespawnLodGroup`/
//! `DespawnTile`/`LodTile`, and the `State` enum. The source's
//! `std::atomic<State>` exists because tiles are mutated from async
//! loading jobs directly; this port instead routes every mutation
//! through `&mut self` calls the caller schedules exclusively (matching
//! `bc_ecs::EntityStore::tick`'s own exclusive-borrow argument), so a
//! plain field replaces the atomic.

use bc_ecs::{ArchetypeId, EntityStore, InstanceRef, ZoneId};
use bc_gpu::{GpuMemory, StaticAlloc};
use bc_spatial::{Aabb, Lbvh, Obb};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::boxes::{AnimatedBoxData, BoxData, LodGroupData};
use crate::errors::Result;
use crate::generation::{classify_position, sample_building};
use crate::lod::{mask_for_lod, LodGroup, ALL_LOD_GROUPS, NUM_LOD_GROUPS};

/// Source names this inverted (`min.z` is `kTileHeightTop`, `max.z` is
/// `kTileHeightBottom`) — kept numerically equivalent here under
/// clearer names rather than reproducing the inversion.
pub const TILE_Z_MIN: f32 = 0.0;
pub const TILE_Z_MAX: f32 = 400.0;
/// A building whose OBB extends above this altitude joins `TopBuildings`
/// instead of `Rest`.
pub const TOP_BAND_Z: f32 = 300.0;

/// Generation attempts per tile. The source samples 650; this port uses
/// a smaller count suited to a `4x4` macro-cell grid instead of an
/// authored zone-descriptor lookup (see `generation.rs`).
pub const GENERATION_ATTEMPTS: u32 = 160;
const TARGET_CLEAR_RADIUS: f32 = 75.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LocalTilePosition {
    pub i: u32,
    pub j: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorldTilePosition {
    pub i: i32,
    pub j: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Unloaded,
    Loading,
    Loaded,
    Visible,
}

struct BoxCollision {
    aabb: Aabb,
    obb: Obb,
}

/// One live spawned instance's GPU bookkeeping for a LOD group: the raw
/// per-instance data slab and the `[count, off0, off1, ...]`
/// instance-list buffer read by the render pass.
#[derive(Default)]
struct GpuGroupAllocation {
    data: Option<StaticAlloc>,
    instance_list: Option<StaticAlloc>,
}

pub struct Tile {
    state: State,
    bounding_box: Aabb,
    zone_id: Option<ZoneId>,
    tile_position: WorldTilePosition,
    lod: u32,

    generated_boxes: Vec<BoxCollision>,
    generated_boxes_bvh: Lbvh<u32>,

    level_data: [LodGroupData; NUM_LOD_GROUPS],
    instances: [Vec<InstanceRef>; NUM_LOD_GROUPS],
    gpu_allocation: [GpuGroupAllocation; NUM_LOD_GROUPS],

    /// Second LBVH over live building `InstanceRef`s, rebuilt whenever
    /// LOD reaches 0; used by vehicle AI building avoidance.
    live_buildings_bvh: Lbvh<InstanceRef>,
    /// OBBs of the instances indexed by `live_buildings_bvh`, keyed by
    /// the same `InstanceRef` a `visit_buildings` visitor receives —
    /// the geometry itself lives in `level_data`, not as an ECS
    /// component, so a visitor needs this to turn a hit back into a box.
    building_obbs: rustc_hash::FxHashMap<InstanceRef, Obb>,

    traffic_targets: [crate::traffic_target::TrafficTarget; crate::traffic_target::TARGETS_PER_TILE],
}

impl Default for Tile {
    fn default() -> Self {
        Self {
            state: State::Unloaded,
            bounding_box: Aabb::EMPTY,
            zone_id: None,
            tile_position: WorldTilePosition { i: 0, j: 0 },
            lod: 0,
            generated_boxes: Vec::new(),
            generated_boxes_bvh: Lbvh::build(&[], |_: &u32| Aabb::EMPTY, Aabb::EMPTY),
            level_data: Default::default(),
            instances: Default::default(),
            gpu_allocation: Default::default(),
            live_buildings_bvh: Lbvh::build(&[], |_: &InstanceRef| Aabb::EMPTY, Aabb::EMPTY),
            building_obbs: rustc_hash::FxHashMap::default(),
            traffic_targets: [crate::traffic_target::TrafficTarget { position: glam::Vec3::ZERO, next_position: [glam::Vec3::ZERO; 6] };
                crate::traffic_target::TARGETS_PER_TILE],
        }
    }
}

impl Tile {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.state == State::Visible
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(self.state, State::Loaded | State::Visible)
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state == State::Loading
    }

    #[must_use]
    pub fn current_lod(&self) -> u32 {
        self.lod
    }

    #[must_use]
    pub fn zone_id(&self) -> Option<ZoneId> {
        self.zone_id
    }

    #[must_use]
    pub fn bounding_box(&self) -> Aabb {
        self.bounding_box
    }

    #[must_use]
    pub fn world_tile_position(&self) -> WorldTilePosition {
        self.tile_position
    }

    /// Marks the tile as queued for (re)generation; matches
    /// `Tile::AddedToLoadingQueue`.
    pub fn added_to_loading_queue(&mut self) {
        self.state = State::Loading;
    }

    /// `CollisionBoxVsLoadedTile`: broad-phase AABB-vs-bounding-box, then
    /// the precomputed BVH over this tile's accepted boxes.
    #[must_use]
    pub fn collision_vs_loaded(&self, aabb: &Aabb, obb: &Obb) -> bool {
        if !aabb.intersects(&self.bounding_box) {
            return false;
        }
        let mut hit = false;
        self.generated_boxes_bvh.query(aabb, |&index| {
            if !hit && bc_spatial::collision_obb_vs_obb(&self.generated_boxes[index as usize].obb, obb) {
                hit = true;
            }
        });
        hit
    }

    /// `CollisionBoxVsLoadingTile`: the tile's own BVH isn't built yet
    /// mid-generation, so this is a linear scan over boxes accepted so
    /// far.
    #[must_use]
    fn collision_vs_loading(&self, aabb: &Aabb, obb: &Obb) -> bool {
        if !aabb.intersects(&self.bounding_box) {
            return false;
        }
        self.generated_boxes
            .iter()
            .any(|b| b.aabb.intersects(aabb) && bc_spatial::collision_obb_vs_obb(&b.obb, obb))
    }

    /// (Re)generates this tile's content deterministically from
    /// `world_tile`'s coordinates. `neighbor_collides` tests a candidate
    /// extended AABB/OBB against every already-`Loaded` neighbor tile
    /// (the eight surrounding tiles); pass `|_, _| false` when no
    /// neighbor has loaded yet.
    pub fn build(
        &mut self,
        zone: ZoneId,
        world_tile: WorldTilePosition,
        tile_size: f32,
        mut neighbor_collides: impl FnMut(&Aabb, &Obb) -> bool,
    ) {
        let begin_x = world_tile.i as f32 * tile_size;
        let begin_y = world_tile.j as f32 * tile_size;

        self.bounding_box = Aabb::new(
            glam::Vec3::new(begin_x, begin_y, TILE_Z_MIN),
            glam::Vec3::new(begin_x + tile_size, begin_y + tile_size, TILE_Z_MAX),
        );
        self.zone_id = Some(zone);
        self.tile_position = world_tile;
        self.lod = 0;
        self.generated_boxes.clear();
        for group in &mut self.level_data {
            group.clear();
        }

        self.traffic_targets = crate::traffic_target::build_traffic_targets(world_tile, tile_size);

        let seed = (100_000i64 + i64::from(world_tile.i) + (100_000i64 + i64::from(world_tile.j)) * 1000) as u64;
        let mut rng = StdRng::seed_from_u64(seed);

        for _ in 0..GENERATION_ATTEMPTS {
            let position = glam::Vec3::new(
                begin_x + rand::Rng::random_range(&mut rng, 0.0..tile_size),
                begin_y + rand::Rng::random_range(&mut rng, 0.0..tile_size),
                rand::Rng::random_range(&mut rng, TILE_Z_MIN..TILE_Z_MAX),
            );
            let Some(descriptor_index) = classify_position((begin_x, begin_y), tile_size, position) else {
                continue;
            };
            let generated = sample_building(&mut rng, descriptor_index, position);

            let mut extended = generated.obb;
            if generated.dynamic {
                extended.extents.z += generated.animation.range;
            }
            let extended_aabb = extended.bounding_aabb();

            let too_close_to_a_target = self.traffic_targets.iter().any(|target| {
                let mut inside = false;
                let closest = extended.closest_point(target.position, &mut inside);
                closest.distance_squared(target.position) < TARGET_CLEAR_RADIUS * TARGET_CLEAR_RADIUS
            });
            if too_close_to_a_target {
                continue;
            }
            if self.collision_vs_loading(&extended_aabb, &extended) {
                continue;
            }
            if neighbor_collides(&extended_aabb, &extended) {
                continue;
            }

            let obb = generated.obb;
            let aabb = obb.bounding_aabb();
            self.generated_boxes.push(BoxCollision { aabb, obb });

            let group = if aabb.max.z > TOP_BAND_Z { LodGroup::TopBuildings } else { LodGroup::Rest };

            let box_data = BoxData { aabb, obb };
            if generated.dynamic {
                self.level_data[group.index()].animated_buildings.push(AnimatedBoxData { base: box_data, animation: generated.animation });
            } else {
                self.level_data[group.index()].buildings.push(box_data);
            }
        }

        self.generated_boxes_bvh = Lbvh::build(
            &(0u32..self.generated_boxes.len() as u32).collect::<Vec<_>>(),
            |&index| self.generated_boxes[index as usize].aabb,
            self.bounding_box,
        );

        self.state = State::Loaded;
    }

    /// Every accepted box's AABB and OBB, for a neighbor tile to test
    /// new candidates against while it is itself still generating.
    #[must_use]
    pub fn boxes_snapshot(&self) -> Vec<(Aabb, Obb)> {
        self.generated_boxes.iter().map(|b| (b.aabb, b.obb)).collect()
    }

    #[must_use]
    pub fn lod_group_data(&self, group: LodGroup) -> &LodGroupData {
        &self.level_data[group.index()]
    }

    #[must_use]
    pub fn lod_instances(&self, group: LodGroup) -> &[InstanceRef] {
        &self.instances[group.index()]
    }

    /// `SpawnLodGroup`: allocates one `InstanceRef` per descriptor in
    /// this group plus the group's GPU data and instance-list regions.
    pub fn spawn_lod_group(
        &mut self,
        group: LodGroup,
        store: &EntityStore,
        worker_id: usize,
        zone: ZoneId,
        archetype: ArchetypeId,
        gpu: &mut GpuMemory,
        instance_byte_size: u64,
    ) -> Result<()> {
        let count = self.level_data[group.index()].instance_count();
        if count == 0 {
            return Ok(());
        }
        for _ in 0..count {
            let instance = store.alloc(worker_id, zone, archetype)?;
            self.instances[group.index()].push(instance);
        }
        let data = gpu.alloc_static(count as u64 * instance_byte_size)?;
        // `[count, off0, off1, ...]`, each slot a 4-byte offset.
        let instance_list = gpu.alloc_static((count as u64 + 1) * 4)?;
        self.gpu_allocation[group.index()] = GpuGroupAllocation { data: Some(data), instance_list: Some(instance_list) };
        Ok(())
    }

    /// `DespawnLodGroup`: deallocates GPU storage and every live
    /// `InstanceRef` for this group.
    pub fn despawn_lod_group(&mut self, group: LodGroup, store: &EntityStore, gpu: &mut GpuMemory, producing_frame: u64) {
        for instance in self.instances[group.index()].drain(..) {
            store.dealloc(instance);
        }
        let alloc = std::mem::take(&mut self.gpu_allocation[group.index()]);
        if let Some(data) = alloc.data {
            gpu.dealloc_static(data, producing_frame);
        }
        if let Some(instance_list) = alloc.instance_list {
            gpu.dealloc_static(instance_list, producing_frame);
        }
    }

    /// `LodTile`: spawns groups newly covered by `new_lod` and despawns
    /// groups newly uncovered, then rebuilds the live-buildings BVH if
    /// `new_lod` reached full detail.
    pub fn lod_tile(
        &mut self,
        new_lod: u32,
        store: &EntityStore,
        worker_id: usize,
        zone: ZoneId,
        archetype_of: impl Fn(LodGroup) -> ArchetypeId,
        instance_byte_size_of: impl Fn(LodGroup) -> u64,
        gpu: &mut GpuMemory,
        producing_frame: u64,
    ) -> Result<()> {
        if new_lod > 2 {
            return Err(crate::errors::TileError::InvalidLod(new_lod));
        }
        let old_mask = mask_for_lod(self.lod);
        let new_mask = mask_for_lod(new_lod);
        self.lod = new_lod;

        for group in ALL_LOD_GROUPS {
            let was_spawned = old_mask & group.bit() != 0;
            let should_spawn = new_mask & group.bit() != 0;
            if should_spawn && !was_spawned {
                self.spawn_lod_group(group, store, worker_id, zone, archetype_of(group), gpu, instance_byte_size_of(group))?;
            } else if was_spawned && !should_spawn {
                self.despawn_lod_group(group, store, gpu, producing_frame);
            }
        }

        self.state = if new_mask == 0 { State::Loaded } else { State::Visible };

        if new_lod == 0 {
            let mut refs = Vec::new();
            let mut lookup = rustc_hash::FxHashMap::default();
            self.building_obbs.clear();
            for group in [LodGroup::TopBuildings, LodGroup::Rest] {
                let obbs = self.group_box_obbs(group);
                for ((instance, aabb), obb) in self.instances[group.index()].iter().zip(self.group_box_aabbs(group)).zip(obbs) {
                    refs.push(*instance);
                    lookup.insert(*instance, aabb);
                    self.building_obbs.insert(*instance, obb);
                }
            }
            self.live_buildings_bvh = Lbvh::build(&refs, |r| lookup[r], self.bounding_box);
        }
        Ok(())
    }

    /// Box AABBs for one LOD group's descriptors, in the same fixed
    /// order (`buildings`, `panels`, `animated_buildings`,
    /// `animated_panels`) that `spawn_lod_group` allocates instances in,
    /// so zipping the two together pairs each `InstanceRef` with its box.
    fn group_box_aabbs(&self, group: LodGroup) -> Vec<Aabb> {
        let data = &self.level_data[group.index()];
        let mut aabbs = Vec::with_capacity(data.instance_count());
        aabbs.extend(data.buildings.iter().map(|b| b.aabb));
        aabbs.extend(data.panels.iter().map(|p| p.base.aabb));
        aabbs.extend(data.animated_buildings.iter().map(|b| b.base.aabb));
        aabbs.extend(data.animated_panels.iter().map(|p| p.panel.base.aabb));
        aabbs
    }

    /// Box OBBs for one LOD group's descriptors, same fixed order as
    /// [`Self::group_box_aabbs`].
    fn group_box_obbs(&self, group: LodGroup) -> Vec<Obb> {
        let data = &self.level_data[group.index()];
        let mut obbs = Vec::with_capacity(data.instance_count());
        obbs.extend(data.buildings.iter().map(|b| b.obb));
        obbs.extend(data.panels.iter().map(|p| p.base.obb));
        obbs.extend(data.animated_buildings.iter().map(|b| b.base.obb));
        obbs.extend(data.animated_panels.iter().map(|p| p.panel.base.obb));
        obbs
    }

    /// `SpawnTile`: first spawn at a given LOD from `Loaded`.
    pub fn spawn_tile(
        &mut self,
        lod: u32,
        store: &EntityStore,
        worker_id: usize,
        zone: ZoneId,
        archetype_of: impl Fn(LodGroup) -> ArchetypeId,
        instance_byte_size_of: impl Fn(LodGroup) -> u64,
        gpu: &mut GpuMemory,
    ) -> Result<()> {
        self.lod_tile(lod, store, worker_id, zone, archetype_of, instance_byte_size_of, gpu, 0)
    }

    /// `DespawnTile`: tears down every spawned group, returning to
    /// `Loaded`.
    pub fn despawn_tile(&mut self, store: &EntityStore, gpu: &mut GpuMemory, producing_frame: u64) {
        for group in ALL_LOD_GROUPS {
            self.despawn_lod_group(group, store, gpu, producing_frame);
        }
        self.live_buildings_bvh = Lbvh::build(&[], |_: &InstanceRef| Aabb::EMPTY, Aabb::EMPTY);
        self.building_obbs.clear();
        self.state = State::Loaded;
    }

    /// `visit_buildings`: recurses the full-detail (LOD 0) BVH, handing
    /// the visitor each hit's handle together with its OBB (the box
    /// geometry lives in this tile's descriptor lists, not as an ECS
    /// component, so a bare `InstanceRef` alone wouldn't be enough).
    pub fn visit_buildings(&self, aabb: &Aabb, mut visitor: impl FnMut(InstanceRef, Obb)) {
        self.live_buildings_bvh.query(aabb, |r| {
            if let Some(&obb) = self.building_obbs.get(r) {
                visitor(*r, obb);
            }
        });
    }

    #[must_use]
    pub fn traffic_target_position(&self, i: u32, j: u32, k: u32) -> glam::Vec3 {
        self.traffic_targets[crate::traffic_target::target_index(i, j, k)].position
    }

    #[must_use]
    pub fn traffic_target_next(&self, i: u32, j: u32, k: u32, direction: usize) -> glam::Vec3 {
        self.traffic_targets[crate::traffic_target::target_index(i, j, k)].next_position[direction]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bc_ecs::ZoneId;

    #[test]
    fn build_produces_a_tile_bounded_by_its_world_cell() {
        let mut tile = Tile::new();
        tile.build(ZoneId(0), WorldTilePosition { i: 2, j: -1 }, 1000.0, |_, _| false);
        assert!(tile.is_loaded());
        assert_eq!(tile.bounding_box().min.x, 2000.0);
        assert_eq!(tile.bounding_box().min.y, -1000.0);
    }

    #[test]
    fn build_is_deterministic_for_the_same_world_tile() {
        let mut a = Tile::new();
        let mut b = Tile::new();
        a.build(ZoneId(0), WorldTilePosition { i: 5, j: 5 }, 1000.0, |_, _| false);
        b.build(ZoneId(0), WorldTilePosition { i: 5, j: 5 }, 1000.0, |_, _| false);
        assert_eq!(a.generated_boxes.len(), b.generated_boxes.len());
    }

    #[test]
    fn generated_boxes_never_overlap_a_traffic_target_clear_radius() {
        let mut tile = Tile::new();
        tile.build(ZoneId(0), WorldTilePosition { i: 0, j: 0 }, 1000.0, |_, _| false);
        for b in &tile.generated_boxes {
            for t in &tile.traffic_targets {
                let mut inside = false;
                let closest = b.obb.closest_point(t.position, &mut inside);
                assert!(closest.distance_squared(t.position) >= TARGET_CLEAR_RADIUS * TARGET_CLEAR_RADIUS * 0.99);
            }
        }
    }

    #[test]
    fn a_neighbor_rejecting_every_candidate_yields_an_empty_tile() {
        let mut tile = Tile::new();
        tile.build(ZoneId(0), WorldTilePosition { i: 0, j: 0 }, 1000.0, |_, _| true);
        assert!(tile.generated_boxes.is_empty());
    }
}
