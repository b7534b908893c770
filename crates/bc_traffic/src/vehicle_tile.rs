//! A single slot in the traffic manager's vehicle tile ring.
//!
//! Grounded on `box_city_traffic_manager.h`'s `Tile` struct
//! (`m_tile_position`, `m_zone_index`, `m_instances_list_handle`,
//! `m_instance_list_max_count`) and `Manager::Update`'s branch between
//! re-seeding an already-activated zone and spawning a fresh one.

use bc_ecs::ZoneId;
use bc_gpu::StaticAlloc;
use bc_tiles::WorldTilePosition;

/// Sentinel written into an instance-list slot that holds no live car,
/// matching the source's `0xFFFFFFFF` padding value.
pub const EMPTY_SLOT: u32 = 0xFFFF_FFFF;

/// One vehicle tile: a zone's world position plus its GPU instance-list
/// allocation. Unlike [`bc_tiles::Tile`] this carries no building data —
/// the vehicle ring only exists to keep each zone's live car count and
/// GPU-visible instance pointers in sync with the entity store.
pub struct VehicleTile {
    tile_position: WorldTilePosition,
    zone: ZoneId,
    activated: bool,
    instance_list: StaticAlloc,
}

impl VehicleTile {
    /// The instance-list allocation is fixed for the slot's whole
    /// lifetime (every slot needs the same capacity); only the world
    /// tile and activation flag change as the ring recenters.
    pub(crate) fn new(zone: ZoneId, instance_list: StaticAlloc) -> Self {
        Self { tile_position: WorldTilePosition { i: 0, j: 0 }, zone, activated: false, instance_list }
    }

    #[must_use]
    pub fn tile_position(&self) -> WorldTilePosition {
        self.tile_position
    }

    #[must_use]
    pub fn zone(&self) -> ZoneId {
        self.zone
    }

    /// A tile is activated once it has been assigned a world position;
    /// `Manager::Update` re-seeds activated zones instead of spawning
    /// fresh cars into them.
    #[must_use]
    pub fn is_activated(&self) -> bool {
        self.activated
    }

    #[must_use]
    pub fn instance_list(&self) -> Option<StaticAlloc> {
        self.activated.then_some(self.instance_list)
    }

    pub(crate) fn activate(&mut self, tile_position: WorldTilePosition) {
        self.tile_position = tile_position;
        self.activated = true;
    }
}

/// Describes one ring slot whose world tile changed during `recenter`,
/// reported back to the caller so vehicle spawning/re-seeding (C8) can
/// react without the traffic manager knowing anything about car
/// components itself.
#[derive(Debug, Clone, Copy)]
pub struct TileChange {
    pub slot: usize,
    pub zone: ZoneId,
    pub tile_position: WorldTilePosition,
    /// `true` if this slot held cars before and they should be re-seeded
    /// toward the new tile rather than despawned and respawned.
    pub was_activated: bool,
}
