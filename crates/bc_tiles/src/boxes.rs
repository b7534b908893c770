//! Per-box descriptor data precomputed during tile generation (C6).
//!
//! Grounded on `box_city_tile.h`'s `BoxData`/`AnimatedBoxData`/
//! `PanelData`/`AnimatedPanelData`/`LODGroupData`.

use bc_spatial::{Aabb, Obb};
use glam::{Mat4, Vec3};

#[derive(Clone, Copy, Debug)]
pub struct AnimationBox {
    pub original_position: Vec3,
    /// Distance the box travels along its local Z axis.
    pub range: f32,
    pub offset: f32,
    pub frequency: f32,
}

#[derive(Clone, Copy, Debug)]
pub struct BoxData {
    pub aabb: Aabb,
    pub obb: Obb,
}

#[derive(Clone, Copy, Debug)]
pub struct AnimatedBoxData {
    pub base: BoxData,
    pub animation: AnimationBox,
}

#[derive(Clone, Copy, Debug)]
pub struct PanelData {
    pub base: BoxData,
    pub colour_palette: u8,
}

#[derive(Clone, Copy, Debug)]
pub struct AnimatedPanelData {
    pub panel: PanelData,
    pub parent_index: u32,
    pub parent_to_child: Mat4,
}

/// Descriptor lists for one LOD group of one tile, rebuilt whenever the
/// tile regenerates.
#[derive(Clone, Debug, Default)]
pub struct LodGroupData {
    pub buildings: Vec<BoxData>,
    pub panels: Vec<PanelData>,
    pub animated_buildings: Vec<AnimatedBoxData>,
    pub animated_panels: Vec<AnimatedPanelData>,
}

/// Tags an `InstanceRef` spawned by [`crate::tile::Tile::spawn_lod_group`]
/// as a building/panel instance, distinct from `bc_vehicle`'s car
/// archetype. Carries no data of its own — the box geometry stays in
/// this tile's `LodGroupData` lists, not in an ECS column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildingInstance;

/// The GPU-visible mirror of one spawned building/panel instance,
/// sized the same way `bc_vehicle::GpuCarInstance` mirrors a car: only
/// used here to size a group's static-slab allocation in
/// [`crate::tile::Tile::spawn_lod_group`], since nothing currently
/// writes building bytes through the copy queue.
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct GpuBuildingInstance {
    pub position: Vec3,
    pub colour_palette: u32,
    pub rotation_col0: Vec3,
    pub _pad0: f32,
    pub rotation_col1: Vec3,
    pub _pad1: f32,
    pub rotation_col2: Vec3,
    pub _pad2: f32,
    pub extents: Vec3,
    pub _pad3: f32,
}

impl GpuBuildingInstance {
    #[must_use]
    pub fn from_box(data: &BoxData, colour_palette: u8) -> Self {
        let cols = data.obb.rotation.to_cols_array_2d();
        Self {
            position: data.obb.position,
            colour_palette: u32::from(colour_palette),
            rotation_col0: Vec3::from(cols[0]),
            _pad0: 0.0,
            rotation_col1: Vec3::from(cols[1]),
            _pad1: 0.0,
            rotation_col2: Vec3::from(cols[2]),
            _pad2: 0.0,
            extents: data.obb.extents,
            _pad3: 0.0,
        }
    }
}

impl LodGroupData {
    pub fn clear(&mut self) {
        self.buildings.clear();
        self.panels.clear();
        self.animated_buildings.clear();
        self.animated_panels.clear();
    }

    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.buildings.len() + self.panels.len() + self.animated_buildings.len() + self.animated_panels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instance_count() == 0
    }
}
