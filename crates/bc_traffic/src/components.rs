//! The one car-facing component the traffic manager owns directly.
//!
//! Grounded on `box_city_components.h`'s `CarGPUIndex` (`gpu_slot`,
//! `IsValid`). The rest of a car's state (position, target, control
//! settings) belongs to `bc_vehicle`, which depends on this crate rather
//! than the other way around.

/// Index into the traffic manager's shared car GPU data array.
/// `EMPTY` marks an entity that hasn't been assigned a slot yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CarGpuIndex {
    pub gpu_slot: u32,
}

impl CarGpuIndex {
    pub const EMPTY: u32 = u32::MAX;

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.gpu_slot != Self::EMPTY
    }
}

impl Default for CarGpuIndex {
    fn default() -> Self {
        Self { gpu_slot: Self::EMPTY }
    }
}
