//! Resources a pass declares pre-conditions/post-updates against.
//!
//! The graph doesn't own GPU resources itself (that's `bc_gpu`'s job,
//! kept to an opaque command-recording model); it only tracks each
//! resource's current state tag so it can decide scheduling order and
//! emit barrier lists.

use rustc_hash::FxHashMap;

/// Identifies a resource a pass reads from or writes to. Persistent
/// resources (the swap-chain target, a static geometry buffer) keep a
/// stable id across frames; transient resources get a fresh one each
/// time they're allocated from the [`crate::transient_pool::TransientPool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResourceId(pub u32);

/// GPU-visible state a resource can sit in between passes. Mirrors the
/// handful of states a barrier actually needs to distinguish, not the
/// full `wgpu` resource-state lattice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceState {
    /// Freshly allocated or not yet touched this frame.
    Init,
    RenderTarget,
    DepthWrite,
    ShaderResource,
    UnorderedAccess,
    CopySource,
    CopyDest,
    IndirectArgument,
    Present,
}

/// A resource transition a pass requires before it runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Barrier {
    pub resource: ResourceId,
    pub before: ResourceState,
    pub after: ResourceState,
}

/// Tracks every resource's current state across a frame's scheduling
/// pass. Starts every resource at [`ResourceState::Init`] the first time
/// it's mentioned, matching the graph's "resources are tagged `Init`" at
/// submit.
#[derive(Default)]
pub struct ResourceStates {
    states: FxHashMap<ResourceId, ResourceState>,
}

impl ResourceStates {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, resource: ResourceId) -> ResourceState {
        self.states.get(&resource).copied().unwrap_or(ResourceState::Init)
    }

    pub fn set(&mut self, resource: ResourceId, state: ResourceState) {
        self.states.insert(resource, state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmentioned_resources_read_as_init() {
        let states = ResourceStates::new();
        assert_eq!(states.get(ResourceId(0)), ResourceState::Init);
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut states = ResourceStates::new();
        states.set(ResourceId(3), ResourceState::RenderTarget);
        assert_eq!(states.get(ResourceId(3)), ResourceState::RenderTarget);
    }
}
