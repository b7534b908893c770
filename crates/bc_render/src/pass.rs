//! Render passes: a name, declared pre-conditions/post-updates/barriers/
//! pool dependencies, and an ordered list of GPU sub-pass operations.
//!
//! A `RenderNode`-style trait (`prepare`/`run` split: mutable resource
//! allocation up front, read-only command recording after) generalized
//! with the declared-dependency fields the scheduler needs.

use smallvec::SmallVec;

use crate::resource::{Barrier, ResourceId, ResourceState};
use crate::transient_pool::PoolRequest;

/// One GPU operation inside a pass's ordered sub-pass list.
#[derive(Clone, Debug, PartialEq)]
pub enum SubPass {
    SetTarget { color: SmallVec<[ResourceId; 4]>, depth: Option<ResourceId> },
    Clear { target: ResourceId },
    BindRootSignature { id: u32 },
    SetPipeline { id: u32 },
    SetDescriptorTable { slot: u32, id: u32 },
    DrawFullScreenQuad,
    DispatchCompute { x: u32, y: u32, z: u32 },
    ExecuteIndirect { args: ResourceId },
    DrawRenderItems { priority: u8 },
}

/// What a pass declares before it's added to a [`crate::graph::RenderGraph`].
#[derive(Clone, Debug, Default)]
pub struct PassDesc {
    pub name: &'static str,
    /// Must all hold before this pass is eligible to run.
    pub pre_conditions: SmallVec<[(ResourceId, ResourceState); 4]>,
    /// Applied to tracked resource state once this pass runs.
    pub post_updates: SmallVec<[(ResourceId, ResourceState); 4]>,
    pub barriers: SmallVec<[Barrier; 4]>,
    pub pool_requests: SmallVec<[(ResourceId, PoolRequest); 2]>,
    pub sub_passes: Vec<SubPass>,
}

impl PassDesc {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self { name, ..Self::default() }
    }

    #[must_use]
    pub fn requires(mut self, resource: ResourceId, state: ResourceState) -> Self {
        self.pre_conditions.push((resource, state));
        self
    }

    #[must_use]
    pub fn updates(mut self, resource: ResourceId, state: ResourceState) -> Self {
        self.post_updates.push((resource, state));
        self
    }

    #[must_use]
    pub fn barrier(mut self, barrier: Barrier) -> Self {
        self.barriers.push(barrier);
        self
    }

    #[must_use]
    pub fn sub_pass(mut self, sub_pass: SubPass) -> Self {
        self.sub_passes.push(sub_pass);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_methods_append_in_call_order() {
        let desc = PassDesc::new("opaque")
            .requires(ResourceId(0), ResourceState::ShaderResource)
            .updates(ResourceId(1), ResourceState::RenderTarget)
            .sub_pass(SubPass::Clear { target: ResourceId(1) })
            .sub_pass(SubPass::DrawRenderItems { priority: 0 });
        assert_eq!(desc.pre_conditions.len(), 1);
        assert_eq!(desc.post_updates.len(), 1);
        assert_eq!(desc.sub_passes.len(), 2);
    }
}
