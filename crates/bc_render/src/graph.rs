//! Greedy pass scheduler.
//!
//! A `RenderGraph`-style transient per-frame container, generalized to a
//! declared-dependency model: rather than a flat ordered list run in
//! submission order, this scheduler greedily picks any pass whose
//! pre-conditions are satisfied, repeating until every pass has run or
//! none remain eligible.

use crate::errors::{RenderError, Result};
use crate::pass::PassDesc;
use crate::resource::ResourceStates;

pub struct RenderGraph {
    passes: Vec<PassDesc>,
}

impl Default for RenderGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderGraph {
    #[must_use]
    pub fn new() -> Self {
        Self { passes: Vec::new() }
    }

    /// Declares a pass for this frame. Passes execute in schedule order,
    /// not call order — `schedule` decides that.
    pub fn add_pass(&mut self, pass: PassDesc) -> Result<()> {
        if self.passes.iter().any(|p| p.name == pass.name) {
            return Err(RenderError::DuplicatePass(pass.name.to_string()));
        }
        self.passes.push(pass);
        Ok(())
    }

    /// Greedily orders the declared passes: repeatedly scan the
    /// unscheduled set for any pass whose pre-conditions are all
    /// satisfied by the current resource states, apply its post-updates,
    /// and move it to the schedule. Returns the ordered pass list, or a
    /// `Stalled` diagnostic naming every pass still unscheduled and which
    /// of its pre-conditions aren't met, if the sweep ever finds none
    /// eligible with passes remaining.
    pub fn schedule(mut self, states: &mut ResourceStates) -> Result<Vec<PassDesc>> {
        let mut scheduled = Vec::with_capacity(self.passes.len());

        while !self.passes.is_empty() {
            let eligible_index = self.passes.iter().position(|pass| pass.pre_conditions.iter().all(|&(resource, state)| states.get(resource) == state));

            let Some(index) = eligible_index else {
                let diagnostics = self
                    .passes
                    .iter()
                    .map(|pass| {
                        let unmet: Vec<String> = pass
                            .pre_conditions
                            .iter()
                            .filter(|&&(resource, state)| states.get(resource) != state)
                            .map(|&(resource, state)| format!("{} wants {resource:?}={state:?}, has {:?}", pass.name, states.get(resource)))
                            .collect();
                        unmet.join("; ")
                    })
                    .collect();
                log::error!("frame graph stalled with {} pass(es) unscheduled", self.passes.len());
                return Err(RenderError::Stalled { remaining: self.passes.len(), diagnostics });
            };

            let pass = self.passes.remove(index);
            for &(resource, state) in &pass.post_updates {
                states.set(resource, state);
            }
            scheduled.push(pass);
        }

        Ok(scheduled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{ResourceId, ResourceState};

    #[test]
    fn independent_passes_schedule_in_declaration_order() {
        let mut graph = RenderGraph::new();
        graph.add_pass(PassDesc::new("a").updates(ResourceId(0), ResourceState::RenderTarget)).unwrap();
        graph.add_pass(PassDesc::new("b").updates(ResourceId(1), ResourceState::RenderTarget)).unwrap();
        let mut states = ResourceStates::new();
        let scheduled = graph.schedule(&mut states).unwrap();
        assert_eq!(scheduled.len(), 2);
    }

    #[test]
    fn a_dependent_pass_runs_after_its_prerequisite() {
        let mut graph = RenderGraph::new();
        graph.add_pass(PassDesc::new("present").requires(ResourceId(0), ResourceState::RenderTarget)).unwrap();
        graph.add_pass(PassDesc::new("opaque").updates(ResourceId(0), ResourceState::RenderTarget)).unwrap();
        let mut states = ResourceStates::new();
        let scheduled = graph.schedule(&mut states).unwrap();
        assert_eq!(scheduled[0].name, "opaque");
        assert_eq!(scheduled[1].name, "present");
    }

    #[test]
    fn an_unsatisfiable_dependency_stalls_with_a_diagnostic() {
        let mut graph = RenderGraph::new();
        graph.add_pass(PassDesc::new("orphan").requires(ResourceId(5), ResourceState::DepthWrite)).unwrap();
        let mut states = ResourceStates::new();
        let err = graph.schedule(&mut states).unwrap_err();
        match err {
            RenderError::Stalled { remaining, diagnostics } => {
                assert_eq!(remaining, 1);
                assert!(diagnostics[0].contains("orphan"));
            }
            RenderError::DuplicatePass(_) => panic!("unexpected duplicate-pass error"),
        }
    }

    #[test]
    fn duplicate_pass_names_are_rejected() {
        let mut graph = RenderGraph::new();
        graph.add_pass(PassDesc::new("opaque")).unwrap();
        assert!(graph.add_pass(PassDesc::new("opaque")).is_err());
    }
}
