//! Frame submission and the prepare/render fence.
//!
//! A `RenderGraph::execute`-style design (one command encoder shared
//! across all nodes, run in schedule order, submitted once) plus the
//! "at most one render in flight" contract: a fence gates the next
//! frame's `end_prepare` against the render job still draining the
//! previous one, the same completed-vs-pending frame counter idiom
//! `bc_gpu::free_list` already
//! uses to know when a deferred dealloc is safe.

use crate::pass::{PassDesc, SubPass};

/// Monotonic frame counter. `pending` is the frame currently being
/// recorded or submitted; `completed` is the highest frame the render
/// thread has finished.
pub struct Submitter {
    pending: u64,
    completed: u64,
}

impl Default for Submitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Submitter {
    #[must_use]
    pub fn new() -> Self {
        Self { pending: 0, completed: 0 }
    }

    /// True while a previously submitted frame hasn't finished — the
    /// game thread's `end_prepare` must block here before recording the
    /// next frame, keeping at most one render in flight.
    #[must_use]
    pub fn render_in_flight(&self) -> bool {
        self.completed < self.pending
    }

    /// Starts recording a new frame. Returns its frame index.
    ///
    /// # Panics
    ///
    /// Panics if a previous frame is still in flight — callers must wait
    /// on [`Self::render_in_flight`] first.
    pub fn begin_frame(&mut self) -> u64 {
        assert!(!self.render_in_flight(), "begin_frame called while a render is still in flight");
        self.pending += 1;
        self.pending
    }

    /// Runs every scheduled pass's sub-passes in order, as if recording
    /// them into one shared command encoder, then marks the frame
    /// complete. Returns the total sub-pass op count, letting a caller
    /// sanity-check nothing was silently dropped.
    pub fn submit(&mut self, passes: &[PassDesc]) -> usize {
        let mut op_count = 0;
        for pass in passes {
            log::trace!("submitting pass {}", pass.name);
            for sub_pass in &pass.sub_passes {
                record(sub_pass);
                op_count += 1;
            }
        }
        self.completed = self.pending;
        op_count
    }
}

fn record(sub_pass: &SubPass) {
    log::trace!("record {sub_pass:?}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pass::PassDesc;

    #[test]
    fn submit_marks_the_frame_complete() {
        let mut submitter = Submitter::new();
        submitter.begin_frame();
        assert!(submitter.render_in_flight());
        submitter.submit(&[PassDesc::new("opaque")]);
        assert!(!submitter.render_in_flight());
    }

    #[test]
    #[should_panic(expected = "still in flight")]
    fn begin_frame_panics_while_a_render_is_in_flight() {
        let mut submitter = Submitter::new();
        submitter.begin_frame();
        submitter.begin_frame();
    }

    #[test]
    fn submit_counts_every_sub_pass_op() {
        let mut submitter = Submitter::new();
        submitter.begin_frame();
        let pass = PassDesc::new("opaque").sub_pass(crate::pass::SubPass::DrawFullScreenQuad).sub_pass(crate::pass::SubPass::DrawRenderItems { priority: 0 });
        assert_eq!(submitter.submit(&[pass]), 2);
    }
}
