//! GPU memory subsystem (C3)
//!
//! Composes the static-slab [`FreeListAllocator`] and the dynamic-ring
//! [`SegmentAllocator`] behind a single entry point, plus the
//! per-worker copy-command queues that the `SyncStaticGpu` render pass
//! (C9) drains each frame to move staged data into its final static
//! offset via a compute shader.

use bc_core::PerWorker;
use bytemuck::{Pod, Zeroable};

use crate::errors::Result;
use crate::free_list::{self, FreeListAllocator, StaticAlloc};
use crate::segment::{DynamicAlloc, SegmentAllocator};

/// One compute-shader copy instruction: move `size_16` units of 16 bytes
/// each from `src` to `dst`, both expressed in 16-byte units, matching
/// the int2 `(src, dst)` layout the copy shader expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct CopyCommand {
    pub src: u32,
    pub dst: u32,
    pub size_16: u32,
    pub _pad: u32,
}

pub struct GpuMemory {
    static_slab: FreeListAllocator,
    dynamic_ring: SegmentAllocator,
    copy_queue: PerWorker<Vec<CopyCommand>>,
    current_frame: u64,
}

impl GpuMemory {
    #[must_use]
    pub fn new(
        static_capacity: u64,
        ring_segments: usize,
        ring_segment_size: u64,
        worker_count: usize,
    ) -> Self {
        Self {
            static_slab: FreeListAllocator::new(static_capacity),
            dynamic_ring: SegmentAllocator::new(ring_segments, ring_segment_size),
            copy_queue: PerWorker::new(worker_count, |_| Vec::new()),
            current_frame: 0,
        }
    }

    pub fn alloc_static(&mut self, size: u64) -> Result<StaticAlloc> {
        self.static_slab.alloc(size)
    }

    pub fn dealloc_static(&mut self, alloc: StaticAlloc, producing_frame: u64) {
        self.static_slab.dealloc(alloc, producing_frame);
    }

    pub fn alloc_dynamic(&mut self, size: u64, frame: u64) -> Result<DynamicAlloc> {
        self.dynamic_ring.alloc(size, frame)
    }

    /// Stages `data` of `size` bytes through the dynamic ring and
    /// enqueues a copy command to land it at `dst_offset` in the static
    /// slab, on `worker_id`'s queue for `frame`.
    ///
    /// Returns the staged [`DynamicAlloc`] so the caller can actually
    /// write the bytes into the ring buffer before the copy shader runs.
    pub fn update_static(
        &mut self,
        worker_id: usize,
        frame: u64,
        size: u64,
        dst_offset: u64,
    ) -> Result<DynamicAlloc> {
        let staged = self.dynamic_ring.alloc(size, frame)?;
        let size_16 = free_list::align_up(size) / 16;
        let src_16 = (staged.segment as u64) * self.dynamic_ring.segment_size() / 16
            + staged.offset / 16;
        self.copy_queue.get_mut(worker_id).push(CopyCommand {
            src: u32::try_from(src_16).unwrap_or(u32::MAX),
            dst: u32::try_from(dst_offset / 16).unwrap_or(u32::MAX),
            size_16: u32::try_from(size_16).unwrap_or(u32::MAX),
            _pad: 0,
        });
        Ok(staged)
    }

    /// Drains every worker's copy-command queue for the frame that just
    /// finished recording, in worker-id order, clearing each queue.
    pub fn drain_copy_commands(&mut self) -> Vec<CopyCommand> {
        let mut all = Vec::new();
        self.copy_queue.visit_all_mut(|_, queue| {
            all.extend(queue.drain(..));
        });
        all
    }

    /// Advances the frame counter and releases static/dynamic storage
    /// whose producing frame the GPU has now completed.
    pub fn sync(&mut self, gpu_completed_frame: u64) {
        self.static_slab.sync(gpu_completed_frame);
        self.dynamic_ring.sync(gpu_completed_frame);
    }

    #[must_use]
    pub fn current_frame(&self) -> u64 {
        self.current_frame
    }

    pub fn begin_frame(&mut self, frame: u64) {
        self.current_frame = frame;
    }

    #[must_use]
    pub fn static_free_bytes(&self) -> u64 {
        self.static_slab.free_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_static_stages_then_queues_a_copy_command() {
        let mut mem = GpuMemory::new(4096, 4, 256, 2);
        let alloc = mem.alloc_static(64).unwrap();
        mem.update_static(0, 1, 64, alloc.offset).unwrap();
        let cmds = mem.drain_copy_commands();
        assert_eq!(cmds.len(), 1);
        assert_eq!(cmds[0].dst, u32::try_from(alloc.offset / 16).unwrap());
    }

    #[test]
    fn drain_clears_queues_and_spans_all_workers() {
        let mut mem = GpuMemory::new(4096, 4, 256, 3);
        mem.update_static(0, 1, 16, 0).unwrap();
        mem.update_static(2, 1, 16, 16).unwrap();
        assert_eq!(mem.drain_copy_commands().len(), 2);
        assert_eq!(mem.drain_copy_commands().len(), 0);
    }
}
