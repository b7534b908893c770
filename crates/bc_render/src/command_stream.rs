//! Per-item recorded command stream.
//!
//! A [`RenderItem`](crate::render_item::RenderItem)'s `data` word is
//! either a direct GPU offset or an [`Offset`] into this byte stream; the
//! draw-render-items sub-pass replays the recorded ops for each item in
//! sort order. Built directly from the declared op set; there is no
//! prior compacted byte-stream layer to adapt here, since render nodes
//! elsewhere record straight against `wgpu::RenderPass`.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Offset(pub u32);

/// One recorded GPU operation a draw-render-items pass can replay.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedOp {
    SetVertexBuffer { slot: u32, buffer: u32 },
    SetIndexBuffer { buffer: u32 },
    SetDescriptor { slot: u32, id: u32 },
    DrawIndexed { index_count: u32, instance_count: u32 },
}

/// Append-only, per-frame buffer of recorded ops. Built during the
/// extract/prepare phase, replayed read-only during execute.
#[derive(Default)]
pub struct CommandBuffer {
    ops: Vec<RecordedOp>,
}

impl CommandBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `op`, returning its offset for a render item's `data` word.
    pub fn record(&mut self, op: RecordedOp) -> Offset {
        let offset = Offset(self.ops.len() as u32);
        self.ops.push(op);
        offset
    }

    #[must_use]
    pub fn get(&self, offset: Offset) -> Option<&RecordedOp> {
        self.ops.get(offset.0 as usize)
    }

    /// Ops from `offset` up to (but not including) the next
    /// [`RecordedOp::DrawIndexed`], which always ends an item's stream.
    #[must_use]
    pub fn ops_for_item(&self, offset: Offset) -> &[RecordedOp] {
        let start = offset.0 as usize;
        let end = self.ops[start..].iter().position(|op| matches!(op, RecordedOp::DrawIndexed { .. })).map_or(self.ops.len(), |i| start + i + 1);
        &self.ops[start..end]
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_returns_increasing_offsets() {
        let mut cmds = CommandBuffer::new();
        let a = cmds.record(RecordedOp::SetVertexBuffer { slot: 0, buffer: 1 });
        let b = cmds.record(RecordedOp::DrawIndexed { index_count: 36, instance_count: 1 });
        assert_eq!(a, Offset(0));
        assert_eq!(b, Offset(1));
    }

    #[test]
    fn ops_for_item_stops_at_the_draw_call() {
        let mut cmds = CommandBuffer::new();
        let start = cmds.record(RecordedOp::SetVertexBuffer { slot: 0, buffer: 1 });
        cmds.record(RecordedOp::SetDescriptor { slot: 0, id: 7 });
        cmds.record(RecordedOp::DrawIndexed { index_count: 36, instance_count: 1 });
        cmds.record(RecordedOp::SetVertexBuffer { slot: 0, buffer: 2 });
        assert_eq!(cmds.ops_for_item(start).len(), 3);
    }
}
