//! Transient resource pool: per-frame resources matched and recycled by
//! descriptor rather than tracked individually.
//!
//! A `TransientTexturePool`-style design (active/free split, match-by-key
//! allocate, reset-returns-to-free, idle-frame trim), generalized from
//! textures only to any pool-dependency kind a pass declares, and from a
//! fixed texture-usage key to the `not_alias` flag a history resource
//! needs.

use rustc_hash::FxHashMap;

use crate::resource::ResourceId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Texture2D,
    Buffer,
}

/// What a pass asks the pool for. `label` doubles as the `not_alias` key:
/// when `not_alias` is set, two requests with the same label always
/// resolve to the same pool slot across frames (for history buffers);
/// otherwise any free resource matching `kind`/`width`/`height`/`format`
/// is reused regardless of which pass asked for it last frame.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PoolRequest {
    pub kind: ResourceKind,
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    pub not_alias: Option<&'static str>,
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct PoolKey {
    kind: ResourceKind,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
}

impl From<&PoolRequest> for PoolKey {
    fn from(r: &PoolRequest) -> Self {
        Self { kind: r.kind, width: r.width, height: r.height, format: r.format }
    }
}

struct Slot {
    id: ResourceId,
    idle_frames: u32,
}

/// Frames a free slot may sit unused before its backing resource is
/// destroyed, matching the "after a configurable idle of 2+ frames"
/// contract.
pub const DEFAULT_MAX_IDLE_FRAMES: u32 = 2;

/// Matches pool requests to recycled resources by descriptor.
///
/// `allocate` runs during a pass's prepare phase (`&mut self`); `reset`
/// runs once per frame after submission, returning every active slot to
/// the free list so the next frame's requests can reuse them.
#[derive(Default)]
pub struct TransientPool {
    next_id: u32,
    active: Vec<(PoolKey, Slot)>,
    free: FxHashMap<PoolKey, Vec<Slot>>,
    aliased: FxHashMap<&'static str, ResourceId>,
}

impl TransientPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a resource matching `request`, reusing a free one if
    /// available and allocating a fresh id otherwise.
    pub fn allocate(&mut self, request: &PoolRequest) -> ResourceId {
        if let Some(label) = request.not_alias {
            if let Some(&id) = self.aliased.get(label) {
                return id;
            }
        }

        let key = PoolKey::from(request);
        let slot = if let Some(bucket) = self.free.get_mut(&key) {
            bucket.pop()
        } else {
            None
        };
        let slot = slot.unwrap_or_else(|| {
            let id = ResourceId(self.next_id);
            self.next_id += 1;
            Slot { id, idle_frames: 0 }
        });

        if let Some(label) = request.not_alias {
            self.aliased.insert(label, slot.id);
        }

        let id = slot.id;
        self.active.push((key, slot));
        id
    }

    /// Returns every active slot to the free list, resetting their idle
    /// counters. Call once per frame after the graph submits.
    pub fn reset(&mut self) {
        for (key, mut slot) in self.active.drain(..) {
            slot.idle_frames = 0;
            self.free.entry(key).or_default().push(slot);
        }
    }

    /// Ages every free slot by one frame and drops those that have sat
    /// idle past `max_idle_frames`.
    pub fn trim(&mut self, max_idle_frames: u32) {
        for bucket in self.free.values_mut() {
            for slot in bucket.iter_mut() {
                slot.idle_frames += 1;
            }
            bucket.retain(|slot| slot.idle_frames <= max_idle_frames);
        }
        self.free.retain(|_, bucket| !bucket.is_empty());
    }

    #[must_use]
    pub fn total_resource_count(&self) -> usize {
        self.active.len() + self.free.values().map(Vec::len).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(w: u32, h: u32) -> PoolRequest {
        PoolRequest { kind: ResourceKind::Texture2D, width: w, height: h, format: wgpu::TextureFormat::Rgba8Unorm, not_alias: None }
    }

    #[test]
    fn matching_request_reuses_a_freed_slot() {
        let mut pool = TransientPool::new();
        let a = pool.allocate(&request(64, 64));
        pool.reset();
        let b = pool.allocate(&request(64, 64));
        assert_eq!(a, b);
    }

    #[test]
    fn mismatched_dimensions_allocate_a_new_slot() {
        let mut pool = TransientPool::new();
        let a = pool.allocate(&request(64, 64));
        pool.reset();
        let b = pool.allocate(&request(128, 64));
        assert_ne!(a, b);
    }

    #[test]
    fn not_alias_returns_the_same_slot_every_frame_even_after_trim() {
        let mut pool = TransientPool::new();
        let history = PoolRequest { not_alias: Some("ssao-history"), ..request(64, 64) };
        let a = pool.allocate(&history);
        pool.reset();
        pool.trim(DEFAULT_MAX_IDLE_FRAMES);
        let b = pool.allocate(&history);
        assert_eq!(a, b);
    }

    #[test]
    fn trim_drops_slots_idle_past_the_threshold() {
        let mut pool = TransientPool::new();
        pool.allocate(&request(64, 64));
        pool.reset();
        for _ in 0..3 {
            pool.trim(DEFAULT_MAX_IDLE_FRAMES);
        }
        assert_eq!(pool.total_resource_count(), 0);
    }
}
