//! Render items: per-item sort keys, worker-local collection, and the
//! priority table built from the sorted result.
//!
//! Built directly from the declared model, with no prior render-item
//! sorting layer to adapt: a 32-bit sort
//! key packing an 8-bit priority and a 24-bit secondary key, paired with
//! a 32-bit data word that's either a direct GPU offset or a
//! `CommandBuffer` offset.

use std::collections::BinaryHeap;

/// One entry in a `PointOfView`'s sorted draw list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderItem {
    pub key: u32,
    pub data: u32,
}

impl RenderItem {
    #[must_use]
    pub fn new(priority: u8, sort_key: u32, data: u32) -> Self {
        Self { key: pack_key(priority, sort_key), data }
    }

    #[must_use]
    pub fn priority(&self) -> u8 {
        (self.key >> 24) as u8
    }
}

#[must_use]
pub fn pack_key(priority: u8, sort_key: u32) -> u32 {
    (u32::from(priority) << 24) | (sort_key & 0x00FF_FFFF)
}

/// Above this many total items, sorting switches from one combined sort
/// to per-worker sorts merged by a k-way merge, since the per-worker
/// lists are already partially ordered and re-sorting the concatenation
/// from scratch wastes that.
pub const PER_WORKER_SORT_THRESHOLD: usize = 4096;

/// Collects render items from worker-local buffers, then sorts and
/// builds the `[first, last)` priority table a draw-render-items pass
/// indexes into.
#[derive(Default)]
pub struct PointOfView {
    workers: Vec<Vec<RenderItem>>,
}

impl PointOfView {
    #[must_use]
    pub fn new(worker_count: usize) -> Self {
        Self { workers: (0..worker_count).map(|_| Vec::new()).collect() }
    }

    pub fn push(&mut self, worker: usize, item: RenderItem) {
        self.workers[worker].push(item);
    }

    /// Sorts all collected items by key and returns them alongside the
    /// priority table. Below [`PER_WORKER_SORT_THRESHOLD`] items this
    /// concatenates and sorts once; above it, each worker's list is
    /// sorted independently and the results merged in key order without
    /// ever re-comparing items that were already ordered relative to each
    /// other.
    #[must_use]
    pub fn sort(mut self) -> (Vec<RenderItem>, PriorityTable) {
        let total: usize = self.workers.iter().map(Vec::len).sum();
        let items = if total <= PER_WORKER_SORT_THRESHOLD {
            let mut all: Vec<RenderItem> = self.workers.into_iter().flatten().collect();
            all.sort_unstable_by_key(|item| item.key);
            all
        } else {
            for worker in &mut self.workers {
                worker.sort_unstable_by_key(|item| item.key);
            }
            k_way_merge(self.workers)
        };

        let table = PriorityTable::build(&items);
        (items, table)
    }
}

fn k_way_merge(workers: Vec<Vec<RenderItem>>) -> Vec<RenderItem> {
    #[derive(PartialEq, Eq)]
    struct HeapEntry {
        key: u32,
        worker: usize,
        index: usize,
    }
    impl Ord for HeapEntry {
        fn cmp(&self, other: &Self) -> std::cmp::Ordering {
            // Reverse so `BinaryHeap` (a max-heap) pops the smallest key.
            other.key.cmp(&self.key)
        }
    }
    impl PartialOrd for HeapEntry {
        fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
            Some(self.cmp(other))
        }
    }

    let total: usize = workers.iter().map(Vec::len).sum();
    let mut heap = BinaryHeap::with_capacity(workers.len());
    for (worker, items) in workers.iter().enumerate() {
        if let Some(first) = items.first() {
            heap.push(HeapEntry { key: first.key, worker, index: 0 });
        }
    }

    let mut merged = Vec::with_capacity(total);
    while let Some(HeapEntry { worker, index, .. }) = heap.pop() {
        merged.push(workers[worker][index]);
        if let Some(next) = workers[worker].get(index + 1) {
            heap.push(HeapEntry { key: next.key, worker, index: index + 1 });
        }
    }
    merged
}

/// `[first, last)` range into a sorted item list for each of the 256
/// possible priorities, so `DrawRenderItems(priority)` can slice
/// directly instead of re-scanning.
pub struct PriorityTable {
    ranges: [Option<std::ops::Range<u32>>; 256],
}

impl PriorityTable {
    #[must_use]
    fn build(sorted_items: &[RenderItem]) -> Self {
        let mut ranges: [Option<std::ops::Range<u32>>; 256] = [const { None }; 256];
        let mut start = 0usize;
        while start < sorted_items.len() {
            let priority = sorted_items[start].priority();
            let mut end = start + 1;
            while end < sorted_items.len() && sorted_items[end].priority() == priority {
                end += 1;
            }
            ranges[priority as usize] = Some(start as u32..end as u32);
            start = end;
        }
        Self { ranges }
    }

    #[must_use]
    pub fn range(&self, priority: u8) -> Option<std::ops::Range<u32>> {
        self.ranges[priority as usize].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_key_orders_priority_before_the_secondary_key() {
        let low_priority_high_sort = pack_key(0, 0x00FF_FFFF);
        let high_priority_low_sort = pack_key(1, 0);
        assert!(low_priority_high_sort < high_priority_low_sort);
    }

    #[test]
    fn sort_orders_items_by_key_below_threshold() {
        let mut pov = PointOfView::new(2);
        pov.push(0, RenderItem::new(1, 10, 0));
        pov.push(1, RenderItem::new(0, 5, 0));
        pov.push(0, RenderItem::new(0, 1, 0));
        let (items, _table) = pov.sort();
        assert!(items.windows(2).all(|w| w[0].key <= w[1].key));
    }

    #[test]
    fn priority_table_slices_match_the_priority_run() {
        let mut pov = PointOfView::new(1);
        pov.push(0, RenderItem::new(0, 0, 100));
        pov.push(0, RenderItem::new(0, 1, 101));
        pov.push(0, RenderItem::new(2, 0, 200));
        let (items, table) = pov.sort();
        let range = table.range(0).unwrap();
        assert_eq!(range, 0..2);
        for item in &items[range.start as usize..range.end as usize] {
            assert_eq!(item.priority(), 0);
        }
        assert!(table.range(1).is_none());
    }

    #[test]
    fn k_way_merge_matches_a_flat_sort_above_threshold() {
        let mut pov = PointOfView::new(4);
        for worker in 0..4 {
            for i in 0..(PER_WORKER_SORT_THRESHOLD / 2) {
                pov.push(worker, RenderItem::new(0, ((worker * 97 + i * 13) % 1000) as u32, 0));
            }
        }
        let (items, _) = pov.sort();
        assert!(items.windows(2).all(|w| w[0].key <= w[1].key));
    }
}
