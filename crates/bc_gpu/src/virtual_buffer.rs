//! Virtual buffer (C2)
//!
//! Models a reserve-large / commit-small backing store: the full
//! capacity is reserved up front so the backing storage never moves
//! (pointers/indices into committed rows stay valid across growth), and
//! `committed_size` tracks the logical high-water mark separately from
//! the physical allocation.
//!
//! The source reserves virtual address space and pages it in on commit;
//! safe Rust has no portable equivalent that avoids `unsafe`, so this
//! reserves the backing `Vec` at full capacity immediately and treats
//! `committed_size` as a pure bookkeeping bound. This is exactly the
//! guarantee the indirection table relies on: backed by storage sized
//! beyond the worst case, so growth never fails.

use crate::errors::{AllocError, Result};

pub struct VirtualBuffer<T> {
    storage: Vec<T>,
    capacity: usize,
    committed: usize,
}

impl<T: Clone + Default> VirtualBuffer<T> {
    /// Reserves `capacity` elements of backing storage.
    #[must_use]
    pub fn reserve(capacity: usize) -> Self {
        Self {
            storage: vec![T::default(); capacity],
            capacity,
            committed: 0,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn committed_size(&self) -> usize {
        self.committed
    }

    /// Grows or shrinks the committed region. Shrinking never touches
    /// the underlying storage (decommit is purely logical here); growing
    /// fails if it would exceed the reserved capacity.
    pub fn set_committed_size(&mut self, n: usize) -> Result<()> {
        if n > self.capacity {
            return Err(AllocError::NotCommitted {
                requested: n,
                capacity: self.capacity,
            });
        }
        self.committed = n;
        Ok(())
    }

    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.storage[..self.committed]
    }

    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.storage[..self.committed]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn committed_region_grows_without_moving_capacity() {
        let mut vb: VirtualBuffer<u32> = VirtualBuffer::reserve(1024);
        vb.set_committed_size(4).unwrap();
        vb.as_mut_slice().copy_from_slice(&[1, 2, 3, 4]);
        vb.set_committed_size(8).unwrap();
        assert_eq!(&vb.as_slice()[..4], &[1, 2, 3, 4]);
        assert_eq!(vb.capacity(), 1024);
    }

    #[test]
    fn commit_beyond_capacity_fails() {
        let mut vb: VirtualBuffer<u32> = VirtualBuffer::reserve(16);
        assert!(vb.set_committed_size(17).is_err());
    }
}
