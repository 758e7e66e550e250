//! # Heap Allocator
//!
//! The baseline: every request is a separate general-purpose heap
//! allocation, no pooling of any kind.

use super::Allocator;
use crate::error::{AllocError, AllocResult};
use crate::tracker::{AllocMode, AllocationTracker};

/// One heap allocation. Owns its buffer and remembers its real size.
///
/// Dropping the block releases the memory.
#[derive(Debug)]
pub struct HeapBlock {
    /// Reserved, untouched storage.
    buf: Vec<u8>,
    /// Bytes requested.
    size: usize,
}

impl HeapBlock {
    /// Bytes requested for this block.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Bytes actually reserved by the heap (at least `size`).
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }
}

/// Baseline allocator backed by the global heap.
#[derive(Debug, Default)]
pub struct HeapAllocator {
    /// Blocks handed out and not yet freed.
    live_count: usize,
    /// Frees whose caller-supplied size differed from the block's real size.
    mismatched_frees: u64,
}

impl HeapAllocator {
    /// Creates a baseline allocator with nothing outstanding.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            live_count: 0,
            mismatched_frees: 0,
        }
    }

    /// Allocates a block of `size` bytes from the heap.
    ///
    /// The memory is reserved but not written, like `malloc`.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError::HeapExhausted`] if the heap refuses the request.
    /// Nothing is recorded in that case.
    pub fn allocate_block(
        &mut self,
        size: usize,
        tracker: &mut AllocationTracker,
    ) -> AllocResult<HeapBlock> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(size)
            .map_err(|_| AllocError::HeapExhausted { size })?;

        self.live_count += 1;
        tracker.record_alloc(size);

        Ok(HeapBlock { buf, size })
    }

    /// Releases `block`, recording `size` bytes with the tracker.
    ///
    /// `size` is taken on trust. When it differs from the block's real size
    /// the free still goes through, the tracker is skewed, and the mismatch is
    /// counted in [`HeapAllocator::mismatched_frees`].
    pub fn free_block(&mut self, block: HeapBlock, size: usize, tracker: &mut AllocationTracker) {
        if size != block.size {
            self.mismatched_frees += 1;
            tracing::trace!(
                real = block.size,
                recorded = size,
                "heap free accounted with mismatched size"
            );
        }

        drop(block);
        self.live_count = self.live_count.saturating_sub(1);
        tracker.record_dealloc(size);
    }

    /// Blocks handed out and not yet freed.
    #[inline]
    #[must_use]
    pub const fn live_count(&self) -> usize {
        self.live_count
    }

    /// Frees so far whose accounted size differed from the real size.
    #[inline]
    #[must_use]
    pub const fn mismatched_frees(&self) -> u64 {
        self.mismatched_frees
    }
}

impl Allocator for HeapAllocator {
    type Handle = HeapBlock;

    fn mode(&self) -> AllocMode {
        AllocMode::Fragmented
    }

    fn fixed_size(&self) -> Option<usize> {
        None
    }

    fn allocate(&mut self, size: usize, tracker: &mut AllocationTracker) -> AllocResult<HeapBlock> {
        self.allocate_block(size, tracker)
    }

    fn free(
        &mut self,
        handle: HeapBlock,
        size: usize,
        tracker: &mut AllocationTracker,
    ) -> AllocResult<()> {
        self.free_block(handle, size, tracker);
        Ok(())
    }

    fn recorded_size(&self, handle: &HeapBlock) -> usize {
        handle.size()
    }

    fn live_count(&self) -> usize {
        self.live_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> AllocationTracker {
        AllocationTracker::new(AllocMode::Fragmented)
    }

    #[test]
    fn test_heap_allocate_free() {
        let mut tracker = tracker();
        let mut heap = HeapAllocator::new();

        let a = heap.allocate_block(20, &mut tracker).unwrap();
        let b = heap.allocate_block(200, &mut tracker).unwrap();
        assert_eq!(tracker.total_bytes(), 220);
        assert_eq!(tracker.active_count(), 2);
        assert_eq!(heap.live_count(), 2);
        assert!(b.capacity() >= 200);

        heap.free_block(a, 20, &mut tracker);
        heap.free_block(b, 200, &mut tracker);
        assert!(tracker.is_balanced());
        assert_eq!(heap.live_count(), 0);
        assert_eq!(heap.mismatched_frees(), 0);
    }

    #[test]
    fn test_mismatched_free_is_counted() {
        let mut tracker = tracker();
        let mut heap = HeapAllocator::new();

        let block = heap.allocate_block(100, &mut tracker).unwrap();
        heap.free_block(block, 40, &mut tracker);

        assert_eq!(heap.mismatched_frees(), 1);
        assert_eq!(tracker.active_count(), 0);
        // The tracker believes 60 bytes are still out.
        assert_eq!(tracker.total_bytes(), 60);
    }

    #[test]
    fn test_impossible_request_is_heap_exhaustion() {
        let mut tracker = tracker();
        let mut heap = HeapAllocator::new();

        let err = heap.allocate_block(usize::MAX, &mut tracker).unwrap_err();
        assert_eq!(err, AllocError::HeapExhausted { size: usize::MAX });
        assert!(!err.is_recoverable());
        assert!(tracker.is_balanced());
        assert_eq!(heap.live_count(), 0);
    }

    #[test]
    fn test_allocator_trait_reports_real_size() {
        let mut tracker = tracker();
        let mut heap = HeapAllocator::new();

        let block = Allocator::allocate(&mut heap, 48, &mut tracker).unwrap();
        assert_eq!(heap.recorded_size(&block), 48);
        assert_eq!(heap.fixed_size(), None);
        assert_eq!(heap.mode(), AllocMode::Fragmented);

        Allocator::free(&mut heap, block, 48, &mut tracker).unwrap();
        assert!(tracker.is_balanced());
    }
}
