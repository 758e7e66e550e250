//! # Slot Pool
//!
//! Fixed-size block allocator over a [`SlotArena`], recycling freed slots
//! through a free list.
//!
//! Available slots live in two disjoint places:
//!
//! - `next_fresh..slot_count` - slots never handed out, taken in index order
//! - `recycled` - slots that were freed, reused last-freed-first
//!
//! Allocation drains `recycled` before touching a fresh slot. Freeing only
//! ever pushes onto `recycled`; the fresh cursor moves forward and never back.

use super::arena::SlotArena;
use super::Allocator;
use crate::error::{AllocError, AllocResult};
use crate::tracker::{AllocMode, AllocationTracker};

/// Default slot size in bytes.
pub const DEFAULT_SLOT_SIZE: usize = 64;

/// A pool of fixed-size slots carved from one arena.
///
/// # Thread Safety
///
/// This pool is NOT thread-safe. Use one pool per thread or wrap in a mutex.
///
/// # Example
///
/// ```rust,ignore
/// let mut tracker = AllocationTracker::new(AllocMode::Optimized);
/// let mut pool = SlotPool::new(160, 64)?;
///
/// // Allocate - O(1), no heap allocation
/// let handle = pool.allocate_slot(&mut tracker)?;
///
/// // Free - O(1), no heap deallocation
/// pool.free_slot(handle, &mut tracker)?;
/// ```
pub struct SlotPool {
    /// The slot storage.
    arena: SlotArena,
    /// Freed slots, most recently freed on top.
    recycled: Vec<usize>,
    /// First slot that has never been allocated.
    next_fresh: usize,
    /// Liveness per slot.
    live: Box<[bool]>,
    /// Number of live slots.
    live_count: usize,
}

/// Handle to an allocated slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    /// Index into the pool.
    index: usize,
}

impl PoolHandle {
    /// Slot index this handle refers to.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.index
    }
}

impl SlotPool {
    /// Creates a pool with `slot_count` slots of `slot_size` bytes.
    ///
    /// All memory is pre-allocated upfront.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError::InvalidLayout`] if either argument is zero and
    /// [`AllocError::HeapExhausted`] if the arena or its bookkeeping cannot
    /// be reserved.
    pub fn new(slot_count: usize, slot_size: usize) -> AllocResult<Self> {
        let capacity = slot_count.checked_mul(slot_size).ok_or(AllocError::InvalidLayout {
            capacity: usize::MAX,
            slot_size,
        })?;
        Self::with_arena(SlotArena::new(capacity, slot_size)?)
    }

    /// Creates a pool over an existing arena. Every slot starts free.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError::HeapExhausted`] if the free list or the
    /// liveness map cannot be reserved.
    pub fn with_arena(arena: SlotArena) -> AllocResult<Self> {
        let slot_count = arena.slot_count();
        let exhausted = |_| AllocError::HeapExhausted { size: slot_count };

        let mut recycled = Vec::new();
        recycled.try_reserve_exact(slot_count).map_err(exhausted)?;
        let mut live = Vec::new();
        live.try_reserve_exact(slot_count).map_err(exhausted)?;
        live.resize(slot_count, false);

        Ok(Self {
            arena,
            recycled,
            next_fresh: 0,
            live: live.into_boxed_slice(),
            live_count: 0,
        })
    }

    /// Returns the total number of slots.
    #[inline]
    #[must_use]
    pub const fn slot_count(&self) -> usize {
        self.arena.slot_count()
    }

    /// Returns the size of one slot in bytes.
    #[inline]
    #[must_use]
    pub const fn slot_size(&self) -> usize {
        self.arena.slot_size()
    }

    /// Returns the arena capacity in bytes.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Returns the number of live slots.
    #[inline]
    #[must_use]
    pub const fn live_count(&self) -> usize {
        self.live_count
    }

    /// Returns the number of slots available to allocate.
    #[inline]
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.recycled.len() + (self.slot_count() - self.next_fresh)
    }

    /// Returns true if the next allocation would fail.
    #[inline]
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.free_count() == 0
    }

    /// Returns true if `handle` names a live slot.
    #[inline]
    #[must_use]
    pub fn is_live(&self, handle: PoolHandle) -> bool {
        self.live.get(handle.index).copied().unwrap_or(false)
    }

    /// Allocates one slot.
    ///
    /// This is a **O(1)** operation with **zero heap allocations**.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError::PoolExhausted`] when no slot is available. The
    /// pool and the tracker are left untouched in that case.
    pub fn allocate_slot(&mut self, tracker: &mut AllocationTracker) -> AllocResult<PoolHandle> {
        let index = if let Some(index) = self.recycled.pop() {
            index
        } else if self.next_fresh < self.slot_count() {
            let index = self.next_fresh;
            self.next_fresh += 1;
            index
        } else {
            return Err(AllocError::PoolExhausted {
                slot_count: self.slot_count(),
            });
        };

        debug_assert!(!self.live[index], "slot {index} handed out twice");
        self.live[index] = true;
        self.live_count += 1;
        tracker.record_alloc(self.slot_size());

        Ok(PoolHandle { index })
    }

    /// Returns a slot to the free list.
    ///
    /// This is a **O(1)** operation with **zero heap deallocations**.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError::SlotOutOfRange`] or [`AllocError::SlotNotLive`]
    /// if the handle does not name a live slot; nothing is recorded then.
    pub fn free_slot(
        &mut self,
        handle: PoolHandle,
        tracker: &mut AllocationTracker,
    ) -> AllocResult<()> {
        let slot_count = self.slot_count();
        let live = self
            .live
            .get_mut(handle.index)
            .ok_or(AllocError::SlotOutOfRange {
                index: handle.index,
                slot_count,
            })?;
        if !*live {
            return Err(AllocError::SlotNotLive {
                index: handle.index,
            });
        }

        *live = false;
        self.recycled.push(handle.index);
        self.live_count -= 1;
        tracker.record_dealloc(self.slot_size());

        Ok(())
    }

    /// Bytes of a live slot.
    #[inline]
    #[must_use]
    pub fn slot(&self, handle: PoolHandle) -> Option<&[u8]> {
        if !self.is_live(handle) {
            return None;
        }
        self.arena.slot(handle.index)
    }

    /// Mutable bytes of a live slot.
    #[inline]
    pub fn slot_mut(&mut self, handle: PoolHandle) -> Option<&mut [u8]> {
        if !self.is_live(handle) {
            return None;
        }
        self.arena.slot_mut(handle.index)
    }

    /// Slot indices available to allocate, in the order they will be issued.
    pub fn free_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.recycled
            .iter()
            .rev()
            .copied()
            .chain(self.next_fresh..self.slot_count())
    }

    /// Slot indices currently live, ascending.
    pub fn live_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.live
            .iter()
            .enumerate()
            .filter_map(|(index, &live)| live.then_some(index))
    }

    /// Forgets every allocation and zeroes the arena.
    ///
    /// Outstanding handles become invalid. Trackers that recorded them are
    /// not updated; start a fresh tracker after a reset.
    pub fn reset(&mut self) {
        self.live.fill(false);
        self.recycled.clear();
        self.next_fresh = 0;
        self.live_count = 0;
        self.arena.zero();
    }
}

impl Allocator for SlotPool {
    type Handle = PoolHandle;

    fn mode(&self) -> AllocMode {
        AllocMode::Optimized
    }

    fn fixed_size(&self) -> Option<usize> {
        Some(self.slot_size())
    }

    fn allocate(&mut self, _size: usize, tracker: &mut AllocationTracker) -> AllocResult<PoolHandle> {
        self.allocate_slot(tracker)
    }

    fn free(
        &mut self,
        handle: PoolHandle,
        _size: usize,
        tracker: &mut AllocationTracker,
    ) -> AllocResult<()> {
        self.free_slot(handle, tracker)
    }

    fn recorded_size(&self, _handle: &PoolHandle) -> usize {
        self.slot_size()
    }

    fn live_count(&self) -> usize {
        self.live_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> AllocationTracker {
        AllocationTracker::new(AllocMode::Optimized)
    }

    /// Free and live together cover every slot exactly once.
    fn assert_partition(pool: &SlotPool) {
        let mut seen = vec![0u8; pool.slot_count()];
        for index in pool.free_slots().chain(pool.live_slots()) {
            seen[index] += 1;
        }
        assert!(seen.iter().all(|&count| count == 1), "partition broken: {seen:?}");
        assert_eq!(pool.free_count() + pool.live_count(), pool.slot_count());
    }

    #[test]
    fn test_pool_allocate_free() {
        let mut tracker = tracker();
        let mut pool = SlotPool::new(10, 64).unwrap();

        let h1 = pool.allocate_slot(&mut tracker).unwrap();
        assert_eq!(pool.live_count(), 1);
        assert_eq!(tracker.total_bytes(), 64);

        pool.free_slot(h1, &mut tracker).unwrap();
        assert_eq!(pool.live_count(), 0);
        assert!(tracker.is_balanced());
        assert_partition(&pool);
    }

    #[test]
    fn test_fresh_slots_issued_in_index_order() {
        let mut tracker = tracker();
        let mut pool = SlotPool::new(4, 64).unwrap();

        let indices: Vec<usize> = (0..4)
            .map(|_| pool.allocate_slot(&mut tracker).unwrap().index())
            .collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_pool_full() {
        let mut tracker = tracker();
        let mut pool = SlotPool::new(2, 64).unwrap();

        let _ = pool.allocate_slot(&mut tracker).unwrap();
        let _ = pool.allocate_slot(&mut tracker).unwrap();
        let before = tracker.clone();

        assert_eq!(
            pool.allocate_slot(&mut tracker),
            Err(AllocError::PoolExhausted { slot_count: 2 })
        );
        assert_eq!(tracker, before);
        assert_eq!(pool.live_count(), 2);
        assert_partition(&pool);
    }

    #[test]
    fn test_pool_reuse_is_lifo() {
        let mut tracker = tracker();
        let mut pool = SlotPool::new(8, 64).unwrap();

        let handles: Vec<PoolHandle> = (0..5)
            .map(|_| pool.allocate_slot(&mut tracker).unwrap())
            .collect();
        pool.free_slot(handles[1], &mut tracker).unwrap();
        pool.free_slot(handles[3], &mut tracker).unwrap();
        assert_partition(&pool);

        // Most recently freed first, then the other recycled slot, then fresh.
        assert_eq!(pool.allocate_slot(&mut tracker).unwrap().index(), 3);
        assert_eq!(pool.allocate_slot(&mut tracker).unwrap().index(), 1);
        assert_eq!(pool.allocate_slot(&mut tracker).unwrap().index(), 5);
        assert_partition(&pool);
    }

    #[test]
    fn test_free_never_rewinds_fresh_cursor() {
        let mut tracker = tracker();
        let mut pool = SlotPool::new(3, 64).unwrap();

        let a = pool.allocate_slot(&mut tracker).unwrap();
        let _b = pool.allocate_slot(&mut tracker).unwrap();
        pool.free_slot(a, &mut tracker).unwrap();

        // Slot 0 recycled, slot 2 fresh; slot 1 is live and must not be reissued.
        let issued: Vec<usize> = (0..2)
            .map(|_| pool.allocate_slot(&mut tracker).unwrap().index())
            .collect();
        assert_eq!(issued, vec![0, 2]);
        assert!(pool.is_exhausted());
        assert_partition(&pool);
    }

    #[test]
    fn test_double_free_rejected() {
        let mut tracker = tracker();
        let mut pool = SlotPool::new(2, 64).unwrap();

        let h = pool.allocate_slot(&mut tracker).unwrap();
        pool.free_slot(h, &mut tracker).unwrap();
        let before = tracker.clone();

        assert_eq!(
            pool.free_slot(h, &mut tracker),
            Err(AllocError::SlotNotLive { index: h.index() })
        );
        assert_eq!(tracker, before);
        assert_eq!(pool.free_count(), 2);
        assert_partition(&pool);
    }

    #[test]
    fn test_out_of_range_handle_rejected() {
        let mut tracker = tracker();
        let mut pool = SlotPool::new(2, 64).unwrap();

        let bogus = PoolHandle { index: 7 };
        assert_eq!(
            pool.free_slot(bogus, &mut tracker),
            Err(AllocError::SlotOutOfRange {
                index: 7,
                slot_count: 2
            })
        );
    }

    #[test]
    fn test_slot_storage_is_writable() {
        let mut tracker = tracker();
        let mut pool = SlotPool::new(4, 64).unwrap();

        let h = pool.allocate_slot(&mut tracker).unwrap();
        pool.slot_mut(h).unwrap().fill(0x5A);
        assert!(pool.slot(h).unwrap().iter().all(|&b| b == 0x5A));
        assert_eq!(pool.slot(h).unwrap().len(), 64);

        pool.free_slot(h, &mut tracker).unwrap();
        assert!(pool.slot(h).is_none());
    }

    #[test]
    fn test_reset_restores_init_state() {
        let mut tracker = tracker();
        let mut pool = SlotPool::new(4, 64).unwrap();

        for _ in 0..3 {
            let _ = pool.allocate_slot(&mut tracker).unwrap();
        }
        pool.reset();

        assert_eq!(pool.live_count(), 0);
        assert_eq!(pool.free_slots().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        assert_partition(&pool);
    }

    #[test]
    fn test_allocator_trait_accounts_slot_size() {
        let mut tracker = tracker();
        let mut pool = SlotPool::new(4, 64).unwrap();

        let h = Allocator::allocate(&mut pool, 200, &mut tracker).unwrap();
        assert_eq!(tracker.total_bytes(), 64);
        assert_eq!(pool.recorded_size(&h), 64);
        assert_eq!(pool.fixed_size(), Some(64));

        Allocator::free(&mut pool, h, 17, &mut tracker).unwrap();
        assert!(tracker.is_balanced());
    }

    #[test]
    fn test_invalid_geometry_rejected() {
        assert!(SlotPool::new(0, 64).is_err());
        assert!(SlotPool::new(4, 0).is_err());
        assert!(SlotPool::new(usize::MAX, 64).is_err());
    }

    #[test]
    fn test_oversized_pool_fails_without_aborting() {
        // Geometry fits in usize but exceeds what any allocation may hold.
        let slot_count = usize::MAX / 64;
        assert!(matches!(
            SlotPool::new(slot_count, 64),
            Err(AllocError::HeapExhausted { .. })
        ));
    }
}
