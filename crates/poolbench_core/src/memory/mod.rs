//! # Memory Management
//!
//! The two strategies under comparison and the trait the harness drives
//! them through.
//!
//! ## Strategies
//!
//! - [`HeapAllocator`] - every request goes to the general-purpose heap
//! - [`SlotPool`] - all memory allocated once, fixed slots recycled forever

mod arena;
mod heap;
mod pool;

pub use arena::SlotArena;
pub use heap::{HeapAllocator, HeapBlock};
pub use pool::{PoolHandle, SlotPool, DEFAULT_SLOT_SIZE};

use crate::error::AllocResult;
use crate::tracker::{AllocMode, AllocationTracker};

/// An allocator the benchmark harness can churn.
///
/// Every successful `allocate` and every `free` is reported to the tracker
/// passed in, so both strategies are instrumented identically.
pub trait Allocator {
    /// Opaque handle to one live allocation.
    type Handle;

    /// Strategy tag used for reporting.
    fn mode(&self) -> AllocMode;

    /// Size of every allocation, or `None` if the caller chooses sizes.
    fn fixed_size(&self) -> Option<usize>;

    /// Allocates `size` bytes. Fixed-size allocators ignore `size`.
    ///
    /// # Errors
    ///
    /// Returns an error if the strategy has no memory left to give.
    fn allocate(
        &mut self,
        size: usize,
        tracker: &mut AllocationTracker,
    ) -> AllocResult<Self::Handle>;

    /// Frees `handle`, recording `size` bytes with the tracker.
    ///
    /// Fixed-size allocators always record their slot size.
    ///
    /// # Errors
    ///
    /// Returns an error if `handle` does not name a live allocation.
    fn free(
        &mut self,
        handle: Self::Handle,
        size: usize,
        tracker: &mut AllocationTracker,
    ) -> AllocResult<()>;

    /// Size actually allocated behind `handle`.
    fn recorded_size(&self, handle: &Self::Handle) -> usize;

    /// Number of allocations currently live.
    fn live_count(&self) -> usize;
}
