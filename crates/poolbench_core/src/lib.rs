//! # POOLBENCH Core
//!
//! The allocators under comparison and the instruments shared by both:
//! - [`HeapAllocator`] - one general-purpose heap allocation per request
//! - [`SlotPool`] - a pre-allocated arena of fixed slots with a free list
//! - [`AllocationTracker`] - live bytes and live count, identical for both
//! - [`Workload`] - the deterministic stream sizes and evictions come from
//!
//! ## Example
//!
//! ```rust,ignore
//! use poolbench_core::{AllocMode, AllocationTracker, SlotPool};
//!
//! let mut tracker = AllocationTracker::new(AllocMode::Optimized);
//! let mut pool = SlotPool::new(10_000, 64)?;
//! let handle = pool.allocate_slot(&mut tracker)?;
//! pool.free_slot(handle, &mut tracker)?;
//! assert!(tracker.is_balanced());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod memory;
pub mod tracker;
pub mod workload;

pub use error::{AllocError, AllocResult};
pub use memory::{
    Allocator, HeapAllocator, HeapBlock, PoolHandle, SlotArena, SlotPool, DEFAULT_SLOT_SIZE,
};
pub use tracker::{AllocMode, AllocationTracker, TrackerSnapshot};
pub use workload::{
    Draws, ScriptedWorkload, SeededWorkload, SizeRange, Workload, DEFAULT_MAX_SIZE,
    DEFAULT_MIN_SIZE,
};
