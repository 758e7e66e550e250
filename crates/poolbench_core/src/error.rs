//! # Allocation Error Types
//!
//! All errors that can occur while allocating or freeing.

use thiserror::Error;

/// Errors that can occur in the allocators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
    /// The pool has no free slot left. Non-fatal: the run stops allocating.
    #[error("pool exhausted: all {slot_count} slots are live")]
    PoolExhausted {
        /// Total number of slots in the pool.
        slot_count: usize,
    },

    /// The general-purpose heap refused a request. Fatal for the process.
    #[error("heap exhausted: could not allocate {size} bytes")]
    HeapExhausted {
        /// Size of the failed request in bytes.
        size: usize,
    },

    /// A handle was freed whose slot is not currently live.
    #[error("slot {index} is not live")]
    SlotNotLive {
        /// Slot index carried by the handle.
        index: usize,
    },

    /// A handle points past the end of the arena.
    #[error("slot {index} out of range: pool has {slot_count} slots")]
    SlotOutOfRange {
        /// Slot index carried by the handle.
        index: usize,
        /// Total number of slots in the pool.
        slot_count: usize,
    },

    /// Arena geometry cannot hold a single slot.
    #[error("invalid arena layout: capacity {capacity} bytes, slot size {slot_size} bytes")]
    InvalidLayout {
        /// Requested arena capacity in bytes.
        capacity: usize,
        /// Requested slot size in bytes.
        slot_size: usize,
    },
}

impl AllocError {
    /// Returns true if the error only ends the current run.
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::PoolExhausted { .. })
    }
}

/// Result type for allocator operations.
pub type AllocResult<T> = Result<T, AllocError>;
