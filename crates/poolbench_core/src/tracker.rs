//! # Allocation Tracker
//!
//! Bytes-outstanding and live-count bookkeeping shared by every allocator.
//!
//! The tracker trusts its callers: `record_dealloc` subtracts whatever size it
//! is handed. It cannot tell whether that size matches the original
//! allocation.

use std::fmt;

/// Which allocation strategy a tracker is instrumenting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AllocMode {
    /// General-purpose heap allocation with random sizes.
    Fragmented,
    /// Fixed-size slots recycled through a free list.
    Optimized,
}

impl AllocMode {
    /// Report label for this mode.
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Fragmented => "Fragmented",
            Self::Optimized => "Optimized",
        }
    }
}

impl fmt::Display for AllocMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accumulates live bytes and live allocation count for one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllocationTracker {
    /// Sum of sizes of live allocations.
    total_bytes: u64,
    /// Number of live allocations.
    active_count: u64,
    /// Highest `total_bytes` observed.
    peak_bytes: u64,
    /// Highest `active_count` observed.
    peak_active: u64,
    /// Allocations recorded over the tracker's lifetime.
    total_allocs: u64,
    /// Deallocations recorded over the tracker's lifetime.
    total_frees: u64,
    /// Strategy being tracked.
    mode: AllocMode,
}

impl AllocationTracker {
    /// Creates an empty tracker for the given mode.
    #[must_use]
    pub const fn new(mode: AllocMode) -> Self {
        Self {
            total_bytes: 0,
            active_count: 0,
            peak_bytes: 0,
            peak_active: 0,
            total_allocs: 0,
            total_frees: 0,
            mode,
        }
    }

    /// Records a new live allocation of `size` bytes.
    #[inline]
    pub fn record_alloc(&mut self, size: usize) {
        self.total_bytes = self.total_bytes.saturating_add(size as u64);
        self.active_count += 1;
        self.total_allocs += 1;
        self.peak_bytes = self.peak_bytes.max(self.total_bytes);
        self.peak_active = self.peak_active.max(self.active_count);
    }

    /// Records a deallocation of `size` bytes.
    ///
    /// Both counters saturate at zero. A caller that reports the wrong size
    /// skews `total_bytes` without any error being raised.
    #[inline]
    pub fn record_dealloc(&mut self, size: usize) {
        self.total_bytes = self.total_bytes.saturating_sub(size as u64);
        self.active_count = self.active_count.saturating_sub(1);
        self.total_frees += 1;
    }

    /// Captures the current counters under `label`.
    #[must_use]
    pub fn snapshot(&self, label: impl Into<String>) -> TrackerSnapshot {
        TrackerSnapshot {
            label: label.into(),
            total_bytes: self.total_bytes,
            active_count: self.active_count,
        }
    }

    /// Bytes currently outstanding.
    #[inline]
    #[must_use]
    pub const fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Allocations currently outstanding.
    #[inline]
    #[must_use]
    pub const fn active_count(&self) -> u64 {
        self.active_count
    }

    /// High-water mark of outstanding bytes.
    #[inline]
    #[must_use]
    pub const fn peak_bytes(&self) -> u64 {
        self.peak_bytes
    }

    /// High-water mark of outstanding allocations.
    #[inline]
    #[must_use]
    pub const fn peak_active(&self) -> u64 {
        self.peak_active
    }

    /// Allocations recorded so far.
    #[inline]
    #[must_use]
    pub const fn total_allocs(&self) -> u64 {
        self.total_allocs
    }

    /// Deallocations recorded so far.
    #[inline]
    #[must_use]
    pub const fn total_frees(&self) -> u64 {
        self.total_frees
    }

    /// Strategy being tracked.
    #[inline]
    #[must_use]
    pub const fn mode(&self) -> AllocMode {
        self.mode
    }

    /// True when nothing is outstanding.
    #[inline]
    #[must_use]
    pub const fn is_balanced(&self) -> bool {
        self.total_bytes == 0 && self.active_count == 0
    }
}

/// Point-in-time view of a tracker, tagged with a report label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackerSnapshot {
    /// Report label, e.g. `Optimized [Iter 1000]`.
    pub label: String,
    /// Bytes outstanding when the snapshot was taken.
    pub total_bytes: u64,
    /// Allocations outstanding when the snapshot was taken.
    pub active_count: u64,
}

impl fmt::Display for TrackerSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - Total allocd: {} bytes, Active allocs: {}",
            self.label, self.total_bytes, self.active_count
        )
    }
}
