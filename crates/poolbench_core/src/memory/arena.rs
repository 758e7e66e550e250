//! # Slot Arena
//!
//! One contiguous buffer carved into equally sized slots.

use crate::error::{AllocError, AllocResult};

/// A fixed-capacity byte arena divided into `slot_count` slots.
///
/// The storage is allocated once in [`SlotArena::new`] and never resized.
/// Trailing bytes that do not fill a whole slot are unused.
///
/// # Thread Safety
///
/// This arena is NOT thread-safe. Use one arena per thread.
///
/// # Example
///
/// ```rust,ignore
/// let arena = SlotArena::new(160 * 64, 64)?;
/// assert_eq!(arena.slot_count(), 160);
/// ```
pub struct SlotArena {
    /// The backing storage.
    storage: Box<[u8]>,
    /// Size of one slot in bytes.
    slot_size: usize,
    /// Number of whole slots in `storage`.
    slot_count: usize,
}

impl SlotArena {
    /// Creates an arena of `capacity` bytes split into `slot_size` slots.
    ///
    /// # Errors
    ///
    /// Returns [`AllocError::InvalidLayout`] if `slot_size` is zero or the
    /// capacity cannot hold a single slot, and [`AllocError::HeapExhausted`]
    /// if the backing buffer cannot be reserved.
    pub fn new(capacity: usize, slot_size: usize) -> AllocResult<Self> {
        if slot_size == 0 || capacity < slot_size {
            return Err(AllocError::InvalidLayout {
                capacity,
                slot_size,
            });
        }

        let mut storage = Vec::new();
        storage
            .try_reserve_exact(capacity)
            .map_err(|_| AllocError::HeapExhausted { size: capacity })?;
        storage.resize(capacity, 0);
        Ok(Self {
            storage: storage.into_boxed_slice(),
            slot_size,
            slot_count: capacity / slot_size,
        })
    }

    /// Returns the total capacity in bytes.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Returns the size of one slot in bytes.
    #[inline]
    #[must_use]
    pub const fn slot_size(&self) -> usize {
        self.slot_size
    }

    /// Returns the number of slots.
    #[inline]
    #[must_use]
    pub const fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Byte offset of slot `index` from the start of the arena.
    #[inline]
    #[must_use]
    pub const fn offset_of(&self, index: usize) -> usize {
        index * self.slot_size
    }

    /// Returns the bytes of slot `index`.
    #[inline]
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&[u8]> {
        if index >= self.slot_count {
            return None;
        }
        let start = self.offset_of(index);
        self.storage.get(start..start + self.slot_size)
    }

    /// Returns the bytes of slot `index` mutably.
    #[inline]
    pub fn slot_mut(&mut self, index: usize) -> Option<&mut [u8]> {
        if index >= self.slot_count {
            return None;
        }
        let start = self.offset_of(index);
        let end = start + self.slot_size;
        self.storage.get_mut(start..end)
    }

    /// Zeroes every byte of the arena. No memory is freed or reallocated.
    pub fn zero(&mut self) {
        self.storage.fill(0);
    }
}
