//! # Workload Stream
//!
//! The pseudo-random source behind every size and eviction choice.
//!
//! The orchestrator builds ONE stream and lends it to each run in turn, so
//! the second run continues wherever the first one stopped. Reseed between
//! runs to make them independently reproducible.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Smallest allocation size drawn by default.
pub const DEFAULT_MIN_SIZE: usize = 16;

/// Largest allocation size drawn by default.
pub const DEFAULT_MAX_SIZE: usize = 256;

/// Closed interval of allocation sizes in bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizeRange {
    /// Inclusive lower bound.
    pub min: usize,
    /// Inclusive upper bound.
    pub max: usize,
}

impl SizeRange {
    /// Creates a size range, returning `None` when `min > max`.
    #[must_use]
    pub const fn new(min: usize, max: usize) -> Option<Self> {
        if min > max {
            None
        } else {
            Some(Self { min, max })
        }
    }

    /// True if `size` lies inside the range.
    #[inline]
    #[must_use]
    pub const fn contains(&self, size: usize) -> bool {
        size >= self.min && size <= self.max
    }
}

impl Default for SizeRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN_SIZE,
            max: DEFAULT_MAX_SIZE,
        }
    }
}

/// A producer of uniformly distributed unsigned integers.
///
/// Implementors must return values inside `[lo, hi]`.
pub trait Workload {
    /// Draws one value from the closed interval `[lo, hi]`.
    fn draw(&mut self, lo: u64, hi: u64) -> u64;

    /// Draws an allocation size from `range`.
    fn draw_size(&mut self, range: SizeRange) -> usize {
        // usize -> u64 is lossless on every supported target
        let value = self.draw(range.min as u64, range.max as u64);
        usize::try_from(value).unwrap_or(range.max)
    }

    /// Draws an index into a collection of `len` elements.
    ///
    /// `len` must be non-zero.
    fn draw_index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "cannot pick from an empty collection");
        let hi = len.saturating_sub(1) as u64;
        usize::try_from(self.draw(0, hi)).unwrap_or(0)
    }

    /// Lazy, endless iterator of draws from `[lo, hi]`.
    fn stream(&mut self, lo: u64, hi: u64) -> Draws<'_, Self>
    where
        Self: Sized,
    {
        Draws {
            source: self,
            lo,
            hi,
        }
    }
}

impl<W: Workload + ?Sized> Workload for &mut W {
    #[inline]
    fn draw(&mut self, lo: u64, hi: u64) -> u64 {
        (**self).draw(lo, hi)
    }
}

/// Endless iterator returned by [`Workload::stream`].
pub struct Draws<'a, W> {
    source: &'a mut W,
    lo: u64,
    hi: u64,
}

impl<W: Workload> Iterator for Draws<'_, W> {
    type Item = u64;

    #[inline]
    fn next(&mut self) -> Option<u64> {
        Some(self.source.draw(self.lo, self.hi))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

/// Orders a possibly inverted interval.
#[inline]
fn ordered(lo: u64, hi: u64) -> (u64, u64) {
    if lo <= hi {
        (lo, hi)
    } else {
        (hi, lo)
    }
}

/// ChaCha8-backed workload. Same seed = same sequence.
#[derive(Clone, Debug)]
pub struct SeededWorkload {
    rng: ChaCha8Rng,
    /// Seed used at construction, if one was given.
    seed: Option<u64>,
    /// Number of values drawn so far.
    drawn: u64,
}

impl SeededWorkload {
    /// Creates a workload from an explicit seed.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed: Some(seed),
            drawn: 0,
        }
    }

    /// Creates a workload seeded from OS entropy. Not reproducible.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
            seed: None,
            drawn: 0,
        }
    }

    /// Creates a workload from `seed` if given, otherwise from entropy.
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::from_seed)
    }

    /// Seed used at construction (`None` for entropy-seeded streams).
    #[inline]
    #[must_use]
    pub const fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Number of values drawn so far.
    #[inline]
    #[must_use]
    pub const fn drawn(&self) -> u64 {
        self.drawn
    }
}

impl Workload for SeededWorkload {
    #[inline]
    fn draw(&mut self, lo: u64, hi: u64) -> u64 {
        let (lo, hi) = ordered(lo, hi);
        self.drawn += 1;
        self.rng.gen_range(lo..=hi)
    }
}

/// Replays a fixed sequence of values, cycling when it runs out.
///
/// Values outside the requested interval are clamped into it. Useful for
/// pinning an exact size sequence in a scenario.
#[derive(Clone, Debug)]
pub struct ScriptedWorkload {
    values: Vec<u64>,
    position: usize,
}

impl ScriptedWorkload {
    /// Creates a scripted workload over `values`.
    #[must_use]
    pub fn new(values: impl Into<Vec<u64>>) -> Self {
        Self {
            values: values.into(),
            position: 0,
        }
    }

    /// Number of values consumed so far.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }
}

impl Workload for ScriptedWorkload {
    fn draw(&mut self, lo: u64, hi: u64) -> u64 {
        let (lo, hi) = ordered(lo, hi);
        if self.values.is_empty() {
            return lo;
        }
        let value = self.values[self.position % self.values.len()];
        self.position += 1;
        value.clamp(lo, hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_is_deterministic() {
        let mut a = SeededWorkload::from_seed(42);
        let mut b = SeededWorkload::from_seed(42);

        let left: Vec<u64> = a.stream(16, 256).take(100).collect();
        let right: Vec<u64> = b.stream(16, 256).take(100).collect();
        assert_eq!(left, right);
        assert_eq!(a.drawn(), 100);
        assert_eq!(a.seed(), Some(42));
    }

    #[test]
    fn test_draws_stay_in_range() {
        let mut workload = SeededWorkload::from_seed(7);
        let range = SizeRange::default();

        for _ in 0..10_000 {
            assert!(range.contains(workload.draw_size(range)));
        }
        for len in 1..200 {
            assert!(workload.draw_index(len) < len);
        }
    }

    #[test]
    fn test_shared_stream_continues() {
        let mut shared = SeededWorkload::from_seed(9);
        let first: Vec<u64> = shared.stream(0, 1000).take(5).collect();
        let second: Vec<u64> = shared.stream(0, 1000).take(5).collect();

        let mut fresh = SeededWorkload::from_seed(9);
        let all: Vec<u64> = fresh.stream(0, 1000).take(10).collect();
        assert_eq!(&all[..5], &first[..]);
        assert_eq!(&all[5..], &second[..]);
    }

    #[test]
    fn test_scripted_replays_and_clamps() {
        let mut workload = ScriptedWorkload::new(vec![20, 200, 16, 999]);
        let range = SizeRange::default();

        assert_eq!(workload.draw_size(range), 20);
        assert_eq!(workload.draw_size(range), 200);
        assert_eq!(workload.draw_size(range), 16);
        assert_eq!(workload.draw_size(range), 256);
        // Cycles.
        assert_eq!(workload.draw_size(range), 20);
        assert_eq!(workload.position(), 5);
    }

    #[test]
    fn test_size_range_rejects_inverted() {
        assert!(SizeRange::new(256, 16).is_none());
        assert_eq!(SizeRange::new(16, 256), Some(SizeRange::default()));
    }

    #[test]
    fn test_mut_ref_is_a_workload() {
        fn take_two<W: Workload>(mut w: W) -> (u64, u64) {
            (w.draw(0, 10), w.draw(0, 10))
        }

        let mut scripted = ScriptedWorkload::new(vec![3, 4]);
        assert_eq!(take_two(&mut scripted), (3, 4));
        assert_eq!(scripted.position(), 2);
    }
}
