//! # Churn Runner
//!
//! Drives one allocator through the randomized allocate/free workload:
//!
//! 1. Allocate (a random size for the heap, one slot for the pool)
//! 2. If more than `churn_threshold` allocations are live, free a random one
//! 3. Every `report_interval` steps, print a tracker snapshot
//!
//! After the last step every remaining allocation is freed and the wall-clock
//! time of the whole run, drain included, is printed.

use std::io::Write;
use std::time::{Duration, Instant};

use poolbench_core::{
    AllocMode, AllocationTracker, Allocator, HeapAllocator, SizeRange, SlotPool, TrackerSnapshot,
    Workload,
};

use crate::config::{AccountingPolicy, BenchConfig};
use crate::error::BenchResult;

/// Line printed when the pool runs out of slots.
pub const POOL_EXHAUSTED_LINE: &str = "Pool exhausted!";

/// What happened during one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    /// Strategy that was run.
    pub mode: AllocMode,
    /// Allocation steps that succeeded.
    pub steps_completed: usize,
    /// True if the run ended early because the pool was empty.
    pub exhausted: bool,
    /// Allocations freed by the churn policy.
    pub evictions: usize,
    /// Largest live set observed.
    pub peak_live: usize,
    /// Live allocations left when the loop ended, before the drain.
    pub live_at_end: usize,
    /// Tracker state after the drain.
    pub final_snapshot: TrackerSnapshot,
    /// Wall-clock time of the whole run.
    pub elapsed: Duration,
}

/// Runs allocators through the churn workload described by a config.
pub struct BenchmarkRunner<'a> {
    config: &'a BenchConfig,
}

impl<'a> BenchmarkRunner<'a> {
    /// Creates a runner for `config`.
    #[must_use]
    pub const fn new(config: &'a BenchConfig) -> Self {
        Self { config }
    }

    /// Runs `allocator` for up to `iterations` steps, writing the report to
    /// `out`.
    ///
    /// Pool exhaustion ends the loop early and is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BenchError::InvalidConfig`] before touching the
    /// allocator if the config fails [`BenchConfig::validate`]. Otherwise
    /// returns any non-recoverable allocator error (heap exhaustion, a free
    /// of a handle that is not live) and any failure to write `out`.
    pub fn run<A, W, O>(
        &self,
        allocator: &mut A,
        tracker: &mut AllocationTracker,
        workload: &mut W,
        out: &mut O,
    ) -> BenchResult<RunReport>
    where
        A: Allocator,
        W: Workload + ?Sized,
        O: Write,
    {
        self.config.validate()?;
        let range = self.config.size_range()?;
        let mode = allocator.mode();
        let label = mode.label();
        let threshold = self.config.churn_threshold;
        let span = tracing::info_span!("run", mode = label, iterations = self.config.iterations);
        let _guard = span.enter();

        let start = Instant::now();
        let mut live: Vec<A::Handle> = Vec::with_capacity(threshold.saturating_add(1));
        let mut steps_completed = 0;
        let mut exhausted = false;
        let mut evictions = 0;
        let mut peak_live = 0;

        for step in 0..self.config.iterations {
            let size = allocator
                .fixed_size()
                .unwrap_or_else(|| workload.draw_size(range));

            match allocator.allocate(size, tracker) {
                Ok(handle) => live.push(handle),
                Err(err) if err.is_recoverable() => {
                    writeln!(out, "{POOL_EXHAUSTED_LINE}")?;
                    tracing::warn!(step, live = live.len(), "{err}");
                    exhausted = true;
                    break;
                }
                Err(err) => {
                    tracing::error!(step, size, "{err}");
                    return Err(err.into());
                }
            }
            steps_completed += 1;
            peak_live = peak_live.max(live.len());

            if live.len() > threshold {
                let victim = live.swap_remove(workload.draw_index(live.len()));
                self.release(allocator, victim, range, tracker, workload)?;
                evictions += 1;
                tracing::trace!(step, live = live.len(), "churn eviction");
            }

            if step % self.config.report_interval == 0 {
                let snapshot = tracker.snapshot(format!("{label} [Iter {step}]"));
                writeln!(out, "{snapshot}")?;
            }
            debug_assert_eq!(allocator.live_count(), live.len());
        }

        let live_at_end = live.len();
        for handle in live.drain(..) {
            self.release(allocator, handle, range, tracker, workload)?;
        }
        debug_assert_eq!(allocator.live_count(), 0);

        let elapsed = start.elapsed();
        writeln!(out, "{label} Time: {} ms", elapsed.as_millis())?;

        debug_assert!(
            self.config.accounting != AccountingPolicy::Exact || tracker.is_balanced(),
            "exact accounting left {} bytes outstanding",
            tracker.total_bytes()
        );

        let report = RunReport {
            mode,
            steps_completed,
            exhausted,
            evictions,
            peak_live,
            live_at_end,
            final_snapshot: tracker.snapshot(label),
            elapsed,
        };
        tracing::info!(
            steps = report.steps_completed,
            evictions = report.evictions,
            peak_live = report.peak_live,
            peak_bytes = tracker.peak_bytes(),
            elapsed_ms = u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
            "run finished"
        );
        Ok(report)
    }

    /// Frees one live allocation, choosing the accounted size per policy.
    fn release<A, W>(
        &self,
        allocator: &mut A,
        handle: A::Handle,
        range: SizeRange,
        tracker: &mut AllocationTracker,
        workload: &mut W,
    ) -> BenchResult<()>
    where
        A: Allocator,
        W: Workload + ?Sized,
    {
        let size = match (self.config.accounting, allocator.fixed_size()) {
            (AccountingPolicy::RandomDraw, None) => workload.draw_size(range),
            _ => allocator.recorded_size(&handle),
        };
        allocator.free(handle, size, tracker)?;
        Ok(())
    }

    /// Runs the heap baseline with a fresh allocator and tracker.
    ///
    /// # Errors
    ///
    /// See [`BenchmarkRunner::run`].
    pub fn run_fragmented<W, O>(&self, workload: &mut W, out: &mut O) -> BenchResult<RunReport>
    where
        W: Workload + ?Sized,
        O: Write,
    {
        let mut tracker = AllocationTracker::new(AllocMode::Fragmented);
        let mut heap = HeapAllocator::new();
        let report = self.run(&mut heap, &mut tracker, workload, out)?;
        if heap.mismatched_frees() > 0 {
            tracing::debug!(
                mismatched = heap.mismatched_frees(),
                "heap frees accounted with drawn sizes"
            );
        }
        Ok(report)
    }

    /// Runs the slot pool with a fresh pool and tracker.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BenchError::InvalidConfig`] before building the pool
    /// if the config fails [`BenchConfig::validate`], plus anything
    /// [`BenchmarkRunner::run`] returns.
    pub fn run_optimized<W, O>(&self, workload: &mut W, out: &mut O) -> BenchResult<RunReport>
    where
        W: Workload + ?Sized,
        O: Write,
    {
        self.config.validate()?;
        let mut tracker = AllocationTracker::new(AllocMode::Optimized);
        let mut pool = SlotPool::new(self.config.pool_slots(), self.config.slot_size)?;
        self.run(&mut pool, &mut tracker, workload, out)
    }
}
