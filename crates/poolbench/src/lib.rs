//! # POOLBENCH
//!
//! Fragmented heap allocation vs. a pooled free list, under the same
//! randomized churn.
//!
//! ## Flow
//!
//! ```text
//! ┌──────────────┐   sizes, victims   ┌─────────────────┐
//! │   Workload   │───────────────────>│ BenchmarkRunner │──> stdout report
//! │  (one seed)  │                    └────────┬────────┘
//! └──────────────┘                             │ allocate / free
//!                          ┌───────────────────┴───────────────────┐
//!                          v                                       v
//!                 ┌─────────────────┐                     ┌─────────────────┐
//!                 │  HeapAllocator  │                     │    SlotPool     │
//!                 │  (Fragmented)   │                     │   (Optimized)   │
//!                 └────────┬────────┘                     └────────┬────────┘
//!                          └──────────> AllocationTracker <────────┘
//! ```
//!
//! The two runs share one workload stream: the optimized run continues
//! where the fragmented run stopped unless `reseed_between_runs` is set.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod logging;
pub mod runner;

use std::io::Write;

use poolbench_core::{SeededWorkload, Workload};

pub use config::{AccountingPolicy, BenchConfig};
pub use error::{BenchError, BenchResult};
pub use poolbench_core as core;
pub use runner::{BenchmarkRunner, RunReport, POOL_EXHAUSTED_LINE};

/// Reports of both runs of one comparison.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comparison {
    /// Heap baseline run.
    pub fragmented: RunReport,
    /// Slot pool run.
    pub optimized: RunReport,
}

/// Runs both strategies back to back over one shared workload stream.
///
/// # Errors
///
/// Returns the first fatal error of either run.
pub fn compare<O: Write>(
    config: &BenchConfig,
    workload: &mut dyn Workload,
    out: &mut O,
) -> BenchResult<Comparison> {
    compare_streams(config, workload, None, out)
}

/// Runs both strategies; the optimized run uses `second` when given.
fn compare_streams<'w, O: Write>(
    config: &BenchConfig,
    first: &'w mut dyn Workload,
    second: Option<&'w mut dyn Workload>,
    out: &mut O,
) -> BenchResult<Comparison> {
    let runner = BenchmarkRunner::new(config);

    writeln!(out, "Running Fragmented Version...")?;
    let fragmented = runner.run_fragmented(&mut *first, out)?;

    writeln!(out)?;
    writeln!(out, "Running Optimized Version...")?;
    let workload = second.unwrap_or(first);
    let optimized = runner.run_optimized(workload, out)?;

    Ok(Comparison {
        fragmented,
        optimized,
    })
}

/// Runs the full comparison described by `config`.
///
/// Builds the workload from `config.seed` (entropy if unset). With
/// `reseed_between_runs`, the optimized run gets a fresh stream built the
/// same way; otherwise it continues the fragmented run's stream.
///
/// # Errors
///
/// Returns [`BenchError::InvalidConfig`] for an invalid config and the first
/// fatal error of either run.
pub fn run_comparison<O: Write>(config: &BenchConfig, out: &mut O) -> BenchResult<Comparison> {
    config.validate()?;

    let mut workload = SeededWorkload::new(config.seed);
    tracing::info!(seed = ?workload.seed(), iterations = config.iterations, "starting comparison");

    let mut reseeded = config
        .reseed_between_runs
        .then(|| SeededWorkload::new(config.seed));
    let comparison = compare_streams(
        config,
        &mut workload,
        reseeded.as_mut().map(|w| w as &mut dyn Workload),
        out,
    )?;

    tracing::info!(
        fragmented_ms = u64::try_from(comparison.fragmented.elapsed.as_millis()).unwrap_or(u64::MAX),
        optimized_ms = u64::try_from(comparison.optimized.elapsed.as_millis()).unwrap_or(u64::MAX),
        pool_exhausted = comparison.optimized.exhausted,
        "comparison finished"
    );
    Ok(comparison)
}
