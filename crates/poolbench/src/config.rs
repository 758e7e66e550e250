//! # Benchmark Configuration
//!
//! Loaded once at startup. Every field is optional in the TOML file; missing
//! fields take the built-in defaults, which reproduce the classic
//! 10 000-iteration comparison.
//!
//! ```toml
//! iterations = 10000
//! churn_threshold = 50
//! report_interval = 1000
//! min_size = 16
//! max_size = 256
//! slot_size = 64
//! pool_slots = 10000        # defaults to `iterations`
//! seed = 42                 # omit for an entropy seed
//! reseed_between_runs = false
//! accounting = "exact"      # or "random_draw"
//! log_filter = "poolbench=info"
//! ```

use std::path::Path;

use poolbench_core::{SizeRange, DEFAULT_MAX_SIZE, DEFAULT_MIN_SIZE, DEFAULT_SLOT_SIZE};
use serde::Deserialize;

use crate::error::{BenchError, BenchResult};

/// Default number of allocation steps per run.
pub const DEFAULT_ITERATIONS: usize = 10_000;

/// Default live-set size above which churn evicts.
pub const DEFAULT_CHURN_THRESHOLD: usize = 50;

/// Default snapshot cadence in steps.
pub const DEFAULT_REPORT_INTERVAL: usize = 1_000;

/// Which size a heap free is accounted with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountingPolicy {
    /// Account the size the block was really allocated with.
    #[default]
    Exact,
    /// Account a freshly drawn random size, as the classic benchmark did.
    ///
    /// Live bytes drift away from reality; live counts stay correct. Pool
    /// frees are unaffected and always account the slot size.
    RandomDraw,
}

/// Parameters of one comparison (both runs).
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenchConfig {
    /// Allocation steps per run.
    pub iterations: usize,
    /// Live-set size above which one random allocation is freed.
    pub churn_threshold: usize,
    /// A snapshot is printed every this many steps, starting at step 0.
    pub report_interval: usize,
    /// Smallest heap allocation in bytes.
    pub min_size: usize,
    /// Largest heap allocation in bytes.
    pub max_size: usize,
    /// Pool slot size in bytes.
    pub slot_size: usize,
    /// Pool slot count; `None` means one slot per iteration.
    pub pool_slots: Option<usize>,
    /// Workload seed; `None` seeds from OS entropy.
    pub seed: Option<u64>,
    /// Restart the workload stream before the second run.
    pub reseed_between_runs: bool,
    /// How heap frees are accounted.
    pub accounting: AccountingPolicy,
    /// Log filter used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            churn_threshold: DEFAULT_CHURN_THRESHOLD,
            report_interval: DEFAULT_REPORT_INTERVAL,
            min_size: DEFAULT_MIN_SIZE,
            max_size: DEFAULT_MAX_SIZE,
            slot_size: DEFAULT_SLOT_SIZE,
            pool_slots: None,
            seed: None,
            reseed_between_runs: false,
            accounting: AccountingPolicy::Exact,
            log_filter: None,
        }
    }
}

impl BenchConfig {
    /// Parses and validates a TOML config.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::ConfigParse`] for malformed TOML or unknown keys
    /// and [`BenchError::InvalidConfig`] if validation fails.
    pub fn from_toml_str(text: &str) -> BenchResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::ConfigRead`] if the file cannot be read, plus
    /// anything [`BenchConfig::from_toml_str`] returns.
    pub fn load(path: impl AsRef<Path>) -> BenchResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| BenchError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks that the config describes a runnable benchmark.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> BenchResult<()> {
        if self.iterations == 0 {
            return Err(invalid("iterations must be at least 1"));
        }
        if self.report_interval == 0 {
            return Err(invalid("report_interval must be at least 1"));
        }
        if self.slot_size == 0 {
            return Err(invalid("slot_size must be at least 1"));
        }
        if self.pool_slots == Some(0) {
            return Err(invalid("pool_slots must be at least 1"));
        }
        self.size_range()?;
        if self.pool_slots().checked_mul(self.slot_size).is_none() {
            return Err(invalid("pool_slots * slot_size overflows"));
        }
        Ok(())
    }

    /// Heap allocation size range.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::InvalidConfig`] if `min_size` exceeds `max_size`.
    pub fn size_range(&self) -> BenchResult<SizeRange> {
        SizeRange::new(self.min_size, self.max_size).ok_or_else(|| {
            BenchError::InvalidConfig(format!(
                "min_size {} exceeds max_size {}",
                self.min_size, self.max_size
            ))
        })
    }

    /// Effective pool slot count.
    #[must_use]
    pub fn pool_slots(&self) -> usize {
        self.pool_slots.unwrap_or(self.iterations)
    }
}

fn invalid(reason: &str) -> BenchError {
    BenchError::InvalidConfig(reason.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_classic_run() {
        let config = BenchConfig::default();
        assert_eq!(config.iterations, 10_000);
        assert_eq!(config.churn_threshold, 50);
        assert_eq!(config.report_interval, 1_000);
        assert_eq!(config.slot_size, 64);
        assert_eq!(config.pool_slots(), 10_000);
        assert_eq!(config.size_range().unwrap(), SizeRange::new(16, 256).unwrap());
        assert_eq!(config.accounting, AccountingPolicy::Exact);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(BenchConfig::from_toml_str("").unwrap(), BenchConfig::default());
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config = BenchConfig::from_toml_str(
            r#"
            iterations = 160
            seed = 7
            accounting = "random_draw"
            "#,
        )
        .unwrap();

        assert_eq!(config.iterations, 160);
        assert_eq!(config.pool_slots(), 160);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.accounting, AccountingPolicy::RandomDraw);
        assert_eq!(config.churn_threshold, 50);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = BenchConfig::from_toml_str("iters = 5").unwrap_err();
        assert!(matches!(err, BenchError::ConfigParse(_)));
    }

    #[test]
    fn test_invalid_values_rejected() {
        for text in [
            "iterations = 0",
            "report_interval = 0",
            "slot_size = 0",
            "pool_slots = 0",
            "min_size = 300",
        ] {
            let err = BenchConfig::from_toml_str(text).unwrap_err();
            assert!(matches!(err, BenchError::InvalidConfig(_)), "{text}: {err}");
        }
    }

    #[test]
    fn test_missing_file_reported() {
        let err = BenchConfig::load("/nonexistent/poolbench.toml").unwrap_err();
        assert!(matches!(err, BenchError::ConfigRead { .. }));
    }
}
