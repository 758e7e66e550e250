//! # Benchmark Error Types

use std::path::PathBuf;

use poolbench_core::AllocError;
use thiserror::Error;

/// Errors that can abort a benchmark.
#[derive(Error, Debug)]
pub enum BenchError {
    /// An allocator failed in a way the run cannot absorb.
    #[error(transparent)]
    Alloc(#[from] AllocError),

    /// Writing the report failed.
    #[error("report output failed: {0}")]
    Io(#[from] std::io::Error),

    /// The config file could not be read.
    #[error("could not read config {path}: {source}")]
    ConfigRead {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`crate::BenchConfig`].
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The config parsed but describes an impossible benchmark.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for benchmark operations.
pub type BenchResult<T> = Result<T, BenchError>;
