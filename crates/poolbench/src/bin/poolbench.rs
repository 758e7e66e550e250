//! # POOLBENCH
//!
//! Runs the fragmented and the pooled allocator through the same churn and
//! prints allocation counts, bytes outstanding and wall-clock time.
//!
//! Usage: `poolbench [config.toml]`

use std::io::{self, Write};
use std::process::ExitCode;

use poolbench::{logging, run_comparison, BenchConfig};

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 2 || args.iter().skip(1).any(|a| a == "--help" || a == "-h") {
        println!("Usage: poolbench [config.toml]");
        println!();
        println!("Without a config file the built-in defaults are used:");
        println!("  10000 iterations, 64-byte slots, churn above 50 live allocations.");
        println!("Set RUST_LOG to see diagnostics on stderr.");
        return if args.len() > 2 {
            ExitCode::from(2)
        } else {
            ExitCode::SUCCESS
        };
    }

    let config = match args.get(1) {
        Some(path) => match BenchConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("poolbench: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => BenchConfig::default(),
    };

    logging::init(config.log_filter.as_deref());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = run_comparison(&config, &mut out).and_then(|comparison| {
        out.flush()?;
        Ok(comparison)
    });

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("poolbench: {e}");
            ExitCode::FAILURE
        }
    }
}
