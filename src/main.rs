//! pillar-breaker command-line driver.
//!
//! # Commands
//! - `check`: load and validate a config file, print effective settings
//! - `simulate`: drive a synthetic flaky pillar through a breaker manager
//!   and print the resulting statistics

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rand::Rng;
use serde::Serialize;

use pillar_breaker::config::{load_config, BreakerSettings, ManagerConfig};
use pillar_breaker::observability::logging::init_tracing;
use pillar_breaker::resilience::{
    blocking, non_blocking, BreakerError, BreakerStatistics, CancellationToken, Operation, Protected,
};

#[derive(Parser)]
#[command(name = "pillar-breaker")]
#[command(about = "Circuit breaker driver for named pillars", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file and print effective settings
    Check,
    /// Run a synthetic workload against one pillar
    Simulate {
        /// Pillar name.
        #[arg(short, long, default_value = "simulated")]
        pillar: String,

        /// Number of logical calls to issue.
        #[arg(short = 'n', long, default_value_t = 20)]
        calls: u32,

        /// Probability that a single attempt fails, between 0 and 1.
        #[arg(short, long, default_value_t = 0.3, value_parser = parse_ratio)]
        failure_ratio: f64,

        /// Latency of each attempt in milliseconds.
        #[arg(short, long, default_value_t = 10)]
        latency_ms: u64,

        /// Pause between calls in milliseconds.
        #[arg(short, long, default_value_t = 50)]
        interval_ms: u64,

        /// Run the operation on the blocking pool.
        #[arg(long)]
        blocking: bool,
    },
}

#[derive(Debug, Default, Serialize)]
struct Outcomes {
    succeeded: u32,
    failed: u32,
    timed_out: u32,
    rejected: u32,
}

#[derive(Debug, Serialize)]
struct SimulationReport {
    outcomes: Outcomes,
    invocations: u64,
    open_circuits: Vec<String>,
    degraded_pillars: Vec<String>,
    statistics: BTreeMap<String, BreakerStatistics>,
}

#[derive(Debug, Serialize)]
struct CheckReport<'a> {
    defaults: &'a BreakerSettings,
    degraded_threshold: f64,
    pillars: BTreeMap<String, BreakerSettings>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ManagerConfig::default(),
    };

    init_tracing(&config.observability.log_level)?;

    match cli.command {
        Commands::Check => {
            let report = CheckReport {
                defaults: &config.defaults,
                degraded_threshold: config.degraded_threshold,
                pillars: config
                    .pillars
                    .iter()
                    .map(|p| (p.name.clone(), config.settings_for(&p.name)))
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Simulate {
            pillar,
            calls,
            failure_ratio,
            latency_ms,
            interval_ms,
            blocking: use_blocking,
        } => {
            let manager = config.build_manager();
            let invocations = Arc::new(AtomicU64::new(0));
            let latency = Duration::from_millis(latency_ms);

            let outcomes = if use_blocking {
                let counter = invocations.clone();
                let op = manager.protect(&pillar, None, blocking(move |cancel: CancellationToken| {
                    counter.fetch_add(1, Ordering::Relaxed);
                    std::thread::sleep(latency);
                    if cancel.is_cancelled() {
                        return Err("cancelled".to_string());
                    }
                    attempt_outcome(failure_ratio)
                }));
                drive(&op, calls, interval_ms).await
            } else {
                let counter = invocations.clone();
                let op = manager.protect(&pillar, None, non_blocking(move |_cancel| {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::Relaxed);
                        tokio::time::sleep(latency).await;
                        attempt_outcome(failure_ratio)
                    }
                }));
                drive(&op, calls, interval_ms).await
            };

            let report = SimulationReport {
                outcomes,
                invocations: invocations.load(Ordering::Relaxed),
                open_circuits: manager.get_open_circuits(),
                degraded_pillars: manager.get_degraded_pillars(config.degraded_threshold),
                statistics: manager.get_all_statistics(),
            };
            for stats in report.statistics.values() {
                tracing::info!("{}", stats.format_summary());
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn parse_ratio(s: &str) -> Result<f64, String> {
    let ratio: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if (0.0..=1.0).contains(&ratio) {
        Ok(ratio)
    } else {
        Err(format!("{ratio} is not between 0 and 1"))
    }
}

fn attempt_outcome(failure_ratio: f64) -> Result<u32, String> {
    let mut rng = rand::thread_rng();
    if rng.gen_bool(failure_ratio) {
        Err("synthetic failure".to_string())
    } else {
        Ok(rng.gen())
    }
}

async fn drive<O>(op: &Protected<O>, calls: u32, interval_ms: u64) -> Outcomes
where
    O: Operation<Output = u32, Error = String>,
{
    let mut outcomes = Outcomes::default();
    let pillar = op.pillar();

    for _ in 0..calls {
        match op.call().await {
            Ok(_) => outcomes.succeeded += 1,
            Err(BreakerError::CircuitOpen { .. }) => outcomes.rejected += 1,
            Err(BreakerError::Timeout { .. }) => outcomes.timed_out += 1,
            Err(BreakerError::Operation(e)) => {
                tracing::debug!(pillar, error = %e, "Call failed");
                outcomes.failed += 1;
            }
        }
        tokio::time::sleep(Duration::from_millis(interval_ms)).await;
    }

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ratio() {
        assert_eq!(parse_ratio("0.25"), Ok(0.25));
        assert_eq!(parse_ratio("1"), Ok(1.0));
        assert!(parse_ratio("NaN").is_err());
        assert!(parse_ratio("inf").is_err());
        assert!(parse_ratio("-0.1").is_err());
        assert!(parse_ratio("abc").is_err());
    }

    #[test]
    fn test_cli_rejects_nan_failure_ratio() {
        let parsed = Cli::try_parse_from(["pillar-breaker", "simulate", "--failure-ratio", "NaN"]);
        assert!(parsed.is_err());

        let parsed = Cli::try_parse_from(["pillar-breaker", "simulate", "-f", "0.5"]).unwrap();
        match parsed.command {
            Commands::Simulate { failure_ratio, .. } => assert_eq!(failure_ratio, 0.5),
            Commands::Check => panic!("expected simulate"),
        }
    }
}
