#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless simulation driver for the wave director.

mod config;
mod simulation;

use std::{path::PathBuf, time::Duration};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::{
    config::SimulationConfig,
    simulation::{Profile, SimulationOptions},
};

const TELEMETRY_SEED: u64 = 0x7e1e_3e72;

/// Plays scripted waves against the wave director and prints a summary per wave.
#[derive(Debug, Parser)]
#[command(name = "wave-director", version)]
struct Cli {
    /// TOML file with `[director]` settings and an optional `[[catalog]]` table.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of waves to simulate.
    #[arg(long, default_value_t = 10)]
    waves: u32,
    /// Seed for every random decision; overrides the config file.
    #[arg(long)]
    seed: Option<u64>,
    /// Scripted player skill.
    #[arg(long, value_enum, default_value_t = Profile::Neutral)]
    profile: Profile,
    /// Simulation step in milliseconds.
    #[arg(long, default_value_t = 100)]
    tick_ms: u64,
    /// Simulated seconds after which the run gives up.
    #[arg(long, default_value_t = 3_600)]
    time_limit_secs: u64,
    /// Log filter such as `info` or `wave_director_world=debug`; falls back to `RUST_LOG`.
    #[arg(long)]
    log_level: Option<String>,
}

/// Entry point for the wave director command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref())?;

    let mut config = SimulationConfig::load(cli.config.as_deref())?;
    if cli.seed.is_some() {
        config.director.seed = cli.seed;
    }
    let options = SimulationOptions {
        waves: cli.waves,
        tick: Duration::from_millis(cli.tick_ms.max(1)),
        time_limit: Duration::from_secs(cli.time_limit_secs),
        profile: cli.profile,
        seed: config.director.seed.unwrap_or(TELEMETRY_SEED),
    };

    let summaries = simulation::run(config, &options)?;
    for summary in &summaries {
        println!("{summary}");
    }
    if summaries.len() < options.waves as usize {
        println!(
            "stopped after {} of {} waves",
            summaries.len(),
            options.waves
        );
    }
    Ok(())
}

fn init_tracing(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level)
            .with_context(|| format!("invalid log filter `{level}`"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("failed to install the tracing subscriber")
}
