#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Portal Runner session.

mod level_config;
mod placement;
mod session;

use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{level_config::LevelConfig, session::Session};

#[derive(Debug, Parser)]
#[command(name = "portal-runner")]
#[command(about = "Runs a headless Portal Runner session and prints a summary")]
struct Cli {
    /// Level manifest to load instead of the built-in level
    #[arg(long)]
    level: Option<PathBuf>,

    /// Number of frames to simulate
    #[arg(long, default_value_t = 600)]
    frames: u32,

    /// Frame duration in milliseconds
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,

    /// Seed for enemy selection and placement
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Entry point for the Portal Runner command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    if cli.frame_ms == 0 {
        bail!("--frame-ms must be greater than zero");
    }

    let level = match cli.level.as_deref() {
        Some(path) => LevelConfig::from_path(path)?,
        None => LevelConfig::embedded_default()?,
    };
    info!(
        seed = cli.seed,
        frames = cli.frames,
        frame_ms = cli.frame_ms,
        "starting session"
    );

    let mut session = Session::new(level, cli.seed)?;
    let dt = Duration::from_millis(cli.frame_ms);
    for _ in 0..cli.frames {
        session.step(dt);
    }

    println!("{}", session.finish());
    Ok(())
}

fn init_tracing(fallback: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_target(false)
        .init();
}
