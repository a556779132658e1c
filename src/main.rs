//! # manifestctl
//!
//! Command-line entry point for the manifest engine.
//!
//! ## Environment
//!
//! - `LOG_LEVEL` - log level when `RUST_LOG` is unset (default INFO)
//! - `LOG_FORMAT` - `text` or `json` (default text)
//! - `LOG_ENABLE_COLOR` - ANSI colour for text logs (default false)
//! - `ENABLE_METRICS` - register Prometheus metrics (default true)

use anyhow::{Context, Result};
use clap::Parser;
use manifest_engine::cli::{self, Cli};
use manifest_engine::config::EngineConfig;
use manifest_engine::logging;
use manifest_engine::observability::metrics;
use std::io::Write;
use tracing::{debug, info};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = EngineConfig::from_env();

    logging::init_logging(&config)?;
    debug!(?config, "Loaded engine configuration");

    if config.enable_metrics {
        metrics::register_metrics()?;
    }

    let input = cli::read_input(&cli)?;
    info!("Read manifest ({} bytes)", input.len());

    let output = cli::run(&cli.command, &input)?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(&output)
        .and_then(|()| stdout.flush())
        .context("Failed to write output")?;

    if cli.emit_metrics {
        if config.enable_metrics {
            eprint!("{}", metrics::gather_metrics()?);
        } else {
            eprintln!("metrics are disabled (ENABLE_METRICS=false)");
        }
    }

    Ok(())
}
