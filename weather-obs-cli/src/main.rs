//! Binary crate for the `weather-obs` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Interactive configuration
//! - Reading raw observations and printing the validated form

use clap::Parser;
use tracing_subscriber::EnvFilter;
use weather_obs_core::Config;

mod cli;

fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    let config = Config::load()?;

    init_tracing(&config);

    cmd.run(config)
}

fn init_tracing(config: &Config) {
    let fallback = config.log_filter.as_deref().unwrap_or("warn");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
