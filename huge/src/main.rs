//! The `huge` binary: argument parsing, logging setup, and dispatch into
//! `huge-lib`. Owns every bit of stdout/stderr; the library never touches
//! a terminal directly.

mod commands;

use clap::Parser;
use huge_opts::{working_directory, Opts};
use tracing::level_filters::LevelFilter;
use tracing_error::ErrorLayer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    install_tracing()?;

    let opts = Opts::parse();
    let cwd = working_directory()?;
    commands::dispatch(&cwd, opts.command)
}

fn install_tracing() -> eyre::Result<()> {
    let env_filter = EnvFilter::builder()
        .with_env_var("HUGE_LOG")
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(ErrorLayer::default())
        .with(fmt_layer.with_filter(env_filter))
        .try_init()?;
    Ok(())
}
