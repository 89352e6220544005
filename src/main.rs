//! Mermaid Studio - live editing, preview and export for Mermaid diagrams.

mod cli;
mod config;
mod core;
mod host;
mod logger;
mod protocol;
mod render;
mod sandbox;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::{StudioConfig, init_config};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = init_config(StudioConfig::load(cli.config.as_deref(), cli.file())?);
    if let Some(path) = &config.config_path {
        debug!("config"; "loaded {}", path.display());
    }

    match &cli.command {
        Commands::Render { file, size } => cli::render::run_render(file, *size, &config),
        Commands::Watch { file, size } => {
            runtime()?.block_on(cli::watch::run_watch(file, *size))
        }
        Commands::Export {
            file,
            format,
            output,
        } => runtime()?.block_on(cli::export::run_export(file, *format, output.clone())),
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("studio")
        .build()?)
}
