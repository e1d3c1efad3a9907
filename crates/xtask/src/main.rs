//! Development tasks for the sight engine
//!
//! This binary provides development utilities using the cargo-xtask pattern.
//! Run with: `cargo xtask <command>`

mod commands;
mod world;

use anyhow::Result;
use clap::Parser;
use commands::{Probe, Render};

/// Development tasks for the sight engine
#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Development tools for sight maps and scenarios", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Recompute a scenario once and print the visibility map
    Render(Render),

    /// Measure how often one entity detects another over several turns
    Probe(Probe),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Render(cmd) => cmd.execute(),
        Command::Probe(cmd) => cmd.execute(),
    }
}
