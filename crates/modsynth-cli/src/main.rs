//! modsynth CLI - play, render, and check modular synth patches.

mod commands;
mod watch;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "modsynth")]
#[command(author, version, about = "Per-sample modular synthesizer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a patch on an audio device, reloading it when the file changes
    Play(commands::play::PlayArgs),

    /// Render a patch to a stereo WAV file
    Render(commands::render::RenderArgs),

    /// Parse, validate, and build a patch without playing it
    Check(commands::check::CheckArgs),

    /// List audio output devices
    Devices(commands::devices::DevicesArgs),
}

/// Install the stderr subscriber; RUST_LOG overrides the default level.
///
/// The subscriber also bridges log:: records from cpal and notify.
fn init_logging() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
}

fn main() -> anyhow::Result<()> {
    init_logging()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Play(args) => commands::play::run(args),
        Commands::Render(args) => commands::render::run(args),
        Commands::Check(args) => commands::check::run(args),
        Commands::Devices(args) => commands::devices::run(args),
    }
}
