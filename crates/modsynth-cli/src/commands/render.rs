//! Offline rendering to WAV.

use super::common::{EngineArgs, load_patch};
use anyhow::Context;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use modsynth_io::{WavRecorder, WavSpec};
use modsynth_synth::{Controller, Notification, SynthGraph};
use std::path::PathBuf;

/// Frames rendered between progress updates.
const BLOCK: u64 = 4096;

#[derive(Args)]
pub struct RenderArgs {
    /// Patch file (.toml or .json)
    patch: PathBuf,

    /// Output WAV file
    #[arg(short, long)]
    output: PathBuf,

    #[command(flatten)]
    engine: EngineArgs,

    /// Output bit depth (32 = float)
    #[arg(long, default_value = "32", value_parser = parse_bits)]
    bits: u16,
}

fn parse_bits(s: &str) -> Result<u16, String> {
    match s.parse::<u16>() {
        Ok(bits @ (16 | 24 | 32)) => Ok(bits),
        _ => Err(format!("unsupported bit depth '{s}' (expected 16, 24, or 32)")),
    }
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let config = args.engine.config();
    if config.duration <= 0.0 {
        anyhow::bail!("render needs a positive --duration");
    }

    let patch = load_patch(&args.patch)?;
    let graph = SynthGraph::new(&patch, config.sample_rate)?;
    let (mut controller, handle) = Controller::new(graph, config);
    handle.start()?;

    let spec = WavSpec {
        sample_rate: args.engine.sample_rate,
        bits_per_sample: args.bits,
    };
    let mut recorder = WavRecorder::create(&args.output, spec)
        .with_context(|| format!("failed to create {}", args.output.display()))?;

    let total = (f64::from(config.duration) * f64::from(config.sample_rate)).ceil() as u64;
    println!(
        "Rendering {} -> {} ({} s at {} Hz)",
        args.patch.display(),
        args.output.display(),
        config.duration,
        spec.sample_rate
    );

    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    let mut peak = 0.0f32;
    let mut overdrives = 0usize;
    while !controller.is_stopped() && recorder.frames() < total {
        let out = controller.next_frame();
        peak = peak.max(out.left.abs()).max(out.right.abs());
        recorder.write(out)?;

        if recorder.frames() % BLOCK == 0 {
            pb.set_position(recorder.frames());
            overdrives += count_overdrives(handle.notifications().try_iter());
        }
    }
    overdrives += count_overdrives(handle.notifications().try_iter());
    pb.finish_with_message("done");

    let frames = recorder.finalize()?;
    println!("\nStats:");
    println!(
        "  Frames: {} ({:.2} s)",
        frames,
        frames as f64 / f64::from(spec.sample_rate)
    );
    println!("  Peak: {:.1} dB", linear_to_db(peak));
    if overdrives > 0 {
        println!("  Overdrive reported {overdrives} time(s); consider lowering vol");
    }
    Ok(())
}

fn count_overdrives(notifications: impl Iterator<Item = Notification>) -> usize {
    notifications
        .filter(|n| matches!(n, Notification::Overdrive(level) if *level > 0.0))
        .count()
}

fn linear_to_db(level: f32) -> f32 {
    if level > 0.0 {
        20.0 * level.log10()
    } else {
        f32::NEG_INFINITY
    }
}
