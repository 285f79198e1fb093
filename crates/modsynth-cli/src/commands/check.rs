//! Patch checking.

use super::common::load_patch;
use clap::Args;
use modsynth_synth::SynthGraph;
use std::path::PathBuf;

#[derive(Args)]
pub struct CheckArgs {
    /// Patch file (.toml or .json)
    patch: PathBuf,

    /// Sample rate used to build the graph
    #[arg(long, default_value = "48000")]
    sample_rate: u32,

    /// Also run the graph for this many seconds and report the peak level
    #[arg(long)]
    run: Option<f32>,
}

pub fn run(args: CheckArgs) -> anyhow::Result<()> {
    let patch = load_patch(&args.patch)?;
    let mut graph = SynthGraph::new(&patch, args.sample_rate as f32)?;

    let title = patch.name.as_deref().unwrap_or("(unnamed)");
    println!("Patch: {title}");
    println!("  Volume: {}", patch.vol);
    println!("  Glide: {} s", patch.glide);
    println!("  Outputs: {}", patch.out.join(", "));
    println!("\nModules ({}), in evaluation order:", graph.len());
    for name in graph.module_names() {
        let kind = graph.kind_of(name).map_or("?", |k| k.name());
        println!("  {kind:<14} {name}");
    }

    let unknown = patch.unknown_outputs();
    if !unknown.is_empty() {
        println!("\nWarning: outputs naming no module: {}", unknown.join(", "));
    }

    if let Some(seconds) = args.run {
        let frames = (seconds.max(0.0) * args.sample_rate as f32).ceil() as u64;
        let mut peak = 0.0f32;
        for _ in 0..frames {
            let out = graph.next();
            if !out.is_finite() {
                anyhow::bail!("non-finite output after {:.3} s", graph.time());
            }
            peak = peak.max(out.mono.abs());
        }
        println!("\nRan {frames} frames: peak {peak:.3}");
        if peak > 1.0 {
            println!("Warning: output exceeds 1.0; lower vol");
        }
    }

    println!("\nOK");
    Ok(())
}
