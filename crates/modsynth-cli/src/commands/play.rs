//! Real-time playback with hot reload.

use super::common::{EngineArgs, describe, load_patch};
use crate::watch::PatchWatcher;
use clap::Args;
use crossbeam_channel::{Receiver, never, select};
use modsynth_io::{OutputStream, StreamConfig};
use modsynth_synth::{ControlHandle, Controller, Notification, SynthGraph};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Quiet period that groups the file events of one save.
const SETTLE: Duration = Duration::from_millis(50);

#[derive(Args)]
pub struct PlayArgs {
    /// Patch file (.toml or .json)
    patch: PathBuf,

    #[command(flatten)]
    engine: EngineArgs,

    /// Output device (index, name, or part of a name)
    #[arg(long)]
    device: Option<String>,

    /// Buffer size in frames (host default if omitted)
    #[arg(long)]
    buffer_size: Option<u32>,

    /// Do not reload the patch when the file changes
    #[arg(long)]
    no_watch: bool,
}

pub fn run(args: PlayArgs) -> anyhow::Result<()> {
    let config = args.engine.config();
    let patch = load_patch(&args.patch)?;
    let graph = SynthGraph::new(&patch, config.sample_rate)?;
    let modules = graph.len();
    let (mut controller, handle) = Controller::new(graph, config);

    let mut stream = OutputStream::new(StreamConfig {
        sample_rate: args.engine.sample_rate,
        buffer_size: args.buffer_size,
        device: args.device.clone(),
    })?;

    println!("Playing {} ({} modules)", args.patch.display(), modules);
    println!("  Output: {}", stream.device_name());
    println!("  Sample rate: {} Hz", stream.sample_rate());
    if config.duration > 0.0 {
        println!("  Duration: {} s", config.duration);
    }

    let watcher = if args.no_watch {
        None
    } else {
        let watcher = PatchWatcher::new(&args.patch)?;
        println!("  Watching for changes; save the file to reload");
        Some(watcher)
    };
    println!("\nPress Ctrl+C to stop...\n");

    let interrupt = handle.clone();
    ctrlc::set_handler(move || {
        println!("\nStopping...");
        if let Err(e) = interrupt.stop() {
            tracing::warn!(error = %e, "stop request failed");
        }
    })?;

    stream.start(move |data, channels| controller.fill_interleaved(data, channels))?;
    handle.start()?;

    event_loop(&handle, &args.patch, watcher.as_ref())?;

    stream.stop();
    println!("Done!");
    Ok(())
}

fn event_loop(
    handle: &ControlHandle,
    path: &Path,
    watcher: Option<&PatchWatcher>,
) -> anyhow::Result<()> {
    let unwatched = never();
    let changes: &Receiver<()> = watcher.map_or(&unwatched, PatchWatcher::changes);
    loop {
        select! {
            recv(handle.notifications()) -> msg => {
                let Ok(notification) = msg else {
                    anyhow::bail!("audio stream ended unexpectedly");
                };
                if let Some(line) = describe(&notification) {
                    println!("{line}");
                }
                if notification == Notification::Stopped {
                    return Ok(());
                }
            }
            recv(changes) -> _ => {
                if let Some(watcher) = watcher {
                    watcher.settle(SETTLE);
                }
                reload(handle, path);
            }
        }
        handle.collect_retired();
    }
}

// A patch that fails to load is reported and the running graph keeps playing.
fn reload(handle: &ControlHandle, path: &Path) {
    let result = load_patch(path).and_then(|patch| Ok(handle.load(&patch)?));
    match result {
        Ok(()) => tracing::info!(patch = %path.display(), "reload queued"),
        Err(e) => eprintln!("reload failed: {e:#}"),
    }
}
