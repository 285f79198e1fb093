//! Shared CLI helpers used across multiple commands.

use anyhow::Context;
use clap::Args;
use modsynth_config::Patch;
use modsynth_synth::{EngineConfig, Notification, SpliceReport};
use std::path::Path;

/// Playback settings shared by `play` and `render`.
#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    /// Sample rate in Hz
    #[arg(long, default_value = "48000")]
    pub sample_rate: u32,

    /// Seconds to fade in on start and after each reload
    #[arg(long, default_value = "0.1")]
    pub fade_in: f32,

    /// Seconds to fade out on stop and before each reload
    #[arg(long, default_value = "0.1")]
    pub fade_out: f32,

    /// Stop after this many seconds (0 plays until interrupted)
    #[arg(short, long, default_value = "0")]
    pub duration: f32,
}

impl EngineArgs {
    /// Controller settings for these flags.
    pub fn config(&self) -> EngineConfig {
        EngineConfig {
            sample_rate: self.sample_rate as f32,
            fade_in: self.fade_in.max(0.0),
            fade_out: self.fade_out.max(0.0),
            duration: self.duration.max(0.0),
        }
    }
}

/// Load and parse a patch file (`.toml` or `.json`).
pub fn load_patch(path: &Path) -> anyhow::Result<Patch> {
    Patch::load(path).with_context(|| format!("failed to load patch {}", path.display()))
}

/// One-line description of a hot-swap.
pub fn describe_splice(report: &SpliceReport) -> String {
    format!(
        "{} kept, {} added, {} removed",
        report.retained, report.added, report.removed
    )
}

/// Console line for a notification, or `None` for ones not worth printing.
pub fn describe(notification: &Notification) -> Option<String> {
    match notification {
        Notification::Playing => Some("playing".to_string()),
        Notification::Elapsed(secs) => Some(format!("{}:{:02}", secs / 60, secs % 60)),
        Notification::Overdrive(level) if *level > 0.0 => {
            Some(format!("overdrive: peak {level:.3}, lower vol"))
        }
        Notification::Overdrive(_) => Some("overdrive cleared".to_string()),
        Notification::Reloaded(report) => Some(format!("reloaded ({})", describe_splice(report))),
        Notification::TimeIsUp => Some("time is up".to_string()),
        Notification::Stopped => None,
    }
}
