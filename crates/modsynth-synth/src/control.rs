//! Start/stop/reload choreography around a running graph.
//!
//! The [`Controller`] lives on the producer (audio) thread and owns the
//! [`SynthGraph`]. Every transition is a master-volume fade:
//!
//! - **start** ramps the volume from 0 to the patch volume over `fade_in`
//! - **stop** ramps it to 0 over `fade_out`, then reports [`Notification::Stopped`];
//!   stopping during a start or stop fade goes silent at once
//! - **reload** fades out, splices the new graph in at silence, and fades
//!   back in
//!
//! The [`ControlHandle`] lives on the control thread. It builds replacement
//! graphs (parsing, validation, allocation) off the audio thread and sends
//! them over a bounded channel; the producer only ever sees a complete graph
//! and swaps it in with a single splice. Retired graphs travel back to the
//! handle to be dropped there.
//!
//! The producer polls with `try_recv` and reports with `try_send`: it never
//! blocks.
//!
//! ```rust
//! use std::time::Duration;
//! use modsynth_config::Patch;
//! use modsynth_synth::{Controller, EngineConfig, Notification, SynthGraph};
//!
//! let mut patch = Patch::new().with_output("tone");
//! patch.oscillators.insert("tone".into(), Default::default());
//!
//! let config = EngineConfig { sample_rate: 100.0, fade_in: 0.1, fade_out: 0.1, duration: 0.0 };
//! let graph = SynthGraph::new(&patch, config.sample_rate).unwrap();
//! let (mut controller, handle) = Controller::new(graph, config);
//!
//! handle.start().unwrap();
//! let _ = controller.next_frame();
//! handle.stop().unwrap();
//! for _ in 0..20 {
//!     controller.next_frame();
//! }
//! let stopped = handle.wait_for(|n| *n == Notification::Stopped, Duration::from_millis(10));
//! assert!(stopped.is_ok());
//! ```

use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};
use modsynth_config::Patch;
use modsynth_core::Output;

use crate::error::SynthError;
use crate::graph::{SpliceReport, SynthGraph};

/// Capacity of the command channel.
const COMMAND_CAPACITY: usize = 16;
/// Capacity of the notification channel.
const NOTIFICATION_CAPACITY: usize = 256;
/// Capacity of the retired-graph channel.
const RETIRED_CAPACITY: usize = 4;
/// Minimum seconds between two overdrive reports.
const OVERDRIVE_INTERVAL: f32 = 0.5;

/// Playback settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Samples per second.
    pub sample_rate: f32,
    /// Seconds to fade in on start and after a reload.
    pub fade_in: f32,
    /// Seconds to fade out on stop and before a reload.
    pub fade_out: f32,
    /// Stop automatically after this many seconds; 0 plays forever.
    pub duration: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000.0,
            fade_in: 0.1,
            fade_out: 0.1,
            duration: 0.0,
        }
    }
}

/// Requests from the control thread.
#[derive(Debug)]
pub enum Command {
    /// Fade in.
    Start,
    /// Fade out and stop.
    Stop,
    /// Splice in a graph built on the control thread.
    Swap(Box<SynthGraph>),
}

/// Events reported by the producer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Notification {
    /// The fade-in finished.
    Playing,
    /// Whole seconds played so far.
    Elapsed(u64),
    /// Output magnitude above 1 (rounded to 3 decimals); 0 once it clears.
    Overdrive(f32),
    /// A new graph was spliced in.
    Reloaded(SpliceReport),
    /// The configured duration ran out and the closing fade-out finished.
    TimeIsUp,
    /// Playback stopped at silence.
    Stopped,
}

/// Why a fade-out is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeReason {
    /// Stop once silent.
    Stop,
    /// Splice the pending graph once silent, then fade back in.
    Swap,
}

/// Producer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    /// Not started; output is silent and the graph does not advance.
    Idle,
    /// Fading in.
    FadingIn,
    /// At full configured volume.
    Playing,
    /// Fading out.
    FadingOut(FadeReason),
    /// Stopped after a fade-out; output is silent.
    Stopped,
}

/// Rate-limited overdrive detector.
///
/// Reports a level above 1 at most once per interval, whether or not the
/// output dipped back in between. Each report allows one clear (`0.0`) once
/// the output is back within range.
#[derive(Debug, Clone)]
struct OverdriveMonitor {
    interval: u64,
    since_report: u64,
    active: bool,
}

impl OverdriveMonitor {
    fn new(sample_rate: f32) -> Self {
        let interval = (OVERDRIVE_INTERVAL * sample_rate).ceil().max(1.0) as u64;
        Self {
            interval,
            since_report: interval,
            active: false,
        }
    }

    fn observe(&mut self, mono: f32) -> Option<f32> {
        self.since_report = self.since_report.saturating_add(1);
        let level = (mono.abs() * 1000.0).round() / 1000.0;
        if level > 1.0 {
            if self.since_report >= self.interval {
                self.active = true;
                self.since_report = 0;
                return Some(level);
            }
        } else if self.active {
            self.active = false;
            return Some(0.0);
        }
        None
    }
}

/// Producer side: owns the graph and runs the fade state machine.
#[derive(Debug)]
pub struct Controller {
    graph: SynthGraph,
    config: EngineConfig,
    state: PlayState,
    commands: Receiver<Command>,
    notifications: Sender<Notification>,
    retired: Sender<Box<SynthGraph>>,
    pending: Option<Box<SynthGraph>>,
    stop_after_swap: bool,
    timed_out: bool,
    played: u64,
    elapsed: u64,
    overdrive: OverdriveMonitor,
}

impl Controller {
    /// Wrap `graph` and create the matching control handle.
    ///
    /// The graph starts silent; nothing plays until [`ControlHandle::start`].
    pub fn new(mut graph: SynthGraph, config: EngineConfig) -> (Self, ControlHandle) {
        let (command_tx, command_rx) = bounded(COMMAND_CAPACITY);
        let (notify_tx, notify_rx) = bounded(NOTIFICATION_CAPACITY);
        let (retired_tx, retired_rx) = bounded(RETIRED_CAPACITY);

        graph.set_volume_immediate(0.0);
        let controller = Self {
            graph,
            config,
            state: PlayState::Idle,
            commands: command_rx,
            notifications: notify_tx,
            retired: retired_tx,
            pending: None,
            stop_after_swap: false,
            timed_out: false,
            played: 0,
            elapsed: 0,
            overdrive: OverdriveMonitor::new(config.sample_rate),
        };
        let handle = ControlHandle {
            commands: command_tx,
            notifications: notify_rx,
            retired: retired_rx,
            sample_rate: config.sample_rate,
        };
        (controller, handle)
    }

    /// Produce one frame, applying any queued commands first.
    pub fn next_frame(&mut self) -> Output {
        while let Ok(command) = self.commands.try_recv() {
            self.apply(command);
        }

        if matches!(self.state, PlayState::Idle | PlayState::Stopped) {
            return Output::SILENT;
        }

        let output = self.graph.next();
        self.played += 1;
        self.after_frame(output);
        output
    }

    /// Fill an interleaved device buffer.
    ///
    /// Mono buffers take the mono signal; wider buffers take left and right
    /// in the first two channels and silence in the rest.
    pub fn fill_interleaved(&mut self, data: &mut [f32], channels: usize) {
        if channels == 0 {
            return;
        }
        for frame in data.chunks_mut(channels) {
            let output = self.next_frame();
            match frame {
                [mono] => *mono = output.mono,
                [left, right, rest @ ..] => {
                    *left = output.left;
                    *right = output.right;
                    rest.fill(0.0);
                }
                [] => {}
            }
        }
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Start => self.start(),
            Command::Stop => self.stop(),
            Command::Swap(graph) => self.swap(graph),
        }
    }

    fn start(&mut self) {
        match self.state {
            PlayState::Idle | PlayState::Stopped => {
                self.graph.set_volume_immediate(0.0);
                self.fade_in();
            }
            PlayState::FadingOut(FadeReason::Stop) => self.fade_in(),
            PlayState::FadingOut(FadeReason::Swap) => self.stop_after_swap = false,
            PlayState::FadingIn | PlayState::Playing => {}
        }
    }

    // Stopping mid-fade cuts straight to silence; a reload in flight still
    // completes first.
    fn stop(&mut self) {
        match self.state {
            PlayState::Playing => self.fade_out(FadeReason::Stop),
            PlayState::FadingOut(FadeReason::Swap) => self.stop_after_swap = true,
            PlayState::Idle | PlayState::FadingIn | PlayState::FadingOut(FadeReason::Stop) => {
                self.graph.set_volume_immediate(0.0);
                self.finish_stop();
            }
            PlayState::Stopped => {}
        }
    }

    fn finish_stop(&mut self) {
        self.stop_after_swap = false;
        self.state = PlayState::Stopped;
        if std::mem::take(&mut self.timed_out) {
            self.notify(Notification::TimeIsUp);
        }
        self.notify(Notification::Stopped);
    }

    fn swap(&mut self, graph: Box<SynthGraph>) {
        match self.state {
            PlayState::Idle | PlayState::Stopped => self.splice(graph),
            PlayState::FadingIn | PlayState::Playing => {
                self.replace_pending(graph);
                self.stop_after_swap = false;
                self.fade_out(FadeReason::Swap);
            }
            PlayState::FadingOut(_) => self.replace_pending(graph),
        }
    }

    fn replace_pending(&mut self, graph: Box<SynthGraph>) {
        if let Some(stale) = self.pending.replace(graph) {
            self.retire(stale);
        }
    }

    fn fade_in(&mut self) {
        let target = self.graph.configured_volume();
        self.graph.set_volume(target, self.config.fade_in);
        self.state = PlayState::FadingIn;
    }

    fn fade_out(&mut self, reason: FadeReason) {
        self.graph.set_volume(0.0, self.config.fade_out);
        self.state = PlayState::FadingOut(reason);
    }

    /// Splice `fresh` in at the current volume level.
    fn splice(&mut self, mut fresh: Box<SynthGraph>) {
        let level = self.graph.volume();
        let report = self.graph.splice(&mut fresh);
        self.graph.set_volume_immediate(level);
        self.retire(fresh);
        self.notify(Notification::Reloaded(report));
    }

    fn after_frame(&mut self, output: Output) {
        let seconds = self.played as f64 / f64::from(self.config.sample_rate);
        if seconds.floor() as u64 > self.elapsed {
            self.elapsed = seconds.floor() as u64;
            self.notify(Notification::Elapsed(self.elapsed));
        }

        if let Some(level) = self.overdrive.observe(output.mono) {
            self.notify(Notification::Overdrive(level));
        }

        let settled = self.graph.is_volume_settled();
        match self.state {
            PlayState::FadingIn if settled => {
                self.state = PlayState::Playing;
                self.notify(Notification::Playing);
            }
            PlayState::FadingOut(reason) if settled => {
                if let Some(fresh) = self.pending.take() {
                    self.splice(fresh);
                }
                if reason == FadeReason::Stop || self.stop_after_swap {
                    self.finish_stop();
                } else {
                    self.fade_in();
                }
            }
            _ => {}
        }

        let duration = f64::from(self.config.duration);
        if duration > 0.0
            && matches!(self.state, PlayState::FadingIn | PlayState::Playing)
            && seconds >= duration - f64::from(self.config.fade_out)
        {
            self.timed_out = true;
            self.fade_out(FadeReason::Stop);
        }
    }

    fn notify(&self, notification: Notification) {
        // A full channel means nobody is listening; dropping is fine.
        let _ = self.notifications.try_send(notification);
    }

    fn retire(&self, graph: Box<SynthGraph>) {
        // Only frees here when the handle is gone or far behind.
        let _ = self.retired.try_send(graph);
    }

    /// Current state.
    pub fn state(&self) -> PlayState {
        self.state
    }

    /// True once a stop has completed.
    pub fn is_stopped(&self) -> bool {
        self.state == PlayState::Stopped
    }

    /// Samples produced since the first start.
    pub fn played(&self) -> u64 {
        self.played
    }

    /// The running graph.
    pub fn graph(&self) -> &SynthGraph {
        &self.graph
    }

    /// Playback settings.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

/// Control side: sends commands, receives notifications.
#[derive(Debug, Clone)]
pub struct ControlHandle {
    commands: Sender<Command>,
    notifications: Receiver<Notification>,
    retired: Receiver<Box<SynthGraph>>,
    sample_rate: f32,
}

impl ControlHandle {
    /// Build a graph from `patch` here and send it for splicing.
    ///
    /// # Errors
    ///
    /// Construction errors from [`SynthGraph::new`] (the running graph is
    /// untouched), or [`SynthError::ControlClosed`] if the producer is gone.
    pub fn load(&self, patch: &Patch) -> Result<(), SynthError> {
        self.collect_retired();
        let graph = SynthGraph::new(patch, self.sample_rate)?;
        tracing::debug!(modules = graph.len(), "sending graph for reload");
        self.send(Command::Swap(Box::new(graph)))
    }

    /// Request a fade-in.
    ///
    /// # Errors
    ///
    /// [`SynthError::ControlClosed`] if the producer is gone.
    pub fn start(&self) -> Result<(), SynthError> {
        tracing::debug!("start requested");
        self.send(Command::Start)
    }

    /// Request a fade-out and stop.
    ///
    /// # Errors
    ///
    /// [`SynthError::ControlClosed`] if the producer is gone.
    pub fn stop(&self) -> Result<(), SynthError> {
        tracing::debug!("stop requested");
        self.send(Command::Stop)
    }

    /// Raw notification receiver.
    pub fn notifications(&self) -> &Receiver<Notification> {
        &self.notifications
    }

    /// Block until a notification matching `accept` arrives.
    ///
    /// Notifications that do not match are discarded.
    ///
    /// # Errors
    ///
    /// [`SynthError::Timeout`] when nothing matched in time,
    /// [`SynthError::ControlClosed`] if the producer is gone.
    pub fn wait_for(
        &self,
        accept: impl Fn(&Notification) -> bool,
        timeout: Duration,
    ) -> Result<Notification, SynthError> {
        let deadline = Instant::now() + timeout;
        loop {
            self.collect_retired();
            match self.notifications.recv_deadline(deadline) {
                Ok(notification) if accept(&notification) => return Ok(notification),
                Ok(_) => {}
                Err(RecvTimeoutError::Timeout) => return Err(SynthError::Timeout),
                Err(RecvTimeoutError::Disconnected) => return Err(SynthError::ControlClosed),
            }
        }
    }

    /// Drop graphs the producer has retired. Returns how many were dropped.
    pub fn collect_retired(&self) -> usize {
        self.retired.try_iter().count()
    }

    fn send(&self, command: Command) -> Result<(), SynthError> {
        self.commands
            .send(command)
            .map_err(|_| SynthError::ControlClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modsynth_config::{OscillatorDef, ParamDef, WaveType};

    /// Constant-1 square (frequency 0) on the bus.
    fn patch_with(names: &[&str]) -> Patch {
        let mut patch = Patch::new();
        for name in names {
            patch.out.push((*name).to_string());
            patch.oscillators.insert(
                (*name).to_string(),
                OscillatorDef {
                    wave: WaveType::Square,
                    freq: ParamDef::value(0.0),
                    ..OscillatorDef::default()
                },
            );
        }
        patch
    }

    fn controller(patch: &Patch, config: EngineConfig) -> (Controller, ControlHandle) {
        let graph = SynthGraph::new(patch, config.sample_rate).unwrap();
        Controller::new(graph, config)
    }

    fn config(fade_in: f32, fade_out: f32, duration: f32) -> EngineConfig {
        EngineConfig {
            sample_rate: 4.0,
            fade_in,
            fade_out,
            duration,
        }
    }

    fn frames(controller: &mut Controller, n: usize) -> Vec<f32> {
        (0..n).map(|_| controller.next_frame().mono).collect()
    }

    fn drain(handle: &ControlHandle) -> Vec<Notification> {
        handle.notifications().try_iter().collect()
    }

    #[test]
    fn idle_is_silent_and_does_not_advance() {
        let (mut c, _handle) = controller(&patch_with(&["a"]), config(1.0, 1.0, 0.0));
        assert_eq!(frames(&mut c, 3), [0.0; 3]);
        assert_eq!(c.graph().samples(), 0);
    }

    #[test]
    fn start_fades_in() {
        let (mut c, handle) = controller(&patch_with(&["a"]), config(1.0, 1.0, 0.0));
        handle.start().unwrap();
        assert_eq!(frames(&mut c, 5), [0.25, 0.5, 0.75, 1.0, 1.0]);
        assert_eq!(c.state(), PlayState::Playing);
        assert!(drain(&handle).contains(&Notification::Playing));
    }

    #[test]
    fn stop_fades_out_then_silences() {
        let (mut c, handle) = controller(&patch_with(&["a"]), config(0.0, 0.5, 0.0));
        handle.start().unwrap();
        frames(&mut c, 1);
        handle.stop().unwrap();
        assert_eq!(frames(&mut c, 4), [0.5, 0.0, 0.0, 0.0]);
        assert!(c.is_stopped());
        assert_eq!(drain(&handle).last(), Some(&Notification::Stopped));
    }

    #[test]
    fn stop_mid_fade_in_is_immediate() {
        let (mut c, handle) = controller(&patch_with(&["a"]), config(1.0, 1.0, 0.0));
        handle.start().unwrap();
        frames(&mut c, 2);
        handle.stop().unwrap();
        assert_eq!(frames(&mut c, 2), [0.0, 0.0]);
        assert!(c.is_stopped());
        assert_eq!(c.played(), 2);
    }

    #[test]
    fn restart_after_stop_fades_in_again() {
        let (mut c, handle) = controller(&patch_with(&["a"]), config(0.5, 0.0, 0.0));
        handle.start().unwrap();
        frames(&mut c, 2);
        handle.stop().unwrap();
        frames(&mut c, 1);
        assert!(c.is_stopped());

        handle.start().unwrap();
        assert_eq!(frames(&mut c, 2), [0.5, 1.0]);
        assert_eq!(c.state(), PlayState::Playing);
    }

    #[test]
    fn stop_while_idle_reports_immediately() {
        let (mut c, handle) = controller(&patch_with(&["a"]), config(1.0, 1.0, 0.0));
        handle.stop().unwrap();
        c.next_frame();
        assert_eq!(drain(&handle), [Notification::Stopped]);
    }

    #[test]
    fn swap_splices_at_silence_and_fades_back_in() {
        let (mut c, handle) = controller(&patch_with(&["a"]), config(0.0, 0.5, 0.0));
        handle.start().unwrap();
        frames(&mut c, 2);
        drain(&handle);

        handle.load(&patch_with(&["a", "b"])).unwrap();
        // Fade-out over two frames on the old graph, then the new graph
        // fades in instantly with both oscillators on the bus.
        assert_eq!(frames(&mut c, 3), [0.5, 0.0, 2.0]);
        assert_eq!(c.graph().len(), 2);

        let events = drain(&handle);
        assert!(events.contains(&Notification::Reloaded(SpliceReport {
            retained: 1,
            added: 1,
            removed: 0,
        })));
        assert_eq!(handle.collect_retired(), 1);
    }

    #[test]
    fn stop_during_swap_fade_stops_after_splice() {
        let (mut c, handle) = controller(&patch_with(&["a"]), config(0.0, 0.5, 0.0));
        handle.start().unwrap();
        frames(&mut c, 1);
        handle.load(&patch_with(&["b"])).unwrap();
        handle.stop().unwrap();
        frames(&mut c, 3);
        assert!(c.is_stopped());
        assert!(c.graph().module("b").is_some());
    }

    #[test]
    fn overdrive_is_rate_limited_and_cleared() {
        let (mut c, handle) = controller(&patch_with(&["a", "b"]), config(0.0, 0.0, 0.0));
        handle.start().unwrap();
        frames(&mut c, 3);
        let overdrive: Vec<_> = drain(&handle)
            .into_iter()
            .filter(|n| matches!(n, Notification::Overdrive(_)))
            .collect();
        assert_eq!(overdrive, [Notification::Overdrive(2.0), Notification::Overdrive(2.0)]);

        handle.stop().unwrap();
        frames(&mut c, 1);
        assert!(drain(&handle).contains(&Notification::Overdrive(0.0)));
    }

    #[test]
    fn overdrive_crossing_every_cycle_is_still_rate_limited() {
        // 4-sample interval
        let mut monitor = OverdriveMonitor::new(8.0);
        let reports: Vec<_> = [2.0, 0.0, 2.0, 0.0, 2.0, 0.0, 2.0, 0.0]
            .into_iter()
            .filter_map(|x| monitor.observe(x))
            .collect();
        assert_eq!(reports, [2.0, 0.0, 2.0, 0.0]);
    }

    #[test]
    fn overdriven_sines_report_twice_per_second() {
        let mut patch = Patch::new();
        for name in ["a", "b"] {
            patch.out.push(name.to_string());
            patch.oscillators.insert(
                name.to_string(),
                OscillatorDef {
                    freq: ParamDef::value(100.0),
                    ..OscillatorDef::default()
                },
            );
        }
        let config = EngineConfig {
            sample_rate: 48000.0,
            fade_in: 0.0,
            fade_out: 0.0,
            duration: 0.0,
        };
        let (mut c, handle) = controller(&patch, config);
        handle.start().unwrap();

        let mut reports = 0;
        let mut clears = 0;
        for _ in 0..48000 {
            c.next_frame();
            for n in handle.notifications().try_iter() {
                match n {
                    Notification::Overdrive(level) if level > 0.0 => reports += 1,
                    Notification::Overdrive(_) => clears += 1,
                    _ => {}
                }
            }
        }
        assert!((1..=2).contains(&reports), "{reports} reports");
        assert!(clears <= reports, "{clears} clears");
    }

    #[test]
    fn duration_stops_automatically() {
        let (mut c, handle) = controller(&patch_with(&["a"]), config(0.0, 1.0, 2.0));
        handle.start().unwrap();
        frames(&mut c, 12);

        let events = drain(&handle);
        assert!(c.is_stopped());
        assert_eq!(c.played(), 8);
        let time_up = events.iter().position(|n| *n == Notification::TimeIsUp);
        let stopped = events.iter().position(|n| *n == Notification::Stopped);
        assert!(time_up.is_some() && time_up < stopped);
        assert!(events.contains(&Notification::Elapsed(1)));
        assert!(events.contains(&Notification::Elapsed(2)));
    }

    #[test]
    fn wait_for_times_out() {
        let (_c, handle) = controller(&patch_with(&["a"]), config(1.0, 1.0, 0.0));
        let result = handle.wait_for(|_| true, Duration::from_millis(5));
        assert!(matches!(result, Err(SynthError::Timeout)));
    }

    #[test]
    fn closed_producer_is_reported() {
        let (c, handle) = controller(&patch_with(&["a"]), config(1.0, 1.0, 0.0));
        drop(c);
        assert!(matches!(handle.start(), Err(SynthError::ControlClosed)));
    }

    #[test]
    fn interleaved_fill_places_channels() {
        let mut patch = patch_with(&["a"]);
        if let Some(osc) = patch.oscillators.get_mut("a") {
            osc.pan = ParamDef::value(1.0);
        }
        let (mut c, handle) = controller(&patch, config(0.0, 0.0, 0.0));
        handle.start().unwrap();

        let mut data = [9.0; 6];
        c.fill_interleaved(&mut data, 3);
        assert_eq!(data, [0.0, 1.0, 0.0, 0.0, 1.0, 0.0]);
    }
}
