//! Integration tests for modsynth-cli.
//!
//! Tests cover the CLI binary invocation: patch checking, offline rendering,
//! and argument validation. Playback needs an audio device and is not
//! exercised here.

use std::path::{Path, PathBuf};
use std::process::Command;

use modsynth_io::{WavFormat, read_wav_info};
use tempfile::TempDir;

/// Helper to get the path to the `modsynth` binary built by cargo.
fn modsynth_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_modsynth"))
}

const PATCH: &str = r#"
name = "test tone"
vol = 0.5
out = ["tone", "ghost"]

[gates.clock]
signal = [1, 0]
bpm = 240

[envelopes.env]
triggers = ["clock"]
attack = 0.01
release = 0.1

[oscillators.tone]
freq = 330
amp = { val = 0, mod = ["env"], modamp = 1 }
"#;

fn write_patch(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn run(args: &[&str], patch: &Path) -> std::process::Output {
    modsynth_bin()
        .args(args)
        .arg(patch)
        .output()
        .expect("failed to run modsynth")
}

// ---------------------------------------------------------------------------
// Basic invocation
// ---------------------------------------------------------------------------

#[test]
fn cli_help_lists_commands() {
    let output = modsynth_bin().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["play", "render", "check", "devices"] {
        assert!(stdout.contains(command), "help should mention '{command}'");
    }
}

#[test]
fn cli_version_works() {
    let output = modsynth_bin().arg("--version").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("modsynth"));
}

// ---------------------------------------------------------------------------
// `modsynth check`
// ---------------------------------------------------------------------------

#[test]
fn cli_check_lists_modules_in_evaluation_order() {
    let dir = TempDir::new().unwrap();
    let patch = write_patch(&dir, "tone.toml", PATCH);

    let output = run(&["check"], &patch);
    assert!(output.status.success(), "{output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("test tone"));
    assert!(stdout.contains("Modules (3)"));
    let gate = stdout.find("clock").unwrap();
    let env = stdout.find("env").unwrap();
    let tone = stdout.rfind("tone").unwrap();
    assert!(gate < env && env < tone);
    assert!(stdout.contains("ghost"), "unknown output should be reported");
}

#[test]
fn cli_check_runs_graph() {
    let dir = TempDir::new().unwrap();
    let patch = write_patch(&dir, "tone.toml", PATCH);

    let output = modsynth_bin()
        .args(["check", "--run", "0.5", "--sample-rate", "8000"])
        .arg(&patch)
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");
    assert!(String::from_utf8_lossy(&output.stdout).contains("Ran 4000 frames"));
}

#[test]
fn cli_check_accepts_json() {
    let dir = TempDir::new().unwrap();
    let patch = write_patch(
        &dir,
        "tone.json",
        r#"{ "out": ["o"], "oscillators": { "o": { "type": "square", "freq": 110 } } }"#,
    );

    let output = run(&["check"], &patch);
    assert!(output.status.success(), "{output:?}");
}

#[test]
fn cli_check_rejects_bad_note() {
    let dir = TempDir::new().unwrap();
    let patch = write_patch(
        &dir,
        "bad.toml",
        "[sequencers.seq]\nsequence = [\"a_4\", \"a_11\"]\n",
    );

    let output = run(&["check"], &patch);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("a_11"), "error should name the note: {stderr}");
}

#[test]
fn cli_check_missing_file_fails() {
    let output = modsynth_bin()
        .args(["check", "/nonexistent/patch.toml"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}

// ---------------------------------------------------------------------------
// `modsynth render`
// ---------------------------------------------------------------------------

#[test]
fn cli_render_writes_wav() {
    let dir = TempDir::new().unwrap();
    let patch = write_patch(&dir, "tone.toml", PATCH);
    let wav = dir.path().join("out.wav");

    let output = modsynth_bin()
        .args(["render", "--duration", "0.5", "--sample-rate", "8000"])
        .arg("--output")
        .arg(&wav)
        .arg(&patch)
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");

    let info = read_wav_info(&wav).unwrap();
    assert_eq!(info.channels, 2);
    assert_eq!(info.sample_rate, 8000);
    assert_eq!(info.format, WavFormat::IeeeFloat);
    // The closing fade ends on or just before the last frame.
    assert!((3990..=4000).contains(&info.num_frames), "{}", info.num_frames);
}

#[test]
fn cli_render_pcm() {
    let dir = TempDir::new().unwrap();
    let patch = write_patch(&dir, "tone.toml", PATCH);
    let wav = dir.path().join("out16.wav");

    let output = modsynth_bin()
        .args(["render", "-d", "0.1", "--bits", "16", "-o"])
        .arg(&wav)
        .arg(&patch)
        .output()
        .unwrap();
    assert!(output.status.success(), "{output:?}");

    let info = read_wav_info(&wav).unwrap();
    assert_eq!(info.bits_per_sample, 16);
    assert_eq!(info.format, WavFormat::Pcm);
}

#[test]
fn cli_render_needs_duration() {
    let dir = TempDir::new().unwrap();
    let patch = write_patch(&dir, "tone.toml", PATCH);

    let output = modsynth_bin()
        .args(["render", "-o"])
        .arg(dir.path().join("never.wav"))
        .arg(&patch)
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(!dir.path().join("never.wav").exists());
}

#[test]
fn cli_render_rejects_bit_depth() {
    let dir = TempDir::new().unwrap();
    let patch = write_patch(&dir, "tone.toml", PATCH);

    let output = modsynth_bin()
        .args(["render", "-d", "1", "--bits", "8", "-o"])
        .arg(dir.path().join("out.wav"))
        .arg(&patch)
        .output()
        .unwrap();
    assert!(!output.status.success());
}
