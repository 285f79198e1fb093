//! Integration tests for modsynth-io: rendering synth graphs to WAV.

use modsynth_config::Patch;
use modsynth_core::Output;
use modsynth_io::{WavFormat, WavRecorder, WavSpec, read_wav_info, read_wav_stereo};
use modsynth_synth::SynthGraph;
use tempfile::NamedTempFile;

fn render(patch: &str, sample_rate: u32, frames: usize, spec: WavSpec) -> NamedTempFile {
    let patch = Patch::from_toml(patch).unwrap();
    let mut graph = SynthGraph::new(&patch, sample_rate as f32).unwrap();

    let file = NamedTempFile::new().unwrap();
    let mut recorder = WavRecorder::create(file.path(), spec).unwrap();
    for _ in 0..frames {
        recorder.write(graph.next()).unwrap();
    }
    assert_eq!(recorder.finalize().unwrap(), frames as u64);
    file
}

#[test]
fn rendered_graph_matches_live_output() {
    const PATCH: &str = r#"
        out = ["tone"]
        [oscillators.tone]
        freq = 441
        pan = -0.5
    "#;
    let spec = WavSpec {
        sample_rate: 44100,
        bits_per_sample: 32,
    };
    let file = render(PATCH, 44100, 4410, spec);

    let info = read_wav_info(file.path()).unwrap();
    assert_eq!(info.channels, 2);
    assert_eq!(info.sample_rate, 44100);
    assert_eq!(info.format, WavFormat::IeeeFloat);
    assert_eq!(info.num_frames, 4410);

    let mut graph = SynthGraph::new(&Patch::from_toml(PATCH).unwrap(), 44100.0).unwrap();
    let (frames, _) = read_wav_stereo(file.path()).unwrap();
    for (left, right) in frames {
        let expected: Output = graph.next();
        assert_eq!(left, expected.left);
        assert_eq!(right, expected.right);
    }
}

#[test]
fn sixteen_bit_render_is_close() {
    const PATCH: &str = r#"
        out = ["bass"]
        [oscillators.bass]
        type = "triangle"
        freq = 55
        amp = 0.8
    "#;
    let spec = WavSpec {
        sample_rate: 8000,
        bits_per_sample: 16,
    };
    let file = render(PATCH, 8000, 800, spec);

    let mut graph = SynthGraph::new(&Patch::from_toml(PATCH).unwrap(), 8000.0).unwrap();
    let (frames, info) = read_wav_stereo(file.path()).unwrap();
    assert_eq!(info.format, WavFormat::Pcm);
    for (left, _) in frames {
        assert!((left - graph.next().left).abs() < 1.0 / 16384.0);
    }
}
