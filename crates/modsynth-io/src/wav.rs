//! Offline rendering to stereo WAV files.

use crate::Result;
use hound::{SampleFormat, WavReader, WavWriter};
use modsynth_core::Output;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// WAV audio encoding format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavFormat {
    /// Linear PCM (integer samples).
    Pcm,
    /// IEEE 754 floating-point samples.
    IeeeFloat,
}

/// WAV file metadata read from the header.
#[derive(Debug, Clone, PartialEq)]
pub struct WavInfo {
    /// Number of audio channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample.
    pub bits_per_sample: u16,
    /// Total number of sample frames (samples per channel).
    pub num_frames: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Audio encoding format.
    pub format: WavFormat,
}

/// Read WAV metadata without loading sample data.
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let num_frames = u64::from(reader.len()) / u64::from(spec.channels.max(1));

    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        num_frames,
        duration_secs: num_frames as f64 / f64::from(spec.sample_rate),
        format: match spec.sample_format {
            SampleFormat::Float => WavFormat::IeeeFloat,
            SampleFormat::Int => WavFormat::Pcm,
        },
    })
}

/// Stereo WAV output settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth: 32 writes float samples, 16 or 24 write PCM.
    pub bits_per_sample: u16,
}

impl Default for WavSpec {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            bits_per_sample: 32,
        }
    }
}

impl From<WavSpec> for hound::WavSpec {
    fn from(spec: WavSpec) -> Self {
        hound::WavSpec {
            channels: 2,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            sample_format: if spec.bits_per_sample == 32 {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        }
    }
}

/// Incremental stereo WAV writer fed one [`Output`] at a time.
///
/// Left and right become the two channels; PCM output is clipped to the
/// representable range.
pub struct WavRecorder {
    writer: WavWriter<BufWriter<File>>,
    spec: WavSpec,
    frames: u64,
}

impl std::fmt::Debug for WavRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WavRecorder")
            .field("spec", &self.spec)
            .field("frames", &self.frames)
            .finish_non_exhaustive()
    }
}

impl WavRecorder {
    /// Create (or truncate) `path`.
    pub fn create<P: AsRef<Path>>(path: P, spec: WavSpec) -> Result<Self> {
        let writer = WavWriter::create(path, hound::WavSpec::from(spec))?;
        Ok(Self {
            writer,
            spec,
            frames: 0,
        })
    }

    /// Append one frame.
    pub fn write(&mut self, output: Output) -> Result<()> {
        if self.spec.bits_per_sample == 32 {
            self.writer.write_sample(output.left)?;
            self.writer.write_sample(output.right)?;
        } else {
            let max_val = (1i32 << (self.spec.bits_per_sample - 1)) as f32;
            for sample in [output.left, output.right] {
                let int_sample = (sample * max_val).clamp(-max_val, max_val - 1.0) as i32;
                self.writer.write_sample(int_sample)?;
            }
        }
        self.frames += 1;
        Ok(())
    }

    /// Frames written so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Flush and patch the header. Returns the frame count.
    pub fn finalize(self) -> Result<u64> {
        self.writer.finalize()?;
        tracing::debug!(frames = self.frames, "wav finalized");
        Ok(self.frames)
    }
}

/// Write a whole buffer of frames as a stereo WAV file.
///
/// # Example
/// ```ignore
/// let silence = vec![Output::SILENT; 48000];
/// write_wav_stereo("silence.wav", &silence, WavSpec::default())?;
/// ```
pub fn write_wav_stereo<P: AsRef<Path>>(path: P, frames: &[Output], spec: WavSpec) -> Result<()> {
    let mut recorder = WavRecorder::create(path, spec)?;
    for &frame in frames {
        recorder.write(frame)?;
    }
    recorder.finalize()?;
    Ok(())
}

/// Read a stereo (or mono) WAV file back as left/right pairs.
///
/// Mono files are duplicated to both channels; channels beyond the second
/// are ignored.
pub fn read_wav_stereo<P: AsRef<Path>>(path: P) -> Result<(Vec<(f32, f32)>, WavInfo)> {
    let info = read_wav_info(path.as_ref())?;
    let reader = WavReader::open(path)?;
    let channels = usize::from(info.channels.max(1));

    let samples: Vec<f32> = match info.format {
        WavFormat::IeeeFloat => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
        WavFormat::Pcm => {
            let max_val = (1i32 << (info.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    let frames = samples
        .chunks(channels)
        .map(|frame| match frame {
            [mono] => (*mono, *mono),
            [left, right, ..] => (*left, *right),
            [] => (0.0, 0.0),
        })
        .collect();
    Ok((frames, info))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn float_frames_survive_exactly() {
        let file = NamedTempFile::new().unwrap();
        let frames = [Output::panned(1.0, -1.0), Output::panned(0.5, 0.5)];
        write_wav_stereo(file.path(), &frames, WavSpec::default()).unwrap();

        let (loaded, info) = read_wav_stereo(file.path()).unwrap();
        assert_eq!(info.channels, 2);
        assert_eq!(info.format, WavFormat::IeeeFloat);
        assert_eq!(loaded, [(1.0, 0.0), (0.125, 0.375)]);
    }

    #[test]
    fn pcm_clips_out_of_range() {
        let file = NamedTempFile::new().unwrap();
        let spec = WavSpec {
            sample_rate: 8000,
            bits_per_sample: 16,
        };
        write_wav_stereo(file.path(), &[Output::new(0.0, 2.0, -2.0)], spec).unwrap();

        let (loaded, info) = read_wav_stereo(file.path()).unwrap();
        assert_eq!(info.format, WavFormat::Pcm);
        assert!((loaded[0].0 - 32767.0 / 32768.0).abs() < 1e-6);
        assert_eq!(loaded[0].1, -1.0);
    }

    #[test]
    fn recorder_counts_frames() {
        let file = NamedTempFile::new().unwrap();
        let mut recorder = WavRecorder::create(file.path(), WavSpec::default()).unwrap();
        for _ in 0..480 {
            recorder.write(Output::SILENT).unwrap();
        }
        assert_eq!(recorder.frames(), 480);
        assert_eq!(recorder.finalize().unwrap(), 480);

        let info = read_wav_info(file.path()).unwrap();
        assert_eq!(info.num_frames, 480);
        assert!((info.duration_secs - 0.01).abs() < 1e-9);
    }
}
