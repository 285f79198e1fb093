//! Audio output for modsynth.
//!
//! This crate provides:
//!
//! - **Real-time playback**: [`OutputStream`] pulls interleaved frames from a
//!   callback on the device's audio thread
//! - **Device discovery**: [`list_devices`] and [`select_device`]
//! - **Offline rendering**: [`WavRecorder`] and [`write_wav_stereo`] write
//!   [`Output`](modsynth_core::Output) frames to stereo WAV files
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use modsynth_io::{OutputStream, StreamConfig};
//!
//! let mut stream = OutputStream::new(StreamConfig::default())?;
//! stream.start(move |data, channels| controller.fill_interleaved(data, channels))?;
//! ```

mod stream;
mod wav;

pub use stream::{AudioDevice, OutputStream, StreamConfig, list_devices, select_device};
pub use wav::{
    WavFormat, WavInfo, WavRecorder, WavSpec, read_wav_info, read_wav_stereo, write_wav_stereo,
};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
