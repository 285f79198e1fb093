//! Real-time output via cpal.
//!
//! [`OutputStream`] opens one output device and pulls interleaved frames
//! from a callback on cpal's audio thread. The callback must not block; the
//! synth controller's `fill_interleaved` is the intended producer.

use crate::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host, Stream};

/// Device name via `description()` (cpal 0.17+).
fn device_name(device: &Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// An output device as listed by [`list_devices`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDevice {
    /// Position in the host's output device list.
    pub index: usize,
    /// Human-readable device name.
    pub name: String,
    /// Default sample rate in Hz.
    pub default_sample_rate: u32,
    /// Default channel count.
    pub channels: u16,
    /// True for the host's default output device.
    pub is_default: bool,
}

/// Output stream configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Buffer size in frames; `None` lets the host decide.
    pub buffer_size: Option<u32>,
    /// Device index, exact name, or case-insensitive name fragment
    /// (uses the default device if `None`).
    pub device: Option<String>,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_size: None,
            device: None,
        }
    }
}

/// List the host's output devices.
pub fn list_devices() -> Result<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let default_name = host
        .default_output_device()
        .and_then(|d| device_name(&d).ok());

    let devices = host
        .output_devices()
        .map_err(|e| Error::Stream(e.to_string()))?
        .enumerate()
        .filter_map(|(index, device)| {
            let name = device_name(&device).ok()?;
            let config = device.default_output_config().ok();
            Some(AudioDevice {
                index,
                is_default: default_name.as_deref() == Some(name.as_str()),
                default_sample_rate: config.as_ref().map_or(48000, |c| c.sample_rate()),
                channels: config.as_ref().map_or(2, |c| c.channels()),
                name,
            })
        })
        .collect();

    Ok(devices)
}

/// Pick a device from `names` by index, exact name, or case-insensitive
/// fragment, in that order.
///
/// Several fragment matches pick the first and log a warning.
pub fn select_device(names: &[String], name_or_index: &str) -> Result<usize> {
    if let Ok(index) = name_or_index.parse::<usize>() {
        return if index < names.len() {
            Ok(index)
        } else {
            Err(Error::DeviceNotFound(format!(
                "output device index {} (only {} devices available)",
                index,
                names.len()
            )))
        };
    }

    if let Some(index) = names.iter().position(|n| n == name_or_index) {
        return Ok(index);
    }

    let search = name_or_index.to_lowercase();
    let matches: Vec<usize> = names
        .iter()
        .enumerate()
        .filter(|(_, n)| n.to_lowercase().contains(&search))
        .map(|(i, _)| i)
        .collect();

    match matches.as_slice() {
        [] => Err(Error::DeviceNotFound(format!(
            "no output device matching '{}'",
            name_or_index
        ))),
        [only] => Ok(*only),
        [first, ..] => {
            tracing::warn!(
                search = name_or_index,
                matches = matches.len(),
                chosen = names[*first].as_str(),
                "several output devices match, using the first"
            );
            Ok(*first)
        }
    }
}

fn find_output_device(host: &Host, name_or_index: Option<&str>) -> Result<Device> {
    let Some(search) = name_or_index else {
        return host.default_output_device().ok_or(Error::NoDevice);
    };

    let devices: Vec<Device> = host
        .output_devices()
        .map_err(|e| Error::Stream(e.to_string()))?
        .collect();
    let names: Vec<String> = devices
        .iter()
        .map(|d| device_name(d).unwrap_or_default())
        .collect();

    let index = select_device(&names, search)?;
    devices.into_iter().nth(index).ok_or(Error::NoDevice)
}

/// A playing (or ready) output stream on one device.
pub struct OutputStream {
    device: Device,
    name: String,
    config: StreamConfig,
    channels: u16,
    stream: Option<Stream>,
}

impl std::fmt::Debug for OutputStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputStream")
            .field("device", &self.name)
            .field("config", &self.config)
            .field("channels", &self.channels)
            .field("running", &self.stream.is_some())
            .finish()
    }
}

impl OutputStream {
    /// Open the configured output device.
    pub fn new(config: StreamConfig) -> Result<Self> {
        let host = cpal::default_host();
        let device = find_output_device(&host, config.device.as_deref())?;
        let name = device_name(&device).unwrap_or_else(|_| "<unnamed>".to_string());
        let channels = device
            .default_output_config()
            .map(|c| c.channels())
            .unwrap_or(2);

        tracing::info!(
            host = host.id().name(),
            device = name.as_str(),
            channels,
            "output device opened"
        );

        Ok(Self {
            device,
            name,
            config,
            channels,
            stream: None,
        })
    }

    /// Device name.
    pub fn device_name(&self) -> &str {
        &self.name
    }

    /// Configured sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// Channels per interleaved frame.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Start pulling frames from `fill`.
    ///
    /// `fill` receives the interleaved device buffer and the channel count.
    /// The stream plays until [`stop`](Self::stop) or drop.
    pub fn start<F>(&mut self, mut fill: F) -> Result<()>
    where
        F: FnMut(&mut [f32], usize) + Send + 'static,
    {
        let stream_config = cpal::StreamConfig {
            channels: self.channels,
            sample_rate: self.config.sample_rate,
            buffer_size: self
                .config
                .buffer_size
                .map_or(cpal::BufferSize::Default, cpal::BufferSize::Fixed),
        };
        let channels = usize::from(self.channels);

        let stream = self
            .device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| fill(data, channels),
                |err| tracing::error!(error = %err, "output stream error"),
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;
        stream.play().map_err(|e| Error::Stream(e.to_string()))?;

        tracing::info!(
            channels = self.channels,
            sample_rate = self.config.sample_rate,
            "output stream started"
        );
        self.stream = Some(stream);
        Ok(())
    }

    /// Stop and release the stream.
    pub fn stop(&mut self) {
        if self.stream.take().is_some() {
            tracing::info!("output stream stopped");
        }
    }

    /// True between [`start`](Self::start) and [`stop`](Self::stop).
    pub fn is_running(&self) -> bool {
        self.stream.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        ["Built-in Output", "USB Audio CODEC", "USB Headset"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn select_by_index() {
        assert_eq!(select_device(&names(), "1").unwrap(), 1);
        assert!(matches!(
            select_device(&names(), "7"),
            Err(Error::DeviceNotFound(_))
        ));
    }

    #[test]
    fn select_exact_before_fragment() {
        assert_eq!(select_device(&names(), "USB Headset").unwrap(), 2);
    }

    #[test]
    fn select_fragment_case_insensitive() {
        assert_eq!(select_device(&names(), "built-in").unwrap(), 0);
        // Ambiguous fragments take the first match.
        assert_eq!(select_device(&names(), "usb").unwrap(), 1);
    }

    #[test]
    fn select_missing() {
        assert!(matches!(
            select_device(&names(), "hdmi"),
            Err(Error::DeviceNotFound(_))
        ));
    }

    #[test]
    fn list_devices_does_not_fail() {
        // Device availability depends on the system.
        assert!(list_devices().is_ok());
    }

    #[test]
    fn default_config() {
        let config = StreamConfig::default();
        assert_eq!(config.sample_rate, 48000);
        assert!(config.buffer_size.is_none());
        assert!(config.device.is_none());
    }
}
