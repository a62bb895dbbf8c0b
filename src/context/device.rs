//! Output through a `cpal` device stream.

use std::fmt;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SupportedStreamConfigRange;

use crate::common::{assert_error_traits, ChannelCount, SampleRate};

use super::{new_parts, AudioContext, RenderOutput};

/// Error opening or running the output device.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// No output device is available on the system.
    #[error("There is no output device")]
    NoDevice,
    /// No output device carries the requested name.
    #[error("There is no output device named '{0}'")]
    DeviceNotFound(String),
    /// The output devices could not be listed.
    #[error("Could not list the output devices")]
    Devices(#[source] cpal::DevicesError),
    /// Failed to get the default output configuration for the device.
    #[error("Could not get default output configuration for output device: '{device_name}'")]
    DefaultOutputConfig {
        /// Error returned by the backend
        #[source]
        source: cpal::DefaultStreamConfigError,
        /// Name of the device
        device_name: String,
    },
    /// Failed to get the supported output configurations for the device.
    #[error("Could not get supported output configurations for output device: '{device_name}'")]
    OutputConfigs {
        /// Error returned by the backend
        #[source]
        source: cpal::SupportedStreamConfigsError,
        /// Name of the device
        device_name: String,
    },
    /// The device reported a configuration without channels or samples.
    #[error("Output device '{device_name}' reported an empty configuration")]
    EmptyConfig {
        /// Name of the device
        device_name: String,
    },
    /// The output stream could not be built.
    #[error("Could not build the output stream")]
    BuildStream(#[source] cpal::BuildStreamError),
    /// The output stream could not be started.
    #[error("Could not start the output stream")]
    PlayStream(#[source] cpal::PlayStreamError),
    /// The device only offers a sample format this crate can not produce.
    #[error("Sample format {0:?} is not supported")]
    UnsupportedSampleFormat(cpal::SampleFormat),
}
assert_error_traits! {DeviceError}

/// Describes the output stream's configuration
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OutputConfig {
    /// The number of channels
    pub channel_count: ChannelCount,
    /// The sample rate the audio card will be playing back at
    pub sample_rate: SampleRate,
    /// The sample format used by the audio card.
    /// Note we will always convert to this from f32
    pub sample_format: cpal::SampleFormat,
}

impl OutputConfig {
    fn from_supported(value: &cpal::SupportedStreamConfig) -> Option<OutputConfig> {
        Some(OutputConfig {
            channel_count: ChannelCount::new(value.channels())?,
            sample_rate: SampleRate::new(value.sample_rate().0)?,
            sample_format: value.sample_format(),
        })
    }

    fn supported_given(&self, supported: &SupportedStreamConfigRange) -> bool {
        self.channel_count.get() == supported.channels()
            && self.sample_format == supported.sample_format()
            && self.sample_rate.get() <= supported.max_sample_rate().0
            && self.sample_rate.get() >= supported.min_sample_rate().0
    }

    fn with_f32_samples(&self) -> OutputConfig {
        let mut this = *self;
        this.sample_format = cpal::SampleFormat::F32;
        this
    }

    fn stream_config(&self) -> cpal::StreamConfig {
        cpal::StreamConfig {
            channels: self.channel_count.get(),
            sample_rate: cpal::SampleRate(self.sample_rate.get()),
            buffer_size: cpal::BufferSize::Default,
        }
    }
}

/// Keeps the device stream alive. Dropping it stops the device callback.
pub(crate) struct DeviceStream {
    _stream: cpal::Stream,
    device_name: String,
    config: OutputConfig,
}

impl fmt::Debug for DeviceStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceStream")
            .field("device_name", &self.device_name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Names of the output devices of the default host.
pub fn available_outputs() -> Result<Vec<String>, DeviceError> {
    let devices = cpal::default_host()
        .output_devices()
        .map_err(DeviceError::Devices)?;
    Ok(devices.filter_map(|device| device.name().ok()).collect())
}

fn device_name(device: &cpal::Device) -> String {
    device.name().unwrap_or_else(|_| "unknown".to_string())
}

fn pick_device(name: Option<&str>) -> Result<cpal::Device, DeviceError> {
    let host = cpal::default_host();
    match name {
        None => host.default_output_device().ok_or(DeviceError::NoDevice),
        Some(name) => host
            .output_devices()
            .map_err(DeviceError::Devices)?
            .find(|device| device.name().is_ok_and(|n| n == name))
            .ok_or_else(|| DeviceError::DeviceNotFound(name.to_string())),
    }
}

fn choose_config(
    device: &cpal::Device,
    sample_rates: &[SampleRate],
    channel_counts: &[ChannelCount],
) -> Result<OutputConfig, DeviceError> {
    let supported: Vec<SupportedStreamConfigRange> = device
        .supported_output_configs()
        .map_err(|source| DeviceError::OutputConfigs {
            source,
            device_name: device_name(device),
        })?
        .collect();
    let default = device
        .default_output_config()
        .map_err(|source| DeviceError::DefaultOutputConfig {
            source,
            device_name: device_name(device),
        })?;
    let default =
        OutputConfig::from_supported(&default).ok_or_else(|| DeviceError::EmptyConfig {
            device_name: device_name(device),
        })?;

    let is_supported = |config: &OutputConfig| supported.iter().any(|s| config.supported_given(s));

    // Lets try getting f32 output from the default config, as that's what
    // the mixer produces
    let mut config = if is_supported(&default.with_f32_samples()) {
        default.with_f32_samples()
    } else {
        default
    };

    config = set_preferred_if_supported(config, channel_counts, &is_supported, |c, channels| {
        c.channel_count = channels
    });
    config = set_preferred_if_supported(config, sample_rates, &is_supported, |c, rate| {
        c.sample_rate = rate
    });
    Ok(config)
}

fn set_preferred_if_supported<T: Copy>(
    mut config: OutputConfig,
    options: &[T],
    is_supported: impl Fn(&OutputConfig) -> bool,
    setter: impl Fn(&mut OutputConfig, T),
) -> OutputConfig {
    let fallback = config;
    for option in options {
        setter(&mut config, *option);
        if is_supported(&config) {
            return config;
        }
    }
    fallback
}

fn default_error_callback(err: cpal::StreamError) {
    #[cfg(feature = "tracing")]
    tracing::error!("audio stream error: {err}");
    #[cfg(not(feature = "tracing"))]
    eprintln!("audio stream error: {err}");
}

/// Opens a device context. The stream starts right away, a suspended
/// context renders silence until resumed.
pub(crate) fn open(
    name: Option<&str>,
    sample_rates: &[SampleRate],
    channel_counts: &[ChannelCount],
    suspended: bool,
) -> Result<AudioContext, DeviceError> {
    let device = pick_device(name)?;
    let config = choose_config(&device, sample_rates, channel_counts)?;
    let (mixer, shared, output) = new_parts(config.channel_count, config.sample_rate, suspended);

    let stream = build_stream(&device, config, output)?;
    stream.play().map_err(DeviceError::PlayStream)?;

    let device_name = device_name(&device);
    #[cfg(feature = "tracing")]
    tracing::debug!(device = %device_name, ?config, "started output stream");

    let stream = DeviceStream {
        _stream: stream,
        device_name,
        config,
    };
    Ok(AudioContext::with_device(mixer, shared, stream))
}

fn build_stream(
    device: &cpal::Device,
    config: OutputConfig,
    mut output: RenderOutput,
) -> Result<cpal::Stream, DeviceError> {
    let stream_config = config.stream_config();

    macro_rules! build_output_streams {
        ($($sample_format:tt, $generic:ty);+) => {
            match config.sample_format {
                $(
                    cpal::SampleFormat::$sample_format => device.build_output_stream::<$generic, _, _>(
                        &stream_config,
                        move |data: &mut [$generic], _: &cpal::OutputCallbackInfo| output.fill(data),
                        default_error_callback,
                        None,
                    ),
                )+
                other => return Err(DeviceError::UnsupportedSampleFormat(other)),
            }
        };
    }

    let result = build_output_streams!(
        F32, f32;
        F64, f64;
        I8, i8;
        I16, i16;
        I32, i32;
        I64, i64;
        U8, u8;
        U16, u16;
        U32, u32;
        U64, u64
    );

    result.map_err(DeviceError::BuildStream)
}
