//! pcmdeck common constants

use std::time::Duration;

use crate::common::{ChannelCount, SampleRate};
use crate::math::nz;

/// The sample rate (Hz) of the PCM produced by the speech service.
pub const PCM_SAMPLE_RATE: SampleRate = nz!(24_000);

/// The PCM produced by the speech service is always mono.
pub const PCM_CHANNELS: ChannelCount = nz!(1);

/// Bytes per PCM sample (16-bit signed little-endian).
pub const PCM_BYTES_PER_SAMPLE: usize = 2;

/// Interval between two polling frames, roughly one display refresh at 60 Hz.
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_micros(16_667);
