use std::time::Duration;

use crate::common::SampleRate;

/// Builds a `NonZero` from a literal, checked at compile time.
macro_rules! nz {
    ($n:literal) => {
        const { core::num::NonZero::new($n).unwrap() }
    };
}
pub(crate) use nz;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Linear interpolation between two samples.
///
/// The result should be equivalent to
/// `first * (1 - numerator / denominator) + second * numerator / denominator`.
///
/// To avoid numeric overflows pick smaller numerator.
#[inline]
pub fn lerp(first: f32, second: f32, numerator: u32, denominator: u32) -> f32 {
    first + (second - first) * numerator as f32 / denominator as f32
}

/// Exact duration of `frames` frames at `sample_rate`, truncated to whole
/// nanoseconds.
#[inline]
pub fn frames_to_duration(frames: u64, sample_rate: SampleRate) -> Duration {
    let rate = sample_rate.get() as u64;
    let secs = frames / rate;
    let nanos = (frames % rate) * NANOS_PER_SEC / rate;
    Duration::new(secs, nanos as u32)
}

/// Number of frames in `duration` at `sample_rate`, rounded to the nearest
/// frame. Inverts [`frames_to_duration`] exactly.
#[inline]
pub fn duration_to_frames(duration: Duration, sample_rate: SampleRate) -> u64 {
    let nanos_per_sec = NANOS_PER_SEC as u128;
    let frames =
        (duration.as_nanos() * sample_rate.get() as u128 + nanos_per_sec / 2) / nanos_per_sec;
    frames.min(u64::MAX as u128) as u64
}
