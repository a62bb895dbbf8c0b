//! A simple source of samples coming from a buffer.
//!
//! The `SamplesBuffer` struct can be used to treat a list of values as a `Source`.
//! The samples are shared between clones, each clone reads them through its own
//! cursor. This lets one decoded utterance feed many playback units.
//!
//! # Example
//!
//! ```
//! use std::num::NonZero;
//! use pcmdeck::buffer::SamplesBuffer;
//! let rate = NonZero::new(24_000).unwrap();
//! let _ = SamplesBuffer::new(NonZero::new(1).unwrap(), rate, vec![0.1, 0.2, 0.3]);
//! ```
//!

use std::sync::Arc;
use std::time::Duration;

use crate::common::{ChannelCount, Sample, SampleRate};
use crate::math::{duration_to_frames, frames_to_duration};
use crate::source::SeekError;
use crate::Source;

/// A buffer of samples treated as a source.
#[derive(Clone)]
pub struct SamplesBuffer {
    data: Arc<[Sample]>,
    pos: usize,
    channels: ChannelCount,
    sample_rate: SampleRate,
    duration: Duration,
}

impl std::fmt::Debug for SamplesBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SamplesBuffer")
            .field("len", &self.data.len())
            .field("pos", &self.pos)
            .field("channels", &self.channels)
            .field("sample_rate", &self.sample_rate)
            .field("duration", &self.duration)
            .finish()
    }
}

impl SamplesBuffer {
    /// Builds a new `SamplesBuffer`.
    ///
    /// A trailing partial frame is kept in the data but does not count
    /// towards the duration.
    pub fn new<D>(channels: ChannelCount, sample_rate: SampleRate, data: D) -> SamplesBuffer
    where
        D: Into<Arc<[Sample]>>,
    {
        let data = data.into();
        let frames = (data.len() / channels.get() as usize) as u64;
        let duration = frames_to_duration(frames, sample_rate);

        SamplesBuffer {
            data,
            pos: 0,
            channels,
            sample_rate,
            duration,
        }
    }

    /// Total playing time of the buffer.
    #[inline]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Total number of samples, over all channels.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer holds no samples at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// All samples, interleaved, independent of the cursor position.
    #[inline]
    pub fn samples(&self) -> &[Sample] {
        &self.data
    }

    /// A clone reading from the start. Shares the sample storage.
    #[inline]
    pub fn rewound(&self) -> SamplesBuffer {
        SamplesBuffer {
            pos: 0,
            ..self.clone()
        }
    }
}

impl Source for SamplesBuffer {
    #[inline]
    fn current_span_len(&self) -> Option<usize> {
        None
    }

    #[inline]
    fn channels(&self) -> ChannelCount {
        self.channels
    }

    #[inline]
    fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }

    #[inline]
    fn total_duration(&self) -> Option<Duration> {
        Some(self.duration)
    }

    // this is fast because all the samples are in memory already
    // and due to the constant sample_rate we can jump to the right
    // sample directly
    //
    /// This jumps in memory till the frame for `pos`. Saturates at the end
    /// of the buffer.
    #[inline]
    fn try_seek(&mut self, pos: Duration) -> Result<(), SeekError> {
        let channels = self.channels.get() as usize;
        let frame = duration_to_frames(pos, self.sample_rate);
        let new_pos = usize::try_from(frame)
            .unwrap_or(usize::MAX)
            .saturating_mul(channels);

        // always land on the first channel of a frame
        let last_frame_start = self.data.len() - self.data.len() % channels;
        self.pos = new_pos.min(last_frame_start);
        Ok(())
    }
}

impl Iterator for SamplesBuffer {
    type Item = Sample;

    #[inline]
    fn next(&mut self) -> Option<Sample> {
        let sample = self.data.get(self.pos)?;
        self.pos += 1;
        Some(*sample)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.data.len().saturating_sub(self.pos);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SamplesBuffer {}
