//! Sources of sound and the filters a playback unit is built from.

use std::sync::atomic::{AtomicBool, AtomicUsize};
use std::sync::Arc;
use std::time::Duration;

use crate::common::{assert_error_traits, ChannelCount, Sample, SampleRate};

pub use self::done::Done;
pub use self::stoppable::Stoppable;
pub use self::uniform::UniformSourceIterator;

mod done;
mod stoppable;
mod uniform;

/// A source of samples.
///
/// # A quick lesson about sounds
///
/// A sound is stored as a list of *samples*, amplitudes read at a fixed
/// interval. The number of samples read per second is the *sample rate*.
/// Speech coming from the synthesis service is read 24000 times per second.
///
/// Sounds with more than one *channel* are stored *interleaved*: the first
/// sample of every channel, then the second sample of every channel, and so
/// on. One sample of every channel together is a *frame*.
///
/// ## The `Source` trait
///
/// A Rust object that represents a sound implements `Source`, which requires
/// `Iterator<Item = Sample>` as well. The channel count and sample rate are
/// available through `channels` and `sample_rate`.
///
/// Sources played through an [`AudioContext`](crate::AudioContext) never
/// change their channel count or sample rate while playing.
pub trait Source: Iterator<Item = Sample> {
    /// Returns the number of samples before the current span ends. `None`
    /// means "until the sound ends".
    fn current_span_len(&self) -> Option<usize>;

    /// Returns the number of channels. Channels are always interleaved.
    fn channels(&self) -> ChannelCount;

    /// Returns the rate at which the source should be played. In number of
    /// samples per second.
    fn sample_rate(&self) -> SampleRate;

    /// Returns the total duration of this source, if known.
    ///
    /// `None` indicates at the same time "infinite" or "unknown".
    fn total_duration(&self) -> Option<Duration>;

    /// Attempts to seek to a given position in the current source.
    ///
    /// As long as the duration of the source is known seek is guaranteed to
    /// saturate at the end of the source.
    fn try_seek(&mut self, _: Duration) -> Result<(), SeekError> {
        Err(SeekError::NotSupported {
            underlying_source: std::any::type_name::<Self>(),
        })
    }

    /// Makes the sound stoppable from another thread. Once `stopped` is set
    /// the source ends at the next sample.
    #[inline]
    fn stoppable(self, stopped: Arc<AtomicBool>) -> Stoppable<Self>
    where
        Self: Sized,
    {
        stoppable::stoppable(self, stopped)
    }

    /// Decrements `signal` once, when the source runs out of samples.
    #[inline]
    fn done(self, signal: Arc<AtomicUsize>) -> Done<Self>
    where
        Self: Sized,
    {
        Done::new(self, signal)
    }
}

impl Source for Box<dyn Source + Send> {
    #[inline]
    fn current_span_len(&self) -> Option<usize> {
        (**self).current_span_len()
    }

    #[inline]
    fn channels(&self) -> ChannelCount {
        (**self).channels()
    }

    #[inline]
    fn sample_rate(&self) -> SampleRate {
        (**self).sample_rate()
    }

    #[inline]
    fn total_duration(&self) -> Option<Duration> {
        (**self).total_duration()
    }

    #[inline]
    fn try_seek(&mut self, pos: Duration) -> Result<(), SeekError> {
        (**self).try_seek(pos)
    }
}

/// Occurs when `try_seek` fails because the underlying source does not
/// support seeking.
#[derive(Debug, thiserror::Error, Clone)]
#[non_exhaustive]
pub enum SeekError {
    /// One of the underlying sources does not support seeking
    #[error("Seeking is not supported by source: {underlying_source}")]
    NotSupported {
        /// The source that did not support seek
        underlying_source: &'static str,
    },
}
assert_error_traits! {SeekError}
