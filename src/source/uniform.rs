use std::time::Duration;

use crate::common::{ChannelCount, SampleRate};
use crate::conversions::{ChannelCountConverter, SampleRateConverter};
use crate::{Sample, Source};

/// An iterator that reads from a `Source` and converts the samples to a
/// specific sample-rate and channels count.
///
/// It implements `Source` as well, with the channels and sample rate passed to
/// `new`. The input must not change its own parameters while playing.
pub struct UniformSourceIterator<I>
where
    I: Source,
{
    inner: ChannelCountConverter<SampleRateConverter<I>>,
    target_channels: ChannelCount,
    target_sample_rate: SampleRate,
    total_duration: Option<Duration>,
}

impl<I> UniformSourceIterator<I>
where
    I: Source,
{
    /// Wrap a `Source` and lazily convert its samples to a specific
    /// sample-rate and channels count.
    #[inline]
    pub fn new(
        input: I,
        target_channels: ChannelCount,
        target_sample_rate: SampleRate,
    ) -> UniformSourceIterator<I> {
        let total_duration = input.total_duration();
        let from_channels = input.channels();
        let from_sample_rate = input.sample_rate();

        let resampled =
            SampleRateConverter::new(input, from_sample_rate, target_sample_rate, from_channels);
        let inner = ChannelCountConverter::new(resampled, from_channels, target_channels);

        UniformSourceIterator {
            inner,
            target_channels,
            target_sample_rate,
            total_duration,
        }
    }

    /// Returns a reference to the source being converted.
    #[inline]
    pub fn inner(&self) -> &I {
        self.inner.inner().inner()
    }
}

impl<I> Iterator for UniformSourceIterator<I>
where
    I: Source,
{
    type Item = Sample;

    #[inline]
    fn next(&mut self) -> Option<Sample> {
        self.inner.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<I> Source for UniformSourceIterator<I>
where
    I: Source,
{
    #[inline]
    fn current_span_len(&self) -> Option<usize> {
        None
    }

    #[inline]
    fn channels(&self) -> ChannelCount {
        self.target_channels
    }

    #[inline]
    fn sample_rate(&self) -> SampleRate {
        self.target_sample_rate
    }

    #[inline]
    fn total_duration(&self) -> Option<Duration> {
        self.total_duration
    }
}
