use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::common::{ChannelCount, SampleRate};
use crate::source::SeekError;
use crate::{Sample, Source};

/// Internal function that builds a `Stoppable` object.
pub fn stoppable<I>(source: I, remote_stopped: Arc<AtomicBool>) -> Stoppable<I> {
    Stoppable {
        input: source,
        remote_stopped,
        stopped: false,
    }
}

/// Filter that allows another thread to stop the stream.
///
/// The flag is checked before every sample so a stop is honored at the next
/// rendered sample. Once stopped the filter never produces a sample again,
/// even if the flag is cleared.
#[derive(Clone, Debug)]
pub struct Stoppable<I> {
    input: I,

    // The stop request which may be set by another thread.
    remote_stopped: Arc<AtomicBool>,

    stopped: bool,
}

impl<I> Stoppable<I> {
    /// Returns a reference to the inner source.
    #[inline]
    pub fn inner(&self) -> &I {
        &self.input
    }

    /// Returns the inner source.
    #[inline]
    pub fn into_inner(self) -> I {
        self.input
    }
}

impl<I> Iterator for Stoppable<I>
where
    I: Source,
{
    type Item = Sample;

    #[inline]
    fn next(&mut self) -> Option<Sample> {
        if self.stopped || self.remote_stopped.load(Ordering::Relaxed) {
            self.stopped = true;
            return None;
        }
        self.input.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.stopped {
            (0, Some(0))
        } else {
            (0, self.input.size_hint().1)
        }
    }
}

impl<I> Source for Stoppable<I>
where
    I: Source,
{
    #[inline]
    fn current_span_len(&self) -> Option<usize> {
        self.input.current_span_len()
    }

    #[inline]
    fn channels(&self) -> ChannelCount {
        self.input.channels()
    }

    #[inline]
    fn sample_rate(&self) -> SampleRate {
        self.input.sample_rate()
    }

    #[inline]
    fn total_duration(&self) -> Option<Duration> {
        self.input.total_duration()
    }

    #[inline]
    fn try_seek(&mut self, pos: Duration) -> Result<(), SeekError> {
        self.input.try_seek(pos)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use crate::buffer::SamplesBuffer;
    use crate::math::nz;
    use crate::source::Source;

    #[test]
    fn stops_at_next_sample() {
        let flag = Arc::new(AtomicBool::new(false));
        let mut source =
            SamplesBuffer::new(nz!(1), nz!(1), vec![0.1, 0.2, 0.3]).stoppable(flag.clone());

        assert_eq!(source.next(), Some(0.1));
        flag.store(true, Ordering::Relaxed);
        assert_eq!(source.next(), None);

        flag.store(false, Ordering::Relaxed);
        assert_eq!(source.next(), None);
    }
}
