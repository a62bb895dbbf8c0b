use std::mem;

use num_rational::Ratio;

use crate::common::{ChannelCount, Sample, SampleRate};
use crate::math::lerp;

/// Iterator that converts from a certain sample rate to another.
///
/// The converter uses simple linear interpolation between neighbouring input
/// frames. Good enough for speech, use a proper resampler for music.
#[derive(Clone, Debug)]
pub struct SampleRateConverter<I> {
    /// The iterator that gives us samples.
    input: I,
    /// We convert chunks of `from` frames into chunks of `to` frames.
    from: u64,
    /// We convert chunks of `from` frames into chunks of `to` frames.
    to: u64,
    /// Number of channels in the stream
    channels: usize,
    /// One sample per channel, the input frame at `input_frame`.
    current_frame: Vec<Sample>,
    /// The input frame right after `current_frame`. Empty at the end.
    next_frame: Vec<Sample>,
    /// Index of `current_frame` in the input.
    input_frame: u64,
    /// Index of the frame the next output sample belongs to.
    output_frame: u64,
    /// Channel of the next output sample.
    output_channel: usize,
}

impl<I> SampleRateConverter<I>
where
    I: Iterator<Item = Sample>,
{
    /// Create new sample rate converter.
    pub fn new(
        mut input: I,
        from: SampleRate,
        to: SampleRate,
        channels: ChannelCount,
    ) -> SampleRateConverter<I> {
        let channels = channels.get() as usize;

        let (current_frame, next_frame) = if from == to {
            (Vec::new(), Vec::new())
        } else {
            let first = read_frame(&mut input, channels);
            let next = read_frame(&mut input, channels);
            (first, next)
        };

        // Reducing the ratio keeps the interpolation numerator small.
        let (to, from) = Ratio::new(to.get(), from.get()).into_raw();

        SampleRateConverter {
            input,
            from: from as u64,
            to: to as u64,
            channels,
            current_frame,
            next_frame,
            input_frame: 0,
            output_frame: 0,
            output_channel: 0,
        }
    }

    /// Returns a reference to the underlying iterator.
    #[inline]
    pub fn inner(&self) -> &I {
        &self.input
    }

    fn next_input_frame(&mut self) {
        self.input_frame += 1;
        mem::swap(&mut self.current_frame, &mut self.next_frame);
        self.next_frame = read_frame(&mut self.input, self.channels);
    }
}

/// Reads one whole frame, an incomplete frame at the end is dropped.
fn read_frame<I>(input: &mut I, channels: usize) -> Vec<Sample>
where
    I: Iterator<Item = Sample>,
{
    let frame: Vec<_> = input.by_ref().take(channels).collect();
    if frame.len() == channels {
        frame
    } else {
        Vec::new()
    }
}

impl<I> Iterator for SampleRateConverter<I>
where
    I: Iterator<Item = Sample>,
{
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        if self.from == self.to {
            return self.input.next();
        }

        if self.output_channel == 0 {
            let wanted = self.output_frame * self.from / self.to;
            while self.input_frame < wanted && !self.current_frame.is_empty() {
                self.next_input_frame();
            }
        }
        let current = *self.current_frame.get(self.output_channel)?;

        let numerator = (self.output_frame * self.from % self.to) as u32;
        let sample = match self.next_frame.get(self.output_channel) {
            Some(next) => lerp(current, *next, numerator, self.to as u32),
            None => current,
        };

        self.output_channel += 1;
        if self.output_channel == self.channels {
            self.output_channel = 0;
            self.output_frame += 1;
        }

        Some(sample)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.from == self.to {
            self.input.size_hint()
        } else {
            (0, None)
        }
    }
}

#[cfg(test)]
mod test {
    use super::SampleRateConverter;
    use crate::math::nz;
    use approx::assert_abs_diff_eq;

    #[test]
    fn same_rate_passes_through() {
        let input = vec![0.1, 0.2, 0.3];
        let output =
            SampleRateConverter::new(input.clone().into_iter(), nz!(24_000), nz!(24_000), nz!(1))
                .collect::<Vec<_>>();
        assert_eq!(output, input);
    }

    #[test]
    fn upsample_interpolates() {
        let input = vec![0.0, 1.0, 0.0];
        let output = SampleRateConverter::new(input.into_iter(), nz!(24_000), nz!(48_000), nz!(1))
            .collect::<Vec<_>>();
        assert_eq!(output.len(), 6);
        for (got, expected) in output.iter().zip([0.0, 0.5, 1.0, 0.5, 0.0, 0.0]) {
            assert_abs_diff_eq!(*got, expected, epsilon = 1e-6);
        }
    }

    #[test]
    fn downsample_skips_frames() {
        let input = vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5];
        let output = SampleRateConverter::new(input.into_iter(), nz!(48_000), nz!(24_000), nz!(1))
            .collect::<Vec<_>>();
        assert_eq!(output, [0.0, 0.2, 0.4]);
    }

    #[test]
    fn keeps_channels_together() {
        let input = vec![1.0, -1.0, 3.0, -3.0];
        let output = SampleRateConverter::new(input.into_iter(), nz!(1), nz!(2), nz!(2))
            .collect::<Vec<_>>();
        assert_eq!(output, [1.0, -1.0, 2.0, -2.0, 3.0, -3.0, 3.0, -3.0]);
    }
}
