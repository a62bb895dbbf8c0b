use crate::common::ChannelCount;

/// Iterator that converts from a certain channel count to another.
///
/// Adding channels repeats the input channels in order, so mono is copied
/// to every output channel. Removing channels drops the extra ones.
#[derive(Clone, Debug)]
pub struct ChannelCountConverter<I>
where
    I: Iterator,
{
    input: I,
    from: u16,
    to: u16,
    sample_repeat: Vec<Option<I::Item>>,
    next_output_sample_pos: u16,
}

impl<I> ChannelCountConverter<I>
where
    I: Iterator,
{
    /// Initializes the iterator.
    #[inline]
    pub fn new(input: I, from: ChannelCount, to: ChannelCount) -> ChannelCountConverter<I> {
        let from = from.get();
        let to = to.get();

        ChannelCountConverter {
            input,
            from,
            to,
            sample_repeat: {
                let mut vec = Vec::with_capacity(from as usize);
                vec.resize_with(from as usize, || None);
                vec
            },
            next_output_sample_pos: 0,
        }
    }

    /// Returns a reference to the underlying iterator.
    #[inline]
    pub fn inner(&self) -> &I {
        &self.input
    }
}

impl<I> Iterator for ChannelCountConverter<I>
where
    I: Iterator,
    I::Item: Clone,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        let result = if self.next_output_sample_pos < self.from {
            let value = self.input.next();
            self.sample_repeat[self.next_output_sample_pos as usize] = value.clone();
            value
        } else {
            self.sample_repeat[(self.next_output_sample_pos % self.from) as usize].clone()
        };

        self.next_output_sample_pos += 1;

        if self.next_output_sample_pos == self.to {
            self.next_output_sample_pos = 0;

            if self.from > self.to {
                for _ in self.to..self.from {
                    self.input.next(); // discarding extra input
                }
            }
        }

        result
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let (min, max) = self.input.size_hint();

        let min =
            (min / self.from as usize) * self.to as usize + self.next_output_sample_pos as usize;
        let max = max.map(|max| {
            (max / self.from as usize) * self.to as usize + self.next_output_sample_pos as usize
        });

        (min, max)
    }
}

impl<I> ExactSizeIterator for ChannelCountConverter<I>
where
    I: ExactSizeIterator,
    I::Item: Clone,
{
}

#[cfg(test)]
mod test {
    use super::ChannelCountConverter;
    use crate::math::nz;

    #[test]
    fn remove_channels() {
        let input = vec![1u16, 2, 3, 4, 5, 6];
        let output =
            ChannelCountConverter::new(input.into_iter(), nz!(3), nz!(2)).collect::<Vec<_>>();
        assert_eq!(output, [1, 2, 4, 5]);

        let input = vec![1u16, 2, 3, 4, 5, 6, 7, 8];
        let output =
            ChannelCountConverter::new(input.into_iter(), nz!(4), nz!(1)).collect::<Vec<_>>();
        assert_eq!(output, [1, 5]);
    }

    #[test]
    fn mono_to_stereo() {
        let input = vec![0.25f32, -0.5];
        let output =
            ChannelCountConverter::new(input.into_iter(), nz!(1), nz!(2)).collect::<Vec<_>>();
        assert_eq!(output, [0.25, 0.25, -0.5, -0.5]);
    }

    #[test]
    fn len_more() {
        let input = vec![1u16, 2, 3, 4];
        let output = ChannelCountConverter::new(input.into_iter(), nz!(2), nz!(3));
        assert_eq!(output.len(), 6);
    }
}
