//! Mixer that plays the playback units of one output context.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "crossbeam-channel")]
use crossbeam_channel::{unbounded as channel, Receiver, Sender};
#[cfg(not(feature = "crossbeam-channel"))]
use std::sync::mpsc::{channel, Receiver, Sender};

use crate::common::{ChannelCount, SampleRate};
use crate::source::{SeekError, Source, UniformSourceIterator};
use crate::Sample;

/// Builds a new mixer.
///
/// You can choose the characteristics of the output thanks to this
/// constructor. All the sounds added to the mixer will be converted to these
/// values.
///
/// Unlike a plain source the output of the mixer never ends: while nothing is
/// playing it produces silence. An output device keeps rendering for as long
/// as the context is open.
pub fn mixer(channels: ChannelCount, sample_rate: SampleRate) -> (Mixer, MixerSource) {
    let (tx, rx) = channel();

    let input = Mixer(Arc::new(Inner {
        pending_tx: tx,
        active: Arc::new(AtomicUsize::new(0)),
        channels,
        sample_rate,
    }));

    let output = MixerSource {
        current_sources: Vec::with_capacity(4),
        input: input.clone(),
        sample_count: 0,
        still_pending: vec![],
        pending_rx: rx,
    };

    (input, output)
}

/// The input of the mixer.
#[derive(Clone)]
pub struct Mixer(Arc<Inner>);

struct Inner {
    pending_tx: Sender<Box<dyn Source + Send>>,
    active: Arc<AtomicUsize>,
    channels: ChannelCount,
    sample_rate: SampleRate,
}

impl Mixer {
    /// Adds a new source to mix to the existing ones.
    #[inline]
    pub fn add<T>(&self, source: T)
    where
        T: Source + Send + 'static,
    {
        let uniform_source =
            UniformSourceIterator::new(source, self.0.channels, self.0.sample_rate)
                .done(self.0.active.clone());
        self.0.active.fetch_add(1, Ordering::Relaxed);
        // Ignore send errors (channel dropped means MixerSource was dropped)
        if self.0.pending_tx.send(Box::new(uniform_source)).is_err() {
            self.0.active.fetch_sub(1, Ordering::Relaxed);
        }
    }

    /// Number of sources that have been added and not yet run out.
    ///
    /// A stopped source is only released by the render side, it keeps being
    /// counted until the next sample is rendered.
    #[inline]
    pub fn active_sources(&self) -> usize {
        self.0.active.load(Ordering::Relaxed)
    }

    /// Channel count of the mixed output.
    #[inline]
    pub fn channels(&self) -> ChannelCount {
        self.0.channels
    }

    /// Sample rate of the mixed output.
    #[inline]
    pub fn sample_rate(&self) -> SampleRate {
        self.0.sample_rate
    }
}

/// The output of the mixer. Implements `Source`.
pub struct MixerSource {
    // The current iterator that produces samples.
    current_sources: Vec<Box<dyn Source + Send>>,

    // The pending sounds.
    input: Mixer,

    // The number of samples produced so far.
    sample_count: usize,

    // Sources received while not at a frame boundary.
    still_pending: Vec<Box<dyn Source + Send>>,

    // Receiver for pending sources from the channel.
    pending_rx: Receiver<Box<dyn Source + Send>>,
}

impl Source for MixerSource {
    #[inline]
    fn current_span_len(&self) -> Option<usize> {
        None
    }

    #[inline]
    fn channels(&self) -> ChannelCount {
        self.input.0.channels
    }

    #[inline]
    fn sample_rate(&self) -> SampleRate {
        self.input.0.sample_rate
    }

    #[inline]
    fn total_duration(&self) -> Option<Duration> {
        None
    }

    #[inline]
    fn try_seek(&mut self, _: Duration) -> Result<(), SeekError> {
        Err(SeekError::NotSupported {
            underlying_source: std::any::type_name::<Self>(),
        })
    }
}

impl Iterator for MixerSource {
    type Item = Sample;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.start_pending_sources();

        self.sample_count += 1;

        Some(self.sum_current_sources())
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

impl MixerSource {
    // Samples from the #next() function are interlaced for each of the channels.
    // We need to ensure we start playing sources so that their samples are
    // in-step with the modulo of the samples produced so far. Otherwise, the
    // sound will play on the wrong channels, e.g. left / right will be reversed.
    fn start_pending_sources(&mut self) {
        let in_step = self
            .sample_count
            .is_multiple_of(self.input.0.channels.get() as usize);
        if !in_step {
            self.still_pending
                .extend(std::iter::from_fn(|| self.pending_rx.try_recv().ok()));
            return;
        }

        self.current_sources.append(&mut self.still_pending);
        while let Ok(source) = self.pending_rx.try_recv() {
            self.current_sources.push(source);
        }
    }

    fn sum_current_sources(&mut self) -> Sample {
        let mut sum = 0.0;
        self.current_sources.retain_mut(|source| {
            match source.next() {
                Some(value) => {
                    sum += value;
                    true // Keep this source
                }
                None => false, // Remove exhausted source
            }
        });

        sum
    }
}
