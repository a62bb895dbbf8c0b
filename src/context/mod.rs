//! The output context: the handle to the audio rendering subsystem.
//!
//! An [`AudioContext`] owns a [`Mixer`] and whatever pulls samples out of
//! it. For a *device* context (feature `playback`) that is the callback of a
//! `cpal` output stream. For an *offline* context it is the owner, calling
//! [`AudioContext::render`].
//!
//! The context keeps a render clock: the number of frames pulled from the
//! mixer, expressed as a duration. That clock is the only notion of time the
//! transport uses. It does not advance while the context is suspended or
//! after it has been closed.
//!
//! Sound is played through [`PlaybackUnit`]s. A unit is created from a
//! buffer, started once at some offset and then either runs out or gets
//! stopped. It can not be paused and it can not be restarted.
//!
//! # Example
//!
//! ```
//! use std::num::NonZero;
//! use std::time::Duration;
//! use pcmdeck::{ContextBuilder, SamplesBuffer};
//!
//! let mut context = ContextBuilder::offline().build()?;
//! let rate = NonZero::new(24_000).unwrap();
//! let buffer = SamplesBuffer::new(NonZero::new(1).unwrap(), rate, vec![0.5; 2400]);
//!
//! let unit = context.create_unit(&buffer)?.start(Duration::from_millis(50))?;
//! let rendered = context.render(Duration::from_millis(60))?;
//!
//! assert_eq!(&rendered[..1200], &[0.5; 1200][..]);
//! assert!(rendered[1200..].iter().all(|s| *s == 0.0));
//! assert!(unit.is_finished());
//! assert_eq!(context.current_time(), Duration::from_millis(60));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::buffer::SamplesBuffer;
use crate::common::{assert_error_traits, ChannelCount, Sample, SampleRate};
use crate::math::{duration_to_frames, frames_to_duration};
use crate::mixer::{self, Mixer, MixerSource};
use crate::source::{SeekError, Source};

pub use self::builder::ContextBuilder;
#[cfg(feature = "playback")]
pub use self::device::{available_outputs, DeviceError, OutputConfig};

mod builder;
#[cfg(feature = "playback")]
mod device;

/// Lifecycle state of an [`AudioContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Rendering, the clock advances.
    Running,
    /// Rendering silence, the clock is frozen.
    Suspended,
    /// Released, nothing can be played anymore.
    Closed,
}

/// Errors returned by an [`AudioContext`] or its playback units.
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    /// The context has been closed.
    #[error("The output context is closed")]
    Closed,
    /// Manual rendering was requested from a device context.
    #[error("Only an offline context can be rendered manually")]
    NotOffline,
    /// The playback unit could not be positioned at its start offset.
    #[error("Could not position the playback unit")]
    Seek(#[from] SeekError),
    /// Opening or running the output device failed.
    #[cfg(feature = "playback")]
    #[error(transparent)]
    Device(#[from] DeviceError),
}
assert_error_traits! {ContextError}

/// State shared between the control side and the render side.
#[derive(Debug)]
pub(crate) struct Shared {
    suspended: AtomicBool,
    closed: AtomicBool,
    frames: AtomicU64,
}

/// The render side of a context: pulls the mixer and advances the clock.
pub(crate) struct RenderOutput {
    mixer: MixerSource,
    shared: Arc<Shared>,
    channels: usize,
}

impl RenderOutput {
    /// Fills `data` with interleaved output samples. Writes silence, and
    /// leaves the clock untouched, while suspended or closed.
    pub(crate) fn fill<T>(&mut self, data: &mut [T])
    where
        T: dasp_sample::Sample + dasp_sample::FromSample<Sample>,
    {
        use dasp_sample::Sample as _;

        if self.shared.suspended.load(Ordering::Acquire)
            || self.shared.closed.load(Ordering::Acquire)
        {
            data.fill(T::EQUILIBRIUM);
            return;
        }

        for d in data.iter_mut() {
            *d = self.mixer.next().unwrap_or(0.0).to_sample();
        }
        self.shared
            .frames
            .fetch_add((data.len() / self.channels) as u64, Ordering::Release);
    }
}

enum Backend {
    Offline(RenderOutput),
    #[cfg(feature = "playback")]
    Device(device::DeviceStream),
    Closed,
}

/// Handle to the audio rendering subsystem.
///
/// Dropping the context closes it.
pub struct AudioContext {
    mixer: Mixer,
    shared: Arc<Shared>,
    backend: Backend,
}

impl fmt::Debug for AudioContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let backend = match &self.backend {
            Backend::Offline(_) => "offline",
            #[cfg(feature = "playback")]
            Backend::Device(_) => "device",
            Backend::Closed => "closed",
        };
        f.debug_struct("AudioContext")
            .field("backend", &backend)
            .field("state", &self.state())
            .field("channels", &self.mixer.channels())
            .field("sample_rate", &self.mixer.sample_rate())
            .field("current_time", &self.current_time())
            .finish()
    }
}

/// The mixer, its render side and the shared state of a new context.
pub(crate) fn new_parts(
    channels: ChannelCount,
    sample_rate: SampleRate,
    suspended: bool,
) -> (Mixer, Arc<Shared>, RenderOutput) {
    let (mixer, source) = mixer::mixer(channels, sample_rate);
    let shared = Arc::new(Shared {
        suspended: AtomicBool::new(suspended),
        closed: AtomicBool::new(false),
        frames: AtomicU64::new(0),
    });
    let output = RenderOutput {
        mixer: source,
        shared: shared.clone(),
        channels: channels.get() as usize,
    };
    (mixer, shared, output)
}

impl AudioContext {
    pub(crate) fn offline(
        channels: ChannelCount,
        sample_rate: SampleRate,
        suspended: bool,
    ) -> AudioContext {
        let (mixer, shared, output) = new_parts(channels, sample_rate, suspended);
        AudioContext {
            mixer,
            shared,
            backend: Backend::Offline(output),
        }
    }

    #[cfg(feature = "playback")]
    pub(crate) fn with_device(
        mixer: Mixer,
        shared: Arc<Shared>,
        stream: device::DeviceStream,
    ) -> AudioContext {
        AudioContext {
            mixer,
            shared,
            backend: Backend::Device(stream),
        }
    }

    /// Time rendered so far. Monotonic, frozen while suspended or closed.
    #[inline]
    pub fn current_time(&self) -> Duration {
        frames_to_duration(
            self.shared.frames.load(Ordering::Acquire),
            self.mixer.sample_rate(),
        )
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ContextState {
        if self.shared.closed.load(Ordering::Acquire) {
            ContextState::Closed
        } else if self.shared.suspended.load(Ordering::Acquire) {
            ContextState::Suspended
        } else {
            ContextState::Running
        }
    }

    /// Resumes a suspended context. No effect if running.
    pub fn resume(&mut self) -> Result<(), ContextError> {
        self.ensure_open()?;
        self.shared.suspended.store(false, Ordering::Release);
        Ok(())
    }

    /// Suspends the context. Units keep their position, the output is silent
    /// and the clock stands still until [`resume`](AudioContext::resume).
    pub fn suspend(&mut self) -> Result<(), ContextError> {
        self.ensure_open()?;
        self.shared.suspended.store(true, Ordering::Release);
        Ok(())
    }

    /// Creates a one-shot playback unit for `buffer`.
    pub fn create_unit(&self, buffer: &SamplesBuffer) -> Result<PlaybackUnit, ContextError> {
        self.ensure_open()?;
        Ok(PlaybackUnit {
            buffer: buffer.rewound(),
            mixer: self.mixer.clone(),
            shared: self.shared.clone(),
        })
    }

    /// Renders `duration` worth of output and returns the interleaved
    /// samples. Only available on an offline context.
    pub fn render(&mut self, duration: Duration) -> Result<Vec<Sample>, ContextError> {
        let frames = duration_to_frames(duration, self.mixer.sample_rate());
        self.render_frames(frames as usize)
    }

    /// Renders exactly `frames` frames of output. See
    /// [`render`](AudioContext::render).
    pub fn render_frames(&mut self, frames: usize) -> Result<Vec<Sample>, ContextError> {
        match &mut self.backend {
            Backend::Offline(output) => {
                let mut data = vec![0.0; frames * self.mixer.channels().get() as usize];
                output.fill(&mut data);
                Ok(data)
            }
            Backend::Closed => Err(ContextError::Closed),
            #[cfg(feature = "playback")]
            Backend::Device(_) => Err(ContextError::NotOffline),
        }
    }

    /// Whether this context is rendered by its owner.
    pub fn is_offline(&self) -> bool {
        matches!(self.backend, Backend::Offline(_))
    }

    /// Number of units that are still rendering. A stopped unit is counted
    /// until the render side notices, which happens at the next sample.
    /// A closed context has none.
    pub fn active_units(&self) -> usize {
        if self.shared.closed.load(Ordering::Acquire) {
            return 0;
        }
        self.mixer.active_sources()
    }

    /// Channel count of the output.
    pub fn output_channels(&self) -> ChannelCount {
        self.mixer.channels()
    }

    /// Sample rate of the output.
    pub fn output_sample_rate(&self) -> SampleRate {
        self.mixer.sample_rate()
    }

    /// Stops all output and releases the output device.
    ///
    /// Closing an already closed context does nothing.
    pub fn close(&mut self) {
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        // dropping the stream stops the device callback
        self.backend = Backend::Closed;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            rendered = ?self.current_time(),
            "closed output context"
        );
    }

    fn ensure_open(&self) -> Result<(), ContextError> {
        if self.shared.closed.load(Ordering::Acquire) {
            Err(ContextError::Closed)
        } else {
            Ok(())
        }
    }
}

impl Drop for AudioContext {
    fn drop(&mut self) {
        self.close();
    }
}

/// A single-use handle to the output, seeded with a buffer.
///
/// Nothing is played until [`start`](PlaybackUnit::start) is called, which
/// consumes the unit.
#[must_use = "a playback unit does nothing until started"]
pub struct PlaybackUnit {
    buffer: SamplesBuffer,
    mixer: Mixer,
    shared: Arc<Shared>,
}

impl fmt::Debug for PlaybackUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackUnit")
            .field("buffer", &self.buffer)
            .finish_non_exhaustive()
    }
}

impl PlaybackUnit {
    /// Starts playing the buffer from `offset`. An offset past the end of the
    /// buffer produces a unit that finishes immediately.
    pub fn start(self, offset: Duration) -> Result<ActiveUnit, ContextError> {
        if self.shared.closed.load(Ordering::Acquire) {
            return Err(ContextError::Closed);
        }

        let mut source = self.buffer;
        source.try_seek(offset)?;

        let stopped = Arc::new(AtomicBool::new(false));
        let remaining = Arc::new(AtomicUsize::new(1));
        self.mixer
            .add(source.stoppable(stopped.clone()).done(remaining.clone()));

        Ok(ActiveUnit {
            stopped,
            remaining,
            shared: self.shared,
            offset,
        })
    }

    /// Total duration of the buffer this unit plays.
    pub fn duration(&self) -> Duration {
        self.buffer.duration()
    }
}

/// A started playback unit.
///
/// Dropping the handle stops the unit.
#[derive(Debug)]
pub struct ActiveUnit {
    stopped: Arc<AtomicBool>,
    remaining: Arc<AtomicUsize>,
    shared: Arc<Shared>,
    offset: Duration,
}

impl ActiveUnit {
    /// Stops the unit at the next rendered sample.
    ///
    /// Stopping a unit that already stopped or ran out does nothing.
    #[inline]
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    /// Whether the unit was stopped, has played all of its samples or lost
    /// its output to [`AudioContext::close`].
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
            || self.remaining.load(Ordering::Relaxed) == 0
            || self.shared.closed.load(Ordering::Acquire)
    }

    /// Offset into the buffer the unit was started at.
    #[inline]
    pub fn offset(&self) -> Duration {
        self.offset
    }
}

impl Drop for ActiveUnit {
    fn drop(&mut self) {
        self.stop();
    }
}
