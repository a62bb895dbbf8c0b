use crate::common::{ChannelCount, SampleRate};
use crate::constants::{PCM_CHANNELS, PCM_SAMPLE_RATE};

use super::{AudioContext, ContextError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    Offline,
    #[cfg(feature = "playback")]
    Device,
}

/// Builder for configuring and opening an [`AudioContext`].
///
/// # Example
/// ```no_run
/// # #[cfg(feature = "playback")] {
/// # use pcmdeck::ContextBuilder;
/// let context = ContextBuilder::device()
///     // 48k is a trivial resample of the 24k speech
///     .prefer_sample_rates([
///         24_000.try_into().expect("not zero"),
///         48_000.try_into().expect("not zero"),
///     ])
///     .build()?;
/// # }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct ContextBuilder {
    backend: Backend,
    sample_rates: Vec<SampleRate>,
    channel_counts: Vec<ChannelCount>,
    #[cfg(feature = "playback")]
    device_name: Option<String>,
    start_suspended: bool,
}

/// Same as [`ContextBuilder::offline`], even with the `playback` feature.
impl Default for ContextBuilder {
    fn default() -> Self {
        Self::offline()
    }
}

impl ContextBuilder {
    /// A context rendered by its owner through
    /// [`AudioContext::render`]. Without preferences the output matches the
    /// speech format: mono at 24 kHz.
    pub fn offline() -> ContextBuilder {
        ContextBuilder {
            backend: Backend::Offline,
            sample_rates: vec![PCM_SAMPLE_RATE],
            channel_counts: vec![PCM_CHANNELS],
            #[cfg(feature = "playback")]
            device_name: None,
            start_suspended: false,
        }
    }

    /// A context rendering to an output device, the system default unless
    /// [`device_name`](ContextBuilder::device_name) is set.
    #[cfg(feature = "playback")]
    pub fn device() -> ContextBuilder {
        ContextBuilder {
            backend: Backend::Device,
            ..ContextBuilder::offline()
        }
    }

    /// Sample rates to try, in order. The first one the device supports is
    /// used, otherwise the device default. An offline context uses the first
    /// one.
    pub fn prefer_sample_rates(
        mut self,
        sample_rates: impl IntoIterator<Item = SampleRate>,
    ) -> ContextBuilder {
        self.sample_rates = sample_rates.into_iter().collect();
        self
    }

    /// Channel counts to try, in order. See
    /// [`prefer_sample_rates`](ContextBuilder::prefer_sample_rates).
    pub fn prefer_channel_counts(
        mut self,
        channel_counts: impl IntoIterator<Item = ChannelCount>,
    ) -> ContextBuilder {
        self.channel_counts = channel_counts.into_iter().collect();
        self
    }

    /// Opens the output device with this name instead of the default one.
    #[cfg(feature = "playback")]
    pub fn device_name(mut self, name: impl Into<String>) -> ContextBuilder {
        self.device_name = Some(name.into());
        self
    }

    /// Opens the context in the suspended state.
    pub fn start_suspended(mut self, suspended: bool) -> ContextBuilder {
        self.start_suspended = suspended;
        self
    }

    /// Whether [`build`](ContextBuilder::build) produces an offline context.
    pub fn is_offline(&self) -> bool {
        self.backend == Backend::Offline
    }

    /// Opens the context.
    pub fn build(&self) -> Result<AudioContext, ContextError> {
        let context = match self.backend {
            Backend::Offline => AudioContext::offline(
                self.channel_counts.first().copied().unwrap_or(PCM_CHANNELS),
                self.sample_rates.first().copied().unwrap_or(PCM_SAMPLE_RATE),
                self.start_suspended,
            ),
            #[cfg(feature = "playback")]
            Backend::Device => super::device::open(
                self.device_name.as_deref(),
                &self.sample_rates,
                &self.channel_counts,
                self.start_suspended,
            )?,
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            offline = self.is_offline(),
            channels = context.output_channels().get(),
            sample_rate = context.output_sample_rate().get(),
            "opened output context"
        );

        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use super::ContextBuilder;
    use crate::common::SampleRate;
    use crate::context::ContextState;
    use crate::math::nz;

    #[test]
    fn offline_defaults_to_speech_format() {
        let context = ContextBuilder::offline().build().unwrap();
        assert_eq!(context.output_channels(), nz!(1));
        assert_eq!(context.output_sample_rate(), nz!(24_000));
        assert_eq!(context.state(), ContextState::Running);
        assert!(context.is_offline());
    }

    #[test]
    fn offline_takes_first_preference() {
        let context = ContextBuilder::offline()
            .prefer_sample_rates([nz!(48_000), nz!(44_100)])
            .prefer_channel_counts([nz!(2)])
            .build()
            .unwrap();
        assert_eq!(context.output_channels(), nz!(2));
        assert_eq!(context.output_sample_rate(), nz!(48_000));
    }

    #[test]
    fn empty_preferences_fall_back() {
        let context = ContextBuilder::offline()
            .prefer_sample_rates(Vec::<SampleRate>::new())
            .build()
            .unwrap();
        assert_eq!(context.output_sample_rate(), nz!(24_000));
    }
}
