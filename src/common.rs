use std::num::NonZero;

/// Stream sample rate (samples per second per channel).
pub type SampleRate = NonZero<u32>;

/// Number of channels in a stream. Can never be zero.
pub type ChannelCount = NonZero<u16>;

/// Represents the value of a single sample.
///
/// Silence corresponds to the value `0.0`. The expected amplitude range is
/// -1.0...1.0. Values outside of this range are clipped by the output.
pub type Sample = f32;

/// Compile time check that an error type can travel through `Box<dyn Error>`
/// and across threads.
macro_rules! assert_error_traits {
    ($to_test:path) => {
        const _: () = { $crate::common::check_error_traits::<$to_test>() };
    };
}
pub(crate) use assert_error_traits;

#[allow(dead_code)]
pub(crate) const fn check_error_traits<T: Send + Sync + std::error::Error + 'static>() {}
