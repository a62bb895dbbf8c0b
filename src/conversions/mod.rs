/*!
This module contains functions that convert a playback unit to the format of
the output context.

This includes conversion between channel counts and sample rates.

*/
pub use self::channels::ChannelCountConverter;
pub use self::sample_rate::SampleRateConverter;

mod channels;
mod sample_rate;
