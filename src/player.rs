//! The audio player: one block of speech with play, pause and a progress
//! readout.
//!
//! An [`AudioPlayer`] is what a user interface holds on to. It is built with
//! a block and an auto-play flag. Handing it a different block throws away
//! everything about the old one and starts over from a fresh decode.
//!
//! [`AudioPlayer::new`] and [`PlayerBuilder::default`] are headless: they
//! render into an offline context that makes no sound until its owner pulls
//! samples from it, for example through [`AudioPlayer::run_until_end`]. To
//! hear the speech, build the player on
//! [`ContextBuilder::device`](crate::ContextBuilder::device) (requires the
//! `playback` feature).

use std::time::Duration;

use crate::constants::DEFAULT_FRAME_INTERVAL;
use crate::context::{ContextBuilder, ContextError};
use crate::decoder::EncodedAudioBlock;
use crate::math::duration_to_frames;
use crate::poll::FrameTimer;
use crate::transport::{LoadError, PlayError, TransportController, TransportPhase};

/// Builder for configuring an [`AudioPlayer`].
///
/// # Example
/// ```no_run
/// # #[cfg(feature = "playback")] {
/// # use pcmdeck::{ContextBuilder, PlayerBuilder};
/// # let block = pcmdeck::decoder::encode_pcm16le(&[0; 24_000]);
/// let mut player = PlayerBuilder::new(ContextBuilder::device())
///     .auto_play(true)
///     .build(block);
/// player.run_until_end()?;
/// # }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct PlayerBuilder {
    context: ContextBuilder,
    auto_play: bool,
    frame_interval: Duration,
}

impl Default for PlayerBuilder {
    fn default() -> Self {
        PlayerBuilder::new(ContextBuilder::default())
    }
}

impl PlayerBuilder {
    /// A builder for players rendering through contexts from `context`.
    pub fn new(context: ContextBuilder) -> PlayerBuilder {
        PlayerBuilder {
            context,
            auto_play: false,
            frame_interval: DEFAULT_FRAME_INTERVAL,
        }
    }

    /// Start playing as soon as a block has been decoded.
    pub fn auto_play(mut self, auto_play: bool) -> PlayerBuilder {
        self.auto_play = auto_play;
        self
    }

    /// Interval between two polling frames in
    /// [`AudioPlayer::run_until_end`].
    pub fn frame_interval(mut self, interval: Duration) -> PlayerBuilder {
        self.frame_interval = interval;
        self
    }

    /// Builds the player and decodes `block`. A decode error does not fail
    /// the build, it is available from [`AudioPlayer::last_error`].
    pub fn build(self, block: impl Into<EncodedAudioBlock>) -> AudioPlayer {
        let mut player = AudioPlayer {
            controller: TransportController::new(self.context),
            block: block.into(),
            auto_play: self.auto_play,
            frame_interval: self.frame_interval,
            last_error: None,
        };
        player.reload();
        player
    }
}

/// Plays one block of speech.
#[derive(Debug)]
pub struct AudioPlayer {
    controller: TransportController,
    block: EncodedAudioBlock,
    auto_play: bool,
    frame_interval: Duration,
    last_error: Option<LoadError>,
}

impl AudioPlayer {
    /// A headless player on an offline context. Use [`PlayerBuilder`] with
    /// [`ContextBuilder::device`](crate::ContextBuilder::device) to play
    /// through a device.
    pub fn new(block: impl Into<EncodedAudioBlock>, auto_play: bool) -> AudioPlayer {
        PlayerBuilder::default().auto_play(auto_play).build(block)
    }

    /// Replaces the block. Stops playback and closes the context, then
    /// decodes the new block and plays it when auto-play is on.
    ///
    /// Handing in the block that is already loaded does nothing.
    pub fn set_block(&mut self, block: impl Into<EncodedAudioBlock>) {
        let block = block.into();
        if block == self.block {
            return;
        }
        self.block = block;
        self.reload();
    }

    fn reload(&mut self) {
        self.last_error = self.controller.load(&self.block).err();
        if self.last_error.is_some() || !self.auto_play {
            return;
        }
        match self.controller.play() {
            Ok(()) | Err(PlayError::Unavailable) => {}
            Err(PlayError::Context(err)) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %err, "could not auto-play audio block");
                self.last_error = Some(LoadError::Context(err));
            }
        }
    }

    /// Plays from the current position. See [`TransportController::play`].
    #[inline]
    pub fn play(&mut self) -> Result<(), PlayError> {
        self.controller.play()
    }

    /// See [`TransportController::pause`].
    #[inline]
    pub fn pause(&mut self) {
        self.controller.pause()
    }

    /// See [`TransportController::toggle`].
    #[inline]
    pub fn toggle(&mut self) -> Result<(), PlayError> {
        self.controller.toggle()
    }

    /// Progress in percent, for display.
    #[inline]
    pub fn progress(&self) -> f64 {
        self.controller.progress()
    }

    /// Whether speech is playing.
    #[inline]
    pub fn is_playing(&self) -> bool {
        self.controller.is_playing()
    }

    /// State of the transport.
    #[inline]
    pub fn phase(&self) -> TransportPhase {
        self.controller.phase()
    }

    /// Call once per display frame. Returns the new progress, `None` when
    /// no frame was pending.
    #[inline]
    pub fn on_frame(&mut self) -> Option<f64> {
        self.controller.poll()
    }

    /// The block this player was given last.
    pub fn block(&self) -> &EncodedAudioBlock {
        &self.block
    }

    /// Whether a decoded block starts playing on its own.
    pub fn auto_play(&self) -> bool {
        self.auto_play
    }

    /// Why the current block could not be made ready, if it could not.
    pub fn last_error(&self) -> Option<&LoadError> {
        self.last_error.as_ref()
    }

    /// Takes the error of the current block, so it is reported only once.
    pub fn take_error(&mut self) -> Option<LoadError> {
        self.last_error.take()
    }

    /// Blocks until playback stops, delivering polling frames.
    ///
    /// A device context is waited on, one frame interval at a time. An
    /// offline context is rendered one frame interval per frame without
    /// waiting.
    pub fn run_until_end(&mut self) -> Result<(), ContextError> {
        let mut timer = FrameTimer::new(self.frame_interval);
        while self.is_playing() {
            match self.controller.context_mut() {
                Some(context) if context.is_offline() => {
                    let frames =
                        duration_to_frames(self.frame_interval, context.output_sample_rate());
                    context.render_frames(frames.max(1) as usize)?;
                }
                Some(_) => timer.wait(),
                None => break,
            }
            self.on_frame();
        }
        Ok(())
    }

    /// The transport this player drives.
    pub fn controller(&self) -> &TransportController {
        &self.controller
    }

    /// Mutable access to the transport, to render an offline context for
    /// example.
    pub fn controller_mut(&mut self) -> &mut TransportController {
        &mut self.controller
    }
}

#[cfg(test)]
mod tests {
    use super::{AudioPlayer, PlayerBuilder};
    use crate::decoder::encode_pcm16le;
    use crate::transport::{LoadError, TransportPhase};

    #[test]
    fn auto_play_starts_right_away() {
        let player = AudioPlayer::new(encode_pcm16le(&[0; 240]), true);
        assert!(player.is_playing());
        assert!(player.last_error().is_none());
    }

    #[test]
    fn default_players_are_headless() {
        let player = AudioPlayer::new(encode_pcm16le(&[0; 240]), true);
        assert!(player.controller().context().unwrap().is_offline());

        let player = PlayerBuilder::default().build(encode_pcm16le(&[0; 240]));
        assert!(player.controller().context().unwrap().is_offline());
    }

    #[test]
    fn bad_block_stays_idle() {
        let mut player = AudioPlayer::new("AAAA", true);
        assert_eq!(player.phase(), TransportPhase::Idle);
        assert!(matches!(player.take_error(), Some(LoadError::Decode(_))));
        assert!(player.take_error().is_none());
    }

    #[test]
    fn same_block_does_not_reset() {
        let block = encode_pcm16le(&[0; 2400]);
        let mut player = PlayerBuilder::default().build(block.clone());
        player.play().unwrap();

        player.set_block(block);
        assert!(player.is_playing());
    }

    #[test]
    fn run_until_end_offline() {
        let mut player = AudioPlayer::new(encode_pcm16le(&[0; 24_000]), true);
        player.run_until_end().unwrap();

        assert_eq!(player.progress(), 100.0);
        assert_eq!(player.phase(), TransportPhase::Ready);
    }
}
