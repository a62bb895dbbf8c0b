//! Play, pause and resume on top of one-shot playback units.
//!
//! A [`PlaybackUnit`](crate::PlaybackUnit) can be started once and stopped,
//! nothing else. The [`TransportController`] gets pause and resume out of
//! that by remembering how much of the buffer has been heard before the
//! current session. Pausing stops the unit and adds the session's length to
//! that offset. Resuming starts a brand new unit at the offset.
//!
//! The controller does not get called back by the output. Progress is
//! recomputed from the context's render clock whenever the host delivers a
//! polling frame through [`TransportController::poll`].
//!
//! ```text
//!          load ok          play
//!   Idle ---------> Ready ------> Playing
//!    ^                ^              |
//!    |                +--------------+ pause, stop, completion
//!    +---- dispose, load (from any state)
//! ```

use std::fmt;
use std::time::Duration;

use crate::buffer::SamplesBuffer;
use crate::common::assert_error_traits;
use crate::context::{ActiveUnit, AudioContext, ContextBuilder, ContextError, ContextState};
use crate::decoder::{self, DecodeError, EncodedAudioBlock};
use crate::poll::PollLoop;

/// Error returned when playback can not start.
#[derive(Debug, thiserror::Error)]
pub enum PlayError {
    /// No block has been decoded, there is nothing to play.
    #[error("There is no decoded audio to play")]
    Unavailable,
    /// The output context refused to start a unit.
    #[error(transparent)]
    Context(#[from] ContextError),
}
assert_error_traits! {PlayError}

/// Error returned when a block can not be made ready for playback.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The block is not valid PCM.
    #[error("Could not decode the audio block")]
    Decode(#[from] DecodeError),
    /// The output context could not be opened.
    #[error("Could not open the output context")]
    Context(#[from] ContextError),
}
assert_error_traits! {LoadError}

/// Observable state of a [`TransportController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportPhase {
    /// Nothing decoded.
    Idle,
    /// Decoded, not playing.
    Ready,
    /// A unit is playing.
    Playing,
}

/// Snapshot of the timing state of a [`TransportController`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportState {
    /// Whether a session is live.
    pub is_playing: bool,
    /// Time heard before the live session, or the resume offset when paused.
    /// Only changes when a session ends.
    pub elapsed_before_current_session: Duration,
    /// Progress in percent, `0.0..=100.0`.
    pub progress_percent: f64,
}

/// The live unit and the render time at which it started.
struct PlaybackSession {
    unit: ActiveUnit,
    started_at: Duration,
}

/// Owns an output context and the decoded buffer of one block, and plays it
/// with pause and resume.
///
/// At most one unit is live at any time. Dropping the controller stops
/// playback and closes the context.
pub struct TransportController {
    context_builder: ContextBuilder,
    context: Option<AudioContext>,
    buffer: Option<SamplesBuffer>,
    session: Option<PlaybackSession>,
    elapsed_before: Duration,
    progress: f64,
    poll: PollLoop,
}

impl fmt::Debug for TransportController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportController")
            .field("phase", &self.phase())
            .field("context", &self.context)
            .field("buffer", &self.buffer)
            .field("elapsed_before", &self.elapsed_before)
            .field("progress", &self.progress)
            .field("poll", &self.poll)
            .finish()
    }
}

impl TransportController {
    /// An idle controller. `context_builder` opens the context once a block
    /// has been decoded.
    pub fn new(context_builder: ContextBuilder) -> TransportController {
        TransportController {
            context_builder,
            context: None,
            buffer: None,
            session: None,
            elapsed_before: Duration::ZERO,
            progress: 0.0,
            poll: PollLoop::new(),
        }
    }

    /// Drops everything belonging to the previous block, then decodes
    /// `block`.
    ///
    /// On error the controller stays idle.
    pub fn load(&mut self, block: &EncodedAudioBlock) -> Result<(), LoadError> {
        self.dispose();

        let buffer = match decoder::decode(block) {
            Ok(buffer) => buffer,
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %err, block_len = block.len(), "could not decode audio block");
                return Err(err.into());
            }
        };
        self.load_buffer(buffer)
    }

    /// Like [`load`](TransportController::load) for an already decoded
    /// buffer.
    pub fn load_buffer(&mut self, buffer: SamplesBuffer) -> Result<(), LoadError> {
        self.dispose();

        if self.context.is_none() {
            self.context = Some(self.context_builder.build()?);
        }
        self.buffer = Some(buffer);
        Ok(())
    }

    /// Starts a session at the current offset. Starts over when the previous
    /// session ran to the end.
    ///
    /// Does nothing while playing.
    pub fn play(&mut self) -> Result<(), PlayError> {
        if self.session.is_some() {
            return Ok(());
        }
        let (Some(buffer), Some(context)) = (&self.buffer, &mut self.context) else {
            return Err(PlayError::Unavailable);
        };

        if self.progress >= 100.0 {
            self.elapsed_before = Duration::ZERO;
            self.progress = 0.0;
        }
        if context.state() == ContextState::Suspended {
            context.resume()?;
        }

        let unit = context.create_unit(buffer)?.start(self.elapsed_before)?;
        let started_at = context.current_time();
        self.session = Some(PlaybackSession { unit, started_at });
        self.poll.schedule();

        #[cfg(feature = "tracing")]
        tracing::debug!(offset = ?self.elapsed_before, ?started_at, "started playback session");

        Ok(())
    }

    /// Ends the session, remembering where it got to. Does nothing when not
    /// playing.
    pub fn pause(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        session.unit.stop();
        self.poll.cancel();

        let duration = self.duration();
        let heard = self.now().saturating_sub(session.started_at);
        self.elapsed_before = (self.elapsed_before + heard).min(duration);

        if self.elapsed_before >= duration {
            self.complete();
        } else {
            self.progress = percent(self.elapsed_before, duration);
            #[cfg(feature = "tracing")]
            tracing::debug!(
                offset = ?self.elapsed_before,
                progress = self.progress,
                "paused playback session"
            );
        }
    }

    /// Ends the session without remembering where it got to. Offset and
    /// progress keep their values from before the session.
    pub fn stop(&mut self) {
        if let Some(session) = self.session.take() {
            session.unit.stop();
        }
        self.poll.cancel();
    }

    /// Pauses when playing. Otherwise plays, from the start if the previous
    /// session ran to the end.
    pub fn toggle(&mut self) -> Result<(), PlayError> {
        if self.is_playing() {
            self.pause();
            Ok(())
        } else {
            self.play()
        }
    }

    /// Runs one frame of the polling loop and returns the new progress.
    ///
    /// Returns `None`, and does nothing, when no frame is pending: after
    /// pause, stop, completion or dispose.
    pub fn poll(&mut self) -> Option<f64> {
        if !self.poll.take() {
            return None;
        }
        let started_at = self.session.as_ref()?.started_at;

        let duration = self.duration();
        let elapsed = self.elapsed_before + self.now().saturating_sub(started_at);
        if elapsed >= duration {
            self.complete();
        } else {
            self.progress = percent(elapsed, duration);
            self.poll.schedule();
        }
        Some(self.progress)
    }

    /// Stops playback, drops the buffer and closes the context.
    pub fn dispose(&mut self) {
        self.stop();
        self.buffer = None;
        self.elapsed_before = Duration::ZERO;
        self.progress = 0.0;
        if let Some(mut context) = self.context.take() {
            context.close();
        }
    }

    fn complete(&mut self) {
        if let Some(session) = self.session.take() {
            session.unit.stop();
        }
        self.poll.cancel();
        self.elapsed_before = Duration::ZERO;
        self.progress = 100.0;

        #[cfg(feature = "tracing")]
        tracing::debug!(duration = ?self.duration(), "playback complete");
    }

    fn now(&self) -> Duration {
        self.context
            .as_ref()
            .map_or(Duration::ZERO, AudioContext::current_time)
    }

    /// Whether a session is live.
    #[inline]
    pub fn is_playing(&self) -> bool {
        self.session.is_some()
    }

    /// Progress in percent, as of the last frame, pause or completion.
    #[inline]
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Current state.
    pub fn phase(&self) -> TransportPhase {
        match (&self.buffer, &self.session) {
            (None, _) => TransportPhase::Idle,
            (Some(_), None) => TransportPhase::Ready,
            (Some(_), Some(_)) => TransportPhase::Playing,
        }
    }

    /// Time heard so far, read live from the render clock while playing.
    pub fn elapsed(&self) -> Duration {
        match &self.session {
            Some(session) => (self.elapsed_before + self.now().saturating_sub(session.started_at))
                .min(self.duration()),
            None => self.elapsed_before,
        }
    }

    /// Duration of the loaded buffer, zero when idle.
    pub fn duration(&self) -> Duration {
        self.buffer
            .as_ref()
            .map_or(Duration::ZERO, SamplesBuffer::duration)
    }

    /// Snapshot of the timing state.
    pub fn state(&self) -> TransportState {
        TransportState {
            is_playing: self.is_playing(),
            elapsed_before_current_session: self.elapsed_before,
            progress_percent: self.progress,
        }
    }

    /// The decoded buffer, if any.
    pub fn buffer(&self) -> Option<&SamplesBuffer> {
        self.buffer.as_ref()
    }

    /// The output context, open while a buffer is loaded.
    pub fn context(&self) -> Option<&AudioContext> {
        self.context.as_ref()
    }

    /// Mutable access to the output context, to render an offline context.
    pub fn context_mut(&mut self) -> Option<&mut AudioContext> {
        self.context.as_mut()
    }

    /// The polling loop.
    pub fn poll_loop(&self) -> &PollLoop {
        &self.poll
    }
}

impl Drop for TransportController {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn percent(elapsed: Duration, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 100.0;
    }
    (elapsed.as_secs_f64() / duration.as_secs_f64() * 100.0).min(100.0)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{percent, TransportController, TransportPhase};
    use crate::decoder::encode_pcm16le;
    use crate::ContextBuilder;

    fn ready(samples: usize) -> TransportController {
        let mut transport = TransportController::new(ContextBuilder::offline());
        transport.load(&encode_pcm16le(&vec![0; samples])).unwrap();
        transport
    }

    #[test]
    fn percent_is_capped() {
        assert_eq!(percent(Duration::from_secs(2), Duration::from_secs(1)), 100.0);
        assert_eq!(percent(Duration::from_millis(250), Duration::from_secs(1)), 25.0);
        assert_eq!(percent(Duration::ZERO, Duration::ZERO), 100.0);
    }

    #[test]
    fn play_without_buffer_is_unavailable() {
        let mut transport = TransportController::new(ContextBuilder::offline());
        assert!(matches!(transport.play(), Err(super::PlayError::Unavailable)));
        assert_eq!(transport.phase(), TransportPhase::Idle);
    }

    #[test]
    fn stop_keeps_offset_and_progress() {
        let mut transport = ready(24_000);
        transport.play().unwrap();
        transport.context_mut().unwrap().render_frames(6_000).unwrap();
        transport.poll();
        assert_eq!(transport.progress(), 25.0);

        transport.stop();
        assert!(!transport.is_playing());
        assert_eq!(transport.progress(), 25.0);
        assert_eq!(transport.state().elapsed_before_current_session, Duration::ZERO);
        assert_eq!(transport.poll(), None);
    }

    #[test]
    fn elapsed_is_live_while_playing() {
        let mut transport = ready(24_000);
        transport.play().unwrap();
        transport.context_mut().unwrap().render_frames(2_400).unwrap();

        assert_eq!(transport.elapsed(), Duration::from_millis(100));
        assert_eq!(transport.state().elapsed_before_current_session, Duration::ZERO);
    }

    #[test]
    fn empty_buffer_completes_on_first_frame() {
        let mut transport = ready(0);
        transport.play().unwrap();
        assert_eq!(transport.poll(), Some(100.0));
        assert!(!transport.is_playing());
    }

    #[test]
    fn dispose_closes_the_context() {
        let mut transport = ready(100);
        transport.play().unwrap();
        transport.dispose();
        transport.dispose();

        assert_eq!(transport.phase(), TransportPhase::Idle);
        assert!(transport.context().is_none());
        assert!(!transport.poll_loop().is_scheduled());
    }
}
