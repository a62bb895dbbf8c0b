//! The per-frame polling loop that drives progress updates.
//!
//! Rendering happens elsewhere, on the device callback or inside
//! [`AudioContext::render`](crate::AudioContext::render). The transport only
//! looks at the render clock once per display frame. A [`PollLoop`] records
//! whether such a frame is pending. The host delivers frames, by calling
//! [`TransportController::poll`](crate::TransportController::poll) from its
//! event loop or, when it has none, through a [`FrameTimer`].

use std::thread;
use std::time::{Duration, Instant};

use crate::constants::DEFAULT_FRAME_INTERVAL;

/// A cancellable loop that runs at most one step per frame.
///
/// At most one frame is pending at any time. A frame delivered while none is
/// pending, after [`cancel`](PollLoop::cancel) for example, is dropped.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PollLoop {
    pending: bool,
    frames: u64,
}

impl PollLoop {
    /// A loop with no pending frame.
    pub fn new() -> PollLoop {
        PollLoop::default()
    }

    /// Requests a step on the next frame. Requesting again before that frame
    /// has no further effect.
    #[inline]
    pub fn schedule(&mut self) {
        self.pending = true;
    }

    /// Drops the pending frame, if any.
    #[inline]
    pub fn cancel(&mut self) {
        self.pending = false;
    }

    /// Consumes the pending frame. Returns whether the loop should step.
    #[inline]
    pub fn take(&mut self) -> bool {
        if !self.pending {
            return false;
        }
        self.pending = false;
        self.frames += 1;
        true
    }

    /// Whether a frame is pending.
    #[inline]
    pub fn is_scheduled(&self) -> bool {
        self.pending
    }

    /// Number of frames taken so far.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

/// Paces a blocking host at a fixed frame interval.
///
/// Missed frames are not caught up on: after a long stall the next frame is
/// one interval after the stall.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    interval: Duration,
    next: Instant,
}

impl Default for FrameTimer {
    fn default() -> Self {
        FrameTimer::new(DEFAULT_FRAME_INTERVAL)
    }
}

impl FrameTimer {
    /// A timer whose first frame is due one `interval` from now.
    pub fn new(interval: Duration) -> FrameTimer {
        FrameTimer {
            interval,
            next: Instant::now() + interval,
        }
    }

    /// Time between two frames.
    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sleeps until the next frame is due.
    pub fn wait(&mut self) {
        let now = Instant::now();
        if let Some(remaining) = self.next.checked_duration_since(now) {
            thread::sleep(remaining);
            self.next += self.interval;
        } else {
            self.next = now + self.interval;
        }
    }
}
