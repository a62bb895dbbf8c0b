//! Playback of base64-encoded 16-bit PCM speech.
//!
//! Speech synthesis services commonly answer with headerless linear PCM
//! (16-bit signed little-endian, one channel, 24 kHz) wrapped in base64 text.
//! This crate decodes such a block into a [`SamplesBuffer`] and plays it
//! through an [`AudioContext`] with pause, resume and restart controls.
//!
//! The playback primitive of a context is a one-shot [`PlaybackUnit`]: it can
//! be started once, at some offset, and stopped. It can not be paused. The
//! [`TransportController`] builds pause and resume on top of it by keeping an
//! explicit elapsed-time accumulator and creating a fresh unit on every resume.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use pcmdeck::{ContextBuilder, PlayerBuilder};
//!
//! // 100ms of silence
//! let block = pcmdeck::decoder::encode_pcm16le(&[0i16; 2400]);
//!
//! let mut player = PlayerBuilder::new(ContextBuilder::offline()).build(block);
//! player.play()?;
//!
//! // The offline context only advances when rendered, a device context
//! // advances on its own.
//! let context = player.controller_mut().context_mut().expect("block decoded");
//! context.render(Duration::from_millis(100))?;
//!
//! player.on_frame();
//! assert_eq!(player.progress(), 100.0);
//! assert!(!player.is_playing());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Features
//!
//! - `playback` (default): opens the system output device through `cpal`.
//! - `tracing` (default): emits structured events through `tracing`.
//! - `crossbeam-channel`: use crossbeam channels inside the mixer.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

mod common;
mod conversions;
mod math;

pub mod buffer;
pub mod constants;
pub mod context;
pub mod decoder;
pub mod mixer;
pub mod player;
pub mod poll;
pub mod service;
pub mod source;
pub mod transport;

pub use crate::buffer::SamplesBuffer;
pub use crate::common::{ChannelCount, Sample, SampleRate};
pub use crate::context::{
    ActiveUnit, AudioContext, ContextBuilder, ContextError, ContextState, PlaybackUnit,
};
pub use crate::decoder::{decode, DecodeError, EncodedAudioBlock};
pub use crate::player::{AudioPlayer, PlayerBuilder};
pub use crate::poll::{FrameTimer, PollLoop};
pub use crate::source::Source;
pub use crate::transport::{
    LoadError, PlayError, TransportController, TransportPhase, TransportState,
};
