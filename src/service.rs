//! The boundary to the remote AI service.
//!
//! The service does two things for us. It transcribes and translates a video,
//! answering with JSON, and it synthesizes speech, answering with base64 PCM
//! that [`decode`](crate::decode) understands. Talking to it is left to the
//! implementations of [`Transcriber`] and [`SpeechSynthesizer`]. Both are
//! single request/response calls without retries.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::common::assert_error_traits;
use crate::decoder::EncodedAudioBlock;
use crate::player::{AudioPlayer, PlayerBuilder};

/// A position in the video as `MM:SS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp {
    minutes: u32,
    seconds: u8,
}

/// Error parsing a [`Timestamp`].
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TimestampError {
    /// There is no `:` between minutes and seconds.
    #[error("Timestamp '{0}' is not formatted as MM:SS")]
    Format(String),
    /// Minutes or seconds are not numbers.
    #[error("Timestamp '{0}' contains something other than digits")]
    NotANumber(String),
    /// Seconds are 60 or more.
    #[error("Timestamp '{0}' has more than 59 seconds")]
    SecondsOutOfRange(String),
}
assert_error_traits! {TimestampError}

impl Timestamp {
    /// A timestamp `minutes:seconds`, `None` when `seconds` is 60 or more.
    pub fn new(minutes: u32, seconds: u8) -> Option<Timestamp> {
        (seconds < 60).then_some(Timestamp { minutes, seconds })
    }

    /// Whole minutes.
    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    /// Seconds within the minute.
    pub fn seconds(&self) -> u8 {
        self.seconds
    }

    /// Offset from the start of the video.
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.minutes) * 60 + u64::from(self.seconds))
    }
}

impl FromStr for Timestamp {
    type Err = TimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (minutes, seconds) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| TimestampError::Format(s.to_string()))?;
        let is_number = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !is_number(minutes) || !is_number(seconds) {
            return Err(TimestampError::NotANumber(s.to_string()));
        }

        let minutes = minutes
            .parse()
            .map_err(|_| TimestampError::NotANumber(s.to_string()))?;
        let seconds = seconds
            .parse()
            .map_err(|_| TimestampError::SecondsOutOfRange(s.to_string()))?;
        Timestamp::new(minutes, seconds).ok_or_else(|| TimestampError::SecondsOutOfRange(s.to_string()))
    }
}

impl TryFrom<String> for Timestamp {
    type Error = TimestampError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timestamp> for String {
    fn from(value: Timestamp) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes, self.seconds)
    }
}

/// One line of the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptSegment {
    /// Where the line starts.
    pub start: Timestamp,
    /// Where the line ends.
    pub end: Timestamp,
    /// What was said.
    pub original_text: String,
    /// What was said, in the target language.
    pub translated_text: String,
}

/// The answer to a transcription request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcription {
    /// Language detected in the video.
    pub source_language: String,
    /// Summary of the video, in the target language.
    pub summary: String,
    /// The transcript, in order.
    pub segments: Vec<TranscriptSegment>,
}

impl Transcription {
    /// Parses the JSON answer of the service.
    pub fn from_json(json: &str) -> Result<Transcription, ServiceError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A video sent for transcription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoPayload {
    /// The video file, base64 encoded.
    pub data_base64: String,
    /// MIME type of the video, `video/mp4` for example.
    pub mime_type: String,
}

impl VideoPayload {
    /// Encodes the bytes of a video file.
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> VideoPayload {
        VideoPayload {
            data_base64: base64::engine::general_purpose::STANDARD.encode(bytes),
            mime_type: mime_type.into(),
        }
    }
}

/// Failure of a call to the service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The request did not get an answer.
    #[error("Request to the AI service failed: {0}")]
    Transport(String),
    /// The answer could not be understood.
    #[error("The AI service sent an answer that could not be parsed")]
    InvalidResponse(#[from] serde_json::Error),
    /// The answer was understood but holds no usable result.
    #[error("The AI service sent an empty answer")]
    Empty,
}
assert_error_traits! {ServiceError}

/// Transcribes and translates videos.
pub trait Transcriber {
    /// Transcribes `video` and translates the transcript to
    /// `target_language`, a language name such as `"Spanish"`.
    fn transcribe(
        &self,
        video: &VideoPayload,
        target_language: &str,
    ) -> Result<Transcription, ServiceError>;
}

/// Turns text into speech.
pub trait SpeechSynthesizer {
    /// Speaks `text` with the voice named `voice`. The answer is base64 of
    /// 16-bit mono PCM at 24 kHz.
    fn synthesize(&self, text: &str, voice: &str) -> Result<EncodedAudioBlock, ServiceError>;
}

/// Synthesizes `text` and hands the speech to a new player.
pub fn speak<S>(
    synthesizer: &S,
    text: &str,
    voice: &str,
    builder: PlayerBuilder,
) -> Result<AudioPlayer, ServiceError>
where
    S: SpeechSynthesizer + ?Sized,
{
    let block = synthesizer.synthesize(text, voice)?;
    if block.is_empty() {
        return Err(ServiceError::Empty);
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(voice, text_len = text.len(), block_len = block.len(), "synthesized speech");

    Ok(builder.build(block))
}
