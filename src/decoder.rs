//! Decodes synthesized speech into a playable buffer.
//!
//! The speech service returns raw linear PCM: 16-bit signed little-endian
//! samples, one channel, 24000 samples per second, wrapped in standard
//! base64 text. There is no header. Anything else handed to [`decode`], a
//! WAV file for example, is read as if it were samples.
//!
//! # Example
//!
//! ```
//! use pcmdeck::decoder::{decode, encode_pcm16le};
//!
//! let block = encode_pcm16le(&[0, i16::MAX, i16::MIN]);
//! let buffer = decode(&block)?;
//! assert_eq!(buffer.samples(), [0.0, 32767.0 / 32768.0, -1.0]);
//! # Ok::<(), pcmdeck::DecodeError>(())
//! ```

use std::fmt;
use std::sync::Arc;

use base64::Engine as _;

use crate::buffer::SamplesBuffer;
use crate::common::{assert_error_traits, Sample};
use crate::constants::{PCM_BYTES_PER_SAMPLE, PCM_CHANNELS, PCM_SAMPLE_RATE};

/// One utterance of speech as returned by the synthesis service: base64 text
/// of 16-bit PCM.
///
/// Cloning is cheap. Two blocks are equal when their text is.
#[derive(Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub struct EncodedAudioBlock(Arc<str>);

impl EncodedAudioBlock {
    /// Wraps base64 text. The text is not validated until decoded.
    pub fn new(text: impl Into<Arc<str>>) -> EncodedAudioBlock {
        EncodedAudioBlock(text.into())
    }

    /// The base64 text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length of the base64 text in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the text is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// blocks are large, print their size instead
impl fmt::Debug for EncodedAudioBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EncodedAudioBlock")
            .field(&format_args!("{} bytes", self.0.len()))
            .finish()
    }
}

impl From<String> for EncodedAudioBlock {
    fn from(text: String) -> Self {
        EncodedAudioBlock(text.into())
    }
}

impl From<&str> for EncodedAudioBlock {
    fn from(text: &str) -> Self {
        EncodedAudioBlock(text.into())
    }
}

impl From<EncodedAudioBlock> for String {
    fn from(block: EncodedAudioBlock) -> Self {
        block.0.to_string()
    }
}

impl AsRef<str> for EncodedAudioBlock {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Error that can happen when decoding a block.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The text is not valid standard base64.
    #[error("The audio block is not valid base64")]
    Base64(#[from] base64::DecodeError),
    /// The payload does not hold a whole number of 16-bit samples.
    #[error("Got {len} bytes of PCM, expected an even number")]
    OddByteLength {
        /// Number of bytes after base64 decoding
        len: usize,
    },
}
assert_error_traits! {DecodeError}

/// Decodes a base64 block of 16-bit little-endian mono PCM at 24 kHz.
///
/// Every sample is divided by 32768, so the result lies in `[-1.0, 1.0)`.
/// Nothing is returned on error, a block decodes completely or not at all.
pub fn decode(block: &EncodedAudioBlock) -> Result<SamplesBuffer, DecodeError> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(block.as_str())?;
    decode_pcm16le(&bytes)
}

/// The byte level half of [`decode`].
pub fn decode_pcm16le(bytes: &[u8]) -> Result<SamplesBuffer, DecodeError> {
    if bytes.len() % PCM_BYTES_PER_SAMPLE != 0 {
        return Err(DecodeError::OddByteLength { len: bytes.len() });
    }

    let samples: Vec<Sample> = bytes
        .chunks_exact(PCM_BYTES_PER_SAMPLE)
        .map(|pair| f32::from(i16::from_le_bytes([pair[0], pair[1]])) / 32768.0)
        .collect();
    let buffer = SamplesBuffer::new(PCM_CHANNELS, PCM_SAMPLE_RATE, samples);

    #[cfg(feature = "tracing")]
    tracing::debug!(
        samples = buffer.len(),
        duration = ?buffer.duration(),
        "decoded pcm block"
    );

    Ok(buffer)
}

/// Encodes 16-bit samples the way the synthesis service does.
pub fn encode_pcm16le(samples: &[i16]) -> EncodedAudioBlock {
    let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    base64::engine::general_purpose::STANDARD
        .encode(bytes)
        .into()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use quickcheck::quickcheck;

    use super::{decode, decode_pcm16le, encode_pcm16le, DecodeError, EncodedAudioBlock};
    use crate::math::nz;
    use crate::source::Source;

    #[test]
    fn second_of_silence() {
        let buffer = decode_pcm16le(&[0; 48_000]).unwrap();
        assert_eq!(buffer.len(), 24_000);
        assert_eq!(buffer.duration(), Duration::from_secs(1));
        assert_eq!(buffer.channels(), nz!(1));
        assert_eq!(buffer.sample_rate(), nz!(24_000));
        assert!(buffer.samples().iter().all(|s| *s == 0.0));
    }

    #[test]
    fn little_endian_pairs() {
        let buffer = decode_pcm16le(&[0x00, 0x40, 0x00, 0xc0, 0x01, 0x00]).unwrap();
        assert_eq!(buffer.samples(), [0.5, -0.5, 1.0 / 32768.0]);
    }

    #[test]
    fn empty_block() {
        let buffer = decode(&EncodedAudioBlock::from("")).unwrap();
        assert!(buffer.is_empty());
        assert_eq!(buffer.duration(), Duration::ZERO);
    }

    #[test]
    fn odd_byte_length() {
        // three bytes
        let block = EncodedAudioBlock::from("AAAA");
        assert!(matches!(
            decode(&block),
            Err(DecodeError::OddByteLength { len: 3 })
        ));
    }

    #[test]
    fn not_base64() {
        let block = EncodedAudioBlock::from("not base64!");
        assert!(matches!(decode(&block), Err(DecodeError::Base64(_))));
    }

    #[test]
    fn equal_by_content() {
        let first = EncodedAudioBlock::from("AAAA".to_string());
        let second = EncodedAudioBlock::new("AAAA");
        assert_eq!(first, second);
        assert_ne!(first, EncodedAudioBlock::from("AAAB"));
    }

    #[test]
    fn encode_matches_service_format() {
        assert_eq!(encode_pcm16le(&[1, -1]).as_str(), "AQD//w==");
    }

    quickcheck! {
        fn sample_count_is_half_the_bytes(bytes: Vec<u8>) -> bool {
            let mut bytes = bytes;
            bytes.truncate(bytes.len() & !1);
            let buffer = decode_pcm16le(&bytes).unwrap();
            buffer.len() == bytes.len() / 2
                && buffer.samples().iter().all(|s| (-1.0..=1.0).contains(s))
        }

        fn odd_lengths_fail(bytes: Vec<u8>) -> bool {
            let mut bytes = bytes;
            if bytes.len() % 2 == 0 {
                bytes.push(0);
            }
            let len = bytes.len();
            matches!(decode_pcm16le(&bytes), Err(DecodeError::OddByteLength { len: got }) if got == len)
        }
    }
}
