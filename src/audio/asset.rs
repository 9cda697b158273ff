//! The rendered chord asset

use std::fmt;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::audio::buffer::AudioBuffer;
use crate::audio::wav::{encode_wav, WAV_MIME_TYPE};
use crate::error::Result;

/// Immutable rendered waveform plus its WAV encoding
///
/// Built once per session and shared as `Arc<AudioAsset>`.
#[derive(Clone, PartialEq)]
pub struct AudioAsset {
    buffer: AudioBuffer,
    encoded: Arc<[u8]>,
}

impl AudioAsset {
    /// Encode `buffer` and wrap both forms
    pub fn from_buffer(buffer: AudioBuffer) -> Result<Self> {
        let encoded = encode_wav(&buffer)?;
        Ok(Self {
            buffer,
            encoded: encoded.into(),
        })
    }

    pub fn buffer(&self) -> &AudioBuffer {
        &self.buffer
    }

    pub fn sample_rate(&self) -> u32 {
        self.buffer.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.buffer.channels()
    }

    pub fn frames(&self) -> usize {
        self.buffer.len()
    }

    pub fn duration_secs(&self) -> f64 {
        self.buffer.duration_secs()
    }

    /// The WAV file image
    pub fn encoded_bytes(&self) -> &[u8] {
        &self.encoded
    }

    /// Shared handle to the WAV file image, for hosts that keep it around
    pub fn encoded_handle(&self) -> Arc<[u8]> {
        Arc::clone(&self.encoded)
    }

    pub fn mime_type(&self) -> &'static str {
        WAV_MIME_TYPE
    }

    /// Lowercase hex SHA-256 of the encoded bytes
    pub fn checksum(&self) -> String {
        let hash = Sha256::digest(self.encoded.as_ref());
        format!("{:x}", hash)
    }
}

impl fmt::Debug for AudioAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioAsset")
            .field("sample_rate", &self.sample_rate())
            .field("channels", &self.channels())
            .field("frames", &self.frames())
            .field("encoded_len", &self.encoded.len())
            .finish()
    }
}
