//! WAV encoding
//!
//! Interleaved 16-bit little-endian PCM behind a RIFF/WAVE header, written
//! and read back with `hound`.

use std::io::Cursor;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use serde::Serialize;

use crate::audio::buffer::AudioBuffer;
use crate::error::{Result, StillnessError};

/// Size of the RIFF header plus `fmt ` and `data` chunk headers
pub const HEADER_LEN: usize = 44;

/// MIME type of encoded assets
pub const WAV_MIME_TYPE: &str = "audio/wav";

const BITS_PER_SAMPLE: u16 = 16;
const BYTES_PER_SAMPLE: usize = 2;

/// Convert one float sample to 16-bit PCM
///
/// Clamps to [-1, 1], scales negatives by 32768 and everything else by
/// 32767, then truncates toward zero. No dithering.
#[inline]
pub fn quantize(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    if clamped < 0.0 {
        (clamped * 32768.0) as i16
    } else {
        (clamped * 32767.0) as i16
    }
}

/// Encode a buffer as a 16-bit PCM WAV file image
///
/// Mono and stereo buffers get the canonical 44-byte header.
pub fn encode_wav(buffer: &AudioBuffer) -> Result<Vec<u8>> {
    buffer.check_shape()?;

    let channels = u16::try_from(buffer.channels()).map_err(|_| StillnessError::InvalidFormat {
        reason: format!("{} channels do not fit a WAV header", buffer.channels()),
    })?;
    let sample_rate = buffer.sample_rate;

    // hound derives these itself without overflow checks
    let block_align = channels
        .checked_mul(BYTES_PER_SAMPLE as u16)
        .ok_or_else(|| StillnessError::InvalidFormat {
            reason: format!("{} channels overflow the block alignment", channels),
        })?;
    sample_rate
        .checked_mul(block_align as u32)
        .ok_or_else(|| StillnessError::InvalidFormat {
            reason: format!(
                "{} Hz x {} channels overflows the byte rate",
                sample_rate, channels
            ),
        })?;

    let data_len = buffer.len() * buffer.channels() * BYTES_PER_SAMPLE;
    let total_len = data_len + HEADER_LEN;
    if u32::try_from(total_len - 8).is_err() {
        return Err(StillnessError::InvalidFormat {
            reason: format!("{} bytes of audio exceed the 4 GiB RIFF limit", data_len),
        });
    }

    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(total_len));
    let mut writer = WavWriter::new(&mut cursor, spec).map_err(write_error)?;
    for frame in 0..buffer.len() {
        for channel in &buffer.samples {
            writer
                .write_sample(quantize(channel[frame]))
                .map_err(write_error)?;
        }
    }
    writer.finalize().map_err(write_error)?;

    Ok(cursor.into_inner())
}

fn write_error(err: hound::Error) -> StillnessError {
    match err {
        hound::Error::Unsupported | hound::Error::InvalidSampleFormat => {
            StillnessError::InvalidFormat {
                reason: format!("Failed to write WAV data: {}", err),
            }
        }
        other => StillnessError::InvalidAudio {
            reason: format!("Failed to write WAV data: {}", other),
            source: Some(Box::new(other)),
        },
    }
}

/// What a decoder sees in a WAV file image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WavSummary {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    /// Samples per channel
    pub frames: u32,
}

impl WavSummary {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames as f64 / self.sample_rate as f64
    }
}

fn open(bytes: &[u8]) -> Result<WavReader<Cursor<&[u8]>>> {
    WavReader::new(Cursor::new(bytes)).map_err(|e| StillnessError::InvalidAudio {
        reason: format!("Failed to parse WAV data: {}", e),
        source: Some(Box::new(e)),
    })
}

/// Read the header of a WAV file image
pub fn inspect_wav(bytes: &[u8]) -> Result<WavSummary> {
    let reader = open(bytes)?;
    let spec = reader.spec();
    Ok(WavSummary {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        frames: reader.duration(),
    })
}

/// Decode a 16-bit PCM WAV file image into interleaved samples
pub fn decode_wav(bytes: &[u8]) -> Result<(WavSummary, Vec<i16>)> {
    let mut reader = open(bytes)?;
    let spec = reader.spec();
    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != BITS_PER_SAMPLE {
        return Err(StillnessError::InvalidFormat {
            reason: format!(
                "{}-bit {:?} audio (only 16-bit PCM supported)",
                spec.bits_per_sample, spec.sample_format
            ),
        });
    }

    let summary = WavSummary {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        frames: reader.duration(),
    };
    let samples = reader
        .samples::<i16>()
        .collect::<std::result::Result<Vec<i16>, _>>()
        .map_err(|e| StillnessError::InvalidAudio {
            reason: format!("Failed to read 16-bit samples: {}", e),
            source: Some(Box::new(e)),
        })?;

    Ok((summary, samples))
}
