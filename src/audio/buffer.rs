//! Audio Buffer
//!
//! Non-interleaved 32-bit float sample storage used by the renderer and
//! the encoder.

use crate::error::{Result, StillnessError};

/// Convert linear amplitude to decibels
///
/// Returns `f32::NEG_INFINITY` for zero input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Rendered audio: one `Vec<f32>` per channel, all the same length
///
/// # Example
/// ```
/// use stillness::audio::AudioBuffer;
///
/// // One second of stereo silence
/// let buffer = AudioBuffer::new(2, 48000, 48000);
/// assert_eq!(buffer.channels(), 2);
/// assert_eq!(buffer.len(), 48000);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Sample data: outer Vec is channels, inner Vec is samples
    pub samples: Vec<Vec<f32>>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioBuffer {
    /// Create a zeroed buffer
    pub fn new(channels: usize, frames: usize, sample_rate: u32) -> Self {
        Self {
            samples: vec![vec![0.0_f32; frames]; channels],
            sample_rate,
        }
    }

    /// Build a buffer by copying one mono signal into every channel
    pub fn from_mono(mono: Vec<f32>, channels: usize, sample_rate: u32) -> Self {
        Self {
            samples: vec![mono; channels],
            sample_rate,
        }
    }

    /// Build a buffer from pre-split channels, checking they line up
    pub fn from_channels(samples: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        let buffer = Self {
            samples,
            sample_rate,
        };
        buffer.check_shape()?;
        Ok(buffer)
    }

    /// Number of channels
    #[inline]
    pub fn channels(&self) -> usize {
        self.samples.len()
    }

    /// Number of frames (samples per channel)
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.first().map(|ch| ch.len()).unwrap_or(0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Duration in seconds
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.len() as f64 / self.sample_rate as f64
    }

    /// Samples of one channel
    ///
    /// # Panics
    /// Panics if the channel index is out of bounds
    #[inline]
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.samples[index]
    }

    /// Frame-major interleaved copy (L, R, L, R, ... for stereo)
    pub fn to_interleaved(&self) -> Vec<f32> {
        let mut interleaved = Vec::with_capacity(self.channels() * self.len());
        for frame in 0..self.len() {
            for channel in &self.samples {
                interleaved.push(channel[frame]);
            }
        }
        interleaved
    }

    /// Largest absolute sample value across all channels
    pub fn peak(&self) -> f32 {
        self.samples
            .iter()
            .flat_map(|channel| channel.iter())
            .map(|&s| s.abs())
            .fold(0.0_f32, f32::max)
    }

    /// Peak level in dBFS
    pub fn peak_db(&self) -> f32 {
        linear_to_db(self.peak())
    }

    /// Reject buffers the encoder cannot represent
    pub fn check_shape(&self) -> Result<()> {
        if self.samples.is_empty() {
            return Err(StillnessError::InvalidFormat {
                reason: "buffer has no channels".to_string(),
            });
        }
        if self.sample_rate == 0 {
            return Err(StillnessError::InvalidFormat {
                reason: "sample rate is zero".to_string(),
            });
        }
        let frames = self.len();
        if let Some(index) = self.samples.iter().position(|ch| ch.len() != frames) {
            return Err(StillnessError::InvalidFormat {
                reason: format!(
                    "channel {} has {} samples, expected {}",
                    index,
                    self.samples[index].len(),
                    frames
                ),
            });
        }
        Ok(())
    }
}
