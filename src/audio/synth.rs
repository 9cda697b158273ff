//! Tone synthesis
//!
//! The chord is described as a list of [`Voice`]s (sine oscillator plus
//! gain envelope) and handed to an [`OfflineRenderer`], which mixes them
//! into a buffer faster than real time. [`NativeRenderer`] does this
//! in-process; hosts with their own audio graph can supply another.

use std::f64::consts::TAU;

use crate::audio::asset::AudioAsset;
use crate::audio::buffer::AudioBuffer;
use crate::audio::envelope::Envelope;
use crate::config::ToneConfig;
use crate::error::{Result, StillnessError};

/// One sine oscillator shaped by a gain envelope
#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    /// Oscillator frequency in Hz
    pub frequency: f32,
    /// Gain applied to the oscillator
    pub envelope: Envelope,
}

impl Voice {
    /// Output of this voice at time `t` in seconds
    #[inline]
    pub fn sample_at(&self, t: f64) -> f64 {
        (TAU * self.frequency as f64 * t).sin() * self.envelope.value_at(t) as f64
    }
}

/// Shape of an offline render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub frames: usize,
}

/// Host facility that renders an oscillator graph into samples
pub trait OfflineRenderer: Send + Sync {
    /// Mix `voices` into a buffer of the requested shape
    ///
    /// Every channel receives the same mono mix.
    fn render(&self, voices: &[Voice], format: RenderFormat) -> Result<AudioBuffer>;
}

/// In-process renderer: direct time-domain evaluation, sample by sample
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeRenderer;

impl OfflineRenderer for NativeRenderer {
    fn render(&self, voices: &[Voice], format: RenderFormat) -> Result<AudioBuffer> {
        if format.sample_rate == 0 {
            return Err(StillnessError::InvalidFormat {
                reason: "cannot render at a sample rate of zero".to_string(),
            });
        }
        if format.channels == 0 {
            return Err(StillnessError::InvalidFormat {
                reason: "cannot render zero channels".to_string(),
            });
        }

        let rate = format.sample_rate as f64;
        let mix: Vec<f32> = (0..format.frames)
            .map(|k| {
                let t = k as f64 / rate;
                voices.iter().map(|voice| voice.sample_at(t)).sum::<f64>() as f32
            })
            .collect();

        Ok(AudioBuffer::from_mono(
            mix,
            format.channels as usize,
            format.sample_rate,
        ))
    }
}

/// Builds and renders the looping chord
#[derive(Debug, Clone, Default)]
pub struct ToneSynthesizer {
    config: ToneConfig,
}

impl ToneSynthesizer {
    pub fn new(config: ToneConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ToneConfig {
        &self.config
    }

    /// Envelope shared by every voice
    ///
    /// Silent at 0, linear attack to the voice peak, exponential settle,
    /// then a long exponential fade to the floor at the end of the loop.
    pub fn voice_envelope(&self) -> Envelope {
        let tone = &self.config;
        Envelope::new(0.0)
            .set_value_at(0.0, 0.0)
            .linear_ramp_to(tone.voice_peak(), tone.attack_secs)
            .exponential_ramp_to(tone.voice_settle(), tone.settle_secs)
            .exponential_ramp_to(tone.floor_gain, tone.duration_secs as f64)
    }

    /// One voice per configured frequency
    pub fn voices(&self) -> Vec<Voice> {
        let envelope = self.voice_envelope();
        self.config
            .frequencies
            .iter()
            .map(|&frequency| Voice {
                frequency,
                envelope: envelope.clone(),
            })
            .collect()
    }

    pub fn format(&self, sample_rate: u32) -> RenderFormat {
        RenderFormat {
            sample_rate,
            channels: self.config.channels,
            frames: self.config.frames(sample_rate),
        }
    }

    /// Render through `renderer` and encode the result
    pub fn synthesize(&self, renderer: &dyn OfflineRenderer, sample_rate: u32) -> Result<AudioAsset> {
        let format = self.format(sample_rate);
        log::debug!(
            "[SYNTH] Rendering {} voices, {} frames at {} Hz",
            self.config.frequencies.len(),
            format.frames,
            sample_rate
        );

        let buffer = renderer.render(&self.voices(), format)?;
        if buffer.channels() != format.channels as usize || buffer.len() != format.frames {
            return Err(StillnessError::AudioUnavailable {
                reason: format!(
                    "renderer returned {}x{} samples, expected {}x{}",
                    buffer.channels(),
                    buffer.len(),
                    format.channels,
                    format.frames
                ),
            });
        }

        AudioAsset::from_buffer(buffer)
    }
}
