//! Configuration for Stillness
//!
//! Durations and chord frequencies are fixed; these structs exist so the
//! session and synthesizer read them from one place, not so users can
//! change them.

use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Length of one attempt in seconds (2 minutes)
pub const ATTEMPT_SECONDS: u32 = 120;

/// Wall-clock period between ticks
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Sample rate used when the host does not report one
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// Number of output channels in the rendered asset
pub const LOOP_CHANNELS: u16 = 2;

/// Duration of the rendered loop in seconds
pub const LOOP_DURATION_SECS: u32 = 4;

/// C major triad: C4, E4, G4
pub const CHORD_FREQUENCIES: [f32; 3] = [261.63, 329.63, 392.00];

// ============================================================================
// Tone Configuration
// ============================================================================

/// Shape of the synthesized chord
///
/// Gains are totals for the whole chord; each voice receives
/// `gain / frequencies.len()`.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneConfig {
    /// Oscillator frequencies in Hz, one voice each
    pub frequencies: Vec<f32>,
    /// Length of the rendered loop in seconds
    pub duration_secs: u32,
    /// Output channel count (mono mix duplicated to every channel)
    pub channels: u16,
    /// Total gain reached at the end of the attack
    pub peak_gain: f32,
    /// Total gain reached at the end of the first decay
    pub settle_gain: f32,
    /// Per-voice gain at the end of the loop
    pub floor_gain: f32,
    /// Attack length in seconds
    pub attack_secs: f64,
    /// Time in seconds at which the first decay ends
    pub settle_secs: f64,
}

impl Default for ToneConfig {
    fn default() -> Self {
        ToneConfig {
            frequencies: CHORD_FREQUENCIES.to_vec(),
            duration_secs: LOOP_DURATION_SECS,
            channels: LOOP_CHANNELS,
            peak_gain: 0.2,
            settle_gain: 0.1,
            floor_gain: 0.0001,
            attack_secs: 0.02,
            settle_secs: 0.5,
        }
    }
}

impl ToneConfig {
    /// Number of frames the loop occupies at `sample_rate`
    pub fn frames(&self, sample_rate: u32) -> usize {
        sample_rate as usize * self.duration_secs as usize
    }

    /// Peak gain of a single voice
    pub fn voice_peak(&self) -> f32 {
        self.peak_gain / self.voice_count() as f32
    }

    /// Settle gain of a single voice
    pub fn voice_settle(&self) -> f32 {
        self.settle_gain / self.voice_count() as f32
    }

    fn voice_count(&self) -> usize {
        self.frequencies.len().max(1)
    }
}

// ============================================================================
// Session Configuration
// ============================================================================

/// Runtime settings for a [`crate::session::Session`]
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Period between countdown ticks
    pub tick_period: Duration,
    /// Chord rendered at startup
    pub tone: ToneConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            tick_period: TICK_PERIOD,
            tone: ToneConfig::default(),
        }
    }
}
