//! Host audio facilities
//!
//! The timer never talks to an audio device directly. It goes through an
//! [`AudioHost`], which renders offline and hands back [`Player`]s for
//! live playback. [`LoopbackHost`] is the in-process implementation used by
//! the terminal shell and the tests.

use std::fmt;
use std::sync::Arc;

use crate::audio::asset::AudioAsset;
use crate::audio::synth::{NativeRenderer, OfflineRenderer};
use crate::audio::wav::decode_wav;
use crate::config::DEFAULT_SAMPLE_RATE;
use crate::error::{Result, StillnessError};

/// Live playback of one loaded asset
///
/// `play` may be refused by the host (autoplay policy, no device); the
/// caller turns that into silent mode. The rest are infallible requests.
pub trait Player: Send {
    /// Start or resume playback from the current position
    fn play(&mut self) -> Result<()>;
    /// Stop advancing, keep the position
    fn pause(&mut self);
    /// Move the position back to the start
    fn rewind(&mut self);
    fn set_muted(&mut self, muted: bool);
    fn is_playing(&self) -> bool;
    fn is_muted(&self) -> bool;
}

/// Host audio facility: offline rendering plus live playback
pub trait AudioHost: Send + Sync {
    /// Sample rate the host renders and plays at
    fn sample_rate(&self) -> u32;

    /// Offline renderer, if the host has one
    fn offline_renderer(&self) -> Option<Arc<dyn OfflineRenderer>>;

    /// Load an asset for looping playback
    fn load(&self, asset: Arc<AudioAsset>) -> Result<Box<dyn Player>>;
}

// ============================================================================
// Loopback Host
// ============================================================================

/// In-process host: native rendering and a software [`LoopPlayer`]
#[derive(Debug, Clone)]
pub struct LoopbackHost {
    sample_rate: u32,
}

impl Default for LoopbackHost {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}

impl LoopbackHost {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

impl AudioHost for LoopbackHost {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn offline_renderer(&self) -> Option<Arc<dyn OfflineRenderer>> {
        Some(Arc::new(NativeRenderer))
    }

    fn load(&self, asset: Arc<AudioAsset>) -> Result<Box<dyn Player>> {
        let player = LoopPlayer::from_wav(asset.encoded_bytes())?;
        Ok(Box::new(player))
    }
}

// ============================================================================
// Loop Player
// ============================================================================

/// Transport state of a [`LoopPlayer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    /// Not advancing (default state)
    #[default]
    Paused,
    /// Advancing and producing output
    Playing,
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportState::Paused => write!(f, "Paused"),
            TransportState::Playing => write!(f, "Playing"),
        }
    }
}

/// Software player that loops a decoded WAV image
///
/// An output callback pulls interleaved frames through [`LoopPlayer::fill`].
/// The playhead wraps at the end of the loop.
#[derive(Debug, Clone)]
pub struct LoopPlayer {
    /// Decoded interleaved samples
    samples: Vec<f32>,
    channels: usize,
    sample_rate: u32,
    state: TransportState,
    /// Playhead in frames, always `< frames()` when non-empty
    playhead: usize,
    muted: bool,
}

impl LoopPlayer {
    /// Decode a 16-bit PCM WAV image
    pub fn from_wav(bytes: &[u8]) -> Result<Self> {
        let (summary, pcm) = decode_wav(bytes)?;
        if summary.channels == 0 {
            return Err(StillnessError::AudioUnavailable {
                reason: "asset has no channels".to_string(),
            });
        }
        Ok(Self {
            samples: pcm.into_iter().map(|s| s as f32 / 32768.0).collect(),
            channels: summary.channels as usize,
            sample_rate: summary.sample_rate,
            state: TransportState::Paused,
            playhead: 0,
            muted: false,
        })
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Loop length in frames
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels
    }

    /// Playhead position in frames
    pub fn playhead(&self) -> usize {
        self.playhead
    }

    /// Playhead position in seconds
    pub fn playhead_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.playhead as f64 / self.sample_rate as f64
    }

    /// Move the playhead forward while playing, wrapping at the loop end
    pub fn advance(&mut self, frames: usize) {
        if self.state == TransportState::Playing && self.frames() > 0 {
            self.playhead = (self.playhead + frames) % self.frames();
        }
    }

    /// Write interleaved output into `out` and advance
    ///
    /// Paused or muted players write silence; muted players still advance.
    /// Returns the number of whole frames written.
    pub fn fill(&mut self, out: &mut [f32]) -> usize {
        let frames = out.len() / self.channels;
        let audible = self.state == TransportState::Playing && !self.muted && self.frames() > 0;

        if !audible {
            out.fill(0.0);
        } else {
            let loop_frames = self.frames();
            for (i, frame) in out.chunks_exact_mut(self.channels).enumerate() {
                let source = ((self.playhead + i) % loop_frames) * self.channels;
                frame.copy_from_slice(&self.samples[source..source + self.channels]);
            }
        }

        self.advance(frames);
        frames
    }
}

impl Player for LoopPlayer {
    fn play(&mut self) -> Result<()> {
        match self.state {
            TransportState::Paused => {
                self.state = TransportState::Playing;
                log::debug!("[TRANSPORT] Play from {:.3}s", self.playhead_secs());
            }
            TransportState::Playing => {
                log::debug!("[TRANSPORT] Already playing");
            }
        }
        Ok(())
    }

    fn pause(&mut self) {
        if self.state == TransportState::Playing {
            self.state = TransportState::Paused;
            log::debug!("[TRANSPORT] Paused at {:.3}s", self.playhead_secs());
        }
    }

    fn rewind(&mut self) {
        self.playhead = 0;
        log::debug!("[TRANSPORT] Rewound to 0");
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    fn is_muted(&self) -> bool {
        self.muted
    }
}
