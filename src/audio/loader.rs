//! One-shot asset construction
//!
//! Rendering starts once, at session startup, and resolves exactly once to
//! either a ready asset or a permanent "unavailable" reason. Nothing here
//! retries.

use std::sync::Arc;

use tokio::sync::watch;

use crate::audio::asset::AudioAsset;
use crate::audio::host::AudioHost;
use crate::audio::synth::ToneSynthesizer;
use crate::config::ToneConfig;
use crate::error::{Result, StillnessError};

/// Resolution state of the startup render
#[derive(Debug, Clone, Default)]
pub enum AssetState {
    /// Render still in flight
    #[default]
    Pending,
    /// Render and encode succeeded
    Ready(Arc<AudioAsset>),
    /// Render failed; audio stays off for the session
    Unavailable { reason: String },
}

impl AssetState {
    pub fn is_pending(&self) -> bool {
        matches!(self, AssetState::Pending)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, AssetState::Ready(_))
    }

    fn from_result(result: Result<AudioAsset>) -> Self {
        match result {
            Ok(asset) => AssetState::Ready(Arc::new(asset)),
            Err(err) => AssetState::Unavailable {
                reason: err.to_string(),
            },
        }
    }
}

/// Handle to the startup render
///
/// Cheap to clone; every clone observes the same single resolution.
#[derive(Debug, Clone)]
pub struct AssetLoader {
    state: watch::Receiver<AssetState>,
}

impl AssetLoader {
    /// Start rendering the chord on the blocking pool
    ///
    /// A host without an offline renderer resolves to Unavailable
    /// immediately. Must be called from within a tokio runtime.
    pub fn spawn(host: &dyn AudioHost, tone: ToneConfig) -> Self {
        let Some(renderer) = host.offline_renderer() else {
            log::warn!("[AUDIO] Host has no offline renderer, running silent");
            return Self::resolved(AssetState::Unavailable {
                reason: "host provides no offline audio rendering".to_string(),
            });
        };

        let sample_rate = host.sample_rate();
        let (tx, rx) = watch::channel(AssetState::Pending);

        tokio::spawn(async move {
            let render = tokio::task::spawn_blocking(move || {
                ToneSynthesizer::new(tone).synthesize(renderer.as_ref(), sample_rate)
            });
            let result = render.await.unwrap_or_else(|e| {
                Err(StillnessError::AudioUnavailable {
                    reason: format!("render task failed: {}", e),
                })
            });

            let state = AssetState::from_result(result);
            match &state {
                AssetState::Ready(asset) => log::info!(
                    "[AUDIO] Chord ready: {} frames at {} Hz, sha256 {}",
                    asset.frames(),
                    asset.sample_rate(),
                    asset.checksum()
                ),
                AssetState::Unavailable { reason } => {
                    log::warn!("[AUDIO] Chord render failed, running silent: {}", reason)
                }
                AssetState::Pending => {}
            }
            // Nobody listening is fine: the session may already be gone.
            let _ = tx.send(state);
        });

        Self { state: rx }
    }

    /// A loader that is already resolved
    pub fn resolved(state: AssetState) -> Self {
        let (_tx, rx) = watch::channel(state);
        Self { state: rx }
    }

    /// Current state without waiting
    pub fn current(&self) -> AssetState {
        self.state.borrow().clone()
    }

    /// Wait for resolution
    ///
    /// Cancel-safe. A render task that disappears without publishing counts
    /// as Unavailable.
    pub async fn resolved_state(&mut self) -> AssetState {
        match self.state.wait_for(|state| !state.is_pending()).await {
            Ok(state) => state.clone(),
            Err(_) => AssetState::Unavailable {
                reason: "render task ended without a result".to_string(),
            },
        }
    }
}
