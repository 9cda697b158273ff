//! Audio Module
//!
//! The looping chord, from oscillators to a playable WAV image:
//! - Gain envelopes and offline rendering
//! - 16-bit PCM WAV encoding
//! - One-shot asset loading
//! - Host playback ports

pub mod asset;
pub mod buffer;
pub mod envelope;
pub mod host;
pub mod loader;
pub mod synth;
pub mod wav;

pub use asset::AudioAsset;
pub use buffer::AudioBuffer;
pub use envelope::{Automation, Envelope};
pub use host::{AudioHost, LoopPlayer, LoopbackHost, Player, TransportState};
pub use loader::{AssetLoader, AssetState};
pub use synth::{NativeRenderer, OfflineRenderer, RenderFormat, ToneSynthesizer, Voice};
pub use wav::{decode_wav, encode_wav, inspect_wav, quantize, WavSummary};
