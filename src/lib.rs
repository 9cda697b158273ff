//! Stillness - Do Nothing for 2 Minutes
//!
//! A relaxation timer: start a two-minute countdown and keep still. Any
//! pointer movement, key press or loss of focus fails the attempt. While
//! the countdown runs, a softly decaying C major chord loops in the
//! background. The chord is synthesized and encoded in-process at startup.
//!
//! # Architecture
//!
//! - [`timer`]: attempt state machine, tick scheduling, disturbance detection
//! - [`audio`]: chord synthesis, WAV encoding, host playback ports
//! - [`session`]: single-task event loop tying the two together
//! - [`view`]: presentation model for a shell

pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod session;
pub mod timer;
pub mod view;

pub use error::{Result, StillnessError};
