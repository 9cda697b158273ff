//! Error handling for Stillness
//!
//! Audio failures are converted into a permanent "silent" mode at the
//! host boundary, so none of these errors should ever take the process down.

use thiserror::Error;

use crate::timer::AttemptStatus;

/// Result type alias for Stillness operations
pub type Result<T> = std::result::Result<T, StillnessError>;

/// Main error type for Stillness operations
#[derive(Error, Debug)]
pub enum StillnessError {
    // Audio Errors
    #[error("Audio unavailable: {reason}")]
    AudioUnavailable { reason: String },

    #[error("Playback refused by host: {reason}")]
    PlaybackRefused { reason: String },

    // Timer Errors
    #[error("Cannot {operation} while attempt is {status}")]
    InvalidTransition {
        operation: &'static str,
        status: AttemptStatus,
    },

    // Encoding Errors
    #[error("Invalid audio format: {reason}")]
    InvalidFormat { reason: String },

    #[error("Invalid audio data: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StillnessError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            StillnessError::AudioUnavailable { .. } => "AUDIO_UNAVAILABLE",
            StillnessError::PlaybackRefused { .. } => "PLAYBACK_REFUSED",
            StillnessError::InvalidTransition { .. } => "INVALID_TRANSITION",
            StillnessError::InvalidFormat { .. } => "INVALID_FORMAT",
            StillnessError::InvalidAudio { .. } => "INVALID_AUDIO",
            StillnessError::Io(_) => "IO_ERROR",
            StillnessError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recoverable without user involvement
    ///
    /// Audio errors degrade the session to silent mode and invalid
    /// transitions are plain no-ops, so both count as recoverable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StillnessError::AudioUnavailable { .. }
                | StillnessError::PlaybackRefused { .. }
                | StillnessError::InvalidTransition { .. }
        )
    }

    /// Whether this error means audio is gone for the rest of the session
    pub fn disables_audio(&self) -> bool {
        matches!(
            self,
            StillnessError::AudioUnavailable { .. } | StillnessError::PlaybackRefused { .. }
        )
    }

    /// Get a user-friendly message for this error
    pub fn friendly_message(&self) -> String {
        match self {
            StillnessError::AudioUnavailable { .. } | StillnessError::PlaybackRefused { .. } => {
                "Audio unavailable. Enjoy the silence!".to_string()
            }
            _ => self.to_string(),
        }
    }
}
