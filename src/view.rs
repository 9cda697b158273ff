//! Presentation model
//!
//! Everything a shell needs to draw the timer, derived from machine state
//! so the shell holds no state of its own.

use serde::Serialize;

use crate::timer::{AttemptStatus, AudioStatus, TimerMachine};

pub const TITLE: &str = "Do Nothing for 2 Minutes";
pub const RUNNING_HINT: &str = "Don't move your mouse or use your keyboard!";
pub const FAILED_MESSAGE: &str = "You moved! Try again.";
pub const COMPLETED_MESSAGE: &str = "Congratulations! You did it!";
pub const AUDIO_UNAVAILABLE_MESSAGE: &str = "Audio unavailable. Enjoy the silence!";

/// Status line under the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text")]
pub enum Notice {
    Hint(&'static str),
    Failure(&'static str),
    Success(&'static str),
}

impl Notice {
    pub fn text(&self) -> &'static str {
        match self {
            Notice::Hint(text) | Notice::Failure(text) | Notice::Success(text) => text,
        }
    }
}

/// Audio controls as the shell should show them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AudioControls {
    /// Render not finished: show nothing yet
    Hidden,
    /// Mute toggle visible
    Toggle { muted: bool },
    /// Render or playback failed: show the silence notice instead
    Unavailable,
}

/// Snapshot of what the shell should display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub title: &'static str,
    pub clock: String,
    pub status: AttemptStatus,
    pub notice: Option<Notice>,
    pub show_start: bool,
    pub show_reset: bool,
    pub audio: AudioControls,
}

impl SessionView {
    pub fn from_machine(machine: &TimerMachine) -> Self {
        let status = machine.status();
        let notice = match status {
            AttemptStatus::Idle => None,
            AttemptStatus::Running => Some(Notice::Hint(RUNNING_HINT)),
            AttemptStatus::Failed => Some(Notice::Failure(FAILED_MESSAGE)),
            AttemptStatus::Completed => Some(Notice::Success(COMPLETED_MESSAGE)),
        };
        let audio = match machine.audio() {
            AudioStatus::Pending => AudioControls::Hidden,
            AudioStatus::Ready(_) => AudioControls::Toggle {
                muted: machine.is_muted(),
            },
            AudioStatus::Unavailable { .. } => AudioControls::Unavailable,
        };

        Self {
            title: TITLE,
            clock: machine.attempt().clock(),
            status,
            notice,
            show_start: status == AttemptStatus::Idle,
            show_reset: status.is_terminal(),
            audio,
        }
    }

    /// Whether the mute toggle should be drawn
    pub fn show_audio_toggle(&self) -> bool {
        matches!(self.audio, AudioControls::Toggle { .. })
    }

    /// Text for the audio line, if any
    pub fn audio_notice(&self) -> Option<&'static str> {
        match self.audio {
            AudioControls::Unavailable => Some(AUDIO_UNAVAILABLE_MESSAGE),
            _ => None,
        }
    }
}
