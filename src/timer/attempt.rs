//! Attempt State Machine
//!
//! One countdown run, from a fresh start to a terminal outcome:
//!
//! ```text
//! Idle --start--> Running --disturbance--> Failed    --reset--> Idle
//!                         --tick to 0----> Completed --reset--> Idle
//! ```
//!
//! This type is pure: it knows nothing about timers, listeners or audio.
//! [`super::TimerMachine`] layers those side effects on top.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ATTEMPT_SECONDS;
use crate::error::{Result, StillnessError};

/// Status of the current attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AttemptStatus {
    /// Fresh attempt, waiting for the user to start (default state)
    #[default]
    Idle,
    /// Countdown in progress
    Running,
    /// The user moved while the countdown was running
    Failed,
    /// The countdown reached zero undisturbed
    Completed,
}

impl AttemptStatus {
    /// Failed and Completed only leave through reset
    pub fn is_terminal(&self) -> bool {
        matches!(self, AttemptStatus::Failed | AttemptStatus::Completed)
    }
}

impl fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptStatus::Idle => write!(f, "Idle"),
            AttemptStatus::Running => write!(f, "Running"),
            AttemptStatus::Failed => write!(f, "Failed"),
            AttemptStatus::Completed => write!(f, "Completed"),
        }
    }
}

/// A single countdown run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    remaining_seconds: u32,
    status: AttemptStatus,
    /// Incremented on every start, so log lines can tell runs apart
    generation: u64,
}

impl Default for Attempt {
    fn default() -> Self {
        Self::new()
    }
}

impl Attempt {
    /// Create a fresh attempt in the Idle state
    pub fn new() -> Self {
        Self {
            remaining_seconds: ATTEMPT_SECONDS,
            status: AttemptStatus::Idle,
            generation: 0,
        }
    }

    /// Idle -> Running
    pub fn start(&mut self) -> Result<()> {
        self.require("start", AttemptStatus::Idle)?;
        self.status = AttemptStatus::Running;
        self.generation += 1;
        Ok(())
    }

    /// Count down one second, completing the attempt when it reaches zero
    ///
    /// Returns the seconds left after the tick.
    pub fn tick(&mut self) -> Result<u32> {
        self.require("tick", AttemptStatus::Running)?;
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.status = AttemptStatus::Completed;
        }
        Ok(self.remaining_seconds)
    }

    /// Running -> Failed, whatever time is left
    pub fn fail(&mut self) -> Result<()> {
        self.require("fail", AttemptStatus::Running)?;
        self.status = AttemptStatus::Failed;
        Ok(())
    }

    /// Failed | Completed -> Idle with a full countdown
    pub fn reset(&mut self) -> Result<()> {
        if !self.status.is_terminal() {
            return Err(self.invalid("reset"));
        }
        self.status = AttemptStatus::Idle;
        self.remaining_seconds = ATTEMPT_SECONDS;
        Ok(())
    }

    pub fn status(&self) -> AttemptStatus {
        self.status
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_running(&self) -> bool {
        self.status == AttemptStatus::Running
    }

    /// Remaining time as `MM:SS`
    pub fn clock(&self) -> String {
        format_clock(self.remaining_seconds)
    }

    fn require(&self, operation: &'static str, expected: AttemptStatus) -> Result<()> {
        if self.status == expected {
            Ok(())
        } else {
            Err(self.invalid(operation))
        }
    }

    fn invalid(&self, operation: &'static str) -> StillnessError {
        StillnessError::InvalidTransition {
            operation,
            status: self.status,
        }
    }
}

/// Format whole seconds as zero-padded `MM:SS`
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
