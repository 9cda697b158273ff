//! Timer Module
//!
//! The countdown and everything that can end it:
//! - Attempt state machine
//! - Cancellable tick scheduling
//! - Disturbance detection
//! - Audio side effects

pub mod attempt;
pub mod disturbance;
pub mod machine;
pub mod scheduler;

pub use attempt::{format_clock, Attempt, AttemptStatus};
pub use disturbance::{DisturbanceMonitor, InputBus, InputEvent, InputSource, InputSubscription};
pub use machine::{AudioStatus, PlaybackState, TimerMachine};
pub use scheduler::TickTimer;
