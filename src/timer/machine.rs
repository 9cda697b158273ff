//! Timer Machine
//!
//! Couples the pure [`Attempt`] with its side effects: the tick timer that
//! drives the countdown and the looping chord that plays while it runs.
//!
//! Audio is strictly best effort. Every failure at the host boundary is
//! caught here and turned into a permanent silent mode; none of it can
//! change what the attempt does.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::audio::asset::AudioAsset;
use crate::audio::host::{AudioHost, Player};
use crate::audio::loader::AssetState;
use crate::error::Result;
use crate::timer::attempt::{Attempt, AttemptStatus};
use crate::timer::scheduler::TickTimer;

/// User-controlled playback settings, independent of the attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaybackState {
    pub muted: bool,
}

/// Availability of the chord for this session
pub enum AudioStatus {
    /// Startup render not finished yet
    Pending,
    /// Asset loaded into a host player
    Ready(Box<dyn Player>),
    /// Audio is off for the rest of the session
    Unavailable { reason: String },
}

impl AudioStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, AudioStatus::Ready(_))
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, AudioStatus::Unavailable { .. })
    }
}

impl fmt::Debug for AudioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioStatus::Pending => write!(f, "Pending"),
            AudioStatus::Ready(player) => f
                .debug_struct("Ready")
                .field("playing", &player.is_playing())
                .field("muted", &player.is_muted())
                .finish(),
            AudioStatus::Unavailable { reason } => {
                f.debug_struct("Unavailable").field("reason", reason).finish()
            }
        }
    }
}

/// The countdown state machine with its timer and audio side effects
#[derive(Debug)]
pub struct TimerMachine {
    attempt: Attempt,
    playback: PlaybackState,
    audio: AudioStatus,
    ticker: TickTimer,
}

impl TimerMachine {
    /// Fresh machine: Idle attempt, unmuted, audio pending
    pub fn new(tick_period: Duration) -> Self {
        Self {
            attempt: Attempt::new(),
            playback: PlaybackState::default(),
            audio: AudioStatus::Pending,
            ticker: TickTimer::new(tick_period),
        }
    }

    // ========================================================================
    // Attempt Transitions
    // ========================================================================

    /// Idle -> Running, arming the tick timer and starting the chord
    pub fn start(&mut self) -> Result<()> {
        self.attempt.start()?;
        self.ticker.arm();
        log::info!(
            "[TIMER] Attempt {} started, {} to go",
            self.attempt.generation(),
            self.attempt.clock()
        );
        self.play_audio();
        Ok(())
    }

    /// Count down one second
    ///
    /// Completing the attempt cancels the timer and pauses the chord.
    /// Returns the seconds left.
    pub fn tick(&mut self) -> Result<u32> {
        let remaining = self.attempt.tick()?;
        log::debug!(
            "[TIMER] Attempt {} at {}",
            self.attempt.generation(),
            self.attempt.clock()
        );
        if self.attempt.status() == AttemptStatus::Completed {
            self.ticker.cancel();
            self.pause_audio();
            log::info!("[TIMER] Attempt {} completed", self.attempt.generation());
        }
        Ok(remaining)
    }

    /// Fail a running attempt; ignored in any other state
    ///
    /// Returns whether the attempt was failed.
    pub fn report_disturbance(&mut self) -> bool {
        if self.attempt.fail().is_err() {
            log::debug!(
                "[TIMER] Disturbance ignored while {}",
                self.attempt.status()
            );
            return false;
        }
        self.ticker.cancel();
        self.pause_audio();
        log::info!(
            "[TIMER] Attempt {} failed with {} left",
            self.attempt.generation(),
            self.attempt.clock()
        );
        true
    }

    /// Failed | Completed -> Idle, rewinding the chord
    pub fn reset(&mut self) -> Result<()> {
        self.attempt.reset()?;
        self.ticker.cancel();
        if let AudioStatus::Ready(player) = &mut self.audio {
            player.pause();
            player.rewind();
        }
        log::debug!("[TIMER] Reset to {}", self.attempt.clock());
        Ok(())
    }

    /// Flip the mute flag and pass it on to the player
    pub fn toggle_mute(&mut self) -> bool {
        self.playback.muted = !self.playback.muted;
        if let AudioStatus::Ready(player) = &mut self.audio {
            player.set_muted(self.playback.muted);
        }
        log::debug!("[AUDIO] Muted: {}", self.playback.muted);
        self.playback.muted
    }

    // ========================================================================
    // Audio Boundary
    // ========================================================================

    /// Accept the resolution of the startup render
    ///
    /// Only the first resolution counts; audio never comes back once it is
    /// unavailable.
    pub fn attach_audio(&mut self, host: &dyn AudioHost, state: AssetState) {
        if !matches!(self.audio, AudioStatus::Pending) {
            log::debug!("[AUDIO] Ignoring late asset resolution");
            return;
        }
        match state {
            AssetState::Pending => {}
            AssetState::Ready(asset) => self.load_player(host, asset),
            AssetState::Unavailable { reason } => self.disable_audio(reason),
        }
    }

    /// Host error callback for the active player
    pub fn on_playback_error(&mut self, reason: impl Into<String>) {
        if let AudioStatus::Ready(player) = &mut self.audio {
            player.pause();
        }
        self.disable_audio(reason.into());
    }

    fn load_player(&mut self, host: &dyn AudioHost, asset: Arc<AudioAsset>) {
        match host.load(asset) {
            Ok(mut player) => {
                player.set_muted(self.playback.muted);
                self.audio = AudioStatus::Ready(player);
                log::debug!("[AUDIO] Player loaded");
                if self.attempt.is_running() {
                    self.play_audio();
                }
            }
            Err(err) => self.disable_audio(err.to_string()),
        }
    }

    fn play_audio(&mut self) {
        let AudioStatus::Ready(player) = &mut self.audio else {
            return;
        };
        if let Err(err) = player.play() {
            self.disable_audio(err.to_string());
        }
    }

    fn pause_audio(&mut self) {
        if let AudioStatus::Ready(player) = &mut self.audio {
            player.pause();
        }
    }

    fn disable_audio(&mut self, reason: String) {
        log::warn!("[AUDIO] Audio unavailable: {}", reason);
        self.audio = AudioStatus::Unavailable { reason };
    }

    // ========================================================================
    // Scheduling
    // ========================================================================

    /// Wait for the next countdown tick
    ///
    /// Pends forever unless an attempt is running. Cancel-safe.
    pub async fn next_tick(&mut self) {
        self.ticker.tick().await
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_armed()
    }

    // ========================================================================
    // State Queries
    // ========================================================================

    pub fn attempt(&self) -> &Attempt {
        &self.attempt
    }

    pub fn status(&self) -> AttemptStatus {
        self.attempt.status()
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.attempt.remaining_seconds()
    }

    pub fn playback(&self) -> PlaybackState {
        self.playback
    }

    pub fn is_muted(&self) -> bool {
        self.playback.muted
    }

    pub fn audio(&self) -> &AudioStatus {
        &self.audio
    }

    /// Whether the chord is currently playing (muted or not)
    pub fn is_audio_playing(&self) -> bool {
        match &self.audio {
            AudioStatus::Ready(player) => player.is_playing(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::buffer::AudioBuffer;
    use crate::audio::synth::OfflineRenderer;
    use crate::error::StillnessError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// Records what the machine asked of the player
    #[derive(Default)]
    struct Probe {
        playing: AtomicBool,
        muted: AtomicBool,
        rewinds: Mutex<u32>,
    }

    struct ProbePlayer {
        probe: Arc<Probe>,
        refuse: bool,
    }

    impl Player for ProbePlayer {
        fn play(&mut self) -> Result<()> {
            if self.refuse {
                return Err(StillnessError::PlaybackRefused {
                    reason: "autoplay blocked".to_string(),
                });
            }
            self.probe.playing.store(true, Ordering::SeqCst);
            Ok(())
        }
        fn pause(&mut self) {
            self.probe.playing.store(false, Ordering::SeqCst);
        }
        fn rewind(&mut self) {
            *self.probe.rewinds.lock().unwrap() += 1;
        }
        fn set_muted(&mut self, muted: bool) {
            self.probe.muted.store(muted, Ordering::SeqCst);
        }
        fn is_playing(&self) -> bool {
            self.probe.playing.load(Ordering::SeqCst)
        }
        fn is_muted(&self) -> bool {
            self.probe.muted.load(Ordering::SeqCst)
        }
    }

    struct ProbeHost {
        probe: Arc<Probe>,
        refuse: bool,
    }

    impl AudioHost for ProbeHost {
        fn sample_rate(&self) -> u32 {
            8000
        }
        fn offline_renderer(&self) -> Option<Arc<dyn OfflineRenderer>> {
            None
        }
        fn load(&self, _asset: Arc<AudioAsset>) -> Result<Box<dyn Player>> {
            Ok(Box::new(ProbePlayer {
                probe: Arc::clone(&self.probe),
                refuse: self.refuse,
            }))
        }
    }

    fn asset() -> AssetState {
        let asset = AudioAsset::from_buffer(AudioBuffer::new(2, 8, 8000)).unwrap();
        AssetState::Ready(Arc::new(asset))
    }

    fn machine_with_audio(refuse: bool) -> (TimerMachine, Arc<Probe>) {
        let probe = Arc::new(Probe::default());
        let host = ProbeHost {
            probe: Arc::clone(&probe),
            refuse,
        };
        let mut machine = TimerMachine::new(Duration::from_secs(1));
        machine.attach_audio(&host, asset());
        (machine, probe)
    }

    #[tokio::test]
    async fn test_start_arms_timer_and_plays() {
        let (mut machine, probe) = machine_with_audio(false);
        machine.start().unwrap();
        assert_eq!(machine.status(), AttemptStatus::Running);
        assert_eq!(machine.remaining_seconds(), 120);
        assert!(machine.is_ticking());
        assert!(probe.playing.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_start_while_running_is_noop() {
        let (mut machine, _probe) = machine_with_audio(false);
        machine.start().unwrap();
        machine.tick().unwrap();
        assert!(machine.start().is_err());
        assert_eq!(machine.remaining_seconds(), 119);
        assert_eq!(machine.attempt().generation(), 1);
    }

    #[tokio::test]
    async fn test_completion_stops_timer_and_audio() {
        let (mut machine, probe) = machine_with_audio(false);
        machine.start().unwrap();
        for _ in 0..120 {
            machine.tick().unwrap();
        }
        assert_eq!(machine.status(), AttemptStatus::Completed);
        assert!(!machine.is_ticking());
        assert!(!probe.playing.load(Ordering::SeqCst));
        assert!(machine.tick().is_err());
        assert_eq!(machine.remaining_seconds(), 0);
    }

    #[tokio::test]
    async fn test_disturbance_fails_and_stops() {
        let (mut machine, probe) = machine_with_audio(false);
        machine.start().unwrap();
        for _ in 0..119 {
            machine.tick().unwrap();
        }
        assert!(machine.report_disturbance());
        assert_eq!(machine.status(), AttemptStatus::Failed);
        assert!(!machine.is_ticking());
        assert!(!probe.playing.load(Ordering::SeqCst));
    }

    #[test]
    fn test_disturbance_outside_running_ignored() {
        let mut machine = TimerMachine::new(Duration::from_secs(1));
        assert!(!machine.report_disturbance());
        assert_eq!(machine.status(), AttemptStatus::Idle);
    }

    #[tokio::test]
    async fn test_disturbance_after_failure_ignored() {
        let mut machine = TimerMachine::new(Duration::from_secs(1));
        machine.start().unwrap();
        assert!(machine.report_disturbance());
        assert!(!machine.report_disturbance());
        assert_eq!(machine.status(), AttemptStatus::Failed);
    }

    #[tokio::test]
    async fn test_disturbance_after_completion_ignored() {
        let (mut machine, probe) = machine_with_audio(false);
        machine.start().unwrap();
        for _ in 0..120 {
            machine.tick().unwrap();
        }

        assert!(!machine.report_disturbance());
        assert_eq!(machine.status(), AttemptStatus::Completed);
        assert_eq!(machine.remaining_seconds(), 0);
        assert!(!machine.is_ticking());
        assert!(!probe.playing.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_reset_rewinds_player() {
        let (mut machine, probe) = machine_with_audio(false);
        machine.start().unwrap();
        machine.tick().unwrap();
        machine.report_disturbance();
        machine.reset().unwrap();
        assert_eq!(machine.status(), AttemptStatus::Idle);
        assert_eq!(machine.remaining_seconds(), 120);
        assert_eq!(*probe.rewinds.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reset_while_running_is_noop() {
        let (mut machine, probe) = machine_with_audio(false);
        machine.start().unwrap();
        assert!(machine.reset().is_err());
        assert_eq!(machine.status(), AttemptStatus::Running);
        assert!(machine.is_ticking());
        assert_eq!(*probe.rewinds.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_playback_refusal_keeps_timer_running() {
        let (mut machine, _probe) = machine_with_audio(true);
        machine.start().unwrap();
        assert_eq!(machine.status(), AttemptStatus::Running);
        assert!(machine.is_ticking());
        assert!(machine.audio().is_unavailable());
    }

    #[test]
    fn test_toggle_mute_propagates() {
        let (mut machine, probe) = machine_with_audio(false);
        assert!(machine.toggle_mute());
        assert!(probe.muted.load(Ordering::SeqCst));
        assert!(!machine.toggle_mute());
        assert!(!probe.muted.load(Ordering::SeqCst));
        assert_eq!(machine.status(), AttemptStatus::Idle);
    }

    #[test]
    fn test_mute_before_audio_applies_on_load() {
        let probe = Arc::new(Probe::default());
        let host = ProbeHost {
            probe: Arc::clone(&probe),
            refuse: false,
        };
        let mut machine = TimerMachine::new(Duration::from_secs(1));
        machine.toggle_mute();
        machine.attach_audio(&host, asset());
        assert!(probe.muted.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_audio_arriving_mid_attempt_starts_playing() {
        let probe = Arc::new(Probe::default());
        let host = ProbeHost {
            probe: Arc::clone(&probe),
            refuse: false,
        };
        let mut machine = TimerMachine::new(Duration::from_secs(1));
        machine.start().unwrap();
        machine.attach_audio(&host, asset());
        assert!(machine.is_audio_playing());
    }

    #[test]
    fn test_unavailable_is_permanent() {
        let probe = Arc::new(Probe::default());
        let host = ProbeHost {
            probe: Arc::clone(&probe),
            refuse: false,
        };
        let mut machine = TimerMachine::new(Duration::from_secs(1));
        machine.attach_audio(
            &host,
            AssetState::Unavailable {
                reason: "no renderer".to_string(),
            },
        );
        machine.attach_audio(&host, asset());
        assert!(machine.audio().is_unavailable());
    }

    #[test]
    fn test_playback_error_disables_audio() {
        let (mut machine, probe) = machine_with_audio(false);
        machine.on_playback_error("decoder crashed");
        assert!(machine.audio().is_unavailable());
        assert!(!probe.playing.load(Ordering::SeqCst));
    }
}
