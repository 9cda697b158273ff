//! Session event loop
//!
//! A [`Session`] owns the [`TimerMachine`] and feeds it, one event at a
//! time, from four sources: countdown ticks, disturbances, the startup
//! render, and shell commands. Everything runs in a single task, so no two
//! events are ever handled at once. When a tick and a disturbance are both
//! ready, the tick goes first.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::audio::host::AudioHost;
use crate::audio::loader::AssetLoader;
use crate::config::SessionConfig;
use crate::timer::{DisturbanceMonitor, InputSource, TimerMachine};
use crate::view::SessionView;

/// Requests from the shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Reset,
    ToggleMute,
    /// The host player reported an error
    PlaybackError(String),
    Shutdown,
}

/// Shell-side handle: send commands, watch views
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    views: watch::Receiver<SessionView>,
}

impl SessionHandle {
    /// Queue a command; returns false once the session has ended
    pub fn send(&self, command: Command) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn start(&self) -> bool {
        self.send(Command::Start)
    }

    pub fn reset(&self) -> bool {
        self.send(Command::Reset)
    }

    pub fn toggle_mute(&self) -> bool {
        self.send(Command::ToggleMute)
    }

    pub fn shutdown(&self) -> bool {
        self.send(Command::Shutdown)
    }

    /// Latest published view
    pub fn view(&self) -> SessionView {
        self.views.borrow().clone()
    }

    /// Wait for the next published view; `None` once the session has ended
    pub async fn changed(&mut self) -> Option<SessionView> {
        self.views.changed().await.ok()?;
        Some(self.views.borrow_and_update().clone())
    }

    /// Wait until a view satisfies `predicate`
    pub async fn wait_for(
        &mut self,
        predicate: impl FnMut(&SessionView) -> bool,
    ) -> Option<SessionView> {
        self.views.wait_for(predicate).await.ok().map(|view| view.clone())
    }
}

/// The running timer with all its event sources
pub struct Session {
    machine: TimerMachine,
    host: Arc<dyn AudioHost>,
    input: Arc<dyn InputSource>,
    monitor: DisturbanceMonitor,
    loader: AssetLoader,
    audio_resolved: bool,
    commands: mpsc::UnboundedReceiver<Command>,
    views: watch::Sender<SessionView>,
}

impl Session {
    /// Build a session and kick off the startup render
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        config: SessionConfig,
        host: Arc<dyn AudioHost>,
        input: Arc<dyn InputSource>,
    ) -> (Self, SessionHandle) {
        let machine = TimerMachine::new(config.tick_period);
        let loader = AssetLoader::spawn(host.as_ref(), config.tone);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(SessionView::from_machine(&machine));

        let session = Self {
            machine,
            host,
            input,
            monitor: DisturbanceMonitor::new(),
            loader,
            audio_resolved: false,
            commands: command_rx,
            views: view_tx,
        };
        let handle = SessionHandle {
            commands: command_tx,
            views: view_rx,
        };
        (session, handle)
    }

    pub fn machine(&self) -> &TimerMachine {
        &self.machine
    }

    /// Process events until shutdown or until every handle is dropped
    pub async fn run(mut self) {
        log::debug!("[SESSION] Running");
        loop {
            let audio_pending = !self.audio_resolved;
            tokio::select! {
                biased;

                _ = self.machine.next_tick() => {
                    if let Err(err) = self.machine.tick() {
                        log::debug!("[SESSION] Stray tick: {}", err);
                    }
                }
                event = self.monitor.next_disturbance() => {
                    log::debug!("[SESSION] Disturbance: {:?}", event);
                    self.machine.report_disturbance();
                }
                state = self.loader.resolved_state(), if audio_pending => {
                    self.audio_resolved = true;
                    self.machine.attach_audio(self.host.as_ref(), state);
                }
                command = self.commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.apply(command),
                },
            }

            self.sync_listeners();
            self.publish();
        }

        self.monitor.disarm();
        log::debug!("[SESSION] Stopped");
    }

    fn apply(&mut self, command: Command) {
        let result = match command {
            Command::Start => self.machine.start(),
            Command::Reset => self.machine.reset(),
            Command::ToggleMute => {
                self.machine.toggle_mute();
                Ok(())
            }
            Command::PlaybackError(reason) => {
                self.machine.on_playback_error(reason);
                Ok(())
            }
            Command::Shutdown => Ok(()),
        };
        if let Err(err) = result {
            log::debug!("[SESSION] Ignored: {}", err);
        }
    }

    // Input listeners live exactly as long as the attempt runs.
    fn sync_listeners(&mut self) {
        if self.machine.attempt().is_running() {
            self.monitor.arm(self.input.as_ref());
        } else {
            self.monitor.disarm();
        }
    }

    fn publish(&self) {
        let view = SessionView::from_machine(&self.machine);
        self.views.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });
    }
}
