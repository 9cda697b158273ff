//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::io::Write;
use std::sync::Arc;

use log::{info, warn};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::audio::{inspect_wav, LoopbackHost, NativeRenderer, ToneSynthesizer, WavSummary};
use crate::config::SessionConfig;
use crate::error::Result;
use crate::session::Session;
use crate::timer::{AttemptStatus, InputBus, InputEvent};
use crate::view::{AudioControls, SessionView};

/// What `inspect` reports about the rendered asset
#[derive(Debug, Serialize)]
pub struct InspectReport {
    #[serde(flatten)]
    pub wav: WavSummary,
    pub mime_type: &'static str,
    pub encoded_bytes: usize,
    pub peak_db: f32,
    pub sha256: String,
}

/// Render the chord synchronously and describe the result.
pub fn build_report(sample_rate: u32) -> Result<InspectReport> {
    let asset = ToneSynthesizer::default().synthesize(&NativeRenderer, sample_rate)?;
    let wav = inspect_wav(asset.encoded_bytes())?;
    Ok(InspectReport {
        wav,
        mime_type: asset.mime_type(),
        encoded_bytes: asset.encoded_bytes().len(),
        peak_db: asset.buffer().peak_db(),
        sha256: asset.checksum(),
    })
}

/// Print the asset report.
pub fn inspect(sample_rate: u32, json: bool) -> Result<()> {
    info!("Rendering chord at {} Hz", sample_rate);

    let report = build_report(sample_rate)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Format:      {}", report.mime_type);
    println!("Channels:    {}", report.wav.channels);
    println!("Sample rate: {} Hz", report.wav.sample_rate);
    println!("Bit depth:   {}", report.wav.bits_per_sample);
    println!(
        "Duration:    {:.2}s ({} frames)",
        report.wav.duration_secs(),
        report.wav.frames
    );
    println!("Peak:        {:.1} dBFS", report.peak_db);
    println!("Size:        {} bytes", report.encoded_bytes);
    println!("SHA-256:     {}", report.sha256);
    Ok(())
}

/// Run an interactive session on stdin/stdout.
///
/// While the countdown runs, any line typed counts as a key press.
pub async fn run(sample_rate: u32) -> Result<()> {
    let host = Arc::new(LoopbackHost::new(sample_rate));
    let bus = Arc::new(InputBus::new());
    let (session, mut handle) = Session::new(SessionConfig::default(), host, bus.clone());
    let task = tokio::spawn(session.run());

    println!("Commands: start, reset, mute, quit");
    let mut screen = Screen::default();
    screen.draw(&handle.view());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            view = handle.changed() => match view {
                Some(view) => screen.draw(&view),
                None => break,
            },
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if bus.publish(InputEvent::KeyPressed) > 0 {
                    continue;
                }
                match line.trim() {
                    "start" | "s" | "" => {
                        handle.start();
                    }
                    "reset" | "r" => {
                        handle.reset();
                    }
                    "mute" | "m" => {
                        handle.toggle_mute();
                    }
                    "quit" | "q" => break,
                    other => println!("Unknown command: {}", other),
                }
            }
        }
    }

    handle.shutdown();
    if let Err(err) = task.await {
        warn!("Session task ended abnormally: {}", err);
    }
    println!();
    Ok(())
}

/// Terminal renderer: redraws the clock in place, prints notices once
#[derive(Debug, Default)]
struct Screen {
    status: Option<AttemptStatus>,
    audio: Option<AudioControls>,
}

impl Screen {
    fn draw(&mut self, view: &SessionView) {
        if self.status != Some(view.status) {
            if self.status.is_none() {
                println!("{}", view.title);
            } else {
                println!();
            }
            if let Some(notice) = view.notice {
                println!("{}", notice.text());
            }
            if view.show_start {
                println!("Type 'start' to begin.");
            }
            if view.show_reset {
                println!("Type 'reset' to try again.");
            }
            self.status = Some(view.status);
        }

        if self.audio != Some(view.audio) {
            match view.audio {
                AudioControls::Hidden => {}
                AudioControls::Toggle { muted } => {
                    println!("\nSound: {} (type 'mute' to toggle)", if muted { "off" } else { "on" })
                }
                AudioControls::Unavailable => {
                    if let Some(text) = view.audio_notice() {
                        println!("\n{}", text);
                    }
                }
            }
            self.audio = Some(view.audio);
        }

        print!("\r{}", view.clock);
        let _ = std::io::stdout().flush();
    }
}
