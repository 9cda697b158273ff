//! CLI Module
//!
//! Command-line shell for the Stillness timer.

pub mod commands;

use clap::{Parser, Subcommand};

use crate::config::DEFAULT_SAMPLE_RATE;

/// Stillness - do nothing for two minutes
#[derive(Parser, Debug)]
#[command(name = "stillness")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the chord and describe the encoded WAV asset
    #[command(name = "inspect")]
    Inspect {
        /// Render sample rate in Hz
        #[arg(short, long, default_value_t = DEFAULT_SAMPLE_RATE)]
        sample_rate: u32,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start an interactive timer in this terminal
    #[command(name = "run")]
    Run {
        /// Playback sample rate in Hz
        #[arg(short, long, default_value_t = DEFAULT_SAMPLE_RATE)]
        sample_rate: u32,
    },
}
