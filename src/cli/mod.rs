//! CLI module for Fortell.

pub mod commands;
mod output;
pub mod preflight;

pub use output::{format_count, Output};

use clap::{Parser, Subcommand};

/// Fortell - Book Summary Video Scripts
///
/// A CLI tool for generating YouTube book-summary video scripts and narrating
/// them with text-to-speech. The name "Fortell" comes from the Norwegian word
/// for "tell."
#[derive(Parser, Debug)]
#[command(name = "fortell")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize Fortell and verify configuration
    Init,

    /// Check configuration and key pool health
    Doctor,

    /// Generate a video script for a book
    Generate {
        /// Name of the book to create a script for
        book: String,

        /// Language for the generated script (default from config)
        #[arg(short, long)]
        language: Option<String>,

        /// Chat-completion model to use
        #[arg(short, long)]
        model: Option<String>,

        /// Narrate the script right after generating it
        #[arg(long)]
        narrate: bool,
    },

    /// Narrate a previously generated script
    Narrate {
        /// Name of the book whose script should be narrated
        book: String,

        /// Voice ID to narrate with (default from config)
        #[arg(long)]
        voice: Option<String>,
    },

    /// Test the health of every key in the pool
    Keys {
        /// Also test audio generation with each key (consumes a few characters)
        #[arg(long)]
        audio: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "script.model")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
