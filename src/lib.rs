//! Fortell - Book Summary Video Scripts
//!
//! A CLI tool for generating YouTube book-summary video scripts and narrating
//! them with text-to-speech.
//!
//! The name "Fortell" comes from the Norwegian word for "tell" (as in telling
//! a story).
//!
//! # Overview
//!
//! Fortell allows you to:
//! - Generate a complete video script for any book via a chat-completion API
//! - Save the script as production-ready text and JSON files
//! - Narrate the voice-over sections with the ElevenLabs TTS API
//! - Rotate through a pool of TTS API keys as quotas run out
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `script` - Script data model and LLM-based generation
//! - `project` - Output directory layout and file writers
//! - `chunking` - Sentence-boundary text chunking for TTS limits
//! - `keypool` - API key pool with rotation state
//! - `synthesis` - TTS provider client and credit-aware dispatch
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use fortell::config::Settings;
//! use fortell::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     // Generate a script for a book
//!     let result = orchestrator.generate("Atomic Habits", "English", None).await?;
//!     println!("Wrote {} sections", result.document.sections.len());
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod error;
pub mod keypool;
pub mod openai;
pub mod orchestrator;
pub mod project;
pub mod script;
pub mod synthesis;

pub use error::{FortellError, Result};
