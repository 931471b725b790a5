//! Text-to-speech synthesis.
//!
//! The `Synthesizer` trait abstracts the TTS provider so the dispatcher can
//! be exercised without network access; `ElevenLabsSynthesizer` is the real
//! implementation.

mod dispatcher;
mod elevenlabs;

pub use dispatcher::{BatchPlan, DispatchConfig, KeyQuota, PendingChunk, SynthesisDispatcher};
pub use elevenlabs::{ElevenLabsSynthesizer, Subscription, DEFAULT_API_BASE};

use async_trait::async_trait;
use thiserror::Error;

/// Provider-level synthesis failures.
#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("API key rejected: {0}")]
    Unauthorized(String),

    #[error("character quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("request failed: {0}")]
    Request(String),
}

impl SynthesisError {
    /// Failures that should rotate to the next key rather than abort the run.
    pub fn is_rotatable(&self) -> bool {
        matches!(
            self,
            SynthesisError::Unauthorized(_) | SynthesisError::QuotaExceeded(_)
        )
    }
}

/// Trait for text-to-speech providers.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize `text` with the given API key, returning encoded audio.
    async fn synthesize(
        &self,
        api_key: &str,
        text: &str,
    ) -> std::result::Result<Vec<u8>, SynthesisError>;

    /// Characters the given API key can still synthesize this billing period.
    async fn remaining_quota(&self, api_key: &str) -> std::result::Result<u64, SynthesisError>;
}
