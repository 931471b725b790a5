//! ElevenLabs TTS client.
//!
//! Thin reqwest wrapper over the two endpoints fortell needs: text-to-speech
//! conversion and the subscription probe used for credit planning.

use super::{SynthesisError, Synthesizer};
use crate::config::SynthesisSettings;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Production API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.elevenlabs.io";

/// Timeout for synthesis requests. Generation of a long chunk can take a
/// while, so this is generous.
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Subscription state for one API key.
#[derive(Debug, Clone, Deserialize)]
pub struct Subscription {
    #[serde(default)]
    pub tier: String,
    /// Characters already consumed this billing period.
    pub character_count: u64,
    /// Character allowance for the billing period.
    pub character_limit: u64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub next_character_count_reset_unix: Option<i64>,
}

impl Subscription {
    /// Characters still available this billing period.
    pub fn remaining(&self) -> u64 {
        self.character_limit.saturating_sub(self.character_count)
    }
}

/// Error payload returned by the API on failures.
#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    detail: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: String,
}

/// ElevenLabs implementation of [`Synthesizer`].
pub struct ElevenLabsSynthesizer {
    client: reqwest::Client,
    base_url: String,
    voice_id: String,
    model_id: String,
    output_format: String,
}

impl ElevenLabsSynthesizer {
    /// Build a client from synthesis settings.
    pub fn new(settings: &SynthesisSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: DEFAULT_API_BASE.to_string(),
            voice_id: settings.voice_id.clone(),
            model_id: settings.model_id.clone(),
            output_format: settings.output_format.clone(),
        }
    }

    /// Override the API base URL.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Fetch the subscription state for an API key.
    pub async fn subscription(&self, api_key: &str) -> Result<Subscription, SynthesisError> {
        let url = format!("{}/v1/user/subscription", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("xi-api-key", api_key)
            .send()
            .await
            .map_err(|e| SynthesisError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body));
        }

        response
            .json::<Subscription>()
            .await
            .map_err(|e| SynthesisError::Request(format!("invalid subscription payload: {}", e)))
    }
}

#[async_trait]
impl Synthesizer for ElevenLabsSynthesizer {
    async fn synthesize(
        &self,
        api_key: &str,
        text: &str,
    ) -> std::result::Result<Vec<u8>, SynthesisError> {
        let url = format!(
            "{}/v1/text-to-speech/{}?output_format={}",
            self.base_url, self.voice_id, self.output_format
        );

        let body = serde_json::json!({
            "text": text,
            "model_id": self.model_id,
        });

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SynthesisError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| SynthesisError::Request(e.to_string()))?;

        debug!("Synthesized {} chars into {} bytes", text.len(), audio.len());
        Ok(audio.to_vec())
    }

    async fn remaining_quota(&self, api_key: &str) -> std::result::Result<u64, SynthesisError> {
        Ok(self.subscription(api_key).await?.remaining())
    }
}

/// Map an HTTP failure onto a [`SynthesisError`] category.
///
/// 401 means the key was rejected outright; 402/429 or a `quota_exceeded`
/// detail status mean the key ran out of characters. Everything else is a
/// plain request failure that the dispatcher will not rotate on.
fn classify_failure(status: reqwest::StatusCode, body: &str) -> SynthesisError {
    let detail = serde_json::from_str::<ApiError>(body)
        .ok()
        .and_then(|e| e.detail);

    let message = match &detail {
        Some(d) if !d.message.is_empty() => format!("{} ({})", d.message, status),
        _ => format!("HTTP {}: {}", status, truncate(body, 200)),
    };

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return SynthesisError::Unauthorized(message);
    }

    let quota_status = detail
        .as_ref()
        .map(|d| d.status == "quota_exceeded")
        .unwrap_or(false);

    if quota_status
        || status == reqwest::StatusCode::PAYMENT_REQUIRED
        || status == reqwest::StatusCode::TOO_MANY_REQUESTS
    {
        return SynthesisError::QuotaExceeded(message);
    }

    SynthesisError::Request(message)
}

fn truncate(s: &str, max_len: usize) -> &str {
    match s.char_indices().nth(max_len) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_remaining() {
        let sub = Subscription {
            tier: "free".to_string(),
            character_count: 800,
            character_limit: 10000,
            status: "active".to_string(),
            next_character_count_reset_unix: None,
        };
        assert_eq!(sub.remaining(), 9200);
    }

    #[test]
    fn test_subscription_remaining_saturates() {
        let sub = Subscription {
            tier: String::new(),
            character_count: 12000,
            character_limit: 10000,
            status: String::new(),
            next_character_count_reset_unix: None,
        };
        assert_eq!(sub.remaining(), 0);
    }

    #[test]
    fn test_classify_unauthorized() {
        let err = classify_failure(reqwest::StatusCode::UNAUTHORIZED, "");
        assert!(matches!(err, SynthesisError::Unauthorized(_)));
    }

    #[test]
    fn test_classify_quota_by_status_code() {
        let err = classify_failure(reqwest::StatusCode::TOO_MANY_REQUESTS, "");
        assert!(matches!(err, SynthesisError::QuotaExceeded(_)));
    }

    #[test]
    fn test_classify_quota_by_detail() {
        let body = r#"{"detail": {"status": "quota_exceeded", "message": "Out of characters"}}"#;
        let err = classify_failure(reqwest::StatusCode::BAD_REQUEST, body);
        assert!(matches!(err, SynthesisError::QuotaExceeded(_)));
        assert!(err.to_string().contains("Out of characters"));
    }

    #[test]
    fn test_classify_other_failure() {
        let err = classify_failure(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert!(matches!(err, SynthesisError::Request(_)));
    }
}
