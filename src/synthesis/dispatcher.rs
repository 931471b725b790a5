//! Credit-aware synthesis dispatch with key rotation.
//!
//! The dispatcher owns the key pool. Quota and auth failures advance the
//! rotation cursor; once a full pass over the pool has failed it sleeps for
//! a cooldown, resets the tried-set and goes again, up to a bounded number
//! of passes. Before a batch starts, every key's remaining quota is probed
//! and the batch is aborted if no key can cover the estimate.

use super::{SynthesisError, Synthesizer};
use crate::config::SynthesisSettings;
use crate::error::{FortellError, Result};
use crate::keypool::KeyPool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Tuning knobs for the dispatch loop.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Sleep after every key in the pool has failed one pass.
    pub cooldown: Duration,
    /// Full passes over the pool before a chunk is abandoned.
    pub max_passes: u32,
    /// Sleep between successful synthesis calls.
    pub pause_between_chunks: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(60),
            max_passes: 3,
            pause_between_chunks: Duration::from_secs(1),
        }
    }
}

impl DispatchConfig {
    pub fn from_settings(settings: &SynthesisSettings) -> Self {
        Self {
            cooldown: Duration::from_secs(settings.cooldown_seconds),
            max_passes: settings.max_passes,
            pause_between_chunks: Duration::from_secs(settings.pause_seconds),
        }
    }
}

/// A unit of pending synthesis work.
#[derive(Debug, Clone)]
pub struct PendingChunk {
    /// Output file stem, used for logging and file naming.
    pub name: String,
    /// Text to synthesize.
    pub text: String,
}

impl PendingChunk {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Characters this chunk will consume against a key's quota.
    pub fn char_count(&self) -> u64 {
        self.text.chars().count() as u64
    }
}

/// Remaining quota for one key, as reported by the probe.
#[derive(Debug, Clone)]
pub struct KeyQuota {
    pub label: String,
    pub remaining: u64,
}

/// Result of probing the pool before a batch.
#[derive(Debug, Clone)]
pub struct BatchPlan {
    /// Total characters the batch will consume.
    pub estimated_chars: u64,
    /// Per-key remaining quota in rotation order.
    pub quotas: Vec<KeyQuota>,
}

impl BatchPlan {
    /// Sum of remaining quota across the pool.
    pub fn total_remaining(&self) -> u64 {
        self.quotas.iter().map(|q| q.remaining).sum()
    }
}

/// Dispatches synthesis calls across a rotating key pool.
pub struct SynthesisDispatcher {
    synthesizer: Arc<dyn Synthesizer>,
    pool: KeyPool,
    config: DispatchConfig,
}

impl SynthesisDispatcher {
    pub fn new(synthesizer: Arc<dyn Synthesizer>, pool: KeyPool, config: DispatchConfig) -> Self {
        Self {
            synthesizer,
            pool,
            config,
        }
    }

    /// The underlying key pool.
    pub fn pool(&self) -> &KeyPool {
        &self.pool
    }

    /// Sleep between successful chunk calls.
    pub fn pause_between_chunks(&self) -> Duration {
        self.config.pause_between_chunks
    }

    /// Estimate the batch cost and probe every key's remaining quota.
    ///
    /// Returns an error (before any synthesis call) if no single key's
    /// remaining quota covers the whole estimate. A key whose probe fails
    /// counts as zero quota.
    pub async fn plan_batch(&self, pending: &[PendingChunk]) -> Result<BatchPlan> {
        let estimated_chars: u64 = pending.iter().map(PendingChunk::char_count).sum();
        info!(
            "Planning batch: {} chunks, {} characters, {} keys",
            pending.len(),
            estimated_chars,
            self.pool.len()
        );

        let mut quotas = Vec::with_capacity(self.pool.len());
        for key in self.pool.keys() {
            let remaining = match self.synthesizer.remaining_quota(&key.key).await {
                Ok(remaining) => remaining,
                Err(e) => {
                    warn!("Quota probe failed for '{}' ({}): {}", key.label, key.masked(), e);
                    0
                }
            };
            quotas.push(KeyQuota {
                label: key.label.clone(),
                remaining,
            });
        }

        if estimated_chars > 0 && !quotas.iter().any(|q| q.remaining >= estimated_chars) {
            let best = quotas.iter().map(|q| q.remaining).max().unwrap_or(0);
            return Err(FortellError::KeyPool(format!(
                "batch needs {} characters but the best key has only {} remaining",
                estimated_chars, best
            )));
        }

        Ok(BatchPlan {
            estimated_chars,
            quotas,
        })
    }

    /// Synthesize one chunk, rotating keys on quota/auth failures.
    ///
    /// Non-rotatable errors propagate immediately. When every key has failed
    /// in the current pass the dispatcher sleeps for the cooldown and starts
    /// a fresh pass, up to `max_passes` passes.
    pub async fn synthesize_chunk(&mut self, text: &str) -> Result<Vec<u8>> {
        let mut passes = 0u32;

        loop {
            let key = self.pool.current().clone();

            match self.synthesizer.synthesize(&key.key, text).await {
                Ok(audio) => {
                    self.pool.reset_tried();
                    return Ok(audio);
                }
                Err(e) if e.is_rotatable() => {
                    warn!(
                        "Key '{}' ({}) failed: {}; rotating to next key",
                        key.label,
                        key.masked(),
                        e
                    );
                    self.pool.mark_current_tried();
                    self.pool.advance();

                    if self.pool.all_tried() {
                        passes += 1;
                        if passes >= self.config.max_passes {
                            return Err(FortellError::KeyPool(format!(
                                "every key in the pool failed after {} passes",
                                passes
                            )));
                        }
                        info!(
                            "All {} keys tried; cooling down for {}s",
                            self.pool.len(),
                            self.config.cooldown.as_secs()
                        );
                        tokio::time::sleep(self.config.cooldown).await;
                        self.pool.reset_tried();
                    }
                }
                Err(e) => return Err(FortellError::Synthesis(e.to_string())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypool::ApiKey;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    /// Scripted synthesizer that records every call.
    struct MockSynthesizer {
        failing_keys: HashSet<String>,
        failure: fn(String) -> SynthesisError,
        quotas: HashMap<String, u64>,
        synth_calls: Mutex<Vec<String>>,
        probe_calls: Mutex<Vec<String>>,
    }

    impl MockSynthesizer {
        fn new() -> Self {
            Self {
                failing_keys: HashSet::new(),
                failure: |msg| SynthesisError::QuotaExceeded(msg),
                quotas: HashMap::new(),
                synth_calls: Mutex::new(Vec::new()),
                probe_calls: Mutex::new(Vec::new()),
            }
        }

        fn failing(mut self, keys: &[&str]) -> Self {
            self.failing_keys = keys.iter().map(|k| k.to_string()).collect();
            self
        }

        fn failure_kind(mut self, failure: fn(String) -> SynthesisError) -> Self {
            self.failure = failure;
            self
        }

        fn quota(mut self, key: &str, remaining: u64) -> Self {
            self.quotas.insert(key.to_string(), remaining);
            self
        }

        fn synth_calls(&self) -> Vec<String> {
            self.synth_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Synthesizer for MockSynthesizer {
        async fn synthesize(
            &self,
            api_key: &str,
            _text: &str,
        ) -> std::result::Result<Vec<u8>, SynthesisError> {
            self.synth_calls.lock().unwrap().push(api_key.to_string());
            if self.failing_keys.contains(api_key) {
                return Err((self.failure)(format!("injected failure for {}", api_key)));
            }
            Ok(vec![0u8; 4])
        }

        async fn remaining_quota(
            &self,
            api_key: &str,
        ) -> std::result::Result<u64, SynthesisError> {
            self.probe_calls.lock().unwrap().push(api_key.to_string());
            match self.quotas.get(api_key) {
                Some(remaining) => Ok(*remaining),
                None => Err(SynthesisError::Request("no quota scripted".to_string())),
            }
        }
    }

    fn pool(n: usize) -> KeyPool {
        let keys = (1..=n)
            .map(|i| ApiKey::new(format!("key{}", i), format!("sk_{}", i)))
            .collect();
        KeyPool::new(keys).unwrap()
    }

    fn fast_config() -> DispatchConfig {
        DispatchConfig {
            cooldown: Duration::ZERO,
            max_passes: 3,
            pause_between_chunks: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_failure_rotates_to_next_key() {
        let mock = Arc::new(MockSynthesizer::new().failing(&["sk_1"]));
        let mut dispatcher = SynthesisDispatcher::new(mock.clone(), pool(3), fast_config());

        let audio = dispatcher.synthesize_chunk("hello").await.unwrap();
        assert!(!audio.is_empty());
        // Key 1 fails, key 2 (i+1 mod N) is tried next.
        assert_eq!(mock.synth_calls(), vec!["sk_1", "sk_2"]);
    }

    #[tokio::test]
    async fn test_rotation_wraps_around_pool() {
        let mock = Arc::new(MockSynthesizer::new().failing(&["sk_3"]));
        let mut pool = pool(3);
        pool.advance();
        pool.advance(); // cursor on key 3
        let mut dispatcher = SynthesisDispatcher::new(mock.clone(), pool, fast_config());

        dispatcher.synthesize_chunk("hello").await.unwrap();
        // Failure on the last key wraps to the first.
        assert_eq!(mock.synth_calls(), vec!["sk_3", "sk_1"]);
    }

    #[tokio::test]
    async fn test_unauthorized_also_rotates() {
        let mock = Arc::new(
            MockSynthesizer::new()
                .failing(&["sk_1"])
                .failure_kind(SynthesisError::Unauthorized),
        );
        let mut dispatcher = SynthesisDispatcher::new(mock.clone(), pool(2), fast_config());

        dispatcher.synthesize_chunk("hello").await.unwrap();
        assert_eq!(mock.synth_calls(), vec!["sk_1", "sk_2"]);
    }

    #[tokio::test]
    async fn test_request_error_propagates_immediately() {
        let mock = Arc::new(
            MockSynthesizer::new()
                .failing(&["sk_1"])
                .failure_kind(SynthesisError::Request),
        );
        let mut dispatcher = SynthesisDispatcher::new(mock.clone(), pool(3), fast_config());

        let result = dispatcher.synthesize_chunk("hello").await;
        assert!(matches!(result, Err(FortellError::Synthesis(_))));
        // No rotation happened.
        assert_eq!(mock.synth_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_pool_fails_after_bounded_passes() {
        let mock = Arc::new(MockSynthesizer::new().failing(&["sk_1", "sk_2"]));
        let config = DispatchConfig {
            max_passes: 2,
            ..fast_config()
        };
        let mut dispatcher = SynthesisDispatcher::new(mock.clone(), pool(2), config);

        let result = dispatcher.synthesize_chunk("hello").await;
        assert!(matches!(result, Err(FortellError::KeyPool(_))));
        // Two full passes over both keys.
        assert_eq!(mock.synth_calls().len(), 4);
    }

    #[tokio::test]
    async fn test_tried_set_resets_between_passes() {
        // First pass fails everywhere; scripted mock cannot change behavior
        // between passes, so assert the second pass retried the same keys in
        // rotation order instead.
        let mock = Arc::new(MockSynthesizer::new().failing(&["sk_1", "sk_2"]));
        let config = DispatchConfig {
            max_passes: 2,
            ..fast_config()
        };
        let mut dispatcher = SynthesisDispatcher::new(mock.clone(), pool(2), config);

        let _ = dispatcher.synthesize_chunk("hello").await;
        assert_eq!(mock.synth_calls(), vec!["sk_1", "sk_2", "sk_1", "sk_2"]);
    }

    #[tokio::test]
    async fn test_plan_batch_aborts_when_no_key_suffices() {
        let mock = Arc::new(
            MockSynthesizer::new()
                .quota("sk_1", 10)
                .quota("sk_2", 20),
        );
        let dispatcher = SynthesisDispatcher::new(mock.clone(), pool(2), fast_config());

        let pending = vec![PendingChunk::new("01_intro", "x".repeat(50))];
        let result = dispatcher.plan_batch(&pending).await;

        assert!(matches!(result, Err(FortellError::KeyPool(_))));
        // Aborted before any synthesis call.
        assert!(mock.synth_calls().is_empty());
    }

    #[tokio::test]
    async fn test_plan_batch_succeeds_when_one_key_covers() {
        let mock = Arc::new(
            MockSynthesizer::new()
                .quota("sk_1", 10)
                .quota("sk_2", 100),
        );
        let dispatcher = SynthesisDispatcher::new(mock, pool(2), fast_config());

        let pending = vec![
            PendingChunk::new("01_intro", "x".repeat(30)),
            PendingChunk::new("02_body", "y".repeat(20)),
        ];
        let plan = dispatcher.plan_batch(&pending).await.unwrap();

        assert_eq!(plan.estimated_chars, 50);
        assert_eq!(plan.quotas.len(), 2);
        assert_eq!(plan.total_remaining(), 110);
    }

    #[tokio::test]
    async fn test_plan_batch_counts_failed_probe_as_zero() {
        // sk_2 has no scripted quota, so its probe errors.
        let mock = Arc::new(MockSynthesizer::new().quota("sk_1", 100));
        let dispatcher = SynthesisDispatcher::new(mock, pool(2), fast_config());

        let pending = vec![PendingChunk::new("01_intro", "x".repeat(50))];
        let plan = dispatcher.plan_batch(&pending).await.unwrap();

        assert_eq!(plan.quotas[1].remaining, 0);
    }

    #[tokio::test]
    async fn test_empty_batch_plans_trivially() {
        let mock = Arc::new(MockSynthesizer::new());
        let dispatcher = SynthesisDispatcher::new(mock, pool(1), fast_config());

        let plan = dispatcher.plan_batch(&[]).await.unwrap();
        assert_eq!(plan.estimated_chars, 0);
    }
}
