//! API key pool with rotation state.
//!
//! Keys are loaded from a local file with one `label:key` entry per line.
//! File order determines rotation order; there is no uniqueness constraint.

use crate::error::{FortellError, Result};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

/// A single provider credential with its human-readable label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKey {
    /// Label from the key file (typically an account email).
    pub label: String,
    /// The credential itself.
    pub key: String,
}

impl ApiKey {
    pub fn new(label: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            key: key.into(),
        }
    }

    /// Masked form for logs: first 7 and last 4 characters.
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.key.chars().collect();
        if chars.len() <= 11 {
            return "***".to_string();
        }
        let head: String = chars[..7].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

/// Ordered pool of API keys with a rotation cursor and a tried-set.
///
/// The dispatcher advances the cursor on quota/auth failures; once every key
/// has been tried in one pass the tried-set is reset after a cooldown.
#[derive(Debug)]
pub struct KeyPool {
    keys: Vec<ApiKey>,
    cursor: usize,
    tried: HashSet<usize>,
}

impl KeyPool {
    /// Build a pool from already-parsed keys.
    pub fn new(keys: Vec<ApiKey>) -> Result<Self> {
        if keys.is_empty() {
            return Err(FortellError::KeyPool("no API keys available".to_string()));
        }
        Ok(Self {
            keys,
            cursor: 0,
            tried: HashSet::new(),
        })
    }

    /// Load a pool from a `label:key` file, keeping only keys with the prefix.
    pub fn load(path: &Path, prefix: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FortellError::KeyPool(format!("cannot read key file {}: {}", path.display(), e))
        })?;

        let keys = Self::parse(&content, prefix);
        debug!("Loaded {} keys from {}", keys.len(), path.display());

        if keys.is_empty() {
            return Err(FortellError::KeyPool(format!(
                "no valid keys in {} (expected lines of label:key with '{}' prefix)",
                path.display(),
                prefix
            )));
        }

        Self::new(keys)
    }

    /// Parse `label:key` lines, skipping malformed lines and foreign prefixes.
    pub fn parse(content: &str, prefix: &str) -> Vec<ApiKey> {
        let mut keys = Vec::new();
        for line in content.lines() {
            let Some((label, key)) = line.split_once(':') else {
                continue;
            };
            let label = label.trim();
            let key = key.trim();
            if !key.starts_with(prefix) {
                if !key.is_empty() {
                    warn!("Skipping key for '{}': missing '{}' prefix", label, prefix);
                }
                continue;
            }
            keys.push(ApiKey::new(label, key));
        }
        keys
    }

    /// Number of keys in the pool.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// All keys in rotation order.
    pub fn keys(&self) -> &[ApiKey] {
        &self.keys
    }

    /// The key the cursor currently points at.
    pub fn current(&self) -> &ApiKey {
        &self.keys[self.cursor]
    }

    /// Index of the current key.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Advance the cursor to the next key, wrapping at the end of the pool.
    pub fn advance(&mut self) {
        self.cursor = (self.cursor + 1) % self.keys.len();
    }

    /// Record that the current key failed this pass.
    pub fn mark_current_tried(&mut self) {
        self.tried.insert(self.cursor);
    }

    /// True once every key has been tried in the current pass.
    pub fn all_tried(&self) -> bool {
        self.tried.len() == self.keys.len()
    }

    /// Forget which keys have been tried, starting a fresh pass.
    pub fn reset_tried(&mut self) {
        self.tried.clear();
    }
}
