//! Pre-flight checks before expensive operations.
//!
//! Validates that required credentials are available before starting
//! operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{FortellError, Result};
use crate::keypool::KeyPool;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Script generation requires the chat-completion API key.
    Generate,
    /// Narration requires a usable TTS key pool.
    Narrate,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Generate => {
            check_llm_api_key()?;
        }
        Operation::Narrate => {
            check_key_pool(settings)?;
        }
    }
    Ok(())
}

/// Check if the chat-completion API key is configured.
fn check_llm_api_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(FortellError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(FortellError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}

/// Check that the key file exists and contains at least one usable key.
fn check_key_pool(settings: &Settings) -> Result<()> {
    let path = settings.key_file();
    if !path.exists() {
        return Err(FortellError::Config(format!(
            "key file {} not found. Add one '{}...' key per line as label:key",
            path.display(),
            settings.keys.key_prefix
        )));
    }
    KeyPool::load(&path, &settings.keys.key_prefix).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_narrate_check_missing_key_file() {
        let mut settings = Settings::default();
        settings.keys.key_file = "/nonexistent/fortell-keys".to_string();

        assert!(check(Operation::Narrate, &settings).is_err());
    }

    #[test]
    fn test_narrate_check_with_valid_key_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "alice:sk_abc123").unwrap();
        file.flush().unwrap();

        let mut settings = Settings::default();
        settings.keys.key_file = file.path().to_string_lossy().to_string();

        assert!(check(Operation::Narrate, &settings).is_ok());
    }

    #[test]
    fn test_narrate_check_key_file_without_valid_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "alice:wrong_prefix_key").unwrap();
        file.flush().unwrap();

        let mut settings = Settings::default();
        settings.keys.key_file = file.path().to_string_lossy().to_string();

        assert!(check(Operation::Narrate, &settings).is_err());
    }
}
