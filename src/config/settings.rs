//! Configuration settings for Fortell.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub script: ScriptSettings,
    pub synthesis: SynthesisSettings,
    pub keys: KeySettings,
    pub prompts: PromptSettings,
}


/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for generated project content.
    pub output_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            output_dir: "~/fortell/content".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Script generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptSettings {
    /// Chat-completion model used for script generation.
    pub model: String,
    /// Default language for generated scripts.
    pub language: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens in the completion.
    pub max_tokens: u32,
    /// Nucleus sampling parameter.
    pub top_p: f32,
    /// Number of attempts before giving up on the API.
    pub max_retries: u32,
}

impl Default for ScriptSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            language: "English".to_string(),
            temperature: 0.7,
            max_tokens: 4000,
            top_p: 0.9,
            max_retries: 3,
        }
    }
}

/// Text-to-speech synthesis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisSettings {
    /// ElevenLabs voice ID used for narration.
    pub voice_id: String,
    /// ElevenLabs model ID.
    pub model_id: String,
    /// Audio output format requested from the API.
    pub output_format: String,
    /// Maximum characters per synthesis request.
    pub max_chunk_chars: usize,
    /// Seconds to wait between successful synthesis calls.
    pub pause_seconds: u64,
    /// Seconds to wait after every key in the pool has failed one pass.
    pub cooldown_seconds: u64,
    /// Full passes over the pool before giving up on a chunk.
    pub max_passes: u32,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            voice_id: "JBFqnCBsd6RMkjVDRZzb".to_string(),
            model_id: "eleven_multilingual_v2".to_string(),
            output_format: "mp3_44100_128".to_string(),
            max_chunk_chars: 2500,
            pause_seconds: 1,
            cooldown_seconds: 60,
            max_passes: 3,
        }
    }
}

/// API key pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeySettings {
    /// File with one `label:key` entry per line.
    pub key_file: String,
    /// Keys must start with this prefix to be accepted.
    pub key_prefix: String,
}

impl Default for KeySettings {
    fn default() -> Self {
        Self {
            key_file: "~/.fortell/elevenlabs_keys".to_string(),
            key_prefix: "sk_".to_string(),
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}


impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::FortellError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fortell")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded output directory path.
    pub fn output_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.output_dir)
    }

    /// Get the expanded key file path.
    pub fn key_file(&self) -> PathBuf {
        Self::expand_path(&self.keys.key_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.script.max_retries, 3);
        assert_eq!(settings.keys.key_prefix, "sk_");
        assert!(settings.synthesis.max_chunk_chars > 0);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [script]
            model = "gpt-4.1"
            "#,
        )
        .unwrap();

        assert_eq!(settings.script.model, "gpt-4.1");
        assert_eq!(settings.script.language, "English");
        assert_eq!(settings.synthesis.model_id, "eleven_multilingual_v2");
    }

    #[test]
    fn test_expand_path_plain() {
        let path = Settings::expand_path("/tmp/fortell");
        assert_eq!(path, PathBuf::from("/tmp/fortell"));
    }
}
