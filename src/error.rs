//! Error types for Fortell.

use thiserror::Error;

/// Library-level error type for Fortell operations.
#[derive(Error, Debug)]
pub enum FortellError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Script generation failed: {0}")]
    Script(String),

    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("Key pool error: {0}")]
    KeyPool(String),

    #[error("Chat completion API error: {0}")]
    Llm(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Script not found: {0}. Run 'fortell generate' first.")]
    ScriptNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Fortell operations.
pub type Result<T> = std::result::Result<T, FortellError>;
