//! Video script data model and LLM response parsing.
//!
//! The chat-completion API is asked for a strict JSON object, but models
//! routinely wrap it in prose or emit stray escape sequences, so parsing
//! goes through a cleanup pass.

mod generator;

pub use generator::ScriptGenerator;

use crate::error::{FortellError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A complete video script as produced by the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptDocument {
    pub title: String,
    /// Target video duration, e.g. "20-30 minutes".
    pub duration: String,
    pub target_audience: String,
    pub sections: Vec<ScriptSection>,
    pub key_points: Vec<String>,
    pub visual_style: String,
    #[serde(default)]
    pub thumbnail_text: String,
}

/// One section of the video script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptSection {
    pub title: String,
    pub duration: String,
    /// The narration text sent to the TTS service.
    pub voice_over: String,
    #[serde(default)]
    pub visual_notes: String,
    #[serde(default)]
    pub background_music: String,
}

impl ScriptDocument {
    /// Parse a raw LLM response into a script document.
    ///
    /// Extracts the outermost JSON object, tries a strict parse first, and
    /// falls back to repairing stray escape sequences before giving up.
    pub fn from_llm_response(response: &str) -> Result<Self> {
        let json = extract_json_object(response);

        match serde_json::from_str(json) {
            Ok(document) => Ok(document),
            Err(first_err) => {
                let repaired = repair_stray_escapes(json);
                serde_json::from_str(&repaired).map_err(|_| {
                    FortellError::Script(format!(
                        "failed to parse script response: {}. Response was: {}",
                        first_err,
                        preview(response, 500)
                    ))
                })
            }
        }
    }

    /// Total narration characters across all sections.
    pub fn voice_over_chars(&self) -> u64 {
        self.sections
            .iter()
            .map(|s| s.voice_over.chars().count() as u64)
            .sum()
    }
}

/// Slice out the outermost `{...}` object, dropping surrounding prose.
fn extract_json_object(response: &str) -> &str {
    match (response.find('{'), response.rfind('}')) {
        (Some(start), Some(end)) if end > start => &response[start..=end],
        _ => response,
    }
}

/// Drop backslashes that do not start a valid JSON escape sequence.
fn repair_stray_escapes(json: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r#"\\([^"\\/bfnrtu])"#).expect("valid regex"));
    re.replace_all(json, "$1").into_owned()
}

/// Char-safe truncation for error messages.
fn preview(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "title": "The Art of War in 20 Minutes",
        "duration": "20-30 minutes",
        "target_audience": "Strategy enthusiasts",
        "sections": [
            {
                "title": "Opening Moves",
                "duration": "3 minutes",
                "voice_over": "The first move is what sets everything in motion.",
                "visual_notes": "Slow pan over an ancient map.",
                "background_music": "Tense strings"
            }
        ],
        "key_points": ["Know your terrain"],
        "visual_style": "Ink-wash animation",
        "thumbnail_text": "ANCIENT STRATEGY"
    }"#;

    #[test]
    fn test_parse_strict_json() {
        let doc = ScriptDocument::from_llm_response(MINIMAL).unwrap();
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].title, "Opening Moves");
    }

    #[test]
    fn test_parse_json_wrapped_in_prose() {
        let response = format!("Here is your script:\n```json\n{}\n```\nEnjoy!", MINIMAL);
        let doc = ScriptDocument::from_llm_response(&response).unwrap();
        assert_eq!(doc.title, "The Art of War in 20 Minutes");
    }

    #[test]
    fn test_parse_repairs_stray_escapes() {
        let response = r#"{
            "title": "It\'s a Wonderful Book",
            "duration": "20 minutes",
            "target_audience": "Everyone",
            "sections": [],
            "key_points": [],
            "visual_style": "plain",
            "thumbnail_text": ""
        }"#;

        let doc = ScriptDocument::from_llm_response(response).unwrap();
        assert_eq!(doc.title, "It's a Wonderful Book");
    }

    #[test]
    fn test_parse_keeps_valid_escapes() {
        let response = r#"{
            "title": "Line\nBreak \"Quoted\"",
            "duration": "1 minute",
            "target_audience": "Testers",
            "sections": [],
            "key_points": [],
            "visual_style": "plain",
            "thumbnail_text": ""
        }"#;

        let doc = ScriptDocument::from_llm_response(response).unwrap();
        assert_eq!(doc.title, "Line\nBreak \"Quoted\"");
    }

    #[test]
    fn test_parse_garbage_fails() {
        let result = ScriptDocument::from_llm_response("I cannot help with that.");
        assert!(matches!(result, Err(FortellError::Script(_))));
    }

    #[test]
    fn test_voice_over_chars() {
        let doc = ScriptDocument::from_llm_response(MINIMAL).unwrap();
        assert_eq!(
            doc.voice_over_chars(),
            "The first move is what sets everything in motion."
                .chars()
                .count() as u64
        );
    }
}
