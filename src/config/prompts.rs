//! Prompt templates for Fortell.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub script: ScriptPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}


/// Prompts for video script generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptPrompts {
    pub system: String,
    pub user: String,
}

impl Default for ScriptPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a professional YouTube scriptwriter specializing in {{language}} book summaries and analysis. Create a comprehensive, engaging script that covers the book's key ideas in a single video. Include clear voice-over instructions and visual suggestions."#.to_string(),

            user: r#"Create a detailed single video script for the book '{{book}}'.
Format your response STRICTLY as a JSON object with the following structure:
{
    "title": "Video Title",
    "duration": "20-30 minutes",
    "target_audience": "string",
    "sections": [
        {
            "title": "Section Title",
            "duration": "string",
            "voice_over": "Detailed voice-over script",
            "visual_notes": "Description of visuals/animations",
            "background_music": "Music mood suggestion"
        }
    ],
    "key_points": ["string"],
    "visual_style": "Overall visual style description",
    "thumbnail_text": "string"
}"#
            .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        // Store custom variables
        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            // Load script prompts if file exists
            let script_path = custom_path.join("script.toml");
            if script_path.exists() {
                let content = std::fs::read_to_string(&script_path)?;
                prompts.script = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        // Start with custom variables, then override with provided vars
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(!prompts.script.system.is_empty());
        assert!(prompts.script.user.contains("{{book}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Script for {{book}} in {{language}}.";
        let mut vars = std::collections::HashMap::new();
        vars.insert("book".to_string(), "Dune".to_string());
        vars.insert("language".to_string(), "English".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Script for Dune in English.");
    }

    #[test]
    fn test_render_with_custom_precedence() {
        let mut prompts = Prompts::default();
        prompts
            .variables
            .insert("language".to_string(), "Spanish".to_string());

        let mut vars = std::collections::HashMap::new();
        vars.insert("language".to_string(), "English".to_string());

        let result = prompts.render_with_custom("{{language}}", &vars);
        assert_eq!(result, "English");
    }
}
