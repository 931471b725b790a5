//! Generate command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::{format_count, Output};
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the generate command.
pub async fn run_generate(
    book: &str,
    language: Option<String>,
    model: Option<String>,
    narrate: bool,
    settings: Settings,
) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Generate, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'fortell doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    // Fail before the LLM call if narration was requested but can't run.
    if narrate {
        if let Err(e) = preflight::check(Operation::Narrate, &settings) {
            Output::error(&format!("{}", e));
            Output::info("Run 'fortell doctor' for detailed diagnostics.");
            return Err(e.into());
        }
    }

    let language = language.unwrap_or_else(|| settings.script.language.clone());
    let orchestrator = Orchestrator::new(settings)?;

    Output::info(&format!("Generating video script for '{}'", book));

    let spinner = Output::spinner("Calling the chat-completion API...");
    let result = orchestrator.generate(book, &language, model.as_deref()).await;
    spinner.finish_and_clear();

    let result = match result {
        Ok(result) => result,
        Err(e) => {
            Output::error(&format!("Script generation failed: {}", e));
            return Err(e.into());
        }
    };

    Output::success(&format!(
        "Generated '{}' ({} sections, {} voice-over characters)",
        result.document.title,
        result.document.sections.len(),
        format_count(result.document.voice_over_chars())
    ));

    Output::header("Generated files");
    Output::list_item(&format!(
        "Full script (JSON): {}",
        result.paths.full_script_path().display()
    ));
    Output::list_item(&format!(
        "Voice-over sections: {}",
        result.paths.sections_dir.display()
    ));
    Output::list_item(&format!(
        "Main voice-over script: {}",
        result.paths.voice_over_dir.join("voice_over_script.txt").display()
    ));
    Output::list_item(&format!(
        "Production script: {}",
        result.paths.script_dir.join("production_script.txt").display()
    ));

    if narrate {
        println!();
        super::run_narrate(book, None, orchestrator.settings().clone()).await?;
    }

    Ok(())
}
