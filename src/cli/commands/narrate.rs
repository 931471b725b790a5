//! Narrate command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::{format_count, Output};
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the narrate command.
pub async fn run_narrate(book: &str, voice: Option<String>, settings: Settings) -> Result<()> {
    // Pre-flight checks
    if let Err(e) = preflight::check(Operation::Narrate, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'fortell doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;

    Output::info(&format!("Narrating script for '{}'", book));

    let spinner = Output::spinner("Planning batch and synthesizing audio...");
    let result = orchestrator.narrate(book, voice.as_deref()).await;
    spinner.finish_and_clear();

    match result {
        Ok(result) => {
            if result.files.is_empty() {
                Output::warning("Script has no voice-over text to narrate.");
                return Ok(());
            }

            Output::success(&format!(
                "Narrated {} audio file(s) ({} characters)",
                result.files.len(),
                format_count(result.estimated_chars)
            ));
            for file in &result.files {
                Output::list_item(&format!("{}", file.display()));
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Narration failed: {}", e));
            Err(e.into())
        }
    }
}
