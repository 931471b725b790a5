//! Init command - interactive first-run setup.

use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::io::{self, Write};

/// Run the init command for first-time setup.
pub fn run_init(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Fortell Setup");
    println!();
    println!("Welcome to Fortell! Let's make sure everything is configured correctly.\n");

    // Step 1: Check LLM API key
    println!("{}", style("Step 1: Checking API configuration").bold().cyan());
    println!();

    if std::env::var("OPENAI_API_KEY").is_err() {
        Output::warning("OPENAI_API_KEY environment variable is not set.");
        println!();
        println!("  Fortell requires an OpenAI-compatible API key for script generation.");
        println!("  Get your API key from: {}", style("https://platform.openai.com/api-keys").underlined());
        println!();
        println!("  Set it in your shell configuration (~/.bashrc, ~/.zshrc, etc.):");
        println!("  {}", style("export OPENAI_API_KEY='sk-...'").green());
        println!();

        if !prompt_continue("Continue without API key?")? {
            println!();
            Output::info("Setup cancelled. Set your API key and run 'fortell init' again.");
            return Ok(());
        }
    } else {
        Output::success("Chat-completion API key is configured!");
    }

    println!();

    // Step 2: Check TTS key file
    println!("{}", style("Step 2: Checking TTS key pool").bold().cyan());
    println!();

    let key_file = settings.key_file();
    if key_file.exists() {
        Output::success(&format!("Key file exists: {}", key_file.display()));
    } else {
        Output::warning(&format!("Key file not found: {}", key_file.display()));
        println!();
        println!("  Narration rotates through a pool of ElevenLabs API keys.");
        println!("  Create the file with one entry per line:");
        println!("  {}", style("account@example.com:sk_...").green());
        println!();

        if !prompt_continue("Continue without a key file?")? {
            println!();
            Output::info("Setup cancelled. Create the key file and run 'fortell init' again.");
            return Ok(());
        }
    }

    println!();

    // Step 3: Create output directory
    println!("{}", style("Step 3: Setting up directories").bold().cyan());
    println!();

    let output_dir = settings.output_dir();
    if !output_dir.exists() {
        std::fs::create_dir_all(&output_dir)?;
        Output::success(&format!("Created output directory: {}", output_dir.display()));
    } else {
        Output::info(&format!("Output directory exists: {}", output_dir.display()));
    }

    println!();

    // Step 4: Create config file
    println!("{}", style("Step 4: Configuration file").bold().cyan());
    println!();

    let config_path = Settings::default_config_path();
    if config_path.exists() {
        Output::info(&format!("Config file exists: {}", config_path.display()));
    } else if prompt_continue("Create default configuration file?")? {
        // Create parent directory if needed
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        settings.save_to(&config_path)?;
        Output::success(&format!("Created config file: {}", config_path.display()));
        println!();
        println!("  Edit your config with: {}", style("fortell config edit").green());
    } else {
        Output::info("Skipped config file creation. Using defaults.");
    }

    println!();

    // Summary
    println!("{}", style("Setup Complete!").bold().green());
    println!();
    println!("Next steps:");
    println!("  {} Check configuration status", style("fortell doctor").cyan());
    println!("  {} Test your TTS keys", style("fortell keys").cyan());
    println!("  {} Generate your first script", style("fortell generate \"<book>\"").cyan());
    println!();
    println!("For more help: {}", style("fortell --help").cyan());

    Ok(())
}

/// Prompt user for yes/no confirmation.
fn prompt_continue(message: &str) -> io::Result<bool> {
    print!("{} {} ", style("?").cyan(), message);
    print!("{} ", style("[y/N]").dim());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(input.trim().to_lowercase() == "y" || input.trim().to_lowercase() == "yes")
}
