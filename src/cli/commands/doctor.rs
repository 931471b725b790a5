//! Doctor command - verify configuration and key pool health.

use crate::cli::Output;
use crate::config::Settings;
use crate::keypool::KeyPool;
use console::style;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Fortell Doctor");
    println!();
    println!("Checking configuration and credentials...\n");

    let mut checks = Vec::new();

    // Check LLM API key
    println!("{}", style("API Configuration").bold());
    let api_check = check_llm_api_key();
    api_check.print();
    checks.push(api_check);

    println!();

    // Check TTS key pool
    println!("{}", style("TTS Key Pool").bold());
    let pool_check = check_key_pool(settings);
    pool_check.print();
    checks.push(pool_check);

    println!();

    // Check directories
    println!("{}", style("Directories").bold());
    let dir_check = check_output_dir(settings);
    dir_check.print();
    checks.push(dir_check);

    println!();

    // Check configuration
    println!("{}", style("Configuration").bold());
    let config_check = check_config_file();
    config_check.print();
    checks.push(config_check);

    println!();

    // Summary
    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Fortell.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!(
            "All checks passed with {} warning(s).",
            warnings
        ));
    } else {
        Output::success("All checks passed! Fortell is ready to use.");
    }

    Ok(())
}

/// Check if the chat-completion API key is configured.
fn check_llm_api_key() -> CheckResult {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if key.starts_with("sk-") && key.len() > 20 => {
            let masked = format!("{}...{}", &key[..7], &key[key.len() - 4..]);
            CheckResult::ok("OPENAI_API_KEY", &format!("configured ({})", masked))
        }
        Ok(key) if key.is_empty() => CheckResult::error(
            "OPENAI_API_KEY",
            "empty",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
        Ok(_) => CheckResult::warning(
            "OPENAI_API_KEY",
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        Err(_) => CheckResult::error(
            "OPENAI_API_KEY",
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
    }
}

/// Check the TTS key file.
fn check_key_pool(settings: &Settings) -> CheckResult {
    let path = settings.key_file();
    if !path.exists() {
        return CheckResult::error(
            "Key file",
            &format!("{} not found", path.display()),
            &format!(
                "Add one key per line as label:key (keys start with '{}')",
                settings.keys.key_prefix
            ),
        );
    }

    match KeyPool::load(&path, &settings.keys.key_prefix) {
        Ok(pool) => CheckResult::ok(
            "Key file",
            &format!("{} ({} keys)", path.display(), pool.len()),
        ),
        Err(e) => CheckResult::error(
            "Key file",
            &format!("{}", e),
            "Check the file format: one label:key entry per line",
        ),
    }
}

/// Check the output directory.
fn check_output_dir(settings: &Settings) -> CheckResult {
    let output_dir = settings.output_dir();
    if output_dir.exists() {
        CheckResult::ok("Output directory", &format!("{}", output_dir.display()))
    } else {
        CheckResult::warning(
            "Output directory",
            &format!("{} (will be created)", output_dir.display()),
            "Directory will be created on first use",
        )
    }
}

/// Check if config file exists.
fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: fortell init (or fortell config edit)",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_result_ok() {
        let result = CheckResult::ok("test", "passed");
        assert_eq!(result.status, CheckStatus::Ok);
        assert!(result.hint.is_none());
    }

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_check_missing_key_pool() {
        let mut settings = Settings::default();
        settings.keys.key_file = "/nonexistent/fortell-keys".to_string();

        let result = check_key_pool(&settings);
        assert_eq!(result.status, CheckStatus::Error);
    }
}
