//! Keys command - test the health of every key in the pool.

use crate::cli::{format_count, Output};
use crate::config::Settings;
use crate::keypool::KeyPool;
use crate::synthesis::{ElevenLabsSynthesizer, Synthesizer};
use anyhow::Result;
use console::style;
use std::time::Duration;

/// Pause between per-key probes to stay under provider rate limits.
const PROBE_PAUSE: Duration = Duration::from_secs(1);

/// Run the keys command.
pub async fn run_keys(test_audio: bool, settings: Settings) -> Result<()> {
    Output::header("Fortell Key Health");
    println!();

    let pool = match KeyPool::load(&settings.key_file(), &settings.keys.key_prefix) {
        Ok(pool) => pool,
        Err(e) => {
            Output::error(&format!("{}", e));
            return Err(e.into());
        }
    };

    Output::info(&format!(
        "Testing {} key(s) from {}",
        pool.len(),
        settings.key_file().display()
    ));
    if test_audio {
        Output::warning("Audio generation testing enabled; each test consumes a few characters.");
    }
    println!();

    let synthesizer = ElevenLabsSynthesizer::new(&settings.synthesis);

    let mut healthy = 0u32;
    let mut failed = 0u32;
    let mut total_remaining = 0u64;

    let pb = Output::progress_bar(pool.len() as u64, "probing keys");

    for (i, key) in pool.keys().iter().enumerate() {
        match synthesizer.subscription(&key.key).await {
            Ok(sub) => {
                healthy += 1;
                total_remaining += sub.remaining();
                pb.println(format!(
                    "  {} {} [{}] {} / {} characters remaining",
                    style("✓").green(),
                    style(&key.label).bold(),
                    sub.tier,
                    format_count(sub.remaining()),
                    format_count(sub.character_limit)
                ));

                if test_audio {
                    match synthesizer.synthesize(&key.key, "Test.").await {
                        Ok(_) => pb.println(format!(
                            "    {} audio generation working",
                            style("✓").green()
                        )),
                        Err(e) => pb.println(format!(
                            "    {} audio generation failed: {}",
                            style("✗").red(),
                            e
                        )),
                    }
                }
            }
            Err(e) => {
                failed += 1;
                pb.println(format!(
                    "  {} {} ({}): {}",
                    style("✗").red(),
                    style(&key.label).bold(),
                    key.masked(),
                    e
                ));
            }
        }

        pb.inc(1);
        if i + 1 < pool.len() {
            tokio::time::sleep(PROBE_PAUSE).await;
        }
    }

    pb.finish_and_clear();
    println!();

    Output::kv("Healthy keys", &healthy.to_string());
    Output::kv("Failed keys", &failed.to_string());
    Output::kv("Characters available", &format_count(total_remaining));

    if healthy == 0 {
        Output::error("No healthy keys in the pool.");
        std::process::exit(1);
    }

    Ok(())
}
