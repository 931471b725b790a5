//! Pipeline orchestrator for Fortell.
//!
//! Coordinates script generation and narration from end to end.

use crate::chunking;
use crate::config::{Prompts, Settings, SynthesisSettings};
use crate::error::Result;
use crate::keypool::KeyPool;
use crate::project::{self, ProjectPaths};
use crate::script::{ScriptDocument, ScriptGenerator};
use crate::synthesis::{
    DispatchConfig, ElevenLabsSynthesizer, PendingChunk, SynthesisDispatcher,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument};

/// The main orchestrator for the Fortell pipeline.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
}

/// Outcome of the generate stage.
pub struct GenerateResult {
    pub paths: ProjectPaths,
    pub document: ScriptDocument,
}

/// Outcome of the narrate stage.
pub struct NarrateResult {
    /// Audio files written, in section order.
    pub files: Vec<PathBuf>,
    /// Characters the batch was estimated at during planning.
    pub estimated_chars: u64,
}

impl Orchestrator {
    /// Create a new orchestrator with the given settings.
    pub fn new(settings: Settings) -> Result<Self> {
        // Load prompts (with optional custom directory and variables)
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        Ok(Self { settings, prompts })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Generate a video script for a book and write the project files.
    #[instrument(skip(self), fields(book = %book_name))]
    pub async fn generate(
        &self,
        book_name: &str,
        language: &str,
        model: Option<&str>,
    ) -> Result<GenerateResult> {
        let mut script_settings = self.settings.script.clone();
        if let Some(model) = model {
            script_settings.model = model.to_string();
        }

        let generator = ScriptGenerator::new(script_settings, self.prompts.clone());
        let document = generator.generate(book_name, language).await?;

        let paths = ProjectPaths::create(&self.settings.output_dir(), book_name)?;
        project::save_script(&paths, &document)?;

        info!(
            "Generated script '{}' with {} sections",
            document.title,
            document.sections.len()
        );

        Ok(GenerateResult { paths, document })
    }

    /// Narrate a previously generated script with the real TTS provider.
    #[instrument(skip(self), fields(book = %book_name))]
    pub async fn narrate(&self, book_name: &str, voice: Option<&str>) -> Result<NarrateResult> {
        let mut synth_settings = self.settings.synthesis.clone();
        if let Some(voice) = voice {
            synth_settings.voice_id = voice.to_string();
        }

        let pool = KeyPool::load(&self.settings.key_file(), &self.settings.keys.key_prefix)?;
        let synthesizer = Arc::new(ElevenLabsSynthesizer::new(&synth_settings));
        let dispatcher = SynthesisDispatcher::new(
            synthesizer,
            pool,
            DispatchConfig::from_settings(&synth_settings),
        );

        self.narrate_with(book_name, &synth_settings, dispatcher).await
    }

    /// Narrate with a caller-supplied dispatcher.
    ///
    /// The batch is planned against the key pool before the first synthesis
    /// call; chunks are then synthesized strictly in order with a fixed
    /// pause between calls.
    pub async fn narrate_with(
        &self,
        book_name: &str,
        synth_settings: &SynthesisSettings,
        mut dispatcher: SynthesisDispatcher,
    ) -> Result<NarrateResult> {
        let paths = ProjectPaths::resolve(&self.settings.output_dir(), book_name)?;
        let document = project::load_script(&paths)?;
        std::fs::create_dir_all(&paths.audio_dir)?;

        let pending = pending_chunks(&document, synth_settings.max_chunk_chars)?;
        if pending.is_empty() {
            info!("Script has no voice-over text to narrate");
            return Ok(NarrateResult {
                files: Vec::new(),
                estimated_chars: 0,
            });
        }

        let plan = dispatcher.plan_batch(&pending).await?;
        info!(
            "Batch planned: {} chunks, {} characters, {} available across {} keys",
            pending.len(),
            plan.estimated_chars,
            plan.total_remaining(),
            plan.quotas.len()
        );

        let mut files = Vec::with_capacity(pending.len());
        let total = pending.len();

        for (i, chunk) in pending.iter().enumerate() {
            let audio = dispatcher.synthesize_chunk(&chunk.text).await?;

            let path = paths.audio_dir.join(format!("{}.mp3", chunk.name));
            std::fs::write(&path, &audio)?;
            info!("Wrote {} ({}/{})", path.display(), i + 1, total);
            files.push(path);

            if i + 1 < total {
                tokio::time::sleep(dispatcher.pause_between_chunks()).await;
            }
        }

        Ok(NarrateResult {
            files,
            estimated_chars: plan.estimated_chars,
        })
    }
}

/// Expand a script's sections into named synthesis chunks.
///
/// Sections that fit the provider limit become one chunk; longer sections
/// are split at sentence boundaries into `_partN` chunks.
pub fn pending_chunks(
    document: &ScriptDocument,
    max_chunk_chars: usize,
) -> Result<Vec<PendingChunk>> {
    let mut pending = Vec::new();

    for (i, section) in document.sections.iter().enumerate() {
        let stem = project::section_stem(i + 1, &section.title);
        let mut pieces = chunking::chunk_text(&section.voice_over, max_chunk_chars)?;

        if pieces.len() == 1 {
            pending.push(PendingChunk::new(stem, pieces.remove(0)));
        } else {
            for (j, piece) in pieces.into_iter().enumerate() {
                pending.push(PendingChunk::new(format!("{}_part{}", stem, j + 1), piece));
            }
        }
    }

    Ok(pending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GeneralSettings, KeySettings};
    use crate::keypool::ApiKey;
    use crate::script::ScriptSection;
    use crate::synthesis::{SynthesisError, Synthesizer};
    use async_trait::async_trait;
    use std::time::Duration;

    struct AlwaysOkSynthesizer;

    #[async_trait]
    impl Synthesizer for AlwaysOkSynthesizer {
        async fn synthesize(
            &self,
            _api_key: &str,
            text: &str,
        ) -> std::result::Result<Vec<u8>, SynthesisError> {
            Ok(text.as_bytes().to_vec())
        }

        async fn remaining_quota(
            &self,
            _api_key: &str,
        ) -> std::result::Result<u64, SynthesisError> {
            Ok(1_000_000)
        }
    }

    fn sample_document() -> ScriptDocument {
        ScriptDocument {
            title: "Test".to_string(),
            duration: "10 minutes".to_string(),
            target_audience: "Readers".to_string(),
            sections: vec![
                ScriptSection {
                    title: "Intro".to_string(),
                    duration: "1 minute".to_string(),
                    voice_over: "Welcome. This is the intro.".to_string(),
                    visual_notes: String::new(),
                    background_music: String::new(),
                },
                ScriptSection {
                    title: "Deep Dive".to_string(),
                    duration: "5 minutes".to_string(),
                    voice_over: "First point here. Second point here. Third point here."
                        .to_string(),
                    visual_notes: String::new(),
                    background_music: String::new(),
                },
            ],
            key_points: Vec::new(),
            visual_style: String::new(),
            thumbnail_text: String::new(),
        }
    }

    #[test]
    fn test_pending_chunks_one_per_short_section() {
        let pending = pending_chunks(&sample_document(), 500).unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].name, "01_intro");
        assert_eq!(pending[1].name, "02_deep_dive");
    }

    #[test]
    fn test_pending_chunks_splits_long_sections() {
        let pending = pending_chunks(&sample_document(), 20).unwrap();

        // Both sections exceed 20 chars and split into parts.
        assert!(pending.len() > 2);
        assert!(pending.iter().any(|c| c.name == "01_intro_part1"));
        assert!(pending.iter().all(|c| c.char_count() <= 20));
    }

    #[tokio::test]
    async fn test_narrate_with_writes_audio_files() {
        let dir = tempfile::tempdir().unwrap();

        let settings = Settings {
            general: GeneralSettings {
                output_dir: dir.path().to_string_lossy().to_string(),
                ..GeneralSettings::default()
            },
            keys: KeySettings::default(),
            ..Settings::default()
        };

        // Seed a generated project on disk.
        let paths = ProjectPaths::create(dir.path(), "Test Book").unwrap();
        project::save_script(&paths, &sample_document()).unwrap();

        let orchestrator = Orchestrator::new(settings).unwrap();
        let synth_settings = orchestrator.settings().synthesis.clone();

        let pool = KeyPool::new(vec![ApiKey::new("a", "sk_test")]).unwrap();
        let dispatcher = SynthesisDispatcher::new(
            Arc::new(AlwaysOkSynthesizer),
            pool,
            DispatchConfig {
                cooldown: Duration::ZERO,
                max_passes: 1,
                pause_between_chunks: Duration::ZERO,
            },
        );

        let result = orchestrator
            .narrate_with("Test Book", &synth_settings, dispatcher)
            .await
            .unwrap();

        assert_eq!(result.files.len(), 2);
        assert!(paths.audio_dir.join("01_intro.mp3").exists());
        assert!(paths.audio_dir.join("02_deep_dive.mp3").exists());
        assert!(result.estimated_chars > 0);
    }
}
