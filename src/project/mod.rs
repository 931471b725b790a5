//! Output directory layout and script file writers.
//!
//! Each generated book gets its own project tree:
//!
//! ```text
//! <output_root>/<book>/
//!   script/full_script.json
//!   script/production_script.txt
//!   voice_over/voice_over_script.txt
//!   voice_over/sections/NN_section_title.txt
//!   voice_over/audio/NN_section_title.mp3
//! ```

use crate::error::{FortellError, Result};
use crate::script::{ScriptDocument, ScriptSection};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

const SEPARATOR_WIDTH: usize = 50;

fn forbidden_chars_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("valid regex"))
}

fn slug_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s-]").expect("valid regex"))
}

/// Strip filesystem-hostile characters from a book name.
pub fn sanitize_book_name(book_name: &str) -> String {
    forbidden_chars_re()
        .replace_all(book_name, "")
        .trim()
        .to_string()
}

/// Build a filesystem-safe stem for a numbered section file.
///
/// `01_the_opening_moves` for section 1 titled "The Opening Moves!".
pub fn section_stem(index: usize, title: &str) -> String {
    let slug = slug_re()
        .replace_all(title, "")
        .trim()
        .replace(' ', "_")
        .to_lowercase();
    format!("{:02}_{}", index, slug)
}

/// Paths of one book project.
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub script_dir: PathBuf,
    pub voice_over_dir: PathBuf,
    pub sections_dir: PathBuf,
    pub audio_dir: PathBuf,
}

impl ProjectPaths {
    /// Resolve the project tree for a book without touching the filesystem.
    pub fn resolve(output_root: &Path, book_name: &str) -> Result<Self> {
        let safe_name = sanitize_book_name(book_name);
        if safe_name.is_empty() {
            return Err(FortellError::InvalidInput(
                "book name is empty after sanitization".to_string(),
            ));
        }

        let root = output_root.join(safe_name);
        let script_dir = root.join("script");
        let voice_over_dir = root.join("voice_over");
        let sections_dir = voice_over_dir.join("sections");
        let audio_dir = voice_over_dir.join("audio");

        Ok(Self {
            root,
            script_dir,
            voice_over_dir,
            sections_dir,
            audio_dir,
        })
    }

    /// Resolve and create the project tree.
    pub fn create(output_root: &Path, book_name: &str) -> Result<Self> {
        let paths = Self::resolve(output_root, book_name)?;
        for dir in [
            &paths.root,
            &paths.script_dir,
            &paths.voice_over_dir,
            &paths.sections_dir,
            &paths.audio_dir,
        ] {
            std::fs::create_dir_all(dir)?;
            debug!("Created directory: {}", dir.display());
        }
        Ok(paths)
    }

    pub fn full_script_path(&self) -> PathBuf {
        self.script_dir.join("full_script.json")
    }
}

/// Save the script document in all output formats.
pub fn save_script(paths: &ProjectPaths, document: &ScriptDocument) -> Result<()> {
    let json = serde_json::to_string_pretty(document)?;
    std::fs::write(paths.full_script_path(), json)?;

    for (i, section) in document.sections.iter().enumerate() {
        let file = paths
            .sections_dir
            .join(format!("{}.txt", section_stem(i + 1, &section.title)));
        std::fs::write(&file, format_section_file(section))?;
    }

    std::fs::write(
        paths.voice_over_dir.join("voice_over_script.txt"),
        format_voice_over_script(document),
    )?;

    std::fs::write(
        paths.script_dir.join("production_script.txt"),
        format_production_script(document),
    )?;

    info!("Saved script content to {}", paths.root.display());
    Ok(())
}

/// Load a previously generated script document.
pub fn load_script(paths: &ProjectPaths) -> Result<ScriptDocument> {
    let path = paths.full_script_path();
    if !path.exists() {
        return Err(FortellError::ScriptNotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(&path)?;
    Ok(serde_json::from_str(&content)?)
}

fn format_section_file(section: &ScriptSection) -> String {
    format!(
        "# {}\nDuration: {}\n\n{}\n",
        section.title, section.duration, section.voice_over
    )
}

fn format_voice_over_script(document: &ScriptDocument) -> String {
    let mut out = format!(
        "# {}\nTarget Duration: {}\n\n",
        document.title, document.duration
    );

    let rule = "=".repeat(SEPARATOR_WIDTH);
    for (i, section) in document.sections.iter().enumerate() {
        out.push_str(&format!(
            "\n{rule}\nSection {}: {}\nDuration: {}\n{rule}\n\nVOICE OVER:\n{}\n\n",
            i + 1,
            section.title,
            section.duration,
            section.voice_over
        ));
    }

    out
}

fn format_production_script(document: &ScriptDocument) -> String {
    let mut out = format!(
        "# {}\nTarget Duration: {}\nTarget Audience: {}\n\nVisual Style: {}\n\nKey Points:\n",
        document.title, document.duration, document.target_audience, document.visual_style
    );

    for point in &document.key_points {
        out.push_str(&format!("- {}\n", point));
    }

    let rule = "=".repeat(SEPARATOR_WIDTH);
    for (i, section) in document.sections.iter().enumerate() {
        out.push_str(&format!(
            "\n{rule}\nSection {}: {}\nDuration: {}\n{rule}\n\nVOICE OVER:\n{}\n\nVISUAL NOTES:\n{}\n\nBACKGROUND MUSIC:\n{}\n\n",
            i + 1,
            section.title,
            section.duration,
            section.voice_over,
            section.visual_notes,
            section.background_music
        ));
    }

    out
}
