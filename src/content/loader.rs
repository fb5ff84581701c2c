// src/content/loader.rs

//! Build a [`LessonCatalog`] from disk.
//!
//! Layout:
//!
//! ```text
//! lessons/
//!   01-basics/
//!     lesson.yml          # optional: title, description, draft
//!     01-intro.md
//!     02-files.mdx
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::LessonsConfig;
use crate::content::front_matter::{self, LessonMetadata, StepFrontMatter};
use crate::content::{format_title, Lesson, LessonCatalog, Step};
use crate::errors::{Result, TurtorialError};

/// Load every lesson under `cfg.directory`.
///
/// A missing directory is not an error: the catalog is simply empty.
pub fn load_catalog(cfg: &LessonsConfig) -> Result<LessonCatalog> {
    let root = &cfg.directory;
    if !root.is_dir() {
        warn!(dir = ?root, "lessons directory not found; serving no lessons");
        return Ok(LessonCatalog::default());
    }

    let mut lessons = Vec::new();
    for lesson_dir in sorted_entries(root)? {
        if !lesson_dir.is_dir() {
            continue;
        }
        if let Some(lesson) = load_lesson(&lesson_dir, cfg)? {
            lessons.push(lesson);
        }
    }

    let catalog = LessonCatalog::new(lessons);
    info!(dir = ?root, lessons = catalog.len(), "loaded lessons");
    Ok(catalog)
}

fn load_lesson(dir: &Path, cfg: &LessonsConfig) -> Result<Option<Lesson>> {
    let id = file_name(dir);
    let mut lesson = Lesson {
        title: format_title(&id),
        id,
        ..Lesson::default()
    };

    for path in sorted_entries(dir)? {
        if !path.is_file() {
            continue;
        }
        let name = file_name(&path);

        if name == "lesson.yml" || name == "lesson.yaml" {
            match read_metadata(&path) {
                Ok(meta) => {
                    if let Some(title) = meta.title {
                        lesson.title = title;
                    }
                    lesson.description = meta.description;
                    lesson.draft = meta.draft;
                }
                // Metadata problems never abort loading; the lesson keeps its
                // derived title.
                Err(e) => warn!(path = ?path, error = %e, "ignoring unreadable lesson metadata"),
            }
            continue;
        }

        let Some(stem) = step_stem(&name) else {
            continue;
        };

        match read_step(&path, stem) {
            Ok(step) if step.draft && !cfg.dev_mode => {
                debug!(lesson = %lesson.id, step = %step.id, "skipping draft step");
            }
            Ok(step) => lesson.steps.push(step),
            Err(e) if cfg.fail_on_error => return Err(e),
            Err(e) => warn!(error = %e, "skipping malformed step"),
        }
    }

    if lesson.draft && !cfg.dev_mode {
        info!(lesson = %lesson.id, "skipping draft lesson");
        return Ok(None);
    }

    Ok(Some(lesson))
}

fn read_metadata(path: &Path) -> std::result::Result<LessonMetadata, String> {
    let text = fs::read_to_string(path).map_err(|e| e.to_string())?;
    front_matter::parse_lesson(&text).map_err(|e| e.to_string())
}

fn read_step(path: &Path, stem: &str) -> Result<Step> {
    let text = fs::read_to_string(path).map_err(|e| content_error(path, e))?;
    let (header, body) = front_matter::split(&text);

    let fm = match header {
        Some(h) => front_matter::parse_step(h).map_err(|e| content_error(path, e))?,
        None => StepFrontMatter::default(),
    };

    // A broken quiz block costs the quizzes, never the step.
    let quizzes = fm.quizzes.and_then(|raw| match front_matter::parse_quizzes(raw) {
        Ok(quizzes) => Some(quizzes),
        Err(e) => {
            warn!(path = ?path, error = %e, "ignoring malformed quizzes");
            None
        }
    });

    Ok(Step {
        id: stem.to_string(),
        title: fm.title.unwrap_or_else(|| format_title(stem)),
        section: fm.section,
        order: fm.order,
        test_command: fm.test_command,
        before_command: fm.before,
        after_command: fm.after,
        draft: fm.draft,
        quizzes,
        content: body.to_string(),
    })
}

fn step_stem(name: &str) -> Option<&str> {
    name.strip_suffix(".mdx")
        .or_else(|| name.strip_suffix(".md"))
        .filter(|stem| !stem.is_empty())
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| content_error(dir, e))? {
        entries.push(entry.map_err(|e| content_error(dir, e))?.path());
    }
    entries.sort();
    Ok(entries)
}

fn content_error(path: &Path, err: impl std::fmt::Display) -> TurtorialError {
    TurtorialError::ContentError {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_stem_accepts_markdown_only() {
        assert_eq!(step_stem("01-intro.md"), Some("01-intro"));
        assert_eq!(step_stem("02-more.mdx"), Some("02-more"));
        assert_eq!(step_stem("notes.txt"), None);
        assert_eq!(step_stem(".md"), None);
    }
}
