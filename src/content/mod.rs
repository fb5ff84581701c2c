// src/content/mod.rs

//! Lesson content: the read-only source of step commands.
//!
//! The process layer only ever sees command strings. Everything here is about
//! finding them:
//! - [`ContentProvider`] is the seam the step runner resolves steps through.
//! - [`LessonCatalog`] is the in-memory implementation.
//! - [`loader`] builds a catalog from a directory of Markdown step files.
//! - [`front_matter`] splits and decodes the YAML header of a step file.

pub mod front_matter;
pub mod loader;

use serde::{Deserialize, Serialize};

pub use loader::load_catalog;

/// One tutorial step.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    /// Verification command; exit status 0 means the learner passed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_command: Option<String>,
    /// Environment setup run when the learner enters the step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before_command: Option<String>,
    /// Environment teardown run when the learner leaves the step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_command: Option<String>,
    pub draft: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quizzes: Option<Vec<QuizQuestion>>,
    /// Raw Markdown body.
    pub content: String,
}

/// A self-check question shown under a step's content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    #[serde(rename = "type")]
    pub kind: QuizType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    /// Pattern a `TEXT` answer must match. Evaluated by the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_regex: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QuizType {
    Choice,
    Text,
}

/// A lesson: a directory of steps plus optional metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub draft: bool,
    pub steps: Vec<Step>,
}

impl Lesson {
    pub fn step(&self, step_id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == step_id)
    }
}

/// Resolves `(lesson id, step id)` to a step.
pub trait ContentProvider: Send + Sync {
    fn find_step(&self, lesson_id: &str, step_id: &str) -> Option<&Step>;
}

/// Immutable, sorted set of lessons.
#[derive(Debug, Clone, Default)]
pub struct LessonCatalog {
    lessons: Vec<Lesson>,
}

impl LessonCatalog {
    /// Build a catalog, sorting lessons by id and steps by `(order, id)`.
    pub fn new(mut lessons: Vec<Lesson>) -> Self {
        lessons.sort_by(|a, b| a.id.cmp(&b.id));
        for lesson in lessons.iter_mut() {
            lesson.steps.sort_by(|a, b| {
                let ao = a.order.unwrap_or(i64::MAX);
                let bo = b.order.unwrap_or(i64::MAX);
                ao.cmp(&bo).then_with(|| a.id.cmp(&b.id))
            });
        }
        Self { lessons }
    }

    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    pub fn lesson(&self, id: &str) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id == id)
    }

    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }
}

impl ContentProvider for LessonCatalog {
    fn find_step(&self, lesson_id: &str, step_id: &str) -> Option<&Step> {
        self.lesson(lesson_id)?.step(step_id)
    }
}

/// Humanize a slug: `"01-getting-started"` -> `"Getting started"`.
pub fn format_title(slug: &str) -> String {
    let digits = slug.chars().take_while(|c| c.is_ascii_digit()).count();
    let without_prefix = if digits > 0 && slug[digits..].starts_with('-') {
        &slug[digits + 1..]
    } else {
        slug
    };

    let spaced = without_prefix.replace('-', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
