#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use turtorial::config::{LessonsConfig, TerminalConfig};
use turtorial::content::{Lesson, LessonCatalog, Step};

/// Builder for an on-disk lessons directory.
///
/// ```ignore
/// let dir = LessonDirBuilder::new()
///     .lesson("01-basics")
///     .step("01-basics", "01-intro", StepFileBuilder::new().test_command("true"))
///     .build();
/// ```
pub struct LessonDirBuilder {
    root: TempDir,
}

impl LessonDirBuilder {
    pub fn new() -> Self {
        Self {
            root: TempDir::new().expect("create temp lessons dir"),
        }
    }

    pub fn lesson(self, lesson_id: &str) -> Self {
        fs::create_dir_all(self.root.path().join(lesson_id)).expect("create lesson dir");
        self
    }

    pub fn metadata(self, lesson_id: &str, yaml: &str) -> Self {
        self.raw_file(lesson_id, "lesson.yml", yaml)
    }

    pub fn step(self, lesson_id: &str, step_id: &str, step: StepFileBuilder) -> Self {
        let text = step.render();
        self.raw_file(lesson_id, &format!("{step_id}.md"), &text)
    }

    pub fn raw_file(self, lesson_id: &str, file_name: &str, contents: &str) -> Self {
        let dir = self.root.path().join(lesson_id);
        fs::create_dir_all(&dir).expect("create lesson dir");
        fs::write(dir.join(file_name), contents).expect("write lesson file");
        self
    }

    /// Finish; the directory lives as long as the returned `TempDir`.
    pub fn build(self) -> TempDir {
        self.root
    }
}

impl Default for LessonDirBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for the text of a single step file.
#[derive(Default)]
pub struct StepFileBuilder {
    title: Option<String>,
    test_command: Option<String>,
    before: Option<String>,
    after: Option<String>,
    order: Option<i64>,
    draft: bool,
    body: String,
}

impl StepFileBuilder {
    pub fn new() -> Self {
        Self {
            body: "Step body.\n".to_string(),
            ..Self::default()
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn test_command(mut self, cmd: &str) -> Self {
        self.test_command = Some(cmd.to_string());
        self
    }

    pub fn before(mut self, cmd: &str) -> Self {
        self.before = Some(cmd.to_string());
        self
    }

    pub fn after(mut self, cmd: &str) -> Self {
        self.after = Some(cmd.to_string());
        self
    }

    pub fn order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    pub fn draft(mut self) -> Self {
        self.draft = true;
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::from("---\n");
        if let Some(ref t) = self.title {
            out.push_str(&format!("title: {}\n", yaml_str(t)));
        }
        if let Some(ref c) = self.test_command {
            out.push_str(&format!("testCommand: {}\n", yaml_str(c)));
        }
        if let Some(ref c) = self.before {
            out.push_str(&format!("before: {}\n", yaml_str(c)));
        }
        if let Some(ref c) = self.after {
            out.push_str(&format!("after: {}\n", yaml_str(c)));
        }
        if let Some(o) = self.order {
            out.push_str(&format!("order: {o}\n"));
        }
        if self.draft {
            out.push_str("draft: true\n");
        }
        out.push_str("---\n");
        out.push_str(&self.body);
        out
    }
}

/// Single-quoted YAML scalar, so shell metacharacters survive untouched.
fn yaml_str(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Builder for an in-memory catalog, for tests that never touch disk.
#[derive(Default)]
pub struct CatalogBuilder {
    lessons: Vec<Lesson>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(mut self, lesson_id: &str, step: Step) -> Self {
        match self.lessons.iter_mut().find(|l| l.id == lesson_id) {
            Some(lesson) => lesson.steps.push(step),
            None => self.lessons.push(Lesson {
                id: lesson_id.to_string(),
                title: lesson_id.to_string(),
                steps: vec![step],
                ..Lesson::default()
            }),
        }
        self
    }

    pub fn build(self) -> LessonCatalog {
        LessonCatalog::new(self.lessons)
    }
}

/// A step with only an id; set the command fields directly.
pub fn step(id: &str) -> Step {
    Step {
        id: id.to_string(),
        title: id.to_string(),
        ..Step::default()
    }
}

pub fn lessons_config(dir: &Path) -> LessonsConfig {
    LessonsConfig {
        directory: PathBuf::from(dir),
        ..LessonsConfig::default()
    }
}

/// A plain `/bin/sh` terminal: no login profile, short close grace.
pub fn sh_terminal_config() -> TerminalConfig {
    TerminalConfig {
        shell: "/bin/sh".to_string(),
        args: Vec::new(),
        term: "xterm".to_string(),
        cols: 80,
        rows: 24,
        cwd: None,
        close_grace: std::time::Duration::from_secs(2),
    }
}
