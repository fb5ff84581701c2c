// src/content/front_matter.rs

use serde::Deserialize;

use crate::content::QuizQuestion;

/// YAML header of a step file.
///
/// ```markdown
/// ---
/// title: Create a file
/// testCommand: test -f /tmp/hello
/// before: rm -f /tmp/hello
/// order: 2
/// ---
/// # Body
/// ```
///
/// `quizzes` is kept as raw YAML so that a malformed quiz block can be dropped
/// without losing the step; see [`parse_quizzes`]. Other unknown keys are
/// ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepFrontMatter {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub test_command: Option<String>,
    #[serde(default)]
    pub before: Option<String>,
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub quizzes: Option<serde_yaml::Value>,
}

/// `lesson.yml` next to the step files.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LessonMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub draft: bool,
}

/// Split a document into `(front matter, body)`.
///
/// The header must start on the first line with `---` and end at the next line
/// that is exactly `---` (trailing whitespace allowed). Without a closed
/// header the whole text is body.
pub fn split(text: &str) -> (Option<&str>, &str) {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let Some(first_break) = text.find('\n') else {
        return (None, text);
    };
    if text[..first_break].trim_end() != "---" {
        return (None, text);
    }

    let header_start = first_break + 1;
    let mut pos = header_start;
    while pos <= text.len() {
        let line_end = text[pos..].find('\n').map_or(text.len(), |i| pos + i);
        if text[pos..line_end].trim_end() == "---" {
            let header = text[header_start..pos].trim_end_matches(['\r', '\n']);
            let body_start = (line_end + 1).min(text.len());
            return (Some(header), &text[body_start..]);
        }
        if line_end == text.len() {
            break;
        }
        pos = line_end + 1;
    }

    (None, text)
}

pub fn parse_step(header: &str) -> Result<StepFrontMatter, serde_yaml::Error> {
    if header.trim().is_empty() {
        return Ok(StepFrontMatter::default());
    }
    serde_yaml::from_str(header)
}

/// Decode the `quizzes` list of a step header.
pub fn parse_quizzes(raw: serde_yaml::Value) -> Result<Vec<QuizQuestion>, serde_yaml::Error> {
    serde_yaml::from_value(raw)
}

pub fn parse_lesson(text: &str) -> Result<LessonMetadata, serde_yaml::Error> {
    if text.trim().is_empty() {
        return Ok(LessonMetadata::default());
    }
    serde_yaml::from_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::QuizType;

    #[test]
    fn splits_header_and_body() {
        let (header, body) = split("---\ntitle: Hi\n---\n# Body\nmore\n");
        assert_eq!(header, Some("title: Hi"));
        assert_eq!(body, "# Body\nmore\n");
    }

    #[test]
    fn handles_crlf_and_missing_body() {
        let (header, body) = split("---\r\ntitle: Hi\r\n---\r\n");
        assert_eq!(header, Some("title: Hi"));
        assert_eq!(body, "");

        let (header, body) = split("---\ntitle: Hi\n---");
        assert_eq!(header, Some("title: Hi"));
        assert_eq!(body, "");
    }

    #[test]
    fn unterminated_header_is_body() {
        let text = "---\ntitle: Hi\n# no close\n";
        assert_eq!(split(text), (None, text));
        assert_eq!(split("# plain"), (None, "# plain"));
    }

    #[test]
    fn decodes_camel_case_keys() {
        let fm = parse_step("testCommand: test -f /tmp/x\nbefore: touch /tmp/x\norder: 3\n")
            .expect("valid yaml");
        assert_eq!(fm.test_command.as_deref(), Some("test -f /tmp/x"));
        assert_eq!(fm.before.as_deref(), Some("touch /tmp/x"));
        assert_eq!(fm.order, Some(3));
        assert!(!fm.draft);
    }

    #[test]
    fn decodes_quizzes() {
        let fm = parse_step(
            "quizzes:\n  - question: 'What is 2+2?'\n    type: CHOICE\n    options: ['3', '4']\n    correctAnswer: '4'\n  - question: Type hello\n    type: TEXT\n    validationRegex: '^hello$'\n",
        )
        .expect("valid yaml");
        let quizzes = parse_quizzes(fm.quizzes.expect("quizzes present")).expect("valid quizzes");

        assert_eq!(quizzes.len(), 2);
        assert_eq!(quizzes[0].kind, QuizType::Choice);
        assert_eq!(quizzes[0].correct_answer.as_deref(), Some("4"));
        assert_eq!(quizzes[1].kind, QuizType::Text);
        assert_eq!(quizzes[1].validation_regex.as_deref(), Some("^hello$"));
    }

    #[test]
    fn unknown_quiz_type_is_an_error() {
        let fm = parse_step("quizzes:\n  - question: Pick\n    type: ESSAY\n").expect("valid yaml");
        assert!(parse_quizzes(fm.quizzes.expect("quizzes present")).is_err());
    }
}
