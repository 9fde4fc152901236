//! Built-in formatters for test-run banners
//!
//! Provides textbox, markdown, and plaintext renderings of a title/body pair.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use unicode_width::UnicodeWidthChar;

/// Default minimum box width
pub const DEFAULT_WIDTH: usize = 60;

/// Directory holding the formatter scripts, relative to the script root
const SCRIPT_DIR: &str = "utils/format";

/// Formatter selection
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatterKind {
    #[default]
    Textbox,
    Markdown,
    Plaintext,
}

impl FormatterKind {
    /// Look up a formatter by name. Anything unrecognised selects textbox.
    pub fn from_name(name: &str) -> Self {
        match name {
            "textbox" => FormatterKind::Textbox,
            "markdown" => FormatterKind::Markdown,
            "plaintext" => FormatterKind::Plaintext,
            _ => FormatterKind::Textbox,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FormatterKind::Textbox => "textbox",
            FormatterKind::Markdown => "markdown",
            FormatterKind::Plaintext => "plaintext",
        }
    }

    pub fn all() -> Vec<FormatterKind> {
        vec![
            FormatterKind::Textbox,
            FormatterKind::Markdown,
            FormatterKind::Plaintext,
        ]
    }

    /// Whether the formatter honours a minimum width
    pub fn uses_width(&self) -> bool {
        matches!(self, FormatterKind::Textbox)
    }

    /// Path of the external formatter script for this kind
    pub fn script_path(&self, script_root: Option<&Path>) -> PathBuf {
        let relative = Path::new(SCRIPT_DIR).join(format!("{}.py", self.name()));
        match script_root {
            Some(root) => root.join(relative),
            None => relative,
        }
    }

    /// Render a document with the built-in implementation
    pub fn render(&self, doc: &Document, width: usize) -> String {
        match self {
            FormatterKind::Textbox => format_box(&doc.title, &doc.body, width),
            FormatterKind::Markdown => format_markdown(&doc.title, &doc.body),
            FormatterKind::Plaintext => format_plaintext(&doc.title, &doc.body),
        }
    }
}

impl fmt::Display for FormatterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A title plus body lines, the unit every formatter renders
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub body: Vec<String>,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: Vec::new(),
        }
    }

    /// Append a body line
    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.body.push(line.into());
        self
    }

    /// Append a `Key: value` body line
    pub fn field(self, key: &str, value: impl fmt::Display) -> Self {
        self.line(format!("{key}: {value}"))
    }
}

/// Terminal display width; wide and fullwidth characters take two columns
pub fn display_width(s: &str) -> usize {
    s.chars()
        .map(|c| match c.width() {
            Some(2) => 2,
            _ => 1,
        })
        .sum()
}

/// Bordered box, at least `min_width` columns wide.
///
/// Output matches `utils/format/textbox.py` byte for byte, including its
/// padding: content lines come out two columns wider than the borders.
pub fn format_box(title: &str, body: &[String], min_width: usize) -> String {
    let content_width = std::iter::once(title)
        .chain(body.iter().map(String::as_str))
        .map(display_width)
        .max()
        .unwrap_or(0);
    let width = min_width.max(content_width + 4);
    let rule = "═".repeat(width.saturating_sub(2));

    let pad = |line: &str| {
        let needed = width.saturating_sub(display_width(line) + 2);
        format!("║ {line}{} ║", " ".repeat(needed))
    };

    let mut lines = Vec::with_capacity(body.len() + 4);
    lines.push(format!("╔{rule}╗"));
    lines.push(pad(title));
    lines.push(format!("╠{rule}╣"));
    lines.extend(body.iter().map(|line| pad(line)));
    lines.push(format!("╚{rule}╝"));
    lines.join("\n")
}

/// Markdown with an H3 title; `Key: value` lines get bold keys
pub fn format_markdown(title: &str, body: &[String]) -> String {
    let mut lines = vec![format!("### {title}"), String::new()];
    for line in body {
        match line.split_once(": ") {
            Some((key, value)) => lines.push(format!("**{key}:** {value}")),
            None => lines.push(line.clone()),
        }
    }
    lines.join("\n")
}

/// Title, blank line, body
pub fn format_plaintext(title: &str, body: &[String]) -> String {
    let mut lines = vec![title.to_string(), String::new()];
    lines.extend(body.iter().cloned());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_unknown_names_select_textbox() {
        for name in ["", "box", "TEXTBOX", "html", "Markdown", "json"] {
            assert_eq!(FormatterKind::from_name(name), FormatterKind::Textbox);
        }
        assert_eq!(
            FormatterKind::from_name("markdown"),
            FormatterKind::Markdown
        );
        assert_eq!(
            FormatterKind::from_name("plaintext"),
            FormatterKind::Plaintext
        );
    }

    #[test]
    fn test_script_path() {
        let path = FormatterKind::Markdown.script_path(None);
        assert_eq!(path, PathBuf::from("utils/format/markdown.py"));

        let path = FormatterKind::Textbox.script_path(Some(Path::new("/opt/app")));
        assert_eq!(path, PathBuf::from("/opt/app/utils/format/textbox.py"));
    }

    #[test]
    fn test_display_width() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("日本"), 4);
        assert_eq!(display_width("ｶ"), 1);
        assert_eq!(display_width("Ａ"), 2);
    }

    #[test]
    fn test_format_box_min_width() {
        let output = format_box("Title", &body(&["line"]), 10);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "╔════════╗");
        assert_eq!(lines[1], "║ Title    ║");
        assert_eq!(lines[2], "╠════════╣");
        assert_eq!(lines[3], "║ line     ║");
        assert_eq!(lines[4], "╚════════╝");
    }

    #[test]
    fn test_format_box_matches_textbox_script() {
        // textbox.py --title T --body "Run ID: r" --width 12
        let expected = [
            "╔═══════════╗",
            "║ T           ║",
            "╠═══════════╣",
            "║ Run ID: r   ║",
            "╚═══════════╝",
        ]
        .join("\n");
        assert_eq!(format_box("T", &body(&["Run ID: r"]), 12), expected);
    }

    #[test]
    fn test_format_box_grows_with_content() {
        let long = "x".repeat(70);
        let output = format_box("T", &body(&[&long]), DEFAULT_WIDTH);
        let widths: Vec<usize> = output.lines().map(display_width).collect();
        assert_eq!(widths, vec![74, 76, 74, 76, 74]);
    }

    #[test]
    fn test_format_box_wide_characters() {
        let output = format_box("テスト", &body(&["ok"]), 12);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "╔══════════╗");
        assert_eq!(lines[1], "║ テスト     ║");
        assert_eq!(lines[3], "║ ok         ║");
    }

    #[test]
    fn test_format_markdown() {
        let output = format_markdown("Run", &body(&["Project: core", "plain", "a: b: c"]));
        assert_eq!(
            output,
            "### Run\n\n**Project:** core\nplain\n**a:** b: c"
        );
    }

    #[test]
    fn test_format_plaintext() {
        let output = format_plaintext("Run", &body(&["one", "two"]));
        assert_eq!(output, "Run\n\none\ntwo");
    }

    #[test]
    fn test_document_builder() {
        let doc = Document::new("Title").field("Run ID", "abc").line("tail");
        assert_eq!(doc.body, vec!["Run ID: abc", "tail"]);
    }
}
