//! External formatter scripts
//!
//! Runs a formatter script with `--title`, `--body`, and `--width` flags and
//! returns what it printed.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use super::formatter::{Document, FormatterKind};

/// Default interpreter for formatter scripts
pub const DEFAULT_INTERPRETER: &str = "python3";

/// Formatter script errors
#[derive(Error, Debug)]
pub enum FormatterError {
    #[error("Formatter script not found: {0}")]
    ScriptNotFound(PathBuf),

    #[error("Failed to launch {interpreter}: {source}")]
    Launch {
        interpreter: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Formatter {script} exited with {code}: {stderr}")]
    Failed {
        script: PathBuf,
        code: String,
        stderr: String,
    },
}

/// Invokes one formatter script
#[derive(Clone, Debug)]
pub struct ScriptFormatter {
    kind: FormatterKind,
    script: PathBuf,
    interpreter: String,
}

impl ScriptFormatter {
    pub fn new(kind: FormatterKind, script_root: Option<&Path>) -> Self {
        Self {
            kind,
            script: kind.script_path(script_root),
            interpreter: DEFAULT_INTERPRETER.to_string(),
        }
    }

    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    /// Command-line arguments passed to the script
    pub fn args(&self, doc: &Document, width: usize) -> Vec<String> {
        let mut args = vec![
            self.script.display().to_string(),
            "--title".to_string(),
            doc.title.clone(),
            "--body".to_string(),
        ];
        args.extend(doc.body.iter().cloned());
        if self.kind.uses_width() {
            args.push("--width".to_string());
            args.push(width.to_string());
        }
        args
    }

    /// Run the script and return its output without the trailing newline
    pub async fn render(&self, doc: &Document, width: usize) -> Result<String, FormatterError> {
        if !self.script.exists() {
            return Err(FormatterError::ScriptNotFound(self.script.clone()));
        }

        debug!(
            "Running {} formatter: {} {}",
            self.kind,
            self.interpreter,
            self.script.display()
        );

        let output = Command::new(&self.interpreter)
            .args(self.args(doc, width))
            .output()
            .await
            .map_err(|source| FormatterError::Launch {
                interpreter: self.interpreter.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(FormatterError::Failed {
                script: self.script.clone(),
                code: output
                    .status
                    .code()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "signal".to_string()),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.trim_end_matches('\n').to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn doc() -> Document {
        Document::new("Run").line("Project: core").line("Run ID: 42")
    }

    #[test]
    fn test_args_textbox_includes_width() {
        let formatter = ScriptFormatter::new(FormatterKind::Textbox, Some(Path::new("/srv")));
        let args = formatter.args(&doc(), 72);
        assert_eq!(
            args,
            vec![
                "/srv/utils/format/textbox.py",
                "--title",
                "Run",
                "--body",
                "Project: core",
                "Run ID: 42",
                "--width",
                "72",
            ]
        );
    }

    #[test]
    fn test_args_markdown_omits_width() {
        let formatter = ScriptFormatter::new(FormatterKind::Markdown, None);
        let args = formatter.args(&doc(), 72);
        assert!(!args.contains(&"--width".to_string()));
        assert_eq!(args[0], "utils/format/markdown.py");
    }

    #[tokio::test]
    async fn test_missing_script() {
        let dir = tempdir().unwrap();
        let formatter = ScriptFormatter::new(FormatterKind::Plaintext, Some(dir.path()));
        let err = formatter.render(&doc(), 60).await.unwrap_err();
        assert!(matches!(err, FormatterError::ScriptNotFound(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runs_script_with_interpreter() {
        let dir = tempdir().unwrap();
        let script_dir = dir.path().join("utils/format");
        std::fs::create_dir_all(&script_dir).unwrap();
        std::fs::write(script_dir.join("plaintext.py"), "echo \"$@\"\n").unwrap();

        let formatter =
            ScriptFormatter::new(FormatterKind::Plaintext, Some(dir.path())).with_interpreter("sh");
        let output = formatter.render(&doc(), 60).await.unwrap();
        assert_eq!(output, "--title Run --body Project: core Run ID: 42");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_script() {
        let dir = tempdir().unwrap();
        let script_dir = dir.path().join("utils/format");
        std::fs::create_dir_all(&script_dir).unwrap();
        std::fs::write(script_dir.join("textbox.py"), "echo boom >&2\nexit 3\n").unwrap();

        let formatter =
            ScriptFormatter::new(FormatterKind::Textbox, Some(dir.path())).with_interpreter("sh");
        match formatter.render(&doc(), 60).await {
            Err(FormatterError::Failed { code, stderr, .. }) => {
                assert_eq!(code, "3");
                assert_eq!(stderr, "boom");
            }
            other => panic!("Expected failure, got {other:?}"),
        }
    }
}
