//! Test-run headers and summaries
//!
//! Builds the header and summary documents and renders them with the
//! configured formatter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

use super::formatter::{Document, FormatterKind, DEFAULT_WIDTH};
use super::script::{FormatterError, ScriptFormatter, DEFAULT_INTERPRETER};

/// Title used for every summary banner
pub const SUMMARY_TITLE: &str = "Test Summary";

/// Where rendering happens
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Render in-process
    #[default]
    Builtin,
    /// Shell out to the formatter scripts
    Script,
}

impl Backend {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "builtin" | "native" => Some(Backend::Builtin),
            "script" | "external" => Some(Backend::Script),
            _ => None,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Builtin => write!(f, "builtin"),
            Backend::Script => write!(f, "script"),
        }
    }
}

/// Header document: title plus project and run ID
pub fn header_document(title: &str, project: &str, run_id: &str) -> Document {
    Document::new(title)
        .field("Project", project)
        .field("Run ID", run_id)
}

/// Summary document: status, counts, duration and run ID
pub fn summary_document(
    status: &str,
    fail_count: &str,
    pass_count: &str,
    duration: &str,
    run_id: &str,
) -> Document {
    Document::new(SUMMARY_TITLE)
        .field("Status", status)
        .field("Tests", counts_line(fail_count, pass_count))
        .field("Duration", duration)
        .field("Run ID", run_id)
}

/// `"<pass> passed"` with no failures, otherwise `"<fail> failed, <pass> passed"`
pub fn counts_line(fail_count: &str, pass_count: &str) -> String {
    if is_zero(fail_count) {
        format!("{pass_count} passed")
    } else {
        format!("{fail_count} failed, {pass_count} passed")
    }
}

fn is_zero(count: &str) -> bool {
    count.trim().parse::<i64>().map(|n| n == 0).unwrap_or(false)
}

/// Renders banners with a fixed formatter, width and backend
#[derive(Clone, Debug)]
pub struct BannerRenderer {
    kind: FormatterKind,
    width: usize,
    backend: Backend,
    script_root: Option<PathBuf>,
    interpreter: String,
}

impl BannerRenderer {
    pub fn new(kind: FormatterKind) -> Self {
        Self {
            kind,
            width: DEFAULT_WIDTH,
            backend: Backend::Builtin,
            script_root: None,
            interpreter: DEFAULT_INTERPRETER.to_string(),
        }
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_script_root(mut self, root: Option<PathBuf>) -> Self {
        self.script_root = root;
        self
    }

    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    pub fn kind(&self) -> FormatterKind {
        self.kind
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Script that would be used by the script backend
    pub fn script_formatter(&self) -> ScriptFormatter {
        ScriptFormatter::new(self.kind, self.script_root.as_deref())
            .with_interpreter(&self.interpreter)
    }

    pub async fn render(&self, doc: &Document) -> Result<String, FormatterError> {
        debug!(
            "Rendering '{}' with {} formatter ({} backend, width {})",
            doc.title, self.kind, self.backend, self.width
        );
        match self.backend {
            Backend::Builtin => Ok(self.kind.render(doc, self.width)),
            Backend::Script => self.script_formatter().render(doc, self.width).await,
        }
    }

    pub async fn header(
        &self,
        title: &str,
        project: &str,
        run_id: &str,
    ) -> Result<String, FormatterError> {
        self.render(&header_document(title, project, run_id)).await
    }

    pub async fn summary(
        &self,
        status: &str,
        fail_count: &str,
        pass_count: &str,
        duration: &str,
        run_id: &str,
    ) -> Result<String, FormatterError> {
        let doc = summary_document(status, fail_count, pass_count, duration, run_id);
        self.render(&doc).await
    }
}

impl Default for BannerRenderer {
    fn default() -> Self {
        Self::new(FormatterKind::default())
    }
}
