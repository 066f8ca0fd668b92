//! Multi-format rendering for CV Assistant.
//!
//! Generated Markdown is written as-is, converted to a styled HTML document,
//! and then handed to the [`PdfCascade`]. See [`Renderer::render`].

pub mod html;
pub mod pdf;

use std::path::Path;

use tracing::{info, instrument, warn};

use cvassist_shared::fs::{with_suffix, write_text};
use cvassist_shared::{CvAssistError, OutputArtifactSet, Result};

pub use html::{markdown_to_fragment, markdown_to_html};
pub use pdf::{
    BackendFailure, CascadeOutcome, HeadlessBrowser, Pandoc, PdfBackend, PdfCascade, PdfJob,
    WeasyPrint, Wkhtmltopdf,
};

/// What a render produced.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub artifacts: OutputArtifactSet,
    /// Backend that produced the PDF, if any. Informational only.
    pub backend: Option<String>,
    /// Backends that failed, in the order they were tried.
    pub failures: Vec<BackendFailure>,
}

/// Writes `.md`, `.html`, and `.pdf` siblings for one document.
#[derive(Default)]
pub struct Renderer {
    cascade: PdfCascade,
}

impl Renderer {
    pub fn new(cascade: PdfCascade) -> Self {
        Self { cascade }
    }

    /// Render `markdown` to `<base>.md`, `<base>.html`, and `<base>.pdf`.
    ///
    /// The parent directory of `base` is created if needed. When every PDF
    /// backend fails this returns [`CvAssistError::ConversionExhausted`]; the
    /// `.md` and `.html` files have already been written at that point.
    #[instrument(skip_all, fields(base = %base.display()))]
    pub fn render(&self, markdown: &str, base: &Path, css: Option<&str>) -> Result<RenderOutcome> {
        let outcome = self.render_inner(markdown, base, css)?;
        if outcome.artifacts.pdf.is_none() {
            return Err(CvAssistError::ConversionExhausted {
                attempts: outcome.failures.iter().map(ToString::to_string).collect(),
            });
        }
        Ok(outcome)
    }

    /// Like [`Renderer::render`], but an exhausted PDF cascade is logged and
    /// reported as `pdf: None` instead of failing.
    #[instrument(skip_all, fields(base = %base.display()))]
    pub fn render_best_effort(
        &self,
        markdown: &str,
        base: &Path,
        css: Option<&str>,
    ) -> Result<RenderOutcome> {
        let outcome = self.render_inner(markdown, base, css)?;
        if outcome.artifacts.pdf.is_none() {
            warn!(
                attempts = outcome.failures.len(),
                "continuing without PDF; markdown and HTML were written"
            );
        }
        Ok(outcome)
    }

    fn render_inner(
        &self,
        markdown: &str,
        base: &Path,
        css: Option<&str>,
    ) -> Result<RenderOutcome> {
        let (markdown_path, html_path) = write_sources(markdown, base, css)?;

        let job = PdfJob {
            html_path: html_path.clone(),
            markdown_path: markdown_path.clone(),
            pdf_path: with_suffix(base, "pdf"),
        };
        let (pdf, backend, failures) = match self.cascade.try_run(&job) {
            Ok(outcome) => {
                info!(backend = %outcome.backend, "rendered all formats");
                (Some(job.pdf_path), Some(outcome.backend), outcome.failures)
            }
            Err(failures) => (None, None, failures),
        };

        Ok(RenderOutcome {
            artifacts: OutputArtifactSet {
                markdown: markdown_path,
                html: html_path,
                pdf,
            },
            backend,
            failures,
        })
    }
}

fn write_sources(
    markdown: &str,
    base: &Path,
    css: Option<&str>,
) -> Result<(std::path::PathBuf, std::path::PathBuf)> {
    let markdown_path = write_text(markdown, &with_suffix(base, "md"))?;
    info!(path = %markdown_path.display(), "markdown saved");

    let html = markdown_to_html(markdown, css);
    let html_path = write_text(&html, &with_suffix(base, "html"))?;
    info!(path = %html_path.display(), "HTML saved");

    Ok((markdown_path, html_path))
}
