//! Shared pipeline plumbing: run context, progress reporting, the
//! [`Workspace`] toolkit used by every workflow, and error context.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::{debug, error, info};

use cvassist_llm::GenerativeService;
use cvassist_render::{RenderOutcome, Renderer};
use cvassist_shared::{
    CvAssistError, ExtractedMetadata, OutputArtifactSet, PipelineKind, Result, RunStage, Settings,
    SourceDocument, Template,
};

use crate::input;
use crate::templates::TemplateStore;

/// Log target for run failures. The caller prints the error itself, so
/// console layers should skip this target.
pub const FAILURE_TARGET: &str = "cvassist::failure";

/// Byte budget for one sanitized path component, leaving room for the
/// temp-file prefix and extensions.
const MAX_NAME_BYTES: usize = 200;

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called on every stage transition, including `Done` and `Failed`.
    fn stage(&self, kind: PipelineKind, stage: RunStage);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn stage(&self, _kind: PipelineKind, _stage: RunStage) {}
}

// ---------------------------------------------------------------------------
// Context and output
// ---------------------------------------------------------------------------

/// Everything a workflow needs from the outside world.
pub struct PipelineContext<'a> {
    pub settings: &'a Settings,
    pub service: &'a dyn GenerativeService,
    pub renderer: &'a Renderer,
    pub progress: &'a dyn ProgressReporter,
    /// Log file named in failure messages.
    pub log_file: PathBuf,
    /// Clock reading used for the dated output directory and letter date.
    pub now: DateTime<Local>,
}

impl<'a> PipelineContext<'a> {
    pub fn new(
        settings: &'a Settings,
        service: &'a dyn GenerativeService,
        renderer: &'a Renderer,
        progress: &'a dyn ProgressReporter,
    ) -> Self {
        Self {
            settings,
            service,
            renderer,
            progress,
            log_file: settings.log_file(),
            now: Local::now(),
        }
    }
}

/// Result of a successful workflow run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// `<outputs>/<date> <subject>/<pipeline>/`
    pub output_dir: PathBuf,
    pub artifacts: OutputArtifactSet,
    /// Copy of the job description (CV and Letter only).
    pub job_description: Option<PathBuf>,
    /// Names used to build the file names.
    pub metadata: ExtractedMetadata,
    /// PDF backend that succeeded, if any.
    pub pdf_backend: Option<String>,
}

impl PipelineOutput {
    pub(crate) fn new(
        output_dir: PathBuf,
        rendered: RenderOutcome,
        job_description: Option<PathBuf>,
        metadata: ExtractedMetadata,
    ) -> Self {
        Self {
            output_dir,
            artifacts: rendered.artifacts,
            job_description,
            metadata,
            pdf_backend: rendered.backend,
        }
    }
}

// ---------------------------------------------------------------------------
// Workspace toolkit
// ---------------------------------------------------------------------------

/// Loaders and writers shared by the three workflows.
pub struct Workspace<'c, 'a> {
    ctx: &'c PipelineContext<'a>,
    kind: PipelineKind,
}

impl<'c, 'a> Workspace<'c, 'a> {
    pub fn new(ctx: &'c PipelineContext<'a>, kind: PipelineKind) -> Self {
        Self { ctx, kind }
    }

    pub fn settings(&self) -> &Settings {
        self.ctx.settings
    }

    /// Report and log a stage transition.
    pub fn stage(&self, stage: RunStage) {
        info!(pipeline = %self.kind, stage = stage.as_str(), "stage");
        self.ctx.progress.stage(self.kind, stage);
    }

    /// Explicit CV, or the most recent file in the CV directory.
    pub fn load_cv(&self, explicit: Option<&str>) -> Result<SourceDocument> {
        input::resolve("CV", explicit, &self.settings().cv_dir, None)
    }

    /// Explicit job description, or the most recent one with the configured
    /// extension.
    pub fn load_job_description(&self, explicit: Option<&str>) -> Result<SourceDocument> {
        let settings = self.settings();
        input::resolve(
            "job description",
            explicit,
            &settings.job_descriptions_dir,
            Some(&settings.job_description_extension),
        )
    }

    /// Template body, instructions, and stylesheet for this workflow.
    pub fn load_template(&self) -> Result<Template> {
        TemplateStore::from_settings(self.settings()).load_bundle(self.kind)
    }

    /// Create `<outputs>/<YYYY-MM-DD> <subject>/<pipeline>/`.
    pub fn output_dir(&self, subject: &str) -> Result<PathBuf> {
        let dir = output_dir_path(
            &self.settings().outputs_dir,
            self.ctx.now,
            subject,
            self.kind,
        );
        std::fs::create_dir_all(&dir).map_err(|e| CvAssistError::io(&dir, e))?;
        info!(dir = %dir.display(), "output directory");
        Ok(dir)
    }

    /// Render the document to `.md`, `.html`, and `.pdf` under `dir`.
    ///
    /// With `require_pdf` an exhausted PDF cascade fails the run; otherwise
    /// the run continues without a PDF.
    pub fn save(
        &self,
        content: &str,
        dir: &Path,
        base_name: &str,
        template: &Template,
        require_pdf: bool,
    ) -> Result<RenderOutcome> {
        let base = dir.join(sanitize_file_name(base_name));
        let css = template.stylesheet.as_deref();
        let outcome = if require_pdf {
            self.ctx.renderer.render(content, &base, css)?
        } else {
            self.ctx.renderer.render_best_effort(content, &base, css)?
        };
        debug!(
            files = ?outcome.artifacts.paths(),
            backend = ?outcome.backend,
            "generated files"
        );
        Ok(outcome)
    }

    /// Copy the job description byte-for-byte into `dir`.
    pub fn copy_job_description(&self, job: &SourceDocument, dir: &Path) -> Result<PathBuf> {
        let target = dir.join(job.file_name());
        std::fs::copy(&job.path, &target).map_err(|e| CvAssistError::io(&target, e))?;
        info!(path = %target.display(), "copied job description");
        Ok(target)
    }

    /// Run `body`, reporting stages and attaching error context.
    pub fn run(
        &self,
        body: impl FnOnce(&Self) -> Result<PipelineOutput>,
    ) -> Result<PipelineOutput> {
        self.stage(RunStage::Loading);
        match body(self) {
            Ok(output) => {
                self.stage(RunStage::Done);
                Ok(output)
            }
            Err(err) => {
                self.stage(RunStage::Failed);
                let err = with_context(self.kind, self.settings(), &self.ctx.log_file, err);
                error!(target: FAILURE_TARGET, pipeline = %self.kind, "{err}");
                debug!(error = ?err, "detailed error information");
                Err(err)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Naming and error helpers
// ---------------------------------------------------------------------------

/// `<outputs>/<YYYY-MM-DD> <subject>/<pipeline>`
pub fn output_dir_path(
    outputs: &Path,
    now: DateTime<Local>,
    subject: &str,
    kind: PipelineKind,
) -> PathBuf {
    let folder = format!("{} {}", now.format("%Y-%m-%d"), sanitize_file_name(subject));
    outputs.join(folder).join(kind.dir_name())
}

/// Replace characters that are not valid in file names with `-` and cap the
/// result at [`MAX_NAME_BYTES`] on a char boundary.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.len() <= MAX_NAME_BYTES {
        return cleaned.to_string();
    }
    let mut end = MAX_NAME_BYTES;
    while !cleaned.is_char_boundary(end) {
        end -= 1;
    }
    debug!(original_bytes = cleaned.len(), "file name truncated");
    cleaned[..end].trim_end().to_string()
}

/// First-line `#` heading of a Markdown CV, if any.
pub fn heading_name(text: &str) -> Option<String> {
    let first = text.lines().next()?.trim();
    if !first.starts_with('#') {
        return None;
    }
    let name = first.trim_start_matches('#').trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Attach user-facing context to a workflow error.
///
/// Missing inputs get a pointer to the input directories; anything else is
/// wrapped in [`CvAssistError::RunFailed`] naming the workflow and log file.
pub fn with_context(
    kind: PipelineKind,
    settings: &Settings,
    log_file: &Path,
    err: CvAssistError,
) -> CvAssistError {
    match err {
        CvAssistError::NotFound { message } => {
            let dirs = match kind {
                PipelineKind::Adapt => format!("CV dir: {}", settings.cv_dir.display()),
                PipelineKind::Cv | PipelineKind::Letter => format!(
                    "CV dir: {}, Job dir: {}",
                    settings.cv_dir.display(),
                    settings.job_descriptions_dir.display()
                ),
            };
            CvAssistError::not_found(format!("{message}\nCheck files in: {dirs}"))
        }
        err @ CvAssistError::RunFailed { .. } => err,
        other => CvAssistError::RunFailed {
            pipeline: kind.description().to_string(),
            log_file: log_file.to_path_buf(),
            source: Box::new(other),
        },
    }
}
