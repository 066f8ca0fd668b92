//! Core domain types for CV Assistant runs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Placeholder used wherever a name could not be determined.
pub const UNKNOWN: &str = "Unknown";

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// A loaded input file (CV or job description).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Where the document was read from.
    pub path: PathBuf,
    /// Raw UTF-8 contents.
    pub text: String,
}

impl SourceDocument {
    /// File name without extension, used to key output directories.
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| UNKNOWN.to_string())
    }

    /// File name including extension.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// A document template with its optional companions.
#[derive(Debug, Clone, Default)]
pub struct Template {
    /// Logical name (the configured template identifier).
    pub name: String,
    /// Template body handed to the generator.
    pub body: String,
    /// Writing instructions; empty when the template has none.
    pub instructions: String,
    /// Stylesheet inlined into the HTML output.
    pub stylesheet: Option<String>,
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Which parsing step produced an [`ExtractedMetadata`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionSource {
    /// The whole reply parsed as a JSON object.
    WholeReply,
    /// A JSON fragment embedded in surrounding prose.
    EmbeddedFragment,
    /// Candidate name taken from the document's first-line heading.
    Heading,
    /// Nothing parseable; both fields hold [`UNKNOWN`].
    Fallback,
}

/// Names pulled out of the CV and job description for output naming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedMetadata {
    pub candidate_name: String,
    pub company_name: String,
    pub source: ExtractionSource,
}

impl ExtractedMetadata {
    /// Both fields set to [`UNKNOWN`].
    pub fn unknown() -> Self {
        Self {
            candidate_name: UNKNOWN.into(),
            company_name: UNKNOWN.into(),
            source: ExtractionSource::Fallback,
        }
    }
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Files written for one rendered document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputArtifactSet {
    pub markdown: PathBuf,
    pub html: PathBuf,
    /// `None` only when the renderer was asked to tolerate a failed cascade.
    pub pdf: Option<PathBuf>,
}

impl OutputArtifactSet {
    /// All written paths, markdown first.
    pub fn paths(&self) -> Vec<&PathBuf> {
        let mut paths = vec![&self.markdown, &self.html];
        if let Some(pdf) = &self.pdf {
            paths.push(pdf);
        }
        paths
    }
}

// ---------------------------------------------------------------------------
// Pipelines
// ---------------------------------------------------------------------------

/// The three user-facing workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    Cv,
    Letter,
    Adapt,
}

impl PipelineKind {
    /// Subdirectory name under the dated output directory.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Cv => "cv",
            Self::Letter => "letter",
            Self::Adapt => "adopt",
        }
    }

    /// Human-readable description used in messages.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Cv => "CV tailoring",
            Self::Letter => "cover letter generation",
            Self::Adapt => "CV template adaptation",
        }
    }

    /// Mandatory template file.
    pub fn template_file(&self) -> &'static str {
        match self {
            Self::Cv | Self::Adapt => "cv_template.md",
            Self::Letter => "letter_template.md",
        }
    }

    /// Optional instructions file.
    pub fn instructions_file(&self) -> &'static str {
        match self {
            Self::Cv | Self::Adapt => "cv_instructions.md",
            Self::Letter => "letter_instructions.md",
        }
    }

    /// Optional workflow-specific stylesheet.
    pub fn stylesheet_file(&self) -> &'static str {
        match self {
            Self::Cv | Self::Adapt => "cv_style.css",
            Self::Letter => "letter_style.css",
        }
    }
}

impl std::fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Lifecycle of a single pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Loading,
    Generating,
    Rendering,
    Done,
    Failed,
}

impl RunStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Generating => "generating",
            Self::Rendering => "rendering",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}
