//! Fixtures shared by the workflow tests.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use cvassist_llm::{ChatRequest, GenerativeService};
use cvassist_render::{PdfBackend, PdfCascade, PdfJob, Renderer};
use cvassist_shared::{AppConfig, Result, Settings};

pub const CV_TEXT: &str = "# Jane Smith\n\nSkills: Python, Testing\n";
pub const TEMPLATE_TEXT: &str = "# {{name}}\n\n## Skills\n{{skills}}\n";
pub const JOB_TEXT: &str = "# QA Engineer\n\nAcme Corp is looking for a tester.\n";
pub const GENERATED: &str = "# Jane Smith\n\n## Skills\n- Python\n- Testing\n";
pub const NAMES_REPLY: &str = r#"{"candidate_name": "Jane Smith", "company_name": "Acme Corp"}"#;

/// Service that answers extraction requests with [`NAMES_REPLY`] (or a
/// custom reply) and everything else with [`GENERATED`], recording every
/// request.
#[derive(Default)]
pub struct FakeService {
    pub seen: RefCell<Vec<ChatRequest>>,
    names_reply: Option<String>,
}

impl FakeService {
    pub fn with_names_reply(reply: impl Into<String>) -> Self {
        Self {
            names_reply: Some(reply.into()),
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.seen.borrow().clone()
    }

    pub fn is_extraction(request: &ChatRequest) -> bool {
        request.system.contains("extracting specific information")
    }
}

impl GenerativeService for FakeService {
    fn invoke(&self, request: &ChatRequest) -> Result<String> {
        self.seen.borrow_mut().push(request.clone());
        if Self::is_extraction(request) {
            Ok(self.names_reply.as_deref().unwrap_or(NAMES_REPLY).to_string())
        } else {
            Ok(GENERATED.to_string())
        }
    }
}

struct WritesPdf;

impl PdfBackend for WritesPdf {
    fn name(&self) -> &str {
        "fake-pdf"
    }
    fn convert(&self, job: &PdfJob) -> std::result::Result<(), String> {
        std::fs::write(&job.pdf_path, b"%PDF-1.4").map_err(|e| e.to_string())
    }
}

struct NoPdf;

impl PdfBackend for NoPdf {
    fn name(&self) -> &str {
        "no-pdf"
    }
    fn convert(&self, _job: &PdfJob) -> std::result::Result<(), String> {
        Err("no PDF tools installed".into())
    }
}

pub fn pdf_renderer() -> Renderer {
    Renderer::new(PdfCascade::new(vec![Box::new(WritesPdf)]))
}

pub fn broken_pdf_renderer() -> Renderer {
    Renderer::new(PdfCascade::new(vec![Box::new(NoPdf)]))
}

/// A base directory laid out with a CV, a job description, and the default
/// templates.
pub struct Fixture {
    pub root: PathBuf,
    pub settings: Settings,
}

impl Fixture {
    pub fn new() -> Self {
        let root = std::env::temp_dir().join(format!("cva-core-test-{}", uuid::Uuid::now_v7()));
        let settings = Settings::from_config(&AppConfig::default(), &root);
        settings.ensure_directories().unwrap();

        let template_dir = settings.template_path();
        std::fs::create_dir_all(&template_dir).unwrap();
        std::fs::write(template_dir.join("cv_template.md"), TEMPLATE_TEXT).unwrap();
        std::fs::write(
            template_dir.join("letter_template.md"),
            "[Current Date]\n\nDear [Hiring Manager's Name],\n",
        )
        .unwrap();
        std::fs::write(template_dir.join("style.css"), "body { font-family: serif; }").unwrap();

        std::fs::write(settings.cv_dir.join("cv.md"), CV_TEXT).unwrap();
        std::fs::write(settings.job_descriptions_dir.join("test_job.txt"), JOB_TEXT).unwrap();

        Self { root, settings }
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}

pub fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}
