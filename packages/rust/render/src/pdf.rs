//! PDF generation cascade.
//!
//! A [`PdfCascade`] is an ordered list of interchangeable [`PdfBackend`]s.
//! Each is tried in turn; the first success wins and every failure is logged
//! and recorded. The default order is WeasyPrint, wkhtmltopdf, headless
//! Chromium/Chrome, then pandoc on the Markdown source.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{info, instrument, warn};

use cvassist_shared::{CvAssistError, Result};

// ---------------------------------------------------------------------------
// Backend contract
// ---------------------------------------------------------------------------

/// Inputs available to every backend for one conversion.
#[derive(Debug, Clone)]
pub struct PdfJob {
    /// Styled HTML document already on disk.
    pub html_path: PathBuf,
    /// Raw Markdown source already on disk.
    pub markdown_path: PathBuf,
    /// Where the PDF must end up.
    pub pdf_path: PathBuf,
}

/// A failed attempt by one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendFailure {
    pub backend: String,
    pub reason: String,
}

impl std::fmt::Display for BackendFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.backend, self.reason)
    }
}

/// One way of producing `job.pdf_path`.
///
/// `Err` carries a human-readable reason; the cascade moves on to the next
/// backend.
pub trait PdfBackend {
    fn name(&self) -> &str;
    fn convert(&self, job: &PdfJob) -> std::result::Result<(), String>;
}

// ---------------------------------------------------------------------------
// Cascade
// ---------------------------------------------------------------------------

/// Result of a successful cascade run.
#[derive(Debug, Clone)]
pub struct CascadeOutcome {
    /// Backend that produced the PDF.
    pub backend: String,
    /// Backends tried (and failed) before it, in order.
    pub failures: Vec<BackendFailure>,
}

/// Ordered list of PDF backends.
pub struct PdfCascade {
    backends: Vec<Box<dyn PdfBackend>>,
}

impl Default for PdfCascade {
    fn default() -> Self {
        Self::new(vec![
            Box::new(WeasyPrint::default()),
            Box::new(Wkhtmltopdf::default()),
            Box::new(HeadlessBrowser::default()),
            Box::new(Pandoc::default()),
        ])
    }
}

impl PdfCascade {
    pub fn new(backends: Vec<Box<dyn PdfBackend>>) -> Self {
        Self { backends }
    }

    /// Backend names in priority order.
    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Try each backend until one produces `job.pdf_path`.
    ///
    /// When every backend fails, [`CvAssistError::ConversionExhausted`] is
    /// returned. See [`PdfCascade::try_run`].
    pub fn run(&self, job: &PdfJob) -> Result<CascadeOutcome> {
        self.try_run(job).map_err(|failures| CvAssistError::ConversionExhausted {
            attempts: failures.iter().map(ToString::to_string).collect(),
        })
    }

    /// Like [`PdfCascade::run`], but hands back the structured failures.
    ///
    /// A PDF left at `job.pdf_path` by an earlier run is removed first, so a
    /// backend only counts as successful when it wrote the file itself. When
    /// every backend fails, any partial PDF is removed as well.
    #[instrument(skip_all, fields(pdf = %job.pdf_path.display()))]
    pub fn try_run(
        &self,
        job: &PdfJob,
    ) -> std::result::Result<CascadeOutcome, Vec<BackendFailure>> {
        remove_pdf(&job.pdf_path);
        let mut failures = Vec::new();

        for backend in &self.backends {
            let attempt = backend.convert(job).and_then(|()| {
                if job.pdf_path.is_file() {
                    Ok(())
                } else {
                    Err("reported success but wrote no PDF".to_string())
                }
            });

            match attempt {
                Ok(()) => {
                    info!(backend = backend.name(), "PDF generated");
                    return Ok(CascadeOutcome {
                        backend: backend.name().to_string(),
                        failures,
                    });
                }
                Err(reason) => {
                    warn!(backend = backend.name(), %reason, "PDF conversion failed");
                    failures.push(BackendFailure {
                        backend: backend.name().to_string(),
                        reason,
                    });
                }
            }
        }

        remove_pdf(&job.pdf_path);
        warn!("failed to generate PDF using any available method");
        Err(failures)
    }
}

fn remove_pdf(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "could not remove PDF");
        }
    }
}

// ---------------------------------------------------------------------------
// Subprocess helper
// ---------------------------------------------------------------------------

/// Run `program args..`, mapping a missing binary, spawn error, or non-zero
/// exit to a reason string.
fn run_program(program: &str, args: &[OsString]) -> std::result::Result<(), String> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                format!("{program} not found on the system")
            } else {
                format!("failed to run {program}: {e}")
            }
        })?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let detail = stderr.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("").trim();
    let code = output
        .status
        .code()
        .map_or_else(|| "signal".to_string(), |c| c.to_string());
    if detail.is_empty() {
        Err(format!("{program} exited with status {code}"))
    } else {
        Err(format!("{program} exited with status {code}: {detail}"))
    }
}

fn os(path: &Path) -> OsString {
    path.as_os_str().to_owned()
}

// ---------------------------------------------------------------------------
// Backends
// ---------------------------------------------------------------------------

/// WeasyPrint HTML renderer: `weasyprint <html> <pdf>`.
#[derive(Debug, Clone)]
pub struct WeasyPrint {
    pub program: String,
}

impl Default for WeasyPrint {
    fn default() -> Self {
        Self {
            program: "weasyprint".into(),
        }
    }
}

impl PdfBackend for WeasyPrint {
    fn name(&self) -> &str {
        "weasyprint"
    }

    fn convert(&self, job: &PdfJob) -> std::result::Result<(), String> {
        run_program(&self.program, &[os(&job.html_path), os(&job.pdf_path)])
    }
}

/// wkhtmltopdf renderer: `wkhtmltopdf --quiet --encoding utf-8 <html> <pdf>`.
#[derive(Debug, Clone)]
pub struct Wkhtmltopdf {
    pub program: String,
}

impl Default for Wkhtmltopdf {
    fn default() -> Self {
        Self {
            program: "wkhtmltopdf".into(),
        }
    }
}

impl PdfBackend for Wkhtmltopdf {
    fn name(&self) -> &str {
        "wkhtmltopdf"
    }

    fn convert(&self, job: &PdfJob) -> std::result::Result<(), String> {
        run_program(
            &self.program,
            &[
                "--quiet".into(),
                "--encoding".into(),
                "utf-8".into(),
                os(&job.html_path),
                os(&job.pdf_path),
            ],
        )
    }
}

/// Headless browser print-to-PDF. Programs are tried in order; the first
/// that exits successfully wins.
#[derive(Debug, Clone)]
pub struct HeadlessBrowser {
    pub programs: Vec<String>,
}

impl Default for HeadlessBrowser {
    fn default() -> Self {
        Self {
            programs: vec!["chromium".into(), "google-chrome".into()],
        }
    }
}

impl PdfBackend for HeadlessBrowser {
    fn name(&self) -> &str {
        "headless-browser"
    }

    fn convert(&self, job: &PdfJob) -> std::result::Result<(), String> {
        let mut print_flag = OsString::from("--print-to-pdf=");
        print_flag.push(&job.pdf_path);
        let args = [
            "--headless".into(),
            "--disable-gpu".into(),
            print_flag,
            os(&job.html_path),
        ];

        let mut reasons = Vec::new();
        for program in &self.programs {
            match run_program(program, &args) {
                Ok(()) => return Ok(()),
                Err(reason) => reasons.push(reason),
            }
        }
        if reasons.is_empty() {
            Err("no browser programs configured".into())
        } else {
            Err(reasons.join("; "))
        }
    }
}

/// pandoc on the Markdown source: `pandoc <md> -o <pdf>`.
#[derive(Debug, Clone)]
pub struct Pandoc {
    pub program: String,
}

impl Default for Pandoc {
    fn default() -> Self {
        Self {
            program: "pandoc".into(),
        }
    }
}

impl PdfBackend for Pandoc {
    fn name(&self) -> &str {
        "pandoc"
    }

    fn convert(&self, job: &PdfJob) -> std::result::Result<(), String> {
        run_program(
            &self.program,
            &[os(&job.markdown_path), "-o".into(), os(&job.pdf_path)],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cva-pdf-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn make_job(dir: &Path) -> PdfJob {
        let job = PdfJob {
            html_path: dir.join("doc.html"),
            markdown_path: dir.join("doc.md"),
            pdf_path: dir.join("doc.pdf"),
        };
        std::fs::write(&job.html_path, "<html></html>").unwrap();
        std::fs::write(&job.markdown_path, "# Doc").unwrap();
        job
    }

    /// Backend that fails, optionally leaving a partial file behind.
    struct Failing {
        name: &'static str,
        leave_partial: bool,
        calls: Rc<Cell<usize>>,
    }

    impl PdfBackend for Failing {
        fn name(&self) -> &str {
            self.name
        }
        fn convert(&self, job: &PdfJob) -> std::result::Result<(), String> {
            self.calls.set(self.calls.get() + 1);
            if self.leave_partial {
                std::fs::write(&job.pdf_path, b"%PDF-partial").unwrap();
            }
            Err(format!("{} unavailable", self.name))
        }
    }

    struct Writing {
        calls: Rc<Cell<usize>>,
    }

    impl PdfBackend for Writing {
        fn name(&self) -> &str {
            "writer"
        }
        fn convert(&self, job: &PdfJob) -> std::result::Result<(), String> {
            self.calls.set(self.calls.get() + 1);
            std::fs::write(&job.pdf_path, b"%PDF-1.4").map_err(|e| e.to_string())
        }
    }

    fn failing(name: &'static str, calls: &Rc<Cell<usize>>) -> Box<dyn PdfBackend> {
        Box::new(Failing {
            name,
            leave_partial: false,
            calls: calls.clone(),
        })
    }

    #[test]
    fn default_order() {
        let cascade = PdfCascade::default();
        assert_eq!(
            cascade.backend_names(),
            vec!["weasyprint", "wkhtmltopdf", "headless-browser", "pandoc"]
        );
    }

    #[test]
    fn falls_through_to_last_backend() {
        let dir = temp_dir();
        let job = make_job(&dir);
        let calls = Rc::new(Cell::new(0));

        let cascade = PdfCascade::new(vec![
            failing("weasyprint", &calls),
            failing("wkhtmltopdf", &calls),
            failing("headless-browser", &calls),
            Box::new(Writing { calls: calls.clone() }),
        ]);

        let outcome = cascade.run(&job).expect("cascade succeeds");
        assert_eq!(outcome.backend, "writer");
        assert_eq!(outcome.failures.len(), 3);
        assert_eq!(outcome.failures[0].backend, "weasyprint");
        assert_eq!(outcome.failures[2].reason, "headless-browser unavailable");
        assert_eq!(calls.get(), 4);
        assert!(job.pdf_path.is_file());
    }

    #[test]
    fn stops_at_first_success() {
        let dir = temp_dir();
        let job = make_job(&dir);
        let calls = Rc::new(Cell::new(0));

        let cascade = PdfCascade::new(vec![
            Box::new(Writing { calls: calls.clone() }),
            failing("never-called", &calls),
        ]);

        let outcome = cascade.run(&job).unwrap();
        assert!(outcome.failures.is_empty());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn exhausted_removes_partial_pdf() {
        let dir = temp_dir();
        let job = make_job(&dir);
        let calls = Rc::new(Cell::new(0));

        let cascade = PdfCascade::new(vec![
            Box::new(Failing {
                name: "partial",
                leave_partial: true,
                calls: calls.clone(),
            }),
            failing("other", &calls),
        ]);

        let err = cascade.run(&job).unwrap_err();
        match err {
            CvAssistError::ConversionExhausted { attempts } => {
                assert_eq!(attempts.len(), 2);
                assert!(attempts[0].starts_with("partial:"));
            }
            other => panic!("expected ConversionExhausted, got {other:?}"),
        }
        assert!(!job.pdf_path.exists());
        assert!(job.html_path.exists());
        assert!(job.markdown_path.exists());
    }

    #[test]
    fn missing_binaries_exhaust_default_backends() {
        let dir = temp_dir();
        let job = make_job(&dir);
        let missing = "cva-definitely-missing-binary";

        let cascade = PdfCascade::new(vec![
            Box::new(WeasyPrint { program: missing.into() }),
            Box::new(Wkhtmltopdf { program: missing.into() }),
            Box::new(HeadlessBrowser {
                programs: vec![missing.into(), format!("{missing}-2")],
            }),
            Box::new(Pandoc { program: missing.into() }),
        ]);

        let err = cascade.run(&job).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("not found on the system"));
        assert!(msg.contains(&format!("{missing}-2 not found")));
        assert!(!job.pdf_path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn success_without_output_is_failure() {
        let dir = temp_dir();
        let job = make_job(&dir);

        let cascade = PdfCascade::new(vec![Box::new(Pandoc { program: "true".into() })]);
        let err = cascade.run(&job).unwrap_err();
        assert!(err.to_string().contains("wrote no PDF"));
    }

    #[cfg(unix)]
    #[test]
    fn stale_pdf_from_earlier_run_is_not_success() {
        let dir = temp_dir();
        let job = make_job(&dir);
        std::fs::write(&job.pdf_path, b"%PDF-old").unwrap();

        let cascade = PdfCascade::new(vec![Box::new(Pandoc { program: "true".into() })]);
        let failures = cascade.try_run(&job).unwrap_err();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].backend, "pandoc");
        assert_eq!(failures[0].reason, "reported success but wrote no PDF");
        assert!(!job.pdf_path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn browser_falls_back_to_second_program() {
        use std::os::unix::fs::PermissionsExt;

        let dir = temp_dir();
        let job = make_job(&dir);
        let script = dir.join("fake-chrome");
        std::fs::write(
            &script,
            "#!/bin/sh\nfor arg in \"$@\"; do\n  case \"$arg\" in\n    \
             --print-to-pdf=*) echo '%PDF-1.4' > \"${arg#--print-to-pdf=}\" ;;\n  esac\ndone\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let browser = HeadlessBrowser {
            programs: vec![
                "cva-definitely-missing-chromium".into(),
                script.display().to_string(),
            ],
        };
        let outcome = PdfCascade::new(vec![Box::new(browser)]).run(&job).unwrap();
        assert_eq!(outcome.backend, "headless-browser");
        assert!(outcome.failures.is_empty());
        assert!(std::fs::read_to_string(&job.pdf_path).unwrap().starts_with("%PDF"));
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_reports_status() {
        let reason = run_program("false", &[]).unwrap_err();
        assert!(reason.contains("exited with status 1"));
    }
}
