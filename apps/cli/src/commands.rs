//! CLI command definitions and routing.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use cvassist_core::{
    PipelineContext, PipelineOutput, ProgressReporter, run_adapt, run_cv, run_letter,
};
use cvassist_llm::OpenAiService;
use cvassist_render::Renderer;
use cvassist_shared::{
    PipelineKind, RunStage, Settings, init_config, load_config, validate_api_key,
};

use crate::logging;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// CV Assistant: tailor CVs and cover letters to job descriptions.
#[derive(Parser)]
#[command(
    name = "cvassist",
    version,
    about = "Tailor CVs and cover letters to job descriptions with an LLM, rendered to Markdown, HTML, and PDF.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ./cvassist.toml, then ~/.cvassist/cvassist.toml).
    #[arg(long, global = true, env = "CVASSIST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log file format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity of the log file (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Inputs shared by the CV and letter workflows.
#[derive(Args, Debug)]
pub(crate) struct JobArgs {
    /// CV file (defaults to the most recent file in the CV directory).
    #[arg(long)]
    pub cv: Option<String>,

    /// Job description file (defaults to the most recent one).
    #[arg(long)]
    pub jd: Option<String>,

    /// Template directory name or absolute path.
    #[arg(long)]
    pub template: Option<String>,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Tailor a CV to a job description.
    Cv(JobArgs),

    /// Write a cover letter for a job description.
    Letter(JobArgs),

    /// Move a CV onto a different template without changing its content.
    Adopt {
        /// Source CV file.
        #[arg(long)]
        source: String,

        /// Template directory name or absolute path.
        #[arg(long)]
        template: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

/// Flags that apply to every workflow.
struct GlobalOpts {
    config: Option<PathBuf>,
    log_format: LogFormat,
    verbose: u8,
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<ExitCode> {
    let Cli {
        config,
        log_format,
        verbose,
        command,
    } = cli;
    let opts = GlobalOpts {
        config,
        log_format,
        verbose,
    };
    let cwd = std::env::current_dir()?;

    match command {
        Command::Cv(args) => {
            run_workflow(&opts, &cwd, PipelineKind::Cv, args.template.as_deref(), |ctx| {
                run_cv(ctx, args.cv.as_deref(), args.jd.as_deref())
            })
        }
        Command::Letter(args) => {
            run_workflow(&opts, &cwd, PipelineKind::Letter, args.template.as_deref(), |ctx| {
                run_letter(ctx, args.cv.as_deref(), args.jd.as_deref())
            })
        }
        Command::Adopt { source, template } => {
            run_workflow(&opts, &cwd, PipelineKind::Adapt, template.as_deref(), |ctx| {
                run_adapt(ctx, &source)
            })
        }
        Command::Config { action } => {
            match action {
                ConfigAction::Init => cmd_config_init(opts.config.as_deref())?,
                ConfigAction::Show => cmd_config_show(opts.config.as_deref(), &cwd)?,
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Load settings, start logging, and run one workflow.
///
/// Workflow failures print the error (with the log file pointer) once and
/// exit with status 1; setup failures propagate as reports.
fn run_workflow(
    opts: &GlobalOpts,
    cwd: &Path,
    kind: PipelineKind,
    template: Option<&str>,
    workflow: impl FnOnce(&PipelineContext<'_>) -> cvassist_shared::Result<PipelineOutput>,
) -> Result<ExitCode> {
    let app_config = load_config(opts.config.as_deref(), cwd)?;
    let settings = Settings::from_config(&app_config, cwd).with_template(template);
    settings.ensure_directories()?;

    let log = logging::init(&settings.log_file(), opts.verbose, opts.log_format)?;
    info!(
        pipeline = %kind,
        template = %settings.template,
        model = %settings.llm.model,
        "starting {}",
        kind.description()
    );

    validate_api_key(&settings.llm)?;
    let service = OpenAiService::from_config(&settings.llm)?;
    let renderer = Renderer::default();
    let progress = CliProgress::new();

    let mut ctx = PipelineContext::new(&settings, &service, &renderer, &progress);
    ctx.log_file = log.path().to_path_buf();

    match workflow(&ctx) {
        Ok(output) => {
            println!("✓ {} completed successfully", capitalize(kind.description()));
            println!("✓ Output: {}", output.output_dir.display());
            if output.artifacts.pdf.is_none() {
                println!(
                    "! PDF not generated; Markdown and HTML are available. See {}",
                    log.path().display()
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("Error: {err}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&[
                    "⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏",
                ]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn stage(&self, kind: PipelineKind, stage: RunStage) {
        match stage {
            RunStage::Loading => self
                .spinner
                .set_message(format!("Running {}: loading inputs", kind.description())),
            RunStage::Generating => self.spinner.set_message("Generating with the LLM"),
            RunStage::Rendering => self.spinner.set_message("Rendering Markdown, HTML, and PDF"),
            RunStage::Done | RunStage::Failed => self.spinner.finish_and_clear(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

fn cmd_config_init(path: Option<&Path>) -> Result<()> {
    let path = init_config(path)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>, cwd: &Path) -> Result<()> {
    let config = load_config(path, cwd)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
