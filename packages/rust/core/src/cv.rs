//! CV tailoring workflow.

use tracing::{debug, instrument};

use cvassist_shared::{PipelineKind, Result, RunStage};

use crate::generator::{self, cv_prompt};
use crate::metadata;
use crate::pipeline::{PipelineContext, PipelineOutput, Workspace};

/// Tailor a CV to a job description.
///
/// Both inputs fall back to the most recent file in their directory. Output
/// lands in `<outputs>/<date> <job stem>/cv/` as
/// `"{candidate} - cv ({company})"` plus a copy of the job description.
#[instrument(skip_all, fields(cv = ?cv, jd = ?job_description))]
pub fn run_cv(
    ctx: &PipelineContext<'_>,
    cv: Option<&str>,
    job_description: Option<&str>,
) -> Result<PipelineOutput> {
    Workspace::new(ctx, PipelineKind::Cv).run(|ws| {
        let cv = ws.load_cv(cv)?;
        let job = ws.load_job_description(job_description)?;
        let template = ws.load_template()?;
        debug!(
            cv = %cv.file_name(),
            job = %job.file_name(),
            template = %template.name,
            "inputs resolved"
        );

        let dir = ws.output_dir(&job.stem())?;

        ws.stage(RunStage::Generating);
        let prompt = cv_prompt(&cv.text, &template, &job.text);
        let tailored = generator::generate(ctx.service, &ctx.settings.llm, prompt)?;
        let names = metadata::extract(ctx.service, &ctx.settings.llm, &cv.text, &job.text)?;

        ws.stage(RunStage::Rendering);
        let base = format!("{} - cv ({})", names.candidate_name, names.company_name);
        let rendered = ws.save(&tailored, &dir, &base, &template, false)?;
        let copied = ws.copy_job_description(&job, &dir)?;

        Ok(PipelineOutput::new(dir, rendered, Some(copied), names))
    })
}
