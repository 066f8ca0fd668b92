//! Cover letter workflow.

use tracing::{debug, instrument};

use cvassist_shared::{PipelineKind, Result, RunStage};

use crate::generator::{self, LetterDetails, letter_date, letter_prompt, position_title};
use crate::metadata;
use crate::pipeline::{PipelineContext, PipelineOutput, Workspace};

/// Write a cover letter for a job description.
///
/// Names are extracted before generation because the prompt spells them out.
/// Output lands in `<outputs>/<date> <job stem>/letter/` as
/// `"{candidate} - cover letter ({company})"` plus a copy of the job
/// description.
#[instrument(skip_all, fields(cv = ?cv, jd = ?job_description))]
pub fn run_letter(
    ctx: &PipelineContext<'_>,
    cv: Option<&str>,
    job_description: Option<&str>,
) -> Result<PipelineOutput> {
    Workspace::new(ctx, PipelineKind::Letter).run(|ws| {
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
        let names = metadata::extract(ctx.service, &ctx.settings.llm, &cv.text, &job.text)?;
        let details = LetterDetails {
            candidate_name: names.candidate_name.clone(),
            company_name: names.company_name.clone(),
            position_title: position_title(&job.text),
            current_date: letter_date(ctx.now),
        };
        debug!(position = %details.position_title, date = %details.current_date, "letter details");
        let prompt = letter_prompt(&cv.text, &template, &job.text, &details);
        let letter = generator::generate(ctx.service, &ctx.settings.llm, prompt)?;

        ws.stage(RunStage::Rendering);
        let base = format!(
            "{} - cover letter ({})",
            names.candidate_name, names.company_name
        );
        let rendered = ws.save(&letter, &dir, &base, &template, false)?;
        let copied = ws.copy_job_description(&job, &dir)?;

        Ok(PipelineOutput::new(dir, rendered, Some(copied), names))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::SilentProgress;
    use crate::testing::*;
    use cvassist_shared::CvAssistError;

    #[test]
    fn writes_letter_with_extracted_names() {
        let fx = Fixture::new();
        let service = FakeService::default();
        let renderer = pdf_renderer();
        let ctx = PipelineContext::new(&fx.settings, &service, &renderer, &SilentProgress);

        let out = run_letter(&ctx, None, None).expect("letter run");

        let today = ctx.now.format("%Y-%m-%d").to_string();
        let dir = fx.path(&format!("outputs/{today} test_job/letter"));
        assert_eq!(
            out.artifacts.markdown,
            dir.join("Jane Smith - cover letter (Acme Corp).md")
        );
        assert!(dir.join("test_job.txt").is_file());

        let requests = service.requests();
        assert_eq!(requests.len(), 2);
        assert!(FakeService::is_extraction(&requests[0]), "names come first");

        let prompt = &requests[1];
        assert!(prompt.system.contains("- Candidate's Name: Jane Smith"));
        assert!(prompt.system.contains("- Company Name: Acme Corp"));
        assert!(prompt.system.contains("- Position Title: QA Engineer"));
        assert!(prompt.system.contains(&letter_date(ctx.now)));
        assert!(prompt.system.contains("Dear [Hiring Manager's Name]"));
        assert!(prompt.task.ends_with(JOB_TEXT));
    }

    #[test]
    fn missing_job_description_names_directory() {
        let fx = Fixture::new();
        let service = FakeService::default();
        let renderer = pdf_renderer();
        let ctx = PipelineContext::new(&fx.settings, &service, &renderer, &SilentProgress);

        let err = run_letter(&ctx, None, Some("nonexistent.txt")).unwrap_err();
        assert!(matches!(err, CvAssistError::NotFound { .. }));
        let msg = err.to_string();
        assert!(msg.contains("nonexistent.txt"));
        assert!(msg.contains(&fx.settings.job_descriptions_dir.display().to_string()));
        assert!(service.requests().is_empty());
    }
}
