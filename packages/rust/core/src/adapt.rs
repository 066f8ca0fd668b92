//! CV template adaptation workflow.

use tracing::{debug, instrument};

use cvassist_shared::{ExtractedMetadata, ExtractionSource, PipelineKind, Result, RunStage, UNKNOWN};

use crate::generator::{self, adapt_prompt};
use crate::pipeline::{PipelineContext, PipelineOutput, Workspace, heading_name};

/// Move a CV onto the selected template without changing its content.
///
/// The candidate name comes from a `#` heading on the CV's first line; no
/// extraction call is made. Output lands in `<outputs>/<date> <cv stem>/adopt/`.
/// Unlike the other workflows a failed PDF conversion fails the run.
#[instrument(skip_all, fields(source = %source))]
pub fn run_adapt(ctx: &PipelineContext<'_>, source: &str) -> Result<PipelineOutput> {
    Workspace::new(ctx, PipelineKind::Adapt).run(|ws| {
        let cv = ws.load_cv(Some(source))?;
        let template = ws.load_template()?;
        debug!(cv = %cv.file_name(), template = %template.name, "inputs resolved");

        let cv_name = cv.stem();
        let dir = ws.output_dir(&cv_name)?;

        let mut names = ExtractedMetadata::unknown();
        if let Some(candidate) = heading_name(&cv.text) {
            debug!(%candidate, "candidate name from heading");
            names.candidate_name = candidate;
            names.source = ExtractionSource::Heading;
        }

        ws.stage(RunStage::Generating);
        let adapted = generator::generate(
            ctx.service,
            &ctx.settings.llm,
            adapt_prompt(&cv.text, &template),
        )?;

        ws.stage(RunStage::Rendering);
        let base = if names.candidate_name == UNKNOWN {
            format!("Adapted CV - {cv_name}")
        } else {
            format!("{} - adapted CV ({})", names.candidate_name, template.name)
        };
        let rendered = ws.save(&adapted, &dir, &base, &template, true)?;

        Ok(PipelineOutput::new(dir, rendered, None, names))
    })
}
