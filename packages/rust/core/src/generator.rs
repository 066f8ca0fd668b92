//! Prompt assembly and document generation.
//!
//! Every workflow sends two messages: a system message that embeds the
//! source CV, the template, the writing instructions, and numbered task
//! rules; and a short task message carrying the workflow payload. The
//! response text is returned as-is.

use chrono::{DateTime, Local};
use tracing::{debug, info, instrument};

use cvassist_llm::{ChatRequest, GenerativeService};
use cvassist_shared::{LlmConfig, Result, Template};

/// Used when the job description has no early Markdown heading.
pub const DEFAULT_POSITION_TITLE: &str = "the position";

/// How far into the job description a `# ` heading is looked for.
const POSITION_SCAN_CHARS: usize = 200;

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

/// System and task messages for one generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub task: String,
}

/// Names and dates the cover letter prompt spells out.
#[derive(Debug, Clone)]
pub struct LetterDetails {
    pub candidate_name: String,
    pub company_name: String,
    pub position_title: String,
    pub current_date: String,
}

const CV_EXPERT: &str = "You are expert in writing CVs and you excel in this.";
const LETTER_EXPERT: &str =
    "You are an expert in writing professional Cover Letters and you excel in this.";

fn fenced(label: &str, body: &str) -> String {
    format!("{label}\n```\n{body}\n```\n")
}

fn documents(
    cv: &str,
    template: &Template,
    source_label: &str,
    template_label: &str,
    kind: &str,
) -> String {
    [
        fenced(source_label, cv),
        fenced(template_label, &template.body),
        fenced(&format!("Follow these instructions for {kind} writing:"), &template.instructions),
    ]
    .join("\n")
}

fn rules(items: &[&str]) -> String {
    let mut out = String::from("# Task:\n");
    for (i, item) in items.iter().enumerate() {
        out.push_str(&format!("{}. {item}\n", i + 1));
    }
    out
}

/// Prompt for tailoring a CV to a job description.
pub fn cv_prompt(cv: &str, template: &Template, job_description: &str) -> Prompt {
    let system = format!(
        "{CV_EXPERT}\n\n{}\n{}",
        documents(cv, template, "Read the source cv:", "Read the template:", "CV"),
        rules(&[
            "Strictly using the template, rewrite the CV using the template format.",
            "Using the important keywords and phrases from the job description, tailor the rewritten CV so it would best match the job description.",
            "You are allowed to tune the expression of the source CV data so it would best match the job description, but do not add items which are not derived as facts from the original CV.",
            "Do not mention the company name from the job description into the CV.",
            "Generate Tailored complete CV and nothing else.",
        ]),
    );
    Prompt {
        system,
        task: format!(
            "# Task: Generate tailored CV and nothing else.\n\nJob Description:\n\n{job_description}"
        ),
    }
}

/// Prompt for a cover letter.
pub fn letter_prompt(
    cv: &str,
    template: &Template,
    job_description: &str,
    details: &LetterDetails,
) -> Prompt {
    let LetterDetails {
        candidate_name,
        company_name,
        position_title,
        current_date,
    } = details;

    let info = format!(
        "# Important Information to Include:\n\
         - Candidate's Name: {candidate_name}\n\
         - Company Name: {company_name}\n\
         - Position Title: {position_title}\n\
         - Current Date: {current_date}\n"
    );
    let placeholders = format!(
        "# Template Placeholders to Replace:\n\
         - Replace [Current Date] with {current_date}\n\
         - Replace [Hiring Manager's Name] with an appropriate greeting if the name is unknown\n\
         - Replace [Company Name] with {company_name}\n\
         - Replace [Position Title] with {position_title}\n\
         - Replace [Your Full Name] with {candidate_name}\n\
         - Replace other placeholders with appropriate content based on the CV and job description\n"
    );

    let system = format!(
        "{LETTER_EXPERT}\n\n{}\n{info}\n{placeholders}\n{}",
        documents(
            cv,
            template,
            "Read the source CV:",
            "Read the cover letter template:",
            "Cover Letter",
        ),
        rules(&[
            "Strictly follow the provided cover letter template format.",
            "Replace ALL placeholders with actual content - do not leave any [bracketed placeholders] in the final letter.",
            "Use the important keywords and phrases from the job description to tailor the cover letter.",
            "Highlight relevant skills and experiences from the CV that match the job requirements.",
            "Maintain a professional tone and ensure the letter is concise (no more than one page).",
            "Generate a tailored cover letter and nothing else.",
        ]),
    );
    Prompt {
        system,
        task: format!(
            "# Task: Generate a tailored cover letter and nothing else.\n\nJob Description:\n\n{job_description}"
        ),
    }
}

/// Prompt for moving a CV onto a different template without changing content.
pub fn adapt_prompt(cv: &str, template: &Template) -> Prompt {
    let system = format!(
        "{CV_EXPERT}\n\n{}\n{}",
        documents(cv, template, "Read the source cv:", "Read the template:", "CV"),
        rules(&[
            "Strictly using the template, rewrite the CV using the template format.",
            "Do not change any content from the source CV, just adapt it to the new template.",
            "Generate adapted CV and nothing else.",
        ]),
    );
    Prompt {
        system,
        task: "# Task: Generate adapted CV and nothing else.".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Letter helpers
// ---------------------------------------------------------------------------

/// Job title taken from an early `# ` heading, or [`DEFAULT_POSITION_TITLE`].
///
/// Only a heading marker within the first 200 characters counts. The title
/// is the rest of that line after the first `# `.
pub fn position_title(job_description: &str) -> String {
    let head_end = job_description
        .char_indices()
        .nth(POSITION_SCAN_CHARS)
        .map_or(job_description.len(), |(i, _)| i);
    if !job_description[..head_end].contains("# ") {
        return DEFAULT_POSITION_TITLE.to_string();
    }

    job_description
        .split_once("# ")
        .map(|(_, rest)| rest.lines().next().unwrap_or("").trim().to_string())
        .unwrap_or_else(|| DEFAULT_POSITION_TITLE.to_string())
}

/// Long-form date for letters, e.g. `March 05, 2025`.
pub fn letter_date(now: DateTime<Local>) -> String {
    now.format("%B %d, %Y").to_string()
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Send `prompt` to the service with the configured model and temperature.
///
/// Exactly one attempt; service errors propagate unchanged.
#[instrument(skip_all, fields(model = %llm.model))]
pub fn generate(
    service: &dyn GenerativeService,
    llm: &LlmConfig,
    prompt: Prompt,
) -> Result<String> {
    let request = ChatRequest {
        system: prompt.system,
        task: prompt.task,
        model: llm.model.clone(),
        temperature: llm.temperature,
    };
    debug!(
        system_chars = request.system.len(),
        task_chars = request.task.len(),
        "calling generative service"
    );
    let text = service.invoke(&request)?;
    info!(chars = text.chars().count(), "document generated");
    Ok(text)
}
