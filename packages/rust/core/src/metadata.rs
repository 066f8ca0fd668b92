//! Candidate and company name extraction.

use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use cvassist_llm::{ChatRequest, GenerativeService};
use cvassist_shared::{ExtractedMetadata, ExtractionSource, LlmConfig, Result, UNKNOWN};

/// Leading characters of each document quoted to the service.
const EXCERPT_CHARS: usize = 1000;

const EXTRACTION_SYSTEM: &str = "You are an expert at extracting specific information from documents.
Your task is to extract the candidate's full name from the CV and the company name from the job description.
Provide ONLY these two pieces of information in JSON format with keys 'candidate_name' and 'company_name'.
If you cannot find the information, use 'Unknown' as the value.";

const EMBEDDED_OBJECT: &str = r#"\{[^{}]*"candidate_name"[^{}]*"company_name"[^{}]*\}"#;

fn excerpt(text: &str) -> &str {
    text.char_indices()
        .nth(EXCERPT_CHARS)
        .map_or(text, |(i, _)| &text[..i])
}

/// Build the extraction request for a CV and a job description.
pub fn extraction_request(cv: &str, job_description: &str, llm: &LlmConfig) -> ChatRequest {
    let task = format!(
        "Extract the candidate name and company name from these documents:\n\n\
         CV:\n```\n{}\n```\n\n\
         Job Description:\n```\n{}\n```\n\n\
         Respond ONLY with the JSON containing 'candidate_name' and 'company_name'.\n",
        excerpt(cv),
        excerpt(job_description),
    );
    ChatRequest {
        system: EXTRACTION_SYSTEM.to_string(),
        task,
        model: llm.model.clone(),
        temperature: llm.extraction_temperature,
    }
}

/// Ask the service for the candidate and company names.
///
/// An unparseable reply degrades to "Unknown" names. A service failure is
/// returned as an error.
#[instrument(skip_all)]
pub fn extract(
    service: &dyn GenerativeService,
    llm: &LlmConfig,
    cv: &str,
    job_description: &str,
) -> Result<ExtractedMetadata> {
    info!("extracting candidate name and company name");
    let reply = service.invoke(&extraction_request(cv, job_description, llm))?;
    let metadata = parse_reply(&reply);
    info!(
        candidate = %metadata.candidate_name,
        company = %metadata.company_name,
        source = ?metadata.source,
        "metadata extracted"
    );
    Ok(metadata)
}

/// Interpret a reply: whole JSON object, then an embedded object, then
/// "Unknown" for both.
pub fn parse_reply(reply: &str) -> ExtractedMetadata {
    if let Some(map) = parse_object(strip_fence(reply)) {
        return from_map(&map, ExtractionSource::WholeReply);
    }

    if let Some(map) = embedded_object(reply) {
        return from_map(&map, ExtractionSource::EmbeddedFragment);
    }

    debug!(reply_len = reply.len(), "no JSON object found in extraction reply");
    ExtractedMetadata::unknown()
}

fn strip_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an info string such as `json` on the opening line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn embedded_object(reply: &str) -> Option<Map<String, Value>> {
    let re = match Regex::new(EMBEDDED_OBJECT) {
        Ok(re) => re,
        Err(e) => {
            debug!(error = %e, "invalid extraction pattern");
            return None;
        }
    };
    let fragment = re.find(reply)?;
    parse_object(fragment.as_str())
}

fn from_map(map: &Map<String, Value>, source: ExtractionSource) -> ExtractedMetadata {
    let field = |key: &str| {
        map.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN)
            .to_string()
    };
    ExtractedMetadata {
        candidate_name: field("candidate_name"),
        company_name: field("company_name"),
        source,
    }
}
