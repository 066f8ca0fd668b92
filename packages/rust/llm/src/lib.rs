//! Generative text service boundary.
//!
//! The pipelines only depend on [`GenerativeService`]: one system message and
//! one task message in, free text out. [`OpenAiService`] implements it over an
//! OpenAI-compatible chat completions endpoint.

mod openai;

pub use openai::OpenAiService;

use cvassist_shared::Result;

/// A single two-message exchange with the generative service.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// System message: documents, template, and task rules.
    pub system: String,
    /// Task message: the workflow-specific payload.
    pub task: String,
    /// Model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
}

/// Capability to turn a [`ChatRequest`] into response text.
///
/// Implementations make exactly one attempt per call and report transport or
/// service failures as [`cvassist_shared::CvAssistError::Service`].
pub trait GenerativeService {
    fn invoke(&self, request: &ChatRequest) -> Result<String>;
}

impl<T: GenerativeService + ?Sized> GenerativeService for &T {
    fn invoke(&self, request: &ChatRequest) -> Result<String> {
        (**self).invoke(request)
    }
}

impl<T: GenerativeService + ?Sized> GenerativeService for Box<T> {
    fn invoke(&self, request: &ChatRequest) -> Result<String> {
        (**self).invoke(request)
    }
}
