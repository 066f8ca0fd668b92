//! Core workflows for CV Assistant.
//!
//! This crate ties together input resolution, templates, the generative
//! service, metadata extraction, and rendering into the three end-to-end
//! workflows: [`run_cv`], [`run_letter`], and [`run_adapt`].

pub mod adapt;
pub mod cv;
pub mod generator;
pub mod input;
pub mod letter;
pub mod metadata;
pub mod pipeline;
pub mod templates;

#[cfg(test)]
pub(crate) mod testing;

pub use adapt::run_adapt;
pub use cv::run_cv;
pub use letter::run_letter;
pub use pipeline::{
    FAILURE_TARGET, PipelineContext, PipelineOutput, ProgressReporter, SilentProgress, Workspace,
    sanitize_file_name,
};
pub use templates::TemplateStore;
