//! Shared types, error model, and configuration for CV Assistant.
//!
//! This crate is the foundation depended on by all other CV Assistant crates.
//! It provides:
//! - [`CvAssistError`], the unified error type
//! - Domain types ([`SourceDocument`], [`Template`], [`ExtractedMetadata`], [`OutputArtifactSet`])
//! - Configuration ([`AppConfig`], [`Settings`], config loading)
//! - UTF-8 file helpers ([`fs::read_text`], [`fs::write_text`])

pub mod config;
pub mod error;
pub mod fs;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CONFIG_FILE_NAME, DefaultsConfig, LOG_FILE_NAME, LlmConfig, PathsConfig, Settings,
    config_dir, config_file_path, init_config, load_config, load_config_from, validate_api_key,
};
pub use error::{CvAssistError, Result};
pub use types::{
    ExtractedMetadata, ExtractionSource, OutputArtifactSet, PipelineKind, RunStage,
    SourceDocument, Template, UNKNOWN,
};
