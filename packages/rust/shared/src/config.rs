//! Application configuration for CV Assistant.
//!
//! Config is read from `--config <path>`, then `./cvassist.toml`, then
//! `~/.cvassist/cvassist.toml`. CLI flags override config file values,
//! which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CvAssistError, Result};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "cvassist.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".cvassist";

/// Name of the unified log file inside the logs directory.
pub const LOG_FILE_NAME: &str = "run.log";

// ---------------------------------------------------------------------------
// Config structs (matching cvassist.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory layout.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Generative service settings.
    #[serde(default)]
    pub llm: LlmConfig,
}

/// `[paths]` section. Relative entries resolve against `base_dir`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root that relative paths below are joined onto.
    #[serde(default = "default_base_dir")]
    pub base_dir: String,

    /// Root of the named template directories.
    #[serde(default = "default_templates_dir")]
    pub templates_dir: String,

    /// Where source CVs live.
    #[serde(default = "default_cv_dir")]
    pub cv_dir: String,

    /// Where job descriptions live.
    #[serde(default = "default_job_descriptions_dir")]
    pub job_descriptions_dir: String,

    /// Root of the generated output tree.
    #[serde(default = "default_outputs_dir")]
    pub outputs_dir: String,

    /// Directory holding `run.log` and its rotated backups.
    #[serde(default = "default_logs_dir")]
    pub logs_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            templates_dir: default_templates_dir(),
            cv_dir: default_cv_dir(),
            job_descriptions_dir: default_job_descriptions_dir(),
            outputs_dir: default_outputs_dir(),
            logs_dir: default_logs_dir(),
        }
    }
}

fn default_base_dir() -> String {
    ".".into()
}
fn default_templates_dir() -> String {
    "templates".into()
}
fn default_cv_dir() -> String {
    "inputs/cv".into()
}
fn default_job_descriptions_dir() -> String {
    "inputs/job_descriptions".into()
}
fn default_outputs_dir() -> String {
    "outputs".into()
}
fn default_logs_dir() -> String {
    "logs".into()
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Template directory name (under `templates_dir`) or absolute path.
    #[serde(default = "default_template")]
    pub template: String,

    /// Extension used when picking the most recent job description.
    #[serde(default = "default_jd_extension")]
    pub job_description_extension: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            template: default_template(),
            job_description_extension: default_jd_extension(),
        }
    }
}

fn default_template() -> String {
    "default".into()
}
fn default_jd_extension() -> String {
    ".txt".into()
}

/// `[llm]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Base URL of an OpenAI-compatible chat completions API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for document generation and metadata extraction.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature for document generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Sampling temperature for metadata extraction.
    #[serde(default = "default_extraction_temperature")]
    pub extraction_temperature: f32,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            extraction_temperature: default_extraction_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o".into()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_extraction_temperature() -> f32 {
    0.1
}
fn default_timeout_secs() -> u64 {
    120
}

// ---------------------------------------------------------------------------
// Runtime settings (resolved from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime settings: every directory resolved to a usable path, template
/// override applied.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_dir: PathBuf,
    pub templates_dir: PathBuf,
    pub cv_dir: PathBuf,
    pub job_descriptions_dir: PathBuf,
    pub outputs_dir: PathBuf,
    pub logs_dir: PathBuf,
    /// Template directory name or absolute path.
    pub template: String,
    pub job_description_extension: String,
    pub llm: LlmConfig,
}

impl Settings {
    /// Resolve a config against a working directory.
    pub fn from_config(config: &AppConfig, cwd: &Path) -> Self {
        let base_dir = resolve_path(cwd, &config.paths.base_dir);
        Self {
            templates_dir: resolve_path(&base_dir, &config.paths.templates_dir),
            cv_dir: resolve_path(&base_dir, &config.paths.cv_dir),
            job_descriptions_dir: resolve_path(&base_dir, &config.paths.job_descriptions_dir),
            outputs_dir: resolve_path(&base_dir, &config.paths.outputs_dir),
            logs_dir: resolve_path(&base_dir, &config.paths.logs_dir),
            base_dir,
            template: config.defaults.template.clone(),
            job_description_extension: config.defaults.job_description_extension.clone(),
            llm: config.llm.clone(),
        }
    }

    /// Apply a `--template` override, if any.
    pub fn with_template(mut self, template: Option<&str>) -> Self {
        if let Some(t) = template {
            self.template = t.to_string();
        }
        self
    }

    /// Directory of the selected template: used directly when absolute,
    /// otherwise joined onto `templates_dir`.
    pub fn template_path(&self) -> PathBuf {
        let path = Path::new(&self.template);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.templates_dir.join(&self.template)
        }
    }

    /// Path to a file inside the selected template directory.
    pub fn template_file(&self, filename: &str) -> PathBuf {
        self.template_path().join(filename)
    }

    /// Path to the unified log file.
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir.join(LOG_FILE_NAME)
    }

    /// Create the template, input, output, and log directories.
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [
            &self.templates_dir,
            &self.cv_dir,
            &self.job_descriptions_dir,
            &self.outputs_dir,
            &self.logs_dir,
        ] {
            std::fs::create_dir_all(dir).map_err(|e| CvAssistError::io(dir, e))?;
        }
        Ok(())
    }
}

/// Join `raw` onto `base` unless it is absolute. A leading `~/` expands to
/// the home directory.
fn resolve_path(base: &Path, raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    let path = Path::new(raw);
    if path.is_absolute() {
        path.to_path_buf()
    } else if raw == "." {
        base.to_path_buf()
    } else {
        base.join(path)
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the user config directory (`~/.cvassist/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CvAssistError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the user config file (`~/.cvassist/cvassist.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config.
///
/// An explicit path must exist. Otherwise `./cvassist.toml` wins over the
/// user config file, and defaults are used when neither exists.
pub fn load_config(explicit: Option<&Path>, cwd: &Path) -> Result<AppConfig> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(CvAssistError::config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        return load_config_from(path);
    }

    let local = cwd.join(CONFIG_FILE_NAME);
    if local.exists() {
        return load_config_from(&local);
    }

    if let Ok(path) = config_file_path() {
        if path.exists() {
            return load_config_from(&path);
        }
    }

    tracing::debug!("no config file found, using defaults");
    Ok(AppConfig::default())
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CvAssistError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| CvAssistError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Write a default config file to `path` (or the user config file).
/// Returns the path to the created file.
pub fn init_config(path: Option<&Path>) -> Result<PathBuf> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_file_path()?,
    };
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| CvAssistError::io(dir, e))?;
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| CvAssistError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CvAssistError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the API key env var is set and non-empty.
pub fn validate_api_key(llm: &LlmConfig) -> Result<()> {
    let var_name = &llm.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(()),
        _ => Err(CvAssistError::config(format!(
            "API key not found. Set the {var_name} environment variable."
        ))),
    }
}
