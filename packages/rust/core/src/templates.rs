//! Template directory access.

use std::path::PathBuf;

use tracing::{debug, info, warn};

use cvassist_shared::fs::read_text;
use cvassist_shared::{CvAssistError, PipelineKind, Result, Settings, Template};

/// Generic stylesheet used when a workflow-specific one is absent.
pub const FALLBACK_STYLESHEET: &str = "style.css";

/// Read-only view of one template directory.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    name: String,
    dir: PathBuf,
}

impl TemplateStore {
    /// Store for the template selected in `settings`.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            name: settings.template.clone(),
            dir: settings.template_path(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    pub fn exists(&self, filename: &str) -> bool {
        self.dir.join(filename).is_file()
    }

    /// Load a mandatory template file.
    pub fn load(&self, filename: &str) -> Result<String> {
        let path = self.dir.join(filename);
        if !path.is_file() {
            return Err(CvAssistError::not_found(format!(
                "Template file not found: {}",
                path.display()
            )));
        }
        info!(path = %path.display(), "using template");
        read_text(&path)
    }

    /// Load an optional companion file; `None` when absent.
    pub fn load_optional(&self, filename: &str) -> Result<Option<String>> {
        if !self.exists(filename) {
            debug!(file = filename, dir = %self.dir.display(), "optional template file absent");
            return Ok(None);
        }
        self.load(filename).map(Some)
    }

    /// Body, instructions, and stylesheet for one workflow.
    pub fn load_bundle(&self, kind: PipelineKind) -> Result<Template> {
        let body = self.load(kind.template_file())?;
        let instructions = self
            .load_optional(kind.instructions_file())?
            .unwrap_or_default();

        let stylesheet = match self.load_optional(kind.stylesheet_file())? {
            Some(css) => Some(css),
            None => {
                let fallback = self.load_optional(FALLBACK_STYLESHEET)?;
                if fallback.is_none() {
                    warn!(
                        file = kind.stylesheet_file(),
                        dir = %self.dir.display(),
                        "stylesheet not found; HTML will be unstyled"
                    );
                }
                fallback
            }
        };

        Ok(Template {
            name: self.name.clone(),
            body,
            instructions,
            stylesheet,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cva-tpl-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn store(dir: &Path) -> TemplateStore {
        TemplateStore {
            name: "default".into(),
            dir: dir.to_path_buf(),
        }
    }

    #[test]
    fn store_resolves_relative_and_absolute_names() {
        let root = temp_dir();
        let mut settings = Settings::from_config(&Default::default(), &root);
        settings.templates_dir = root.join("templates");

        let relative =
            TemplateStore::from_settings(&settings.clone().with_template(Some("modern")));
        assert_eq!(relative.dir(), root.join("templates").join("modern"));
        assert_eq!(relative.name(), "modern");

        let abs = root.join("elsewhere");
        let absolute = TemplateStore::from_settings(&settings.with_template(abs.to_str()));
        assert_eq!(absolute.dir(), abs);
    }

    #[test]
    fn missing_mandatory_template_names_full_path() {
        let dir = temp_dir();
        let err = store(&dir).load("cv_template.md").unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains(&dir.join("cv_template.md").display().to_string()));
    }

    #[test]
    fn optional_files_degrade() {
        let dir = temp_dir();
        std::fs::write(dir.join("cv_template.md"), "# {{name}}").unwrap();

        let bundle = store(&dir).load_bundle(PipelineKind::Cv).unwrap();
        assert_eq!(bundle.body, "# {{name}}");
        assert_eq!(bundle.instructions, "");
        assert!(bundle.stylesheet.is_none());
        assert_eq!(bundle.name, "default");
    }

    #[test]
    fn workflow_stylesheet_wins_over_generic() {
        let dir = temp_dir();
        std::fs::write(dir.join("letter_template.md"), "Dear [Hiring Manager's Name]").unwrap();
        std::fs::write(dir.join("letter_instructions.md"), "Be brief.").unwrap();
        std::fs::write(dir.join("letter_style.css"), "p { margin: 0; }").unwrap();
        std::fs::write(dir.join("style.css"), "body {}").unwrap();

        let bundle = store(&dir).load_bundle(PipelineKind::Letter).unwrap();
        assert_eq!(bundle.instructions, "Be brief.");
        assert_eq!(bundle.stylesheet.as_deref(), Some("p { margin: 0; }"));
    }

    #[test]
    fn generic_stylesheet_fallback() {
        let dir = temp_dir();
        std::fs::write(dir.join("cv_template.md"), "tpl").unwrap();
        std::fs::write(dir.join("style.css"), "body {}").unwrap();

        let bundle = store(&dir).load_bundle(PipelineKind::Adapt).unwrap();
        assert_eq!(bundle.stylesheet.as_deref(), Some("body {}"));
    }
}
