// src/core/config_manager.rs
//! Paths and external service settings, from `config.yaml` and the environment

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::app_log;
use crate::core::FsOps;

const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone)]
pub struct ConfigManager {
    pub environment: EnvironmentConfig,
    pub service: ServiceConfig,
    pub renderer: RendererConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentConfig {
    pub output_path: PathBuf,
    pub templates_path: PathBuf,
    pub database_path: PathBuf,
}

/// Hosted language model endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub openai_base_url: String,
    pub gemini_base_url: String,
    pub openai_model: String,
    pub gemini_model: String,
    pub timeout_seconds: u64,
}

/// External commands used for document conversion.
#[derive(Debug, Clone, Deserialize)]
pub struct RendererConfig {
    pub pdf_command: String,
    pub markdown_command: String,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    local: Option<EnvironmentConfig>,
    production: Option<EnvironmentConfig>,
    service: Option<ServiceConfig>,
    renderer: Option<RendererConfig>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            openai_base_url: "https://api.openai.com/v1".to_string(),
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            openai_model: "gpt-4.1".to_string(),
            gemini_model: "gemini-2.0-flash".to_string(),
            timeout_seconds: 300,
        }
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            pdf_command: "weasyprint".to_string(),
            markdown_command: "markitdown".to_string(),
        }
    }
}

impl EnvironmentConfig {
    fn defaults_for(base_dir: &Path) -> Self {
        Self {
            output_path: base_dir.join("output"),
            templates_path: base_dir.join("templates"),
            database_path: base_dir.join("cv_submissions.db"),
        }
    }

    fn resolve_against(self, base_dir: &Path) -> Self {
        let resolve = |path: PathBuf| {
            if path.is_absolute() {
                path
            } else {
                base_dir.join(path)
            }
        };
        Self {
            output_path: resolve(self.output_path),
            templates_path: resolve(self.templates_path),
            database_path: resolve(self.database_path),
        }
    }

    pub fn uploads_path(&self) -> PathBuf {
        self.output_path.join("uploaded_files")
    }

    pub fn settings_path(&self) -> PathBuf {
        self.output_path.join("config").join("user_config.toml")
    }
}

impl ConfigManager {
    /// Load configuration for the current `ENVIRONMENT` (local by default)
    pub fn load() -> Result<Self> {
        let base_dir = std::env::current_dir().context("Failed to get current directory")?;
        Self::load_from(&base_dir)
    }

    pub fn load_from(base_dir: &Path) -> Result<Self> {
        Self::load_for(base_dir, &Self::environment_name())
    }

    fn load_for(base_dir: &Path, environment_name: &str) -> Result<Self> {
        app_log!(
            info,
            "Loading configuration for environment: {}",
            environment_name
        );

        let config_path = base_dir.join(CONFIG_FILE);
        let file = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            let parsed: ConfigFile = serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?;
            Some(parsed)
        } else {
            app_log!(debug, "No {} found, using defaults", CONFIG_FILE);
            None
        };

        let (environment, service, renderer) = match file {
            Some(file) => {
                let environment = match environment_name {
                    "production" => file.production,
                    _ => file.local,
                };
                (
                    environment,
                    file.service.unwrap_or_default(),
                    file.renderer.unwrap_or_default(),
                )
            }
            None => (None, ServiceConfig::default(), RendererConfig::default()),
        };

        let environment = environment
            .map(|env| env.resolve_against(base_dir))
            .unwrap_or_else(|| EnvironmentConfig::defaults_for(base_dir));

        let mut config = Self {
            environment,
            service,
            renderer,
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn environment_name() -> String {
        std::env::var("CV_TAILOR_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "local".to_string())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
            self.service.openai_base_url = url;
        }
        if let Ok(url) = std::env::var("GEMINI_BASE_URL") {
            self.service.gemini_base_url = url;
        }
        if let Ok(command) = std::env::var("PDF_RENDERER") {
            self.renderer.pdf_command = command;
        }
        if let Ok(command) = std::env::var("MARKDOWN_CONVERTER") {
            self.renderer.markdown_command = command;
        }
    }

    /// Ensure all required directories exist
    pub async fn ensure_directories(&self) -> Result<()> {
        FsOps::ensure_dir_exists(&self.environment.output_path).await?;
        FsOps::ensure_dir_exists(&self.environment.uploads_path()).await?;

        if let Some(db_parent) = self.environment.database_path.parent() {
            FsOps::ensure_dir_exists(db_parent).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigManager::load_for(dir.path(), "local").unwrap();

        assert_eq!(config.environment.output_path, dir.path().join("output"));
        assert_eq!(
            config.environment.settings_path(),
            dir.path().join("output/config/user_config.toml")
        );
        assert_eq!(config.service.openai_model, "gpt-4.1");
    }

    #[test]
    fn test_config_file_paths_are_resolved() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"
local:
  output_path: data/out
  templates_path: /srv/templates
  database_path: data/app.db
renderer:
  pdf_command: wkhtmltopdf
  markdown_command: markitdown
"#,
        )
        .unwrap();

        let config = ConfigManager::load_for(dir.path(), "local").unwrap();
        assert_eq!(config.environment.output_path, dir.path().join("data/out"));
        assert_eq!(
            config.environment.templates_path,
            PathBuf::from("/srv/templates")
        );
        assert!(!config.renderer.pdf_command.is_empty());
    }
}
