// src/core/template_engine.rs
//! HTML template registry: built-in layouts plus templates discovered on disk

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::app_log;

const DEFAULT_MAIN_FILE: &str = "template.html";

const CV_SIDEBAR: &str = include_str!("templates/cv_sidebar.html");
const CV_MODERN: &str = include_str!("templates/cv_modern.html");
const COVER_LETTER_CLASSIC: &str = include_str!("templates/cover_letter_classic.html");

// ===== Template Models =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Cv,
    CoverLetter,
}

impl TemplateKind {
    pub fn default_template(self) -> &'static str {
        match self {
            TemplateKind::Cv => "sidebar",
            TemplateKind::CoverLetter => "classic",
        }
    }
}

#[derive(Debug, Clone)]
enum TemplateSource {
    Builtin(&'static str),
    File(PathBuf),
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateInfo {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub kind: TemplateKind,
    pub builtin: bool,
    #[serde(skip)]
    source: TemplateSource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateManifest {
    pub name: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub version: Option<String>,
    pub kind: TemplateKind,
    pub main_file: Option<String>,
}

impl TemplateInfo {
    fn builtin(id: &str, name: &str, kind: TemplateKind, content: &'static str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            kind,
            builtin: true,
            source: TemplateSource::Builtin(content),
        }
    }

    /// Template markup, read from disk for discovered templates
    pub fn content(&self) -> Result<String> {
        match &self.source {
            TemplateSource::Builtin(content) => Ok((*content).to_string()),
            TemplateSource::File(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read template: {}", path.display())),
        }
    }
}

// ===== Main Template Engine =====

pub struct TemplateEngine {
    templates_dir: Option<PathBuf>,
    templates: Vec<TemplateInfo>,
}

impl TemplateEngine {
    /// Built-in templates only
    pub fn builtin() -> Self {
        Self {
            templates_dir: None,
            templates: vec![
                TemplateInfo::builtin("sidebar", "Sidebar", TemplateKind::Cv, CV_SIDEBAR),
                TemplateInfo::builtin("modern", "Modern", TemplateKind::Cv, CV_MODERN),
                TemplateInfo::builtin(
                    "classic",
                    "Classic",
                    TemplateKind::CoverLetter,
                    COVER_LETTER_CLASSIC,
                ),
            ],
        }
    }

    /// Built-in templates plus everything found under `templates_dir`
    pub fn new(templates_dir: PathBuf) -> Result<Self> {
        let mut engine = Self::builtin();
        engine.templates_dir = Some(templates_dir);
        engine.discover_templates()?;
        Ok(engine)
    }

    fn discover_templates(&mut self) -> Result<()> {
        let Some(templates_dir) = self.templates_dir.clone() else {
            return Ok(());
        };

        if !templates_dir.exists() {
            app_log!(
                debug,
                "Templates directory does not exist: {}",
                templates_dir.display()
            );
            return Ok(());
        }

        let entries = std::fs::read_dir(&templates_dir).with_context(|| {
            format!(
                "Failed to read templates directory: {}",
                templates_dir.display()
            )
        })?;

        let mut discovered = 0;
        for entry in entries {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            let Some(template_id) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            match Self::load_template_info(template_id, &path) {
                Ok(Some(template)) => {
                    app_log!(
                        trace,
                        "Loaded template: {} from {}",
                        template.id,
                        path.display()
                    );
                    self.templates
                        .retain(|t| !(t.id == template.id && t.kind == template.kind));
                    self.templates.push(template);
                    discovered += 1;
                }
                Ok(None) => {}
                Err(e) => app_log!(warn, "Failed to load template {}: {}", template_id, e),
            }
        }

        app_log!(info, "Discovered {} templates", discovered);
        Ok(())
    }

    /// Directories without a manifest are not templates
    fn load_template_info(template_id: &str, template_path: &Path) -> Result<Option<TemplateInfo>> {
        let manifest_path = template_path.join("manifest.toml");
        if !manifest_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&manifest_path)
            .with_context(|| format!("Failed to read manifest: {}", manifest_path.display()))?;
        let manifest: TemplateManifest = toml::from_str(&content)
            .with_context(|| format!("Failed to parse manifest: {}", manifest_path.display()))?;

        let main_file = template_path.join(
            manifest
                .main_file
                .as_deref()
                .unwrap_or(DEFAULT_MAIN_FILE),
        );
        if !main_file.is_file() {
            anyhow::bail!("Main file not found: {}", main_file.display());
        }

        Ok(Some(TemplateInfo {
            id: template_id.to_string(),
            name: manifest.name,
            description: manifest.description,
            kind: manifest.kind,
            builtin: false,
            source: TemplateSource::File(main_file),
        }))
    }

    pub fn list_templates(&self, kind: Option<TemplateKind>) -> Vec<&TemplateInfo> {
        self.templates
            .iter()
            .filter(|t| kind.map_or(true, |k| t.kind == k))
            .collect()
    }

    pub fn get_template(&self, template_id: &str, kind: TemplateKind) -> Option<&TemplateInfo> {
        self.templates
            .iter()
            .find(|t| t.id == template_id && t.kind == kind)
    }

    /// Requested template, or the kind's default when missing or unknown
    pub fn resolve(&self, template_id: Option<&str>, kind: TemplateKind) -> Result<&TemplateInfo> {
        if let Some(id) = template_id {
            if let Some(template) = self.get_template(id, kind) {
                return Ok(template);
            }
            app_log!(
                warn,
                "Unknown {:?} template '{}', using default",
                kind,
                id
            );
        }
        self.get_template(kind.default_template(), kind)
            .ok_or_else(|| anyhow::anyhow!("No default template for {:?}", kind))
    }

    pub fn templates_dir(&self) -> Option<&Path> {
        self.templates_dir.as_deref()
    }

    // ===== Variable Processing =====

    /// Replace `{{key}}` placeholders in one pass; unknown placeholders are kept
    pub fn process_variables(content: &str, variables: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(content.len());
        let mut rest = content;

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                result.push_str(&rest[start..]);
                return result;
            };
            match variables.get(after[..end].trim()) {
                Some(value) => result.push_str(value),
                None => result.push_str(&rest[start..start + 2 + end + 2]),
            }
            rest = &after[end + 2..];
        }

        result.push_str(rest);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_variables() {
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Ada".to_string());
        vars.insert("role".to_string(), "Engineer".to_string());

        let out = TemplateEngine::process_variables("{{name}} - {{role}} - {{name}} {{other}}", &vars);
        assert_eq!(out, "Ada - Engineer - Ada {{other}}");
    }

    #[test]
    fn test_builtins_and_fallback() {
        let engine = TemplateEngine::builtin();
        assert_eq!(engine.list_templates(Some(TemplateKind::Cv)).len(), 2);
        assert_eq!(engine.list_templates(None).len(), 3);

        assert_eq!(engine.resolve(Some("modern"), TemplateKind::Cv).unwrap().id, "modern");
        assert_eq!(engine.resolve(Some("missing"), TemplateKind::Cv).unwrap().id, "sidebar");
        assert_eq!(
            engine.resolve(None, TemplateKind::CoverLetter).unwrap().id,
            "classic"
        );
        assert!(engine
            .resolve(None, TemplateKind::Cv)
            .unwrap()
            .content()
            .unwrap()
            .contains("{{experiences}}"));
    }

    #[test]
    fn test_discovered_template_overrides_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let custom = dir.path().join("modern");
        std::fs::create_dir_all(&custom).unwrap();
        std::fs::write(
            custom.join("manifest.toml"),
            "name = \"My Modern\"\nkind = \"cv\"\nmain_file = \"cv.html\"\n",
        )
        .unwrap();
        std::fs::write(custom.join("cv.html"), "<h1>{{name}}</h1>").unwrap();
        std::fs::create_dir_all(dir.path().join("not_a_template")).unwrap();

        let engine = TemplateEngine::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(engine.list_templates(Some(TemplateKind::Cv)).len(), 2);

        let modern = engine.get_template("modern", TemplateKind::Cv).unwrap();
        assert_eq!(modern.name, "My Modern");
        assert!(!modern.builtin);
        assert_eq!(modern.content().unwrap(), "<h1>{{name}}</h1>");
    }
}
