// src/core/settings.rs
//! Persistent user settings: API keys and the selected model provider

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::app_log;
use crate::core::FsOps;
use crate::llm::ModelProvider;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub openai_api_key: String,
    pub gemini_api_key: String,
    pub selected_model: ModelProvider,
}

impl UserSettings {
    pub fn api_key_for(&self, provider: ModelProvider) -> Option<&str> {
        let key = match provider {
            ModelProvider::OpenAi => self.openai_api_key.as_str(),
            ModelProvider::Gemini => self.gemini_api_key.as_str(),
        };
        Some(key.trim()).filter(|k| !k.is_empty())
    }

    pub fn is_ready(&self) -> bool {
        self.api_key_for(self.selected_model).is_some()
    }

    /// Copy with API keys replaced by a short hint, for display
    pub fn masked(&self) -> Self {
        Self {
            openai_api_key: mask_key(&self.openai_api_key),
            gemini_api_key: mask_key(&self.gemini_api_key),
            selected_model: self.selected_model,
        }
    }

    /// Fill empty API keys from `OPENAI_API_KEY` / `GOOGLE_API_KEY` via `lookup`
    fn fill_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.openai_api_key.trim().is_empty() {
            if let Some(key) = lookup("OPENAI_API_KEY") {
                self.openai_api_key = key;
            }
        }
        if self.gemini_api_key.trim().is_empty() {
            if let Some(key) = lookup("GOOGLE_API_KEY") {
                self.gemini_api_key = key;
            }
        }
    }
}

pub fn mask_key(key: &str) -> String {
    let key = key.trim();
    if key.is_empty() {
        return String::new();
    }
    let tail: String = key
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if key.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("****{}", tail)
    }
}

/// TOML-backed settings file.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has_config(&self) -> bool {
        self.path.exists()
    }

    /// Saved settings without environment fallbacks; defaults when nothing is saved
    pub async fn load_saved(&self) -> Result<UserSettings> {
        if !self.has_config() {
            return Ok(UserSettings::default());
        }
        let content = FsOps::read_file_safe(&self.path).await?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings: {}", self.path.display()))
    }

    /// Settings used for model calls: saved values, then `OPENAI_API_KEY` / `GOOGLE_API_KEY`
    pub async fn load(&self) -> Result<UserSettings> {
        self.load_with(|name| std::env::var(name).ok()).await
    }

    async fn load_with<F>(&self, lookup: F) -> Result<UserSettings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = self.load_saved().await?;
        settings.fill_from(lookup);
        Ok(settings)
    }

    pub async fn save(&self, settings: &UserSettings) -> Result<()> {
        let content = toml::to_string(settings).context("Failed to serialize settings")?;
        FsOps::write_file_safe(&self.path, &content).await?;
        app_log!(
            info,
            "Settings saved (model: {})",
            settings.selected_model
        );
        Ok(())
    }

    pub async fn get_value(&self, key: &str) -> Result<Option<String>> {
        let settings = self.load_saved().await?;
        Ok(match key {
            "openai_api_key" => Some(settings.openai_api_key),
            "gemini_api_key" => Some(settings.gemini_api_key),
            "selected_model" => Some(settings.selected_model.to_string()),
            _ => None,
        })
    }

    pub async fn set_value(&self, key: &str, value: &str) -> Result<()> {
        let mut settings = self.load_saved().await?;
        match key {
            "openai_api_key" => settings.openai_api_key = value.to_string(),
            "gemini_api_key" => settings.gemini_api_key = value.to_string(),
            "selected_model" => settings.selected_model = value.parse()?,
            other => anyhow::bail!(
                "Unknown setting '{}'. Use openai_api_key, gemini_api_key or selected_model",
                other
            ),
        }
        self.save(&settings).await
    }

    pub async fn clear(&self) -> Result<bool> {
        let removed = FsOps::remove_file(&self.path).await?;
        if removed {
            app_log!(info, "Settings cleared");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_load_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("config/user_config.toml"));
        assert!(!store.has_config());
        assert_eq!(store.load_saved().await.unwrap(), UserSettings::default());

        let settings = UserSettings {
            openai_api_key: "sk-test-123456789".to_string(),
            gemini_api_key: String::new(),
            selected_model: ModelProvider::OpenAi,
        };
        store.save(&settings).await.unwrap();
        assert!(store.has_config());
        assert_eq!(store.load_saved().await.unwrap(), settings);

        store.set_value("selected_model", "gemini").await.unwrap();
        assert_eq!(
            store.get_value("selected_model").await.unwrap().as_deref(),
            Some("gemini")
        );
        assert!(store.set_value("theme", "dark").await.is_err());

        assert!(store.clear().await.unwrap());
        assert!(!store.has_config());
    }

    fn fake_env(name: &str) -> Option<String> {
        match name {
            "OPENAI_API_KEY" => Some("sk-from-env".to_string()),
            "GOOGLE_API_KEY" => Some("gm-from-env".to_string()),
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_environment_fills_empty_keys_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("user_config.toml"));

        let settings = store.load_with(fake_env).await.unwrap();
        assert_eq!(settings.openai_api_key, "sk-from-env");
        assert_eq!(settings.gemini_api_key, "gm-from-env");

        store
            .save(&UserSettings {
                openai_api_key: "sk-saved-123456".to_string(),
                gemini_api_key: String::new(),
                selected_model: ModelProvider::OpenAi,
            })
            .await
            .unwrap();

        let settings = store.load_with(fake_env).await.unwrap();
        assert_eq!(settings.openai_api_key, "sk-saved-123456");
        assert_eq!(settings.gemini_api_key, "gm-from-env");

        let saved = store.load_saved().await.unwrap();
        assert_eq!(saved.openai_api_key, "sk-saved-123456");
        assert_eq!(saved.gemini_api_key, "");
    }

    #[test]
    fn test_masking_and_readiness() {
        let settings = UserSettings {
            openai_api_key: "sk-abcdefghijkl".to_string(),
            gemini_api_key: "short".to_string(),
            selected_model: ModelProvider::Gemini,
        };
        let masked = settings.masked();
        assert_eq!(masked.openai_api_key, "****ijkl");
        assert_eq!(masked.gemini_api_key, "****");
        assert!(settings.is_ready());

        let empty = UserSettings::default();
        assert!(!empty.is_ready());
        assert_eq!(empty.masked().openai_api_key, "");
    }
}
