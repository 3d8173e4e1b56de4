// src/core/file_store.rs
//! Uploaded CV files and the saved portfolio

use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::app_log;
use crate::core::FsOps;
use crate::types::Curriculum;

pub const PORTFOLIO_FILE: &str = "structured_cv.json";
pub const MARKDOWN_FILE: &str = "user_curriculum.md";
pub const PORTFOLIO_DATA_FILES: [&str; 2] = [PORTFOLIO_FILE, MARKDOWN_FILE];

#[derive(Debug, Clone, Serialize)]
pub struct StoredFile {
    pub filename: String,
    pub original_name: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
    #[serde(skip)]
    pub path: PathBuf,
}

pub struct FileManager {
    output_dir: PathBuf,
    uploads_dir: PathBuf,
}

impl FileManager {
    pub fn new(output_dir: PathBuf) -> Self {
        let uploads_dir = output_dir.join("uploaded_files");
        Self {
            output_dir,
            uploads_dir,
        }
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    pub fn portfolio_path(&self) -> PathBuf {
        self.output_dir.join(PORTFOLIO_FILE)
    }

    pub fn markdown_path(&self) -> PathBuf {
        self.output_dir.join(MARKDOWN_FILE)
    }

    // ===== Uploaded files =====

    /// Store an upload as `<timestamp>_<original name>`; returns (path, stored name)
    pub async fn save_uploaded_file(
        &self,
        content: &[u8],
        original_filename: &str,
    ) -> Result<(PathBuf, String)> {
        let safe_original = crate::utils::safe_file_name(original_filename);
        let stored_name = format!("{}_{}", Local::now().format("%Y%m%d_%H%M%S"), safe_original);
        let path = self.uploads_dir.join(&stored_name);

        FsOps::write_bytes(&path, content).await?;
        app_log!(info, "Stored uploaded file: {}", stored_name);
        Ok((path, stored_name))
    }

    /// Uploaded files, newest first
    pub async fn get_uploaded_files(&self) -> Result<Vec<StoredFile>> {
        let mut files = Vec::new();
        if !self.uploads_dir.exists() {
            return Ok(files);
        }

        let mut entries = tokio::fs::read_dir(&self.uploads_dir)
            .await
            .with_context(|| format!("Failed to read {}", self.uploads_dir.display()))?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let Some(filename) = path.file_name().and_then(|n| n.to_str()).map(String::from)
            else {
                continue;
            };
            files.push(stored_file(filename.clone(), original_name(&filename), path, &metadata));
        }

        files.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(files)
    }

    fn uploaded_path(&self, filename: &str) -> Result<PathBuf> {
        if filename.is_empty() || filename.contains('/') || filename.contains('\\') || filename.contains("..") {
            anyhow::bail!("Invalid file name: {}", filename);
        }
        Ok(self.uploads_dir.join(filename))
    }

    /// Contents of an uploaded file, `None` when it does not exist
    pub async fn read_uploaded_file(&self, filename: &str) -> Result<Option<Vec<u8>>> {
        read_if_exists(&self.uploaded_path(filename)?).await
    }

    pub async fn delete_uploaded_file(&self, filename: &str) -> Result<bool> {
        FsOps::remove_file(&self.uploaded_path(filename)?).await
    }

    // ===== Portfolio =====

    pub async fn save_portfolio_data(&self, portfolio: &Curriculum) -> Result<PathBuf> {
        let path = self.portfolio_path();
        let content =
            serde_json::to_string_pretty(portfolio).context("Failed to serialize portfolio")?;
        FsOps::write_file_safe(&path, &content).await?;
        app_log!(info, "Portfolio saved: {}", path.display());
        Ok(path)
    }

    pub async fn load_portfolio_data(&self) -> Result<Option<Curriculum>> {
        let path = self.portfolio_path();
        if !path.exists() {
            return Ok(None);
        }
        let content = FsOps::read_file_safe(&path).await?;
        let portfolio = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse portfolio: {}", path.display()))?;
        Ok(Some(portfolio))
    }

    pub fn has_portfolio_data(&self) -> bool {
        self.portfolio_path().exists()
    }

    pub async fn save_markdown(&self, markdown: &str) -> Result<()> {
        FsOps::write_file_safe(&self.markdown_path(), markdown).await
    }

    /// Portfolio data files that exist on disk: `structured_cv.json`, `user_curriculum.md`
    pub async fn get_portfolio_files(&self) -> Result<Vec<StoredFile>> {
        let mut files = Vec::new();
        for name in PORTFOLIO_DATA_FILES {
            let path = self.output_dir.join(name);
            let Ok(metadata) = tokio::fs::metadata(&path).await else {
                continue;
            };
            if metadata.is_file() {
                files.push(stored_file(name.to_string(), name.to_string(), path, &metadata));
            }
        }
        Ok(files)
    }

    /// Contents of a portfolio data file, `None` when it has not been written yet
    pub async fn read_portfolio_file(&self, filename: &str) -> Result<Option<Vec<u8>>> {
        if !PORTFOLIO_DATA_FILES.contains(&filename) {
            anyhow::bail!("Not a portfolio data file: {}", filename);
        }
        read_if_exists(&self.output_dir.join(filename)).await
    }
}

fn stored_file(
    filename: String,
    original_name: String,
    path: PathBuf,
    metadata: &std::fs::Metadata,
) -> StoredFile {
    let modified = metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());
    StoredFile {
        filename,
        original_name,
        size: metadata.len(),
        modified,
        path,
    }
}

async fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>> {
    if !path.is_file() {
        return Ok(None);
    }
    FsOps::read_bytes(path).await.map(Some)
}

/// Strip the timestamp prefix added by `save_uploaded_file`
pub fn original_name(stored: &str) -> String {
    let mut parts = stored.splitn(3, '_');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(date), Some(time), Some(rest))
            if date.len() == 8
                && time.len() == 6
                && date.chars().all(|c| c.is_ascii_digit())
                && time.chars().all(|c| c.is_ascii_digit()) =>
        {
            rest.to_string()
        }
        _ => stored.to_string(),
    }
}
