// src/core/ingestion.rs
//! Turn an uploaded CV document into markdown text

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::app_log;
use crate::core::FsOps;
use crate::utils::{get_file_extension, run_external, validate_file_extension};

pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "pdf", "docx"];

pub struct DocumentIngestor {
    markdown_command: String,
    work_dir: PathBuf,
}

impl DocumentIngestor {
    /// `markdown_command` is invoked as `<command> <file>` and must print markdown
    pub fn new(markdown_command: impl Into<String>, work_dir: PathBuf) -> Self {
        Self {
            markdown_command: markdown_command.into(),
            work_dir,
        }
    }

    pub async fn to_markdown(&self, filename: &str, content: &[u8]) -> Result<String> {
        validate_file_extension(filename, SUPPORTED_EXTENSIONS)?;
        let ext = get_file_extension(filename).unwrap_or_default();

        let markdown = match ext.as_str() {
            "txt" | "md" => String::from_utf8(content.to_vec())
                .with_context(|| format!("{} is not valid UTF-8 text", filename))?,
            _ => self.convert(&ext, content).await?,
        };

        if markdown.trim().is_empty() {
            anyhow::bail!("No text could be extracted from {}", filename);
        }

        app_log!(
            info,
            "Ingested {} ({} characters of markdown)",
            filename,
            markdown.len()
        );
        Ok(markdown)
    }

    async fn convert(&self, ext: &str, content: &[u8]) -> Result<String> {
        let path = self
            .work_dir
            .join(format!("{}.{}", uuid::Uuid::new_v4(), ext));
        FsOps::write_bytes(&path, content).await?;

        let result = run_external(&self.markdown_command, [&path]).await;
        if let Err(e) = FsOps::remove_file(&path).await {
            app_log!(warn, "Failed to clean up {}: {}", path.display(), e);
        }

        let output = result.context("Document conversion failed")?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_text_files_are_read_directly() {
        let dir = tempfile::tempdir().unwrap();
        let ingestor = DocumentIngestor::new("no-such-converter", dir.path().to_path_buf());

        let markdown = ingestor.to_markdown("cv.MD", b"# Ada\nEngineer").await.unwrap();
        assert_eq!(markdown, "# Ada\nEngineer");
        assert!(ingestor.to_markdown("cv.txt", &[0xff, 0xfe]).await.is_err());
        assert!(ingestor.to_markdown("cv.txt", b"  \n").await.is_err());
    }

    #[tokio::test]
    async fn test_documents_go_through_converter() {
        let dir = tempfile::tempdir().unwrap();
        // `cat` echoes the file, standing in for the converter
        let ingestor = DocumentIngestor::new("cat", dir.path().to_path_buf());

        let markdown = ingestor.to_markdown("cv.pdf", b"converted text").await.unwrap();
        assert_eq!(markdown, "converted text");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let ingestor = DocumentIngestor::new("cat", dir.path().to_path_buf());
        assert!(ingestor.to_markdown("cv.png", b"...").await.is_err());
        assert!(ingestor.to_markdown("cv", b"...").await.is_err());
    }
}
