// src/core/pdf.rs
//! HTML to PDF export through an external renderer

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::app_log;
use crate::core::FsOps;
use crate::utils::run_external;

pub struct PdfRenderer {
    command: String,
    work_dir: PathBuf,
}

impl PdfRenderer {
    /// `command` is invoked as `<command> <input.html> <output.pdf>`
    pub fn new(command: impl Into<String>, work_dir: PathBuf) -> Self {
        Self {
            command: command.into(),
            work_dir,
        }
    }

    pub async fn export(&self, html: &str) -> Result<Vec<u8>> {
        FsOps::ensure_dir_exists(&self.work_dir).await?;

        let stem = uuid::Uuid::new_v4().to_string();
        let html_path = self.work_dir.join(format!("{}.html", stem));
        let pdf_path = self.work_dir.join(format!("{}.pdf", stem));

        FsOps::write_file_safe(&html_path, html).await?;
        let result = run_external(&self.command, [&html_path, &pdf_path]).await;

        let pdf = match result {
            Ok(_) => FsOps::read_bytes(&pdf_path)
                .await
                .context("PDF renderer produced no output"),
            Err(e) => Err(e.context("PDF export failed")),
        };

        for path in [&html_path, &pdf_path] {
            if let Err(e) = FsOps::remove_file(path).await {
                app_log!(warn, "Failed to clean up {}: {}", path.display(), e);
            }
        }

        let pdf = pdf?;
        app_log!(debug, "Exported PDF ({} bytes)", pdf.len());
        Ok(pdf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_export_runs_command_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        // `cp in out` stands in for a real renderer
        let renderer = PdfRenderer::new("cp", dir.path().join("tmp"));

        let bytes = renderer.export("<p>hello</p>").await.unwrap();
        assert_eq!(bytes, b"<p>hello</p>");

        let leftovers = std::fs::read_dir(dir.path().join("tmp")).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_missing_renderer_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = PdfRenderer::new("no-such-pdf-renderer", dir.path().to_path_buf());
        assert!(renderer.export("<p></p>").await.is_err());
    }
}
