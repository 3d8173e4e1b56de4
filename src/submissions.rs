//! Saving, updating and downloading submissions

use anyhow::Context;
use serde::Serialize;
use thiserror::Error;

use crate::core::database::{NewSubmission, SubmissionSummary};
use crate::core::{Database, PdfRenderer, TemplateEngine, TemplateKind};
use crate::render::{render_cover_letter_html, render_cv_html};
use crate::types::{Draft, FinalCoverLetter, FinalCurriculum, JobDescriptionInformation};
use crate::app_log;
use crate::utils::filename_component;

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Job description information is missing. Please regenerate the documents.")]
    MissingJobInformation,

    #[error("Company name is missing. Please check the job description or update the cover letter.")]
    MissingCompany,

    #[error("Job title is missing. Please check the job description or update the cover letter.")]
    MissingPosition,

    #[error("Submission {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

type Result<T> = std::result::Result<T, SubmissionError>;

/// Template ids used when rendering; `None` picks the default of each kind
#[derive(Debug, Clone, Default)]
pub struct TemplateSelection {
    pub cv: Option<String>,
    pub cover_letter: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderedDocuments {
    pub cv_html: String,
    pub cover_letter_html: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredSubmission {
    pub summary: SubmissionSummary,
    pub draft: Draft,
}

#[derive(Debug, Clone)]
pub struct DownloadedDocument {
    pub filename: String,
    pub content: Vec<u8>,
}

/// Check the fields a submission row cannot do without; returns (company, position)
pub fn validate(draft: &Draft) -> Result<(String, String)> {
    if draft.job_information.is_none() {
        return Err(SubmissionError::MissingJobInformation);
    }
    let company = draft.company().ok_or(SubmissionError::MissingCompany)?;
    let position = draft.position().ok_or(SubmissionError::MissingPosition)?;
    Ok((company.to_string(), position.to_string()))
}

pub struct SubmissionService<'a> {
    db: &'a Database,
    templates: &'a TemplateEngine,
    pdf: &'a PdfRenderer,
}

impl<'a> SubmissionService<'a> {
    pub fn new(db: &'a Database, templates: &'a TemplateEngine, pdf: &'a PdfRenderer) -> Self {
        Self { db, templates, pdf }
    }

    pub fn render_cv(&self, cv: &FinalCurriculum, template: Option<&str>) -> Result<String> {
        let template = self.templates.resolve(template, TemplateKind::Cv)?;
        Ok(render_cv_html(cv, template)?)
    }

    pub fn render_cover_letter(
        &self,
        letter: &FinalCoverLetter,
        template: Option<&str>,
    ) -> Result<String> {
        let template = self.templates.resolve(template, TemplateKind::CoverLetter)?;
        Ok(render_cover_letter_html(letter, template)?)
    }

    pub fn render(&self, draft: &Draft, selection: &TemplateSelection) -> Result<RenderedDocuments> {
        Ok(RenderedDocuments {
            cv_html: self.render_cv(&draft.final_cv, selection.cv.as_deref())?,
            cover_letter_html: self
                .render_cover_letter(&draft.final_cover_letter, selection.cover_letter.as_deref())?,
        })
    }

    async fn build_row(&self, draft: &Draft, selection: &TemplateSelection) -> Result<NewSubmission> {
        let (company, position) = validate(draft)?;
        let rendered = self.render(draft, selection)?;

        let cv_pdf = self.pdf.export(&rendered.cv_html).await?;
        let cover_letter_pdf = self.pdf.export(&rendered.cover_letter_html).await?;

        Ok(NewSubmission {
            company,
            position,
            cv_json: serde_json::to_string(&draft.final_cv).context("Failed to serialize CV")?,
            cover_letter_json: serde_json::to_string(&draft.final_cover_letter)
                .context("Failed to serialize cover letter")?,
            cv_pdf,
            cover_letter_pdf,
        })
    }

    pub async fn save(&self, draft: &Draft, selection: &TemplateSelection) -> Result<i64> {
        let row = self.build_row(draft, selection).await?;
        Ok(self.db.submissions().save(&row).await?)
    }

    pub async fn update(&self, id: i64, draft: &Draft, selection: &TemplateSelection) -> Result<()> {
        let row = self.build_row(draft, selection).await?;
        if self.db.submissions().update(id, &row).await? {
            Ok(())
        } else {
            Err(SubmissionError::NotFound(id))
        }
    }

    pub async fn list(&self, search: Option<&str>) -> Result<Vec<SubmissionSummary>> {
        let repo = self.db.submissions();
        Ok(match search {
            Some(query) => repo.search(query).await?,
            None => repo.list().await?,
        })
    }

    pub async fn latest_id(&self) -> Result<Option<i64>> {
        Ok(self.db.submissions().latest_id().await?)
    }

    pub async fn get(&self, id: i64) -> Result<StoredSubmission> {
        let record = self
            .db
            .submissions()
            .get(id)
            .await?
            .ok_or(SubmissionError::NotFound(id))?;

        let final_cv = serde_json::from_str(&record.cv_json)
            .with_context(|| format!("Stored CV of submission {} is corrupt", id))?;
        let final_cover_letter = serde_json::from_str(&record.cover_letter_json)
            .with_context(|| format!("Stored cover letter of submission {} is corrupt", id))?;

        Ok(StoredSubmission {
            draft: Draft {
                final_cv,
                final_cover_letter,
                job_information: Some(JobDescriptionInformation {
                    job_title: Some(record.position.clone()),
                    company_name: Some(record.company.clone()),
                }),
            },
            summary: SubmissionSummary {
                id: record.id,
                company: record.company,
                position: record.position,
                submission_date: record.submission_date,
            },
        })
    }

    pub async fn download_cv(&self, id: i64) -> Result<DownloadedDocument> {
        let documents = self
            .db
            .submissions()
            .get_documents(id)
            .await?
            .ok_or(SubmissionError::NotFound(id))?;

        Ok(DownloadedDocument {
            filename: download_name("CV", &documents.company, &documents.position),
            content: documents.cv_pdf,
        })
    }

    pub async fn download_cover_letter(&self, id: i64) -> Result<DownloadedDocument> {
        let documents = self
            .db
            .submissions()
            .get_documents(id)
            .await?
            .ok_or(SubmissionError::NotFound(id))?;

        Ok(DownloadedDocument {
            filename: download_name("Cover_Letter", &documents.company, &documents.position),
            content: documents.cover_letter_pdf,
        })
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        if self.db.submissions().delete(id).await? {
            Ok(())
        } else {
            Err(SubmissionError::NotFound(id))
        }
    }

    /// CSV of the submission list: id, company, position, submission_date
    pub async fn export_csv(&self) -> Result<String> {
        let submissions = self.list(None).await?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        for submission in &submissions {
            writer
                .serialize(submission)
                .context("Failed to write CSV row")?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Failed to finish CSV: {}", e))?;

        app_log!(info, "Exported {} submissions", submissions.len());
        Ok(String::from_utf8(bytes).context("CSV output is not UTF-8")?)
    }
}

/// `CV_Acme_Data_Engineer.pdf`
pub fn download_name(prefix: &str, company: &str, position: &str) -> String {
    format!(
        "{}_{}_{}.pdf",
        prefix,
        filename_component(company, "Company"),
        filename_component(position, "Position")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Personality;

    fn draft(company: Option<&str>, position: Option<&str>) -> Draft {
        Draft {
            final_cv: FinalCurriculum {
                personality: Personality {
                    name: Some("Ada".to_string()),
                    ..Default::default()
                },
                summary: Some("Builds engines".to_string()),
                ..Default::default()
            },
            final_cover_letter: FinalCoverLetter {
                body_paragraphs: vec!["Hello".to_string()],
                ..Default::default()
            },
            job_information: Some(JobDescriptionInformation {
                company_name: company.map(String::from),
                job_title: position.map(String::from),
            }),
        }
    }

    struct Fixture {
        db: Database,
        templates: TemplateEngine,
        pdf: PdfRenderer,
        _dir: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(&dir.path().join("submissions.db")).await.unwrap();
        // `cp` copies the HTML in place of a PDF renderer
        let pdf = PdfRenderer::new("cp", dir.path().join("tmp"));
        Fixture {
            db,
            templates: TemplateEngine::builtin(),
            pdf,
            _dir: dir,
        }
    }

    #[test]
    fn test_validation_order() {
        let mut missing = draft(Some("Acme"), Some("Engineer"));
        missing.job_information = None;
        assert!(matches!(
            validate(&missing),
            Err(SubmissionError::MissingJobInformation)
        ));
        assert!(matches!(
            validate(&draft(Some(" "), None)),
            Err(SubmissionError::MissingCompany)
        ));
        assert!(matches!(
            validate(&draft(Some("Acme"), None)),
            Err(SubmissionError::MissingPosition)
        ));
        assert_eq!(
            validate(&draft(Some(" Acme "), Some("Engineer"))).unwrap(),
            ("Acme".to_string(), "Engineer".to_string())
        );
    }

    #[test]
    fn test_download_name() {
        assert_eq!(
            download_name("CV", "Acme Corp", "Data Engineer"),
            "CV_Acme_Corp_Data_Engineer.pdf"
        );
        assert_eq!(
            download_name("Cover_Letter", "***", "C++ / C#"),
            "Cover_Letter_Company_C__C.pdf"
        );
    }

    #[tokio::test]
    async fn test_save_get_update_download() {
        let f = fixture().await;
        let service = SubmissionService::new(&f.db, &f.templates, &f.pdf);
        let selection = TemplateSelection::default();

        let id = service
            .save(&draft(Some("Acme"), Some("Engineer")), &selection)
            .await
            .unwrap();
        assert_eq!(service.latest_id().await.unwrap(), Some(id));

        let stored = service.get(id).await.unwrap();
        assert_eq!(stored.summary.company, "Acme");
        assert_eq!(stored.draft.final_cv.summary.as_deref(), Some("Builds engines"));
        assert_eq!(stored.draft.position(), Some("Engineer"));

        let cv = service.download_cv(id).await.unwrap();
        assert_eq!(cv.filename, "CV_Acme_Engineer.pdf");
        assert!(String::from_utf8(cv.content).unwrap().contains("Builds engines"));

        let mut edited = stored.draft.clone();
        edited.final_cover_letter.body_paragraphs = vec!["Updated letter".to_string()];
        service.update(id, &edited, &selection).await.unwrap();

        let letter = service.download_cover_letter(id).await.unwrap();
        assert_eq!(letter.filename, "Cover_Letter_Acme_Engineer.pdf");
        assert!(String::from_utf8(letter.content).unwrap().contains("Updated letter"));

        assert!(matches!(
            service.update(id + 1, &edited, &selection).await,
            Err(SubmissionError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_draft_is_not_stored() {
        let f = fixture().await;
        let service = SubmissionService::new(&f.db, &f.templates, &f.pdf);

        let result = service
            .save(&draft(None, Some("Engineer")), &TemplateSelection::default())
            .await;
        assert!(matches!(result, Err(SubmissionError::MissingCompany)));
        assert!(service.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_export_and_delete() {
        let f = fixture().await;
        let service = SubmissionService::new(&f.db, &f.templates, &f.pdf);
        let selection = TemplateSelection::default();

        let first = service
            .save(&draft(Some("Acme"), Some("Engineer")), &selection)
            .await
            .unwrap();
        service
            .save(&draft(Some("Globex"), Some("Analyst")), &selection)
            .await
            .unwrap();

        assert_eq!(service.list(Some("glob")).await.unwrap().len(), 1);

        let csv = service.export_csv().await.unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("id,company,position,submission_date"));
        assert!(lines.next().unwrap().starts_with(&format!("{},Acme,Engineer,", first)));

        service.delete(first).await.unwrap();
        assert!(matches!(
            service.delete(first).await,
            Err(SubmissionError::NotFound(_))
        ));
        assert!(matches!(
            service.download_cv(first).await,
            Err(SubmissionError::NotFound(_))
        ));
    }
}
