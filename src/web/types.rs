// src/web/types.rs
use rocket::form::FromForm;
use rocket::fs::TempFile;
use rocket::http::ContentType;
use rocket::response::{self, Responder};
use rocket::serde::{Deserialize, Serialize};
use rocket::{Request, Response};

use crate::core::file_store::StoredFile;
use crate::core::template_engine::TemplateInfo;
use crate::core::UserSettings;
use crate::job_source::JobPosting;
use crate::llm::ModelProvider;
use crate::submissions::{RenderedDocuments, TemplateSelection};
use crate::types::{Curriculum, Draft, FinalCoverLetter, FinalCurriculum};
use crate::utils::attachment_header;

pub struct PdfResponse {
    pub data: Vec<u8>,
    pub filename: Option<String>,
}

impl PdfResponse {
    pub fn with_filename(data: Vec<u8>, filename: String) -> Self {
        Self {
            data,
            filename: Some(filename),
        }
    }
}

impl<'r> Responder<'r, 'static> for PdfResponse {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        let mut binding = Response::build();
        let mut response = binding
            .header(ContentType::PDF)
            .sized_body(self.data.len(), std::io::Cursor::new(self.data));

        if let Some(filename) = self.filename {
            response = response.raw_header("Content-Disposition", attachment_header(&filename));
        }

        response.ok()
    }
}

/// Download of a stored file; the content type follows the file extension
pub struct FileResponse {
    pub data: Vec<u8>,
    pub filename: String,
}

impl FileResponse {
    pub fn content_type(&self) -> ContentType {
        std::path::Path::new(&self.filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(ContentType::from_extension)
            .unwrap_or(ContentType::Binary)
    }
}

impl<'r> Responder<'r, 'static> for FileResponse {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        Response::build()
            .header(self.content_type())
            .raw_header("Content-Disposition", attachment_header(&self.filename))
            .sized_body(self.data.len(), std::io::Cursor::new(self.data))
            .ok()
    }
}

/// CSV download of the submission list
pub struct CsvResponse {
    pub content: String,
    pub filename: String,
}

impl<'r> Responder<'r, 'static> for CsvResponse {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        Response::build()
            .header(ContentType::CSV)
            .raw_header("Content-Disposition", attachment_header(&self.filename))
            .sized_body(self.content.len(), std::io::Cursor::new(self.content))
            .ok()
    }
}

#[derive(FromForm)]
pub struct CvUploadForm<'f> {
    pub cv_file: TempFile<'f>,
}

// ===== Requests =====

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct UpdateSettingsRequest {
    pub openai_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub selected_model: Option<ModelProvider>,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct GenerateRequest {
    pub job_description: Option<String>,
    pub job_url: Option<String>,
    pub cv_template: Option<String>,
    pub cover_letter_template: Option<String>,
}

impl GenerateRequest {
    pub fn templates(&self) -> TemplateSelection {
        TemplateSelection {
            cv: self.cv_template.clone(),
            cover_letter: self.cover_letter_template.clone(),
        }
    }
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct RenderCvRequest {
    pub cv: FinalCurriculum,
    pub template: Option<String>,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct RenderCoverLetterRequest {
    pub cover_letter: FinalCoverLetter,
    pub template: Option<String>,
}

/// Draft sent back by the client on save and update
#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct SubmissionRequest {
    #[serde(flatten)]
    pub draft: Draft,
    pub cv_template: Option<String>,
    pub cover_letter_template: Option<String>,
}

impl SubmissionRequest {
    pub fn templates(&self) -> TemplateSelection {
        TemplateSelection {
            cv: self.cv_template.clone(),
            cover_letter: self.cover_letter_template.clone(),
        }
    }
}

// ===== Response payloads =====

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct SettingsData {
    pub settings: UserSettings,
    pub has_config: bool,
    pub ready: bool,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct PortfolioData {
    pub portfolio: Curriculum,
    pub display_name: String,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct FilesData {
    pub files: Vec<StoredFile>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct TemplatesData {
    pub cv: Vec<TemplateInfo>,
    pub cover_letter: Vec<TemplateInfo>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct GeneratedDraft {
    pub draft: Draft,
    pub preview: RenderedDocuments,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_posting: Option<JobPosting>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct HtmlPreview {
    pub html: String,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct SavedSubmission {
    pub id: i64,
}

// ===== Standard envelopes =====

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct TextResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct DataResponse<T> {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub data: T,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ActionResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_actions: Option<Vec<String>>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct StandardErrorResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub suggestions: Vec<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum ResponseType {
    Text,
    Data,
    Action,
    Error,
}

impl TextResponse {
    pub fn success(message: String) -> Self {
        Self {
            response_type: ResponseType::Text,
            success: true,
            message,
        }
    }
}

impl<T> DataResponse<T> {
    pub fn success(message: String, data: T) -> Self {
        Self {
            response_type: ResponseType::Data,
            success: true,
            message,
            data,
        }
    }
}

impl ActionResponse {
    pub fn success(message: String, action: String) -> Self {
        Self {
            response_type: ResponseType::Action,
            success: true,
            message,
            action,
            next_actions: None,
        }
    }

    pub fn with_next_actions(mut self, next_actions: Vec<String>) -> Self {
        self.next_actions = Some(next_actions);
        self
    }
}

impl StandardErrorResponse {
    pub fn new(error: String, error_code: String, suggestions: Vec<String>) -> Self {
        Self {
            response_type: ResponseType::Error,
            success: false,
            error,
            error_code,
            suggestions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::serde::json::serde_json;

    #[test]
    fn test_submission_request_flattens_draft() {
        let request: SubmissionRequest = serde_json::from_str(
            r#"{
                "final_cv": {"personality": {"name": "Ada"}},
                "final_cover_letter": {"company_name": "Acme"},
                "job_information": {"job_title": "Engineer", "company_name": "Acme"},
                "cv_template": "modern"
            }"#,
        )
        .unwrap();

        assert_eq!(request.draft.company(), Some("Acme"));
        assert_eq!(request.draft.final_cv.personality.name.as_deref(), Some("Ada"));
        assert_eq!(request.templates().cv.as_deref(), Some("modern"));
        assert!(request.templates().cover_letter.is_none());
    }

    #[test]
    fn test_file_response_content_type() {
        let file = |name: &str| FileResponse {
            data: Vec::new(),
            filename: name.to_string(),
        };
        assert_eq!(file("structured_cv.json").content_type(), ContentType::JSON);
        assert_eq!(file("resume.PDF").content_type(), ContentType::PDF);
        assert_eq!(file("resume.xyz").content_type(), ContentType::Binary);
        assert_eq!(file("noext").content_type(), ContentType::Binary);
    }

    #[test]
    fn test_error_envelope_shape() {
        let error = StandardErrorResponse::new(
            "Submission 3 not found".to_string(),
            "SUBMISSION_NOT_FOUND".to_string(),
            vec![],
        );
        let value = serde_json::to_value(&error).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["success"], false);
        assert_eq!(value["error_code"], "SUBMISSION_NOT_FOUND");
    }
}
