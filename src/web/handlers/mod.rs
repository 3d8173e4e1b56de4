pub mod generate_handlers;
pub mod portfolio_handlers;
pub mod settings_handlers;
pub mod submission_handlers;
pub mod system_handlers;

pub use generate_handlers::*;
pub use portfolio_handlers::*;
pub use settings_handlers::*;
pub use submission_handlers::*;
pub use system_handlers::*;

use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;

use crate::llm::ModelError;
use crate::submissions::SubmissionError;
use crate::web::types::StandardErrorResponse;

pub type ApiError = Json<StandardErrorResponse>;

/// Download routes answer failures with a matching HTTP status
pub type DownloadError = status::Custom<ApiError>;

pub(crate) fn api_error(error: impl Into<String>, code: &str, suggestions: &[&str]) -> ApiError {
    Json(StandardErrorResponse::new(
        error.into(),
        code.to_string(),
        suggestions.iter().map(|s| s.to_string()).collect(),
    ))
}

pub(crate) fn internal_error(context: &str, error: &anyhow::Error) -> ApiError {
    api_error(
        format!("{}: {:#}", context, error),
        "INTERNAL_ERROR",
        &["Try again in a few moments"],
    )
}

pub(crate) fn model_error(error: &ModelError) -> ApiError {
    match error {
        ModelError::MissingApiKey(provider) => api_error(
            error.to_string(),
            "MISSING_API_KEY",
            &[
                &format!("Add an API key for {} in the settings", provider),
                "Or switch the selected model",
            ],
        ),
        ModelError::Api { status: 401, .. } | ModelError::Api { status: 403, .. } => api_error(
            error.to_string(),
            "INVALID_API_KEY",
            &["Check the API key in the settings"],
        ),
        ModelError::Api { status: 429, .. } => api_error(
            error.to_string(),
            "RATE_LIMITED",
            &["Wait a moment and try again"],
        ),
        ModelError::Refused(_) => api_error(
            error.to_string(),
            "MODEL_REFUSED",
            &["Rephrase or shorten the job description"],
        ),
        ModelError::Parse(_) | ModelError::EmptyContent => api_error(
            error.to_string(),
            "MODEL_OUTPUT_ERROR",
            &["Try again, model output can vary between calls"],
        ),
        _ => api_error(
            error.to_string(),
            "MODEL_ERROR",
            &["Check your network connection", "Try again in a few moments"],
        ),
    }
}

pub(crate) fn submission_error(error: &SubmissionError) -> ApiError {
    match error {
        SubmissionError::MissingJobInformation => api_error(
            error.to_string(),
            "MISSING_JOB_INFORMATION",
            &["Generate the documents again from the job description"],
        ),
        SubmissionError::MissingCompany => api_error(
            error.to_string(),
            "MISSING_COMPANY",
            &["Set job_information.company_name before saving"],
        ),
        SubmissionError::MissingPosition => api_error(
            error.to_string(),
            "MISSING_POSITION",
            &["Set job_information.job_title before saving"],
        ),
        SubmissionError::NotFound(_) => api_error(
            error.to_string(),
            "SUBMISSION_NOT_FOUND",
            &["List submissions to see the available ids"],
        ),
        SubmissionError::Other(e) => internal_error("Submission operation failed", e),
    }
}

pub(crate) fn submission_download_error(error: &SubmissionError) -> DownloadError {
    let code = match error {
        SubmissionError::NotFound(_) => Status::NotFound,
        SubmissionError::Other(_) => Status::InternalServerError,
        _ => Status::BadRequest,
    };
    status::Custom(code, submission_error(error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ModelProvider;

    #[test]
    fn test_error_codes() {
        let missing = model_error(&ModelError::MissingApiKey(ModelProvider::Gemini));
        assert_eq!(missing.error_code, "MISSING_API_KEY");
        assert!(missing.suggestions[0].contains("gemini"));

        let unauthorized = model_error(&ModelError::Api {
            status: 401,
            message: "bad key".to_string(),
        });
        assert_eq!(unauthorized.error_code, "INVALID_API_KEY");

        assert_eq!(
            submission_error(&SubmissionError::NotFound(4)).error_code,
            "SUBMISSION_NOT_FOUND"
        );
        assert_eq!(
            submission_error(&SubmissionError::MissingCompany).error_code,
            "MISSING_COMPANY"
        );
    }

    #[test]
    fn test_download_error_status() {
        let missing = submission_download_error(&SubmissionError::NotFound(9));
        assert_eq!(missing.0, Status::NotFound);
        assert_eq!(missing.1.error_code, "SUBMISSION_NOT_FOUND");

        let failed =
            submission_download_error(&SubmissionError::Other(anyhow::anyhow!("disk full")));
        assert_eq!(failed.0, Status::InternalServerError);
        assert_eq!(failed.1.error_code, "INTERNAL_ERROR");
    }
}
