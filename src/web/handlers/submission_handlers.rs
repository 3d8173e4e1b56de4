// src/web/handlers/submission_handlers.rs
use rocket::response::content::RawHtml;
use rocket::serde::json::Json;

use crate::app_log;
use crate::core::database::SubmissionSummary;
use crate::render::render_submissions_html;
use crate::submissions::{StoredSubmission, SubmissionService};
use crate::web::handlers::{submission_download_error, submission_error, ApiError, DownloadError};
use crate::web::types::*;

pub async fn list_submissions_handler(
    search: Option<&str>,
    service: SubmissionService<'_>,
) -> Result<Json<DataResponse<Vec<SubmissionSummary>>>, ApiError> {
    let search = search.map(str::trim).filter(|s| !s.is_empty());
    let submissions = service
        .list(search)
        .await
        .map_err(|e| submission_error(&e))?;

    Ok(Json(DataResponse::success(
        format!("{} submissions", submissions.len()),
        submissions,
    )))
}

pub async fn submissions_page_handler(
    service: SubmissionService<'_>,
) -> Result<RawHtml<String>, ApiError> {
    let submissions = service
        .list(None)
        .await
        .map_err(|e| submission_error(&e))?;
    Ok(RawHtml(render_submissions_html(&submissions)))
}

pub async fn export_submissions_handler(
    service: SubmissionService<'_>,
) -> Result<CsvResponse, ApiError> {
    let content = service
        .export_csv()
        .await
        .map_err(|e| submission_error(&e))?;
    Ok(CsvResponse {
        content,
        filename: "submissions.csv".to_string(),
    })
}

pub async fn get_submission_handler(
    id: i64,
    service: SubmissionService<'_>,
) -> Result<Json<DataResponse<StoredSubmission>>, ApiError> {
    let submission = service.get(id).await.map_err(|e| submission_error(&e))?;
    Ok(Json(DataResponse::success(
        format!("Submission {}", id),
        submission,
    )))
}

pub async fn save_submission_handler(
    request: Json<SubmissionRequest>,
    service: SubmissionService<'_>,
) -> Result<Json<DataResponse<SavedSubmission>>, ApiError> {
    let id = service
        .save(&request.draft, &request.templates())
        .await
        .map_err(|e| {
            app_log!(warn, "Submission not saved: {}", e);
            submission_error(&e)
        })?;

    Ok(Json(DataResponse::success(
        format!(
            "Submission saved for {} at {}",
            request.draft.position().unwrap_or_default(),
            request.draft.company().unwrap_or_default()
        ),
        SavedSubmission { id },
    )))
}

pub async fn update_submission_handler(
    id: i64,
    request: Json<SubmissionRequest>,
    service: SubmissionService<'_>,
) -> Result<Json<ActionResponse>, ApiError> {
    service
        .update(id, &request.draft, &request.templates())
        .await
        .map_err(|e| submission_error(&e))?;

    Ok(Json(ActionResponse::success(
        format!("Submission {} updated", id),
        "updated".to_string(),
    )))
}

pub async fn delete_submission_handler(
    id: i64,
    service: SubmissionService<'_>,
) -> Result<Json<ActionResponse>, ApiError> {
    service.delete(id).await.map_err(|e| submission_error(&e))?;
    Ok(Json(ActionResponse::success(
        format!("Submission {} deleted", id),
        "deleted".to_string(),
    )))
}

pub async fn download_cv_handler(
    id: i64,
    service: SubmissionService<'_>,
) -> Result<PdfResponse, DownloadError> {
    let document = service
        .download_cv(id)
        .await
        .map_err(|e| submission_download_error(&e))?;
    Ok(PdfResponse::with_filename(document.content, document.filename))
}

pub async fn download_cover_letter_handler(
    id: i64,
    service: SubmissionService<'_>,
) -> Result<PdfResponse, DownloadError> {
    let document = service
        .download_cover_letter(id)
        .await
        .map_err(|e| submission_download_error(&e))?;
    Ok(PdfResponse::with_filename(document.content, document.filename))
}
