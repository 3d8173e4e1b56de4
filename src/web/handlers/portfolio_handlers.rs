// src/web/handlers/portfolio_handlers.rs
//! Portfolio upload, extraction and uploaded file management

use rocket::form::Form;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::State;
use tracing::Instrument;

use crate::core::file_store::original_name;
use crate::core::ingestion::SUPPORTED_EXTENSIONS;
use crate::core::{ConfigManager, DocumentIngestor, FileManager, FsOps, SettingsStore};
use crate::extractor::InformationExtractor;
use crate::llm::build_model;
use crate::types::Curriculum;
use crate::utils::validate_file_extension;
use crate::web::handlers::{api_error, internal_error, model_error, ApiError, DownloadError};
use crate::web::types::*;
use crate::{app_log, app_span};

const MAX_UPLOAD_SIZE: u64 = 10 * 1024 * 1024;

pub async fn upload_portfolio_handler(
    upload: Form<CvUploadForm<'_>>,
    config: &State<ConfigManager>,
    files: &State<FileManager>,
    ingestor: &State<DocumentIngestor>,
    settings: &State<SettingsStore>,
) -> Result<Json<DataResponse<PortfolioData>>, ApiError> {
    let original_name = upload
        .cv_file
        .raw_name()
        .map(|name| name.dangerous_unsafe_unsanitized_raw().as_str().to_string())
        .unwrap_or_else(|| "uploaded_cv".to_string());

    let span = app_span!("portfolio_upload", file = %original_name);
    upload_and_extract(upload, original_name, config, files, ingestor, settings)
        .instrument(span)
        .await
}

async fn upload_and_extract(
    mut upload: Form<CvUploadForm<'_>>,
    original_name: String,
    config: &ConfigManager,
    files: &FileManager,
    ingestor: &DocumentIngestor,
    settings: &SettingsStore,
) -> Result<Json<DataResponse<PortfolioData>>, ApiError> {
    app_log!(info, "Uploading CV {}", original_name);

    if let Err(e) = validate_file_extension(&original_name, SUPPORTED_EXTENSIONS) {
        return Err(api_error(
            e.to_string(),
            "INVALID_FORMAT",
            &[
                "Upload a PDF (.pdf) or Word (.docx) document",
                "Plain text (.txt) and markdown (.md) files are accepted too",
            ],
        ));
    }

    if upload.cv_file.len() > MAX_UPLOAD_SIZE {
        return Err(api_error(
            "File size exceeds 10MB limit",
            "FILE_TOO_LARGE",
            &["Use a smaller file size (max 10MB)"],
        ));
    }

    let tmp_dir = config.environment.output_path.join("tmp");
    FsOps::ensure_dir_exists(&tmp_dir)
        .await
        .map_err(|e| internal_error("Failed to prepare upload directory", &e))?;
    let temp_path = tmp_dir.join(format!("upload_{}", uuid::Uuid::new_v4()));

    if let Err(e) = upload.cv_file.persist_to(&temp_path).await {
        app_log!(error, "Failed to save uploaded file: {}", e);
        return Err(api_error(
            "Failed to process uploaded file",
            "FILE_SAVE_ERROR",
            &["Try uploading the file again"],
        ));
    }

    let content = FsOps::read_bytes(&temp_path).await;
    if let Err(e) = FsOps::remove_file(&temp_path).await {
        app_log!(warn, "Failed to clean up {}: {}", temp_path.display(), e);
    }
    let content = content.map_err(|e| internal_error("Failed to read uploaded file", &e))?;

    files
        .save_uploaded_file(&content, &original_name)
        .await
        .map_err(|e| internal_error("Failed to store uploaded file", &e))?;

    let markdown = match ingestor.to_markdown(&original_name, &content).await {
        Ok(markdown) => markdown,
        Err(e) => {
            app_log!(error, "CV conversion failed: {:#}", e);
            return Err(api_error(
                format!("CV conversion failed: {:#}", e),
                "CONVERSION_ERROR",
                &[
                    "Ensure the CV has selectable text",
                    "Try a different file format",
                ],
            ));
        }
    };

    files
        .save_markdown(&markdown)
        .await
        .map_err(|e| internal_error("Failed to save CV markdown", &e))?;

    let user_settings = settings
        .load()
        .await
        .map_err(|e| internal_error("Failed to load settings", &e))?;
    let model = build_model(&user_settings, &config.service).map_err(|e| model_error(&e))?;

    let portfolio = InformationExtractor::new(model.as_ref())
        .extract_data(&markdown)
        .await
        .map_err(|e| {
            app_log!(error, "Portfolio extraction failed: {}", e);
            model_error(&e)
        })?;

    files
        .save_portfolio_data(&portfolio)
        .await
        .map_err(|e| internal_error("Failed to save portfolio", &e))?;

    let display_name = portfolio.display_name();
    app_log!(info, "Portfolio created for {}", display_name);

    Ok(Json(DataResponse::success(
        format!("Portfolio extracted from {}", original_name),
        PortfolioData {
            portfolio,
            display_name,
        },
    )))
}

pub async fn get_portfolio_handler(
    files: &State<FileManager>,
) -> Result<Json<DataResponse<PortfolioData>>, ApiError> {
    let portfolio = files
        .load_portfolio_data()
        .await
        .map_err(|e| internal_error("Failed to load portfolio", &e))?;

    match portfolio {
        Some(portfolio) => Ok(Json(DataResponse::success(
            "Current portfolio".to_string(),
            PortfolioData {
                display_name: portfolio.display_name(),
                portfolio,
            },
        ))),
        None => Err(api_error(
            "No portfolio has been created yet",
            "PORTFOLIO_NOT_FOUND",
            &["Upload your CV to create a portfolio"],
        )),
    }
}

/// Replace the stored portfolio with an edited one
pub async fn update_portfolio_handler(
    request: Json<Curriculum>,
    files: &State<FileManager>,
) -> Result<Json<ActionResponse>, ApiError> {
    let portfolio = request.into_inner();
    files
        .save_portfolio_data(&portfolio)
        .await
        .map_err(|e| internal_error("Failed to save portfolio", &e))?;

    app_log!(info, "Portfolio updated for {}", portfolio.display_name());
    Ok(Json(ActionResponse::success(
        "Portfolio saved".to_string(),
        "updated".to_string(),
    )))
}

pub async fn list_uploaded_files_handler(
    files: &State<FileManager>,
) -> Result<Json<DataResponse<FilesData>>, ApiError> {
    let uploaded = files
        .get_uploaded_files()
        .await
        .map_err(|e| internal_error("Failed to list uploaded files", &e))?;

    Ok(Json(DataResponse::success(
        format!("{} uploaded files", uploaded.len()),
        FilesData { files: uploaded },
    )))
}

pub async fn delete_uploaded_file_handler(
    filename: &str,
    files: &State<FileManager>,
) -> Result<Json<ActionResponse>, ApiError> {
    match files.delete_uploaded_file(filename).await {
        Ok(true) => Ok(Json(ActionResponse::success(
            format!("Deleted {}", filename),
            "deleted".to_string(),
        ))),
        Ok(false) => Err(api_error(
            format!("File not found: {}", filename),
            "FILE_NOT_FOUND",
            &["List uploaded files to see the stored names"],
        )),
        Err(e) => Err(api_error(
            format!("{:#}", e),
            "INVALID_FILENAME",
            &["Use a file name returned by the file list"],
        )),
    }
}

/// Uploaded CV under its original name
pub async fn download_uploaded_file_handler(
    filename: &str,
    files: &State<FileManager>,
) -> Result<FileResponse, DownloadError> {
    match files.read_uploaded_file(filename).await {
        Ok(Some(data)) => Ok(FileResponse {
            data,
            filename: original_name(filename),
        }),
        Ok(None) => Err(file_not_found(filename)),
        Err(e) => Err(status::Custom(
            Status::BadRequest,
            api_error(
                format!("{:#}", e),
                "INVALID_FILENAME",
                &["Use a file name returned by the file list"],
            ),
        )),
    }
}

pub async fn list_portfolio_files_handler(
    files: &State<FileManager>,
) -> Result<Json<DataResponse<FilesData>>, ApiError> {
    let data_files = files
        .get_portfolio_files()
        .await
        .map_err(|e| internal_error("Failed to list portfolio files", &e))?;

    Ok(Json(DataResponse::success(
        format!("{} portfolio files", data_files.len()),
        FilesData { files: data_files },
    )))
}

/// `structured_cv.json` or `user_curriculum.md`
pub async fn download_portfolio_file_handler(
    filename: &str,
    files: &State<FileManager>,
) -> Result<FileResponse, DownloadError> {
    match files.read_portfolio_file(filename).await {
        Ok(Some(data)) => Ok(FileResponse {
            data,
            filename: filename.to_string(),
        }),
        Ok(None) => Err(file_not_found(filename)),
        Err(e) => Err(status::Custom(
            Status::BadRequest,
            api_error(
                format!("{:#}", e),
                "INVALID_FILENAME",
                &["Use structured_cv.json or user_curriculum.md"],
            ),
        )),
    }
}

fn file_not_found(filename: &str) -> DownloadError {
    status::Custom(
        Status::NotFound,
        api_error(
            format!("File not found: {}", filename),
            "FILE_NOT_FOUND",
            &["Upload your CV first", "List files to see the stored names"],
        ),
    )
}
