// src/web/handlers/system_handlers.rs
use rocket::serde::json::Json;
use rocket::State;

use crate::app_log;
use crate::core::{Database, TemplateEngine, TemplateKind};
use crate::web::handlers::{api_error, ApiError};
use crate::web::types::*;

pub async fn health_handler(db: &State<Database>) -> Result<Json<TextResponse>, ApiError> {
    match db.health_check().await {
        Ok(()) => Ok(Json(TextResponse::success("cv-tailor is running".to_string()))),
        Err(e) => {
            app_log!(error, "Health check failed: {}", e);
            Err(api_error(
                "Database is not reachable",
                "DATABASE_UNAVAILABLE",
                &["Check the database path in config.yaml"],
            ))
        }
    }
}

pub async fn get_templates_handler(
    templates: &State<TemplateEngine>,
) -> Json<DataResponse<TemplatesData>> {
    let collect = |kind| {
        templates
            .list_templates(Some(kind))
            .into_iter()
            .cloned()
            .collect::<Vec<_>>()
    };

    let data = TemplatesData {
        cv: collect(TemplateKind::Cv),
        cover_letter: collect(TemplateKind::CoverLetter),
    };

    app_log!(
        debug,
        "Listing {} CV and {} cover letter templates",
        data.cv.len(),
        data.cover_letter.len()
    );

    Json(DataResponse::success(
        "Available templates".to_string(),
        data,
    ))
}
