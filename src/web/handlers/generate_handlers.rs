// src/web/handlers/generate_handlers.rs
//! Tailoring a draft for a job description and re-rendering edited records

use rocket::serde::json::Json;
use rocket::State;
use tracing::Instrument;

use crate::core::{ConfigManager, Database, FileManager, PdfRenderer, SettingsStore, TemplateEngine};
use crate::extractor::InformationExtractor;
use crate::job_source::{JobFetcher, JobPosting};
use crate::llm::build_model;
use crate::submissions::SubmissionService;
use crate::web::handlers::{api_error, internal_error, model_error, submission_error, ApiError};
use crate::web::types::*;
use crate::{app_log, app_span};

pub struct GenerateContext<'a> {
    pub config: &'a ConfigManager,
    pub files: &'a FileManager,
    pub settings: &'a SettingsStore,
    pub db: &'a Database,
    pub templates: &'a TemplateEngine,
    pub pdf: &'a PdfRenderer,
}

pub async fn generate_handler(
    request: Json<GenerateRequest>,
    ctx: GenerateContext<'_>,
) -> Result<Json<DataResponse<GeneratedDraft>>, ApiError> {
    let span = app_span!(
        "generate",
        from_url = request.job_url.is_some()
    );
    generate_draft(request.into_inner(), ctx)
        .instrument(span)
        .await
}

async fn job_description_for(
    request: &GenerateRequest,
    config: &ConfigManager,
) -> Result<(String, Option<JobPosting>), ApiError> {
    if let Some(text) = request
        .job_description
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        return Ok((text.to_string(), None));
    }

    let Some(url) = request
        .job_url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
    else {
        return Err(api_error(
            "A job description or a job posting URL is required",
            "MISSING_JOB_DESCRIPTION",
            &[
                "Paste the job description text",
                "Or provide the URL of the job posting",
            ],
        ));
    };

    let fetcher = JobFetcher::new(config.service.timeout_seconds)
        .map_err(|e| internal_error("Failed to create HTTP client", &e))?;
    match fetcher.fetch(url).await {
        Ok(posting) => Ok((posting.to_job_description(), Some(posting))),
        Err(e) => {
            app_log!(error, "Job posting fetch failed for {}: {:#}", url, e);
            Err(api_error(
                format!("Could not read the job posting: {:#}", e),
                "JOB_FETCH_ERROR",
                &[
                    "Check that the URL is publicly accessible",
                    "Paste the job description text instead",
                ],
            ))
        }
    }
}

async fn generate_draft(
    request: GenerateRequest,
    ctx: GenerateContext<'_>,
) -> Result<Json<DataResponse<GeneratedDraft>>, ApiError> {
    let portfolio = ctx
        .files
        .load_portfolio_data()
        .await
        .map_err(|e| internal_error("Failed to load portfolio", &e))?
        .ok_or_else(|| {
            api_error(
                "No portfolio has been created yet",
                "PORTFOLIO_NOT_FOUND",
                &["Upload your CV before generating documents"],
            )
        })?;

    let (job_description, job_posting) = job_description_for(&request, ctx.config).await?;

    let user_settings = ctx
        .settings
        .load()
        .await
        .map_err(|e| internal_error("Failed to load settings", &e))?;
    let model = build_model(&user_settings, &ctx.config.service).map_err(|e| model_error(&e))?;

    let draft = InformationExtractor::new(model.as_ref())
        .tailor(&portfolio, &job_description)
        .await
        .map_err(|e| {
            app_log!(error, "Tailoring failed: {}", e);
            model_error(&e)
        })?;

    let service = SubmissionService::new(ctx.db, ctx.templates, ctx.pdf);
    let preview = service
        .render(&draft, &request.templates())
        .map_err(|e| submission_error(&e))?;

    Ok(Json(DataResponse::success(
        format!(
            "Documents generated for {} at {}",
            draft.position().unwrap_or("unknown position"),
            draft.company().unwrap_or("unknown company")
        ),
        GeneratedDraft {
            draft,
            preview,
            job_posting,
        },
    )))
}

pub async fn render_cv_handler(
    request: Json<RenderCvRequest>,
    db: &State<Database>,
    templates: &State<TemplateEngine>,
    pdf: &State<PdfRenderer>,
) -> Result<Json<DataResponse<HtmlPreview>>, ApiError> {
    let service = SubmissionService::new(db, templates, pdf);
    let html = service
        .render_cv(&request.cv, request.template.as_deref())
        .map_err(|e| submission_error(&e))?;

    Ok(Json(DataResponse::success(
        "CV rendered".to_string(),
        HtmlPreview { html },
    )))
}

pub async fn render_cover_letter_handler(
    request: Json<RenderCoverLetterRequest>,
    db: &State<Database>,
    templates: &State<TemplateEngine>,
    pdf: &State<PdfRenderer>,
) -> Result<Json<DataResponse<HtmlPreview>>, ApiError> {
    let service = SubmissionService::new(db, templates, pdf);
    let html = service
        .render_cover_letter(&request.cover_letter, request.template.as_deref())
        .map_err(|e| submission_error(&e))?;

    Ok(Json(DataResponse::success(
        "Cover letter rendered".to_string(),
        HtmlPreview { html },
    )))
}
