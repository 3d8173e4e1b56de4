// src/web/mod.rs

pub mod handlers;
pub mod types;

pub use types::*;

use anyhow::{Context, Result};
use rocket::data::{Limits, ToByteUnit};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::form::Form;
use rocket::http::{Header, Status};
use rocket::response::content::RawHtml;
use rocket::serde::json::Json;
use rocket::{
    catchers, delete, get, options, post, put, routes, Build, Request, Response, Rocket, State,
};

use crate::app_log;
use crate::core::database::SubmissionSummary;
use crate::core::{
    ConfigManager, Database, DocumentIngestor, FileManager, PdfRenderer, SettingsStore,
    TemplateEngine,
};
use crate::submissions::{StoredSubmission, SubmissionService};
use crate::types::Curriculum;
use handlers::{ApiError, DownloadError, GenerateContext};

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, PUT, DELETE, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
    }
}

// ===== System =====

#[get("/health")]
pub async fn health(db: &State<Database>) -> Result<Json<TextResponse>, ApiError> {
    handlers::health_handler(db).await
}

#[get("/templates")]
pub async fn get_templates(
    templates: &State<TemplateEngine>,
) -> Json<DataResponse<TemplatesData>> {
    handlers::get_templates_handler(templates).await
}

// ===== Settings =====

#[get("/settings")]
pub async fn get_settings(
    store: &State<SettingsStore>,
) -> Result<Json<DataResponse<SettingsData>>, ApiError> {
    handlers::get_settings_handler(store).await
}

#[put("/settings", data = "<request>")]
pub async fn update_settings(
    request: Json<UpdateSettingsRequest>,
    store: &State<SettingsStore>,
) -> Result<Json<ActionResponse>, ApiError> {
    handlers::update_settings_handler(request, store).await
}

#[delete("/settings")]
pub async fn clear_settings(store: &State<SettingsStore>) -> Result<Json<ActionResponse>, ApiError> {
    handlers::clear_settings_handler(store).await
}

// ===== Portfolio =====

#[post("/portfolio/upload", data = "<upload>")]
pub async fn upload_portfolio(
    upload: Form<CvUploadForm<'_>>,
    config: &State<ConfigManager>,
    files: &State<FileManager>,
    ingestor: &State<DocumentIngestor>,
    settings: &State<SettingsStore>,
) -> Result<Json<DataResponse<PortfolioData>>, ApiError> {
    handlers::upload_portfolio_handler(upload, config, files, ingestor, settings).await
}

#[get("/portfolio")]
pub async fn get_portfolio(
    files: &State<FileManager>,
) -> Result<Json<DataResponse<PortfolioData>>, ApiError> {
    handlers::get_portfolio_handler(files).await
}

#[put("/portfolio", data = "<request>")]
pub async fn update_portfolio(
    request: Json<Curriculum>,
    files: &State<FileManager>,
) -> Result<Json<ActionResponse>, ApiError> {
    handlers::update_portfolio_handler(request, files).await
}

#[get("/portfolio/files")]
pub async fn list_uploaded_files(
    files: &State<FileManager>,
) -> Result<Json<DataResponse<FilesData>>, ApiError> {
    handlers::list_uploaded_files_handler(files).await
}

#[get("/portfolio/files/<filename>")]
pub async fn download_uploaded_file(
    filename: &str,
    files: &State<FileManager>,
) -> Result<FileResponse, DownloadError> {
    handlers::download_uploaded_file_handler(filename, files).await
}

#[get("/portfolio/data")]
pub async fn list_portfolio_files(
    files: &State<FileManager>,
) -> Result<Json<DataResponse<FilesData>>, ApiError> {
    handlers::list_portfolio_files_handler(files).await
}

#[get("/portfolio/data/<filename>")]
pub async fn download_portfolio_file(
    filename: &str,
    files: &State<FileManager>,
) -> Result<FileResponse, DownloadError> {
    handlers::download_portfolio_file_handler(filename, files).await
}

#[delete("/portfolio/files/<filename>")]
pub async fn delete_uploaded_file(
    filename: &str,
    files: &State<FileManager>,
) -> Result<Json<ActionResponse>, ApiError> {
    handlers::delete_uploaded_file_handler(filename, files).await
}

// ===== Generation =====

#[post("/generate", data = "<request>")]
pub async fn generate(
    request: Json<GenerateRequest>,
    config: &State<ConfigManager>,
    files: &State<FileManager>,
    settings: &State<SettingsStore>,
    db: &State<Database>,
    templates: &State<TemplateEngine>,
    pdf: &State<PdfRenderer>,
) -> Result<Json<DataResponse<GeneratedDraft>>, ApiError> {
    let ctx = GenerateContext {
        config,
        files,
        settings,
        db,
        templates,
        pdf,
    };
    handlers::generate_handler(request, ctx).await
}

#[post("/render/cv", data = "<request>")]
pub async fn render_cv(
    request: Json<RenderCvRequest>,
    db: &State<Database>,
    templates: &State<TemplateEngine>,
    pdf: &State<PdfRenderer>,
) -> Result<Json<DataResponse<HtmlPreview>>, ApiError> {
    handlers::render_cv_handler(request, db, templates, pdf).await
}

#[post("/render/cover-letter", data = "<request>")]
pub async fn render_cover_letter(
    request: Json<RenderCoverLetterRequest>,
    db: &State<Database>,
    templates: &State<TemplateEngine>,
    pdf: &State<PdfRenderer>,
) -> Result<Json<DataResponse<HtmlPreview>>, ApiError> {
    handlers::render_cover_letter_handler(request, db, templates, pdf).await
}

// ===== Submissions =====

#[get("/submissions?<search>")]
pub async fn list_submissions(
    search: Option<&str>,
    db: &State<Database>,
    templates: &State<TemplateEngine>,
    pdf: &State<PdfRenderer>,
) -> Result<Json<DataResponse<Vec<SubmissionSummary>>>, ApiError> {
    let service = SubmissionService::new(db, templates, pdf);
    handlers::list_submissions_handler(search, service).await
}

#[get("/submissions/page")]
pub async fn submissions_page(
    db: &State<Database>,
    templates: &State<TemplateEngine>,
    pdf: &State<PdfRenderer>,
) -> Result<RawHtml<String>, ApiError> {
    let service = SubmissionService::new(db, templates, pdf);
    handlers::submissions_page_handler(service).await
}

#[get("/submissions/export")]
pub async fn export_submissions(
    db: &State<Database>,
    templates: &State<TemplateEngine>,
    pdf: &State<PdfRenderer>,
) -> Result<CsvResponse, ApiError> {
    let service = SubmissionService::new(db, templates, pdf);
    handlers::export_submissions_handler(service).await
}

#[post("/submissions", data = "<request>")]
pub async fn save_submission(
    request: Json<SubmissionRequest>,
    db: &State<Database>,
    templates: &State<TemplateEngine>,
    pdf: &State<PdfRenderer>,
) -> Result<Json<DataResponse<SavedSubmission>>, ApiError> {
    let service = SubmissionService::new(db, templates, pdf);
    handlers::save_submission_handler(request, service).await
}

#[get("/submissions/<id>")]
pub async fn get_submission(
    id: i64,
    db: &State<Database>,
    templates: &State<TemplateEngine>,
    pdf: &State<PdfRenderer>,
) -> Result<Json<DataResponse<StoredSubmission>>, ApiError> {
    let service = SubmissionService::new(db, templates, pdf);
    handlers::get_submission_handler(id, service).await
}

#[put("/submissions/<id>", data = "<request>")]
pub async fn update_submission(
    id: i64,
    request: Json<SubmissionRequest>,
    db: &State<Database>,
    templates: &State<TemplateEngine>,
    pdf: &State<PdfRenderer>,
) -> Result<Json<ActionResponse>, ApiError> {
    let service = SubmissionService::new(db, templates, pdf);
    handlers::update_submission_handler(id, request, service).await
}

#[delete("/submissions/<id>")]
pub async fn delete_submission(
    id: i64,
    db: &State<Database>,
    templates: &State<TemplateEngine>,
    pdf: &State<PdfRenderer>,
) -> Result<Json<ActionResponse>, ApiError> {
    let service = SubmissionService::new(db, templates, pdf);
    handlers::delete_submission_handler(id, service).await
}

#[get("/submissions/<id>/cv")]
pub async fn download_cv(
    id: i64,
    db: &State<Database>,
    templates: &State<TemplateEngine>,
    pdf: &State<PdfRenderer>,
) -> Result<PdfResponse, DownloadError> {
    let service = SubmissionService::new(db, templates, pdf);
    handlers::download_cv_handler(id, service).await
}

#[get("/submissions/<id>/cover-letter")]
pub async fn download_cover_letter(
    id: i64,
    db: &State<Database>,
    templates: &State<TemplateEngine>,
    pdf: &State<PdfRenderer>,
) -> Result<PdfResponse, DownloadError> {
    let service = SubmissionService::new(db, templates, pdf);
    handlers::download_cover_letter_handler(id, service).await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Invalid request format".to_string(),
        "BAD_REQUEST".to_string(),
        vec![
            "Check your request JSON format".to_string(),
            "Verify all required fields are present".to_string(),
        ],
    ))
}

#[rocket::catch(404)]
pub fn not_found(request: &Request<'_>) -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        format!("No route for {} {}", request.method(), request.uri()),
        "NOT_FOUND".to_string(),
        vec!["Check the endpoint path".to_string()],
    ))
}

#[rocket::catch(422)]
pub fn unprocessable_entity() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Request body does not match the expected shape".to_string(),
        "INVALID_BODY".to_string(),
        vec!["Verify field names and types".to_string()],
    ))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Internal server error".to_string(),
        "INTERNAL_ERROR".to_string(),
        vec![
            "Try again in a few moments".to_string(),
            "Check the server logs".to_string(),
        ],
    ))
}

/// Rocket instance with every managed service built from the configuration
pub async fn build_rocket(config: ConfigManager) -> Result<Rocket<Build>> {
    config.ensure_directories().await?;

    let environment = &config.environment;
    let work_dir = environment.output_path.join("tmp");

    let database = Database::new(&environment.database_path).await?;
    let templates = TemplateEngine::new(environment.templates_path.clone())
        .context("Failed to load templates")?;
    let pdf = PdfRenderer::new(config.renderer.pdf_command.clone(), work_dir.clone());
    let ingestor = DocumentIngestor::new(config.renderer.markdown_command.clone(), work_dir);
    let files = FileManager::new(environment.output_path.clone());
    let settings = SettingsStore::new(environment.settings_path());

    app_log!(info, "Starting cv-tailor API server");
    app_log!(info, "Database: {}", environment.database_path.display());
    app_log!(info, "Output directory: {}", environment.output_path.display());
    app_log!(
        info,
        "Templates: {} CV, {} cover letter",
        templates.list_templates(Some(crate::core::TemplateKind::Cv)).len(),
        templates
            .list_templates(Some(crate::core::TemplateKind::CoverLetter))
            .len()
    );

    let limits = Limits::default()
        .limit("file", 10.mebibytes())
        .limit("data-form", 12.mebibytes())
        .limit("json", 5.mebibytes());
    let figment = rocket::Config::figment().merge(("limits", limits));

    let rocket = rocket::custom(figment)
        .attach(Cors)
        .manage(config)
        .manage(database)
        .manage(templates)
        .manage(pdf)
        .manage(ingestor)
        .manage(files)
        .manage(settings)
        .register(
            "/api",
            catchers![bad_request, not_found, unprocessable_entity, internal_error],
        )
        .mount(
            "/api",
            routes![
                health,
                get_templates,
                get_settings,
                update_settings,
                clear_settings,
                upload_portfolio,
                get_portfolio,
                update_portfolio,
                list_uploaded_files,
                download_uploaded_file,
                list_portfolio_files,
                download_portfolio_file,
                delete_uploaded_file,
                generate,
                render_cv,
                render_cover_letter,
                list_submissions,
                submissions_page,
                export_submissions,
                save_submission,
                get_submission,
                update_submission,
                delete_submission,
                download_cv,
                download_cover_letter,
                options,
            ],
        );

    Ok(rocket)
}

/// Serve the API under `/api`
pub async fn start_web_server(config: ConfigManager) -> Result<()> {
    build_rocket(config)
        .await?
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("Web server failed: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::http::ContentType;
    use rocket::local::asynchronous::Client;
    use rocket::serde::json::{serde_json, Value};

    async fn client(dir: &std::path::Path) -> Client {
        let mut config = ConfigManager::load_from(dir).unwrap();
        config.renderer.pdf_command = "cp".to_string();
        Client::tracked(build_rocket(config).await.unwrap())
            .await
            .unwrap()
    }

    async fn json(response: rocket::local::asynchronous::LocalResponse<'_>) -> Value {
        serde_json::from_str(&response.into_string().await.unwrap()).unwrap()
    }

    fn draft(company: &str) -> String {
        serde_json::json!({
            "final_cv": {"personality": {"name": "Ada"}, "job_title": "Engineer"},
            "final_cover_letter": {"name": "Ada", "body_paragraphs": ["Hello."]},
            "job_information": {"job_title": "Engineer", "company_name": company}
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_health_and_templates() {
        let dir = tempfile::tempdir().unwrap();
        let client = client(dir.path()).await;

        let response = client.get("/api/health").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(json(response).await["success"], true);

        let templates = json(client.get("/api/templates").dispatch().await).await;
        assert!(templates["data"]["cv"]
            .as_array()
            .unwrap()
            .iter()
            .any(|t| t["id"] == "sidebar"));
    }

    #[tokio::test]
    async fn test_submission_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let client = client(dir.path()).await;

        let rejected = json(
            client
                .post("/api/submissions")
                .header(ContentType::JSON)
                .body(draft(" "))
                .dispatch()
                .await,
        )
        .await;
        assert_eq!(rejected["error_code"], "MISSING_COMPANY");

        let saved = json(
            client
                .post("/api/submissions")
                .header(ContentType::JSON)
                .body(draft("Acme"))
                .dispatch()
                .await,
        )
        .await;
        let id = saved["data"]["id"].as_i64().unwrap();

        let listed = json(client.get("/api/submissions?search=acm").dispatch().await).await;
        assert_eq!(listed["data"][0]["company"], "Acme");

        let download = client
            .get(format!("/api/submissions/{}/cv", id))
            .dispatch()
            .await;
        assert_eq!(download.content_type(), Some(ContentType::PDF));
        let disposition = download
            .headers()
            .get_one("Content-Disposition")
            .unwrap()
            .to_string();
        assert!(disposition.contains("CV_Acme_Engineer.pdf"));
        assert!(download.into_string().await.unwrap().contains("Ada"));

        let page = client
            .get("/api/submissions/page")
            .dispatch()
            .await
            .into_string()
            .await
            .unwrap();
        assert!(page.contains("<td>Acme</td>"));

        let deleted = json(
            client
                .delete(format!("/api/submissions/{}", id))
                .dispatch()
                .await,
        )
        .await;
        assert_eq!(deleted["success"], true);

        let missing = client
            .get(format!("/api/submissions/{}/cover-letter", id))
            .dispatch()
            .await;
        assert_eq!(missing.status(), Status::NotFound);
        assert_eq!(json(missing).await["error_code"], "SUBMISSION_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_upload_rejects_unsupported_format() {
        let dir = tempfile::tempdir().unwrap();
        let client = client(dir.path()).await;

        let body = "--BOUNDARY\r\n\
            Content-Disposition: form-data; name=\"cv_file\"; filename=\"cv.exe\"\r\n\
            Content-Type: application/octet-stream\r\n\r\n\
            binary\r\n\
            --BOUNDARY--\r\n";
        let response = json(
            client
                .post("/api/portfolio/upload")
                .header(ContentType::new("multipart", "form-data").with_params(("boundary", "BOUNDARY")))
                .body(body)
                .dispatch()
                .await,
        )
        .await;
        assert_eq!(response["error_code"], "INVALID_FORMAT");

        let files = json(client.get("/api/portfolio/files").dispatch().await).await;
        assert!(files["data"]["files"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_stores_file_and_removes_temp_copy() {
        let dir = tempfile::tempdir().unwrap();
        let output = ConfigManager::load_from(dir.path())
            .unwrap()
            .environment
            .output_path;
        let client = client(dir.path()).await;

        let body = "--BOUNDARY\r\n\
            Content-Disposition: form-data; name=\"cv_file\"; filename=\"cv.md\"\r\n\
            Content-Type: text/markdown\r\n\r\n\
            # Ada Lovelace\r\n\
            --BOUNDARY--\r\n";
        client
            .post("/api/portfolio/upload")
            .header(ContentType::new("multipart", "form-data").with_params(("boundary", "BOUNDARY")))
            .body(body)
            .dispatch()
            .await;

        let leftovers = std::fs::read_dir(output.join("tmp"))
            .unwrap()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name().to_string_lossy().starts_with("upload_"))
            .count();
        assert_eq!(leftovers, 0);

        let files = json(client.get("/api/portfolio/files").dispatch().await).await;
        assert_eq!(files["data"]["files"][0]["original_name"], "cv.md");
        assert_eq!(
            std::fs::read_to_string(output.join("user_curriculum.md")).unwrap(),
            "# Ada Lovelace"
        );
    }

    #[tokio::test]
    async fn test_download_uploaded_and_portfolio_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigManager::load_from(dir.path()).unwrap();
        let output = config.environment.output_path.clone();
        let client = client(dir.path()).await;

        let files = FileManager::new(output);
        let (_, stored) = files
            .save_uploaded_file(b"# Ada Lovelace", "Ada CV.md")
            .await
            .unwrap();
        files.save_markdown("# Ada Lovelace").await.unwrap();
        files
            .save_portfolio_data(&Curriculum::default())
            .await
            .unwrap();

        let upload = client
            .get(format!("/api/portfolio/files/{}", stored))
            .dispatch()
            .await;
        assert_eq!(upload.status(), Status::Ok);
        let disposition = upload
            .headers()
            .get_one("Content-Disposition")
            .unwrap()
            .to_string();
        assert!(disposition.contains("filename=\"Ada_CV.md\""));
        assert_eq!(upload.into_string().await.unwrap(), "# Ada Lovelace");

        let listed = json(client.get("/api/portfolio/data").dispatch().await).await;
        let names: Vec<&str> = listed["data"]["files"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|f| f["filename"].as_str())
            .collect();
        assert_eq!(names, vec!["structured_cv.json", "user_curriculum.md"]);

        let portfolio = client
            .get("/api/portfolio/data/structured_cv.json")
            .dispatch()
            .await;
        assert_eq!(portfolio.content_type(), Some(ContentType::JSON));
        let value: Value = serde_json::from_str(&portfolio.into_string().await.unwrap()).unwrap();
        assert!(value.is_object());

        let markdown = client
            .get("/api/portfolio/data/user_curriculum.md")
            .dispatch()
            .await
            .into_string()
            .await
            .unwrap();
        assert_eq!(markdown, "# Ada Lovelace");

        let missing = client
            .get("/api/portfolio/files/20240101_120000_other.pdf")
            .dispatch()
            .await;
        assert_eq!(missing.status(), Status::NotFound);
        assert_eq!(json(missing).await["error_code"], "FILE_NOT_FOUND");

        let rejected = client
            .get("/api/portfolio/data/submissions.db")
            .dispatch()
            .await;
        assert_eq!(rejected.status(), Status::BadRequest);
        assert_eq!(json(rejected).await["error_code"], "INVALID_FILENAME");
    }

    #[tokio::test]
    async fn test_generate_requires_portfolio() {
        let dir = tempfile::tempdir().unwrap();
        let client = client(dir.path()).await;

        let response = json(
            client
                .post("/api/generate")
                .header(ContentType::JSON)
                .body(r#"{"job_description": "Rust engineer at Acme"}"#)
                .dispatch()
                .await,
        )
        .await;
        assert_eq!(response["error_code"], "PORTFOLIO_NOT_FOUND");
    }
}
