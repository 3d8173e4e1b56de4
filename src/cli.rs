// src/cli.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::app_log;
use crate::core::{
    ConfigManager, Database, DocumentIngestor, FileManager, FsOps, PdfRenderer, SettingsStore,
    TemplateEngine, TemplateKind,
};
use crate::extractor::InformationExtractor;
use crate::job_source::JobFetcher;
use crate::llm::build_model;
use crate::submissions::{SubmissionService, TemplateSelection};
use crate::types::{Curriculum, Draft};
use crate::web::start_web_server;

#[derive(Parser)]
#[command(name = "cv-tailor")]
#[command(about = "Tailor your CV and cover letter to each job description")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding config.yaml; relative paths are resolved against it
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP API
    Serve,
    /// Convert a CV document and extract the portfolio from it
    Ingest { file: PathBuf },
    /// Show or replace the stored portfolio
    Portfolio {
        #[command(subcommand)]
        action: PortfolioCommand,
    },
    /// Tailor a CV and cover letter to a job description and write the draft as JSON
    Generate {
        /// File containing the job description text
        #[arg(long, conflicts_with = "job_url")]
        job_file: Option<PathBuf>,
        /// URL of a public job posting
        #[arg(long)]
        job_url: Option<String>,
        #[arg(long, short, default_value = "draft.json")]
        output: PathBuf,
        /// Also write the rendered HTML previews next to the draft
        #[arg(long)]
        html: bool,
        #[arg(long)]
        cv_template: Option<String>,
        #[arg(long)]
        cover_letter_template: Option<String>,
    },
    /// Manage saved submissions
    Submissions {
        #[command(subcommand)]
        action: SubmissionsCommand,
    },
    /// Manage API keys and the selected model
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },
    /// List available templates
    Templates,
}

#[derive(Subcommand)]
pub enum PortfolioCommand {
    /// Print the stored portfolio as JSON
    Show,
    /// Replace the portfolio with a JSON file
    Set { file: PathBuf },
}

#[derive(Subcommand)]
pub enum SubmissionsCommand {
    /// List submissions, optionally filtered by company or position
    List {
        #[arg(long)]
        search: Option<String>,
    },
    /// Save a draft JSON file as a submission
    Save {
        draft: PathBuf,
        #[arg(long)]
        cv_template: Option<String>,
        #[arg(long)]
        cover_letter_template: Option<String>,
    },
    /// Write the CV and cover letter PDFs of a submission (latest by default)
    Download {
        id: Option<i64>,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Export the submission list as CSV
    Export {
        #[arg(long, short, default_value = "submissions.csv")]
        output: PathBuf,
    },
    /// Delete a submission
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Show settings with API keys masked
    Show,
    /// Set openai_api_key, gemini_api_key or selected_model
    Set { key: String, value: String },
    /// Remove the saved settings file
    Clear,
}

/// Services the commands run against
struct App {
    config: ConfigManager,
    files: FileManager,
    settings: SettingsStore,
}

impl App {
    fn new(config: ConfigManager) -> Self {
        let files = FileManager::new(config.environment.output_path.clone());
        let settings = SettingsStore::new(config.environment.settings_path());
        Self {
            config,
            files,
            settings,
        }
    }

    fn work_dir(&self) -> PathBuf {
        self.config.environment.output_path.join("tmp")
    }

    fn templates(&self) -> Result<TemplateEngine> {
        TemplateEngine::new(self.config.environment.templates_path.clone())
    }

    fn pdf(&self) -> PdfRenderer {
        PdfRenderer::new(self.config.renderer.pdf_command.clone(), self.work_dir())
    }

    async fn database(&self) -> Result<Database> {
        Database::new(&self.config.environment.database_path).await
    }

    async fn portfolio(&self) -> Result<Curriculum> {
        self.files
            .load_portfolio_data()
            .await?
            .context("No portfolio found. Run `cv-tailor ingest <cv file>` first")
    }
}

pub async fn handle_command(cli: Cli) -> Result<()> {
    let config = match &cli.base_dir {
        Some(dir) => ConfigManager::load_from(dir)?,
        None => ConfigManager::load()?,
    };
    config.ensure_directories().await?;

    let app = App::new(config);

    match cli.command {
        Command::Serve => start_web_server(app.config).await,
        Command::Ingest { file } => ingest(&app, &file).await,
        Command::Portfolio { action } => portfolio(&app, action).await,
        Command::Generate {
            job_file,
            job_url,
            output,
            html,
            cv_template,
            cover_letter_template,
        } => {
            let selection = TemplateSelection {
                cv: cv_template,
                cover_letter: cover_letter_template,
            };
            generate(&app, job_file, job_url, &output, html, &selection).await
        }
        Command::Submissions { action } => submissions(&app, action).await,
        Command::Settings { action } => settings(&app, action).await,
        Command::Templates => templates(&app),
    }
}

async fn ingest(app: &App, file: &Path) -> Result<()> {
    let filename = file
        .file_name()
        .and_then(|n| n.to_str())
        .context("Invalid file name")?;
    let content = FsOps::read_bytes(file).await?;

    app.files.save_uploaded_file(&content, filename).await?;

    let ingestor = DocumentIngestor::new(app.config.renderer.markdown_command.clone(), app.work_dir());
    let markdown = ingestor.to_markdown(filename, &content).await?;
    app.files.save_markdown(&markdown).await?;

    let user_settings = app.settings.load().await?;
    let model = build_model(&user_settings, &app.config.service)?;
    let portfolio = InformationExtractor::new(model.as_ref())
        .extract_data(&markdown)
        .await?;

    let path = app.files.save_portfolio_data(&portfolio).await?;
    app_log!(
        info,
        "✅ Portfolio for {} saved to {}",
        portfolio.display_name(),
        path.display()
    );
    Ok(())
}

async fn portfolio(app: &App, action: PortfolioCommand) -> Result<()> {
    match action {
        PortfolioCommand::Show => {
            let portfolio = app.portfolio().await?;
            println!("{}", serde_json::to_string_pretty(&portfolio)?);
        }
        PortfolioCommand::Set { file } => {
            let content = FsOps::read_file_safe(&file).await?;
            let portfolio: Curriculum = serde_json::from_str(&content)
                .with_context(|| format!("{} is not a valid portfolio", file.display()))?;
            app.files.save_portfolio_data(&portfolio).await?;
            app_log!(info, "✅ Portfolio updated for {}", portfolio.display_name());
        }
    }
    Ok(())
}

async fn generate(
    app: &App,
    job_file: Option<PathBuf>,
    job_url: Option<String>,
    output: &Path,
    html: bool,
    selection: &TemplateSelection,
) -> Result<()> {
    let portfolio = app.portfolio().await?;

    let job_description = match (job_file, job_url) {
        (Some(file), _) => FsOps::read_file_safe(&file).await?,
        (None, Some(url)) => JobFetcher::new(app.config.service.timeout_seconds)?
            .fetch(&url)
            .await?
            .to_job_description(),
        (None, None) => anyhow::bail!("Provide --job-file or --job-url"),
    };
    if job_description.trim().is_empty() {
        anyhow::bail!("The job description is empty");
    }

    let user_settings = app.settings.load().await?;
    let model = build_model(&user_settings, &app.config.service)?;
    let draft = InformationExtractor::new(model.as_ref())
        .tailor(&portfolio, &job_description)
        .await?;

    let content = serde_json::to_string_pretty(&draft)?;
    FsOps::write_file_safe(output, &content).await?;
    app_log!(
        info,
        "✅ Draft for {} at {} written to {}",
        draft.position().unwrap_or("?"),
        draft.company().unwrap_or("?"),
        output.display()
    );

    if html {
        let templates = app.templates()?;
        let db = app.database().await?;
        let pdf = app.pdf();
        let rendered = SubmissionService::new(&db, &templates, &pdf).render(&draft, selection)?;

        let cv_path = output.with_extension("cv.html");
        let letter_path = output.with_extension("cover_letter.html");
        FsOps::write_file_safe(&cv_path, &rendered.cv_html).await?;
        FsOps::write_file_safe(&letter_path, &rendered.cover_letter_html).await?;
        app_log!(
            info,
            "   Previews: {}, {}",
            cv_path.display(),
            letter_path.display()
        );
    }

    Ok(())
}

async fn submissions(app: &App, action: SubmissionsCommand) -> Result<()> {
    let db = app.database().await?;
    let templates = app.templates()?;
    let pdf = app.pdf();
    let service = SubmissionService::new(&db, &templates, &pdf);

    match action {
        SubmissionsCommand::List { search } => {
            let rows = service.list(search.as_deref()).await?;
            if rows.is_empty() {
                app_log!(info, "No submissions found.");
                return Ok(());
            }
            println!(
                "{:<5} {:<30} {:<30} {:<20}",
                "ID", "Company", "Position", "Date"
            );
            println!("{}", "-".repeat(85));
            for row in rows {
                println!(
                    "{:<5} {:<30} {:<30} {:<20}",
                    row.id,
                    row.company,
                    row.position,
                    row.submission_date.format("%Y-%m-%d %H:%M")
                );
            }
        }
        SubmissionsCommand::Save {
            draft,
            cv_template,
            cover_letter_template,
        } => {
            let content = FsOps::read_file_safe(&draft).await?;
            let draft: Draft = serde_json::from_str(&content)
                .with_context(|| format!("{} is not a valid draft", draft.display()))?;
            let selection = TemplateSelection {
                cv: cv_template,
                cover_letter: cover_letter_template,
            };
            let id = service.save(&draft, &selection).await?;
            app_log!(info, "✅ Submission {} saved", id);
        }
        SubmissionsCommand::Download { id, out_dir } => {
            let id = match id {
                Some(id) => id,
                None => service
                    .latest_id()
                    .await?
                    .context("No submissions saved yet")?,
            };
            FsOps::ensure_dir_exists(&out_dir).await?;
            for document in [
                service.download_cv(id).await?,
                service.download_cover_letter(id).await?,
            ] {
                let path = out_dir.join(&document.filename);
                FsOps::write_bytes(&path, &document.content).await?;
                app_log!(info, "✅ Wrote {}", path.display());
            }
        }
        SubmissionsCommand::Export { output } => {
            let csv = service.export_csv().await?;
            FsOps::write_file_safe(&output, &csv).await?;
            app_log!(info, "✅ Exported submissions to {}", output.display());
        }
        SubmissionsCommand::Delete { id } => {
            service.delete(id).await?;
            app_log!(info, "✅ Submission {} deleted", id);
        }
    }

    Ok(())
}

async fn settings(app: &App, action: SettingsCommand) -> Result<()> {
    match action {
        SettingsCommand::Show => {
            let current = app.settings.load().await?;
            let masked = current.masked();
            println!("selected_model = {}", masked.selected_model);
            println!("openai_api_key = {}", masked.openai_api_key);
            println!("gemini_api_key = {}", masked.gemini_api_key);
            if !current.is_ready() {
                app_log!(
                    warn,
                    "No API key configured for {}",
                    current.selected_model
                );
            }
        }
        SettingsCommand::Set { key, value } => {
            app.settings.set_value(&key, &value).await?;
            app_log!(info, "✅ {} updated", key);
        }
        SettingsCommand::Clear => {
            if app.settings.clear().await? {
                app_log!(info, "✅ Settings cleared");
            } else {
                app_log!(info, "No saved settings at {}", app.settings.path().display());
            }
        }
    }
    Ok(())
}

fn templates(app: &App) -> Result<()> {
    let engine = app.templates()?;
    for kind in [TemplateKind::Cv, TemplateKind::CoverLetter] {
        let label = match kind {
            TemplateKind::Cv => "CV templates",
            TemplateKind::CoverLetter => "Cover letter templates",
        };
        println!("{}:", label);
        for template in engine.list_templates(Some(kind)) {
            let marker = if template.id == kind.default_template() {
                " (default)"
            } else {
                ""
            };
            println!(
                "  {:<12} {}{}",
                template.id,
                template.description.as_deref().unwrap_or(&template.name),
                marker
            );
        }
    }
    Ok(())
}
