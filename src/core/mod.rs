// src/core/mod.rs
//! Configuration, storage and document conversion services

pub mod config_manager;
pub mod database;
pub mod file_store;
pub mod fs_ops;
pub mod ingestion;
pub mod pdf;
pub mod settings;
pub mod template_engine;

pub use config_manager::ConfigManager;
pub use database::{Database, SubmissionRepository};
pub use file_store::FileManager;
pub use fs_ops::FsOps;
pub use ingestion::DocumentIngestor;
pub use pdf::PdfRenderer;
pub use settings::{SettingsStore, UserSettings};
pub use template_engine::{TemplateEngine, TemplateKind};
