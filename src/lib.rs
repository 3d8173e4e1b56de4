//! Job-tailored CV and cover letter generation.
//!
//! A CV is ingested once into a structured portfolio, then for each job
//! description the language model rewrites the relevant parts. The results are
//! rendered to HTML, exported to PDF and kept as submissions in SQLite.

pub mod cli;
pub mod core;
pub mod extractor;
pub mod job_source;
pub mod llm;
pub mod render;
pub mod submissions;
pub mod types;
pub mod utils;
pub mod web;

pub use extractor::InformationExtractor;
pub use submissions::{SubmissionError, SubmissionService};
pub use web::start_web_server;

/// Structured log event: `app_log!(info, "Saved {}", id)`.
#[macro_export]
macro_rules! app_log {
    (trace, $($arg:tt)+) => { ::tracing::trace!($($arg)+) };
    (debug, $($arg:tt)+) => { ::tracing::debug!($($arg)+) };
    (info, $($arg:tt)+) => { ::tracing::info!($($arg)+) };
    (warn, $($arg:tt)+) => { ::tracing::warn!($($arg)+) };
    (error, $($arg:tt)+) => { ::tracing::error!($($arg)+) };
}

/// Info-level span with optional fields: `app_span!("generate", company = %name)`.
#[macro_export]
macro_rules! app_span {
    ($name:expr) => { ::tracing::info_span!($name) };
    ($name:expr, $($fields:tt)+) => { ::tracing::info_span!($name, $($fields)+) };
}
