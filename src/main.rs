use anyhow::{Context, Result};
use clap::Parser;
use cv_tailor::cli::{handle_command, Cli};
use std::fs::OpenOptions;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "cv_tailor=info,rocket::server=off";

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;
    handle_command(Cli::parse()).await
}

/// Human-readable logs on stderr, plus JSON lines when `CV_TAILOR_LOG_FILE` is set
fn init_logging() -> Result<()> {
    let json_layer = match std::env::var("CV_TAILOR_LOG_FILE") {
        Ok(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file {}", path))?;
            Some(
                fmt::layer()
                    .json()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_current_span(false)
                    .with_span_list(false),
            )
        }
        Err(_) => None,
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(json_layer)
        .init();

    Ok(())
}
