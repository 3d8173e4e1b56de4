//! Job description text from a posting URL

use anyhow::{Context, Result};
use scraper::{Html, Selector};
use serde::Serialize;
use std::time::Duration;

use crate::app_log;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JobPosting {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
}

impl JobPosting {
    /// Plain text handed to the model as the job description
    pub fn to_job_description(&self) -> String {
        let mut lines = Vec::new();
        if !self.title.is_empty() {
            lines.push(format!("Job title: {}", self.title));
        }
        if !self.company.is_empty() {
            lines.push(format!("Company: {}", self.company));
        }
        if !self.location.is_empty() {
            lines.push(format!("Location: {}", self.location));
        }
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(self.description.clone());
        lines.join("\n")
    }
}

pub struct JobFetcher {
    client: reqwest::Client,
}

impl JobFetcher {
    pub fn new(timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }

    pub async fn fetch(&self, url: &str) -> Result<JobPosting> {
        app_log!(info, "Fetching job post: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to fetch job post")?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP error: {}", response.status());
        }

        let html = response
            .text()
            .await
            .context("Failed to read response body")?;

        let posting = parse_posting(&html).context("Failed to extract job content from page")?;
        app_log!(
            info,
            "Extracted job: {} at {}",
            posting.title,
            posting.company
        );
        Ok(posting)
    }
}

pub fn parse_posting(html: &str) -> Option<JobPosting> {
    let document = Html::parse_document(html);
    parse_linkedin_job(&document)
        .or_else(|| parse_generic_job(&document))
        .or_else(|| parse_body_text(&document))
}

fn parse_linkedin_job(document: &Html) -> Option<JobPosting> {
    let title = find_text_by_selectors(
        document,
        &[
            "h1.top-card-layout__title",
            ".job-details-jobs-unified-top-card__job-title",
            "h1[data-test-id='job-title']",
        ],
    )?;
    let company = find_text_by_selectors(
        document,
        &[
            ".job-details-jobs-unified-top-card__company-name",
            ".top-card-layout__card .top-card-layout__second-subline",
            "a[data-test-id='job-poster-name']",
        ],
    )?;
    let description = find_text_by_selectors(
        document,
        &[
            ".jobs-box__html-content",
            ".jobs-description__container",
            ".show-more-less-html__markup",
            "[data-test-id='job-description']",
        ],
    )?;
    let location = find_text_by_selectors(
        document,
        &[
            ".job-details-jobs-unified-top-card__bullet",
            ".top-card-layout__card .top-card-layout__first-subline",
            "[data-test-id='job-location']",
        ],
    )
    .unwrap_or_default();

    Some(JobPosting {
        title,
        company,
        location,
        description,
    })
}

fn parse_generic_job(document: &Html) -> Option<JobPosting> {
    app_log!(debug, "Falling back to generic job parsing");

    let title = find_text_by_selectors(document, &["h1", "[class*='job-title']", "[class*='title']"])?;
    let company = find_text_by_selectors(
        document,
        &["[class*='company']", "[class*='employer']", "[class*='organization']"],
    )
    .unwrap_or_default();
    let description = find_text_by_selectors(
        document,
        &["[class*='description']", "main", "article", "[class*='content']"],
    )?;

    Some(JobPosting {
        title,
        company,
        location: String::new(),
        description,
    })
}

fn parse_body_text(document: &Html) -> Option<JobPosting> {
    let description = find_text_by_selectors(document, &["body"])?;
    Some(JobPosting {
        description,
        ..Default::default()
    })
}

fn find_text_by_selectors(document: &Html, selectors: &[&str]) -> Option<String> {
    for selector_str in selectors {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text = clean_text(&element.text().collect::<Vec<_>>().join(" "));
            if text.len() > 5 {
                return Some(text);
            }
        }
    }
    None
}

fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
