//! HTML rendering of final documents and the submissions table

use anyhow::Result;
use std::collections::HashMap;

use crate::core::database::SubmissionSummary;
use crate::core::template_engine::TemplateInfo;
use crate::core::TemplateEngine;
use crate::types::{
    Dated, EducationExperience, FinalCoverLetter, FinalCurriculum, NewExperience, Personality,
};
use crate::utils::escape_html;

const SKILL_SEPARATOR: &str = " • ";

/// Escaped text with line breaks kept
fn text(value: &str) -> String {
    escape_html(value.trim()).replace('\n', "<br />")
}

fn opt_text(value: Option<&str>) -> String {
    value.map(text).unwrap_or_default()
}

fn present(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != "null")
}

/// `(start - end)`, `(start)`, `(end)` or nothing
pub fn format_date(entry: &dyn Dated) -> String {
    match (present(entry.start_date()), present(entry.end_date())) {
        (Some(start), Some(end)) => format!("({} - {})", escape_html(start), escape_html(end)),
        (Some(start), None) => format!("({})", escape_html(start)),
        (None, Some(end)) => format!("({})", escape_html(end)),
        (None, None) => String::new(),
    }
}

pub fn format_skills(skills: &[String]) -> String {
    skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(escape_html)
        .collect::<Vec<_>>()
        .join(SKILL_SEPARATOR)
}

/// Contact line: address, telephone, e-mail and LinkedIn, only the parts that are set
pub fn format_contact_info(personality: &Personality) -> String {
    let mut parts = Vec::new();

    if let Some(address) = present(personality.address.as_deref()) {
        parts.push(format!("<span class=\"contact-item\">📍 {}</span>", text(address)));
    }
    if let Some(telephone) = present(personality.telephone.as_deref()) {
        parts.push(format!("<span class=\"contact-item\">📞 {}</span>", text(telephone)));
    }
    if let Some(email) = present(personality.e_mail.as_deref()) {
        parts.push(format!("<span class=\"contact-item\">✉️ {}</span>", text(email)));
    }
    if let Some(link) = present(personality.linkedin_link.as_deref()) {
        let link = escape_html(link);
        parts.push(format!(
            "<span class=\"contact-item\">💼 <a href=\"{0}\">{0}</a></span>",
            link
        ));
    }

    parts.join(" ")
}

fn entry(heading: &str, date: &str, description: Option<&str>) -> String {
    format!(
        r#"<div class="entry">
    <div class="entry-header"><strong>{}</strong><span class="cv-date">{}</span></div>
    <p>{}</p>
</div>
"#,
        heading,
        date,
        opt_text(description)
    )
}

fn joined_heading(first: Option<&str>, second: Option<&str>, separator: &str) -> String {
    [present(first), present(second)]
        .into_iter()
        .flatten()
        .map(text)
        .collect::<Vec<_>>()
        .join(separator)
}

fn format_experience(experience: &NewExperience) -> String {
    entry(
        &joined_heading(
            experience.title.as_deref(),
            experience.company.as_deref(),
            " - ",
        ),
        &format_date(experience),
        experience.description.as_deref(),
    )
}

fn format_project(project: &NewExperience) -> String {
    entry(
        &opt_text(project.title.as_deref()),
        &format_date(project),
        project.description.as_deref(),
    )
}

fn format_education(education: &EducationExperience) -> String {
    entry(
        &joined_heading(
            education.title.as_deref(),
            education.school_name.as_deref(),
            ", ",
        ),
        &format_date(education),
        education.description.as_deref(),
    )
}

fn vars(pairs: Vec<(&str, String)>) -> HashMap<String, String> {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

pub fn render_cv_html(cv: &FinalCurriculum, template: &TemplateInfo) -> Result<String> {
    let personality = &cv.personality;
    let variables = vars(vec![
        ("name", opt_text(personality.name.as_deref())),
        ("surname", opt_text(personality.surname.as_deref())),
        ("job_title", opt_text(cv.job_title.as_deref())),
        ("summary", opt_text(cv.summary.as_deref())),
        ("contact_info", format_contact_info(personality)),
        (
            "experiences",
            cv.experiences.iter().map(format_experience).collect(),
        ),
        ("projects", cv.projects.iter().map(format_project).collect()),
        (
            "education",
            cv.education.iter().map(format_education).collect(),
        ),
        ("hard_skills", format_skills(&cv.hard_skills)),
        ("soft_skills", format_skills(&cv.soft_skills)),
    ]);

    Ok(TemplateEngine::process_variables(
        &template.content()?,
        &variables,
    ))
}

pub fn render_cover_letter_html(
    letter: &FinalCoverLetter,
    template: &TemplateInfo,
) -> Result<String> {
    let mut contact = Vec::new();
    for value in [&letter.email, &letter.phone] {
        if let Some(value) = present(Some(value.as_str())) {
            contact.push(format!("<span>{}</span>", text(value)));
        }
    }
    for link in [&letter.linkedin, &letter.github] {
        if let Some(link) = present(Some(link.as_str())) {
            contact.push(format!("<span><a href=\"{0}\">{0}</a></span>", escape_html(link)));
        }
    }

    let body_content: String = letter
        .body_paragraphs
        .iter()
        .filter(|p| !p.trim().is_empty())
        .map(|p| format!("<p>{}</p>\n", text(p)))
        .collect();

    let variables = vars(vec![
        ("name", text(&letter.name)),
        ("surname", text(&letter.surname)),
        ("current_position", text(&letter.current_position)),
        ("email", text(&letter.email)),
        ("phone", text(&letter.phone)),
        ("linkedin", text(&letter.linkedin)),
        ("github", text(&letter.github)),
        ("contact_info", contact.join(" ")),
        ("date", text(&letter.date)),
        ("recipient_name", text(&letter.recipient_name)),
        ("company_name", text(&letter.company_name)),
        ("company_address", text(&letter.company_address)),
        ("position_title", text(&letter.position_title)),
        ("salutation", text(&letter.salutation)),
        ("body_content", body_content),
        ("closing", text(&letter.closing)),
    ]);

    Ok(TemplateEngine::process_variables(
        &template.content()?,
        &variables,
    ))
}

/// Standalone page listing saved submissions
pub fn render_submissions_html(submissions: &[SubmissionSummary]) -> String {
    let rows: String = if submissions.is_empty() {
        "<tr><td colspan=\"4\">No submissions yet</td></tr>\n".to_string()
    } else {
        submissions
            .iter()
            .map(|s| {
                format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                    s.id,
                    escape_html(&s.company),
                    escape_html(&s.position),
                    s.submission_date.format("%Y-%m-%d %H:%M")
                )
            })
            .collect()
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8" />
    <title>Submissions</title>
    <style>
        body {{ font-family: Arial, sans-serif; margin: 2rem; color: #333; }}
        table {{ border-collapse: collapse; width: 100%; }}
        th, td {{ border-bottom: 1px solid #ddd; padding: 0.5rem; text-align: left; }}
        th {{ background: #f4f4f8; }}
    </style>
</head>
<body>
    <h1>Submissions</h1>
    <table>
        <thead><tr><th>ID</th><th>Company</th><th>Position</th><th>Date</th></tr></thead>
        <tbody>
{}        </tbody>
    </table>
</body>
</html>
"#,
        rows
    )
}
