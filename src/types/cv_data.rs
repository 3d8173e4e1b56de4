// src/types/cv_data.rs
//! CV, cover letter and job description records exchanged with the model

use serde::{Deserialize, Serialize};

use super::schema::{
    object_list_property, object_schema, string_list_property, string_property, OutputSchema,
    StructuredOutput,
};

pub const DEFAULT_SALUTATION: &str = "Dear Hiring Manager,";
pub const DEFAULT_CLOSING: &str =
    "Thank you for considering my application. I look forward to hearing from you.";

// ===== Entries =====

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub title: Option<String>,
    pub company: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationExperience {
    pub title: Option<String>,
    pub school_name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewExperience {
    pub title: Option<String>,
    pub company: Option<String>,
    pub description: Option<String>,
    pub reasoning: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub e_mail: Option<String>,
    pub telephone: Option<String>,
    pub linkedin_link: Option<String>,
    pub address: Option<String>,
    pub job_title: Option<String>,
}

/// Entries that carry a start and end date.
pub trait Dated {
    fn start_date(&self) -> Option<&str>;
    fn end_date(&self) -> Option<&str>;
}

macro_rules! impl_dated {
    ($($ty:ty),*) => {
        $(impl Dated for $ty {
            fn start_date(&self) -> Option<&str> {
                self.start_date.as_deref()
            }

            fn end_date(&self) -> Option<&str> {
                self.end_date.as_deref()
            }
        })*
    };
}

impl_dated!(Experience, EducationExperience, NewExperience);

// ===== Model outputs =====

/// Portfolio extracted from the user's original CV.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Curriculum {
    pub personality: Option<Personality>,
    pub experiences: Option<Vec<Experience>>,
    pub projects: Option<Vec<Experience>>,
    pub hard_skills: Option<Vec<String>>,
    pub soft_skills: Option<Vec<String>>,
    pub education: Option<Vec<EducationExperience>>,
    pub summary: Option<String>,
}

/// Content rewritten by the model for one job description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewCurriculum {
    pub job_title: Option<String>,
    pub experiences: Option<Vec<NewExperience>>,
    pub projects: Option<Vec<NewExperience>>,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptionInformation {
    pub job_title: Option<String>,
    pub company_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverLetter {
    pub salutation: Option<String>,
    pub body_paragraphs: Option<Vec<String>>,
    pub closing: Option<String>,
}

// ===== Final documents =====

/// The tailored CV handed to the renderer and kept with a submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinalCurriculum {
    pub personality: Personality,
    pub job_title: Option<String>,
    pub summary: Option<String>,
    pub experiences: Vec<NewExperience>,
    pub projects: Vec<NewExperience>,
    pub education: Vec<EducationExperience>,
    pub hard_skills: Vec<String>,
    pub soft_skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinalCoverLetter {
    pub name: String,
    pub surname: String,
    pub current_position: String,
    pub email: String,
    pub phone: String,
    pub linkedin: String,
    pub github: String,
    pub date: String,
    pub recipient_name: String,
    pub company_name: String,
    pub company_address: String,
    pub position_title: String,
    pub salutation: String,
    pub body_paragraphs: Vec<String>,
    pub closing: String,
}

impl Default for FinalCoverLetter {
    fn default() -> Self {
        Self {
            name: String::new(),
            surname: String::new(),
            current_position: String::new(),
            email: String::new(),
            phone: String::new(),
            linkedin: String::new(),
            github: String::new(),
            date: String::new(),
            recipient_name: String::new(),
            company_name: String::new(),
            company_address: String::new(),
            position_title: String::new(),
            salutation: DEFAULT_SALUTATION.to_string(),
            body_paragraphs: Vec::new(),
            closing: DEFAULT_CLOSING.to_string(),
        }
    }
}

impl Curriculum {
    pub fn personality_or_default(&self) -> Personality {
        self.personality.clone().unwrap_or_default()
    }

    /// Full name of the CV holder, empty when the model found none.
    pub fn display_name(&self) -> String {
        let personality = self.personality_or_default();
        [personality.name, personality.surname]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ===== Schemas =====

fn experience_schema() -> serde_json::Value {
    object_schema(
        None,
        vec![
            (
                "title",
                string_property(
                    "Title or position held in a past experience listed in the original CV.",
                ),
            ),
            (
                "company",
                string_property(
                    "Name of the company or organization listed in the original CV.",
                ),
            ),
            (
                "description",
                string_property("Brief explanation or bullet points describing the responsibilities and achievements in this experience."),
            ),
            (
                "start_date",
                string_property("Starting date (or year) of this experience."),
            ),
            (
                "end_date",
                string_property("End date (or year) of this experience."),
            ),
        ],
    )
}

fn education_schema() -> serde_json::Value {
    object_schema(
        None,
        vec![
            (
                "title",
                string_property("Title of the education experience listed in the original CV."),
            ),
            (
                "school_name",
                string_property("Name of the school or university listed in the original CV."),
            ),
            (
                "description",
                string_property("Brief explanation or bullet points describing the responsibilities and achievements in this experience, including grade and learnt skills."),
            ),
            (
                "start_date",
                string_property("Starting date (or year) of this experience."),
            ),
            (
                "end_date",
                string_property("End date (or year) of this experience."),
            ),
        ],
    )
}

fn new_experience_schema() -> serde_json::Value {
    object_schema(
        None,
        vec![
            (
                "title",
                string_property("Title or position for a proposed experience tailored to match job requirements."),
            ),
            (
                "company",
                string_property(
                    "Name of the company or organization listed in the original CV.",
                ),
            ),
            (
                "description",
                string_property("Generated description for this tailored experience, optimized to reflect alignment with the job description."),
            ),
            (
                "reasoning",
                string_property("Justification for including this experience in the revised CV based on relevance to the target job."),
            ),
            (
                "start_date",
                string_property("Starting date (or year) of this experience."),
            ),
            (
                "end_date",
                string_property("End date (or year) of this experience."),
            ),
        ],
    )
}

fn personality_schema() -> serde_json::Value {
    object_schema(
        Some("Personal and contact information from the original CV."),
        vec![
            ("name", string_property("First name of the CV holder.")),
            (
                "surname",
                string_property("Last name (surname) of the CV holder."),
            ),
            ("e_mail", string_property("e-mail to contact the CV holder.")),
            (
                "telephone",
                string_property("Phone number to contact the CV holder."),
            ),
            (
                "linkedin_link",
                string_property("URL to the CV holder's LinkedIn profile."),
            ),
            (
                "address",
                string_property("Physical or mailing address of the CV holder."),
            ),
            ("job_title", string_property("Current job title.")),
        ],
    )
}

impl StructuredOutput for Curriculum {
    fn output_schema() -> OutputSchema {
        OutputSchema {
            name: "curriculum",
            schema: object_schema(
                None,
                vec![
                    ("personality", personality_schema()),
                    (
                        "experiences",
                        object_list_property(
                            "List of professional or educational experiences extracted from the original CV.",
                            experience_schema(),
                        ),
                    ),
                    (
                        "projects",
                        object_list_property(
                            "List of projects extracted from the original CV.",
                            experience_schema(),
                        ),
                    ),
                    (
                        "hard_skills",
                        string_list_property("Explicit technical skills (e.g., programming, data analysis) listed in the CV."),
                    ),
                    (
                        "soft_skills",
                        string_list_property("Interpersonal or non-technical skills (e.g., teamwork, communication) from the CV."),
                    ),
                    (
                        "education",
                        object_list_property(
                            "Educational information (e.g. schools, university) from the CV.",
                            education_schema(),
                        ),
                    ),
                    (
                        "summary",
                        string_property("Key summary statements or objective section originally included in the CV."),
                    ),
                ],
            ),
        }
    }
}

impl StructuredOutput for NewCurriculum {
    fn output_schema() -> OutputSchema {
        OutputSchema {
            name: "new_curriculum",
            schema: object_schema(
                None,
                vec![
                    (
                        "job_title",
                        string_property("Job position that matches the job description."),
                    ),
                    (
                        "experiences",
                        object_list_property(
                            "Newly generated work-experiences curated to best align with the job requirements. Each includes reasoning for selection.",
                            new_experience_schema(),
                        ),
                    ),
                    (
                        "projects",
                        object_list_property(
                            "Newly generated projects curated to best align with the job requirements. Each includes reasoning for selection.",
                            new_experience_schema(),
                        ),
                    ),
                    (
                        "summary",
                        string_property("Generated summary statements designed to closely match the target job's qualifications and tone."),
                    ),
                ],
            ),
        }
    }
}

impl StructuredOutput for JobDescriptionInformation {
    fn output_schema() -> OutputSchema {
        OutputSchema {
            name: "job_description_information",
            schema: object_schema(
                None,
                vec![
                    (
                        "job_title",
                        string_property("The advertised job title or role, such as 'Software Engineer' or 'Marketing Manager'."),
                    ),
                    (
                        "company_name",
                        string_property("The name of the company offering the position, as stated in the job description."),
                    ),
                ],
            ),
        }
    }
}

impl StructuredOutput for CoverLetter {
    fn output_schema() -> OutputSchema {
        OutputSchema {
            name: "cover_letter",
            schema: object_schema(
                None,
                vec![
                    (
                        "salutation",
                        string_property("The greeting line at the start of the cover letter, e.g., 'Dear Hiring Manager,' or 'Dear [Recipient Name],'."),
                    ),
                    (
                        "body_paragraphs",
                        string_list_property("The main body of the cover letter, consisting of 2-4 paragraphs that outline your qualifications, experience, and interest in the role."),
                    ),
                    (
                        "closing",
                        string_property("The final closing statement of the letter, typically expressing gratitude and interest in further communication, e.g., 'Thank you for your time and consideration.'"),
                    ),
                ],
            ),
        }
    }
}
