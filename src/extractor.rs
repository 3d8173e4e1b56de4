//! Extraction and tailoring pipeline on top of a [`LanguageModel`]

use chrono::Local;
use tracing::Instrument;

use crate::llm::{prompts, structured, ChatMessage, LanguageModel, ModelError};
use crate::types::{
    CoverLetter, Curriculum, Draft, FinalCoverLetter, FinalCurriculum, JobDescriptionInformation,
    NewCurriculum, DEFAULT_CLOSING, DEFAULT_SALUTATION,
};
use crate::{app_log, app_span};

pub struct InformationExtractor<'a> {
    model: &'a dyn LanguageModel,
}

impl<'a> InformationExtractor<'a> {
    pub fn new(model: &'a dyn LanguageModel) -> Self {
        Self { model }
    }

    /// Structured portfolio from the markdown of the user's CV
    pub async fn extract_data(&self, markdown_cv: &str) -> Result<Curriculum, ModelError> {
        let messages = [
            ChatMessage::system(prompts::DATA_EXTRACTION),
            ChatMessage::user(prompts::portfolio_message(markdown_cv)),
        ];
        let curriculum: Curriculum = structured(self.model, &messages).await?;
        app_log!(
            info,
            "Extracted portfolio: {} experiences, {} projects",
            curriculum.experiences.as_ref().map_or(0, Vec::len),
            curriculum.projects.as_ref().map_or(0, Vec::len)
        );
        Ok(curriculum)
    }

    pub async fn create_new_cv(
        &self,
        portfolio: &Curriculum,
        job_description: &str,
    ) -> Result<NewCurriculum, ModelError> {
        let messages = [
            ChatMessage::system(prompts::CURRICULUM_CREATION),
            self.portfolio_with_job(portfolio, job_description)?,
        ];
        structured(self.model, &messages).await
    }

    pub async fn create_cover_letter(
        &self,
        portfolio: &Curriculum,
        job_description: &str,
    ) -> Result<CoverLetter, ModelError> {
        let messages = [
            ChatMessage::system(prompts::COVER_LETTER_CREATION),
            self.portfolio_with_job(portfolio, job_description)?,
        ];
        structured(self.model, &messages).await
    }

    pub async fn extract_job_information(
        &self,
        job_description: &str,
    ) -> Result<JobDescriptionInformation, ModelError> {
        let messages = [
            ChatMessage::system(prompts::JOB_INFORMATION_EXTRACTION),
            ChatMessage::user(prompts::job_description_block(job_description)),
        ];
        structured(self.model, &messages).await
    }

    fn portfolio_with_job(
        &self,
        portfolio: &Curriculum,
        job_description: &str,
    ) -> Result<ChatMessage, ModelError> {
        let portfolio_json = serde_json::to_string_pretty(portfolio)?;
        Ok(ChatMessage::user(prompts::portfolio_with_job_message(
            &portfolio_json,
            job_description,
        )))
    }

    /// All model calls plus the merges, for one job description
    pub async fn tailor(
        &self,
        portfolio: &Curriculum,
        job_description: &str,
    ) -> Result<Draft, ModelError> {
        let span = app_span!("tailor", provider = %self.model.provider());
        self.tailor_steps(portfolio, job_description)
            .instrument(span)
            .await
    }

    async fn tailor_steps(
        &self,
        portfolio: &Curriculum,
        job_description: &str,
    ) -> Result<Draft, ModelError> {
        let new_cv = self.create_new_cv(portfolio, job_description).await?;
        let cover_letter = self.create_cover_letter(portfolio, job_description).await?;
        let job_information = self.extract_job_information(job_description).await?;

        let date = Local::now().format("%B %d, %Y").to_string();
        let final_cv = build_final_cv(portfolio, &new_cv);
        let final_cover_letter =
            build_final_cover_letter(portfolio, &cover_letter, &job_information, &date);

        app_log!(
            info,
            "Tailored documents for {} at {}",
            job_information.job_title.as_deref().unwrap_or("?"),
            job_information.company_name.as_deref().unwrap_or("?")
        );

        Ok(Draft {
            final_cv,
            final_cover_letter,
            job_information: Some(job_information),
        })
    }
}

/// Personal data, education and skills from the portfolio; the rest from the tailored CV
pub fn build_final_cv(portfolio: &Curriculum, new_cv: &NewCurriculum) -> FinalCurriculum {
    let personality = portfolio.personality_or_default();
    let job_title = non_empty(new_cv.job_title.as_deref())
        .or_else(|| non_empty(personality.job_title.as_deref()))
        .map(str::to_string);

    FinalCurriculum {
        job_title,
        summary: new_cv.summary.clone(),
        experiences: new_cv.experiences.clone().unwrap_or_default(),
        projects: new_cv.projects.clone().unwrap_or_default(),
        education: portfolio.education.clone().unwrap_or_default(),
        hard_skills: portfolio.hard_skills.clone().unwrap_or_default(),
        soft_skills: portfolio.soft_skills.clone().unwrap_or_default(),
        personality,
    }
}

pub fn build_final_cover_letter(
    portfolio: &Curriculum,
    cover_letter: &CoverLetter,
    job_information: &JobDescriptionInformation,
    date: &str,
) -> FinalCoverLetter {
    let personality = portfolio.personality_or_default();
    let text = |value: &Option<String>| value.clone().unwrap_or_default();

    FinalCoverLetter {
        name: text(&personality.name),
        surname: text(&personality.surname),
        current_position: text(&personality.job_title),
        email: text(&personality.e_mail),
        phone: text(&personality.telephone),
        linkedin: text(&personality.linkedin_link),
        github: String::new(),
        date: date.to_string(),
        recipient_name: String::new(),
        company_name: text(&job_information.company_name),
        company_address: String::new(),
        position_title: text(&job_information.job_title),
        salutation: non_empty(cover_letter.salutation.as_deref())
            .unwrap_or(DEFAULT_SALUTATION)
            .to_string(),
        body_paragraphs: cover_letter
            .body_paragraphs
            .iter()
            .flatten()
            .filter(|p| !p.trim().is_empty())
            .cloned()
            .collect(),
        closing: non_empty(cover_letter.closing.as_deref())
            .unwrap_or(DEFAULT_CLOSING)
            .to_string(),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedModel;
    use crate::types::{EducationExperience, Personality};
    use serde_json::json;

    fn portfolio() -> Curriculum {
        Curriculum {
            personality: Some(Personality {
                name: Some("Ada".to_string()),
                surname: Some("Lovelace".to_string()),
                e_mail: Some("ada@example.com".to_string()),
                job_title: Some("Analyst".to_string()),
                ..Default::default()
            }),
            hard_skills: Some(vec!["Rust".to_string(), "SQL".to_string()]),
            soft_skills: Some(vec!["Writing".to_string()]),
            education: Some(vec![EducationExperience {
                title: Some("BSc Mathematics".to_string()),
                ..Default::default()
            }]),
            ..Default::default()
        }
    }

    #[test]
    fn test_build_final_cv_merges_sources() {
        let new_cv = NewCurriculum {
            job_title: Some("  ".to_string()),
            summary: Some("Tailored summary".to_string()),
            experiences: None,
            projects: Some(vec![Default::default()]),
        };

        let final_cv = build_final_cv(&portfolio(), &new_cv);
        assert_eq!(final_cv.job_title.as_deref(), Some("Analyst"));
        assert_eq!(final_cv.summary.as_deref(), Some("Tailored summary"));
        assert!(final_cv.experiences.is_empty());
        assert_eq!(final_cv.projects.len(), 1);
        assert_eq!(final_cv.hard_skills, vec!["Rust", "SQL"]);
        assert_eq!(final_cv.education.len(), 1);
        assert_eq!(final_cv.personality.name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_build_final_cover_letter_defaults() {
        let letter = CoverLetter {
            salutation: None,
            body_paragraphs: Some(vec!["First.".to_string(), " ".to_string()]),
            closing: Some(String::new()),
        };
        let info = JobDescriptionInformation {
            job_title: Some("Data Engineer".to_string()),
            company_name: Some("Acme".to_string()),
        };

        let final_letter = build_final_cover_letter(&portfolio(), &letter, &info, "May 01, 2025");
        assert_eq!(final_letter.salutation, DEFAULT_SALUTATION);
        assert_eq!(final_letter.closing, DEFAULT_CLOSING);
        assert_eq!(final_letter.body_paragraphs, vec!["First."]);
        assert_eq!(final_letter.company_name, "Acme");
        assert_eq!(final_letter.position_title, "Data Engineer");
        assert_eq!(final_letter.email, "ada@example.com");
        assert_eq!(final_letter.current_position, "Analyst");
        assert_eq!(final_letter.date, "May 01, 2025");
    }

    #[tokio::test]
    async fn test_extract_data_wraps_markdown() {
        let model = ScriptedModel::new().answer(
            "curriculum",
            json!({"personality": {"name": "Ada"}, "experiences": null}),
        );
        let extractor = InformationExtractor::new(&model);

        let curriculum = extractor.extract_data("# Ada\nMathematician").await.unwrap();
        assert_eq!(curriculum.display_name(), "Ada");

        let calls = model.calls.lock().unwrap();
        assert_eq!(calls[0].0, "curriculum");
        assert!(calls[0].1[1].content.contains("[START PORTFOLIO]\n# Ada\nMathematician"));
    }

    #[tokio::test]
    async fn test_tailor_runs_every_step() {
        let model = ScriptedModel::new()
            .answer(
                "new_curriculum",
                json!({"job_title": "Rust Engineer", "summary": "I build things"}),
            )
            .answer(
                "cover_letter",
                json!({"salutation": "Dear team,", "body_paragraphs": ["Hello"]}),
            )
            .answer(
                "job_description_information",
                json!({"job_title": "Rust Engineer", "company_name": "Acme"}),
            );
        let extractor = InformationExtractor::new(&model);

        let draft = extractor
            .tailor(&portfolio(), "Acme is hiring a Rust Engineer")
            .await
            .unwrap();

        assert_eq!(model.call_count(), 3);
        assert_eq!(draft.company(), Some("Acme"));
        assert_eq!(draft.position(), Some("Rust Engineer"));
        assert_eq!(draft.final_cv.job_title.as_deref(), Some("Rust Engineer"));
        assert_eq!(draft.final_cover_letter.salutation, "Dear team,");
        assert_eq!(draft.final_cover_letter.closing, DEFAULT_CLOSING);

        let calls = model.calls.lock().unwrap();
        assert!(calls[0].1[1].content.contains("[JOB DESCRIPTION]"));
        assert!(calls[0].1[1].content.contains("\"hard_skills\""));
    }

    #[tokio::test]
    async fn test_model_errors_propagate() {
        let model = ScriptedModel::new();
        let extractor = InformationExtractor::new(&model);
        assert!(matches!(
            extractor.extract_job_information("posting").await,
            Err(ModelError::EmptyContent)
        ));
    }
}
