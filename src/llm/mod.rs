//! Hosted language model clients.
//!
//! Every model call asks for a JSON object matching an [`OutputSchema`]; the
//! provider-specific clients only differ in how that request is expressed.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::core::config_manager::ServiceConfig;
use crate::core::UserSettings;
use crate::types::{OutputSchema, StructuredOutput};

pub mod gemini;
pub mod openai;
pub mod prompts;

pub use gemini::GeminiModel;
pub use openai::OpenAiModel;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Model returned empty content")]
    EmptyContent,

    #[error("Model refused the request: {0}")]
    Refused(String),

    #[error("No API key configured for {0}")]
    MissingApiKey(ModelProvider),

    #[error("Unknown model provider '{0}', expected openai or gemini")]
    UnknownProvider(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    #[default]
    OpenAi,
    Gemini,
}

impl ModelProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelProvider::OpenAi => "openai",
            ModelProvider::Gemini => "gemini",
        }
    }
}

impl fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelProvider {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ModelProvider::OpenAi),
            "gemini" => Ok(ModelProvider::Gemini),
            other => Err(ModelError::UnknownProvider(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A chat model that can answer with a JSON object for a requested schema.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn provider(&self) -> ModelProvider;

    async fn complete_structured(
        &self,
        messages: &[ChatMessage],
        schema: &OutputSchema,
    ) -> Result<Value, ModelError>;
}

/// Ask the model for a `T` and deserialize the answer.
pub async fn structured<T: StructuredOutput>(
    model: &dyn LanguageModel,
    messages: &[ChatMessage],
) -> Result<T, ModelError> {
    let schema = T::output_schema();
    let value = model.complete_structured(messages, &schema).await?;
    Ok(serde_json::from_value(value)?)
}

/// Client for the provider selected in the user settings.
pub fn build_model(
    settings: &UserSettings,
    service: &ServiceConfig,
) -> Result<Box<dyn LanguageModel>, ModelError> {
    let provider = settings.selected_model;
    let api_key = settings
        .api_key_for(provider)
        .ok_or(ModelError::MissingApiKey(provider))?
        .to_string();

    let model: Box<dyn LanguageModel> = match provider {
        ModelProvider::OpenAi => Box::new(OpenAiModel::new(
            service.openai_base_url.clone(),
            service.openai_model.clone(),
            api_key,
            service.timeout_seconds,
        )?),
        ModelProvider::Gemini => Box::new(GeminiModel::new(
            service.gemini_base_url.clone(),
            service.gemini_model.clone(),
            api_key,
            service.timeout_seconds,
        )?),
    };
    Ok(model)
}

pub(crate) fn http_client(timeout_seconds: u64) -> Result<reqwest::Client, ModelError> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .build()?)
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Turn a non-2xx response into `ModelError::Api`, preferring the provider's message
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ModelError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    Err(ModelError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Parse the model's text answer as a JSON value, tolerating markdown code fences
pub(crate) fn parse_json_content(text: &str) -> Result<Value, ModelError> {
    let trimmed = text.trim();
    let unfenced = match trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
    {
        Some(rest) => rest.strip_suffix("```").unwrap_or(rest),
        None => trimmed,
    }
    .trim();

    if unfenced.is_empty() {
        return Err(ModelError::EmptyContent);
    }
    Ok(serde_json::from_str(unfenced)?)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned answers keyed by schema name and records every call.
    #[derive(Default)]
    pub struct ScriptedModel {
        answers: Mutex<Vec<(&'static str, VecDeque<Value>)>>,
        pub calls: Mutex<Vec<(String, Vec<ChatMessage>)>>,
    }

    impl ScriptedModel {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn answer(self, schema_name: &'static str, value: Value) -> Self {
            {
                let mut answers = self.answers.lock().unwrap();
                match answers.iter_mut().find(|(name, _)| *name == schema_name) {
                    Some((_, queue)) => queue.push_back(value),
                    None => answers.push((schema_name, VecDeque::from([value]))),
                }
            }
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        fn provider(&self) -> ModelProvider {
            ModelProvider::OpenAi
        }

        async fn complete_structured(
            &self,
            messages: &[ChatMessage],
            schema: &OutputSchema,
        ) -> Result<Value, ModelError> {
            self.calls
                .lock()
                .unwrap()
                .push((schema.name.to_string(), messages.to_vec()));

            let mut answers = self.answers.lock().unwrap();
            answers
                .iter_mut()
                .find(|(name, _)| *name == schema.name)
                .and_then(|(_, queue)| queue.pop_front())
                .ok_or(ModelError::EmptyContent)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedModel;
    use super::*;
    use crate::types::JobDescriptionInformation;
    use serde_json::json;

    #[test]
    fn test_provider_names() {
        assert_eq!("OpenAI".parse::<ModelProvider>().unwrap(), ModelProvider::OpenAi);
        assert_eq!(" gemini ".parse::<ModelProvider>().unwrap(), ModelProvider::Gemini);
        assert!("claude".parse::<ModelProvider>().is_err());
        assert_eq!(ModelProvider::OpenAi.to_string(), "openai");
        assert_eq!(
            serde_json::to_value(ModelProvider::Gemini).unwrap(),
            json!("gemini")
        );
    }

    #[test]
    fn test_parse_json_content() {
        assert_eq!(
            parse_json_content("```json\n{\"a\": 1}\n```").unwrap(),
            json!({"a": 1})
        );
        assert_eq!(parse_json_content(" {\"a\": 2} ").unwrap(), json!({"a": 2}));
        assert_eq!(
            parse_json_content("```json\n{\"a\": 3}").unwrap(),
            json!({"a": 3})
        );
        assert_eq!(
            parse_json_content("```\n{\"a\": 4}\n```").unwrap(),
            json!({"a": 4})
        );
        assert!(matches!(
            parse_json_content("  "),
            Err(ModelError::EmptyContent)
        ));
        assert!(matches!(
            parse_json_content("not json"),
            Err(ModelError::Parse(_))
        ));
    }

    #[test]
    fn test_build_model_requires_key() {
        let settings = UserSettings {
            selected_model: ModelProvider::Gemini,
            openai_api_key: "sk-abc".to_string(),
            ..Default::default()
        };
        let service = ServiceConfig::default();
        assert!(matches!(
            build_model(&settings, &service),
            Err(ModelError::MissingApiKey(ModelProvider::Gemini))
        ));

        let settings = UserSettings {
            selected_model: ModelProvider::OpenAi,
            ..settings
        };
        let model = build_model(&settings, &service).unwrap();
        assert_eq!(model.provider(), ModelProvider::OpenAi);
    }

    #[tokio::test]
    async fn test_structured_deserializes_answer() {
        let model = ScriptedModel::new().answer(
            "job_description_information",
            json!({"job_title": "Engineer", "company_name": null}),
        );
        let info: JobDescriptionInformation =
            structured(&model, &[ChatMessage::user("posting")]).await.unwrap();

        assert_eq!(info.job_title.as_deref(), Some("Engineer"));
        assert_eq!(info.company_name, None);
        assert_eq!(model.call_count(), 1);
    }
}
