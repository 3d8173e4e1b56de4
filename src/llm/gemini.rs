//! Google Gemini `generateContent` with a response schema

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{check_status, http_client, parse_json_content};
use super::{ChatMessage, LanguageModel, ModelError, ModelProvider, Role};
use crate::app_log;
use crate::types::OutputSchema;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

pub struct GeminiModel {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiModel {
    pub fn new(
        base_url: String,
        model: String,
        api_key: String,
        timeout_seconds: u64,
    ) -> Result<Self, ModelError> {
        Ok(Self {
            client: http_client(timeout_seconds)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key,
        })
    }

    fn request(messages: &[ChatMessage], schema: &OutputSchema) -> GenerateContentRequest {
        let text_parts = |role: Role| -> Vec<Part> {
            messages
                .iter()
                .filter(|m| m.role == role)
                .map(|m| Part {
                    text: m.content.clone(),
                })
                .collect()
        };

        let system = text_parts(Role::System);
        GenerateContentRequest {
            system_instruction: (!system.is_empty()).then(|| Content {
                role: None,
                parts: system,
            }),
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: text_parts(Role::User),
            }],
            generation_config: GenerationConfig {
                temperature: 0.0,
                response_mime_type: "application/json",
                response_schema: to_gemini_schema(&schema.schema),
            },
        }
    }
}

/// Gemini accepts an OpenAPI subset: upper-case type names, no `additionalProperties`
fn to_gemini_schema(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => {
            let mut converted = Map::new();
            for (key, value) in map {
                match key.as_str() {
                    "additionalProperties" | "$schema" | "title" => {}
                    "type" => {
                        let upper = value
                            .as_str()
                            .map(|t| Value::String(t.to_uppercase()))
                            .unwrap_or_else(|| value.clone());
                        converted.insert(key.clone(), upper);
                    }
                    "properties" => {
                        let properties = value
                            .as_object()
                            .map(|props| {
                                props
                                    .iter()
                                    .map(|(name, prop)| (name.clone(), to_gemini_schema(prop)))
                                    .collect::<Map<_, _>>()
                            })
                            .unwrap_or_default();
                        converted.insert(key.clone(), Value::Object(properties));
                    }
                    _ => {
                        converted.insert(key.clone(), to_gemini_schema(value));
                    }
                }
            }
            Value::Object(converted)
        }
        Value::Array(items) => Value::Array(items.iter().map(to_gemini_schema).collect()),
        other => other.clone(),
    }
}

fn content_of(response: GenerateContentResponse) -> Result<Value, ModelError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ModelError::Refused(reason));
    }

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().map(|p| p.text).collect())
        .ok_or(ModelError::EmptyContent)?;

    parse_json_content(&text)
}

#[async_trait]
impl LanguageModel for GeminiModel {
    fn provider(&self) -> ModelProvider {
        ModelProvider::Gemini
    }

    async fn complete_structured(
        &self,
        messages: &[ChatMessage],
        schema: &OutputSchema,
    ) -> Result<Value, ModelError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        app_log!(info, "Calling Gemini {} for {}", self.model, schema.name);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request(messages, schema))
            .send()
            .await?;

        let response = check_status(response).await?;
        let generated: GenerateContentResponse = response.json().await?;
        content_of(generated)
    }
}
