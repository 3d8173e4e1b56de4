//! OpenAI Chat Completions with `json_schema` response format

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{check_status, http_client, parse_json_content};
use super::{ChatMessage, LanguageModel, ModelError, ModelProvider};
use crate::app_log;
use crate::types::OutputSchema;

const CHAT_COMPLETIONS_ENDPOINT: &str = "/chat/completions";
const SEED: u64 = 42;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    top_p: f32,
    seed: u64,
    response_format: ResponseFormat<'a>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ResponseFormat<'a> {
    #[serde(rename = "json_schema")]
    JsonSchema { json_schema: JsonSchemaDefinition<'a> },
}

#[derive(Debug, Serialize)]
struct JsonSchemaDefinition<'a> {
    name: &'a str,
    strict: bool,
    schema: &'a Value,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
    refusal: Option<String>,
}

pub struct OpenAiModel {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl OpenAiModel {
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

    fn request<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        schema: &'a OutputSchema,
    ) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: 0.0,
            top_p: 0.0,
            seed: SEED,
            response_format: ResponseFormat::JsonSchema {
                json_schema: JsonSchemaDefinition {
                    name: schema.name,
                    strict: false,
                    schema: &schema.schema,
                },
            },
        }
    }
}

fn content_of(response: ChatCompletionResponse) -> Result<Value, ModelError> {
    let message = response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or(ModelError::EmptyContent)?;

    if let Some(refusal) = message.refusal.filter(|r| !r.is_empty()) {
        return Err(ModelError::Refused(refusal));
    }
    parse_json_content(message.content.as_deref().unwrap_or_default())
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    fn provider(&self) -> ModelProvider {
        ModelProvider::OpenAi
    }

    async fn complete_structured(
        &self,
        messages: &[ChatMessage],
        schema: &OutputSchema,
    ) -> Result<Value, ModelError> {
        let url = format!("{}{}", self.base_url, CHAT_COMPLETIONS_ENDPOINT);
        app_log!(info, "Calling OpenAI {} for {}", self.model, schema.name);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request(messages, schema))
            .send()
            .await?;

        let response = check_status(response).await?;
        let completion: ChatCompletionResponse = response.json().await?;
        content_of(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn model() -> OpenAiModel {
        OpenAiModel::new(
            "https://api.openai.com/v1/".to_string(),
            "gpt-4.1".to_string(),
            "sk-test".to_string(),
            30,
        )
        .unwrap()
    }

    #[test]
    fn test_request_shape() {
        let model = model();
        let schema = OutputSchema {
            name: "cover_letter",
            schema: json!({"type": "object", "properties": {}}),
        };
        let messages = [ChatMessage::system("sys"), ChatMessage::user("hi")];

        let body = serde_json::to_value(model.request(&messages, &schema)).unwrap();
        assert_eq!(body["model"], "gpt-4.1");
        assert_eq!(body["seed"], 42);
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], "cover_letter");
        assert_eq!(body["response_format"]["json_schema"]["strict"], false);
        assert_eq!(model.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn test_content_of_response() {
        let response: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"job_title\": \"Dev\"}"}}]
        }))
        .unwrap();
        assert_eq!(content_of(response).unwrap(), json!({"job_title": "Dev"}));

        let refused: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"content": null, "refusal": "no"}}]
        }))
        .unwrap();
        assert!(matches!(content_of(refused), Err(ModelError::Refused(_))));

        let empty: ChatCompletionResponse =
            serde_json::from_value(json!({ "choices": [] })).unwrap();
        assert!(matches!(content_of(empty), Err(ModelError::EmptyContent)));
    }
}
