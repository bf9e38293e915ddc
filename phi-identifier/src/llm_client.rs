use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
    CreateChatCompletionRequestArgs, ResponseFormat, ResponseFormatJsonSchema,
};
use async_trait::async_trait;
use deid_common::AppError;

use crate::schema::{phi_detection_schema, PHIDetectionResponse};

/// Provider-neutral structured-output call: give it a rendered prompt pair
/// and get back a validated `PHIDetectionResponse`. Concrete providers are
/// out of scope for this core; `OpenAiStructuredLlmClient` is the default
/// implementation used when a real API key is configured.
#[async_trait]
pub trait StructuredLlmClient: Send + Sync {
    async fn invoke_structured(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<PHIDetectionResponse, AppError>;
}

pub struct OpenAiStructuredLlmClient {
    client: async_openai::Client<OpenAIConfig>,
    model: String,
}

impl OpenAiStructuredLlmClient {
    pub fn new(client: async_openai::Client<OpenAIConfig>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl StructuredLlmClient for OpenAiStructuredLlmClient {
    async fn invoke_structured(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<PHIDetectionResponse, AppError> {
        let response_format = ResponseFormat::JsonSchema {
            json_schema: ResponseFormatJsonSchema {
                description: Some("Structured PHI detection result".into()),
                name: "phi_detection".into(),
                schema: Some(phi_detection_schema()),
                strict: Some(true),
            },
        };

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([
                ChatCompletionRequestSystemMessage::from(system_prompt).into(),
                ChatCompletionRequestUserMessage::from(user_prompt).into(),
            ])
            .response_format(response_format)
            .build()
            .map_err(AppError::from)?;

        let response = self.client.chat().create(request).await?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_ref())
            .ok_or_else(|| AppError::Llm("no content in LLM response".to_string()))?;

        let parsed: PHIDetectionResponse = serde_json::from_str(content)
            .map_err(|e| AppError::Llm(format!("failed to parse structured response: {e}")))?;

        Ok(parsed.normalized())
    }
}
