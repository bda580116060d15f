use crate::core::error::SmartCloudError;
use crate::providers::base_client::HttpClient;
use crate::providers::{LLMProvider, Message};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatCompletionMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatCompletionMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    #[serde(default)]
    content: Option<String>,
}

/// Any backend speaking the `/chat/completions` dialect: Groq, OpenAI, OpenRouter, DeepSeek.
#[derive(Clone)]
pub struct OpenAICompatibleProvider {
    client: HttpClient,
    model: String,
    temperature: f32,
}

impl OpenAICompatibleProvider {
    pub fn new(base_url: String, api_key: String, model: String, temperature: f32) -> Self {
        let auth_header = Some(("Authorization".to_string(), format!("Bearer {}", api_key)));

        Self {
            client: HttpClient::new(base_url, auth_header, None),
            model,
            temperature,
        }
    }
}

#[async_trait]
impl LLMProvider for OpenAICompatibleProvider {
    async fn get_response(&self, messages: &[Message]) -> Result<String, SmartCloudError> {
        let payload = ChatCompletionRequest {
            model: &self.model,
            messages: messages
                .iter()
                .map(|m| ChatCompletionMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: self.temperature,
        };

        let response = self.client.post("chat/completions", &payload).await?;
        let response_body = response.text().await?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&response_body)?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| SmartCloudError::Api("No choices in API response".to_string()))?;

        Ok(choice.message.content.unwrap_or_default().trim().to_string())
    }

    fn model(&self) -> &str {
        &self.model
    }
}
