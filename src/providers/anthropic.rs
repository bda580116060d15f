use crate::core::error::SmartCloudError;
use crate::providers::base_client::HttpClient;
use crate::providers::{LLMProvider, Message, Role};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Clone)]
pub struct AnthropicProvider {
    client: HttpClient,
    model: String,
    temperature: f32,
}

impl AnthropicProvider {
    pub fn new(base_url: String, api_key: String, model: String, temperature: f32) -> Self {
        let mut extra_headers = HashMap::new();
        extra_headers.insert(
            "anthropic-version".to_string(),
            ANTHROPIC_VERSION.to_string(),
        );
        Self {
            client: HttpClient::new(
                base_url,
                Some(("x-api-key".to_string(), api_key)),
                Some(extra_headers),
            ),
            model,
            temperature,
        }
    }
}

/// Anthropic takes the system prompt out of band; all system messages are joined.
fn split_system(messages: &[Message]) -> (Option<String>, Vec<AnthropicMessage<'_>>) {
    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect();

    let rest = messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| AnthropicMessage {
            role: m.role.as_str(),
            content: &m.content,
        })
        .collect();

    let system = if system.is_empty() {
        None
    } else {
        Some(system.join("\n\n"))
    };
    (system, rest)
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    async fn get_response(&self, messages: &[Message]) -> Result<String, SmartCloudError> {
        let (system, messages) = split_system(messages);

        let payload = AnthropicRequest {
            model: &self.model,
            max_tokens: 1024,
            messages,
            temperature: self.temperature,
            system,
        };

        let response = self.client.post("messages", &payload).await?;
        let response_body = response.text().await?;
        let parsed: AnthropicResponse = serde_json::from_str(&response_body)?;

        let text: String = parsed
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect();

        if text.is_empty() {
            Err(SmartCloudError::Api("Empty response from Anthropic".to_string()))
        } else {
            Ok(text.trim().to_string())
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<AnthropicMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}
