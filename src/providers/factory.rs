use crate::config::{Provider, ProviderConfig};
use crate::core::error::SmartCloudError;
use crate::providers::{
    LLMProvider, anthropic::AnthropicProvider, openai_compatible::OpenAICompatibleProvider,
};
use std::collections::HashMap;

/// Everything a provider constructor needs, resolved from config and CLI flags.
#[derive(Debug, Clone)]
pub struct InferenceSettings {
    pub provider_config: ProviderConfig,
    pub model_override: Option<String>,
    pub temperature: f32,
}

type ProviderCreator =
    Box<dyn Fn(Provider, &InferenceSettings) -> Result<Box<dyn LLMProvider>, SmartCloudError> + Send + Sync>;

pub struct ProviderFactory {
    creators: HashMap<Provider, ProviderCreator>,
}

fn resolve(provider: Provider, settings: &InferenceSettings) -> Result<(String, String, String), SmartCloudError> {
    let api_key = settings.provider_config.resolve_api_key(provider)?;
    let base_url = settings
        .provider_config
        .base_url
        .clone()
        .unwrap_or_else(|| provider.default_base_url().to_string());
    let model = settings
        .model_override
        .clone()
        .or_else(|| settings.provider_config.model.clone())
        .unwrap_or_else(|| provider.default_model().to_string());
    Ok((base_url, api_key, model))
}

impl ProviderFactory {
    pub fn new() -> Self {
        let mut creators: HashMap<Provider, ProviderCreator> = HashMap::new();

        let openai_style: fn(Provider, &InferenceSettings) -> Result<Box<dyn LLMProvider>, SmartCloudError> =
            |provider, settings| {
                let (base_url, api_key, model) = resolve(provider, settings)?;
                Ok(Box::new(OpenAICompatibleProvider::new(
                    base_url,
                    api_key,
                    model,
                    settings.temperature,
                )) as Box<dyn LLMProvider>)
            };

        for provider in [
            Provider::Groq,
            Provider::OpenAI,
            Provider::OpenRouter,
            Provider::DeepSeek,
        ] {
            creators.insert(provider, Box::new(openai_style));
        }

        creators.insert(
            Provider::Anthropic,
            Box::new(|provider: Provider, settings: &InferenceSettings| {
                let (base_url, api_key, model) = resolve(provider, settings)?;
                Ok(Box::new(AnthropicProvider::new(
                    base_url,
                    api_key,
                    model,
                    settings.temperature,
                )) as Box<dyn LLMProvider>)
            }) as ProviderCreator,
        );

        Self { creators }
    }

    pub fn create(
        &self,
        provider: Provider,
        settings: &InferenceSettings,
    ) -> Result<Box<dyn LLMProvider>, SmartCloudError> {
        self.creators
            .get(&provider)
            .ok_or_else(|| SmartCloudError::Config(format!("Provider not found: {:?}", provider)))
            .and_then(|creator| creator(provider, settings))
    }
}

impl Default for ProviderFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(model_override: Option<&str>, config_model: Option<&str>) -> InferenceSettings {
        InferenceSettings {
            provider_config: ProviderConfig {
                api_key: Some("test-key".to_string()),
                base_url: None,
                model: config_model.map(str::to_string),
            },
            model_override: model_override.map(str::to_string),
            temperature: 0.1,
        }
    }

    #[test]
    fn groq_defaults_to_llama() {
        let provider = ProviderFactory::new()
            .create(Provider::Groq, &settings(None, None))
            .unwrap();
        assert_eq!(provider.model(), "llama-3.3-70b-versatile");
    }

    #[test]
    fn cli_model_beats_config_model() {
        let provider = ProviderFactory::new()
            .create(Provider::OpenAI, &settings(Some("gpt-4o"), Some("gpt-4.1-mini")))
            .unwrap();
        assert_eq!(provider.model(), "gpt-4o");
    }

    #[test]
    fn anthropic_is_registered() {
        let provider = ProviderFactory::new()
            .create(Provider::Anthropic, &settings(None, Some("claude-test")))
            .unwrap();
        assert_eq!(provider.model(), "claude-test");
    }
}
