use crate::core::error::SmartCloudError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Groq,
    OpenAI,
    OpenRouter,
    DeepSeek,
    Anthropic,
}

impl Provider {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "groq" => Some(Provider::Groq),
            "openai" => Some(Provider::OpenAI),
            "openrouter" => Some(Provider::OpenRouter),
            "deepseek" => Some(Provider::DeepSeek),
            "anthropic" => Some(Provider::Anthropic),
            _ => None,
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::Groq => "https://api.groq.com/openai/v1",
            Provider::OpenAI => "https://api.openai.com/v1",
            Provider::OpenRouter => "https://openrouter.ai/api/v1",
            Provider::DeepSeek => "https://api.deepseek.com/v1",
            Provider::Anthropic => "https://api.anthropic.com/v1",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Groq => "llama-3.3-70b-versatile",
            Provider::OpenAI => "gpt-4.1-mini",
            Provider::OpenRouter => "google/gemini-2.0-flash-001",
            Provider::DeepSeek => "deepseek-chat",
            Provider::Anthropic => "claude-3-5-haiku-latest",
        }
    }

    /// Environment variable consulted when the config file carries no key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Provider::Groq => "GROQ_API_KEY",
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::OpenRouter => "OPENROUTER_API_KEY",
            Provider::DeepSeek => "DEEPSEEK_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
}

impl ProviderConfig {
    /// Config file key first, then the provider's environment variable.
    pub fn resolve_api_key(&self, provider: Provider) -> Result<String, SmartCloudError> {
        let key = match &self.api_key {
            Some(key) if !key.trim().is_empty() => key.clone(),
            _ => std::env::var(provider.api_key_env()).map_err(|_| {
                SmartCloudError::Config(format!(
                    "{} must be set in config.yaml or the environment",
                    provider.api_key_env()
                ))
            })?,
        };

        if key.trim().is_empty() {
            return Err(SmartCloudError::Config(format!(
                "{} cannot be empty",
                provider.api_key_env()
            )));
        }
        Ok(key)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Number of trailing messages shown to the classifier.
    pub history_window: usize,
    /// Offer ACTION_AGENT to the classifier.
    pub action_agent: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            history_window: 5,
            action_agent: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    /// RAM percentage above which the monitoring reply carries an alert.
    pub ram_alert_threshold: f32,
    /// Window between the two `/proc/stat` reads used for CPU utilisation.
    pub cpu_sample_ms: u64,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            ram_alert_threshold: 90.0,
            cpu_sample_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub active_provider: Option<Provider>,
    pub providers: HashMap<Provider, ProviderConfig>,
    pub temperature: f32,
    pub request_timeout_secs: u64,
    /// Skip the `[y/N]` prompt of `/run`.
    pub auto_confirm: bool,
    pub routing: RoutingConfig,
    pub monitoring: MonitoringConfig,
    pub artifact_path: PathBuf,
    pub database_path: Option<PathBuf>,
    pub default_session: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            active_provider: None,
            providers: HashMap::new(),
            temperature: 0.1,
            request_timeout_secs: 60,
            auto_confirm: false,
            routing: RoutingConfig::default(),
            monitoring: MonitoringConfig::default(),
            artifact_path: PathBuf::from("generated_code.py"),
            database_path: None,
            default_session: "terminal_user".to_string(),
        }
    }
}

impl Config {
    fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".smartcloud")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.yaml")
    }

    pub fn input_history_path() -> PathBuf {
        Self::config_dir().join("input_history.txt")
    }

    /// Loads the default config file, writing a fresh one on first run.
    pub fn load() -> Result<Config, SmartCloudError> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Config, SmartCloudError> {
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            let config = serde_yml::from_str::<Config>(&contents)
                .map_err(|e| SmartCloudError::Config(format!("Parse {}: {}", path.display(), e)))?;
            debug!(path = %path.display(), "loaded config");
            return Ok(config);
        }

        let config = Config::default();
        config.save_to(path)?;
        info!(path = %path.display(), "wrote default config");
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SmartCloudError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let yaml_content = serde_yml::to_string(self)?;
        fs::write(path, yaml_content)?;
        Ok(())
    }

    pub fn provider(&self) -> Provider {
        self.active_provider.unwrap_or_default()
    }

    pub fn provider_config(&self, provider: Provider) -> ProviderConfig {
        self.providers.get(&provider).cloned().unwrap_or_default()
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("cloud_history.db"))
    }
}
