use crate::core::error::SmartCloudError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod anthropic;
pub mod base_client;
pub mod factory;
pub mod openai_compatible;
pub mod timeout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "system" => Some(Role::System),
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
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

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A language inference backend. Stateless per call; no retries.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn get_response(&self, messages: &[Message]) -> Result<String, SmartCloudError>;

    fn model(&self) -> &str;
}

/// Process response text to extract command or code block
pub fn process_response(content: &str) -> String {
    let content = content.trim();

    if content.is_empty() {
        return String::new();
    }

    if let Some(start_idx) = content.find("```") {
        let after_start = &content[start_idx + 3..];
        let code_block = match after_start.find("```") {
            Some(end) => &after_start[..end],
            None => after_start,
        };

        // Drop the language tag on the opening fence
        if let Some(first_newline) = code_block.find('\n') {
            return code_block[first_newline + 1..].trim().to_string();
        }
        return code_block.trim().to_string();
    }

    if let Some(start) = content.find('`') {
        if let Some(end) = content[start + 1..].find('`').map(|i| i + start + 1) {
            return content[start + 1..end].trim().to_string();
        }
    }

    content
        .lines()
        .find(|line| !line.trim().is_empty())
        .map(|line| line.trim().to_string())
        .unwrap_or_else(|| content.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_fenced_block_without_language_tag() {
        let reply = "Try this:\n```bash\nsudo systemctl restart nginx\n```\nThen check status.";
        assert_eq!(process_response(reply), "sudo systemctl restart nginx");
    }

    #[test]
    fn extracts_inline_backticks() {
        assert_eq!(
            process_response("Run `free -h` to inspect memory."),
            "free -h"
        );
    }

    #[test]
    fn falls_back_to_first_line() {
        assert_eq!(process_response("\n  df -h\nextra"), "df -h");
        assert_eq!(process_response("   "), "");
    }

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::System, Role::User, Role::Assistant] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("tool"), None);
    }
}
