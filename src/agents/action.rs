use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::state::{ConversationState, RouteDecision};
use super::{Agent, AgentReply};
use crate::core::error::SmartCloudError;
use crate::providers::{LLMProvider, Message, process_response};
use crate::system::SystemInfo;

const SYSTEM_PROMPT_FOR_ACTION: &str = "You are the SmartCloud action agent. The user describes a \
problem on their machine. Reply with a single shell command that would fix or diagnose it. Only \
output the bare command without any explanation or markdown formatting. {system}";

/// Suggests one remediation command. Execution is a separate, user-confirmed step.
pub struct ActionAgent {
    provider: Arc<dyn LLMProvider>,
    system_info: SystemInfo,
}

impl ActionAgent {
    pub fn new(provider: Arc<dyn LLMProvider>, system_info: SystemInfo) -> Self {
        Self {
            provider,
            system_info,
        }
    }
}

#[async_trait]
impl Agent for ActionAgent {
    fn route(&self) -> RouteDecision {
        RouteDecision::Action
    }

    fn label(&self) -> &'static str {
        "Action Agent"
    }

    async fn run(&self, state: &ConversationState) -> Result<AgentReply, SmartCloudError> {
        let problem = state
            .last_message()
            .map(|m| m.content.as_str())
            .ok_or_else(|| SmartCloudError::Input("no problem description".to_string()))?;

        let messages = [
            Message::system(
                SYSTEM_PROMPT_FOR_ACTION.replace("{system}", &self.system_info.prompt_context()),
            ),
            Message::user(problem),
        ];

        let raw = self.provider.get_response(&messages).await?;
        let command = process_response(&raw);
        if command.is_empty() {
            return Err(SmartCloudError::Api(
                "the model did not suggest a command".to_string(),
            ));
        }
        info!(%command, "suggested command (not executed)");

        Ok(AgentReply {
            text: format!(
                "Suggested command: `{}`\nIt has NOT been run. Type /run to review and confirm it.",
                command
            ),
            suggested_command: Some(command),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::ShellType;
    use std::sync::Mutex;

    struct CannedProvider {
        reply: String,
        seen: Mutex<Vec<Message>>,
    }

    #[async_trait]
    impl LLMProvider for CannedProvider {
        async fn get_response(&self, messages: &[Message]) -> Result<String, SmartCloudError> {
            *self.seen.lock().unwrap() = messages.to_vec();
            Ok(self.reply.clone())
        }

        fn model(&self) -> &str {
            "canned"
        }
    }

    fn agent(reply: &str) -> (Arc<CannedProvider>, ActionAgent) {
        let provider = Arc::new(CannedProvider {
            reply: reply.to_string(),
            seen: Mutex::new(Vec::new()),
        });
        let info = SystemInfo {
            os_info: "Debian 12 64-bit".to_string(),
            shell_path: "/bin/bash".to_string(),
            shell_type: ShellType::UnixLike,
        };
        (provider.clone(), ActionAgent::new(provider, info))
    }

    fn problem(text: &str) -> ConversationState {
        ConversationState {
            messages: vec![Message::user(text)],
            next_agent: Some(RouteDecision::Action),
        }
    }

    #[tokio::test]
    async fn suggests_without_executing() {
        let (provider, agent) = agent("```bash\nsudo systemctl restart nginx\n```");
        let reply = agent.run(&problem("nginx is down")).await.unwrap();

        assert_eq!(
            reply.suggested_command.as_deref(),
            Some("sudo systemctl restart nginx")
        );
        assert!(reply.text.contains("NOT been run"));

        let seen = provider.seen.lock().unwrap();
        assert!(seen[0].content.contains("/bin/bash"));
        assert_eq!(seen[1].content, "nginx is down");
    }

    #[tokio::test]
    async fn empty_suggestion_is_an_error() {
        let (_provider, agent) = agent("   ");
        assert!(agent.run(&problem("disk full")).await.is_err());
    }
}
