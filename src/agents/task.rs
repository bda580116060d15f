use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::state::{ConversationState, RouteDecision};
use super::{Agent, AgentReply};
use crate::core::error::SmartCloudError;
use crate::providers::{LLMProvider, Message};

const SYSTEM_PROMPT_FOR_TASK: &str = "You are the SmartCloud task agent. Answer questions, chat, \
and write code when asked. Put code in fenced markdown blocks.";

/// General chat and code answers over the full conversation.
pub struct TaskAgent {
    provider: Arc<dyn LLMProvider>,
    artifact_path: PathBuf,
}

impl TaskAgent {
    pub fn new(provider: Arc<dyn LLMProvider>, artifact_path: PathBuf) -> Self {
        Self {
            provider,
            artifact_path,
        }
    }
}

/// A fenced block anywhere, or a line that starts with an `import` statement.
pub fn contains_code(reply: &str) -> bool {
    reply.contains("```")
        || reply
            .lines()
            .any(|line| line.trim_start().starts_with("import "))
}

/// Overwrites the artifact with the raw reply.
fn save_artifact(path: &Path, reply: &str) -> Result<(), SmartCloudError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, reply)?;
    Ok(())
}

#[async_trait]
impl Agent for TaskAgent {
    fn route(&self) -> RouteDecision {
        RouteDecision::Task
    }

    fn label(&self) -> &'static str {
        "Task Agent"
    }

    async fn run(&self, state: &ConversationState) -> Result<AgentReply, SmartCloudError> {
        info!(history = state.messages.len(), "task agent thinking");

        let mut messages = Vec::with_capacity(state.messages.len() + 1);
        messages.push(Message::system(SYSTEM_PROMPT_FOR_TASK));
        messages.extend(state.messages.iter().cloned());

        let reply = self.provider.get_response(&messages).await?;

        if contains_code(&reply) {
            match save_artifact(&self.artifact_path, &reply) {
                Ok(()) => info!(path = %self.artifact_path.display(), "saved generated code"),
                Err(e) => warn!(
                    path = %self.artifact_path.display(),
                    error = %e,
                    "could not save generated code"
                ),
            }
        }

        Ok(AgentReply::text(reply))
    }
}
