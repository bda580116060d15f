use super::ChatState;
use crate::core::error::SmartCloudError;
use crate::core::executor::execute_command;
use crate::display;
use crate::providers::Role;

use async_trait::async_trait;
use console::style;

#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn execute(
        &self,
        state: &mut ChatState,
        args: &[&str],
    ) -> Result<Option<String>, SmartCloudError>;

    fn help(&self) -> &'static str;
}

pub struct QuitCommand;
pub struct SessionCommand;
pub struct ListSessionsCommand;
pub struct HistoryCommand;
pub struct DeleteSessionCommand;
pub struct MetricsCommand;
pub struct RunCommand;

#[derive(Default)]
pub struct HelpCommand {
    lines: Vec<&'static str>,
}

impl HelpCommand {
    pub fn new(lines: Vec<&'static str>) -> Self {
        Self { lines }
    }
}

#[async_trait]
impl CommandHandler for QuitCommand {
    async fn execute(
        &self,
        state: &mut ChatState,
        _args: &[&str],
    ) -> Result<Option<String>, SmartCloudError> {
        state.should_continue = false;
        Ok(None)
    }

    fn help(&self) -> &'static str {
        "/quit - Exit the chat session"
    }
}

#[async_trait]
impl CommandHandler for HelpCommand {
    async fn execute(
        &self,
        _state: &mut ChatState,
        _args: &[&str],
    ) -> Result<Option<String>, SmartCloudError> {
        let mut text = vec![style("Available Commands").bold().underlined().to_string()];
        text.extend(self.lines.iter().map(|line| line.to_string()));
        Ok(Some(text.join("\n")))
    }

    fn help(&self) -> &'static str {
        "/help - Show available commands"
    }
}

#[async_trait]
impl CommandHandler for SessionCommand {
    async fn execute(
        &self,
        state: &mut ChatState,
        args: &[&str],
    ) -> Result<Option<String>, SmartCloudError> {
        match args.first() {
            None => Ok(Some(format!("Current session: {}", state.session_id))),
            Some(id) => {
                state.session_id = id.to_string();
                state.pending_command = None;
                let loaded = state.orchestrator.load(id)?;
                Ok(Some(format!(
                    "Switched to session: {} ({} messages)",
                    id,
                    loaded.messages.len()
                )))
            }
        }
    }

    fn help(&self) -> &'static str {
        "/session [id] - Show or switch the current session"
    }
}

#[async_trait]
impl CommandHandler for ListSessionsCommand {
    async fn execute(
        &self,
        state: &mut ChatState,
        _args: &[&str],
    ) -> Result<Option<String>, SmartCloudError> {
        let sessions = state.orchestrator.store().list_sessions()?;
        if sessions.is_empty() {
            return Ok(Some("No saved sessions.".to_string()));
        }

        let lines: Vec<String> = sessions
            .iter()
            .map(|s| {
                let marker = if s.id == state.session_id { "*" } else { " " };
                format!(
                    "{} {}  ({} messages, updated {})",
                    marker, s.id, s.message_count, s.updated_at
                )
            })
            .collect();
        Ok(Some(lines.join("\n")))
    }

    fn help(&self) -> &'static str {
        "/sessions - List saved sessions"
    }
}

#[async_trait]
impl CommandHandler for HistoryCommand {
    async fn execute(
        &self,
        state: &mut ChatState,
        _args: &[&str],
    ) -> Result<Option<String>, SmartCloudError> {
        let conversation = state.orchestrator.load(&state.session_id)?;
        if conversation.messages.is_empty() {
            return Ok(Some(format!("Session {} is empty.", state.session_id)));
        }

        let lines: Vec<String> = conversation
            .messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::User => style("You").bold().cyan(),
                    Role::Assistant => style("Agent").bold().magenta(),
                    Role::System => style("System").bold().dim(),
                };
                format!("{}: {}", role, m.content)
            })
            .collect();
        Ok(Some(lines.join("\n")))
    }

    fn help(&self) -> &'static str {
        "/history - Print the current session's conversation"
    }
}

#[async_trait]
impl CommandHandler for DeleteSessionCommand {
    async fn execute(
        &self,
        state: &mut ChatState,
        args: &[&str],
    ) -> Result<Option<String>, SmartCloudError> {
        let Some(id) = args.first() else {
            return Ok(Some("Please specify a session id to delete".to_string()));
        };

        if state.orchestrator.store().delete_session(id)? {
            Ok(Some(format!("Deleted session: {}", id)))
        } else {
            Ok(Some(format!("Session not found: {}", id)))
        }
    }

    fn help(&self) -> &'static str {
        "/delete <id> - Delete a saved session"
    }
}

#[async_trait]
impl CommandHandler for MetricsCommand {
    async fn execute(
        &self,
        state: &mut ChatState,
        _args: &[&str],
    ) -> Result<Option<String>, SmartCloudError> {
        let snapshot = state.metrics.snapshot().await?;
        display::display_metrics(&snapshot);
        Ok(None)
    }

    fn help(&self) -> &'static str {
        "/metrics - Show current CPU and RAM usage"
    }
}

#[async_trait]
impl CommandHandler for RunCommand {
    async fn execute(
        &self,
        state: &mut ChatState,
        _args: &[&str],
    ) -> Result<Option<String>, SmartCloudError> {
        let Some(command) = state.pending_command.clone() else {
            return Ok(Some("No suggested command to run.".to_string()));
        };

        display::display_command(&command);
        let confirmed = state.auto_confirm || display::prompt_execution_confirmation()?;
        if !confirmed {
            display::display_execution_cancelled();
            return Ok(None);
        }

        state.pending_command = None;
        let succeeded = execute_command(&command, &state.system_info)?;
        if succeeded {
            Ok(None)
        } else {
            Ok(Some("The command exited with a non-zero status.".to_string()))
        }
    }

    fn help(&self) -> &'static str {
        "/run - Review and execute the last suggested command"
    }
}
