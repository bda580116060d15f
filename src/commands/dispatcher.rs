use super::{
    ChatState,
    handler::{
        CommandHandler, DeleteSessionCommand, HelpCommand, HistoryCommand, ListSessionsCommand,
        MetricsCommand, QuitCommand, RunCommand, SessionCommand,
    },
    registry::CommandRegistry,
};
use crate::core::error::SmartCloudError;
use std::sync::Arc;

#[derive(Clone)]
pub struct CommandDispatcher {
    registry: Arc<CommandRegistry>,
}

impl CommandDispatcher {
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        Self { registry }
    }

    pub async fn execute(
        &self,
        command: &str,
        args: &[&str],
        state: &mut ChatState,
    ) -> Result<Option<String>, SmartCloudError> {
        self.registry.execute(command, args, state).await
    }

    pub fn get_command_names(&self) -> Vec<String> {
        self.registry.get_command_names()
    }
}

/// Splits `/name arg1 arg2` into the command name and its arguments.
pub fn parse_command_line(input: &str) -> Option<(&str, Vec<&str>)> {
    let rest = input.strip_prefix('/')?;
    let mut parts = rest.split_whitespace();
    let name = parts.next()?;
    Some((name, parts.collect()))
}

pub fn create_command_registry() -> CommandDispatcher {
    let mut registry = CommandRegistry::new();

    registry.register("quit", QuitCommand);
    registry.register("session", SessionCommand);
    registry.register("sessions", ListSessionsCommand);
    registry.register("history", HistoryCommand);
    registry.register("delete", DeleteSessionCommand);
    registry.register("metrics", MetricsCommand);
    registry.register("run", RunCommand);

    let mut help_lines = registry.help_lines();
    help_lines.push(HelpCommand::default().help());
    help_lines.sort_unstable();
    registry.register("help", HelpCommand::new(help_lines));

    CommandDispatcher::new(Arc::new(registry))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_and_arguments() {
        assert_eq!(
            parse_command_line("/session  web_user_1 "),
            Some(("session", vec!["web_user_1"]))
        );
        assert_eq!(parse_command_line("/quit"), Some(("quit", vec![])));
        assert_eq!(parse_command_line("/"), None);
        assert_eq!(parse_command_line("what's my cpu"), None);
    }

    #[test]
    fn registry_exposes_every_command() {
        let names = create_command_registry().get_command_names();
        for expected in [
            "delete", "help", "history", "metrics", "quit", "run", "session", "sessions",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing /{}", expected);
        }
    }
}
