use crate::agents::action::ActionAgent;
use crate::agents::monitoring::MonitoringAgent;
use crate::agents::supervisor::Supervisor;
use crate::agents::task::TaskAgent;
use crate::agents::{Orchestrator, TurnReply};
use crate::cli::Args;
use crate::commands::dispatcher::{CommandDispatcher, parse_command_line};
use crate::commands::{ChatState, create_command_registry};
use crate::config::{Config, Provider};
use crate::core::error::SmartCloudError;
use crate::core::executor::execute_command;
use crate::display;
use crate::input;
use crate::metrics::{MetricsProvider, ProcMetrics};
use crate::providers::LLMProvider;
use crate::providers::factory::{InferenceSettings, ProviderFactory};
use crate::providers::timeout::TimeoutProvider;
use crate::store::SqliteStore;
use crate::system::SystemInfo;
use is_terminal::IsTerminal;
use std::io::{self, Read};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub struct Application {
    session_id: String,
    one_shot_query: Option<String>,
    /// Skips the `/run` prompt only. One-shot suggestions always ask.
    run_auto_confirm: bool,
    orchestrator: Arc<Orchestrator>,
    metrics: Arc<dyn MetricsProvider>,
    system_info: SystemInfo,
    command_dispatcher: CommandDispatcher,
}

impl Application {
    /// Wires provider, store, metrics and agents from config, with CLI flags taking precedence.
    pub fn new(args: Args, config: Config) -> Result<Self, SmartCloudError> {
        let provider = match args.provider.as_deref() {
            Some(name) => Provider::from_str(name)
                .ok_or_else(|| SmartCloudError::Config(format!("Unsupported provider: {}", name)))?,
            None => config.provider(),
        };

        let settings = InferenceSettings {
            provider_config: config.provider_config(provider),
            model_override: args.model.clone(),
            temperature: config.temperature,
        };
        let inner = ProviderFactory::new().create(provider, &settings)?;
        info!(?provider, model = inner.model(), "inference provider ready");
        let llm: Arc<dyn LLMProvider> = Arc::new(TimeoutProvider::new(
            inner,
            Duration::from_secs(config.request_timeout_secs),
        ));

        let store = Arc::new(SqliteStore::open(&config.database_path())?);
        let metrics: Arc<dyn MetricsProvider> = Arc::new(ProcMetrics::new(Duration::from_millis(
            config.monitoring.cpu_sample_ms,
        )));
        let system_info = SystemInfo::detect();

        let action_enabled = config.routing.action_agent && !args.no_action;
        let supervisor = Supervisor::new(llm.clone(), config.routing.history_window, action_enabled);

        let mut orchestrator = Orchestrator::new(supervisor, store);
        orchestrator.register(MonitoringAgent::new(
            metrics.clone(),
            config.monitoring.ram_alert_threshold,
        ));
        orchestrator.register(TaskAgent::new(llm.clone(), config.artifact_path.clone()));
        if action_enabled {
            orchestrator.register(ActionAgent::new(llm, system_info.clone()));
        }

        Ok(Self {
            session_id: args.session.unwrap_or(config.default_session),
            one_shot_query: args.query,
            run_auto_confirm: args.yes || config.auto_confirm,
            orchestrator: Arc::new(orchestrator),
            metrics,
            system_info,
            command_dispatcher: create_command_registry(),
        })
    }

    pub async fn run(&mut self) -> Result<(), SmartCloudError> {
        let piped = if !io::stdin().is_terminal() {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| SmartCloudError::Input(format!("Failed to read from stdin: {}", e)))?;
            Some(buffer)
        } else {
            None
        };

        match compose_query(self.one_shot_query.take(), piped) {
            Some(query) => self.handle_one_shot(&query).await,
            None => self.handle_interactive().await,
        }
    }

    async fn handle_one_shot(&self, query: &str) -> Result<(), SmartCloudError> {
        // Redirected output gets the bare reply text, without boxes or a confirmation prompt.
        if !io::stdout().is_terminal() {
            let text = self.orchestrator.process_turn(&self.session_id, query).await?;
            println!("{}", text);
            return Ok(());
        }

        let turn = self.orchestrator.run_turn(&self.session_id, query).await?;
        show_turn(&turn);

        let Some(command) = turn.suggested_command else {
            return Ok(());
        };
        display::display_command(&command);
        match confirmed_suggestion(command, display::prompt_execution_confirmation)? {
            Some(command) => {
                execute_command(&command, &self.system_info)?;
            }
            None => display::display_execution_cancelled(),
        }
        Ok(())
    }

    async fn handle_interactive(&self) -> Result<(), SmartCloudError> {
        let mut state = ChatState::new(
            &self.session_id,
            self.orchestrator.clone(),
            self.metrics.clone(),
            self.system_info.clone(),
            self.run_auto_confirm,
        );

        println!(
            "SmartCloud agent ready (session {}). Type '/help' for commands, 'exit' or Ctrl+D to leave.",
            state.session_id
        );

        let mut editor = input::create_editor(self.command_dispatcher.clone())?;

        loop {
            let Some(line) = input::read_input(&mut editor, &state.session_id)? else {
                break;
            };
            let line = line.trim();

            if line.is_empty() {
                continue;
            }
            if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
                break;
            }

            if line.starts_with('/') {
                if let Some((name, args)) = parse_command_line(line) {
                    match self.command_dispatcher.execute(name, &args, &mut state).await {
                        Ok(Some(output)) => println!("{}", output),
                        Ok(None) => {}
                        Err(e) => display::display_error(&e),
                    }
                }
                if !state.should_continue {
                    break;
                }
                continue;
            }

            match self.orchestrator.run_turn(&state.session_id, line).await {
                Ok(turn) => {
                    debug!(session_id = %state.session_id, agents = ?turn.dispatched, "turn complete");
                    show_turn(&turn);
                    if turn.suggested_command.is_some() {
                        state.pending_command = turn.suggested_command;
                    }
                }
                Err(e) => display::display_error(&e),
            }
        }

        input::save_history(&mut editor)?;
        Ok(())
    }
}

/// Joins the query argument with piped stdin, wrapping the latter in `<pipe>` tags.
fn compose_query(query: Option<String>, piped: Option<String>) -> Option<String> {
    let piped = piped.filter(|p| !p.trim().is_empty());
    match (query, piped) {
        (Some(q), Some(ctx)) => Some(format!("<pipe>{}</pipe>\n\n{}", ctx, q)),
        (None, Some(ctx)) => Some(format!("<pipe>{}</pipe>", ctx)),
        (Some(q), None) => Some(q),
        (None, None) => None,
    }
}

/// A one-shot suggestion is released for execution only on an explicit yes.
fn confirmed_suggestion(
    command: String,
    confirm: impl FnOnce() -> Result<bool, SmartCloudError>,
) -> Result<Option<String>, SmartCloudError> {
    Ok(confirm()?.then_some(command))
}

fn show_turn(turn: &TurnReply) {
    if turn.replies.is_empty() {
        display::display_notice(&turn.text);
        return;
    }
    for reply in &turn.replies {
        display::display_agent_reply(reply);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_alone_is_used_verbatim() {
        assert_eq!(
            compose_query(Some("cpu?".to_string()), None).as_deref(),
            Some("cpu?")
        );
    }

    #[test]
    fn piped_input_is_wrapped() {
        assert_eq!(
            compose_query(Some("explain".to_string()), Some("log line".to_string())).as_deref(),
            Some("<pipe>log line</pipe>\n\nexplain")
        );
        assert_eq!(
            compose_query(None, Some("log line".to_string())).as_deref(),
            Some("<pipe>log line</pipe>")
        );
    }

    #[test]
    fn blank_pipe_falls_back_to_interactive() {
        assert_eq!(compose_query(None, Some("  \n".to_string())), None);
    }

    #[test]
    fn declined_suggestion_is_not_released() {
        let released = confirmed_suggestion("rm -rf /tmp/cache".to_string(), || Ok(false)).unwrap();
        assert_eq!(released, None);
    }

    #[test]
    fn unreadable_confirmation_releases_nothing() {
        let result = confirmed_suggestion("df -h".to_string(), || {
            Err(SmartCloudError::Input("stdin closed".to_string()))
        });
        assert!(matches!(result, Err(SmartCloudError::Input(_))));
    }

    #[test]
    fn accepted_suggestion_is_released() {
        let released = confirmed_suggestion("df -h".to_string(), || Ok(true)).unwrap();
        assert_eq!(released.as_deref(), Some("df -h"));
    }
}
