use std::sync::Arc;

use tracing::{debug, info, warn};

use super::state::{ConversationState, RouteDecision};
use crate::providers::{LLMProvider, Message};

/// Why the supervisor reached its decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteReason {
    /// The newest message came from an agent; finishing without asking the model.
    HandlerReplied,
    /// The classifier reply named an agent.
    Classified,
    /// The classifier reply named no agent.
    Unrecognized,
    /// The classifier could not be reached.
    ServiceFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub decision: RouteDecision,
    pub reason: RouteReason,
}

pub struct Supervisor {
    provider: Arc<dyn LLMProvider>,
    history_window: usize,
    action_enabled: bool,
}

impl Supervisor {
    pub fn new(provider: Arc<dyn LLMProvider>, history_window: usize, action_enabled: bool) -> Self {
        Self {
            provider,
            history_window: history_window.max(1),
            action_enabled,
        }
    }

    /// Decides the next step. Never fails: any classifier problem resolves to FINISH.
    pub async fn route(&self, state: &ConversationState) -> Route {
        if state.ends_with_handler_reply() {
            debug!("last message is an agent reply, finishing");
            return Route {
                decision: RouteDecision::Finish,
                reason: RouteReason::HandlerReplied,
            };
        }

        let prompt = self.classification_prompt(state);
        let reply = match self.provider.get_response(&[Message::user(prompt)]).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "routing call failed, finishing turn");
                return Route {
                    decision: RouteDecision::Finish,
                    reason: RouteReason::ServiceFailed(e.to_string()),
                };
            }
        };

        let decision = classify(&reply, self.action_enabled);
        info!(%decision, raw = %reply.trim(), "supervisor routed");

        let reason = if decision == RouteDecision::Finish && !names_finish(&reply) {
            RouteReason::Unrecognized
        } else {
            RouteReason::Classified
        };
        Route { decision, reason }
    }

    fn classification_prompt(&self, state: &ConversationState) -> String {
        let history: Vec<String> = state
            .recent(self.history_window)
            .iter()
            .map(|m| format!("{}: {}", m.role.as_str(), m.content))
            .collect();

        let options = if self.action_enabled {
            "MONITORING_AGENT (for CPU/RAM usage), TASK_AGENT (for chat, code, names and general questions), \
             ACTION_AGENT (for fixing a problem on this machine with a shell command), or FINISH"
        } else {
            "MONITORING_AGENT (for CPU/RAM usage), TASK_AGENT (for chat, code, names and general questions), or FINISH"
        };

        format!(
            "You are the SmartCloud Supervisor.\n\
             CONVERSATION HISTORY:\n{}\n\n\
             Route to: {}.\n\
             Reply ONLY with the uppercase name of the agent.",
            history.join("\n"),
            options
        )
    }
}

/// Maps free classifier text to a decision by keyword, in priority order
/// MONITORING, TASK, ACTION. Anything else is FINISH.
pub fn classify(reply: &str, action_enabled: bool) -> RouteDecision {
    let upper = reply.to_uppercase();
    if upper.contains("MONITORING") {
        RouteDecision::Monitoring
    } else if upper.contains("TASK") {
        RouteDecision::Task
    } else if action_enabled && upper.contains("ACTION") {
        RouteDecision::Action
    } else {
        RouteDecision::Finish
    }
}

fn names_finish(reply: &str) -> bool {
    reply.to_uppercase().contains("FINISH")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::SmartCloudError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns a canned reply and records every prompt it was sent.
    struct ScriptedProvider {
        reply: Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err("connection refused".to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LLMProvider for ScriptedProvider {
        async fn get_response(&self, messages: &[Message]) -> Result<String, SmartCloudError> {
            self.prompts
                .lock()
                .unwrap()
                .push(messages.iter().map(|m| m.content.clone()).collect());
            self.reply
                .clone()
                .map_err(SmartCloudError::Network)
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    fn state_with(messages: Vec<Message>) -> ConversationState {
        ConversationState {
            messages,
            next_agent: None,
        }
    }

    #[test]
    fn monitoring_wins_over_task() {
        assert_eq!(
            classify("I THINK MONITORING OR TASK COULD WORK", true),
            RouteDecision::Monitoring
        );
    }

    #[test]
    fn unrecognized_text_finishes() {
        assert_eq!(classify("BANANA", true), RouteDecision::Finish);
        assert_eq!(classify("", true), RouteDecision::Finish);
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(classify("task_agent", false), RouteDecision::Task);
        assert_eq!(classify("  Monitoring_Agent.\n", false), RouteDecision::Monitoring);
    }

    #[test]
    fn action_requires_the_variant() {
        assert_eq!(classify("ACTION_AGENT", true), RouteDecision::Action);
        assert_eq!(classify("ACTION_AGENT", false), RouteDecision::Finish);
        assert_eq!(classify("TASK or ACTION", true), RouteDecision::Task);
    }

    #[tokio::test]
    async fn handler_reply_finishes_without_calling_the_model() {
        for reply in ["MONITORING_AGENT", "TASK_AGENT", "ACTION_AGENT", "BANANA"] {
            let provider = ScriptedProvider::replying(reply);
            let supervisor = Supervisor::new(provider.clone(), 5, true);
            let state = state_with(vec![
                Message::user("what's my CPU usage?"),
                Message::assistant("Monitoring Agent: Your CPU is at 3.0%"),
            ]);

            let route = supervisor.route(&state).await;
            assert_eq!(route.decision, RouteDecision::Finish);
            assert_eq!(route.reason, RouteReason::HandlerReplied);
            assert_eq!(provider.calls(), 0);
        }
    }

    #[tokio::test]
    async fn handler_reply_finishes_even_when_service_is_down() {
        let provider = ScriptedProvider::failing();
        let supervisor = Supervisor::new(provider.clone(), 5, true);
        let state = state_with(vec![Message::user("hi"), Message::assistant("Task Agent: hi")]);

        assert_eq!(supervisor.route(&state).await.decision, RouteDecision::Finish);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn user_message_is_classified() {
        let provider = ScriptedProvider::replying("MONITORING_AGENT");
        let supervisor = Supervisor::new(provider.clone(), 5, false);
        let route = supervisor
            .route(&state_with(vec![Message::user("what's my CPU usage?")]))
            .await;

        assert_eq!(route.decision, RouteDecision::Monitoring);
        assert_eq!(route.reason, RouteReason::Classified);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn service_failure_finishes_with_reason() {
        let supervisor = Supervisor::new(ScriptedProvider::failing(), 5, true);
        let route = supervisor.route(&state_with(vec![Message::user("hi")])).await;

        assert_eq!(route.decision, RouteDecision::Finish);
        assert!(matches!(route.reason, RouteReason::ServiceFailed(_)));
    }

    #[tokio::test]
    async fn garbled_reply_is_unrecognized_but_explicit_finish_is_classified() {
        let garbled = Supervisor::new(ScriptedProvider::replying("BANANA"), 5, true);
        let route = garbled.route(&state_with(vec![Message::user("hi")])).await;
        assert_eq!(route.reason, RouteReason::Unrecognized);

        let finish = Supervisor::new(ScriptedProvider::replying("FINISH"), 5, true);
        let route = finish.route(&state_with(vec![Message::user("thanks, bye")])).await;
        assert_eq!(route.decision, RouteDecision::Finish);
        assert_eq!(route.reason, RouteReason::Classified);
    }

    #[tokio::test]
    async fn prompt_only_carries_the_history_window() {
        let provider = ScriptedProvider::replying("TASK_AGENT");
        let supervisor = Supervisor::new(provider.clone(), 5, true);
        let mut messages = Vec::new();
        for i in 0..6 {
            messages.push(Message::user(format!("question-{}", i)));
            messages.push(Message::assistant(format!("Task Agent: answer-{}", i)));
        }
        messages.push(Message::user("question-final"));

        supervisor.route(&state_with(messages)).await;

        let prompts = provider.prompts.lock().unwrap();
        let prompt = &prompts[0];
        assert!(prompt.contains("question-final"));
        assert!(prompt.contains("answer-4"));
        assert!(!prompt.contains("question-3"));
        assert!(prompt.contains("ACTION_AGENT"));
    }
}
