use crate::providers::{Message, Role};
use std::fmt;

/// The supervisor's choice of what runs next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteDecision {
    Monitoring,
    Task,
    Action,
    Finish,
}

impl RouteDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteDecision::Monitoring => "MONITORING_AGENT",
            RouteDecision::Task => "TASK_AGENT",
            RouteDecision::Action => "ACTION_AGENT",
            RouteDecision::Finish => "FINISH",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "MONITORING_AGENT" => Some(RouteDecision::Monitoring),
            "TASK_AGENT" => Some(RouteDecision::Task),
            "ACTION_AGENT" => Some(RouteDecision::Action),
            "FINISH" => Some(RouteDecision::Finish),
            _ => None,
        }
    }
}

impl fmt::Display for RouteDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message log plus the most recent routing decision (`None` = unset).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    pub messages: Vec<Message>,
    pub next_agent: Option<RouteDecision>,
}

impl ConversationState {
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// True when the newest entry was written by a handler rather than the caller.
    pub fn ends_with_handler_reply(&self) -> bool {
        matches!(self.last_message(), Some(m) if m.role == Role::Assistant)
    }

    /// The trailing `window` messages, oldest first.
    pub fn recent(&self, window: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(window);
        &self.messages[start..]
    }
}

/// What a step contributes: messages to append and, optionally, a new routing decision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateDelta {
    pub messages: Vec<Message>,
    pub next_agent: Option<RouteDecision>,
}

impl StateDelta {
    pub fn route(decision: RouteDecision) -> Self {
        Self {
            messages: Vec::new(),
            next_agent: Some(decision),
        }
    }

    pub fn reply(message: Message) -> Self {
        Self {
            messages: vec![message],
            next_agent: None,
        }
    }
}

/// Appends the delta's messages and overwrites `next_agent` when the delta carries one.
pub fn merge(old: ConversationState, delta: StateDelta) -> ConversationState {
    let mut messages = old.messages;
    messages.extend(delta.messages);
    ConversationState {
        messages,
        next_agent: delta.next_agent.or(old.next_agent),
    }
}
