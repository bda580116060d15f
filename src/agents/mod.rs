//! Supervisor-routed agents and the turn loop that drives them.

pub mod action;
pub mod monitoring;
pub mod orchestrator;
pub mod state;
pub mod supervisor;
pub mod task;

use crate::core::error::SmartCloudError;
use async_trait::async_trait;
use state::{ConversationState, RouteDecision};

pub use orchestrator::{Orchestrator, TurnReply};

/// What an agent produced. The orchestrator turns it into exactly one assistant message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentReply {
    pub text: String,
    /// A shell command offered to the user. Never executed by the agent.
    pub suggested_command: Option<String>,
}

impl AgentReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            suggested_command: None,
        }
    }
}

/// A handler the supervisor can dispatch to.
///
/// Agents read the conversation but never mutate it; their reply is appended by
/// the orchestrator.
#[async_trait]
pub trait Agent: Send + Sync {
    /// The routing decision that selects this agent.
    fn route(&self) -> RouteDecision;

    /// Prefix shown on every message this agent authors, e.g. `Task Agent`.
    fn label(&self) -> &'static str;

    async fn run(&self, state: &ConversationState) -> Result<AgentReply, SmartCloudError>;
}
