//! Durable conversation state keyed by session id.

pub mod sqlite;

use crate::agents::state::{ConversationState, RouteDecision};
use crate::core::error::SmartCloudError;
use crate::providers::Message;

pub use sqlite::SqliteStore;

/// One row of `/sessions` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub id: String,
    pub message_count: usize,
    pub updated_at: String,
}

/// Sole writer of the persisted conversation log.
///
/// Implementations are synchronous; the orchestrator serialises access per session.
pub trait ConversationStore: Send + Sync {
    /// `None` when the session has never been written.
    fn load(&self, session_id: &str) -> Result<Option<ConversationState>, SmartCloudError>;

    /// Appends messages after the existing log, creating the session if needed.
    fn append(&self, session_id: &str, messages: &[Message]) -> Result<(), SmartCloudError>;

    fn set_next_agent(
        &self,
        session_id: &str,
        next_agent: Option<RouteDecision>,
    ) -> Result<(), SmartCloudError>;

    fn list_sessions(&self) -> Result<Vec<SessionSummary>, SmartCloudError>;

    /// Returns whether a session was removed.
    fn delete_session(&self, session_id: &str) -> Result<bool, SmartCloudError>;
}
