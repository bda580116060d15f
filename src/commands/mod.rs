pub mod dispatcher;
pub mod handler;
pub mod registry;

use crate::agents::Orchestrator;
use crate::metrics::MetricsProvider;
use crate::system::SystemInfo;
use std::sync::Arc;

pub use dispatcher::create_command_registry;

/// Interactive session state shared by slash commands.
pub struct ChatState {
    pub session_id: String,
    pub orchestrator: Arc<Orchestrator>,
    pub metrics: Arc<dyn MetricsProvider>,
    pub system_info: SystemInfo,
    /// Latest command suggested by the action agent, waiting for `/run`.
    pub pending_command: Option<String>,
    pub auto_confirm: bool,
    pub should_continue: bool,
}

impl ChatState {
    pub fn new(
        session_id: &str,
        orchestrator: Arc<Orchestrator>,
        metrics: Arc<dyn MetricsProvider>,
        system_info: SystemInfo,
        auto_confirm: bool,
    ) -> Self {
        Self {
            session_id: session_id.to_string(),
            orchestrator,
            metrics,
            system_info,
            pending_command: None,
            auto_confirm,
            should_continue: true,
        }
    }
}
