//! The per-turn control loop: supervisor → agent → supervisor until FINISH.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::state::{ConversationState, RouteDecision, StateDelta, merge};
use super::supervisor::{RouteReason, Supervisor};
use super::Agent;
use crate::core::error::SmartCloudError;
use crate::providers::Message;
use crate::store::ConversationStore;

/// Upper bound on supervisor/agent cycles in one turn.
const MAX_CYCLES_PER_TURN: usize = 8;

/// Outcome of one user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReply {
    /// Text surfaced to the caller.
    pub text: String,
    /// Agent messages appended during this turn, in order.
    pub replies: Vec<Message>,
    /// Agents dispatched during this turn, in order.
    pub dispatched: Vec<RouteDecision>,
    /// Command proposed by the action agent, awaiting user confirmation.
    pub suggested_command: Option<String>,
}

pub struct Orchestrator {
    supervisor: Supervisor,
    agents: HashMap<RouteDecision, Box<dyn Agent>>,
    store: Arc<dyn ConversationStore>,
    session_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Orchestrator {
    pub fn new(supervisor: Supervisor, store: Arc<dyn ConversationStore>) -> Self {
        Self {
            supervisor,
            agents: HashMap::new(),
            store,
            session_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn register<A: Agent + 'static>(&mut self, agent: A) {
        self.agents.insert(agent.route(), Box::new(agent));
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    /// Caller surface: one user message in, the assistant's text out.
    pub async fn process_turn(
        &self,
        session_id: &str,
        user_text: &str,
    ) -> Result<String, SmartCloudError> {
        Ok(self.run_turn(session_id, user_text).await?.text)
    }

    /// Runs one turn. Store failures abort the turn with an error; everything
    /// else ends up as assistant text.
    pub async fn run_turn(
        &self,
        session_id: &str,
        user_text: &str,
    ) -> Result<TurnReply, SmartCloudError> {
        let lock = self.session_lock(session_id).await;
        let result = {
            let _turn = lock.lock().await;
            self.run_locked_turn(session_id, user_text).await
        };
        self.release_session_lock(session_id, lock).await;
        result
    }

    async fn run_locked_turn(
        &self,
        session_id: &str,
        user_text: &str,
    ) -> Result<TurnReply, SmartCloudError> {
        let mut state = self.store.load(session_id)?.unwrap_or_default();

        // Persist the user's message before routing so a later failure cannot lose it.
        let user = Message::user(user_text);
        self.store.append(session_id, std::slice::from_ref(&user))?;
        state = merge(
            state,
            StateDelta {
                messages: vec![user],
                next_agent: None,
            },
        );

        let mut replies = Vec::new();
        let mut dispatched = Vec::new();
        let mut suggested_command = None;
        let mut finish_reason = RouteReason::HandlerReplied;

        for cycle in 0.. {
            if cycle == MAX_CYCLES_PER_TURN {
                warn!(session_id, "turn hit the cycle limit, finishing");
                state = merge(state, StateDelta::route(RouteDecision::Finish));
                break;
            }

            let route = self.supervisor.route(&state).await;
            state = merge(state, StateDelta::route(route.decision));

            if route.decision == RouteDecision::Finish {
                finish_reason = route.reason;
                break;
            }

            let Some(agent) = self.agents.get(&route.decision) else {
                warn!(decision = %route.decision, "no agent registered for route, finishing");
                state = merge(state, StateDelta::route(RouteDecision::Finish));
                break;
            };

            let message = match agent.run(&state).await {
                Ok(reply) => {
                    if reply.suggested_command.is_some() {
                        suggested_command = reply.suggested_command;
                    }
                    Message::assistant(format!("{}: {}", agent.label(), reply.text))
                }
                Err(e) => {
                    warn!(agent = agent.label(), error = %e, "agent failed");
                    Message::assistant(format!(
                        "{}: Sorry, I couldn't complete that request ({}).",
                        agent.label(),
                        e
                    ))
                }
            };

            self.store.append(session_id, std::slice::from_ref(&message))?;
            dispatched.push(route.decision);
            replies.push(message.clone());
            state = merge(state, StateDelta::reply(message));
            debug!(session_id, cycle, log_len = state.messages.len(), "agent step merged");
        }

        self.store.set_next_agent(session_id, state.next_agent)?;

        let text = match replies.last() {
            Some(last) => last.content.clone(),
            None => no_reply_text(&finish_reason),
        };
        info!(session_id, agents = dispatched.len(), "turn finished");

        Ok(TurnReply {
            text,
            replies,
            dispatched,
            suggested_command,
        })
    }

    /// Latest persisted state of a session.
    pub fn load(&self, session_id: &str) -> Result<ConversationState, SmartCloudError> {
        Ok(self.store.load(session_id)?.unwrap_or_default())
    }

    async fn session_lock(&self, session_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.session_locks.lock().await;
        locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drops the session's lock entry once no other turn holds or awaits it.
    async fn release_session_lock(&self, session_id: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.session_locks.lock().await;
        // One handle in the map, one here.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(session_id);
        }
    }
}

/// Surfaced when the supervisor finished before any agent ran. Not persisted.
fn no_reply_text(reason: &RouteReason) -> String {
    match reason {
        RouteReason::ServiceFailed(e) => format!("Routing failed: {}", e),
        _ => "No agent was selected for this request.".to_string(),
    }
}
