//! Application context shared by every Discord event.

use sage_agent::LlmProvider;
use sage_sessions::SessionStore;
use sage_users::UserStore;

use crate::state::RuntimeState;

/// Everything a Discord event needs to serve a message: the chat backend,
/// the session store, the user-statistics store and the adapter's runtime
/// activation state. Built once at startup and shared via `Arc`.
pub struct BotContext {
    pub provider: Box<dyn LlmProvider>,
    pub store: SessionStore,
    pub users: UserStore,
    pub runtime: RuntimeState,
    /// Endpoint named in the "backend unreachable" user-facing message.
    pub backend_endpoint: String,
}

impl BotContext {
    /// User-facing message for the backend-unavailable condition.
    pub fn unavailable_message(&self) -> String {
        format!(
            "The model backend at {} is unreachable. Start it and try again.",
            self.backend_endpoint
        )
    }
}
