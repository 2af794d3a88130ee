//! Per-session conversation state: bounded turn histories, session scoping,
//! and the process-wide active-model selection.

pub mod scope;
pub mod store;

pub use scope::SessionScope;
pub use store::{Role, SessionStore, Turn, MAX_TURNS};
