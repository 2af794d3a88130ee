//! Chat-backend access and the relay orchestrator.

pub mod ollama;
pub mod pipeline;
pub mod prompt;
pub mod provider;

pub use ollama::OllamaProvider;
pub use pipeline::relay_exchange;
pub use prompt::{append_user_context, UserInfo, SYSTEM_PROMPT};
pub use provider::{ChatRequest, ChatResponse, LlmProvider, ProviderError};
